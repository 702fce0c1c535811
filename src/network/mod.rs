//! Peer messaging module
//!
//! Message types exchanged between nodes and the node that applies them.
//! The transport that actually carries messages plugs in behind
//! [`Broadcaster`].

pub mod message;
pub mod node;

pub use message::Message;
pub use node::{
    Broadcaster, ChannelBroadcaster, Node, NodeConfig, NodeError, AUDIT_PEER_CHAINS_KEY,
    SYNC_AUDIT_KEY,
};
