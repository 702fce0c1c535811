//! Peer message types
//!
//! The payloads a transport carries between nodes. Framing and delivery are
//! left to the transport; messages are encoded as JSON.

use crate::core::{Block, Transaction};
use serde::{Deserialize, Serialize};

/// Messages exchanged between nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// A node's full chain, sent after it mines a block
    Chain(Vec<Block>),

    /// A new or amended pending transaction
    Transaction(Transaction),
}

impl Message {
    /// Serialize message to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize message from bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Channel the message is published on
    pub fn channel(&self) -> &'static str {
        match self {
            Message::Chain(_) => "BLOCKCHAIN",
            Message::Transaction(_) => "TRANSACTION",
        }
    }
}
