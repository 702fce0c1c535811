//! Ledger node
//!
//! Owns the chain and the transaction pool and applies everything that
//! arrives from users and peers to them. The chain and the pool each sit
//! behind one lock, always taken chain first, so adopting a peer chain and
//! appending a locally mined block cannot interleave. Mining itself runs on
//! a blocking worker with neither lock held.
//!
//! Local submissions and local mining are serialized by a separate guard,
//! taken before any other lock: the wallet's pending transaction is never
//! amended while a snapshot of it is being mined.
//!
//! Delivery of outbound messages is left to a [`Broadcaster`].

use crate::core::{Block, Blockchain, BlockchainError, ReplaceError, Transaction, TransactionError};
use crate::mining::{Miner, TransactionPool};
use crate::network::message::Message;
use crate::wallet::{Wallet, WalletInfo};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex, RwLock};

/// Environment variable toggling the audit of chains received from peers
pub const AUDIT_PEER_CHAINS_KEY: &str = "LEDGER_AUDIT_PEER_CHAINS";

/// Environment variable toggling the audit of the chain adopted on root sync
pub const SYNC_AUDIT_KEY: &str = "LEDGER_SYNC_AUDIT";

/// Node configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Audit transactions of chains received from peers
    pub audit_peer_chains: bool,
    /// Audit transactions of the chain adopted when syncing with a root node
    pub sync_audit: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            audit_peer_chains: true,
            sync_audit: false,
        }
    }
}

impl NodeConfig {
    /// Defaults overridden by `LEDGER_AUDIT_PEER_CHAINS` / `LEDGER_SYNC_AUDIT`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            audit_peer_chains: env_flag(AUDIT_PEER_CHAINS_KEY, defaults.audit_peer_chains),
            sync_audit: env_flag(SYNC_AUDIT_KEY, defaults.sync_audit),
        }
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => parse_flag(&value).unwrap_or_else(|| {
            log::warn!("Ignoring {}={:?}, expected true or false", key, value);
            default
        }),
        Err(_) => default,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Outbound side of the peer transport
pub trait Broadcaster: Send + Sync {
    fn broadcast(&self, message: Message);
}

/// Broadcaster handing messages to a transport task over a channel
#[derive(Clone)]
pub struct ChannelBroadcaster {
    sender: mpsc::UnboundedSender<Message>,
}

impl ChannelBroadcaster {
    /// Create the broadcaster and the receiver the transport drains
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn broadcast(&self, message: Message) {
        if let Err(e) = self.sender.send(message) {
            log::warn!("Transport closed, dropping {} message", e.0.channel());
        }
    }
}

/// Node-level errors
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),
    #[error("Blockchain error: {0}")]
    Blockchain(#[from] BlockchainError),
    #[error("Mining task failed: {0}")]
    MiningTask(#[from] tokio::task::JoinError),
}

/// A ledger node
pub struct Node<B: Broadcaster> {
    config: NodeConfig,
    blockchain: Arc<RwLock<Blockchain>>,
    pool: Arc<RwLock<TransactionPool>>,
    wallet: Mutex<Wallet>,
    miner: Arc<Miner>,
    submission: Mutex<()>,
    broadcaster: B,
}

impl<B: Broadcaster> Node<B> {
    /// Create a node with a fresh chain and an empty pool
    pub fn new(config: NodeConfig, wallet: Wallet, broadcaster: B) -> Self {
        let miner = Arc::new(Miner::new(wallet.address()));
        Self {
            config,
            blockchain: Arc::new(RwLock::new(Blockchain::new())),
            pool: Arc::new(RwLock::new(TransactionPool::new())),
            wallet: Mutex::new(wallet),
            miner,
            submission: Mutex::new(()),
            broadcaster,
        }
    }

    /// Shared handle to the chain
    pub fn blockchain(&self) -> Arc<RwLock<Blockchain>> {
        self.blockchain.clone()
    }

    /// Shared handle to the pool
    pub fn pool(&self) -> Arc<RwLock<TransactionPool>> {
        self.pool.clone()
    }

    /// Apply a message received from a peer
    pub async fn handle_message(&self, message: Message) -> Result<(), ReplaceError> {
        log::debug!("Received {} message", message.channel());

        match message {
            Message::Chain(chain) => {
                let mut blockchain = self.blockchain.write().await;
                let mut pool = self.pool.write().await;
                blockchain.replace_chain_with(chain, self.config.audit_peer_chains, |accepted| {
                    pool.clear_blockchain_transactions(accepted)
                })
            }
            Message::Transaction(tx) => {
                self.pool.write().await.set_transaction(tx);
                Ok(())
            }
        }
    }

    /// Send `amount` from this node's wallet to `recipient`
    ///
    /// Amends the wallet's pending transaction when there is one.
    pub async fn transact(&self, recipient: &str, amount: u64) -> Result<Transaction, NodeError> {
        let _submission = self.submission.lock().await;
        let tx = {
            let blockchain = self.blockchain.read().await;
            let mut pool = self.pool.write().await;
            let mut wallet = self.wallet.lock().await;

            let tx = match pool.find_by_sender(wallet.address()).cloned() {
                Some(mut pending) => {
                    pending.update(&wallet, recipient, amount)?;
                    pending
                }
                None => wallet.create_transaction(recipient, amount, Some(blockchain.blocks()))?,
            };
            pool.set_transaction(tx.clone());
            tx
        };

        self.broadcaster.broadcast(Message::Transaction(tx.clone()));
        Ok(tx)
    }

    /// Mine the pool's valid transactions into a new block and announce the chain
    pub async fn mine_transactions(&self) -> Result<Block, NodeError> {
        let _submission = self.submission.lock().await;
        let (last_block, transactions) = {
            let blockchain = self.blockchain.read().await;
            let mut pool = self.pool.write().await;
            (blockchain.latest_block().clone(), pool.valid_transactions())
        };

        let miner = Arc::clone(&self.miner);
        let block =
            tokio::task::spawn_blocking(move || miner.mine_detached(&last_block, transactions))
                .await?;

        let chain = {
            let mut blockchain = self.blockchain.write().await;
            blockchain.push_block(block.clone())?;
            let mut pool = self.pool.write().await;
            pool.clear_blockchain_transactions(blockchain.blocks());
            blockchain.blocks().to_vec()
        };

        self.broadcaster.broadcast(Message::Chain(chain));
        Ok(block)
    }

    /// Catch up with a root node's chain and pool
    ///
    /// The pool snapshot is taken over even if the chain is not adopted.
    pub async fn sync_with_root(
        &self,
        chain: Vec<Block>,
        pool_map: HashMap<String, Transaction>,
    ) -> Result<(), ReplaceError> {
        let mut blockchain = self.blockchain.write().await;
        let result = blockchain.replace_chain(chain, self.config.sync_audit);

        let mut pool = self.pool.write().await;
        log::info!("Replacing pool with {} transactions from root", pool_map.len());
        pool.set_map(pool_map);

        result
    }

    /// Address and chain-derived balance of this node's wallet
    pub async fn wallet_info(&self) -> WalletInfo {
        let blockchain = self.blockchain.read().await;
        let wallet = self.wallet.lock().await;
        wallet.info(blockchain.blocks())
    }
}
