//! Storage module for chain files

pub mod persistence;

pub use persistence::{load_chain, read_chain, write_chain, StorageError};
