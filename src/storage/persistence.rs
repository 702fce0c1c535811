//! Chain file persistence
//!
//! Chains are stored as the JSON array of their blocks, the same form peers
//! exchange.

use crate::core::{validate_chain, Block, ChainValidationError};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid chain: {0}")]
    InvalidChain(#[from] ChainValidationError),
}

/// Write `chain` to `path` as pretty-printed JSON
pub fn write_chain(path: &Path, chain: &[Block]) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, chain)?;
    Ok(())
}

/// Read the blocks stored at `path` without validating them
pub fn read_chain(path: &Path) -> Result<Vec<Block>, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Read the chain stored at `path`, rejecting it unless structurally valid
pub fn load_chain(path: &Path) -> Result<Vec<Block>, StorageError> {
    let chain = read_chain(path)?;
    validate_chain(&chain)?;
    Ok(chain)
}
