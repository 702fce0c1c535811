//! Mini-Ledger CLI Application
//!
//! Offline tooling for chain files: mine a chain, check one, read balances.

use clap::{Parser, Subcommand};
use mini_ledger::core::{audit_transactions, balance_of, validate_chain, Blockchain};
use mini_ledger::mining::{Miner, TransactionPool};
use mini_ledger::storage::{load_chain, read_chain, write_chain};
use mini_ledger::wallet::Wallet;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ledger")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A proof-of-work ledger with account balances", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mine reward-only blocks onto a fresh chain
    Mine {
        /// Number of blocks to mine
        #[arg(short, long, default_value = "1")]
        blocks: u32,

        /// Reward address (a fresh wallet when omitted)
        #[arg(short, long)]
        address: Option<String>,

        /// Write the chain here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a chain file
    Validate {
        /// Chain file to check
        #[arg(short, long)]
        input: PathBuf,

        /// Trusted chain to audit transactions against
        #[arg(short, long)]
        local: Option<PathBuf>,
    },

    /// Show the balance of an address
    Balance {
        /// Chain file
        #[arg(short, long)]
        input: PathBuf,

        /// Address to look up
        #[arg(short, long)]
        address: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Mine {
            blocks,
            address,
            output,
        } => cmd_mine(blocks, address, output)?,
        Commands::Validate { input, local } => cmd_validate(&input, local.as_deref())?,
        Commands::Balance { input, address } => {
            let chain = load_chain(&input)?;
            println!("💰 {}: {}", address, balance_of(&chain, &address));
        }
    }

    Ok(())
}

fn cmd_mine(
    blocks: u32,
    address: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let address = address.unwrap_or_else(|| Wallet::new().address().to_string());
    let miner = Miner::new(&address);
    let mut blockchain = Blockchain::new();
    let mut pool = TransactionPool::new();

    log::info!("Mining {} blocks for {}", blocks, address);
    for _ in 0..blocks {
        miner.mine_transactions(&mut blockchain, &mut pool);
    }

    match output {
        Some(path) => {
            write_chain(&path, blockchain.blocks())?;
            println!("✅ Wrote {} blocks to {}", blockchain.len(), path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&blockchain)?),
    }

    Ok(())
}

fn cmd_validate(
    input: &Path,
    local: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let chain = read_chain(input)?;
    validate_chain(&chain)?;
    println!("✅ Chain of {} blocks is structurally valid", chain.len());

    if let Some(local) = local {
        let trusted = load_chain(local)?;
        audit_transactions(&chain, &trusted)?;
        println!("✅ Transactions pass audit against {}", local.display());
    }

    Ok(())
}
