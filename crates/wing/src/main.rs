//! Wing - Great Wyrm Diamond tooling
//!
//! Deploys EIP-2535 Diamond contracts and cuts facets onto them.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::Result;
use wing_common::env::{DEFAULT_ARTIFACTS_DIR, ETH_RPC_URL, WING_ARTIFACTS_DIR};
use wing_engine::DEFAULT_RPC_URL;

mod cmd;
mod opts;

/// Command-line interface for Wing
#[derive(Debug, Parser)]
#[command(name = "wing")]
#[command(about = "Wing - deploy and manage Great Wyrm EIP-2535 Diamond contracts")]
#[command(version)]
pub struct Cli {
    /// Ethereum RPC endpoint
    #[arg(long, global = true, env = ETH_RPC_URL, default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Directory holding <ContractName>.json build artifacts
    #[arg(long, global = true, env = WING_ARTIFACTS_DIR, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// Also write logs to a daily rolling file in the temp directory
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Operate on facets of a Diamond contract
    FacetCut(cmd::facet_cut::FacetCutArgs),
    /// Deploy a Diamond with its base facets and attach them
    DiamondGogogo(cmd::gogogo::DiamondGogogoArgs),
    /// Deploy a Great Wyrm Characters Diamond
    CharactersGogogo(cmd::gogogo::CharactersGogogoArgs),
    /// Show the selectors a facet contributes to a cut
    Selectors(cmd::selectors::SelectorsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    wing_common::logging::init_logging("wing", cli.log_file)?;

    match &cli.command {
        Commands::FacetCut(args) => cmd::facet_cut::run(&cli, args).await,
        Commands::DiamondGogogo(args) => cmd::gogogo::run_diamond(&cli, args).await,
        Commands::CharactersGogogo(args) => cmd::gogogo::run_characters(&cli, args).await,
        Commands::Selectors(args) => cmd::selectors::run(&cli, args),
    }
}
