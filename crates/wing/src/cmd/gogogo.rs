// Wing - Great Wyrm Diamond tooling
// Copyright (C) 2024 Moonstream DAO
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! `diamond-gogogo` and `characters-gogogo` - full deployment procedures

use std::path::PathBuf;

use alloy_primitives::{Address, U256};
use clap::Args;
use eyre::{bail, Result};
use wing_engine::{CharactersInit, Deployer, DeploymentResult, DiamondChain};

use crate::{
    opts::{self, ExistingArgs, TxArgs},
    Cli,
};

/// Arguments of `wing diamond-gogogo`
#[derive(Debug, Clone, Args)]
pub struct DiamondGogogoArgs {
    /// Owner of the Diamond (defaults to the sending account)
    #[arg(long)]
    pub owner: Option<Address>,

    /// Write the deployment result to this file
    #[arg(short, long)]
    pub outfile: Option<PathBuf>,

    #[command(flatten)]
    pub existing: ExistingArgs,

    #[command(flatten)]
    pub tx: TxArgs,
}

/// Arguments of `wing characters-gogogo`
#[derive(Debug, Clone, Args)]
pub struct CharactersGogogoArgs {
    /// Terminus contract whose badges gate administration
    #[arg(long)]
    pub admin_terminus_address: Address,

    /// Terminus pool of administrator badges
    #[arg(long)]
    pub admin_terminus_pool_id: U256,

    /// Terminus pool of badges used to create characters
    #[arg(long)]
    pub character_creation_terminus_pool_id: U256,

    /// ERC-721 name
    #[arg(long, default_value = CharactersInit::DEFAULT_NAME)]
    pub name: String,

    /// ERC-721 symbol
    #[arg(long, default_value = CharactersInit::DEFAULT_SYMBOL)]
    pub symbol: String,

    /// Contract URI
    #[arg(long, default_value = "")]
    pub uri: String,

    /// Address of a deployed CharactersFacet. If provided, it is mounted instead of a new one.
    #[arg(long)]
    pub characters_facet_address: Option<Address>,

    /// Write the deployment result to this file
    #[arg(short, long)]
    pub outfile: Option<PathBuf>,

    #[command(flatten)]
    pub existing: ExistingArgs,

    #[command(flatten)]
    pub tx: TxArgs,
}

impl CharactersGogogoArgs {
    /// Arguments of the facet's `init` call.
    pub fn characters_init(&self) -> CharactersInit {
        CharactersInit {
            admin_terminus_address: self.admin_terminus_address,
            admin_terminus_pool_id: self.admin_terminus_pool_id,
            character_creation_terminus_pool_id: self.character_creation_terminus_pool_id,
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            uri: self.uri.clone(),
        }
    }
}

/// Deploy a base Diamond.
pub async fn run_diamond(cli: &Cli, args: &DiamondGogogoArgs) -> Result<()> {
    let store = opts::artifact_store(cli);
    let registry = opts::load_registry(&store)?;
    let chain = args.tx.connect(cli, store).await?;

    let owner = args.owner.unwrap_or_else(|| chain.sender());
    tracing::info!(%owner, "deploying Diamond");

    let result =
        Deployer::new(&chain, &registry).diamond_gogogo(owner, (&args.existing).into()).await;
    report(&result, args.outfile.as_ref())
}

/// Deploy a Great Wyrm Characters Diamond.
pub async fn run_characters(cli: &Cli, args: &CharactersGogogoArgs) -> Result<()> {
    let store = opts::artifact_store(cli);
    let registry = opts::load_registry(&store)?;
    let chain = args.tx.connect(cli, store).await?;

    tracing::info!(owner = %chain.sender(), "deploying Great Wyrm Characters");

    let result = Deployer::new(&chain, &registry)
        .characters_gogogo(
            args.characters_init(),
            (&args.existing).into(),
            args.characters_facet_address,
        )
        .await;
    report(&result, args.outfile.as_ref())
}

// The partial result is always written so a failed run can be resumed with
// the addresses it recorded.
fn report(result: &DeploymentResult, outfile: Option<&PathBuf>) -> Result<()> {
    opts::emit_json(result, outfile)?;
    if let Some(error) = &result.error {
        bail!("{error}");
    }
    Ok(())
}
