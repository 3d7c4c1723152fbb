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

//! Argument groups shared by several commands.

use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use alloy_primitives::{Address, Selector};
use clap::{builder::PossibleValuesParser, Args};
use eyre::{eyre, Result, WrapErr};
use serde::Serialize;
use tracing::info;
use wing_common::{env::WING_PRIVATE_KEY, parse_selector, ArtifactStore};
use wing_engine::{
    parse_private_key, AlloyChain, ExistingContracts, SelectorFilter, SelectorRegistry, TxConfig,
    KNOWN_FACETS,
};

use crate::Cli;

/// Value parser restricting `--facet-name` to the known facets.
pub fn facet_name_parser() -> PossibleValuesParser {
    PossibleValuesParser::new(KNOWN_FACETS)
}

/// Transaction signing and fee options
#[derive(Debug, Clone, Args)]
pub struct TxArgs {
    /// Hex private key of the sending account
    #[arg(long, env = WING_PRIVATE_KEY, hide_env_values = true)]
    pub private_key: Option<String>,

    /// Gas limit (estimated if not set)
    #[arg(long)]
    pub gas_limit: Option<u64>,

    /// EIP-1559 max fee per gas, in wei (estimated if not set)
    #[arg(long)]
    pub max_fee_per_gas: Option<u128>,

    /// EIP-1559 max priority fee per gas, in wei (estimated if not set)
    #[arg(long)]
    pub max_priority_fee_per_gas: Option<u128>,

    /// Number of confirmations to wait for
    #[arg(long, default_value_t = 1)]
    pub confirmations: u64,

    /// Seconds to wait for each receipt (waits forever if not set)
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl TxArgs {
    /// Transaction options for the engine.
    pub fn tx_config(&self) -> TxConfig {
        TxConfig::default()
            .with_gas_limit(self.gas_limit)
            .with_fees(self.max_fee_per_gas, self.max_priority_fee_per_gas)
            .with_confirmations(self.confirmations)
            .with_timeout(self.timeout.map(Duration::from_secs))
    }

    /// Connect to the chain given by the global options.
    pub async fn connect(&self, cli: &Cli, store: Arc<ArtifactStore>) -> Result<AlloyChain> {
        let key = self
            .private_key
            .as_deref()
            .ok_or_else(|| eyre!("--private-key (or {WING_PRIVATE_KEY}) is required to transact"))?;
        let signer = parse_private_key(key)?;
        Ok(AlloyChain::connect(&cli.rpc_url, signer, store, self.tx_config()).await?)
    }
}

/// Selector include/exclude filters
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Names of methods to ignore when cutting a facet onto or off of the diamond
    #[arg(long, num_args = 1..)]
    pub ignore_methods: Vec<String>,

    /// Method selectors to ignore when cutting a facet onto or off of the diamond
    #[arg(long, num_args = 1.., value_parser = parse_selector)]
    pub ignore_selectors: Vec<Selector>,

    /// Names of methods to add (if set, --ignore-methods and --ignore-selectors are not used)
    #[arg(long, num_args = 1..)]
    pub methods: Vec<String>,

    /// Selectors to add (if set, --ignore-methods and --ignore-selectors are not used)
    #[arg(long, num_args = 1.., value_parser = parse_selector)]
    pub selectors: Vec<Selector>,
}

impl FilterArgs {
    /// The engine filter.
    pub fn filter(&self) -> SelectorFilter {
        SelectorFilter::new()
            .include_methods(self.methods.iter().cloned())
            .include_selectors(self.selectors.iter().copied())
            .exclude_methods(self.ignore_methods.iter().cloned())
            .exclude_selectors(self.ignore_selectors.iter().copied())
    }
}

/// Addresses of an already-deployed base Diamond
#[derive(Debug, Clone, Default, Args)]
pub struct ExistingArgs {
    /// Address of a deployed DiamondCutFacet. If provided, a new one is not deployed.
    #[arg(long)]
    pub diamond_cut_address: Option<Address>,

    /// Address of a deployed Diamond contract. If provided, the required facets are mounted onto
    /// it instead of a new Diamond. Assumes that there is no collision of selectors.
    #[arg(long)]
    pub diamond_address: Option<Address>,

    /// Address of a deployed DiamondLoupeFacet. If provided, it is mounted instead of a new one.
    #[arg(long)]
    pub diamond_loupe_address: Option<Address>,

    /// Address of a deployed OwnershipFacet. If provided, it is mounted instead of a new one.
    #[arg(long)]
    pub ownership_address: Option<Address>,
}

impl From<&ExistingArgs> for ExistingContracts {
    fn from(args: &ExistingArgs) -> Self {
        Self {
            diamond_cut: args.diamond_cut_address,
            diamond: args.diamond_address,
            diamond_loupe: args.diamond_loupe_address,
            ownership: args.ownership_address,
        }
    }
}

/// The artifact store named by the global options.
pub fn artifact_store(cli: &Cli) -> Arc<ArtifactStore> {
    Arc::new(ArtifactStore::new(&cli.artifacts_dir))
}

/// Load every known facet from the artifact store.
pub fn load_registry(store: &ArtifactStore) -> Result<SelectorRegistry> {
    SelectorRegistry::from_store(store)
        .wrap_err_with(|| format!("failed to load facets from {}", store.root().display()))
}

/// Print `value` as pretty JSON on stdout, and optionally write it to `outfile`.
pub fn emit_json<T: Serialize>(value: &T, outfile: Option<&PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(path) = outfile {
        fs::write(path, &json).wrap_err_with(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote result");
    }
    println!("{json}");
    Ok(())
}
