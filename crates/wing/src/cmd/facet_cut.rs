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

//! `facet-cut` command - add, replace or remove one facet on a Diamond

use std::path::PathBuf;

use alloy_primitives::Address;
use clap::Args;
use eyre::Result;
use tracing::info;
use wing_engine::{Deployer, FacetCut, FacetCutAction, InitializerArgs, Precedence};

use crate::{
    opts::{self, FilterArgs, TxArgs},
    Cli,
};

/// Arguments of `wing facet-cut`
#[derive(Debug, Clone, Args)]
pub struct FacetCutArgs {
    /// Address of the Diamond contract
    #[arg(long)]
    pub address: Address,

    /// Name of the facet to operate on
    #[arg(long, value_parser = opts::facet_name_parser())]
    pub facet_name: String,

    /// Address of the deployed facet (ignored for remove)
    #[arg(long, default_value_t = Address::ZERO)]
    pub facet_address: Address,

    /// Diamond cut action: add, replace or remove (or 0, 1, 2)
    #[arg(long)]
    pub action: FacetCutAction,

    /// Address of the contract running the initializer (defaults to the facet)
    #[arg(long)]
    pub initializer_address: Option<Address>,

    /// Arguments of the facet initializer, in declaration order
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    pub initializer_args: Vec<String>,

    /// Resolve against the base facets only, ignoring the facet's feature
    #[arg(long)]
    pub baseline: bool,

    /// Print the diamondCut transaction without sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Write the JSON result to this file
    #[arg(short, long)]
    pub outfile: Option<PathBuf>,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub tx: TxArgs,
}

impl FacetCutArgs {
    /// The engine request described by these arguments.
    pub fn facet_cut(&self) -> FacetCut {
        let mut cut =
            FacetCut::new(self.address, &self.facet_name, self.facet_address, self.action)
                .with_filter(self.filter.filter());
        if self.baseline {
            cut = cut.with_precedence(Precedence::Baseline);
        }
        cut.initializer_address = self.initializer_address;
        if !self.initializer_args.is_empty() {
            cut.initializer_args = Some(InitializerArgs::Text(self.initializer_args.clone()));
        }
        cut
    }
}

/// Plan the cut and, unless dry-running, submit it.
pub async fn run(cli: &Cli, args: &FacetCutArgs) -> Result<()> {
    let store = opts::artifact_store(cli);
    let registry = opts::load_registry(&store)?;
    let cut = args.facet_cut();

    if args.dry_run {
        let transaction = cut.plan(&registry)?;
        info!(
            facet = %cut.facet_name,
            action = %cut.action,
            selectors = transaction.selector_count(),
            "planned diamond cut"
        );
        return opts::emit_json(&transaction, args.outfile.as_ref());
    }

    let chain = args.tx.connect(cli, store).await?;
    let submitted = Deployer::new(&chain, &registry).facet_cut(&cut).await?;
    opts::emit_json(&submitted, args.outfile.as_ref())
}
