//! `selectors` command - show what a facet would contribute to a cut, offline

use clap::Args;
use eyre::Result;
use serde::Serialize;
use wing_engine::{Feature, Precedence};

use crate::{
    opts::{self, FilterArgs},
    Cli,
};

/// Arguments of `wing selectors`
#[derive(Debug, Clone, Args)]
pub struct SelectorsArgs {
    /// Name of the facet
    #[arg(long, value_parser = opts::facet_name_parser())]
    pub facet_name: String,

    /// Resolve with this feature's precedence instead of the facet's own
    #[arg(long, conflicts_with = "baseline")]
    pub feature: Option<Feature>,

    /// Resolve against the base facets only
    #[arg(long)]
    pub baseline: bool,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Debug, Serialize)]
struct ResolvedSelector<'a> {
    selector: String,
    signature: &'a str,
}

/// Print the resolved selectors with their signatures as JSON.
pub fn run(cli: &Cli, args: &SelectorsArgs) -> Result<()> {
    let store = opts::artifact_store(cli);
    let registry = opts::load_registry(&store)?;

    let precedence = match (args.baseline, args.feature) {
        (true, _) => Precedence::Baseline,
        (false, Some(feature)) => Precedence::Feature(feature),
        (false, None) => Precedence::for_facet(&args.facet_name),
    };
    let selectors = registry.resolve(&args.facet_name, precedence, &args.filter.filter())?;

    let facet = registry.known_facet(&args.facet_name)?;
    let resolved: Vec<ResolvedSelector<'_>> = selectors
        .iter()
        .filter_map(|selector| {
            facet.by_selector(selector).map(|function| ResolvedSelector {
                selector: selector.to_string(),
                signature: &function.signature,
            })
        })
        .collect();

    opts::emit_json(&resolved, None)
}
