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

//! Static facet configuration: the known facets, the feature groupings built
//! on top of the base Diamond, and the precedence lists used to decide which
//! facet owns a selector.

use std::{fmt, str::FromStr};

use alloy_primitives::Selector;
use serde::{Deserialize, Serialize};

use crate::CutError;

/// The proxy contract. Deployable, but not a facet.
pub const DIAMOND: &str = "Diamond";
/// Facet exposing `diamondCut`.
pub const DIAMOND_CUT_FACET: &str = "DiamondCutFacet";
/// Facet exposing the EIP-2535 loupe functions.
pub const DIAMOND_LOUPE_FACET: &str = "DiamondLoupeFacet";
/// Facet exposing ERC-173 ownership.
pub const OWNERSHIP_FACET: &str = "OwnershipFacet";
/// The Great Wyrm characters facet.
pub const CHARACTERS_FACET: &str = "CharactersFacet";

/// Every facet that can be cut onto a diamond.
pub const KNOWN_FACETS: [&str; 4] =
    [DIAMOND_CUT_FACET, DIAMOND_LOUPE_FACET, OWNERSHIP_FACET, CHARACTERS_FACET];

/// Precedence of the base Diamond facets, highest first.
pub const BASELINE_PRECEDENCE: [&str; 3] = [DIAMOND_CUT_FACET, OWNERSHIP_FACET, DIAMOND_LOUPE_FACET];

/// Whether `name` is a known facet.
pub fn is_known_facet(name: &str) -> bool {
    KNOWN_FACETS.contains(&name)
}

/// Reject anything that is not a known facet.
pub fn ensure_known_facet(name: &str) -> Result<(), CutError> {
    if is_known_facet(name) {
        Ok(())
    } else {
        Err(CutError::UnknownFacet { facet: name.to_string(), choices: KNOWN_FACETS.join(",") })
    }
}

/// Methods and raw selectors a feature never cuts, even though they appear in
/// its facets' ABIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureIgnoreRule {
    /// Ignored method names (all overloads)
    pub methods: &'static [&'static str],
    /// Ignored raw selectors
    pub selectors: &'static [Selector],
}

/// A group of facets layered on top of the base Diamond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// Great Wyrm characters
    Characters,
}

impl Feature {
    /// All features.
    pub const ALL: [Self; 1] = [Self::Characters];

    /// The facets making up this feature, in precedence order.
    pub const fn facets(self) -> &'static [&'static str] {
        match self {
            Self::Characters => &[CHARACTERS_FACET],
        }
    }

    /// What this feature never cuts. `init` runs once through the cut's
    /// initializer and must not stay callable.
    pub const fn ignore_rule(self) -> FeatureIgnoreRule {
        match self {
            Self::Characters => FeatureIgnoreRule { methods: &["init"], selectors: &[] },
        }
    }

    /// The feature a facet belongs to, if any.
    pub fn from_facet(facet: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|feature| feature.facets().contains(&facet))
    }

    /// Whether the facet belongs to this feature.
    pub fn contains(self, facet: &str) -> bool {
        self.facets().contains(&facet)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Characters => write!(f, "characters"),
        }
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "characters" => Ok(Self::Characters),
            other => Err(format!("unknown feature: {other}")),
        }
    }
}

/// Which precedence list applies to a cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precedence {
    /// Base Diamond facets only.
    #[default]
    Baseline,
    /// Base Diamond facets followed by a feature's facets. The feature's
    /// ignore rule applies to its own facets.
    Feature(Feature),
}

impl Precedence {
    /// The precedence a facet is cut with: its feature's list if it belongs
    /// to one, baseline otherwise.
    pub fn for_facet(facet: &str) -> Self {
        Feature::from_facet(facet).map_or(Self::Baseline, Self::Feature)
    }

    /// Facet names, highest precedence first.
    pub fn facets(self) -> Vec<&'static str> {
        let mut facets = BASELINE_PRECEDENCE.to_vec();
        if let Self::Feature(feature) = self {
            facets.extend_from_slice(feature.facets());
        }
        facets
    }

    /// The feature, if any.
    pub const fn feature(self) -> Option<Feature> {
        match self {
            Self::Baseline => None,
            Self::Feature(feature) => Some(feature),
        }
    }

    /// The ignore rule that applies to `facet` under this precedence.
    pub fn ignore_rule_for(self, facet: &str) -> Option<FeatureIgnoreRule> {
        self.feature().filter(|feature| feature.contains(facet)).map(Feature::ignore_rule)
    }
}
