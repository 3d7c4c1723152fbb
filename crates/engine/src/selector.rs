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

//! Selector resolution.
//!
//! A diamond routes each 4-byte selector to exactly one facet. When several
//! facets expose the same function (e.g. `supportsInterface`), the facet that
//! comes first in the [`Precedence`] list keeps it and every later facet loses
//! it. [`SelectorRegistry::resolve`] computes, for one target facet, the
//! selectors it contributes to a cut:
//!
//! 1. every facet strictly ahead of the target reserves all its selectors;
//! 2. the feature ignore rule, if one applies, reserves more;
//! 3. a [`SelectorFilter`] either picks functions explicitly (inclusive mode)
//!    or drops them (exclusive mode, which also drops reserved selectors);
//! 4. the result keeps ABI declaration order.

use std::collections::{BTreeMap, HashSet};

use alloy_primitives::Selector;
use tracing::{debug, warn};
use wing_common::{ArtifactStore, FacetDescriptor};

use crate::{ensure_known_facet, CutError, Precedence, KNOWN_FACETS};

/// Explicit include/exclude filters of a resolution.
///
/// When any include criterion is set the filter is *inclusive*: a function is
/// kept iff its name or its selector is included, and nothing else (not even
/// the reserved set) is consulted. Otherwise it is *exclusive*: a function is
/// kept iff its name is not excluded, its selector is not excluded and its
/// selector is not reserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorFilter {
    /// Method names to keep
    pub include_methods: Vec<String>,
    /// Selectors to keep
    pub include_selectors: Vec<Selector>,
    /// Method names to drop
    pub exclude_methods: Vec<String>,
    /// Selectors to drop
    pub exclude_selectors: Vec<Selector>,
}

impl SelectorFilter {
    /// A filter that keeps everything not reserved.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only these methods (plus any included selectors).
    pub fn include_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_methods.extend(methods.into_iter().map(Into::into));
        self
    }

    /// Keep only these selectors (plus any included methods).
    pub fn include_selectors(mut self, selectors: impl IntoIterator<Item = Selector>) -> Self {
        self.include_selectors.extend(selectors);
        self
    }

    /// Drop these methods.
    pub fn exclude_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_methods.extend(methods.into_iter().map(Into::into));
        self
    }

    /// Drop these selectors.
    pub fn exclude_selectors(mut self, selectors: impl IntoIterator<Item = Selector>) -> Self {
        self.exclude_selectors.extend(selectors);
        self
    }

    /// Whether the filter picks functions explicitly.
    pub fn is_inclusive(&self) -> bool {
        !self.include_methods.is_empty() || !self.include_selectors.is_empty()
    }

    fn keeps(&self, name: &str, selector: &Selector, reserved: &HashSet<Selector>) -> bool {
        if self.is_inclusive() {
            self.include_methods.iter().any(|m| m == name)
                || self.include_selectors.contains(selector)
        } else {
            !self.exclude_methods.iter().any(|m| m == name)
                && !self.exclude_selectors.contains(selector)
                && !reserved.contains(selector)
        }
    }
}

/// The facet descriptors a diamond is assembled from.
#[derive(Debug, Clone, Default)]
pub struct SelectorRegistry {
    facets: BTreeMap<String, FacetDescriptor>,
}

impl SelectorRegistry {
    /// A registry over the given descriptors.
    pub fn new(facets: impl IntoIterator<Item = FacetDescriptor>) -> Self {
        Self { facets: facets.into_iter().map(|facet| (facet.name.clone(), facet)).collect() }
    }

    /// Load every known facet from the artifact store.
    pub fn from_store(store: &ArtifactStore) -> Result<Self, CutError> {
        let facets = KNOWN_FACETS
            .iter()
            .map(|name| store.descriptor(name))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(facets = facets.len(), root = %store.root().display(), "loaded facet registry");
        Ok(Self::new(facets))
    }

    /// The descriptor of a facet.
    pub fn facet(&self, name: &str) -> Option<&FacetDescriptor> {
        self.facets.get(name)
    }

    /// The descriptor of a known facet, or [`CutError::UnknownFacet`].
    pub fn known_facet(&self, name: &str) -> Result<&FacetDescriptor, CutError> {
        ensure_known_facet(name)?;
        self.facets.get(name).ok_or_else(|| CutError::UnknownFacet {
            facet: name.to_string(),
            choices: self.facets.keys().cloned().collect::<Vec<_>>().join(","),
        })
    }

    /// Selectors claimed ahead of `target`: everything exposed by facets
    /// strictly before it in the precedence list (all listed facets if it is
    /// not listed), plus whatever the applicable ignore rule names.
    pub fn reserved(&self, target: &FacetDescriptor, precedence: Precedence) -> HashSet<Selector> {
        let mut reserved = HashSet::new();

        for name in precedence.facets().into_iter().take_while(|name| *name != target.name) {
            // A listed facet without a descriptor reserves nothing.
            if let Some(facet) = self.facets.get(name) {
                reserved.extend(facet.selectors());
            }
        }

        if let Some(rule) = precedence.ignore_rule_for(&target.name) {
            for method in rule.methods {
                reserved.extend(target.selectors_of(method));
            }
            reserved.extend(rule.selectors.iter().copied());
        }

        reserved
    }

    /// The ordered selectors `target` contributes to a cut.
    ///
    /// An empty result is valid and only logged.
    pub fn resolve(
        &self,
        target: &str,
        precedence: Precedence,
        filter: &SelectorFilter,
    ) -> Result<Vec<Selector>, CutError> {
        let facet = self.known_facet(target)?;
        let reserved = self.reserved(facet, precedence);

        let selectors: Vec<Selector> = facet
            .functions
            .iter()
            .filter(|function| filter.keeps(&function.name, &function.selector, &reserved))
            .map(|function| function.selector)
            .collect();

        debug!(
            facet = target,
            ?precedence,
            inclusive = filter.is_inclusive(),
            reserved = reserved.len(),
            selectors = selectors.len(),
            "resolved facet selectors"
        );
        if selectors.is_empty() {
            warn!(facet = target, "no selectors resolved for facet");
        }

        Ok(selectors)
    }
}
