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

//! Deployment procedures.
//!
//! Each procedure is a fixed sequence of deploy and attach steps. The first
//! failing step ends the procedure: the returned [`DeploymentResult`] lists
//! what was deployed and attached so far and carries the error. Passing the
//! already-deployed addresses back in resumes from where it stopped.
//!
//! # Steps
//!
//! `diamond_gogogo`:
//! 1. `DiamondCutFacet`
//! 2. `Diamond(owner, DiamondCutFacet)`
//! 3. `DiamondLoupeFacet`
//! 4. `OwnershipFacet`
//! 5. attach `DiamondLoupeFacet`, then `OwnershipFacet`
//!
//! `characters_gogogo` runs the above with the sender as owner, then deploys
//! and attaches `CharactersFacet`, initializing it in the same cut.

use std::collections::BTreeMap;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    log_contract_information, CharactersInit, DiamondChain, EngineError, FacetCut,
    FacetCutAction, Feature, Precedence, SelectorRegistry, SubmittedTx, CHARACTERS_FACET, DIAMOND,
    DIAMOND_CUT_FACET, DIAMOND_LOUPE_FACET, OWNERSHIP_FACET,
};

/// Outcome of a deployment procedure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentResult {
    /// Contract name to address, for every contract deployed or reused
    pub contracts: BTreeMap<String, Address>,
    /// Facets attached so far, in order
    pub attached: Vec<String>,
    /// Why the procedure stopped early
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeploymentResult {
    /// Whether every step succeeded.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Address recorded for a contract.
    pub fn address_of(&self, contract: &str) -> Option<Address> {
        self.contracts.get(contract).copied()
    }

    fn fail(&mut self, message: String, err: &EngineError) {
        error!(%err, "{message}");
        self.error = Some(format!("{message}: {err}"));
    }
}

/// Addresses of already-deployed base Diamond contracts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExistingContracts {
    /// `DiamondCutFacet`
    pub diamond_cut: Option<Address>,
    /// `Diamond`
    pub diamond: Option<Address>,
    /// `DiamondLoupeFacet`
    pub diamond_loupe: Option<Address>,
    /// `OwnershipFacet`
    pub ownership: Option<Address>,
}

/// Runs deployment procedures against a chain.
#[derive(Debug)]
pub struct Deployer<'a, C> {
    chain: &'a C,
    registry: &'a SelectorRegistry,
}

impl<'a, C: DiamondChain> Deployer<'a, C> {
    /// A deployer resolving cuts with `registry` and sending them through `chain`.
    pub fn new(chain: &'a C, registry: &'a SelectorRegistry) -> Self {
        Self { chain, registry }
    }

    /// Plan and submit one cut.
    pub async fn facet_cut(&self, cut: &FacetCut) -> Result<SubmittedTx, EngineError> {
        let transaction = cut.plan(self.registry)?;
        info!(
            facet = %cut.facet_name,
            action = %cut.action,
            diamond = %cut.diamond,
            selectors = transaction.selector_count(),
            "submitting diamond cut"
        );
        Ok(self.chain.submit_cut(&transaction).await?)
    }

    /// Deploy `contract` unless an address is given. Records the address.
    async fn deploy_or_reuse(
        &self,
        result: &mut DeploymentResult,
        contract: &str,
        existing: Option<Address>,
        args: Vec<DynSolValue>,
    ) -> Option<Address> {
        let address = match existing {
            Some(address) => {
                info!(contract, %address, "using existing deployment");
                address
            }
            None => match self.chain.deploy(contract, args).await {
                Ok(address) => address,
                Err(err) => {
                    result.fail(format!("Failed to deploy {contract}"), &err.into());
                    return None;
                }
            },
        };
        result.contracts.insert(contract.to_string(), address);
        Some(address)
    }

    /// Submit `cut`. Records the facet as attached.
    async fn attach(&self, result: &mut DeploymentResult, cut: FacetCut) -> Option<SubmittedTx> {
        match self.facet_cut(&cut).await {
            Ok(submitted) => {
                result.attached.push(cut.facet_name);
                Some(submitted)
            }
            Err(err) => {
                result.fail(format!("Failed to attach {}", cut.facet_name), &err);
                None
            }
        }
    }

    /// Deploy a Diamond with its base facets and attach the loupe and
    /// ownership facets.
    pub async fn diamond_gogogo(
        &self,
        owner: Address,
        existing: ExistingContracts,
    ) -> DeploymentResult {
        let mut result = DeploymentResult::default();
        let _ = self.run_diamond(&mut result, owner, existing).await;
        result
    }

    async fn run_diamond(
        &self,
        result: &mut DeploymentResult,
        owner: Address,
        existing: ExistingContracts,
    ) -> Option<Address> {
        let cut_facet =
            self.deploy_or_reuse(result, DIAMOND_CUT_FACET, existing.diamond_cut, vec![]).await?;
        let diamond = self
            .deploy_or_reuse(
                result,
                DIAMOND,
                existing.diamond,
                vec![DynSolValue::Address(owner), DynSolValue::Address(cut_facet)],
            )
            .await?;
        let loupe = self
            .deploy_or_reuse(result, DIAMOND_LOUPE_FACET, existing.diamond_loupe, vec![])
            .await?;
        let ownership =
            self.deploy_or_reuse(result, OWNERSHIP_FACET, existing.ownership, vec![]).await?;

        for (facet, address) in [(DIAMOND_LOUPE_FACET, loupe), (OWNERSHIP_FACET, ownership)] {
            let cut = FacetCut::new(diamond, facet, address, FacetCutAction::Add)
                .with_precedence(Precedence::Baseline);
            self.attach(result, cut).await?;
        }

        Some(diamond)
    }

    /// Deploy a Diamond (owned by the sender) and attach an initialized
    /// `CharactersFacet` to it.
    pub async fn characters_gogogo(
        &self,
        init: CharactersInit,
        existing: ExistingContracts,
        characters_facet: Option<Address>,
    ) -> DeploymentResult {
        let mut result = DeploymentResult::default();
        let Some(diamond) = self.run_diamond(&mut result, self.chain.sender(), existing).await
        else {
            return result;
        };

        let Some(facet) =
            self.deploy_or_reuse(&mut result, CHARACTERS_FACET, characters_facet, vec![]).await
        else {
            return result;
        };

        let cut = FacetCut::new(diamond, CHARACTERS_FACET, facet, FacetCutAction::Add)
            .with_precedence(Precedence::Feature(Feature::Characters))
            .with_initializer(Some(facet), init);
        if let Some(submitted) = self.attach(&mut result, cut).await {
            log_contract_information(&submitted.logs);
        }

        result
    }
}
