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

//! Error types of the engine.
//!
//! [`CutError`] covers everything that can be rejected locally, before any
//! network call. [`ChainError`] covers the remote side and carries the
//! provider's message verbatim.

use alloy_primitives::TxHash;
use alloy_transport::TransportError;
use thiserror::Error;
use wing_common::ArtifactError;

use crate::FacetCutAction;

/// Errors raised while resolving selectors or building a diamond cut.
#[derive(Debug, Error)]
pub enum CutError {
    /// The facet is not one of the known facets
    #[error("invalid facet: {facet}. Choices: {choices}")]
    UnknownFacet {
        /// Requested facet
        facet: String,
        /// Comma-separated known facets
        choices: String,
    },

    /// The cut action is not `add`, `replace` or `remove`
    #[error("invalid cut action: {0}. Choices: add,replace,remove")]
    InvalidAction(String),

    /// `Add` and `Replace` route selectors to the facet address, which must be set
    #[error("{action} of {facet} needs a non-zero facet address")]
    ZeroFacetAddress {
        /// Facet being cut
        facet: String,
        /// The action
        action: FacetCutAction,
    },

    /// Initializer arguments could not be encoded against the facet's
    /// initializer function
    #[error("failed to encode initializer for {facet}: {reason}")]
    InitializerEncoding {
        /// Facet whose initializer was being encoded
        facet: String,
        /// What went wrong
        reason: String,
    },

    /// A facet artifact could not be loaded
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Errors raised while talking to the chain.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The RPC endpoint or the transport failed
    #[error("rpc error: {0}")]
    Transport(String),

    /// The transaction was mined but reverted
    #[error("transaction {hash} reverted{}", revert_suffix(.reason))]
    Reverted {
        /// Transaction hash
        hash: TxHash,
        /// Revert reason, when replaying the transaction recovered one
        reason: Option<String>,
    },

    /// A create transaction was mined without producing a contract address
    #[error("transaction {0} did not deploy a contract")]
    ContractNotDeployed(TxHash),

    /// Constructor arguments do not match the contract's constructor
    #[error("invalid constructor arguments for {contract}: {reason}")]
    ConstructorArgs {
        /// Contract being deployed
        contract: String,
        /// What went wrong
        reason: String,
    },

    /// The private key could not be parsed
    #[error("invalid private key: {0}")]
    InvalidSigner(String),

    /// The contract artifact could not be loaded
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Any failure of a single engine step.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Local rejection
    #[error(transparent)]
    Cut(#[from] CutError),

    /// Remote failure
    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl From<TransportError> for ChainError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err.to_string())
    }
}

fn revert_suffix(reason: &Option<String>) -> String {
    reason.as_deref().map(|reason| format!(": {reason}")).unwrap_or_default()
}
