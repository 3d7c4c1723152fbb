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

//! Events emitted by the Characters facet.

#![allow(missing_docs)]

use alloy_primitives::Log;
use alloy_sol_types::{sol, SolEvent};
use tracing::info;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    event ContractInformationSet(string name, string symbol, string uri);

    #[derive(Debug, PartialEq, Eq)]
    event InventorySet(address inventoryAddress);

    #[derive(Debug, PartialEq, Eq)]
    event TokenURISet(uint256 indexed tokenId, address indexed changer, string uri);

    #[derive(Debug, PartialEq, Eq)]
    event TokenValiditySet(uint256 indexed tokenId, address indexed changer, bool valid);
}

/// A decoded Characters event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharactersEvent {
    ContractInformationSet(ContractInformationSet),
    InventorySet(InventorySet),
    TokenURISet(TokenURISet),
    TokenValiditySet(TokenValiditySet),
}

impl CharactersEvent {
    /// Decode a log if it is one of the Characters events.
    pub fn decode(log: &Log) -> Option<Self> {
        let topic0 = *log.topics().first()?;
        let data = &log.data;

        if topic0 == ContractInformationSet::SIGNATURE_HASH {
            ContractInformationSet::decode_log_data(data).ok().map(Self::ContractInformationSet)
        } else if topic0 == InventorySet::SIGNATURE_HASH {
            InventorySet::decode_log_data(data).ok().map(Self::InventorySet)
        } else if topic0 == TokenURISet::SIGNATURE_HASH {
            TokenURISet::decode_log_data(data).ok().map(Self::TokenURISet)
        } else if topic0 == TokenValiditySet::SIGNATURE_HASH {
            TokenValiditySet::decode_log_data(data).ok().map(Self::TokenValiditySet)
        } else {
            None
        }
    }
}

/// Every Characters event among `logs`, in order.
pub fn decode_characters_events(logs: &[Log]) -> Vec<CharactersEvent> {
    logs.iter().filter_map(CharactersEvent::decode).collect()
}

/// Log the contract information set by an initializer, if present.
pub fn log_contract_information(logs: &[Log]) {
    for event in decode_characters_events(logs) {
        if let CharactersEvent::ContractInformationSet(info) = event {
            info!(
                name = %info.name,
                symbol = %info.symbol,
                uri = %info.uri,
                "contract information set"
            );
        }
    }
}
