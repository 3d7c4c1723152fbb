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

//! Wing engine: EIP-2535 Diamond selector resolution, diamond-cut
//! construction and deployment of the Great Wyrm contracts.

pub mod bindings;

pub mod chain;
pub use chain::*;

pub mod cut;
pub use cut::*;

pub mod deploy;
pub use deploy::*;

pub mod error;
pub use error::*;

pub mod events;
pub use events::{decode_characters_events, log_contract_information, CharactersEvent};

pub mod facets;
pub use facets::*;

pub mod selector;
pub use selector::*;
