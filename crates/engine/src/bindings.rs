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

//! Solidity bindings of the EIP-2535 cut interface.

#![allow(missing_docs)]

use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IDiamondCut {
        struct FacetCut {
            address facetAddress;
            uint8 action;
            bytes4[] functionSelectors;
        }

        event DiamondCut(FacetCut[] diamondCut, address init, bytes data);

        function diamondCut(FacetCut[] calldata diamondCut, address init, bytes calldata data) external;
    }
}
