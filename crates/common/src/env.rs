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

//! Environment variable name constants for Wing configuration.
//!
//! Every variable listed here can also be given as a CLI argument, which takes
//! precedence over the environment. A `.env` file in the working directory is
//! loaded before arguments are parsed.
//!
//! # Environment Variables
//!
//! - [`ETH_RPC_URL`] - JSON-RPC endpoint of the target chain
//! - [`WING_ARTIFACTS_DIR`] - Directory holding contract build artifacts
//! - [`WING_PRIVATE_KEY`] - Hex private key used to sign transactions

/// Environment variable for the JSON-RPC endpoint of the target chain.
///
/// # Default
///
/// `http://localhost:8545` when neither the variable nor `--rpc-url` is set.
///
/// # Examples
///
/// ```bash
/// ETH_RPC_URL=https://polygon-rpc.com wing diamond-gogogo
/// ```
pub const ETH_RPC_URL: &str = "ETH_RPC_URL";

/// Environment variable for the directory holding `<ContractName>.json` build artifacts.
///
/// Brownie (`build/contracts`), hardhat and foundry artifact layouts are all
/// accepted, as are bare ABI arrays (which cannot be deployed, only cut).
///
/// # Default
///
/// [`DEFAULT_ARTIFACTS_DIR`], relative to the working directory.
pub const WING_ARTIFACTS_DIR: &str = "WING_ARTIFACTS_DIR";

/// Environment variable for the private key that signs deployment and cut transactions.
///
/// # Warning
///
/// Prefer a `.env` file over exporting this in an interactive shell.
pub const WING_PRIVATE_KEY: &str = "WING_PRIVATE_KEY";

/// Default location of build artifacts, matching the brownie project layout.
pub const DEFAULT_ARTIFACTS_DIR: &str = "build/contracts";
