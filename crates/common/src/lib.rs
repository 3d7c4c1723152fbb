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

//! Wing Common - Shared functionality for Wing components
//!
//! This crate provides the pieces shared by the engine and the `wing` binary:
//! loading contract build artifacts, turning their ABIs into facet descriptors,
//! environment variable names and logging setup.

/// Common types used throughout Wing, most importantly facet descriptors
pub mod types;

/// Loading of per-contract build artifacts (ABI and creation bytecode) from disk
pub mod artifact;
/// Environment variable names recognized by Wing
pub mod env;
/// Logging setup and utilities for consistent logging across Wing components
pub mod logging;
/// Helpers for locating workspace test data
pub mod test_utils;

pub use artifact::*;
pub use logging::*;
pub use types::*;
