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

use std::{borrow::Borrow, fmt};

use alloy_json_abi::Function;
use alloy_primitives::Selector;
use serde::{Deserialize, Serialize};

/// A function exposed by a facet, together with its derived selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetFunction {
    /// The function name, e.g. `createCharacter`.
    pub name: String,
    /// The canonical signature, e.g. `createCharacter(address)`.
    pub signature: String,
    /// First four bytes of the keccak256 hash of [`Self::signature`].
    pub selector: Selector,
    /// The full function ABI.
    pub abi: Function,
}

impl<T> From<T> for FacetFunction
where
    T: Borrow<Function>,
{
    fn from(function: T) -> Self {
        let function = function.borrow();
        Self {
            name: function.name.clone(),
            signature: function.signature(),
            selector: function.selector(),
            abi: function.clone(),
        }
    }
}

impl fmt::Display for FacetFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.selector, self.signature)
    }
}

/// A named facet and the functions it exposes, in ABI declaration order.
///
/// Declaration order matters: selector lists derived from a descriptor are
/// emitted in that order so that cuts are reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetDescriptor {
    /// The facet identifier, e.g. `DiamondLoupeFacet`.
    pub name: String,
    /// The exposed functions.
    pub functions: Vec<FacetFunction>,
}

impl FacetDescriptor {
    /// Build a descriptor from function ABIs, keeping their order.
    pub fn new<I, T>(name: impl Into<String>, functions: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Borrow<Function>,
    {
        Self { name: name.into(), functions: functions.into_iter().map(FacetFunction::from).collect() }
    }

    /// Build a descriptor from human-readable signatures such as
    /// `function init(address,uint256)`.
    ///
    /// Mostly useful for tests and fixtures.
    pub fn parse<'a>(
        name: impl Into<String>,
        signatures: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, alloy_json_abi::parser::Error> {
        let functions =
            signatures.into_iter().map(Function::parse).collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(name, functions))
    }

    /// All selectors in declaration order.
    pub fn selectors(&self) -> impl Iterator<Item = Selector> + '_ {
        self.functions.iter().map(|f| f.selector)
    }

    /// Selectors of every function with the given name (all overloads).
    pub fn selectors_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = Selector> + 'a {
        self.functions.iter().filter(move |f| f.name == name).map(|f| f.selector)
    }

    /// The first function with the given name.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name).map(|f| &f.abi)
    }

    /// The function owning the given selector.
    pub fn by_selector(&self, selector: &Selector) -> Option<&FacetFunction> {
        self.functions.iter().find(|f| &f.selector == selector)
    }
}

impl fmt::Display for FacetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Facet: {} ({} functions)", self.name, self.functions.len())?;
        for function in &self.functions {
            writeln!(f, "  {function}")?;
        }
        Ok(())
    }
}

/// Parse a raw selector given as `0x`-prefixed or bare hex (`"1f931c1c"`).
pub fn parse_selector(raw: &str) -> Result<Selector, alloy_primitives::hex::FromHexError> {
    raw.trim().parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::fixed_bytes;

    #[test]
    fn test_selector_derivation() {
        let facet = FacetDescriptor::parse(
            "OwnershipFacet",
            ["function owner() view returns (address)", "function transferOwnership(address)"],
        )
        .unwrap();

        assert_eq!(facet.functions[0].signature, "owner()");
        assert_eq!(facet.functions[0].selector, fixed_bytes!("8da5cb5b"));
        assert_eq!(facet.functions[1].signature, "transferOwnership(address)");
        assert_eq!(facet.functions[1].selector, fixed_bytes!("f2fde38b"));
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let facet = FacetDescriptor::parse(
            "Ordered",
            ["function zeta()", "function alpha()", "function mid(uint256)"],
        )
        .unwrap();

        let names: Vec<_> = facet.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_overloads_share_a_name() {
        let facet = FacetDescriptor::parse(
            "Overloaded",
            [
                "function safeTransferFrom(address,address,uint256)",
                "function safeTransferFrom(address,address,uint256,bytes)",
            ],
        )
        .unwrap();

        assert_eq!(facet.selectors_of("safeTransferFrom").count(), 2);
        assert_eq!(facet.function("safeTransferFrom").unwrap().inputs.len(), 3);
    }

    #[test]
    fn test_parse_selector_accepts_both_forms() {
        assert_eq!(parse_selector("0x1f931c1c").unwrap(), fixed_bytes!("1f931c1c"));
        assert_eq!(parse_selector("1f931c1c").unwrap(), fixed_bytes!("1f931c1c"));
        assert!(parse_selector("0x1f93").is_err());
        assert!(parse_selector("not-hex!").is_err());
    }
}
