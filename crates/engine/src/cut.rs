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

//! Diamond cut construction.
//!
//! A [`FacetCut`] request names a facet, an action and filters. Planning it
//! against a [`SelectorRegistry`] resolves the selectors and hands them to
//! [`build_cut`], which produces the [`CutTransaction`] submitted as a single
//! `diamondCut` call.

use std::{fmt, str::FromStr};

use alloy_dyn_abi::{DynSolValue, JsonAbiExt, Specifier};
use alloy_json_abi::Function;
use alloy_primitives::{Address, Bytes, Selector, U256};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wing_common::FacetDescriptor;

use crate::{
    bindings::IDiamondCut, CutError, Precedence, SelectorFilter, SelectorRegistry,
    CHARACTERS_FACET,
};

/// The three EIP-2535 cut actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FacetCutAction {
    /// Route new selectors to the facet
    Add = 0,
    /// Re-route existing selectors to the facet
    Replace = 1,
    /// Drop selectors from the diamond
    Remove = 2,
}

impl FacetCutAction {
    /// Numeric code used on chain.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl From<FacetCutAction> for u8 {
    fn from(action: FacetCutAction) -> Self {
        action.code()
    }
}

impl TryFrom<u8> for FacetCutAction {
    type Error = CutError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Add),
            1 => Ok(Self::Replace),
            2 => Ok(Self::Remove),
            other => Err(CutError::InvalidAction(other.to_string())),
        }
    }
}

impl FromStr for FacetCutAction {
    type Err = CutError;

    /// Accepts `add`, `replace`, `remove` (any case) or the numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "replace" => Ok(Self::Replace),
            "remove" => Ok(Self::Remove),
            other => other
                .parse::<u8>()
                .map_err(|_| CutError::InvalidAction(s.to_string()))
                .and_then(Self::try_from),
        }
    }
}

impl fmt::Display for FacetCutAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Replace => write!(f, "replace"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// One element of a `diamondCut` batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutInstruction {
    /// Facet the selectors are routed to; zero for [`FacetCutAction::Remove`]
    pub facet_address: Address,
    /// The action
    pub action: FacetCutAction,
    /// Selectors, in ABI declaration order
    pub function_selectors: Vec<Selector>,
}

impl From<&CutInstruction> for IDiamondCut::FacetCut {
    fn from(cut: &CutInstruction) -> Self {
        Self {
            facetAddress: cut.facet_address,
            action: cut.action.code(),
            functionSelectors: cut.function_selectors.clone(),
        }
    }
}

/// A complete `diamondCut` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutTransaction {
    /// The diamond receiving the cut
    pub diamond: Address,
    /// The batch
    pub cuts: Vec<CutInstruction>,
    /// Contract delegate-called after the cut; zero when there is no calldata
    pub init_address: Address,
    /// Initializer calldata
    pub calldata: Bytes,
}

impl CutTransaction {
    /// ABI-encoded `diamondCut(FacetCut[],address,bytes)` input.
    pub fn encode(&self) -> Bytes {
        IDiamondCut::diamondCutCall {
            diamondCut: self.cuts.iter().map(Into::into).collect(),
            init: self.init_address,
            data: self.calldata.clone(),
        }
        .abi_encode()
        .into()
    }

    /// Total number of selectors across the batch.
    pub fn selector_count(&self) -> usize {
        self.cuts.iter().map(|cut| cut.function_selectors.len()).sum()
    }
}

/// Arguments of a facet initializer.
#[derive(Debug, Clone, PartialEq)]
pub enum InitializerArgs {
    /// Already typed values
    Values(Vec<DynSolValue>),
    /// Text to be coerced against the initializer's parameter types
    Text(Vec<String>),
}

impl InitializerArgs {
    fn len(&self) -> usize {
        match self {
            Self::Values(values) => values.len(),
            Self::Text(raw) => raw.len(),
        }
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Arguments of `CharactersFacet.init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharactersInit {
    /// Terminus contract gating administration
    pub admin_terminus_address: Address,
    /// Pool of administrator badges
    pub admin_terminus_pool_id: U256,
    /// Pool of badges burned to create a character
    pub character_creation_terminus_pool_id: U256,
    /// ERC-721 name
    pub name: String,
    /// ERC-721 symbol
    pub symbol: String,
    /// Contract URI
    pub uri: String,
}

impl CharactersInit {
    /// Default ERC-721 name of a fresh deployment.
    pub const DEFAULT_NAME: &'static str = "Great Wyrm Characters";
    /// Default ERC-721 symbol of a fresh deployment.
    pub const DEFAULT_SYMBOL: &'static str = "WYRM";
}

impl From<CharactersInit> for InitializerArgs {
    fn from(init: CharactersInit) -> Self {
        Self::Values(vec![
            DynSolValue::Address(init.admin_terminus_address),
            DynSolValue::Uint(init.admin_terminus_pool_id, 256),
            DynSolValue::Uint(init.character_creation_terminus_pool_id, 256),
            DynSolValue::String(init.name),
            DynSolValue::String(init.symbol),
            DynSolValue::String(init.uri),
        ])
    }
}

/// Facets that must be initialized once, with the name of their initializer
/// function.
pub const FACET_INITIALIZERS: [(&str, &str); 1] = [(CHARACTERS_FACET, "init")];

/// The initializer function name of a facet, if it has one.
pub fn initializer_of(facet: &str) -> Option<&'static str> {
    FACET_INITIALIZERS.iter().find(|(name, _)| *name == facet).map(|(_, method)| *method)
}

/// Encode a call to the facet's initializer.
pub fn encode_initializer(
    facet: &FacetDescriptor,
    args: &InitializerArgs,
) -> Result<Bytes, CutError> {
    let encoding_error =
        |reason: String| CutError::InitializerEncoding { facet: facet.name.clone(), reason };

    let method = initializer_of(&facet.name)
        .ok_or_else(|| encoding_error("facet has no registered initializer".to_string()))?;
    let function = facet
        .function(method)
        .ok_or_else(|| encoding_error(format!("ABI has no `{method}` function")))?;

    if args.len() != function.inputs.len() {
        return Err(encoding_error(format!(
            "{} expects {} arguments, got {}",
            function.signature(),
            function.inputs.len(),
            args.len()
        )));
    }

    let values = match args {
        InitializerArgs::Values(values) => values.clone(),
        InitializerArgs::Text(raw) => coerce_args(function, raw).map_err(encoding_error)?,
    };

    function.abi_encode_input(&values).map(Bytes::from).map_err(|e| encoding_error(e.to_string()))
}

fn coerce_args(function: &Function, raw: &[String]) -> Result<Vec<DynSolValue>, String> {
    function
        .inputs
        .iter()
        .zip(raw)
        .map(|(param, arg)| {
            let ty = param.resolve().map_err(|e| format!("could not resolve {param}: {e}"))?;
            ty.coerce_str(arg).map_err(|e| format!("could not parse {arg:?} as {ty}: {e}"))
        })
        .collect()
}

/// Assemble a `diamondCut` call from resolved selectors.
///
/// `Remove` always targets the zero address; `Add` and `Replace` need a
/// non-zero facet address. Initializer calldata is only produced for `Add` on
/// a facet with a registered initializer; without calldata the initializer
/// address is zero as well and any initializer arguments are dropped. With
/// calldata and no initializer address, the facet itself is the initializer.
pub fn build_cut(
    diamond: Address,
    facet: &FacetDescriptor,
    facet_address: Address,
    action: FacetCutAction,
    selectors: Vec<Selector>,
    initializer_address: Option<Address>,
    initializer_args: Option<&InitializerArgs>,
) -> Result<CutTransaction, CutError> {
    let target = match action {
        FacetCutAction::Remove => Address::ZERO,
        FacetCutAction::Add | FacetCutAction::Replace if facet_address.is_zero() => {
            return Err(CutError::ZeroFacetAddress { facet: facet.name.clone(), action });
        }
        FacetCutAction::Add | FacetCutAction::Replace => facet_address,
    };

    let calldata = match (action, initializer_of(&facet.name)) {
        (FacetCutAction::Add, Some(method)) => {
            let args = initializer_args.ok_or_else(|| CutError::InitializerEncoding {
                facet: facet.name.clone(),
                reason: format!("missing arguments for `{method}`"),
            })?;
            encode_initializer(facet, args)?
        }
        _ => {
            if initializer_args.is_some_and(|args| !args.is_empty()) {
                warn!(
                    facet = %facet.name,
                    %action,
                    "ignoring initializer arguments without an initializer call"
                );
            }
            Bytes::new()
        }
    };

    let init_address = if calldata.is_empty() {
        if let Some(address) = initializer_address.filter(|a| !a.is_zero()) {
            warn!(facet = %facet.name, %address, "ignoring initializer address without calldata");
        }
        Address::ZERO
    } else {
        initializer_address.filter(|a| !a.is_zero()).unwrap_or(facet_address)
    };

    debug!(
        facet = %facet.name,
        %action,
        target = %target,
        selectors = selectors.len(),
        init = %init_address,
        calldata_len = calldata.len(),
        "built diamond cut"
    );

    Ok(CutTransaction {
        diamond,
        cuts: vec![CutInstruction { facet_address: target, action, function_selectors: selectors }],
        init_address,
        calldata,
    })
}

/// A request to cut one facet onto (or off) a diamond.
#[derive(Debug, Clone)]
pub struct FacetCut {
    /// The diamond
    pub diamond: Address,
    /// The facet name
    pub facet_name: String,
    /// Deployed facet address
    pub facet_address: Address,
    /// The action
    pub action: FacetCutAction,
    /// Include/exclude filters
    pub filter: SelectorFilter,
    /// Precedence override; derived from the facet when unset
    pub precedence: Option<Precedence>,
    /// Initializer contract
    pub initializer_address: Option<Address>,
    /// Initializer arguments
    pub initializer_args: Option<InitializerArgs>,
}

impl FacetCut {
    /// A cut with no filters and no initializer.
    pub fn new(
        diamond: Address,
        facet_name: impl Into<String>,
        facet_address: Address,
        action: FacetCutAction,
    ) -> Self {
        Self {
            diamond,
            facet_name: facet_name.into(),
            facet_address,
            action,
            filter: SelectorFilter::default(),
            precedence: None,
            initializer_address: None,
            initializer_args: None,
        }
    }

    /// Set the selector filter.
    pub fn with_filter(mut self, filter: SelectorFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Force a precedence list.
    pub fn with_precedence(mut self, precedence: Precedence) -> Self {
        self.precedence = Some(precedence);
        self
    }

    /// Set the initializer.
    pub fn with_initializer(
        mut self,
        address: Option<Address>,
        args: impl Into<InitializerArgs>,
    ) -> Self {
        self.initializer_address = address;
        self.initializer_args = Some(args.into());
        self
    }

    /// The precedence this cut resolves with.
    pub fn precedence(&self) -> Precedence {
        self.precedence.unwrap_or_else(|| Precedence::for_facet(&self.facet_name))
    }

    /// Resolve selectors and build the transaction. No network access.
    pub fn plan(&self, registry: &SelectorRegistry) -> Result<CutTransaction, CutError> {
        let facet = registry.known_facet(&self.facet_name)?;
        let selectors = registry.resolve(&self.facet_name, self.precedence(), &self.filter)?;
        build_cut(
            self.diamond,
            facet,
            self.facet_address,
            self.action,
            selectors,
            self.initializer_address,
            self.initializer_args.as_ref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, fixed_bytes};
    use parking_lot::Mutex;
    use std::{io, sync::Arc};

    const DIAMOND: Address = address!("00000000000000000000000000000000000000d1");
    const FACET: Address = address!("00000000000000000000000000000000000000f1");
    const TERMINUS: Address = address!("0000000000000000000000000000000000000e71");

    fn characters() -> FacetDescriptor {
        FacetDescriptor::parse(
            "CharactersFacet",
            [
                "function init(address,uint256,uint256,string,string,string)",
                "function createCharacter(address)",
            ],
        )
        .unwrap()
    }

    /// Log sink shared between a scoped subscriber and the test.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let value = tracing::subscriber::with_default(subscriber, f);
        (value, captured.contents())
    }

    fn characters_init() -> CharactersInit {
        CharactersInit {
            admin_terminus_address: TERMINUS,
            admin_terminus_pool_id: U256::from(1),
            character_creation_terminus_pool_id: U256::from(2),
            name: "Name".into(),
            symbol: "SYM".into(),
            uri: "uri".into(),
        }
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("add".parse::<FacetCutAction>().unwrap(), FacetCutAction::Add);
        assert_eq!("Replace".parse::<FacetCutAction>().unwrap(), FacetCutAction::Replace);
        assert_eq!("2".parse::<FacetCutAction>().unwrap(), FacetCutAction::Remove);
        assert!(matches!("delete".parse::<FacetCutAction>(), Err(CutError::InvalidAction(_))));
        assert!(matches!("3".parse::<FacetCutAction>(), Err(CutError::InvalidAction(_))));
    }

    #[test]
    fn test_add_with_initializer_encodes_calldata() {
        let facet = characters();
        let args = InitializerArgs::from(characters_init());
        let cut = build_cut(
            DIAMOND,
            &facet,
            FACET,
            FacetCutAction::Add,
            vec![fixed_bytes!("aabbccdd")],
            Some(FACET),
            Some(&args),
        )
        .unwrap();

        let init = facet.function("init").unwrap();
        assert_eq!(&cut.calldata[..4], init.selector().as_slice());
        assert_eq!(cut.init_address, FACET);
        assert_eq!(cut.cuts[0].facet_address, FACET);
    }

    #[test]
    fn test_remove_has_zero_target_and_no_calldata() {
        let facet = characters();
        let args = InitializerArgs::from(characters_init());
        let cut = build_cut(
            DIAMOND,
            &facet,
            FACET,
            FacetCutAction::Remove,
            vec![fixed_bytes!("aabbccdd")],
            Some(FACET),
            Some(&args),
        )
        .unwrap();

        assert_eq!(cut.cuts[0].facet_address, Address::ZERO);
        assert!(cut.calldata.is_empty());
        assert_eq!(cut.init_address, Address::ZERO);
    }

    #[test]
    fn test_missing_initializer_args() {
        let err = build_cut(DIAMOND, &characters(), FACET, FacetCutAction::Add, vec![], None, None)
            .unwrap_err();
        assert!(matches!(err, CutError::InitializerEncoding { .. }));
    }

    #[test]
    fn test_malformed_initializer_args() {
        let facet = characters();

        let too_few = InitializerArgs::Text(vec!["0x01".into()]);
        assert!(matches!(
            encode_initializer(&facet, &too_few),
            Err(CutError::InitializerEncoding { .. })
        ));

        let not_an_address = InitializerArgs::Text(
            ["nope", "1", "2", "Name", "SYM", "uri"].map(String::from).to_vec(),
        );
        assert!(matches!(
            encode_initializer(&facet, &not_an_address),
            Err(CutError::InitializerEncoding { .. })
        ));
    }

    #[test]
    fn test_text_args_match_typed_args() {
        let facet = characters();
        let typed = encode_initializer(&facet, &characters_init().into()).unwrap();
        let text = encode_initializer(
            &facet,
            &InitializerArgs::Text(vec![
                TERMINUS.to_string(),
                "1".into(),
                "2".into(),
                "Name".into(),
                "SYM".into(),
                "uri".into(),
            ]),
        )
        .unwrap();
        assert_eq!(typed, text);
    }

    #[test]
    fn test_facet_without_initializer_drops_init_address() {
        let ownership =
            FacetDescriptor::parse("OwnershipFacet", ["function owner() view returns (address)"])
                .unwrap();
        let cut = build_cut(
            DIAMOND,
            &ownership,
            FACET,
            FacetCutAction::Add,
            vec![fixed_bytes!("8da5cb5b")],
            Some(FACET),
            None,
        )
        .unwrap();

        assert!(cut.calldata.is_empty());
        assert_eq!(cut.init_address, Address::ZERO);
    }

    #[test]
    fn test_instruction_json_shape() {
        let instruction = CutInstruction {
            facet_address: FACET,
            action: FacetCutAction::Replace,
            function_selectors: vec![fixed_bytes!("8da5cb5b")],
        };
        let json = serde_json::to_value(&instruction).unwrap();

        assert_eq!(
            json["facetAddress"].as_str().unwrap().to_lowercase(),
            FACET.to_string().to_lowercase()
        );
        assert_eq!(json["action"], 1);
        assert_eq!(json["functionSelectors"][0], "0x8da5cb5b");
    }

    #[test]
    fn test_encoded_call_targets_diamond_cut() {
        let cut = CutTransaction {
            diamond: DIAMOND,
            cuts: vec![CutInstruction {
                facet_address: FACET,
                action: FacetCutAction::Add,
                function_selectors: vec![fixed_bytes!("8da5cb5b")],
            }],
            init_address: Address::ZERO,
            calldata: Bytes::new(),
        };

        let encoded = cut.encode();
        assert_eq!(&encoded[..4], &fixed_bytes!("1f931c1c")[..]);
        let decoded = IDiamondCut::diamondCutCall::abi_decode(&encoded).unwrap();
        assert_eq!(decoded.diamondCut[0].functionSelectors, cut.cuts[0].function_selectors);
        assert_eq!(cut.selector_count(), 1);
    }

    #[test]
    fn test_zero_facet_address_is_rejected_for_add_and_replace() {
        let ownership =
            FacetDescriptor::parse("OwnershipFacet", ["function owner() view returns (address)"])
                .unwrap();

        for action in [FacetCutAction::Add, FacetCutAction::Replace] {
            let err = build_cut(
                DIAMOND,
                &ownership,
                Address::ZERO,
                action,
                vec![fixed_bytes!("8da5cb5b")],
                None,
                None,
            )
            .unwrap_err();
            assert!(matches!(
                err,
                CutError::ZeroFacetAddress { ref facet, action: rejected }
                    if facet == "OwnershipFacet" && rejected == action
            ));
            assert!(err.to_string().contains("non-zero facet address"));
        }

        let cut = build_cut(
            DIAMOND,
            &ownership,
            Address::ZERO,
            FacetCutAction::Remove,
            vec![fixed_bytes!("8da5cb5b")],
            None,
            None,
        )
        .unwrap();
        assert_eq!(cut.cuts[0].facet_address, Address::ZERO);
    }

    #[test]
    fn test_dropped_initializer_args_are_logged() {
        let facet = characters();
        let args = InitializerArgs::from(characters_init());

        for action in [FacetCutAction::Replace, FacetCutAction::Remove] {
            let (cut, logs) = with_captured_logs(|| {
                build_cut(
                    DIAMOND,
                    &facet,
                    FACET,
                    action,
                    vec![fixed_bytes!("aabbccdd")],
                    None,
                    Some(&args),
                )
                .unwrap()
            });
            assert!(cut.calldata.is_empty());
            assert!(logs.contains("WARN"), "{logs}");
            assert!(logs.contains("ignoring initializer arguments"), "{logs}");
        }

        let empty = InitializerArgs::Text(vec![]);
        let (_, logs) = with_captured_logs(|| {
            build_cut(DIAMOND, &facet, FACET, FacetCutAction::Replace, vec![], None, Some(&empty))
                .unwrap()
        });
        assert!(!logs.contains("ignoring initializer arguments"), "{logs}");
    }
}
