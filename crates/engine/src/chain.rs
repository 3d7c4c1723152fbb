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

//! Chain access.
//!
//! [`DiamondChain`] is everything the deployment procedures need from a
//! network: deploy a contract from its artifact and submit a diamond cut.
//! [`AlloyChain`] implements it over a JSON-RPC endpoint with a local signer.

use std::{fmt, future::Future, str::FromStr, sync::Arc, time::Duration};

use alloy_dyn_abi::{DynSolValue, JsonAbiExt};
use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, Bytes, Log, TxHash};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::{BlockId, TransactionReceipt, TransactionRequest};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::decode_revert_reason;
use alloy_transport::TransportError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wing_common::{ArtifactStore, ContractArtifact};

use crate::{ChainError, CutTransaction};

/// Default JSON-RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// A mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedTx {
    /// Transaction hash
    pub transaction_hash: TxHash,
    /// Block the transaction was mined in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Gas used
    pub gas_used: u64,
    /// Emitted logs
    #[serde(skip)]
    pub logs: Vec<Log>,
}

impl From<&TransactionReceipt> for SubmittedTx {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            logs: receipt.inner.logs().iter().map(|log| log.inner.clone()).collect(),
        }
    }
}

/// What the deployment procedures need from a network.
///
/// Calls are awaited one at a time; implementations do not need to support
/// concurrent submissions.
pub trait DiamondChain {
    /// The account sending transactions.
    fn sender(&self) -> Address;

    /// Deploy `contract` from its artifact with the given constructor
    /// arguments and return the new address.
    fn deploy(
        &self,
        contract: &str,
        args: Vec<DynSolValue>,
    ) -> impl Future<Output = Result<Address, ChainError>> + Send;

    /// Submit a `diamondCut` call and wait for it to be mined.
    fn submit_cut(
        &self,
        cut: &CutTransaction,
    ) -> impl Future<Output = Result<SubmittedTx, ChainError>> + Send;
}

/// Transaction options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxConfig {
    /// Gas limit; estimated when unset
    pub gas_limit: Option<u64>,
    /// EIP-1559 fee cap in wei; estimated when unset
    pub max_fee_per_gas: Option<u128>,
    /// EIP-1559 tip cap in wei; estimated when unset
    pub max_priority_fee_per_gas: Option<u128>,
    /// Confirmations to wait for
    pub confirmations: u64,
    /// How long to wait for a receipt; forever when unset
    pub timeout: Option<Duration>,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            gas_limit: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
            confirmations: 1,
            timeout: None,
        }
    }
}

impl TxConfig {
    /// Set the gas limit.
    pub fn with_gas_limit(mut self, gas_limit: Option<u64>) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Set the fee caps.
    pub fn with_fees(mut self, max_fee: Option<u128>, max_priority_fee: Option<u128>) -> Self {
        self.max_fee_per_gas = max_fee;
        self.max_priority_fee_per_gas = max_priority_fee;
        self
    }

    /// Set the number of confirmations. Zero is treated as one.
    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    /// Set the receipt timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn apply(&self, mut tx: TransactionRequest) -> TransactionRequest {
        if let Some(gas_limit) = self.gas_limit {
            tx = tx.with_gas_limit(gas_limit);
        }
        if let Some(max_fee) = self.max_fee_per_gas {
            tx = tx.with_max_fee_per_gas(max_fee);
        }
        if let Some(max_priority_fee) = self.max_priority_fee_per_gas {
            tx = tx.with_max_priority_fee_per_gas(max_priority_fee);
        }
        tx
    }
}

/// Parse a hex private key, with or without `0x`.
pub fn parse_private_key(key: &str) -> Result<PrivateKeySigner, ChainError> {
    PrivateKeySigner::from_str(key.trim()).map_err(|e| ChainError::InvalidSigner(e.to_string()))
}

/// [`DiamondChain`] over a JSON-RPC endpoint.
#[derive(Clone)]
pub struct AlloyChain {
    provider: DynProvider,
    sender: Address,
    store: Arc<ArtifactStore>,
    config: TxConfig,
}

impl fmt::Debug for AlloyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlloyChain")
            .field("sender", &self.sender)
            .field("artifacts", &self.store.root())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AlloyChain {
    /// A chain over an already-built provider whose wallet signs for `sender`.
    pub fn new(
        provider: DynProvider,
        sender: Address,
        store: Arc<ArtifactStore>,
        config: TxConfig,
    ) -> Self {
        Self { provider, sender, store, config }
    }

    /// Connect to `rpc_url`, signing with `signer`.
    pub async fn connect(
        rpc_url: &str,
        signer: PrivateKeySigner,
        store: Arc<ArtifactStore>,
        config: TxConfig,
    ) -> Result<Self, ChainError> {
        let sender = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::new(signer))
            .connect(rpc_url)
            .await?
            .erased();

        let chain_id = provider.get_chain_id().await?;
        info!(rpc_url, chain_id, %sender, ?config, "connected");

        Ok(Self::new(provider, sender, store, config))
    }

    async fn send(&self, tx: TransactionRequest) -> Result<TransactionReceipt, ChainError> {
        let tx = self.config.apply(tx.with_from(self.sender));

        let pending = self.provider.send_transaction(tx.clone()).await?;
        debug!(tx_hash = %pending.tx_hash(), "transaction sent");

        let receipt = pending
            .with_required_confirmations(self.config.confirmations)
            .with_timeout(self.config.timeout)
            .get_receipt()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        if !receipt.status() {
            let reason = self.replay(tx, receipt.block_number).await;
            return Err(ChainError::Reverted { hash: receipt.transaction_hash, reason });
        }
        Ok(receipt)
    }

    /// Re-run a reverted transaction as a call against the block it was mined
    /// in and return the revert reason the node reports.
    async fn replay(&self, tx: TransactionRequest, block: Option<u64>) -> Option<String> {
        let mut call = self.provider.call(tx);
        if let Some(block) = block {
            call = call.block(BlockId::number(block));
        }
        match call.await {
            Ok(_) => {
                debug!("reverted transaction succeeds when replayed");
                None
            }
            Err(err) => Some(revert_reason(&err)),
        }
    }
}

/// The decoded `Error(string)`/panic reason of a failed call, the raw revert
/// data if it does not decode, or the node's message if there is no data.
fn revert_reason(err: &TransportError) -> String {
    err.as_error_resp()
        .and_then(|payload| payload.as_revert_data())
        .map(|data| decode_revert_reason(&data).unwrap_or_else(|| data.to_string()))
        .unwrap_or_else(|| err.to_string())
}

/// Creation code followed by the ABI-encoded constructor arguments.
fn deploy_code(artifact: &ContractArtifact, args: &[DynSolValue]) -> Result<Bytes, ChainError> {
    let mut code = artifact.creation_code()?.to_vec();
    match &artifact.constructor {
        Some(constructor) => {
            let encoded =
                constructor.abi_encode_input(args).map_err(|e| ChainError::ConstructorArgs {
                    contract: artifact.name.clone(),
                    reason: e.to_string(),
                })?;
            code.extend(encoded);
        }
        None if !args.is_empty() => {
            return Err(ChainError::ConstructorArgs {
                contract: artifact.name.clone(),
                reason: format!("no constructor, got {} arguments", args.len()),
            });
        }
        None => {}
    }
    Ok(code.into())
}

fn deployed_address(receipt: &TransactionReceipt) -> Result<Address, ChainError> {
    receipt.contract_address.ok_or(ChainError::ContractNotDeployed(receipt.transaction_hash))
}

impl DiamondChain for AlloyChain {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn deploy(&self, contract: &str, args: Vec<DynSolValue>) -> Result<Address, ChainError> {
        let artifact = self.store.load(contract)?;
        let code = deploy_code(&artifact, &args)?;

        info!(contract, "deploying");
        let receipt = self.send(TransactionRequest::default().with_deploy_code(code)).await?;
        let address = deployed_address(&receipt)?;

        info!(contract, %address, tx_hash = %receipt.transaction_hash, "deployed");
        Ok(address)
    }

    async fn submit_cut(&self, cut: &CutTransaction) -> Result<SubmittedTx, ChainError> {
        let tx = TransactionRequest::default().with_to(cut.diamond).with_input(cut.encode());
        let receipt = self.send(tx).await?;

        let submitted = SubmittedTx::from(&receipt);
        info!(
            diamond = %cut.diamond,
            tx_hash = %submitted.transaction_hash,
            gas_used = submitted.gas_used,
            "diamond cut mined"
        );
        Ok(submitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_json_rpc::ErrorPayload;
    use alloy_primitives::B256;
    use alloy_sol_types::{Revert, SolError, SolEvent};
    use alloy_transport::mock::Asserter;
    use serde_json::json;
    use wing_common::test_utils::testdata_store;

    use crate::{decode_characters_events, events::ContractInformationSet, CharactersEvent};

    // anvil's first dev account
    const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TX_HASH: TxHash = TxHash::repeat_byte(0xaa);
    const DIAMOND_CUT_REVERT: &str = "LibDiamondCut: Can't add function that already exists";

    /// A chain whose provider answers from `asserter` instead of a node.
    fn mocked_chain(asserter: Asserter) -> AlloyChain {
        let signer = parse_private_key(ANVIL_KEY).unwrap();
        let sender = signer.address();
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .with_simple_nonce_management()
            .with_chain_id(31337)
            .wallet(EthereumWallet::new(signer))
            .connect_mocked_client(asserter)
            .erased();
        let config = TxConfig::default().with_gas_limit(Some(6_000_000)).with_fees(Some(10), Some(1));
        AlloyChain::new(provider, sender, Arc::new(testdata_store()), config)
    }

    fn revert_payload(reason: &str) -> ErrorPayload {
        let data = Bytes::from(Revert { reason: reason.to_string() }.abi_encode());
        let payload = json!({
            "code": 3,
            "message": "execution reverted",
            "data": data,
        });
        serde_json::from_str(&payload.to_string()).unwrap()
    }

    fn receipt(contract_address: Option<Address>, logs: Vec<Log>) -> TransactionReceipt {
        let block_hash = B256::repeat_byte(0xbb);
        let logs: Vec<_> = logs
            .iter()
            .enumerate()
            .map(|(index, log)| {
                json!({
                    "address": log.address,
                    "topics": log.topics(),
                    "data": log.data.data,
                    "blockHash": block_hash,
                    "blockNumber": "0x5",
                    "transactionHash": TX_HASH,
                    "transactionIndex": "0x0",
                    "logIndex": format!("{index:#x}"),
                    "removed": false,
                })
            })
            .collect();

        let receipt = json!({
            "type": "0x2",
            "status": "0x1",
            "transactionHash": TX_HASH,
            "transactionIndex": "0x0",
            "blockHash": block_hash,
            "blockNumber": "0x5",
            "from": Address::repeat_byte(0x5e),
            "to": if contract_address.is_some() { None } else { Some(Address::repeat_byte(0xd1)) },
            "contractAddress": contract_address,
            "gasUsed": "0x5208",
            "cumulativeGasUsed": "0x5208",
            "effectiveGasPrice": "0x1",
            "logs": logs,
            "logsBloom": format!("0x{}", "0".repeat(512)),
        });
        serde_json::from_str(&receipt.to_string()).unwrap()
    }

    #[test]
    fn test_tx_config_defaults() {
        let config = TxConfig::default();
        assert_eq!(config.confirmations, 1);
        assert!(config.gas_limit.is_none());
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_tx_config_builder() {
        let config = TxConfig::default()
            .with_gas_limit(Some(6_000_000))
            .with_fees(Some(100), Some(2))
            .with_confirmations(0)
            .with_timeout(Some(Duration::from_secs(30)));

        assert_eq!(config.confirmations, 1);

        let tx = config.apply(TransactionRequest::default());
        assert_eq!(tx.gas, Some(6_000_000));
        assert_eq!(tx.max_fee_per_gas, Some(100));
        assert_eq!(tx.max_priority_fee_per_gas, Some(2));
    }

    #[test]
    fn test_parse_private_key() {
        let signer = parse_private_key(ANVIL_KEY).unwrap();
        assert_eq!(
            signer.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>().unwrap()
        );
        assert_eq!(parse_private_key(&ANVIL_KEY[2..]).unwrap().address(), signer.address());
        assert!(matches!(parse_private_key("0x1234"), Err(ChainError::InvalidSigner(_))));
    }

    #[test]
    fn test_deploy_code_appends_constructor_args() {
        let store = testdata_store();
        let diamond = store.load("Diamond").unwrap();
        let owner = Address::repeat_byte(0x0e);
        let cut_facet = Address::repeat_byte(0xc0);

        let code = deploy_code(
            &diamond,
            &[DynSolValue::Address(owner), DynSolValue::Address(cut_facet)],
        )
        .unwrap();

        let creation = diamond.creation_code().unwrap();
        assert_eq!(code.len(), creation.len() + 64);
        assert_eq!(&code[..creation.len()], &creation[..]);
        assert_eq!(&code[creation.len() + 12..creation.len() + 32], owner.as_slice());
        assert_eq!(&code[creation.len() + 44..], cut_facet.as_slice());
    }

    #[test]
    fn test_deploy_code_rejects_mismatched_args() {
        let store = testdata_store();

        let ownership = store.load("OwnershipFacet").unwrap();
        assert_eq!(deploy_code(&ownership, &[]).unwrap(), *ownership.creation_code().unwrap());
        let err = deploy_code(&ownership, &[DynSolValue::Address(Address::ZERO)]).unwrap_err();
        assert!(matches!(err, ChainError::ConstructorArgs { ref contract, .. } if contract == "OwnershipFacet"));

        let diamond = store.load("Diamond").unwrap();
        let err = deploy_code(&diamond, &[DynSolValue::Address(Address::ZERO)]).unwrap_err();
        assert!(matches!(err, ChainError::ConstructorArgs { .. }));
    }

    #[test]
    fn test_receipt_without_contract_address() {
        let deployed = Address::repeat_byte(0xdd);
        assert_eq!(deployed_address(&receipt(Some(deployed), vec![])).unwrap(), deployed);
        assert!(matches!(
            deployed_address(&receipt(None, vec![])),
            Err(ChainError::ContractNotDeployed(hash)) if hash == TX_HASH
        ));
    }

    #[test]
    fn test_submitted_tx_keeps_receipt_logs() {
        let info = ContractInformationSet {
            name: "Great Wyrm Characters".into(),
            symbol: "WYRM".into(),
            uri: String::new(),
        };
        let log = Log { address: Address::repeat_byte(0xd1), data: info.encode_log_data() };

        let submitted = SubmittedTx::from(&receipt(None, vec![log.clone()]));

        assert_eq!(submitted.transaction_hash, TX_HASH);
        assert_eq!(submitted.block_number, Some(5));
        assert_eq!(submitted.gas_used, 21_000);
        assert_eq!(submitted.logs, [log]);
        assert_eq!(
            decode_characters_events(&submitted.logs),
            [CharactersEvent::ContractInformationSet(info)]
        );
    }

    #[test]
    fn test_revert_reason_decodes_error_string() {
        let err = TransportError::ErrorResp(revert_payload(DIAMOND_CUT_REVERT));
        assert!(revert_reason(&err).contains(DIAMOND_CUT_REVERT));

        let without_data: ErrorPayload =
            serde_json::from_str(r#"{"code":-32000,"message":"nonce too low"}"#).unwrap();
        let err = TransportError::ErrorResp(without_data);
        assert!(revert_reason(&err).contains("nonce too low"));
    }

    #[test]
    fn test_reverted_error_carries_reason() {
        let with_reason =
            ChainError::Reverted { hash: TX_HASH, reason: Some(DIAMOND_CUT_REVERT.to_string()) };
        assert!(with_reason.to_string().ends_with(&format!("reverted: {DIAMOND_CUT_REVERT}")));

        let without_reason = ChainError::Reverted { hash: TX_HASH, reason: None };
        assert!(without_reason.to_string().ends_with("reverted"));
    }

    #[tokio::test]
    async fn test_replay_returns_node_revert_reason() {
        let asserter = Asserter::new();
        asserter.push_failure(revert_payload(DIAMOND_CUT_REVERT));
        let chain = mocked_chain(asserter);

        let tx = TransactionRequest::default()
            .with_from(chain.sender())
            .with_to(Address::repeat_byte(0xd1));
        let reason = chain.replay(tx, Some(5)).await.unwrap();
        assert!(reason.contains(DIAMOND_CUT_REVERT));
    }

    #[tokio::test]
    async fn test_deploy_rejects_args_before_sending() {
        // No queued responses: any request would fail with a transport error.
        let chain = mocked_chain(Asserter::new());

        let err = chain
            .deploy("OwnershipFacet", vec![DynSolValue::Address(Address::ZERO)])
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::ConstructorArgs { .. }));

        let err = chain.deploy("Missing", vec![]).await.unwrap_err();
        assert!(matches!(err, ChainError::Artifact(_)));
    }

    #[tokio::test]
    async fn test_send_failure_is_surfaced_verbatim() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("insufficient funds for gas * price + value");
        let chain = mocked_chain(asserter);

        let err = chain.deploy("DiamondCutFacet", vec![]).await.unwrap_err();
        assert!(matches!(err, ChainError::Transport(_)));
        assert!(err.to_string().contains("insufficient funds for gas * price + value"));
    }
}
