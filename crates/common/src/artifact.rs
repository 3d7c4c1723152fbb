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

//! Contract build artifacts.
//!
//! An [`ArtifactStore`] points at a directory of `<ContractName>.json` files as
//! produced by brownie (`build/contracts`), hardhat or foundry. Each artifact
//! yields the contract's functions in ABI declaration order, its constructor
//! and, when present, its creation bytecode.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use alloy_json_abi::{Constructor, Function};
use alloy_primitives::Bytes;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, trace};

use crate::FacetDescriptor;

/// Errors raised while loading build artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// No artifact file exists for the contract.
    #[error("artifact for {name} not found at {}", path.display())]
    NotFound {
        /// Contract name
        name: String,
        /// Path that was looked up
        path: PathBuf,
    },
    /// The artifact file exists but could not be read.
    #[error("failed to read artifact {}: {source}", path.display())]
    Io {
        /// Artifact path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
    /// The artifact is not valid JSON or its ABI could not be parsed.
    #[error("malformed artifact for {name}: {reason}")]
    Malformed {
        /// Contract name
        name: String,
        /// What went wrong
        reason: String,
    },
    /// The artifact has no creation bytecode, so the contract cannot be deployed.
    #[error("artifact for {0} has no creation bytecode")]
    MissingBytecode(String),
}

/// A parsed build artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractArtifact {
    /// Contract name, taken from the file name.
    pub name: String,
    /// Functions in ABI declaration order.
    pub functions: Vec<Function>,
    /// Constructor, if the ABI declares one.
    pub constructor: Option<Constructor>,
    /// Creation bytecode, if the artifact carries it.
    pub bytecode: Option<Bytes>,
}

impl ContractArtifact {
    /// Parse an artifact from its JSON text.
    pub fn from_json(name: &str, json: &str) -> Result<Self, ArtifactError> {
        let value: Value = serde_json::from_str(json).map_err(|e| malformed(name, e))?;
        Self::from_value(name, &value)
    }

    /// Parse an artifact from a JSON value: either an object carrying an
    /// `abi` array, or a bare ABI array.
    pub fn from_value(name: &str, value: &Value) -> Result<Self, ArtifactError> {
        let (abi, bytecode) = match value {
            Value::Array(items) => (items.as_slice(), None),
            Value::Object(object) => {
                let abi = object
                    .get("abi")
                    .and_then(Value::as_array)
                    .ok_or_else(|| malformed(name, "missing `abi` array"))?;
                (abi.as_slice(), parse_bytecode(name, object)?)
            }
            _ => return Err(malformed(name, "expected an object or an ABI array")),
        };

        let mut functions = Vec::new();
        let mut constructor = None;
        for item in abi {
            let Some(entry) = item.as_object() else {
                return Err(malformed(name, "ABI entries must be objects"));
            };

            // Entries without a type are functions.
            match entry.get("type").and_then(Value::as_str).unwrap_or("function") {
                "function" => {
                    let function: Function = serde_json::from_value(normalize(entry, "function"))
                        .map_err(|e| malformed(name, e))?;
                    functions.push(function);
                }
                "constructor" => {
                    let parsed: Constructor =
                        serde_json::from_value(normalize(entry, "constructor"))
                            .map_err(|e| malformed(name, e))?;
                    constructor = Some(parsed);
                }
                other => trace!(contract = name, kind = other, "skipping ABI entry"),
            }
        }

        Ok(Self { name: name.to_string(), functions, constructor, bytecode })
    }

    /// The facet view of this artifact.
    pub fn descriptor(&self) -> FacetDescriptor {
        FacetDescriptor::new(self.name.clone(), &self.functions)
    }

    /// Creation bytecode, or an error if the artifact is ABI-only.
    pub fn creation_code(&self) -> Result<&Bytes, ArtifactError> {
        self.bytecode.as_ref().ok_or_else(|| ArtifactError::MissingBytecode(self.name.clone()))
    }
}

/// Fill in the fields older ABI encoders leave out.
fn normalize(entry: &Map<String, Value>, kind: &str) -> Value {
    let mut entry = entry.clone();
    entry.insert("type".into(), Value::String(kind.into()));
    entry.entry("inputs").or_insert_with(|| Value::Array(vec![]));
    if kind == "function" {
        entry.entry("outputs").or_insert_with(|| Value::Array(vec![]));
    }
    if !entry.contains_key("stateMutability") {
        let payable = entry.get("payable").and_then(Value::as_bool).unwrap_or(false);
        let constant = entry.get("constant").and_then(Value::as_bool).unwrap_or(false);
        let mutability = match (payable, constant) {
            (true, _) => "payable",
            (false, true) => "view",
            (false, false) => "nonpayable",
        };
        entry.insert("stateMutability".into(), Value::String(mutability.into()));
    }
    Value::Object(entry)
}

/// `bytecode` is either a hex string or an object with an `object` field.
fn parse_bytecode(name: &str, object: &Map<String, Value>) -> Result<Option<Bytes>, ArtifactError> {
    let raw = match object.get("bytecode") {
        Some(Value::String(code)) => code.as_str(),
        Some(Value::Object(code)) => code.get("object").and_then(Value::as_str).unwrap_or_default(),
        _ => return Ok(None),
    };

    let raw = raw.trim().trim_start_matches("0x");
    if raw.is_empty() {
        return Ok(None);
    }
    if raw.contains("__") {
        return Err(malformed(name, "bytecode has unlinked library placeholders"));
    }

    hex::decode(raw).map(|code| Some(Bytes::from(code))).map_err(|e| malformed(name, e))
}

fn malformed(name: &str, reason: impl ToString) -> ArtifactError {
    ArtifactError::Malformed { name: name.to_string(), reason: reason.to_string() }
}

/// A directory of build artifacts, loaded lazily and cached per contract.
#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    cache: Mutex<HashMap<String, Arc<ContractArtifact>>>,
}

impl ArtifactStore {
    /// Create a store rooted at the given directory. Nothing is read until a
    /// contract is requested.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), cache: Mutex::new(HashMap::new()) }
    }

    /// The artifact directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the artifact for `name`.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    /// Load (or fetch from cache) the artifact of a contract.
    pub fn load(&self, name: &str) -> Result<Arc<ContractArtifact>, ArtifactError> {
        if let Some(artifact) = self.cache.lock().get(name) {
            return Ok(artifact.clone());
        }

        let path = self.path_of(name);
        let json = fs::read_to_string(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => {
                ArtifactError::NotFound { name: name.to_string(), path: path.clone() }
            }
            _ => ArtifactError::Io { path: path.clone(), source },
        })?;

        let artifact = Arc::new(ContractArtifact::from_json(name, &json)?);
        debug!(
            contract = name,
            path = %path.display(),
            functions = artifact.functions.len(),
            deployable = artifact.bytecode.is_some(),
            "loaded artifact"
        );

        self.cache.lock().insert(name.to_string(), artifact.clone());
        Ok(artifact)
    }

    /// The facet descriptor of a contract.
    pub fn descriptor(&self, name: &str) -> Result<FacetDescriptor, ArtifactError> {
        Ok(self.load(name)?.descriptor())
    }
}
