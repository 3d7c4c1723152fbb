//! Artifact store tests against the shared fixtures.

use std::fs;

use alloy_primitives::fixed_bytes;
use tracing::{debug, info};
use wing_common::{
    test_utils::{create_temp_artifacts_dir, testdata_store},
    ArtifactError, ArtifactStore,
};

#[test]
fn test_diamond_constructor_and_bytecode() {
    wing_common::logging::ensure_test_logging(None);
    info!("Testing Diamond artifact loading");

    let store = testdata_store();
    let diamond = store.load("Diamond").unwrap();

    let constructor = diamond.constructor.as_ref().unwrap();
    let inputs: Vec<&str> = constructor.inputs.iter().map(|p| p.ty.as_str()).collect();
    assert_eq!(inputs, ["address", "address"]);
    assert!(diamond.functions.is_empty());
    assert!(!diamond.creation_code().unwrap().is_empty());
}

#[test]
fn test_characters_descriptor_skips_events() {
    wing_common::logging::ensure_test_logging(None);

    let descriptor = testdata_store().descriptor("CharactersFacet").unwrap();
    debug!(functions = descriptor.functions.len(), "loaded CharactersFacet");

    assert_eq!(
        descriptor.functions[0].signature,
        "init(address,uint256,uint256,string,string,string)"
    );
    assert!(descriptor.functions.iter().all(|f| f.name != "ContractInformationSet"));
    assert_eq!(descriptor.selectors_of("safeTransferFrom").count(), 2);
    assert!(descriptor.by_selector(&fixed_bytes!("01ffc9a7")).is_some());
}

#[test]
fn test_store_caches_loaded_artifacts() {
    wing_common::logging::ensure_test_logging(None);
    let dir = create_temp_artifacts_dir();
    let store = ArtifactStore::new(dir.path());

    let first = store.load("OwnershipFacet").unwrap();
    fs::remove_file(store.path_of("OwnershipFacet")).unwrap();

    let cached = store.load("OwnershipFacet").unwrap();
    assert_eq!(first, cached);

    let fresh = ArtifactStore::new(dir.path());
    assert!(matches!(fresh.load("OwnershipFacet"), Err(ArtifactError::NotFound { .. })));
}

#[test]
fn test_missing_abi_is_malformed() {
    wing_common::logging::ensure_test_logging(None);
    let dir = create_temp_artifacts_dir();
    fs::write(dir.path().join("Broken.json"), r#"{"contractName": "Broken"}"#).unwrap();

    let err = ArtifactStore::new(dir.path()).load("Broken").unwrap_err();
    assert!(matches!(err, ArtifactError::Malformed { .. }));
    assert!(err.to_string().contains("Broken"));
}
