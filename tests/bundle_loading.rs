// tests/bundle_loading.rs
use dam_suitability::config::ModelsConfig;
use dam_suitability::model::{BundleError, Regressor};
use dam_suitability::{Dimension, ModelBundle, ModelRegistry};
use std::fs;
use std::path::{Path, PathBuf};

fn shipped_geo_bundle() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("models/geological.json")
}

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let p = dir.join(name);
    fs::write(&p, body).unwrap();
    p
}

#[test]
fn shipped_bundle_loads() {
    let b = ModelBundle::load_from_file(&shipped_geo_bundle()).unwrap();
    assert_eq!(b.dimension, Dimension::Geological);
    assert_eq!(b.n_features(), 7);
    assert!(matches!(b.model, Regressor::RandomForest { ref trees } if trees.len() == 2));
    assert_eq!(b.encoders.len(), 2);
}

#[test]
fn load_error_names_the_file() {
    let err = ModelBundle::load_from_file(Path::new("nope/missing.json")).unwrap_err();
    assert!(format!("{err:#}").contains("nope/missing.json"));
}

#[test]
fn tree_with_out_of_range_feature_is_rejected() {
    let body = r#"{
        "id": "bad", "dimension": "climatic", "feature_names": ["Rainfall_5yr_Avg"],
        "model": {"kind": "random_forest", "trees": [{"nodes": [
            {"feature": 3, "threshold": 0.0, "left": 1, "right": 2},
            {"value": 1.0}, {"value": 2.0}
        ]}]}
    }"#;
    let err = ModelBundle::from_json_str(body).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BundleError>(),
        Some(BundleError::SplitFeatureOutOfRange { feature: 3, n_features: 1, .. })
    ));
}

#[test]
fn empty_encoder_is_rejected() {
    let body = r#"{
        "id": "bad", "dimension": "geological", "feature_names": ["SoilType_Main"],
        "encoders": {"SoilType_Main": {"classes": []}},
        "model": {"kind": "linear", "intercept": 1.0, "coefficients": [1.0]}
    }"#;
    let err = ModelBundle::from_json_str(body).unwrap_err();
    assert_eq!(
        err.downcast_ref::<BundleError>(),
        Some(&BundleError::EmptyEncoder("SoilType_Main".into()))
    );
}

#[test]
fn registry_treats_bad_bundles_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let garbage = write(dir.path(), "clim.json", "{ not json");
    let models = ModelsConfig {
        geological: Some(shipped_geo_bundle()),
        climatic: Some(garbage),
    };
    let reg = ModelRegistry::load(&models);
    assert!(reg.is_loaded(Dimension::Geological));
    assert!(!reg.is_loaded(Dimension::Climatic));
}

#[test]
fn registry_rejects_bundle_in_the_wrong_slot() {
    let models = ModelsConfig {
        geological: None,
        climatic: Some(shipped_geo_bundle()),
    };
    let reg = ModelRegistry::load(&models);
    assert!(!reg.is_loaded(Dimension::Climatic));
    assert!(!reg.is_loaded(Dimension::Geological));
}
