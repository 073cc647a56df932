// tests/normalizer_policy.rs
use dam_suitability::features::DefaultReason;
use dam_suitability::model::{EncoderTable, LabelEncoder};
use dam_suitability::normalize::{FieldKind, FieldOverride};
use dam_suitability::{names, FieldResolutionPolicy, Normalizer, Origin, RawAttributes};

fn soil_table() -> EncoderTable {
    let mut t = EncoderTable::new();
    t.insert(
        names::SOIL_MAIN.to_string(),
        LabelEncoder::new(["Cambisols", "Leptosols", "Luvisols", "Vertisols"]),
    );
    t
}

#[test]
fn policy_is_inspectable() {
    let p = FieldResolutionPolicy::default();
    let soil = p.rule(names::SOIL_MAIN).unwrap();
    assert_eq!(soil.kind, FieldKind::Categorical);
    assert_eq!(soil.default_label.as_deref(), Some("Vertisols"));
    assert_eq!(p.rule(names::SOIL_SECONDARY).unwrap().default_label.as_deref(), Some("Cambisols"));
    assert_eq!(p.rule(names::DAM_TYPE).unwrap().default_label.as_deref(), Some("Earthen"));

    for rule in p.rules().iter().filter(|r| r.kind == FieldKind::Numeric) {
        assert_eq!(rule.default_on_missing, 0.0, "{}", rule.name);
        assert_eq!(rule.default_on_invalid, 0.0, "{}", rule.name);
    }
}

#[test]
fn caller_aliases_resolve() {
    let p = FieldResolutionPolicy::default();
    for (alias, canonical) in [
        ("seismic_zone", names::SEISMIC_ZONE),
        ("slope", names::SLOPE),
        ("max_height", names::MAX_HEIGHT),
        ("dam_length", names::LENGTH),
        ("main_soil_type", names::SOIL_MAIN),
        ("secondary_soil_type", names::SOIL_SECONDARY),
        ("rainfall5YearAvg", names::RAINFALL_5YR_AVG),
        ("monsoonIntensity", names::MONSOON_INTENSITY),
        ("river_distance", names::RIVER_DISTANCE),
        ("River-Flow-Rate", names::RIVER_FLOW_RATE),
    ] {
        assert_eq!(p.resolve_key(alias).map(|r| r.name.as_str()), Some(canonical), "{alias}");
    }
}

#[test]
fn every_value_is_finite_whatever_the_input() {
    let raw: RawAttributes = serde_json::from_str(
        r#"{"elevation": null, "slope": "NaN", "max_height": [1,2], "Seismic_Zone": true,
            "Rainfall_2020": "1e400", "main_soil_type": 42}"#,
    )
    .unwrap();
    let n = Normalizer::default();
    let fs = n.normalize_all(&raw);
    for name in fs.names() {
        assert!(fs.get(name).unwrap().is_finite(), "{name}");
    }
    assert_eq!(fs.origin(names::ELEVATION), Some(Origin::Defaulted(DefaultReason::Missing)));
    assert_eq!(fs.origin(names::MAX_HEIGHT), Some(Origin::Defaulted(DefaultReason::Invalid)));
    assert_eq!(fs.origin("Rainfall_2020"), Some(Origin::Defaulted(DefaultReason::Invalid)));
    assert_eq!(fs.label(names::SOIL_MAIN), Some("42"));
}

#[test]
fn unseen_soil_label_is_deterministic() {
    let n = Normalizer::default();
    let raw = RawAttributes::new().with("main_soil_type", "Gleysols");
    let fs = n.normalize(&raw, &[names::SOIL_MAIN]);
    let table = soil_table();

    let first = n.encode(&fs, &table);
    let second = n.encode(&fs, &table);
    assert_eq!(first, second);
    // falls back to the default label "Vertisols" → index 3
    assert_eq!(first.get(names::SOIL_MAIN), Some(3.0));
    assert_eq!(
        first.origin(names::SOIL_MAIN),
        Some(Origin::Defaulted(DefaultReason::UnknownCategory))
    );
}

#[test]
fn known_label_keeps_its_code() {
    let n = Normalizer::default();
    let raw = RawAttributes::new().with("SoilType_Main", "luvisols");
    let encoded = n.encode(&n.normalize(&raw, &[names::SOIL_MAIN]), &soil_table());
    assert_eq!(encoded.get(names::SOIL_MAIN), Some(2.0));
    assert_eq!(encoded.origin(names::SOIL_MAIN), Some(Origin::Observed));
}

#[test]
fn overridden_default_label_drives_encoding() {
    let policy = FieldResolutionPolicy::default().with_overrides(&[FieldOverride {
        name: names::SOIL_MAIN.into(),
        default_label: Some("Cambisols".into()),
        ..Default::default()
    }]);
    let n = Normalizer::new(policy);
    let fs = n.normalize(&RawAttributes::new(), &[names::SOIL_MAIN]);
    let encoded = n.encode(&fs, &soil_table());
    assert_eq!(encoded.label(names::SOIL_MAIN), Some("Cambisols"));
    assert_eq!(encoded.get(names::SOIL_MAIN), Some(0.0));
}
