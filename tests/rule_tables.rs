// tests/rule_tables.rs
use dam_suitability::config::ScoringConfig;
use dam_suitability::rules::{climatic_breakdown_v2, geological_breakdown, RuleVersion};
use dam_suitability::{
    names, score_climatic, score_geological, Category, ModelRegistry, RawAttributes,
    ScoreSource, SuitabilityEngine,
};

fn documented_site() -> RawAttributes {
    RawAttributes::new()
        .with("seismic_zone", 2)
        .with("main_soil_type", "Vertisols")
        .with("elevation", 120)
        .with("slope", 1.5)
        .with("max_height", 20)
}

fn rules_engine(version: RuleVersion) -> SuitabilityEngine {
    let mut cfg = ScoringConfig::default();
    cfg.scoring.rules = version;
    SuitabilityEngine::new(&cfg, ModelRegistry::empty())
}

#[test]
fn documented_example_is_eighty_and_excellent() {
    let engine = rules_engine(RuleVersion::V2);
    let fs = engine.prepare(&documented_site());
    let b = geological_breakdown(&fs);

    let parts: Vec<(&str, f64)> = b.contributions.iter().map(|c| (c.factor, c.points)).collect();
    assert_eq!(
        parts,
        vec![
            ("seismic_zone", 20.0),
            ("soil_type", 20.0),
            ("elevation", 15.0),
            ("slope", 15.0),
            ("max_height", 10.0),
        ]
    );

    let a = engine.score_site(&documented_site());
    assert_eq!(a.geological.score, 80.0);
    assert_eq!(a.geological.category, Category::Excellent);
}

#[test]
fn defaulted_soil_label_does_not_score_as_vertisol() {
    // Soil missing: the policy substitutes "Vertisols" for the model path,
    // but the rule table treats it as unmatched.
    let raw = RawAttributes::new().with("seismic_zone", 1);
    let engine = rules_engine(RuleVersion::V2);
    let fs = engine.prepare(&raw);
    assert_eq!(fs.label(names::SOIL_MAIN), Some("Vertisols"));
    assert_eq!(score_geological(&fs), 25.0 + 10.0);
}

#[test]
fn sparse_input_only_lowers_the_score() {
    let engine = rules_engine(RuleVersion::V2);
    let a = engine.score_site(&RawAttributes::new());
    assert_eq!(a.geological.score, 10.0);
    assert_eq!(a.climatic.score, 0.0);
    assert_eq!(a.overall.category, Category::Poor);
}

#[test]
fn rainfall_series_feeds_average_and_cv() {
    let raw = RawAttributes::new()
        .with("Rainfall_2020", 950)
        .with("Rainfall_2021", 1000)
        .with("Rainfall_2022", 1050)
        .with("monsoonIntensity", 18);
    let engine = rules_engine(RuleVersion::V2);
    let fs = engine.prepare(&raw);
    let b = climatic_breakdown_v2(&fs, 3);

    // 5-year average filled from the series (1000) → 25
    assert_eq!(b.points_for("rainfall_avg"), Some(25.0));
    assert_eq!(b.points_for("monsoon_intensity"), Some(20.0));
    assert_eq!(b.points_for("rainfall_cv"), Some(20.0));
    assert_eq!(score_climatic(&fs), 65.0);
}

#[test]
fn v1_and_v2_disagree_on_climate() {
    let raw = RawAttributes::new()
        .with("rainfall5YearAvg", 1000)
        .with("river_distance", 20)
        .with("Heatwave_Days_PerYear", 2)
        .with("Cyclone_Exposure", 0);

    let v2 = rules_engine(RuleVersion::V2).score_site(&raw);
    let v1 = rules_engine(RuleVersion::V1).score_site(&raw);

    // v2: rainfall 25 + distance 10
    assert_eq!(v2.climatic.score, 35.0);
    assert_eq!(v2.sources.climatic, ScoreSource::RuleBasedV2);
    // v1: rainfall 25 + heatwave 10 + cyclone 5
    assert_eq!(v1.climatic.score, 40.0);
    assert_eq!(v1.sources.climatic, ScoreSource::RuleBasedV1);
}

#[test]
fn string_values_are_coerced_before_scoring() {
    let raw = RawAttributes::new()
        .with("Seismic_Zone", "3")
        .with("Slope(%)", " 7.5 ")
        .with("Elevation", "unknown");
    let a = rules_engine(RuleVersion::V2).score_site(&raw);
    // 15 (zone 3) + 10 (unmatched soil) + 8 (slope) ; elevation skipped
    assert_eq!(a.geological.score, 33.0);
}

#[test]
fn unknown_seismic_zone_scores_ten_but_absent_zone_is_skipped() {
    let engine = rules_engine(RuleVersion::V2);

    let fs = engine.prepare(&RawAttributes::new().with("seismic_zone", "unknown"));
    assert_eq!(geological_breakdown(&fs).points_for("seismic_zone"), Some(10.0));

    let fs = engine.prepare(&RawAttributes::new().with("seismic_zone", "zone three"));
    assert_eq!(geological_breakdown(&fs).points_for("seismic_zone"), Some(10.0));

    let fs = engine.prepare(&RawAttributes::new().with("seismic_zone", 7));
    assert_eq!(geological_breakdown(&fs).points_for("seismic_zone"), Some(10.0));

    let fs = engine.prepare(&RawAttributes::new());
    assert_eq!(geological_breakdown(&fs).points_for("seismic_zone"), None);

    // 10 (unlisted zone) + 10 (unmatched soil)
    let a = engine.score_site(&RawAttributes::new().with("seismic_zone", "Unknown"));
    assert_eq!(a.geological.score, 20.0);
}
