//! # Feature Normalizer
//!
//! Maps heterogeneous caller keys onto the canonical vocabulary, coerces values
//! to `f64` and substitutes defaults for anything missing, invalid or unknown.
//!
//! - Resolution is driven by a [`FieldResolutionPolicy`]: an explicit table of
//!   field → aliases, default-on-missing, default-on-invalid and (for
//!   categorical fields) the default label.
//! - Key lookup is case-insensitive and ignores punctuation, so `Slope(%)`,
//!   `slope` and `SLOPE` all hit the same field.
//! - Coercion never fails towards the caller; every substitution is recorded in
//!   the resulting `FeatureSet` origin and logged at debug level.
//! - Categorical encoding uses a bundle's encoder table; labels the encoder has
//!   never seen fall back to the field's default label first.

use crate::attributes::{RawAttributes, RawValue};
use crate::features::{names, DefaultReason, FeatureSet, Origin};
use crate::model::encoder::EncoderTable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Tokens a caller sends in place of a value. They resolve to the missing
/// default but stay distinguishable from an absent field.
const PLACEHOLDER_TOKENS: [&str; 3] = ["unknown", "nan", "n/a"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Numeric,
    Categorical,
}

/// One row of the resolution policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub default_on_missing: f64,
    #[serde(default)]
    pub default_on_invalid: f64,
    /// Categorical only: label used when the value is missing or unseen.
    #[serde(default)]
    pub default_label: Option<String>,
}

impl FieldRule {
    pub fn numeric(name: &str, aliases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Numeric,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            default_on_missing: 0.0,
            default_on_invalid: 0.0,
            default_label: None,
        }
    }

    pub fn categorical(name: &str, aliases: &[&str], default_label: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Categorical,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            default_on_missing: 0.0,
            default_on_invalid: 0.0,
            default_label: Some(default_label.to_string()),
        }
    }
}

/// Partial update of a policy row, as read from `[[fields]]` in the config.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldOverride {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub default_on_missing: Option<f64>,
    pub default_on_invalid: Option<f64>,
    pub default_label: Option<String>,
}

/// The enumerable table of field → default behaviour.
#[derive(Debug, Clone)]
pub struct FieldResolutionPolicy {
    rules: Vec<FieldRule>,
    by_key: HashMap<String, usize>,
}

impl Default for FieldResolutionPolicy {
    fn default() -> Self {
        Self::gujarat_seed()
    }
}

impl FieldResolutionPolicy {
    pub fn from_rules(rules: Vec<FieldRule>) -> Self {
        let mut policy = Self {
            rules,
            by_key: HashMap::new(),
        };
        policy.reindex();
        policy
    }

    /// Built-in policy for the Gujarat catalogue. Numeric fields default to
    /// 0.0; soils default to the dominant regional classes.
    pub fn gujarat_seed() -> Self {
        use names::*;

        let mut rules = vec![
            FieldRule::numeric(SEISMIC_ZONE, &["seismic_zone", "zone"]),
            FieldRule::numeric(ELEVATION, &["elevation_m", "altitude"]),
            FieldRule::numeric(SLOPE, &["slope_pct", "slope_percent"]),
            FieldRule::numeric(LENGTH, &["dam_length", "length"]),
            FieldRule::numeric(MAX_HEIGHT, &["max_height", "height", "dam_height"]),
            FieldRule::numeric(LATITUDE, &["lat"]),
            FieldRule::numeric(LONGITUDE, &["lon", "lng"]),
            FieldRule::numeric(RIVER_DISTANCE, &["river_distance", "river_distance_km"]),
            FieldRule::numeric(RIVER_FLOW_RATE, &["river_flow_rate", "river_flow"]),
            FieldRule::categorical(
                SOIL_MAIN,
                &["main_soil_type", "soil_type", "soil"],
                "Vertisols",
            ),
            FieldRule::categorical(SOIL_SECONDARY, &["secondary_soil_type"], "Cambisols"),
            FieldRule::categorical(DAM_TYPE, &["dam_type"], "Earthen"),
            FieldRule::numeric(RAINFALL_5YR_AVG, &["rainfall5YearAvg", "rainfall_avg"]),
            FieldRule::numeric(RAINFALL_STDDEV_5YR, &["rainfall_std", "rainfall_stddev_5yr"]),
            FieldRule::numeric(MAX_ANNUAL_RAINFALL, &["max_rainfall"]),
            FieldRule::numeric(MIN_ANNUAL_RAINFALL, &["min_rainfall"]),
            FieldRule::numeric(MONSOON_INTENSITY, &["monsoonIntensity", "monsoon_intensity"]),
            FieldRule::numeric(EXTREME_RAINFALL_DAYS, &["extreme_rainfall_days"]),
            FieldRule::numeric(FLOOD_RISK_INDEX, &["flood_risk"]),
            FieldRule::numeric(CYCLONE_EXPOSURE, &["cyclone"]),
            FieldRule::numeric(AVG_TEMPERATURE, &["avg_temperature", "temperature"]),
            FieldRule::numeric(MAX_TEMPERATURE, &["max_temperature"]),
            FieldRule::numeric(TEMPERATURE_STDDEV, &["temperature_std", "temp_std"]),
            FieldRule::numeric(HEATWAVE_DAYS, &["heatwave_days", "heatwave"]),
            FieldRule::numeric(ENSO_IMPACT, &["enso"]),
            FieldRule::numeric(CLIMATE_VULNERABILITY, &["climate_vulnerability"]),
            FieldRule::numeric(NDVI_CURRENT, &["ndvi"]),
            FieldRule::numeric(NDVI_AVG_5YR, &["avg_ndvi", "ndvi_5yr"]),
        ];
        for year in RAINFALL_YEARS.iter().chain(NDVI_YEARS.iter()) {
            rules.push(FieldRule::numeric(year, &[]));
        }

        Self::from_rules(rules)
    }

    /// Apply config overrides. Unknown names are appended as numeric fields.
    pub fn with_overrides(mut self, overrides: &[FieldOverride]) -> Self {
        for ov in overrides {
            let idx = match self.rules.iter().position(|r| r.name == ov.name) {
                Some(i) => i,
                None => {
                    self.rules.push(FieldRule::numeric(&ov.name, &[]));
                    self.rules.len() - 1
                }
            };
            let rule = &mut self.rules[idx];
            if let Some(v) = ov.default_on_missing {
                rule.default_on_missing = v;
            }
            if let Some(v) = ov.default_on_invalid {
                rule.default_on_invalid = v;
            }
            if let Some(l) = &ov.default_label {
                rule.default_label = Some(l.clone());
            }
            rule.aliases.extend(ov.aliases.iter().cloned());
        }
        self.reindex();
        self
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Rule for a canonical name.
    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Rule for any caller-facing key (canonical or alias, fuzzy on case/punctuation).
    pub fn resolve_key(&self, key: &str) -> Option<&FieldRule> {
        self.by_key.get(&normalize_key(key)).map(|&i| &self.rules[i])
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    fn reindex(&mut self) {
        self.by_key.clear();
        for (i, rule) in self.rules.iter().enumerate() {
            self.by_key.entry(normalize_key(&rule.name)).or_insert(i);
        }
        // Aliases never shadow a canonical name.
        for (i, rule) in self.rules.iter().enumerate() {
            for alias in &rule.aliases {
                self.by_key.entry(normalize_key(alias)).or_insert(i);
            }
        }
    }
}

/// Result of coercing one raw value.
#[derive(Debug, Clone, PartialEq)]
enum Coerced<T> {
    Value(T),
    Missing,
    Placeholder,
    Invalid,
}

/// Stateless normalizer over a read-only policy.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    policy: FieldResolutionPolicy,
}

impl Normalizer {
    pub fn new(policy: FieldResolutionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FieldResolutionPolicy {
        &self.policy
    }

    /// Normalize every field the policy knows about.
    pub fn normalize_all(&self, raw: &RawAttributes) -> FeatureSet {
        let fields = self.policy.field_names();
        self.normalize(raw, &fields)
    }

    /// Normalize `raw` into the `expected` canonical fields.
    ///
    /// Fields unknown to the policy are treated as numeric with 0.0 defaults.
    pub fn normalize(&self, raw: &RawAttributes, expected: &[&str]) -> FeatureSet {
        let lookup = index_raw(raw);
        let mut out = FeatureSet::new();

        for &field in expected {
            let fallback;
            let rule = match self.policy.rule(field) {
                Some(r) => r,
                None => {
                    fallback = FieldRule::numeric(field, &[]);
                    &fallback
                }
            };
            let value = find_value(&lookup, rule);

            match rule.kind {
                FieldKind::Numeric => {
                    let (v, origin) = match coerce_number(value) {
                        Coerced::Value(v) => (v, Origin::Observed),
                        Coerced::Missing => {
                            (rule.default_on_missing, Origin::Defaulted(DefaultReason::Missing))
                        }
                        Coerced::Placeholder => (
                            rule.default_on_missing,
                            Origin::Defaulted(DefaultReason::Placeholder),
                        ),
                        Coerced::Invalid => {
                            (rule.default_on_invalid, Origin::Defaulted(DefaultReason::Invalid))
                        }
                    };
                    log_substitution(&rule.name, origin);
                    out.insert(rule.name.clone(), v, origin);
                }
                FieldKind::Categorical => {
                    let default_label = rule.default_label.clone().unwrap_or_default();
                    let (label, origin) = match coerce_label(value) {
                        Coerced::Value(l) => (l, Origin::Observed),
                        Coerced::Missing => {
                            (default_label, Origin::Defaulted(DefaultReason::Missing))
                        }
                        Coerced::Placeholder => {
                            (default_label, Origin::Defaulted(DefaultReason::Placeholder))
                        }
                        Coerced::Invalid => {
                            (default_label, Origin::Defaulted(DefaultReason::Invalid))
                        }
                    };
                    log_substitution(&rule.name, origin);
                    // Placeholder code until a bundle's encoders are applied.
                    out.insert(rule.name.clone(), 0.0, origin);
                    out.set_label(rule.name.clone(), label, origin);
                }
            }
        }

        out
    }

    /// Return a copy of `features` with categorical fields replaced by their
    /// encoder codes. Labels the encoder does not know are swapped for the
    /// field's default label; if even that is unknown, code 0 is used.
    pub fn encode(&self, features: &FeatureSet, encoders: &EncoderTable) -> FeatureSet {
        let mut out = features.clone();

        for (field, encoder) in encoders {
            let default_label = self
                .policy
                .rule(field)
                .and_then(|r| r.default_label.as_deref());

            let label = features.label(field).or(default_label).unwrap_or_default();
            let origin = features
                .origin(field)
                .unwrap_or(Origin::Defaulted(DefaultReason::Missing));

            let (code, origin) = match encoder.code(label) {
                Some(c) => (c, origin),
                None => {
                    debug!(field = %field, label = %label, "unseen category, using default label");
                    let code = default_label.and_then(|d| encoder.code(d)).unwrap_or(0);
                    (code, Origin::Defaulted(DefaultReason::UnknownCategory))
                }
            };
            out.insert(field.clone(), code as f64, origin);
        }

        out
    }
}

/// Lowercase and drop everything that is not alphanumeric.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn index_raw(raw: &RawAttributes) -> HashMap<String, &RawValue> {
    let mut out: HashMap<String, &RawValue> = HashMap::with_capacity(raw.len());
    for (k, v) in raw.iter() {
        let key = normalize_key(k);
        // A present value beats an explicit null under a colliding key.
        match out.get(&key) {
            Some(existing) if !matches!(existing, RawValue::Missing) => {}
            _ => {
                out.insert(key, v);
            }
        }
    }
    out
}

fn find_value<'a>(
    lookup: &HashMap<String, &'a RawValue>,
    rule: &FieldRule,
) -> Option<&'a RawValue> {
    std::iter::once(rule.name.as_str())
        .chain(rule.aliases.iter().map(String::as_str))
        .find_map(|k| lookup.get(&normalize_key(k)).copied())
}

fn coerce_token<T>(s: &str) -> Option<Coerced<T>> {
    if s.is_empty() {
        Some(Coerced::Missing)
    } else if PLACEHOLDER_TOKENS.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        Some(Coerced::Placeholder)
    } else {
        None
    }
}

fn coerce_number(value: Option<&RawValue>) -> Coerced<f64> {
    match value {
        None | Some(RawValue::Missing) => Coerced::Missing,
        Some(RawValue::Number(n)) if n.is_finite() => Coerced::Value(*n),
        Some(RawValue::Number(_)) => Coerced::Invalid,
        Some(RawValue::Text(s)) => {
            let t = s.trim();
            if let Some(c) = coerce_token(t) {
                return c;
            }
            match t.parse::<f64>() {
                Ok(v) if v.is_finite() => Coerced::Value(v),
                _ => Coerced::Invalid,
            }
        }
        Some(RawValue::Other(_)) => Coerced::Invalid,
    }
}

fn coerce_label(value: Option<&RawValue>) -> Coerced<String> {
    match value {
        None | Some(RawValue::Missing) => Coerced::Missing,
        Some(RawValue::Text(s)) => {
            let t = s.trim();
            coerce_token(t).unwrap_or_else(|| Coerced::Value(t.to_string()))
        }
        Some(RawValue::Number(n)) if n.is_finite() => {
            if n.fract() == 0.0 {
                Coerced::Value(format!("{}", *n as i64))
            } else {
                Coerced::Value(n.to_string())
            }
        }
        Some(RawValue::Number(_)) | Some(RawValue::Other(_)) => Coerced::Invalid,
    }
}

fn log_substitution(field: &str, origin: Origin) {
    if let Origin::Defaulted(reason) = origin {
        debug!(field = %field, reason = ?reason, "field resolved to default");
    }
}
