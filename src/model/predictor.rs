//! Model-backed predictor: align → scale → infer → clamp.

use super::bundle::ModelBundle;
use super::PredictError;
use crate::features::FeatureSet;
use crate::rules::MAX_SCORE;

/// Ordered row for `names`; anything absent from `features` becomes 0.0,
/// anything in `features` that `names` does not mention is dropped.
pub fn align(features: &FeatureSet, names: &[String]) -> Vec<f64> {
    names.iter().map(|n| features.value_or_zero(n)).collect()
}

/// Score a feature set with a bundle. Categorical fields must already carry
/// the bundle's encoder codes (see `Normalizer::encode`).
///
/// The scaler's fitted parameters are used as-is; nothing is refit here.
pub fn predict(features: &FeatureSet, bundle: &ModelBundle) -> Result<f64, PredictError> {
    if !bundle.feature_names.iter().any(|n| features.contains(n)) {
        return Err(PredictError::FeatureMismatch {
            bundle: bundle.id.clone(),
        });
    }

    let mut row = align(features, &bundle.feature_names);
    if let Some(scaler) = &bundle.scaler {
        scaler.transform(&mut row)?;
    }

    let raw = bundle.model.predict(&row).ok_or_else(|| {
        PredictError::Model(format!("{} model could not evaluate row", bundle.model.kind()))
    })?;
    if !raw.is_finite() {
        return Err(PredictError::NonFiniteOutput);
    }
    Ok(raw.clamp(0.0, MAX_SCORE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combine::Dimension;
    use crate::model::regressor::Regressor;

    fn linear(intercept: f64, coefficients: Vec<f64>, names: &[&str]) -> ModelBundle {
        ModelBundle {
            id: "t".into(),
            dimension: Dimension::Climatic,
            feature_names: names.iter().map(|s| s.to_string()).collect(),
            scaler: None,
            encoders: Default::default(),
            model: Regressor::Linear {
                intercept,
                coefficients,
            },
        }
    }

    #[test]
    fn absent_features_align_to_zero() {
        let fs = FeatureSet::from_observed([("a", 2.0), ("unused", 99.0)]);
        let row = align(&fs, &["a".to_string(), "b".to_string()]);
        assert_eq!(row, vec![2.0, 0.0]);
    }

    #[test]
    fn output_is_clamped() {
        let fs = FeatureSet::from_observed([("a", 10.0)]);
        assert_eq!(predict(&fs, &linear(0.0, vec![50.0], &["a"])).unwrap(), 100.0);
        assert_eq!(predict(&fs, &linear(0.0, vec![-50.0], &["a"])).unwrap(), 0.0);
        assert_eq!(predict(&fs, &linear(5.0, vec![2.0], &["a"])).unwrap(), 25.0);
    }

    #[test]
    fn foreign_vocabulary_is_a_mismatch() {
        let fs = FeatureSet::from_observed([("a", 1.0)]);
        let err = predict(&fs, &linear(0.0, vec![1.0], &["zzz"])).unwrap_err();
        assert!(matches!(err, PredictError::FeatureMismatch { .. }));
    }
}
