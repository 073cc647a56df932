//! Geological suitability table (seismicity, soil, terrain, dam height).

use super::{Band, Breakdown, BucketTable, Contribution};
use crate::features::{names, DefaultReason, FeatureSet, Origin};

pub const SEISMIC: BucketTable = BucketTable {
    factor: "seismic_zone",
    bands: &[
        (Band::Equals(1.0), 25.0),
        (Band::Equals(2.0), 20.0),
        (Band::Equals(3.0), 15.0),
        (Band::Equals(4.0), 10.0),
        (Band::Equals(5.0), 5.0),
    ],
    otherwise: 10.0,
};

pub const ELEVATION: BucketTable = BucketTable {
    factor: "elevation",
    bands: &[
        (Band::Within(50.0, 200.0), 15.0),
        (Band::Within(20.0, 300.0), 12.0),
    ],
    otherwise: 8.0,
};

pub const SLOPE: BucketTable = BucketTable {
    factor: "slope",
    bands: &[
        (Band::AtMost(2.0), 15.0),
        (Band::AtMost(5.0), 12.0),
        (Band::AtMost(10.0), 8.0),
    ],
    otherwise: 5.0,
};

pub const MAX_HEIGHT: BucketTable = BucketTable {
    factor: "max_height",
    bands: &[
        (Band::Within(10.0, 30.0), 10.0),
        (Band::Within(5.0, 50.0), 8.0),
    ],
    otherwise: 5.0,
};

/// Soil families in priority order. Matching is a case-insensitive
/// substring test against either soil label.
pub const SOIL_FAMILIES: [(&str, f64); 5] = [
    ("vertisol", 20.0),
    ("cambisol", 15.0),
    ("luvisol", 10.0),
    ("leptosol", 8.0),
    ("arenosol", 5.0),
];
pub const SOIL_UNMATCHED: f64 = 10.0;

/// Points for a pair of soil labels. Absent labels simply never match.
pub fn soil_points(main: Option<&str>, secondary: Option<&str>) -> f64 {
    let main = main.map(str::to_lowercase).unwrap_or_default();
    let secondary = secondary.map(str::to_lowercase).unwrap_or_default();
    SOIL_FAMILIES
        .iter()
        .find(|(family, _)| main.contains(family) || secondary.contains(family))
        .map(|(_, p)| *p)
        .unwrap_or(SOIL_UNMATCHED)
}

/// A zone the caller sent as a placeholder or garbage lands in the
/// unlisted-zone bucket; only an absent zone is skipped.
fn seismic_contribution(fs: &FeatureSet) -> Option<Contribution> {
    match fs.origin(names::SEISMIC_ZONE) {
        Some(Origin::Defaulted(DefaultReason::Placeholder | DefaultReason::Invalid)) => {
            Some(Contribution {
                factor: SEISMIC.factor,
                input: None,
                points: SEISMIC.otherwise,
            })
        }
        _ => SEISMIC.contribute(fs.observed(names::SEISMIC_ZONE)),
    }
}

pub fn geological_breakdown(fs: &FeatureSet) -> Breakdown {
    let mut b = Breakdown::default();
    b.push(seismic_contribution(fs));
    b.push(Some(Contribution {
        factor: "soil_type",
        input: None,
        points: soil_points(
            fs.observed_label(names::SOIL_MAIN),
            fs.observed_label(names::SOIL_SECONDARY),
        ),
    }));
    b.push(ELEVATION.contribute(fs.observed(names::ELEVATION)));
    b.push(SLOPE.contribute(fs.observed(names::SLOPE)));
    b.push(MAX_HEIGHT.contribute(fs.observed(names::MAX_HEIGHT)));
    b
}

/// Geological score in `[0, 100]`.
pub fn score_geological(fs: &FeatureSet) -> f64 {
    geological_breakdown(fs).score()
}
