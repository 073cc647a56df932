//! Climatic effect tables.
//!
//! `v2` rewards moderate, consistent rainfall near a reachable river.
//! `v1` is the earlier formulation that scores climate hazards (heat,
//! flood, cyclones) instead of hydrology.

use super::{Band, Breakdown, BucketTable, Contribution};
use crate::features::{names, FeatureSet};
use crate::stats::{coefficient_of_variation, DEFAULT_MIN_CV_POINTS};

pub const RAINFALL_AVG: BucketTable = BucketTable {
    factor: "rainfall_avg",
    bands: &[
        (Band::Within(800.0, 1200.0), 25.0),
        (Band::Within(600.0, 1500.0), 20.0),
        (Band::Within(400.0, 1800.0), 15.0),
    ],
    otherwise: 10.0,
};

pub const MONSOON_INTENSITY: BucketTable = BucketTable {
    factor: "monsoon_intensity",
    bands: &[
        (Band::Within(15.0, 20.0), 20.0),
        (Band::Within(10.0, 25.0), 15.0),
        (Band::Within(5.0, 30.0), 10.0),
    ],
    otherwise: 5.0,
};

pub const RAINFALL_CV: BucketTable = BucketTable {
    factor: "rainfall_cv",
    bands: &[
        (Band::AtMost(0.2), 20.0),
        (Band::AtMost(0.3), 15.0),
        (Band::AtMost(0.4), 10.0),
    ],
    otherwise: 5.0,
};

pub const NDVI: BucketTable = BucketTable {
    factor: "ndvi",
    bands: &[
        (Band::Within(0.3, 0.6), 15.0),
        (Band::Within(0.1, 0.8), 10.0),
    ],
    otherwise: 5.0,
};

pub const RIVER_FLOW: BucketTable = BucketTable {
    factor: "river_flow_rate",
    bands: &[
        (Band::Within(0.0001, 0.001), 10.0),
        (Band::Within(0.00001, 0.01), 8.0),
    ],
    otherwise: 5.0,
};

pub const RIVER_DISTANCE: BucketTable = BucketTable {
    factor: "river_distance",
    bands: &[
        (Band::AtMost(50.0), 10.0),
        (Band::AtMost(100.0), 8.0),
        (Band::AtMost(200.0), 5.0),
    ],
    otherwise: 3.0,
};

// v1 only

pub const RAINFALL_STDDEV: BucketTable = BucketTable {
    factor: "rainfall_stddev",
    bands: &[(Band::Below(100.0), 15.0), (Band::Below(200.0), 10.0)],
    otherwise: 5.0,
};

pub const TEMPERATURE_STDDEV: BucketTable = BucketTable {
    factor: "temperature_stddev",
    bands: &[(Band::Below(2.0), 10.0), (Band::Below(4.0), 8.0)],
    otherwise: 5.0,
};

pub const HEATWAVE_DAYS: BucketTable = BucketTable {
    factor: "heatwave_days",
    bands: &[(Band::Below(5.0), 10.0), (Band::Below(10.0), 7.0)],
    otherwise: 5.0,
};

pub const FLOOD_RISK: BucketTable = BucketTable {
    factor: "flood_risk",
    bands: &[(Band::Below(0.3), 10.0), (Band::Below(0.6), 7.0)],
    otherwise: 5.0,
};

pub const CYCLONE_EXPOSURE: BucketTable = BucketTable {
    factor: "cyclone_exposure",
    bands: &[(Band::Equals(0.0), 5.0), (Band::Equals(1.0), 3.0)],
    otherwise: 2.0,
};

fn rainfall_average(fs: &FeatureSet) -> Option<f64> {
    fs.observed(names::RAINFALL_5YR_AVG)
        .or_else(|| fs.observed(names::RAINFALL_MEAN))
}

/// v2 breakdown. The CV factor only appears when at least `min_cv_points`
/// annual rainfall values were observed and their mean is positive.
pub fn climatic_breakdown_v2(fs: &FeatureSet, min_cv_points: usize) -> Breakdown {
    let mut b = Breakdown::default();
    b.push(RAINFALL_AVG.contribute(rainfall_average(fs)));
    b.push(MONSOON_INTENSITY.contribute(fs.observed(names::MONSOON_INTENSITY)));

    let years = fs.observed_series(&names::RAINFALL_YEARS);
    if let Some(cv) = coefficient_of_variation(&years, min_cv_points) {
        b.push(Some(Contribution {
            factor: RAINFALL_CV.factor,
            input: Some(cv),
            points: RAINFALL_CV.points(cv),
        }));
    }

    let ndvi = fs
        .observed(names::NDVI_AVG_5YR)
        .or_else(|| fs.observed(names::NDVI_CURRENT));
    b.push(NDVI.contribute(ndvi));
    b.push(RIVER_FLOW.contribute(fs.observed(names::RIVER_FLOW_RATE)));
    b.push(RIVER_DISTANCE.contribute(fs.observed(names::RIVER_DISTANCE)));
    b
}

pub fn climatic_breakdown_v1(fs: &FeatureSet) -> Breakdown {
    let mut b = Breakdown::default();
    b.push(RAINFALL_AVG.contribute(rainfall_average(fs)));
    b.push(MONSOON_INTENSITY.contribute(fs.observed(names::MONSOON_INTENSITY)));
    b.push(RAINFALL_STDDEV.contribute(fs.observed(names::RAINFALL_STDDEV_5YR)));
    b.push(NDVI.contribute(fs.observed(names::NDVI_CURRENT)));
    b.push(TEMPERATURE_STDDEV.contribute(fs.observed(names::TEMPERATURE_STDDEV)));
    b.push(HEATWAVE_DAYS.contribute(fs.observed(names::HEATWAVE_DAYS)));
    b.push(FLOOD_RISK.contribute(fs.observed(names::FLOOD_RISK_INDEX)));
    b.push(CYCLONE_EXPOSURE.contribute(fs.observed(names::CYCLONE_EXPOSURE)));
    b
}

/// Climatic score in `[0, 100]` using the current (v2) table.
pub fn score_climatic(fs: &FeatureSet) -> f64 {
    climatic_breakdown_v2(fs, DEFAULT_MIN_CV_POINTS).score()
}

/// Climatic score in `[0, 100]` using the historical (v1) table.
pub fn score_climatic_v1(fs: &FeatureSet) -> f64 {
    climatic_breakdown_v1(fs).score()
}
