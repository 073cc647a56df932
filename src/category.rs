//! Shared score → category threshold table.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Poor,
    Fair,
    Moderate,
    Good,
    Excellent,
}

/// Ordered breakpoints, highest first. Lower bounds are inclusive.
pub const CATEGORY_THRESHOLDS: [(f64, Category); 4] = [
    (80.0, Category::Excellent),
    (70.0, Category::Good),
    (60.0, Category::Moderate),
    (50.0, Category::Fair),
];

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Excellent,
        Category::Good,
        Category::Moderate,
        Category::Fair,
        Category::Poor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Excellent => "Excellent",
            Category::Good => "Good",
            Category::Moderate => "Moderate",
            Category::Fair => "Fair",
            Category::Poor => "Poor",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Total, monotone step function. NaN falls through to `Poor`.
pub fn categorize(score: f64) -> Category {
    CATEGORY_THRESHOLDS
        .iter()
        .find(|(floor, _)| score >= *floor)
        .map(|(_, c)| *c)
        .unwrap_or(Category::Poor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_belong_to_the_higher_category() {
        assert_eq!(categorize(80.0), Category::Excellent);
        assert_eq!(categorize(70.0), Category::Good);
        assert_eq!(categorize(60.0), Category::Moderate);
        assert_eq!(categorize(50.0), Category::Fair);
        assert_eq!(categorize(49.999), Category::Poor);
        assert_eq!(categorize(79.9), Category::Good);
    }

    #[test]
    fn nan_is_poor() {
        assert_eq!(categorize(f64::NAN), Category::Poor);
    }

    #[test]
    fn serializes_as_plain_name() {
        let v = serde_json::to_value(Category::Moderate).unwrap();
        assert_eq!(v, serde_json::json!("Moderate"));
    }
}
