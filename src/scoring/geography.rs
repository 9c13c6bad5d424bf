//! Terrain classification from city elevation

use serde::Serialize;

/// Coarse terrain class derived from a city's elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeographyClass {
    Coastal,
    Mountainous,
    Neutral,
}

/// Cities below this elevation are treated as coastal.
///
/// Fixed design constant, not configuration; the classifier is a simplified
/// heuristic rather than real geographic data.
pub const COASTAL_MAX_ELEVATION_M: f64 = 100.0;

/// Cities above this elevation are treated as mountainous. Fixed design
/// constant, same caveat as [`COASTAL_MAX_ELEVATION_M`].
pub const MOUNTAINOUS_MIN_ELEVATION_M: f64 = 500.0;

/// Classify terrain from elevation in meters; missing elevation counts as 0.
#[must_use]
pub fn classify(elevation_m: Option<f64>) -> GeographyClass {
    let elevation = elevation_m.unwrap_or(0.0);
    if elevation < COASTAL_MAX_ELEVATION_M {
        GeographyClass::Coastal
    } else if elevation > MOUNTAINOUS_MIN_ELEVATION_M {
        GeographyClass::Mountainous
    } else {
        GeographyClass::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, GeographyClass::Coastal)]
    #[case(Some(0.0), GeographyClass::Coastal)]
    #[case(Some(99.9), GeographyClass::Coastal)]
    #[case(Some(100.0), GeographyClass::Neutral)]
    #[case(Some(500.0), GeographyClass::Neutral)]
    #[case(Some(500.1), GeographyClass::Mountainous)]
    #[case(Some(800.0), GeographyClass::Mountainous)]
    fn test_classify(#[case] elevation: Option<f64>, #[case] expected: GeographyClass) {
        assert_eq!(classify(elevation), expected);
    }

    #[test]
    fn test_classify_is_total() {
        // Every elevation lands in exactly one class
        for e in [-430.0, -1.0, 0.0, 50.0, 100.0, 300.0, 500.0, 501.0, 8000.0] {
            let class = classify(Some(e));
            let coastal = e < COASTAL_MAX_ELEVATION_M;
            let mountainous = e > MOUNTAINOUS_MIN_ELEVATION_M;
            assert_eq!(class == GeographyClass::Coastal, coastal);
            assert_eq!(class == GeographyClass::Mountainous, mountainous);
            assert_eq!(class == GeographyClass::Neutral, !coastal && !mountainous);
        }
    }
}
