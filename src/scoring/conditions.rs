//! WMO weather-code classification

use serde::Serialize;

/// Coarse condition category for a WMO-style weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConditionCategory {
    Clear,
    MostlyClear,
    PartlyCloudy,
    Overcast,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Thunderstorm,
    Mixed,
}

/// Lowest code of the fog family. Codes at or above this value are treated as
/// "worse weather" by the indoor score, which compares raw codes rather than
/// categories.
pub const FOG_CODE: i32 = 45;

/// Map a weather code to its coarse category.
///
/// Total over all integers: codes outside the documented table (including
/// freezing variants, showers, and snow grains) fall through to `Mixed`.
#[must_use]
pub fn categorize(code: i32) -> ConditionCategory {
    match code {
        0 => ConditionCategory::Clear,
        1 => ConditionCategory::MostlyClear,
        2 => ConditionCategory::PartlyCloudy,
        3 => ConditionCategory::Overcast,
        45 | 48 => ConditionCategory::Fog,
        51 | 53 | 55 => ConditionCategory::Drizzle,
        61 | 63 | 65 => ConditionCategory::Rain,
        71 | 73 | 75 => ConditionCategory::Snow,
        95 | 96 | 99 => ConditionCategory::Thunderstorm,
        _ => ConditionCategory::Mixed,
    }
}

/// Human-readable description used in reasoning strings.
#[must_use]
pub fn description(code: i32) -> &'static str {
    match categorize(code) {
        ConditionCategory::Clear => "Clear sky",
        ConditionCategory::MostlyClear => "Mainly clear",
        ConditionCategory::PartlyCloudy => "Partly cloudy",
        ConditionCategory::Overcast => "Overcast",
        ConditionCategory::Fog => "Foggy",
        ConditionCategory::Drizzle => "Drizzle",
        ConditionCategory::Rain => "Rainy",
        ConditionCategory::Snow => "Snowy",
        ConditionCategory::Thunderstorm => "Thunderstorm",
        ConditionCategory::Mixed => "Mixed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, ConditionCategory::Clear)]
    #[case(1, ConditionCategory::MostlyClear)]
    #[case(2, ConditionCategory::PartlyCloudy)]
    #[case(3, ConditionCategory::Overcast)]
    #[case(45, ConditionCategory::Fog)]
    #[case(48, ConditionCategory::Fog)]
    #[case(51, ConditionCategory::Drizzle)]
    #[case(53, ConditionCategory::Drizzle)]
    #[case(55, ConditionCategory::Drizzle)]
    #[case(61, ConditionCategory::Rain)]
    #[case(63, ConditionCategory::Rain)]
    #[case(65, ConditionCategory::Rain)]
    #[case(71, ConditionCategory::Snow)]
    #[case(73, ConditionCategory::Snow)]
    #[case(75, ConditionCategory::Snow)]
    #[case(95, ConditionCategory::Thunderstorm)]
    #[case(96, ConditionCategory::Thunderstorm)]
    #[case(99, ConditionCategory::Thunderstorm)]
    fn test_documented_codes(#[case] code: i32, #[case] expected: ConditionCategory) {
        assert_eq!(categorize(code), expected);
    }

    #[rstest]
    #[case(-1)]
    #[case(4)]
    #[case(44)]
    #[case(56)] // freezing drizzle is outside the table
    #[case(66)]
    #[case(77)] // snow grains
    #[case(80)] // rain showers
    #[case(85)] // snow showers
    #[case(100)]
    #[case(i32::MAX)]
    fn test_out_of_table_codes_are_mixed(#[case] code: i32) {
        assert_eq!(categorize(code), ConditionCategory::Mixed);
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(description(0), "Clear sky");
        assert_eq!(description(48), "Foggy");
        assert_eq!(description(63), "Rainy");
        assert_eq!(description(75), "Snowy");
        assert_eq!(description(82), "Mixed");
    }
}
