//! Activity scoring engine
//!
//! Produces the four bounded activity scores with recommendation labels and
//! reasoning strings. Scores are computed independently per activity and
//! clamped to [0, 100]; reasoning strings are templated from the same inputs
//! so identical weather always yields identical output.

use std::cmp::Ordering;

use serde::Serialize;

use crate::models::{City, WeatherObservation};
use crate::scoring::conditions::{self, ConditionCategory, FOG_CODE};
use crate::scoring::geography::{self, GeographyClass};

/// The scored activities, in ranking tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Activity {
    Skiing,
    Surfing,
    Indoor,
    Outdoor,
}

impl Activity {
    /// Declaration order; ranking ties are broken by position in this list.
    pub const ALL: [Activity; 4] = [
        Activity::Skiing,
        Activity::Surfing,
        Activity::Indoor,
        Activity::Outdoor,
    ];

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Activity::Skiing => "Skiing",
            Activity::Surfing => "Surfing",
            Activity::Indoor => "Indoor Sightseeing",
            Activity::Outdoor => "Outdoor Sightseeing",
        }
    }
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Qualitative label attached to a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecommendationLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    NotRecommended,
}

impl RecommendationLevel {
    /// Shared thresholds across all four activities.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => RecommendationLevel::Excellent,
            s if s >= 60.0 => RecommendationLevel::Good,
            s if s >= 40.0 => RecommendationLevel::Fair,
            s if s >= 20.0 => RecommendationLevel::Poor,
            _ => RecommendationLevel::NotRecommended,
        }
    }
}

impl std::fmt::Display for RecommendationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RecommendationLevel::Excellent => "Excellent",
            RecommendationLevel::Good => "Good",
            RecommendationLevel::Fair => "Fair",
            RecommendationLevel::Poor => "Poor",
            RecommendationLevel::NotRecommended => "Not Recommended",
        };
        f.write_str(label)
    }
}

/// The four raw scores, each already clamped to [0, 100].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityScores {
    pub skiing: f64,
    pub surfing: f64,
    pub indoor: f64,
    pub outdoor: f64,
}

/// One ranked entry of the recommendation output.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityRecommendation {
    pub activity: Activity,
    pub score: f64,
    pub recommendation: RecommendationLevel,
    pub reasoning: String,
}

struct Reasoning {
    skiing: String,
    surfing: String,
    indoor: String,
    outdoor: String,
}

/// Score one day of weather for a terrain class. Pure; no I/O.
#[must_use]
pub fn score(weather: &WeatherObservation, geography: GeographyClass) -> ActivityScores {
    ActivityScores {
        skiing: skiing_score(weather, geography),
        surfing: surfing_score(weather, geography),
        indoor: indoor_score(weather),
        outdoor: outdoor_score(weather),
    }
}

/// Full ranked recommendation set for a city and one day of weather.
#[must_use]
pub fn recommendations(city: &City, weather: &WeatherObservation) -> Vec<ActivityRecommendation> {
    let geography = geography::classify(city.elevation);
    let scores = score(weather, geography);
    let notes = build_reasoning(&city.name, weather, geography);
    rank(scores, notes)
}

fn skiing_score(weather: &WeatherObservation, geography: GeographyClass) -> f64 {
    let avg = weather.average_temp();
    let mut score: f64 = 0.0;

    if geography == GeographyClass::Mountainous && avg < 5.0 {
        score += 30.0;
        if weather.snowfall_sum.unwrap_or(0.0) > 0.0 {
            score += 40.0;
        }
        if avg < 0.0 {
            score += 20.0;
        }
        if conditions::categorize(weather.weather_code) == ConditionCategory::Snow {
            score += 10.0;
        }
    }

    score.clamp(0.0, 100.0)
}

fn surfing_score(weather: &WeatherObservation, geography: GeographyClass) -> f64 {
    let avg = weather.average_temp();
    let mut score: f64 = 0.0;

    if geography == GeographyClass::Coastal {
        score += 30.0;
        if avg > 15.0 {
            score += 20.0;
        }
        if avg > 20.0 {
            score += 20.0;
        }
        // Good wind conditions, strictly between the bounds
        if weather.wind_speed > 10.0 && weather.wind_speed < 25.0 {
            score += 15.0;
        }
        let category = conditions::categorize(weather.weather_code);
        if category == ConditionCategory::Clear || category == ConditionCategory::MostlyClear {
            score += 15.0;
        }
        // Heavy rain reduces surfing appeal
        if weather.precipitation > 5.0 {
            score -= 20.0;
        }
    }

    score.clamp(0.0, 100.0)
}

fn outdoor_score(weather: &WeatherObservation) -> f64 {
    let avg = weather.average_temp();
    let mut score = 50.0;

    score += match conditions::categorize(weather.weather_code) {
        ConditionCategory::Clear => 30.0,
        ConditionCategory::MostlyClear => 20.0,
        ConditionCategory::PartlyCloudy => 10.0,
        _ => 0.0,
    };

    // Temperature bands, mutually exclusive, evaluated in this order
    if (15.0..=25.0).contains(&avg) {
        score += 20.0;
    } else if avg > 25.0 && avg <= 30.0 {
        score += 10.0;
    } else if avg < 5.0 {
        score -= 20.0;
    } else if avg > 35.0 {
        score -= 20.0;
    }

    if weather.precipitation > 2.0 {
        score -= (weather.precipitation * 3.0).min(30.0);
    }
    if weather.wind_speed > 30.0 {
        score -= 15.0;
    }
    if let Some(uv) = weather.uv_index {
        if uv > 7.0 {
            score -= 10.0;
        }
    }

    score.clamp(0.0, 100.0)
}

fn indoor_score(weather: &WeatherObservation) -> f64 {
    let avg = weather.average_temp();
    let mut score = 50.0;

    if weather.precipitation > 2.0 {
        score += (weather.precipitation * 2.0).min(30.0);
    }
    // Extreme temperatures favor indoor
    if avg < 5.0 || avg > 35.0 {
        score += 20.0;
    }
    // Higher code means worse weather; deliberately compares the raw code
    if weather.weather_code >= FOG_CODE {
        score += 15.0;
    }
    if weather.wind_speed > 30.0 {
        score += 10.0;
    }

    score.clamp(0.0, 100.0)
}

fn build_reasoning(
    city_name: &str,
    weather: &WeatherObservation,
    geography: GeographyClass,
) -> Reasoning {
    let avg = weather.average_temp();
    let precipitation = weather.precipitation;
    let wind = weather.wind_speed;
    let condition = conditions::description(weather.weather_code);

    let skiing = if geography == GeographyClass::Mountainous {
        let snowfall = weather.snowfall_sum.unwrap_or(0.0);
        let snow_note = if snowfall > 0.0 {
            format!(", snowfall: {snowfall}cm")
        } else {
            String::new()
        };
        format!("{city_name} is mountainous. Temperature: {avg:.1}°C{snow_note}.")
    } else {
        format!("{city_name} is not suitable for skiing (no mountains).")
    };

    let surfing = if geography == GeographyClass::Coastal {
        let rain_note = if precipitation > 0.0 {
            format!(", precipitation: {precipitation}mm")
        } else {
            String::new()
        };
        format!("{city_name} is coastal. Temperature: {avg:.1}°C, wind: {wind} km/h{rain_note}.")
    } else {
        format!("{city_name} is not coastal, no surfing opportunities.")
    };

    let extreme_note = if avg < 5.0 || avg > 35.0 {
        ", extreme temperature"
    } else {
        ""
    };
    let rainy_note = if precipitation > 2.0 {
        ", rainy conditions"
    } else {
        ""
    };
    let indoor =
        format!("{condition} weather{extreme_note}{rainy_note} make indoor activities appealing.");

    let precip_note = if precipitation > 0.0 {
        format!(", {precipitation}mm precipitation")
    } else {
        String::new()
    };
    let windy_note = if wind > 20.0 { "Windy conditions. " } else { "" };
    let outdoor = format!(
        "{condition} weather, {avg:.1}°C{precip_note}. {windy_note}Good for outdoor exploration."
    );

    Reasoning {
        skiing,
        surfing,
        indoor,
        outdoor,
    }
}

fn rank(scores: ActivityScores, notes: Reasoning) -> Vec<ActivityRecommendation> {
    let mut ranked: Vec<ActivityRecommendation> = [
        (Activity::Skiing, scores.skiing, notes.skiing),
        (Activity::Surfing, scores.surfing, notes.surfing),
        (Activity::Indoor, scores.indoor, notes.indoor),
        (Activity::Outdoor, scores.outdoor, notes.outdoor),
    ]
    .into_iter()
    .map(|(activity, score, reasoning)| ActivityRecommendation {
        activity,
        score,
        recommendation: RecommendationLevel::from_score(score),
        reasoning,
    })
    .collect();

    // Stable sort keeps declaration order on ties
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked
}
