use serde::{Deserialize, Serialize};

/// Counters and ratings are carried as `f64`; whole values go out as JSON
/// integers (`1500`, not `1500.0`).
mod whole_numbers {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) if v.fract() == 0.0 && v.abs() < 9.0e15 => serializer.serialize_i64(*v as i64),
            Some(v) => serializer.serialize_f64(*v),
            None => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(serialize_with = "whole_numbers::serialize")]
    pub irating: Option<f64>,
    #[serde(serialize_with = "whole_numbers::serialize")]
    pub safety_rating: Option<f64>,
    pub display: Option<String>,
}

/// The license shown to callers as the driver's headline rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(serialize_with = "whole_numbers::serialize")]
    pub irating: Option<f64>,
    #[serde(serialize_with = "whole_numbers::serialize")]
    pub safety_rating: Option<f64>,
    pub license_display: Option<String>,
}

impl From<LicenseEntry> for Overview {
    fn from(license: LicenseEntry) -> Self {
        Overview {
            category: license.category,
            irating: license.irating,
            safety_rating: license.safety_rating,
            license_display: license.display,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerOverview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(serialize_with = "whole_numbers::serialize")]
    pub wins: Option<f64>,
    #[serde(serialize_with = "whole_numbers::serialize")]
    pub podiums: Option<f64>,
    #[serde(serialize_with = "whole_numbers::serialize")]
    pub top5: Option<f64>,
    #[serde(serialize_with = "whole_numbers::serialize")]
    pub starts: Option<f64>,
    /// Set when `podiums` was filled from the top-5 counter because the
    /// upstream entry had no podium field.
    pub podiums_approximate: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceResult {
    #[serde(serialize_with = "whole_numbers::serialize")]
    pub subsession_id: Option<f64>,
    pub start_time: Option<String>,
    #[serde(serialize_with = "whole_numbers::serialize")]
    pub finish_position: Option<f64>,
    #[serde(serialize_with = "whole_numbers::serialize")]
    pub incidents: Option<f64>,
    pub series_name: Option<String>,
    pub track_name: Option<String>,
    pub track_config: Option<String>,
    pub car_name: Option<String>,
    #[serde(serialize_with = "whole_numbers::serialize")]
    pub strength_of_field: Option<f64>,
}

impl RaceResult {
    pub fn is_podium(&self) -> bool {
        matches!(self.finish_position, Some(p) if (1.0..=3.0).contains(&p))
    }

    pub fn is_win(&self) -> bool {
        self.finish_position == Some(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverData {
    pub overview: Option<Overview>,
    pub career: Option<CareerOverview>,
    pub recent_races: Vec<RaceResult>,
    pub latest_race: Option<RaceResult>,
    pub latest_podium: Option<RaceResult>,
    pub sample_podium_count: usize,
    pub sample_win_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub const FALLBACK_ERROR: &str = "Unable to fetch live iRacing data";

impl DriverData {
    /// Placeholder stats served whenever live data cannot be produced.
    /// `error` is always populated so callers can tell it apart from real data.
    pub fn fallback(error: impl Into<String>) -> Self {
        let error = error.into();
        DriverData {
            overview: Some(Overview {
                category: Some("sports_car".to_string()),
                irating: Some(1500.0),
                safety_rating: Some(3.2),
                license_display: Some("C 3.20".to_string()),
            }),
            career: Some(CareerOverview {
                category: Some("sports_car".to_string()),
                wins: Some(2.0),
                podiums: Some(5.0),
                top5: Some(8.0),
                starts: Some(25.0),
                podiums_approximate: false,
            }),
            recent_races: Vec::new(),
            latest_race: None,
            latest_podium: None,
            sample_podium_count: 0,
            sample_win_count: 0,
            error: Some(if error.trim().is_empty() {
                FALLBACK_ERROR.to_string()
            } else {
                error
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn whole_values_serialize_as_integers() {
        let race = RaceResult {
            subsession_id: Some(71000003.0),
            finish_position: Some(1.0),
            strength_of_field: None,
            ..RaceResult::default()
        };
        let json: Value = serde_json::to_value(&race).unwrap();
        assert_eq!(json["subsessionId"], json!(71000003));
        assert!(json["subsessionId"].is_i64());
        assert_eq!(json["finishPosition"], json!(1));
        assert_eq!(json["strengthOfField"], Value::Null);

        let overview = serde_json::to_value(DriverData::fallback("").overview).unwrap();
        assert!(overview["irating"].is_i64());
        assert_eq!(overview["safetyRating"], json!(3.2));
    }
}
