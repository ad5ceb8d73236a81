//! Coercion of loosely-typed racing-data payloads into the driver models.
//!
//! Every upstream field is looked up through an ordered list of aliases and
//! the first alias that coerces to a usable value wins. Anything that does
//! not coerce becomes `None`; nothing in here fails.

use serde_json::{Map, Value};

use crate::models::driver::{CareerOverview, DriverData, LicenseEntry, Overview, RaceResult};
use crate::utils::race_utils::parse_datetime;

/// A flat key (`&["carName"]`) or a path into nested objects (`&["car", "name"]`).
pub type FieldPath = &'static [&'static str];

const LICENSE_CATEGORY: &[FieldPath] = &[&["category"], &["categoryName"], &["parentName"], &["groupName"]];
const LICENSE_IRATING: &[FieldPath] = &[&["irating"], &["iRating"], &["ir"]];
const LICENSE_SAFETY: &[FieldPath] = &[&["safetyRating"], &["sr"], &["safety"]];
const LICENSE_DISPLAY: &[FieldPath] = &[&["licenseDisplay"], &["licenseString"], &["license"], &["className"]];

const RACE_SUBSESSION: &[FieldPath] = &[&["subsessionId"], &["sessionId"]];
const RACE_START: &[FieldPath] = &[&["startTime"], &["startTimeUtc"], &["date"]];
const RACE_POSITION: &[FieldPath] = &[&["finishPosition"], &["finishPositionInClass"], &["position"]];
const RACE_INCIDENTS: &[FieldPath] = &[&["incidents"], &["incidentCount"], &["eventIncidents"]];
const RACE_SERIES: &[FieldPath] = &[&["seriesName"], &["series", "name"], &["series", "seriesName"]];
const RACE_TRACK: &[FieldPath] = &[&["trackName"], &["track", "name"], &["track", "trackName"]];
const RACE_TRACK_CONFIG: &[FieldPath] = &[
    &["trackConfigName"],
    &["track", "config"],
    &["track", "configuration"],
    &["track", "configName"],
];
const RACE_CAR: &[FieldPath] = &[&["carName"], &["car", "name"], &["car", "carName"]];
const RACE_SOF: &[FieldPath] = &[&["strengthOfField"], &["sof"], &["strength"]];
const RACE_IRATING: &[FieldPath] = &[&["newiRating"], &["oldiRating"]];

const CAREER_PODIUMS: &[FieldPath] = &[&["podiums"], &["top3"], &["topThree"]];
const CAREER_TOP5: &[FieldPath] = &[&["top5"], &["topFive"], &["bestFinishes"]];
const CAREER_STARTS: &[FieldPath] = &[&["starts"], &["races"]];

const RACE_LIST_KEYS: [&str; 5] = ["races", "recentRaces", "items", "data", "results"];

pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

/// Timestamps arrive as JSON strings, so date-like values are covered by
/// the string branch and pass through in their ISO form.
pub fn to_string_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(_) => to_number(value).map(format_number),
        Value::Object(record) => {
            if let Some(name) = record.get("name") {
                to_string_value(name)
            } else if let Some(description) = record.get("description") {
                to_string_value(description)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// `"Sports Car"` -> `"sports_car"`. Empty results are treated as absent.
pub fn to_category_slug(value: &Value) -> Option<String> {
    let text = to_string_value(value)?;
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;
    for c in text.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }
    (!slug.is_empty()).then_some(slug)
}

pub fn slug_str(text: &str) -> Option<String> {
    to_category_slug(&Value::String(text.to_string()))
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

pub fn lookup<'a>(record: &'a Map<String, Value>, path: FieldPath) -> Option<&'a Value> {
    let (last, parents) = path.split_last()?;
    let mut current = record;
    for key in parents {
        current = current.get(*key)?.as_object()?;
    }
    current.get(*last)
}

/// Field alias resolution: the first path whose value survives `coerce`.
pub fn first_of<T>(
    record: &Map<String, Value>,
    paths: &[FieldPath],
    coerce: fn(&Value) -> Option<T>,
) -> Option<T> {
    paths
        .iter()
        .filter_map(|path| lookup(record, *path))
        .find_map(coerce)
}

pub fn normalize_license(value: &Value) -> Option<LicenseEntry> {
    let record = value.as_object()?;
    Some(LicenseEntry {
        category: first_of(record, LICENSE_CATEGORY, to_category_slug),
        irating: first_of(record, LICENSE_IRATING, to_number),
        safety_rating: first_of(record, LICENSE_SAFETY, to_number),
        display: first_of(record, LICENSE_DISPLAY, to_string_value),
    })
}

/// Licenses may be listed as an array or keyed by category.
pub fn extract_licenses(summary: &Value) -> Vec<LicenseEntry> {
    match summary.get("licenses") {
        Some(Value::Array(items)) => items.iter().filter_map(normalize_license).collect(),
        Some(Value::Object(by_category)) => by_category
            .iter()
            .filter_map(|(key, value)| {
                let mut license = normalize_license(value)?;
                if license.category.is_none() {
                    license.category = slug_str(key);
                }
                Some(license)
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Builds a license from the rating fields the service attaches to each race
/// entry. Used when the member summary carries no license list.
pub fn license_from_race(race: &Value, preferred: Option<&str>) -> Option<LicenseEntry> {
    let record = race.as_object()?;
    let irating = first_of(record, RACE_IRATING, to_number);
    let level = record.get("licenseLevel").and_then(to_number);

    let has_rating = irating.is_some_and(|r| r != 0.0);
    let has_level = level.is_some_and(|l| l != 0.0);
    if !has_rating && !has_level {
        return None;
    }

    let level = level.filter(|l| *l != 0.0);
    let safety_rating = level.map(|l| (l / 4.0).floor() + (l % 4.0) * 0.25);
    let display = level
        .zip(safety_rating)
        .map(|(l, sr)| format!("{} {sr:.2}", license_class(l)));

    Some(LicenseEntry {
        category: preferred.map(str::to_string),
        irating,
        safety_rating,
        display,
    })
}

fn license_class(level: f64) -> &'static str {
    if level >= 20.0 {
        "Pro"
    } else if level >= 16.0 {
        "A"
    } else if level >= 12.0 {
        "B"
    } else if level >= 8.0 {
        "C"
    } else {
        "D"
    }
}

/// Preferred category wins outright; otherwise the highest rating. Entries
/// without a rating rank below every rated entry and ties keep the earlier one.
pub fn pick_primary_license<'a>(
    licenses: &'a [LicenseEntry],
    preferred: Option<&str>,
) -> Option<&'a LicenseEntry> {
    if let Some(preferred) = preferred {
        if let Some(found) = licenses
            .iter()
            .find(|l| l.category.as_deref() == Some(preferred))
        {
            return Some(found);
        }
    }
    licenses.iter().fold(None, |best: Option<&LicenseEntry>, current| match best {
        None => Some(current),
        Some(best) => {
            let current_rating = current.irating.unwrap_or(f64::NEG_INFINITY);
            let best_rating = best.irating.unwrap_or(f64::NEG_INFINITY);
            if current_rating > best_rating {
                Some(current)
            } else {
                Some(best)
            }
        }
    })
}

/// Career payloads come either as a map of category -> stats or as
/// `{ "stats": [ { "category": .., .. }, .. ] }`. Both become an ordered map.
pub fn career_map(raw: &Value) -> Option<Map<String, Value>> {
    let record = raw.as_object()?;
    match record.get("stats") {
        Some(Value::Array(entries)) => Some(
            entries
                .iter()
                .filter_map(|entry| {
                    let category = entry.get("category").and_then(to_string_value)?;
                    Some((category, entry.clone()))
                })
                .collect(),
        ),
        _ => Some(record.clone()),
    }
}

pub fn pick_career_entry(raw: &Value, preferred: Option<&str>) -> Option<CareerOverview> {
    let map = career_map(raw)?;
    let entries: Vec<(&String, &Map<String, Value>)> = map
        .iter()
        .filter_map(|(key, value)| value.as_object().map(|data| (key, data)))
        .collect();

    let preferred_match = preferred.and_then(|preferred| {
        entries
            .iter()
            .find(|(key, _)| slug_str(key).as_deref() == Some(preferred))
    });
    let (key, data) = preferred_match.or_else(|| entries.first())?;

    let top5 = first_of(data, CAREER_TOP5, to_number);
    let explicit_podiums = first_of(data, CAREER_PODIUMS, to_number);
    let podiums_approximate = explicit_podiums.is_none() && top5.is_some();

    Some(CareerOverview {
        category: slug_str(key).or_else(|| preferred.map(str::to_string)),
        wins: data.get("wins").and_then(to_number),
        podiums: explicit_podiums.or(top5),
        top5,
        starts: first_of(data, CAREER_STARTS, to_number),
        podiums_approximate,
    })
}

pub fn extract_races(raw: &Value) -> &[Value] {
    match raw {
        Value::Array(items) => items,
        Value::Object(record) => RACE_LIST_KEYS
            .iter()
            .find_map(|key| record.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    }
}

pub fn normalize_race(value: &Value) -> Option<RaceResult> {
    let record = value.as_object()?;
    Some(RaceResult {
        subsession_id: first_of(record, RACE_SUBSESSION, to_number),
        start_time: first_of(record, RACE_START, to_string_value),
        finish_position: first_of(record, RACE_POSITION, to_number),
        incidents: first_of(record, RACE_INCIDENTS, to_number),
        series_name: first_of(record, RACE_SERIES, to_string_value),
        track_name: first_of(record, RACE_TRACK, to_string_value),
        track_config: first_of(record, RACE_TRACK_CONFIG, to_string_value),
        car_name: first_of(record, RACE_CAR, to_string_value),
        strength_of_field: first_of(record, RACE_SOF, to_number),
    })
}

/// Milliseconds since the epoch; anything unparseable sorts as the oldest.
pub fn start_time_millis(race: &RaceResult) -> i64 {
    race.start_time
        .as_deref()
        .and_then(parse_datetime)
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

pub fn derive_driver_data(
    overview: Option<Overview>,
    career: Option<CareerOverview>,
    mut races: Vec<RaceResult>,
) -> DriverData {
    races.sort_by_key(|race| std::cmp::Reverse(start_time_millis(race)));

    let latest_race = races.first().cloned();
    let latest_podium = races.iter().find(|race| race.is_podium()).cloned();
    let sample_podium_count = races.iter().filter(|race| race.is_podium()).count();
    let sample_win_count = races.iter().filter(|race| race.is_win()).count();

    DriverData {
        overview,
        career,
        recent_races: races,
        latest_race,
        latest_podium,
        sample_podium_count,
        sample_win_count,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn race(start: &str, position: f64) -> RaceResult {
        RaceResult {
            start_time: Some(start.to_string()),
            finish_position: Some(position),
            ..Default::default()
        }
    }

    fn license(category: &str, irating: Option<f64>) -> LicenseEntry {
        LicenseEntry {
            category: Some(category.to_string()),
            irating,
            safety_rating: None,
            display: None,
        }
    }

    #[test]
    fn to_number_rejects_non_numeric_input() {
        for value in [
            json!(null),
            json!(""),
            json!("   "),
            json!("abc"),
            json!("NaN"),
            json!("Infinity"),
            json!("inf"),
            json!(true),
            json!([1]),
            json!({"value": 1}),
        ] {
            assert_eq!(to_number(&value), None, "{value}");
        }
    }

    #[test]
    fn to_number_accepts_numbers_and_numeric_strings() {
        assert_eq!(to_number(&json!(0)), Some(0.0));
        assert_eq!(to_number(&json!(2100)), Some(2100.0));
        assert_eq!(to_number(&json!(" 3.25 ")), Some(3.25));
        assert_eq!(to_number(&json!("0")), Some(0.0));
    }

    #[test]
    fn to_string_value_handles_each_shape() {
        assert_eq!(to_string_value(&json!("  Spa  ")), Some("Spa".to_string()));
        assert_eq!(to_string_value(&json!("   ")), None);
        assert_eq!(to_string_value(&json!(42)), Some("42".to_string()));
        assert_eq!(to_string_value(&json!(1.5)), Some("1.5".to_string()));
        assert_eq!(
            to_string_value(&json!("2024-03-01T18:00:00Z")),
            Some("2024-03-01T18:00:00Z".to_string())
        );
        assert_eq!(to_string_value(&json!({"name": "GT3"})), Some("GT3".to_string()));
        assert_eq!(
            to_string_value(&json!({"description": "Oval"})),
            Some("Oval".to_string())
        );
        assert_eq!(to_string_value(&json!({"id": 4})), None);
        assert_eq!(to_string_value(&json!(false)), None);
    }

    #[test]
    fn category_slug_is_lowercase_with_single_underscores() {
        assert_eq!(slug_str("Sports Car"), Some("sports_car".to_string()));
        assert_eq!(slug_str("  --Dirt   Road!! "), Some("dirt_road".to_string()));
        assert_eq!(slug_str("Formula Car (2024)"), Some("formula_car_2024".to_string()));
        assert_eq!(slug_str("   "), None);
        assert_eq!(slug_str("!!!"), None);
        assert_eq!(to_category_slug(&json!(null)), None);

        for input in ["A__B", "_x_", "Oval / Road", "ÉTÉ 2"] {
            if let Some(slug) = slug_str(input) {
                assert!(slug
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
                assert!(!slug.contains("__"));
                assert!(!slug.starts_with('_') && !slug.ends_with('_'));
            }
        }
    }

    #[test]
    fn first_of_skips_aliases_that_do_not_coerce() {
        let record = json!({"irating": "n/a", "iRating": 1800});
        let record = record.as_object().unwrap();
        assert_eq!(first_of(record, LICENSE_IRATING, to_number), Some(1800.0));
    }

    #[test]
    fn primary_license_prefers_highest_rating() {
        let licenses = vec![license("oval", Some(1200.0)), license("sports_car", Some(2100.0))];
        let picked = pick_primary_license(&licenses, None).unwrap();
        assert_eq!(picked.category.as_deref(), Some("sports_car"));
    }

    #[test]
    fn primary_license_honours_preferred_category() {
        let licenses = vec![license("oval", Some(1200.0)), license("sports_car", Some(2100.0))];
        let picked = pick_primary_license(&licenses, Some("oval")).unwrap();
        assert_eq!(picked.category.as_deref(), Some("oval"));
    }

    #[test]
    fn unrated_license_never_beats_a_rated_one() {
        let licenses = vec![license("dirt_oval", None), license("oval", Some(900.0))];
        let picked = pick_primary_license(&licenses, Some("formula_car")).unwrap();
        assert_eq!(picked.category.as_deref(), Some("oval"));
        assert!(pick_primary_license(&[], None).is_none());
    }

    #[test]
    fn license_list_is_read_from_either_shape() {
        let listed = json!({"licenses": [{"categoryName": "Sports Car", "irating": 2100, "safetyRating": "3.41", "groupName": "Class B"}]});
        let licenses = extract_licenses(&listed);
        assert_eq!(licenses.len(), 1);
        assert_eq!(licenses[0].category.as_deref(), Some("sports_car"));
        assert_eq!(licenses[0].safety_rating, Some(3.41));

        let keyed = json!({"licenses": {"Oval": {"irating": 1350}}});
        let licenses = extract_licenses(&keyed);
        assert_eq!(licenses[0].category.as_deref(), Some("oval"));
        assert_eq!(licenses[0].irating, Some(1350.0));
    }

    #[test]
    fn license_is_derived_from_race_rating_fields() {
        let raw = json!({"newiRating": 1642, "oldiRating": 1600, "licenseLevel": 11});
        let license = license_from_race(&raw, Some("sports_car")).unwrap();
        assert_eq!(license.irating, Some(1642.0));
        assert_eq!(license.safety_rating, Some(2.75));
        assert_eq!(license.display.as_deref(), Some("C 2.75"));
        assert_eq!(license.category.as_deref(), Some("sports_car"));

        assert!(license_from_race(&json!({"licenseLevel": 0}), None).is_none());
        let pro = license_from_race(&json!({"licenseLevel": 20}), None).unwrap();
        assert_eq!(pro.display.as_deref(), Some("Pro 5.00"));
    }

    #[test]
    fn career_podiums_fall_back_to_top5() {
        let raw = json!({
            "sports_car": {"podiums": null, "top5": 8},
            "oval": {"podiums": 2, "top5": 5}
        });
        let career = pick_career_entry(&raw, Some("sports_car")).unwrap();
        assert_eq!(career.category.as_deref(), Some("sports_car"));
        assert_eq!(career.podiums, Some(8.0));
        assert!(career.podiums_approximate);

        let oval = pick_career_entry(&raw, Some("oval")).unwrap();
        assert_eq!(oval.podiums, Some(2.0));
        assert!(!oval.podiums_approximate);
    }

    #[test]
    fn career_without_preference_takes_first_entry_in_document_order() {
        let raw = json!({
            "Road": {"wins": 1, "starts": "40"},
            "Oval": {"wins": 7, "starts": 12}
        });
        let career = pick_career_entry(&raw, None).unwrap();
        assert_eq!(career.category.as_deref(), Some("road"));
        assert_eq!(career.wins, Some(1.0));
        assert_eq!(career.starts, Some(40.0));
        assert_eq!(career.podiums, None);
        assert!(!career.podiums_approximate);
    }

    #[test]
    fn career_stats_array_is_keyed_by_category() {
        let raw = json!({
            "custId": 1,
            "stats": [
                {"category": "Oval", "wins": 0, "top5": 3, "starts": 9},
                {"category": "Sports Car", "wins": 2, "top5": 8, "starts": 25}
            ]
        });
        let career = pick_career_entry(&raw, Some("sports_car")).unwrap();
        assert_eq!(career.category.as_deref(), Some("sports_car"));
        assert_eq!(career.wins, Some(2.0));
        assert_eq!(career.podiums, Some(8.0));
        assert!(pick_career_entry(&json!({"custId": 1}), None).is_none());
    }

    #[test]
    fn races_are_found_under_known_container_keys() {
        assert_eq!(extract_races(&json!([{"a": 1}])).len(), 1);
        assert_eq!(extract_races(&json!({"items": "nope", "data": [{}, {}]})).len(), 2);
        assert_eq!(extract_races(&json!({"races": [{}], "results": [{}, {}]})).len(), 1);
        assert!(extract_races(&json!({"other": []})).is_empty());
        assert!(extract_races(&json!("races")).is_empty());
    }

    #[test]
    fn race_fields_resolve_through_nested_objects() {
        let raw = json!({
            "sessionId": "91234567",
            "startTimeUtc": "2024-03-01T18:00:00Z",
            "finishPositionInClass": 2,
            "incidentCount": "4",
            "series": {"seriesName": "IMSA"},
            "track": {"trackName": "Daytona", "configName": "Road Course"},
            "car": {"name": "BMW M4 GT3"},
            "sof": 2450
        });
        let race = normalize_race(&raw).unwrap();
        assert_eq!(race.subsession_id, Some(91234567.0));
        assert_eq!(race.start_time.as_deref(), Some("2024-03-01T18:00:00Z"));
        assert_eq!(race.finish_position, Some(2.0));
        assert_eq!(race.incidents, Some(4.0));
        assert_eq!(race.series_name.as_deref(), Some("IMSA"));
        assert_eq!(race.track_name.as_deref(), Some("Daytona"));
        assert_eq!(race.track_config.as_deref(), Some("Road Course"));
        assert_eq!(race.car_name.as_deref(), Some("BMW M4 GT3"));
        assert_eq!(race.strength_of_field, Some(2450.0));
        assert!(normalize_race(&json!(12)).is_none());
    }

    #[test]
    fn derivation_sorts_newest_first_and_counts_the_window() {
        let races = vec![
            race("2024-01-01", 5.0),
            race("2024-03-01", 1.0),
            race("2024-02-01", 3.0),
        ];
        let data = derive_driver_data(None, None, races);

        let order: Vec<_> = data
            .recent_races
            .iter()
            .map(|r| r.start_time.clone().unwrap())
            .collect();
        assert_eq!(order, vec!["2024-03-01", "2024-02-01", "2024-01-01"]);
        assert_eq!(data.latest_race.as_ref().unwrap().start_time.as_deref(), Some("2024-03-01"));
        assert_eq!(data.latest_podium.as_ref().unwrap().start_time.as_deref(), Some("2024-03-01"));
        assert_eq!(data.sample_podium_count, 2);
        assert_eq!(data.sample_win_count, 1);
        assert!(data.error.is_none());
    }

    #[test]
    fn no_podium_in_window_leaves_latest_podium_empty() {
        let races = vec![race("2024-05-01", 7.0), race("2024-06-01", 4.0), race("2024-04-01", 0.0)];
        let data = derive_driver_data(None, None, races);
        assert!(data.latest_podium.is_none());
        assert_eq!(data.latest_race.unwrap().start_time.as_deref(), Some("2024-06-01"));
        assert_eq!(data.sample_podium_count, 0);
    }

    #[test]
    fn unparseable_start_times_sort_last() {
        let races = vec![
            RaceResult::default(),
            race("garbage", 2.0),
            race("2023-12-31T23:00:00+00:00", 9.0),
        ];
        let data = derive_driver_data(None, None, races);
        assert_eq!(data.recent_races[0].finish_position, Some(9.0));
        assert_eq!(data.latest_podium.unwrap().start_time.as_deref(), Some("garbage"));
    }
}
