use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceStatus {
    Scheduled,
    Live,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedDriver {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TentativeDriver {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRace {
    pub id: String,
    pub name: String,
    pub series: String,
    pub track: String,
    pub date: String,
    pub duration: Option<String>,
    pub car_class: Option<String>,
    pub status: RaceStatus,
    #[serde(default)]
    pub confirmed_drivers: Vec<ConfirmedDriver>,
    #[serde(default)]
    pub tentative_drivers: Vec<TentativeDriver>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRaceResult {
    pub id: String,
    pub series: String,
    pub track: String,
    pub car: String,
    pub position: i32,
    pub class_position: Option<i32>,
    pub laps: Option<i32>,
    pub incidents: Option<i32>,
    #[serde(rename = "iRatingChange")]
    pub irating_change: Option<i32>,
    pub race_date: String,
    pub is_team_event: bool,
    #[serde(default)]
    pub drivers: Vec<String>,
    pub strength_of_field: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDriverStats {
    pub races_completed: u32,
    pub wins: u32,
    pub podiums: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDriver {
    pub id: String,
    pub name: String,
    pub iracing_id: Option<String>,
    pub irating: Option<i32>,
    pub safety_rating: Option<String>,
    pub timezone: Option<String>,
    #[serde(default)]
    pub role: String,
    pub joined_at: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub stats: TeamDriverStats,
}

/// Averages arrive either as preformatted strings or as raw numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub total_races: u32,
    pub total_laps: u32,
    pub podiums: u32,
    pub wins: u32,
    pub top5s: u32,
    pub top10s: u32,
    pub avg_finish: StatValue,
    pub total_incidents: u32,
    pub avg_incidents: StatValue,
    pub best_finish: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruitmentForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub discord_username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iracing_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecruitmentForm {
    pub fn has_required_fields(&self) -> bool {
        !self.name.trim().is_empty() && !self.discord_username.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecruitmentResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl RecruitmentResponse {
    pub fn connection_failed() -> Self {
        RecruitmentResponse {
            success: false,
            message: "Failed to connect to server".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub is_past: bool,
}
