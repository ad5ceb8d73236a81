use dashmap::DashMap;
use http::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::models::{
    cache::CacheEntry,
    team::{RecruitmentForm, RecruitmentResponse, TeamDriver, TeamRace, TeamRaceResult, TeamStats},
};

pub const DEFAULT_UPCOMING_LIMIT: u32 = 10;
pub const DEFAULT_RESULTS_LIMIT: u32 = 20;
pub const MAX_LIST_LIMIT: u32 = 50;

/// Client for the team bot service. Reads are cached per endpoint; a failed
/// read is logged and surfaces as an empty value.
pub struct BotApiClient {
    http: Client,
    base_url: String,
    cache: DashMap<String, CacheEntry<Value>>,
    ttl_seconds: i64,
}

impl BotApiClient {
    pub fn new(http: Client, base_url: &str, ttl_seconds: i64) -> Self {
        BotApiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: DashMap::new(),
            ttl_seconds,
        }
    }

    pub async fn fetch(&self, endpoint: &str) -> Option<Value> {
        let cached = self
            .cache
            .get(endpoint)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone());
        if cached.is_some() {
            return cached;
        }

        let url = format!("{}{}", self.base_url, endpoint);
        let res = match self
            .http
            .get(&url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
        {
            Ok(res) => res,
            Err(err) => {
                warn!(error = %err, endpoint, "[Bot API] Fetch failed");
                return None;
            }
        };

        if !res.status().is_success() {
            warn!("[Bot API] Error {} for {}", res.status().as_u16(), endpoint);
            return None;
        }

        match res.json::<Value>().await {
            Ok(body) => {
                self.cache.retain(|_, entry| !entry.is_expired());
                self.cache.insert(
                    endpoint.to_string(),
                    CacheEntry::new(body.clone(), self.ttl_seconds),
                );
                Some(body)
            }
            Err(err) => {
                warn!(error = %err, endpoint, "[Bot API] Fetch failed");
                None
            }
        }
    }

    pub async fn next_race(&self) -> Option<TeamRace> {
        field(self.fetch("/api/races/next").await, "race")
    }

    pub async fn upcoming_races(&self, limit: u32) -> Vec<TeamRace> {
        let endpoint = format!("/api/races/upcoming?limit={}", clamp_limit(limit));
        list_field(self.fetch(&endpoint).await, "races")
    }

    pub async fn race_results(&self, limit: u32) -> Vec<TeamRaceResult> {
        let endpoint = format!("/api/results?limit={}", clamp_limit(limit));
        list_field(self.fetch(&endpoint).await, "results")
    }

    pub async fn roster(&self) -> Vec<TeamDriver> {
        list_field(self.fetch("/api/drivers").await, "drivers")
    }

    pub async fn team_stats(&self) -> Option<TeamStats> {
        field(self.fetch("/api/stats").await, "stats")
    }

    pub async fn submit_recruitment(&self, form: &RecruitmentForm) -> RecruitmentResponse {
        let url = format!("{}/api/recruitment", self.base_url);
        let res = match self.http.post(&url).json(form).send().await {
            Ok(res) => res,
            Err(err) => {
                warn!(error = %err, "[Bot API] Recruitment submit failed");
                return RecruitmentResponse::connection_failed();
            }
        };
        if !res.status().is_success() {
            warn!("[Bot API] Error {} for /api/recruitment", res.status().as_u16());
            return RecruitmentResponse::connection_failed();
        }
        match res.json::<RecruitmentResponse>().await {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "[Bot API] Recruitment submit failed");
                RecruitmentResponse::connection_failed()
            }
        }
    }
}

/// Pulls `key` out of a bot response envelope. A missing or malformed field
/// is treated as absent.
fn field<T: DeserializeOwned>(body: Option<Value>, key: &str) -> Option<T> {
    let mut body = body?;
    let value = body.get_mut(key)?.take();
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(error = %err, key, "[Bot API] Unexpected response shape");
            None
        }
    }
}

/// Like `field`, but decodes a list entry by entry so one odd record does not
/// hide the rest.
fn list_field<T: DeserializeOwned>(body: Option<Value>, key: &str) -> Vec<T> {
    let Some(Value::Array(items)) = field::<Value>(body, key) else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!(error = %err, key, "[Bot API] Skipping malformed entry");
                None
            }
        })
        .collect()
}

/// Keeps the per-endpoint cache keyspace bounded.
fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_LIST_LIMIT)
}
