use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http::StatusCode;
use reqwest::{Client, Response};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::models::error::StatsError;
use crate::utils::rate_limiter::{RateLimiter, Throttled};

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn from_parts(email: Option<&str>, password: Option<&str>) -> Option<Self> {
        match (email, password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(Credentials::new(email, password))
            }
            _ => None,
        }
    }

    /// The service expects base64(sha256(password + lowercase(email))).
    pub fn encoded_password(&self) -> String {
        let digest = Sha256::digest(format!("{}{}", self.password, self.email.to_lowercase()));
        STANDARD.encode(digest)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The subset of the racing-data service the stats provider depends on.
/// Payloads are returned untyped with camelCase keys.
#[async_trait]
pub trait RacingDataApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<(), StatsError>;
    async fn member_summary(&self, cust_id: i64) -> Result<Value, StatsError>;
    async fn member_career(&self, cust_id: i64) -> Result<Value, StatsError>;
    async fn member_recent_races(&self, cust_id: i64) -> Result<Value, StatsError>;
}

pub struct IracingClient {
    http: Client,
    base_url: String,
    limiter: RateLimiter,
}

impl IracingClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StatsError> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .user_agent("RockyRacingSite/1.0")
            .build()
            .map_err(|e| StatsError::Transport(e.to_string()))?;
        Ok(IracingClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::new(4, 100).with_max_wait(timeout),
        })
    }

    async fn get_data(&self, endpoint: &str, cust_id: i64) -> Result<Value, StatsError> {
        let url = format!("{}/data/{endpoint}", self.base_url);
        let body = self.get_json(&url, &[("cust_id", cust_id.to_string())]).await?;

        // Data endpoints usually answer with a short-lived link to the payload.
        let payload = match body.get("link").and_then(Value::as_str) {
            Some(link) => {
                debug!(endpoint, "following data link");
                self.get_json(link, &[]).await?
            }
            None => body,
        };
        Ok(camelize_keys(payload))
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, StatsError> {
        let _permit = self.limiter.acquire().await.map_err(rate_limited)?;
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| StatsError::Transport(e.to_string()))?;
        self.limiter.observe(res.headers());
        read_json(res, url).await
    }
}

fn rate_limited(throttled: Throttled) -> StatsError {
    StatsError::Transport(format!(
        "rate limited, retry in {}s",
        throttled.retry_in.as_secs().max(1)
    ))
}

async fn read_json(res: Response, url: &str) -> Result<Value, StatsError> {
    let status = res.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(StatsError::Unauthorized(url.to_string()));
    }
    if !status.is_success() {
        return Err(StatsError::Status(status.as_u16(), url.to_string()));
    }
    res.json::<Value>()
        .await
        .map_err(|e| StatsError::Decode(e.to_string()))
}

#[async_trait]
impl RacingDataApi for IracingClient {
    async fn login(&self, credentials: &Credentials) -> Result<(), StatsError> {
        let url = format!("{}/auth", self.base_url);
        let _permit = self.limiter.acquire().await.map_err(rate_limited)?;
        let res = self
            .http
            .post(&url)
            .json(&json!({
                "email": credentials.email,
                "password": credentials.encoded_password(),
            }))
            .send()
            .await
            .map_err(|e| StatsError::Transport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(StatsError::Login(format!("HTTP {}", status.as_u16())));
        }
        let body: Value = res
            .json()
            .await
            .map_err(|e| StatsError::Decode(e.to_string()))?;
        login_outcome(&body)
    }

    async fn member_summary(&self, cust_id: i64) -> Result<Value, StatsError> {
        self.get_data("stats/member_summary", cust_id).await
    }

    async fn member_career(&self, cust_id: i64) -> Result<Value, StatsError> {
        self.get_data("stats/member_career", cust_id).await
    }

    async fn member_recent_races(&self, cust_id: i64) -> Result<Value, StatsError> {
        self.get_data("stats/member_recent_races", cust_id).await
    }
}

/// A 200 from the auth endpoint can still carry a refusal in its body.
fn login_outcome(body: &Value) -> Result<(), StatsError> {
    if let Some(error) = body.get("error").filter(|e| !e.is_null() && **e != Value::Bool(false)) {
        let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
        return Err(StatsError::Login(message));
    }
    if body.get("authcode").and_then(Value::as_i64) == Some(0) {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("authentication rejected");
        return Err(StatsError::Login(message.to_string()));
    }
    Ok(())
}

/// `newi_rating` -> `newiRating`, applied to every object key in the tree.
pub fn camelize_keys(value: Value) -> Value {
    match value {
        Value::Object(record) => Value::Object(
            record
                .into_iter()
                .map(|(key, value)| (snake_to_camel(&key), camelize_keys(value)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(camelize_keys).collect()),
        other => other,
    }
}

fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
