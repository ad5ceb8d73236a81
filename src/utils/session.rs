use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::models::error::StatsError;
use crate::utils::iracing_client::{Credentials, RacingDataApi};

pub const MISSING_CREDENTIALS: &str = "Missing IRACING_EMAIL or IRACING_PASSWORD environment variables.";

#[derive(Debug, Default)]
struct SessionState {
    authenticated: bool,
    /// Bumped on every successful login; lets callers invalidate only the
    /// session they actually used.
    generation: u64,
    last_failure: Option<StatsError>,
}

/// Owns the login lifecycle for one upstream client.
///
/// Logins are serialized behind an async mutex. A caller that queued while an
/// attempt was running takes that attempt's outcome instead of logging in
/// again; a caller arriving after a failed attempt starts a fresh one.
#[derive(Debug, Default)]
pub struct SessionHolder {
    state: Mutex<SessionState>,
    completed_attempts: AtomicU64,
}

impl SessionHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn ensure_logged_in(
        &self,
        api: &dyn RacingDataApi,
        credentials: Option<&Credentials>,
    ) -> Result<u64, StatsError> {
        let credentials =
            credentials.ok_or_else(|| StatsError::Config(MISSING_CREDENTIALS.to_string()))?;

        let seen_attempts = self.completed_attempts.load(Ordering::Acquire);
        let mut state = self.state.lock().await;
        if state.authenticated {
            return Ok(state.generation);
        }
        if self.completed_attempts.load(Ordering::Acquire) != seen_attempts {
            if let Some(err) = &state.last_failure {
                return Err(err.clone());
            }
        }

        info!("[iRacing] Logging in");
        let outcome = api.login(credentials).await;
        self.completed_attempts.fetch_add(1, Ordering::AcqRel);
        match outcome {
            Ok(()) => {
                state.generation += 1;
                state.authenticated = true;
                state.last_failure = None;
                Ok(state.generation)
            }
            Err(err) => {
                warn!(error = %err, "[iRacing] Login failed");
                state.last_failure = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Drops the session if it is still the one identified by `generation`.
    pub async fn invalidate(&self, generation: u64) {
        let mut state = self.state.lock().await;
        if state.authenticated && state.generation == generation {
            state.authenticated = false;
        }
    }

    #[cfg(test)]
    pub async fn is_authenticated(&self) -> bool {
        self.state.lock().await.authenticated
    }

    /// Runs `task` with a live session. An unauthorized response resets the
    /// session and the task is retried exactly once; if the retry is rejected
    /// too, the session stays reset and the error is returned.
    pub async fn with_auth<T, F, Fut>(
        &self,
        api: &dyn RacingDataApi,
        credentials: Option<&Credentials>,
        task: F,
    ) -> Result<T, StatsError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, StatsError>>,
    {
        let generation = self.ensure_logged_in(api, credentials).await?;
        match task().await {
            Err(err) if err.is_unauthorized() => {
                warn!(error = %err, "[iRacing] Session rejected, logging in again");
                self.invalidate(generation).await;
                let generation = self.ensure_logged_in(api, credentials).await?;
                let retried = task().await;
                if matches!(&retried, Err(err) if err.is_unauthorized()) {
                    self.invalidate(generation).await;
                }
                retried
            }
            other => other,
        }
    }
}
