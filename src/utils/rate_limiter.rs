use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use http::HeaderMap;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration, Instant};

const MAX_PAUSE: Duration = Duration::from_secs(15 * 60);

/// The service asked for a pause longer than the caller is willing to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttled {
    pub retry_in: Duration,
}

/// Caps concurrent upstream requests, spaces them out, and pauses when the
/// service reports its request budget is exhausted.
#[derive(Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    min_delay: Duration,
    last_request: Arc<tokio::sync::Mutex<Option<Instant>>>,
    resume_at: Arc<Mutex<Option<Instant>>>,
    max_wait: Duration,
}

impl RateLimiter {
    pub fn new(max_concurrent: usize, min_delay_ms: u64) -> Self {
        RateLimiter {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            min_delay: Duration::from_millis(min_delay_ms),
            last_request: Arc::new(tokio::sync::Mutex::new(None)),
            resume_at: Arc::new(Mutex::new(None)),
            max_wait: MAX_PAUSE,
        }
    }

    /// Pauses longer than `max_wait` are refused instead of slept through.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Returns a guard that releases the permit when dropped. The guard is
    /// `None` only if the semaphore was closed, in which case the request goes
    /// ahead unthrottled.
    pub async fn acquire(&self) -> Result<Option<tokio::sync::OwnedSemaphorePermit>, Throttled> {
        self.pending_pause()?;
        let permit = self.semaphore.clone().acquire_owned().await.ok();

        if let Some(wait) = self.pending_pause()? {
            tracing::debug!("Rate limit exhausted: waiting {:?}", wait);
            sleep(wait).await;
        }

        let mut last_request = self.last_request.lock().await;
        if let Some(last) = *last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_delay {
                let wait_time = self.min_delay - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                sleep(wait_time).await;
            }
        }
        *last_request = Some(Instant::now());
        drop(last_request);

        Ok(permit)
    }

    fn pending_pause(&self) -> Result<Option<Duration>, Throttled> {
        let wait = self
            .resume_at
            .lock()
            .ok()
            .and_then(|guard| *guard)
            .map(|resume_at| resume_at.saturating_duration_since(Instant::now()))
            .filter(|wait| !wait.is_zero());
        match wait {
            Some(wait) if wait > self.max_wait => Err(Throttled { retry_in: wait }),
            other => Ok(other),
        }
    }

    /// Reads `x-ratelimit-remaining` / `x-ratelimit-reset` (epoch seconds).
    pub fn observe(&self, headers: &HeaderMap) {
        let header_num = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
        };
        let (Some(0), Some(reset)) = (
            header_num("x-ratelimit-remaining"),
            header_num("x-ratelimit-reset"),
        ) else {
            return;
        };

        let now_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let wait = Duration::from_secs(reset.saturating_sub(now_epoch)).min(MAX_PAUSE);
        if let Ok(mut resume_at) = self.resume_at.lock() {
            *resume_at = Some(Instant::now() + wait);
        }
    }

    #[cfg(test)]
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}
