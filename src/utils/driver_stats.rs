use std::sync::Arc;

use tracing::{error, info, warn};

use crate::models::driver::{DriverData, Overview};
use crate::models::error::StatsError;
use crate::utils::config::Config;
use crate::utils::iracing_client::{Credentials, RacingDataApi};
use crate::utils::normalize::{
    derive_driver_data, extract_licenses, extract_races, license_from_race, normalize_race,
    pick_career_entry, pick_primary_license, slug_str,
};
use crate::utils::session::SessionHolder;

/// Produces driver snapshots from the racing-data service.
///
/// `get_driver_data` never fails: configuration problems and upstream errors
/// become placeholder data with `error` set.
pub struct DriverStatsProvider {
    api: Arc<dyn RacingDataApi>,
    session: SessionHolder,
    cust_id: Option<String>,
    credentials: Option<Credentials>,
    preferred_category: Option<String>,
}

impl DriverStatsProvider {
    pub fn new(api: Arc<dyn RacingDataApi>, config: &Config) -> Self {
        Self::with_settings(
            api,
            config.iracing_cust_id.clone(),
            Credentials::from_parts(
                config.iracing_email.as_deref(),
                config.iracing_password.as_deref(),
            ),
            config.iracing_primary_category.as_deref(),
        )
    }

    pub fn with_settings(
        api: Arc<dyn RacingDataApi>,
        cust_id: Option<String>,
        credentials: Option<Credentials>,
        preferred_category: Option<&str>,
    ) -> Self {
        DriverStatsProvider {
            api,
            session: SessionHolder::new(),
            cust_id,
            credentials,
            preferred_category: preferred_category.and_then(slug_str),
        }
    }

    pub async fn get_driver_data(&self) -> DriverData {
        info!("[iRacing] Starting data fetch...");

        let cust_id = match parse_customer_id(self.cust_id.as_deref()) {
            Ok(cust_id) => cust_id,
            Err(err) => {
                warn!(error = %err, "[iRacing] Using fallback data");
                return DriverData::fallback(err.to_string());
            }
        };

        info!(cust_id, "[iRacing] Fetching data for customer");
        match self.fetch_live(cust_id).await {
            Ok(data) => data,
            Err(err) => {
                error!(error = %err, "[iRacing] Failed to load data, using static fallback");
                DriverData::fallback(err.to_string())
            }
        }
    }

    async fn fetch_live(&self, cust_id: i64) -> Result<DriverData, StatsError> {
        let api = self.api.as_ref();
        let credentials = self.credentials.as_ref();

        let (summary, career_raw, recent_raw) = tokio::try_join!(
            self.session
                .with_auth(api, credentials, || api.member_summary(cust_id)),
            self.session
                .with_auth(api, credentials, || api.member_career(cust_id)),
            self.session
                .with_auth(api, credentials, || api.member_recent_races(cust_id)),
        )?;

        let preferred = self.preferred_category.as_deref();
        let raw_races = extract_races(&recent_raw);

        let mut licenses = extract_licenses(&summary);
        if licenses.is_empty() {
            // The service lists races newest first; its ratings reflect the current license.
            licenses.extend(raw_races.first().and_then(|race| license_from_race(race, preferred)));
        }
        let overview = pick_primary_license(&licenses, preferred)
            .cloned()
            .map(Overview::from);
        let career = pick_career_entry(&career_raw, preferred);
        let races = raw_races.iter().filter_map(normalize_race).collect();

        Ok(derive_driver_data(overview, career, races))
    }
}

pub fn parse_customer_id(raw: Option<&str>) -> Result<i64, StatsError> {
    let raw = raw
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| StatsError::Config("IRACING_CUST_ID is not configured".to_string()))?;

    if let Ok(id) = raw.parse::<i64>() {
        return Ok(id);
    }
    match raw.parse::<f64>() {
        Ok(id) if id.is_finite() && id.fract() == 0.0 && id.abs() < i64::MAX as f64 => {
            Ok(id as i64)
        }
        _ => Err(StatsError::Config(
            "IRACING_CUST_ID is not a valid number".to_string(),
        )),
    }
}
