use std::sync::Arc;

use reqwest::Client;

use crate::utils::{
    bot_api::BotApiClient, config::Config, driver_stats::DriverStatsProvider,
    iracing_client::RacingDataApi,
};

pub struct AppState {
    pub driver_stats: DriverStatsProvider,
    pub bot_api: BotApiClient,
}

impl AppState {
    pub fn new(config: &Config, http_client: Client, racing_api: Arc<dyn RacingDataApi>) -> Self {
        AppState {
            driver_stats: DriverStatsProvider::new(racing_api, config),
            bot_api: BotApiClient::new(http_client, &config.bot_api_url, config.bot_api_cache_secs),
        }
    }
}
