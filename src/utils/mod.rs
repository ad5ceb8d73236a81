pub mod bot_api;
pub mod config;
pub mod driver_stats;
pub mod iracing_client;
pub mod normalize;
pub mod race_utils;
pub mod rate_limiter;
pub mod session;
pub mod state;
