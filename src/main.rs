mod handlers;
mod models;
mod routes;
mod utils;

use routes::{init_tracing, make_app};
use tokio::net::TcpListener;
use tracing::{error, info};
use utils::config::Config;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_tracing();

    let config = Config::init();
    info!("Configuration loaded successfully");

    let app = match make_app(&config) {
        Ok(app) => app,
        Err(err) => {
            error!(error = %err, "Failed to initialize application");
            std::process::exit(1);
        }
    };

    let listener = match TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, addr = %config.bind_addr, "Failed to bind listener");
            std::process::exit(1);
        }
    };
    info!("Listening on http://{}", config.bind_addr);

    if let Err(err) = axum::serve(listener, app).await {
        error!(error = %err, "Server error");
    }
}
