use std::sync::Arc;

use chathub::auth::JwtValidator;
use chathub::config::{DEV_JWT_SECRET, Settings, load_config};
use chathub::hub::Hub;
use chathub::persistence::SledStore;
use chathub::transport::websocket::start_websocket_server;
use chathub::utils::{HubError, logging};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // A missing .env file is fine; real deployments set the environment directly.
    let _ = dotenvy::dotenv();

    if let Err(e) = run().await {
        // No-op if configuration got far enough to install the subscriber.
        logging::init(&Settings::default().logging);
        error!("server failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), HubError> {
    let config = load_config()?;
    logging::init(&config.logging);

    if config.auth.jwt_secret == DEV_JWT_SECRET {
        warn!("using the development JWT secret; set CHATHUB_AUTH__JWT_SECRET");
    }

    let store = Arc::new(SledStore::open(&config.storage.path)?);
    let (hub, _dispatcher) = Hub::start(config.hub.clone(), store.clone(), store.clone());
    let validator = Arc::new(JwtValidator::new(&config.auth));

    tokio::select! {
        result = start_websocket_server(&config, hub.clone(), validator) => {
            result?;
            error!("WebSocket server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
            hub.shutdown();
        }
    }

    store.flush()?;
    Ok(())
}
