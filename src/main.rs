mod app;
mod classifier;
mod config;
mod domain;
mod infrastructure;
mod phishing;
mod pipeline;
mod translation;

use anyhow::Result;
use infrastructure::{directories, logging, shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config.logging, &paths.logs_dir)?;

    let shutdown = shutdown::Shutdown::new();
    shutdown::install_signal_handlers(shutdown.clone());

    let app = app::SpamSieveApp::initialize(config, paths, shutdown)?;
    app.run().await
}
