mod app;

use std::{
    fs::{self, OpenOptions},
    sync::Arc,
};

use anyhow::{Context, Result};
use rentcar_core::{
    config::{self, AppConfig},
    JsonStore, RentalSystem,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let store = JsonStore::open(&config.data_dir)?;
    let mut system = RentalSystem::open(store)?;
    system
        .ensure_admin(&config.admin_username, &config.admin_password)
        .context("failed to create admin account")?;
    info!(
        data_dir = %config.data_dir.display(),
        cars = system.cars().len(),
        users = system.users().len(),
        "Rental desk ready"
    );

    let mut app = app::RentalApp::new(system, config);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("rentcar.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // The alternate screen owns stdout, so logs only go to the file.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
