mod cli;
mod error;
mod routes;
mod telemetry;

use std::process::ExitCode;
use std::sync::Arc;

use aerosense_core::AqiRouterBuilder;
use clap::Parser;
use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::cli::{Cli, ServiceConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // a missing .env file is normal outside development
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    match run(ServiceConfig::from_cli(Cli::parse())).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "aerosense stopped");
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServiceConfig) -> std::io::Result<()> {
    if config.openaq_api_key.is_none() {
        warn!("OPENAQ_API_KEY not set; serving from OpenWeatherMap only");
    }
    if config.openweathermap_api_key.is_none() {
        warn!("OpenWeatherMap key not set; requests must supply one");
    }

    let router = AqiRouterBuilder::new()
        .with_openaq_key(exposed(config.openaq_api_key.as_ref()))
        .with_openweathermap_key(exposed(config.openweathermap_api_key.as_ref()))
        .build();

    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, primary = router.has_primary(), "aerosense listening");

    axum::serve(listener, routes::app(Arc::new(router))).await
}

fn exposed(secret: Option<&SecretString>) -> Option<String> {
    secret.map(|secret| secret.expose_secret().to_owned())
}
