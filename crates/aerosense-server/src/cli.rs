//! Command-line and environment configuration for the aerosense service.
//!
//! Every option can come from a flag or from the environment; a `.env`
//! file in the working directory is loaded first.
//!
//! | Option | Environment | Default |
//! |--------|-------------|---------|
//! | `--port` | `PORT` | `4000` |
//! | `--openaq-api-key` | `OPENAQ_API_KEY` | unset (primary disabled) |
//! | `--openweathermap-api-key` | `OPENWEATHERMAP_API_KEY`, then `OWM_API_KEY` | unset |
//!
//! Blank values are treated as unset.

use std::net::{Ipv4Addr, SocketAddr};

use clap::Parser;
use secrecy::SecretString;

pub const DEFAULT_PORT: u16 = 4000;

/// Air quality aggregation service.
#[derive(Debug, Parser)]
#[command(name = "aerosense", author, version, about = "Air quality aggregation service")]
pub struct Cli {
    /// TCP port to listen on.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// OpenAQ credential; without it the primary provider is skipped.
    #[arg(long, env = "OPENAQ_API_KEY", hide_env_values = true)]
    pub openaq_api_key: Option<String>,

    /// OpenWeatherMap credential used for the secondary provider.
    #[arg(long, env = "OPENWEATHERMAP_API_KEY", hide_env_values = true)]
    pub openweathermap_api_key: Option<String>,

    #[arg(long, env = "OWM_API_KEY", hide = true, hide_env_values = true)]
    pub owm_api_key: Option<String>,
}

/// Resolved process configuration.
#[derive(Debug)]
pub struct ServiceConfig {
    pub port: u16,
    pub openaq_api_key: Option<SecretString>,
    pub openweathermap_api_key: Option<SecretString>,
}

impl ServiceConfig {
    pub fn from_cli(cli: Cli) -> Self {
        Self {
            port: cli.port,
            openaq_api_key: non_blank(cli.openaq_api_key),
            openweathermap_api_key: non_blank(cli.openweathermap_api_key)
                .or_else(|| non_blank(cli.owm_api_key)),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

fn non_blank(value: Option<String>) -> Option<SecretString> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| SecretString::from(v.trim().to_owned()))
}
