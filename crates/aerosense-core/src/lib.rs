//! # Aerosense Core
//!
//! Answers "what is the air quality near city X" by querying one of two
//! upstream providers and normalizing their answers into [`Measurement`]s.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | OpenAQ (primary) and OpenWeatherMap (secondary) adapters, geocoder |
//! | [`data_source`] | Adapter trait and request type |
//! | [`domain`] | Canonical measurement and geocode types |
//! | [`error`] | Validation, source and aggregation errors |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`routing`] | Primary-then-secondary fallback |
//! | [`source`] | Provider identifiers |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  HTTP handler   │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    AqiRouter    │  primary (if configured) → secondary
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ AirQualitySource│────▶│   HttpClient     │
//! │ (OpenAQ / OWM)  │     │   (reqwest)      │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  Measurement    │
//! └─────────────────┘
//! ```
//!
//! ## Fallback policy
//!
//! The primary provider is consulted only when its credential is configured.
//! An empty primary answer and a failed primary call are treated the same:
//! both hand the request to the secondary provider, whose answer is final
//! even when empty.
//!
//! ```rust,ignore
//! use aerosense_core::{AqiRequest, AqiRouterBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = AqiRouterBuilder::new()
//!         .with_openweathermap_key(std::env::var("OPENWEATHERMAP_API_KEY").ok())
//!         .build();
//!
//!     let success = router.get_aqi(&AqiRequest::new("Delhi", 10)?).await?;
//!     for measurement in &success.results {
//!         println!("{:?} = {}", measurement.parameter, measurement.value);
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod routing;
pub mod source;

pub use adapters::{OpenAqAdapter, OpenWeatherMapAdapter, OpenWeatherMapGeocoder};

pub use data_source::{AirQualitySource, AqiRequest, FetchFuture, DEFAULT_CITY, DEFAULT_LIMIT};

pub use domain::{Coordinates, GeocodeResult, Measurement, Pollutant, UtcDateTime};

pub use error::{AggregationError, AqiError, SourceError, SourceErrorKind, ValidationError};

pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

pub use routing::{AqiRouter, AqiRouterBuilder, AqiSuccess, FallbackReason, PrimaryOutcome};

pub use source::ProviderId;
