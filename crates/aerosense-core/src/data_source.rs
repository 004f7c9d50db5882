//! Adapter contract and request type.
//!
//! Every upstream provider is wrapped in an [`AirQualitySource`] that turns
//! an [`AqiRequest`] into canonical [`Measurement`]s. The router only talks to
//! this trait, which is also the seam tests use to substitute fake providers.

use std::future::Future;
use std::pin::Pin;

use crate::{Measurement, ProviderId, SourceError, ValidationError};

/// Default city when the caller does not name one.
pub const DEFAULT_CITY: &str = "Delhi";

/// Default result cap when the caller does not give one.
pub const DEFAULT_LIMIT: usize = 50;

/// One aggregation request: "AQI for `city`, at most `limit` records".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AqiRequest {
    pub city: String,
    pub limit: usize,
    /// Caller-supplied secondary credential; wins over the configured one.
    pub secondary_key: Option<String>,
}

impl AqiRequest {
    pub fn new(city: impl Into<String>, limit: usize) -> Result<Self, ValidationError> {
        let city = city.into();
        let city = city.trim();
        if city.is_empty() {
            return Err(ValidationError::EmptyCity);
        }
        if limit == 0 {
            return Err(ValidationError::ZeroLimit);
        }

        Ok(Self {
            city: city.to_owned(),
            limit,
            secondary_key: None,
        })
    }

    /// Blank keys are ignored so an empty header does not mask the configured key.
    pub fn with_secondary_key(mut self, key: Option<impl Into<String>>) -> Self {
        self.secondary_key = key
            .map(Into::into)
            .filter(|key: &String| !key.trim().is_empty());
        self
    }
}

pub type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Measurement>, SourceError>> + Send + 'a>>;

/// Provider adapter contract.
///
/// Implementations must be `Send + Sync`; one instance serves all
/// concurrent requests and holds no per-request state.
pub trait AirQualitySource: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Fetches and normalizes measurements for the requested city.
    ///
    /// An empty vector is a valid answer; the router decides what it means.
    fn fetch<'a>(&'a self, req: &'a AqiRequest) -> FetchFuture<'a>;
}
