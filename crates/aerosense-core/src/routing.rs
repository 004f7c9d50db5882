use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::adapters::{OpenAqAdapter, OpenWeatherMapAdapter};
use crate::data_source::{AirQualitySource, AqiRequest};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::{AggregationError, AqiError, Measurement, ProviderId, SourceError};

/// Successful aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct AqiSuccess {
    pub results: Vec<Measurement>,
    pub selected_source: ProviderId,
    /// Providers attempted, in order.
    pub source_chain: Vec<ProviderId>,
    /// Non-fatal notes, such as a swallowed primary failure.
    pub warnings: Vec<String>,
    pub latency_ms: u64,
}

/// Result of the primary attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimaryOutcome {
    /// Non-empty answer; returned as is.
    Data(Vec<Measurement>),
    /// Anything else sends the request to the secondary provider.
    Fallback(FallbackReason),
}

/// Why the secondary provider is consulted.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// No primary credential, so the primary was never called.
    Unconfigured,
    /// The primary answered with zero usable records.
    Empty,
    /// The primary failed; kept for the combined error report.
    Failed(SourceError),
}

/// Primary-then-secondary fallback orchestrator.
pub struct AqiRouter {
    primary: Option<Arc<dyn AirQualitySource>>,
    secondary: Arc<dyn AirQualitySource>,
}

impl AqiRouter {
    /// `primary` is `None` when its credential is not configured.
    pub fn new(
        primary: Option<Arc<dyn AirQualitySource>>,
        secondary: Arc<dyn AirQualitySource>,
    ) -> Self {
        Self { primary, secondary }
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Returns the first usable answer: primary data, else whatever the secondary says.
    ///
    /// # Errors
    ///
    /// - [`AqiError::Source`] when no primary is configured and the secondary fails
    /// - [`AqiError::Aggregation`] when the primary was attempted and the secondary fails
    pub async fn get_aqi(&self, req: &AqiRequest) -> Result<AqiSuccess, AqiError> {
        let started = Instant::now();

        let reason = match self.attempt_primary(req).await {
            PrimaryOutcome::Data(results) => {
                let provider = self.primary_id().unwrap_or(ProviderId::OpenAq);
                info!(source = %provider, count = results.len(), "primary provider answered");
                return Ok(AqiSuccess {
                    results,
                    selected_source: provider,
                    source_chain: vec![provider],
                    warnings: Vec::new(),
                    latency_ms: elapsed_ms(started),
                });
            }
            PrimaryOutcome::Fallback(reason) => reason,
        };

        let secondary = self.secondary.fetch(req).await;
        let mut decision = self.decide(reason, secondary);
        if let Ok(success) = &mut decision {
            success.latency_ms = elapsed_ms(started);
            info!(
                source = %success.selected_source,
                count = success.results.len(),
                latency_ms = success.latency_ms,
                "secondary provider answered"
            );
        }
        decision
    }

    async fn attempt_primary(&self, req: &AqiRequest) -> PrimaryOutcome {
        let Some(primary) = &self.primary else {
            debug!("primary provider not configured; skipping");
            return PrimaryOutcome::Fallback(FallbackReason::Unconfigured);
        };

        match primary.fetch(req).await {
            Ok(results) if !results.is_empty() => PrimaryOutcome::Data(results),
            Ok(_) => {
                info!(source = %primary.id(), city = %req.city, "primary provider returned no measurements; falling back");
                PrimaryOutcome::Fallback(FallbackReason::Empty)
            }
            Err(error) => {
                warn!(source = %primary.id(), code = error.code(), %error, "primary provider failed; falling back");
                PrimaryOutcome::Fallback(FallbackReason::Failed(error))
            }
        }
    }

    /// Single decision step over the fallback reason and the secondary result.
    ///
    /// The secondary answer is final even when empty.
    pub fn decide(
        &self,
        reason: FallbackReason,
        secondary: Result<Vec<Measurement>, SourceError>,
    ) -> Result<AqiSuccess, AqiError> {
        let secondary_id = self.secondary.id();
        let source_chain = match (&reason, self.primary_id()) {
            (FallbackReason::Unconfigured, _) | (_, None) => vec![secondary_id],
            (_, Some(primary_id)) => vec![primary_id, secondary_id],
        };

        match (reason, secondary) {
            (reason, Ok(results)) => {
                let warnings = match reason {
                    FallbackReason::Unconfigured => Vec::new(),
                    FallbackReason::Empty => vec![format!(
                        "primary source returned no measurements; used '{secondary_id}'"
                    )],
                    FallbackReason::Failed(error) => vec![format!(
                        "primary source failed ({}): {error}; used '{secondary_id}'",
                        error.code()
                    )],
                };
                Ok(AqiSuccess {
                    results,
                    selected_source: secondary_id,
                    source_chain,
                    warnings,
                    latency_ms: 0,
                })
            }
            (FallbackReason::Unconfigured, Err(error)) => Err(AqiError::Source(error)),
            (FallbackReason::Empty, Err(error)) => {
                Err(AggregationError::new(None, error).into())
            }
            (FallbackReason::Failed(primary), Err(error)) => {
                Err(AggregationError::new(Some(primary), error).into())
            }
        }
    }

    fn primary_id(&self) -> Option<ProviderId> {
        self.primary.as_ref().map(|primary| primary.id())
    }
}

/// Builds an [`AqiRouter`] over the real providers.
///
/// The primary adapter is only registered when its credential is non-blank.
/// The secondary adapter is always registered; without any credential it
/// fails with a configuration error unless the request carries one.
///
/// ```rust,ignore
/// use aerosense_core::AqiRouterBuilder;
///
/// let router = AqiRouterBuilder::new()
///     .with_openaq_key(std::env::var("OPENAQ_API_KEY").ok())
///     .with_openweathermap_key(std::env::var("OPENWEATHERMAP_API_KEY").ok())
///     .build();
/// ```
#[derive(Default)]
pub struct AqiRouterBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    openaq_api_key: Option<String>,
    openweathermap_api_key: Option<String>,
    openaq_base_url: Option<String>,
    openweathermap_base_url: Option<String>,
}

impl AqiRouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default reqwest transport.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn with_openaq_key(mut self, key: Option<String>) -> Self {
        self.openaq_api_key = key.filter(|key| !key.trim().is_empty());
        self
    }

    pub fn with_openweathermap_key(mut self, key: Option<String>) -> Self {
        self.openweathermap_api_key = key.filter(|key| !key.trim().is_empty());
        self
    }

    pub fn with_openaq_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openaq_base_url = Some(base_url.into());
        self
    }

    pub fn with_openweathermap_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openweathermap_base_url = Some(base_url.into());
        self
    }

    pub fn build(self) -> AqiRouter {
        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));

        let primary = self.openaq_api_key.map(|key| {
            let adapter = OpenAqAdapter::new(http_client.clone(), key);
            let adapter = match self.openaq_base_url {
                Some(base_url) => adapter.with_base_url(base_url),
                None => adapter,
            };
            Arc::new(adapter) as Arc<dyn AirQualitySource>
        });

        let secondary = OpenWeatherMapAdapter::new(http_client, self.openweathermap_api_key);
        let secondary = match self.openweathermap_base_url {
            Some(base_url) => secondary.with_base_url(base_url),
            None => secondary,
        };

        AqiRouter::new(primary, Arc::new(secondary))
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
