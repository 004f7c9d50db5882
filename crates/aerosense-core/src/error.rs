use thiserror::Error;

use crate::http_client::HttpError;
use crate::ProviderId;

/// Validation and contract errors exposed by `aerosense-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("city cannot be empty")]
    EmptyCity,
    #[error("limit must be greater than zero")]
    ZeroLimit,

    #[error("timestamp is not a valid RFC3339 instant: '{value}'")]
    InvalidTimestamp { value: String },
    #[error("unix timestamp {value} is out of range")]
    TimestampOutOfRange { value: i64 },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Config,
    NotFound,
    Provider,
}

/// Failure of a single provider path (adapter or geocoder).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// A required credential is absent.
    #[error("{provider} credential is not configured")]
    Config { provider: ProviderId },

    /// The geocoder returned zero matches.
    #[error("city not found: '{city}'")]
    NotFound { provider: ProviderId, city: String },

    /// Non-2xx response, malformed body, transport failure or timeout.
    #[error("{provider} request failed: {message}")]
    Provider {
        provider: ProviderId,
        status: Option<u16>,
        message: String,
        body: Option<String>,
    },
}

impl SourceError {
    pub fn config(provider: ProviderId) -> Self {
        Self::Config { provider }
    }

    pub fn not_found(provider: ProviderId, city: impl Into<String>) -> Self {
        Self::NotFound {
            provider,
            city: city.into(),
        }
    }

    pub fn transport(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            status: None,
            message: message.into(),
            body: None,
        }
    }

    /// Transport failure of one upstream call; `context` names the call.
    pub fn from_http(provider: ProviderId, context: &str, error: &HttpError) -> Self {
        let outcome = if error.timed_out() {
            "timed out"
        } else {
            "transport error"
        };
        Self::transport(provider, format!("{context} {outcome}: {}", error.message()))
    }

    pub fn upstream_status(provider: ProviderId, status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::Provider {
            provider,
            status: Some(status),
            message: format!("upstream returned status {status}"),
            body: (!body.trim().is_empty()).then_some(body),
        }
    }

    pub fn malformed(provider: ProviderId, message: impl Into<String>, body: &str) -> Self {
        Self::Provider {
            provider,
            status: None,
            message: format!("malformed response body: {}", message.into()),
            body: (!body.trim().is_empty()).then(|| body.to_owned()),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        match self {
            Self::Config { .. } => SourceErrorKind::Config,
            Self::NotFound { .. } => SourceErrorKind::NotFound,
            Self::Provider { .. } => SourceErrorKind::Provider,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self.kind() {
            SourceErrorKind::Config => "source.config",
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::Provider => "source.provider",
        }
    }

    pub const fn provider(&self) -> ProviderId {
        match self {
            Self::Config { provider }
            | Self::NotFound { provider, .. }
            | Self::Provider { provider, .. } => *provider,
        }
    }

    /// Upstream HTTP status, when the failure came from a response.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => *status,
            _ => None,
        }
    }

    /// Raw upstream response body, when one was captured.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Provider { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}

/// The secondary path failed after the primary was attempted.
///
/// `primary` is `None` when the primary answered successfully but empty.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("all providers failed: {secondary}")]
pub struct AggregationError {
    pub primary: Option<SourceError>,
    pub secondary: SourceError,
}

impl AggregationError {
    pub fn new(primary: Option<SourceError>, secondary: SourceError) -> Self {
        Self { primary, secondary }
    }

    /// The secondary status wins when present.
    pub fn status(&self) -> Option<u16> {
        self.secondary
            .status()
            .or_else(|| self.primary.as_ref().and_then(SourceError::status))
    }
}

/// Terminal failure of an aggregation request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AqiError {
    /// Only one path was attempted and it failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

impl AqiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Source(error) => error.status(),
            Self::Aggregation(error) => error.status(),
        }
    }

    /// Diagnostic detail: upstream bodies before messages, secondary before primary.
    pub fn details(&self) -> String {
        match self {
            Self::Source(error) => error
                .body()
                .map(str::to_owned)
                .unwrap_or_else(|| error.to_string()),
            Self::Aggregation(AggregationError { primary, secondary }) => secondary
                .body()
                .or_else(|| primary.as_ref().and_then(SourceError::body))
                .map(str::to_owned)
                .unwrap_or_else(|| secondary.to_string()),
        }
    }

    /// The failure to report to callers as the final cause.
    pub fn last_source_error(&self) -> &SourceError {
        match self {
            Self::Source(error) => error,
            Self::Aggregation(error) => &error.secondary,
        }
    }
}
