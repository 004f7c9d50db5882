use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::http_client::{url_with_query, HttpClient, HttpRequest};
use crate::{GeocodeResult, ProviderId, SourceError};

pub const OPENWEATHERMAP_BASE_URL: &str = "https://api.openweathermap.org";

const DIRECT_GEOCODE_PATH: &str = "/geo/1.0/direct";
const TIMEOUT_MS: u64 = 15_000;

/// Resolves free-text city names through the OpenWeatherMap direct geocoder.
///
/// Only the first match is kept; the geocoder is asked for a single result.
#[derive(Clone)]
pub struct OpenWeatherMapGeocoder {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
}

impl OpenWeatherMapGeocoder {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(OPENWEATHERMAP_BASE_URL),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub async fn resolve_city(
        &self,
        city: &str,
        api_key: Option<&str>,
    ) -> Result<GeocodeResult, SourceError> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| SourceError::config(ProviderId::OpenWeatherMap))?;

        let url = url_with_query(
            &format!("{}{DIRECT_GEOCODE_PATH}", self.base_url),
            &[
                ("q", city.to_owned()),
                ("limit", String::from("1")),
                ("appid", api_key.to_owned()),
            ],
        );
        let request = HttpRequest::get(url).with_timeout_ms(TIMEOUT_MS);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| SourceError::from_http(ProviderId::OpenWeatherMap, "geocoding", &e))?;

        if !response.is_success() {
            return Err(SourceError::upstream_status(
                ProviderId::OpenWeatherMap,
                response.status,
                response.body,
            ));
        }

        let matches: Vec<GeocodeMatch> = serde_json::from_str(&response.body).map_err(|e| {
            SourceError::malformed(ProviderId::OpenWeatherMap, e.to_string(), &response.body)
        })?;

        let Some(first) = matches.into_iter().next() else {
            return Err(SourceError::not_found(ProviderId::OpenWeatherMap, city));
        };

        let resolved = GeocodeResult {
            latitude: first.lat,
            longitude: first.lon,
            label: GeocodeResult::label_from_parts(
                first.name.as_deref(),
                first.state.as_deref(),
                first.country.as_deref(),
            ),
        };
        debug!(city, label = %resolved.label, "geocoded city");
        Ok(resolved)
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeMatch {
    lat: f64,
    lon: f64,
    name: Option<String>,
    state: Option<String>,
    country: Option<String>,
}
