use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::adapters::geocoding::{OpenWeatherMapGeocoder, OPENWEATHERMAP_BASE_URL};
use crate::data_source::{AirQualitySource, AqiRequest, FetchFuture};
use crate::http_client::{url_with_query, HttpClient, HttpRequest};
use crate::{GeocodeResult, Measurement, Pollutant, ProviderId, SourceError, UtcDateTime};

const AIR_POLLUTION_PATH: &str = "/data/2.5/air_pollution";
const TIMEOUT_MS: u64 = 15_000;
const COMPONENT_UNIT: &str = "µg/m³";

/// Source component field for each extracted pollutant, in output order.
const COMPONENT_FIELDS: [(&str, Pollutant); 3] = [
    ("pm2_5", Pollutant::Pm25),
    ("pm10", Pollutant::Pm10),
    ("no2", Pollutant::No2),
];

/// Secondary provider: geocode the city, then read the latest air pollution bundle.
#[derive(Clone)]
pub struct OpenWeatherMapAdapter {
    http_client: Arc<dyn HttpClient>,
    geocoder: OpenWeatherMapGeocoder,
    api_key: Option<String>,
    base_url: String,
}

impl OpenWeatherMapAdapter {
    /// `api_key` is the process-level credential; requests may override it.
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            geocoder: OpenWeatherMapGeocoder::new(http_client.clone()),
            http_client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: String::from(OPENWEATHERMAP_BASE_URL),
        }
    }

    /// Points both the geocoder and the air pollution endpoint at `base_url`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        self.geocoder = self.geocoder.with_base_url(base_url.clone());
        self.base_url = base_url;
        self
    }

    fn effective_key<'a>(&'a self, req: &'a AqiRequest) -> Option<&'a str> {
        req.secondary_key
            .as_deref()
            .or(self.api_key.as_deref())
    }

    async fn fetch_latest(&self, req: &AqiRequest) -> Result<Vec<Measurement>, SourceError> {
        let api_key = self.effective_key(req);
        let geo = self.geocoder.resolve_city(&req.city, api_key).await?;
        // resolve_city already rejected a missing key
        let api_key = api_key.unwrap_or_default();

        let url = url_with_query(
            &format!("{}{AIR_POLLUTION_PATH}", self.base_url),
            &[
                ("lat", geo.latitude.to_string()),
                ("lon", geo.longitude.to_string()),
                ("appid", api_key.to_owned()),
            ],
        );
        let request = HttpRequest::get(url).with_timeout_ms(TIMEOUT_MS);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| SourceError::from_http(ProviderId::OpenWeatherMap, "air pollution", &e))?;

        if !response.is_success() {
            return Err(SourceError::upstream_status(
                ProviderId::OpenWeatherMap,
                response.status,
                response.body,
            ));
        }

        let body: Value = serde_json::from_str(&response.body).map_err(|e| {
            SourceError::malformed(ProviderId::OpenWeatherMap, e.to_string(), &response.body)
        })?;

        let Some(latest) = body
            .get("list")
            .and_then(Value::as_array)
            .and_then(|list| list.first())
        else {
            debug!(city = %req.city, "air pollution list is empty");
            return Ok(Vec::new());
        };

        let Some(components) = latest.get("components").and_then(Value::as_object) else {
            debug!(city = %req.city, "latest air pollution entry has no components");
            return Ok(Vec::new());
        };

        let timestamp = latest.get("dt").and_then(epoch_seconds);

        let mut measurements = extract_components(components, &geo, timestamp);
        measurements.truncate(req.limit);
        debug!(count = measurements.len(), label = %geo.label, "openweathermap measurements normalized");
        Ok(measurements)
    }
}

impl AirQualitySource for OpenWeatherMapAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeatherMap
    }

    fn fetch<'a>(&'a self, req: &'a AqiRequest) -> FetchFuture<'a> {
        Box::pin(self.fetch_latest(req))
    }
}

/// Unix seconds; fractional epochs are truncated.
fn epoch_seconds(dt: &Value) -> Option<UtcDateTime> {
    let seconds = match dt.as_i64() {
        Some(seconds) => seconds,
        None => dt.as_f64().filter(|dt| dt.is_finite())?.trunc() as i64,
    };
    UtcDateTime::from_unix_seconds(seconds).ok()
}

/// Emits one measurement per tracked component whose value is numeric.
///
/// Missing or non-numeric components mean "pollutant unavailable" and are skipped.
pub fn extract_components(
    components: &Map<String, Value>,
    geo: &GeocodeResult,
    timestamp: Option<UtcDateTime>,
) -> Vec<Measurement> {
    COMPONENT_FIELDS
        .iter()
        .filter_map(|(field, pollutant)| {
            let value = components.get(*field).and_then(Value::as_f64)?;
            let measurement = Measurement::new(value, geo.label.clone()).ok()?;
            Some(
                measurement
                    .with_parameter(Some(pollutant.clone()))
                    .with_unit(Some(String::from(COMPONENT_UNIT)))
                    .with_coordinates(Some(geo.coordinates()))
                    .with_timestamp(timestamp),
            )
        })
        .collect()
}
