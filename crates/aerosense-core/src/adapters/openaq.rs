use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::data_source::{AirQualitySource, AqiRequest, FetchFuture};
use crate::http_client::{url_with_query, HttpClient, HttpRequest};
use crate::{Coordinates, Measurement, Pollutant, ProviderId, SourceError, UtcDateTime};

pub const OPENAQ_BASE_URL: &str = "https://api.openaq.org";

const MEASUREMENTS_PATH: &str = "/v3/measurements";
const API_KEY_HEADER: &str = "X-API-Key";
const TIMEOUT_MS: u64 = 20_000;

/// Primary provider: OpenAQ measurement search.
#[derive(Clone)]
pub struct OpenAqAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
}

impl OpenAqAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: String::from(OPENAQ_BASE_URL),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn measurements_url(&self, req: &AqiRequest) -> String {
        let mut query = vec![
            ("city", req.city.clone()),
            ("limit", req.limit.to_string()),
        ];
        query.extend(
            Pollutant::TRACKED
                .iter()
                .map(|pollutant| ("parameter", pollutant.as_str().to_owned())),
        );
        query.push(("sort", String::from("desc")));
        query.push(("order_by", String::from("datetime")));

        url_with_query(&format!("{}{MEASUREMENTS_PATH}", self.base_url), &query)
    }

    async fn fetch_measurements(&self, req: &AqiRequest) -> Result<Vec<Measurement>, SourceError> {
        let request = HttpRequest::get(self.measurements_url(req))
            .with_header(API_KEY_HEADER, &self.api_key)
            .with_timeout_ms(TIMEOUT_MS);

        debug!(city = %req.city, limit = req.limit, "querying openaq measurements");
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| SourceError::from_http(ProviderId::OpenAq, "measurements", &e))?;

        if !response.is_success() {
            return Err(SourceError::upstream_status(
                ProviderId::OpenAq,
                response.status,
                response.body,
            ));
        }

        let body: Value = serde_json::from_str(&response.body).map_err(|e| {
            SourceError::malformed(ProviderId::OpenAq, e.to_string(), &response.body)
        })?;

        let payload = MeasurementsPayload::detect(body);
        debug!(layout = payload.layout(), "openaq response layout");

        let measurements = payload
            .into_records()
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<OpenAqRecord>(record) {
                Ok(record) => record.normalize(&req.city),
                Err(error) => {
                    debug!(%error, "skipping undecodable openaq record");
                    None
                }
            })
            .collect::<Vec<_>>();

        debug!(count = measurements.len(), "openaq measurements normalized");
        Ok(measurements)
    }
}

impl AirQualitySource for OpenAqAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAq
    }

    fn fetch<'a>(&'a self, req: &'a AqiRequest) -> FetchFuture<'a> {
        Box::pin(self.fetch_measurements(req))
    }
}

/// The two recognised response layouts: records under `results` or under `data`.
#[derive(Debug, PartialEq)]
enum MeasurementsPayload {
    Results(Vec<Value>),
    Data(Vec<Value>),
    Absent,
}

impl MeasurementsPayload {
    fn detect(body: Value) -> Self {
        let Value::Object(mut fields) = body else {
            return Self::Absent;
        };

        if let Some(Value::Array(records)) = fields.remove("results") {
            return Self::Results(records);
        }
        if let Some(Value::Array(records)) = fields.remove("data") {
            return Self::Data(records);
        }
        Self::Absent
    }

    fn layout(&self) -> &'static str {
        match self {
            Self::Results(_) => "results",
            Self::Data(_) => "data",
            Self::Absent => "absent",
        }
    }

    fn into_records(self) -> Vec<Value> {
        match self {
            Self::Results(records) | Self::Data(records) => records,
            Self::Absent => Vec::new(),
        }
    }
}

/// One upstream record. Every field is kept as raw JSON: a side field of an
/// unexpected type only loses that field, never the whole reading.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenAqRecord {
    parameter: Option<Value>,
    pollutant: Option<Value>,
    value: Option<Value>,
    unit: Option<Value>,
    location: Option<Value>,
    location_name: Option<Value>,
    coordinates: Option<Value>,
    coordinate: Option<Value>,
    latitude: Option<Value>,
    longitude: Option<Value>,
    date: Option<Value>,
    datetime: Option<Value>,
}

impl OpenAqRecord {
    fn normalize(self, requested_city: &str) -> Option<Measurement> {
        let value = self.value.as_ref().and_then(Value::as_f64)?;

        // `parameter` is either a bare label or `{ name, units }`
        let (parameter_label, parameter_units) = match &self.parameter {
            Some(Value::Object(fields)) => (
                fields.get("name").and_then(text),
                fields.get("units").and_then(text),
            ),
            Some(other) => (text(other), None),
            None => (None, None),
        };
        let parameter = parameter_label
            .or_else(|| self.pollutant.as_ref().and_then(text))
            .map(|label| Pollutant::parse(&label));
        let unit = self.unit.as_ref().and_then(text).or(parameter_units);

        let location = self
            .location
            .as_ref()
            .and_then(|location| match location {
                Value::Object(fields) => fields.get("name").and_then(text),
                other => text(other),
            })
            .or_else(|| self.location_name.as_ref().and_then(text))
            .unwrap_or_else(|| requested_city.to_owned());

        let coordinates = match self
            .coordinates
            .as_ref()
            .or(self.coordinate.as_ref())
            .and_then(Value::as_object)
        {
            Some(fields) => coordinates_from(fields.get("latitude"), fields.get("longitude")),
            None => coordinates_from(self.latitude.as_ref(), self.longitude.as_ref()),
        };

        let timestamp = self
            .date
            .as_ref()
            .and_then(timestamp_from)
            .or_else(|| self.datetime.as_ref().and_then(timestamp_from));

        Measurement::new(value, location)
            .ok()
            .map(|measurement| {
                measurement
                    .with_parameter(parameter)
                    .with_unit(unit)
                    .with_coordinates(coordinates)
                    .with_timestamp(timestamp)
            })
    }
}

/// Non-blank string content.
fn text(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|text| !text.trim().is_empty())
        .map(str::to_owned)
}

/// Accepts JSON numbers and numeric strings.
fn number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::String(text) => text.trim().parse::<f64>().ok(),
        other => other.as_f64(),
    };
    number.filter(|number| number.is_finite())
}

fn coordinates_from(latitude: Option<&Value>, longitude: Option<&Value>) -> Option<Coordinates> {
    Some(Coordinates::new(
        latitude.and_then(number)?,
        longitude.and_then(number)?,
    ))
}

/// RFC3339 text, epoch milliseconds, or an object carrying `utc`.
fn timestamp_from(value: &Value) -> Option<UtcDateTime> {
    match value {
        Value::String(text) => UtcDateTime::parse(text).ok(),
        Value::Number(millis) => millis
            .as_f64()
            .filter(|millis| millis.is_finite())
            .and_then(|millis| UtcDateTime::from_unix_millis(millis as i64).ok()),
        Value::Object(fields) => fields.get("utc").and_then(timestamp_from),
        _ => None,
    }
}
