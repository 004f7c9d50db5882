//! Fakes shared by the integration tests.
#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use aerosense_core::{
    AirQualitySource, AqiRequest, FetchFuture, HttpClient, HttpError, HttpRequest, HttpResponse,
    Measurement, ProviderId, SourceError,
};

/// Provider that always returns the same result and counts its calls.
pub struct CountingSource {
    id: ProviderId,
    result: Result<Vec<Measurement>, SourceError>,
    calls: AtomicUsize,
}

impl CountingSource {
    pub fn ok(id: ProviderId, results: Vec<Measurement>) -> Arc<Self> {
        Arc::new(Self {
            id,
            result: Ok(results),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(id: ProviderId, error: SourceError) -> Arc<Self> {
        Arc::new(Self {
            id,
            result: Err(error),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AirQualitySource for CountingSource {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn fetch<'a>(&'a self, _req: &'a AqiRequest) -> FetchFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self.result.clone();
        Box::pin(async move { result })
    }
}

/// Transport answering by URL path fragment; unmatched paths get a 404.
#[derive(Default)]
pub struct ScriptedHttpClient {
    routes: Vec<(&'static str, Result<HttpResponse, HttpError>)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn route(mut self, path: &'static str, response: Result<HttpResponse, HttpError>) -> Self {
        self.routes.push((path, response));
        self
    }

    pub fn json(self, path: &'static str, body: serde_json::Value) -> Self {
        self.route(path, Ok(HttpResponse::ok_json(body.to_string())))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .clone()
    }

    pub fn requests_to(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.url.contains(path))
            .count()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let response = self
            .routes
            .iter()
            .find(|(path, _)| request.url.contains(path))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| Ok(HttpResponse::with_status(404, "no route")));
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .push(request);
        Box::pin(async move { response })
    }
}

pub const OPENAQ_PATH: &str = "/v3/measurements";
pub const GEOCODE_PATH: &str = "/geo/1.0/direct";
pub const POLLUTION_PATH: &str = "/data/2.5/air_pollution";

pub fn reading(parameter: &str, value: f64, location: &str) -> Measurement {
    Measurement::new(value, location)
        .expect("finite reading")
        .with_parameter(Some(aerosense_core::Pollutant::parse(parameter)))
}

pub fn request(city: &str, limit: usize) -> AqiRequest {
    AqiRequest::new(city, limit).expect("valid request")
}
