//! End-to-end routing over real HTTP against local mock servers.

use std::sync::Arc;

use httptest::matchers::{all_of, contains, key, request, url_decoded};
use httptest::responders::{json_encoded, status_code};
use httptest::{Expectation, Server};
use serde_json::json;

use aerosense_core::{
    AqiError, AqiRequest, AqiRouter, AqiRouterBuilder, Pollutant, ProviderId, ReqwestHttpClient,
    SourceErrorKind,
};

fn router_for(server: &Server, openaq_key: Option<&str>, owm_key: Option<&str>) -> AqiRouter {
    AqiRouterBuilder::new()
        .with_http_client(Arc::new(ReqwestHttpClient::new()))
        .with_openaq_key(openaq_key.map(str::to_owned))
        .with_openweathermap_key(owm_key.map(str::to_owned))
        .with_openaq_base_url(server.url_str(""))
        .with_openweathermap_base_url(server.url_str(""))
        .build()
}

fn expect_delhi_geocode(server: &Server) {
    server.expect(
        Expectation::matching(all_of!(
            request::method_path("GET", "/geo/1.0/direct"),
            request::query(url_decoded(contains(("q", "Delhi")))),
            request::query(url_decoded(contains(("limit", "1")))),
        ))
        .respond_with(json_encoded(json!([
            { "name": "Delhi", "state": "Delhi", "lat": 28.61, "lon": 77.21, "country": "IN" }
        ]))),
    );
}

#[tokio::test]
async fn primary_answer_is_served_without_touching_secondary() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of!(
            request::method_path("GET", "/v3/measurements"),
            request::headers(contains(key("x-api-key"))),
            request::query(url_decoded(contains(("city", "Delhi")))),
            request::query(url_decoded(contains(("limit", "5")))),
            request::query(url_decoded(contains(("parameter", "pm25")))),
            request::query(url_decoded(contains(("parameter", "no2")))),
        ))
        .respond_with(json_encoded(json!({
            "results": [{
                "parameter": "pm25",
                "value": 92.5,
                "unit": "µg/m³",
                "location": "ITO",
                "date": { "utc": "2024-03-01T06:00:00Z" }
            }]
        }))),
    );
    // any request to the secondary endpoints fails the test on drop
    let router = router_for(&server, Some("oaq-key"), Some("owm-key"));

    let success = router
        .get_aqi(&AqiRequest::new("Delhi", 5).expect("valid request"))
        .await
        .expect("primary succeeds");

    assert_eq!(success.selected_source, ProviderId::OpenAq);
    assert_eq!(success.results.len(), 1);
    assert_eq!(success.results[0].parameter, Some(Pollutant::Pm25));
    assert_eq!(success.results[0].value, 92.5);
}

#[tokio::test]
async fn primary_server_error_falls_back_over_the_wire() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/v3/measurements"))
            .respond_with(status_code(500).body("upstream exploded")),
    );
    expect_delhi_geocode(&server);
    server.expect(
        Expectation::matching(all_of!(
            request::method_path("GET", "/data/2.5/air_pollution"),
            request::query(url_decoded(contains(("lat", "28.61")))),
            request::query(url_decoded(contains(("lon", "77.21")))),
            request::query(url_decoded(contains(("appid", "owm-key")))),
        ))
        .respond_with(json_encoded(json!({
            "list": [{ "dt": 1_709_272_800, "components": { "pm2_5": 55.1, "pm10": 80.4, "no2": 31.0 } }]
        }))),
    );
    let router = router_for(&server, Some("oaq-key"), Some("owm-key"));

    let success = router
        .get_aqi(&AqiRequest::new("Delhi", 50).expect("valid request"))
        .await
        .expect("secondary rescues the request");

    assert_eq!(success.selected_source, ProviderId::OpenWeatherMap);
    assert_eq!(
        success.source_chain,
        vec![ProviderId::OpenAq, ProviderId::OpenWeatherMap]
    );
    assert_eq!(success.results.len(), 3);
    assert!(success
        .results
        .iter()
        .all(|m| m.location == "Delhi, Delhi, IN"));
    assert_eq!(success.warnings.len(), 1);
}

#[tokio::test]
async fn request_key_is_sent_to_secondary() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of!(
            request::method_path("GET", "/geo/1.0/direct"),
            request::query(url_decoded(contains(("appid", "caller-key")))),
        ))
        .respond_with(json_encoded(json!([]))),
    );
    let router = router_for(&server, None, Some("server-key"));

    let request = AqiRequest::new("Nowhere", 50)
        .expect("valid request")
        .with_secondary_key(Some("caller-key"));
    let error = router.get_aqi(&request).await.expect_err("unknown city");

    assert_eq!(error.last_source_error().kind(), SourceErrorKind::NotFound);
}

#[tokio::test]
async fn both_rejections_surface_secondary_status_and_body() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/v3/measurements"))
            .respond_with(status_code(401).body("{\"detail\":\"invalid key\"}")),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/geo/1.0/direct")).respond_with(
            status_code(401).body("{\"cod\":401,\"message\":\"Invalid API key\"}"),
        ),
    );
    let router = router_for(&server, Some("bad"), Some("also-bad"));

    let error = router
        .get_aqi(&AqiRequest::new("Delhi", 50).expect("valid request"))
        .await
        .expect_err("both providers reject");

    assert!(matches!(error, AqiError::Aggregation(_)));
    assert_eq!(error.status(), Some(401));
    assert_eq!(error.details(), "{\"cod\":401,\"message\":\"Invalid API key\"}");
}

#[tokio::test]
async fn unreachable_secondary_does_not_echo_the_credential() {
    // nothing listens on port 1
    let router = AqiRouterBuilder::new()
        .with_http_client(Arc::new(ReqwestHttpClient::new()))
        .with_openweathermap_key(Some(String::from("SERVER-SECRET-KEY")))
        .with_openweathermap_base_url("http://127.0.0.1:1")
        .build();

    let error = router
        .get_aqi(&AqiRequest::new("Delhi", 50).expect("valid request"))
        .await
        .expect_err("connection is refused");

    assert_eq!(error.last_source_error().kind(), SourceErrorKind::Provider);
    assert_eq!(error.status(), None);
    assert!(error.details().contains("geocoding"));
    assert!(!error.details().contains("SERVER-SECRET-KEY"));
    assert!(!error.details().contains("appid"));
    assert!(!error.to_string().contains("SERVER-SECRET-KEY"));
    assert!(!format!("{error:?}").contains("SERVER-SECRET-KEY"));
}
