#[path = "../support/mod.rs"]
mod support;

use std::collections::BTreeSet;
use std::sync::Arc;

use aerosense_core::{
    AirQualitySource, HttpResponse, OpenAqAdapter, OpenWeatherMapAdapter, ProviderId,
    SourceErrorKind,
};
use serde_json::{json, Value};

use support::{request, ScriptedHttpClient, GEOCODE_PATH, OPENAQ_PATH, POLLUTION_PATH};

const CANONICAL_KEYS: [&str; 6] = [
    "parameter",
    "value",
    "unit",
    "location",
    "coordinates",
    "timestamp",
];

struct ProviderCase {
    id: ProviderId,
    source: Arc<dyn AirQualitySource>,
}

fn healthy_client() -> Arc<ScriptedHttpClient> {
    Arc::new(
        ScriptedHttpClient::default()
            .json(
                OPENAQ_PATH,
                json!({
                    "results": [
                        {
                            "parameter": { "name": "pm25", "units": "µg/m³" },
                            "value": 81.2,
                            "location": "ITO, Delhi",
                            "coordinates": { "latitude": 28.63, "longitude": 77.24 },
                            "date": { "utc": "2024-01-01T10:00:00Z" }
                        },
                        {
                            "parameter": "no2",
                            "value": 20,
                            "location": "Anand Vihar",
                            "date": { "utc": "2024-01-01T10:00:00+05:30" }
                        }
                    ]
                }),
            )
            .json(
                GEOCODE_PATH,
                json!([{ "name": "Delhi", "lat": 28.61, "lon": 77.21, "country": "IN" }]),
            )
            .json(
                POLLUTION_PATH,
                json!({ "list": [{ "dt": 1_704_103_200, "components": { "pm2_5": 12.3, "pm10": 40.0, "no2": 7.1, "co": 201.9 } }] }),
            ),
    )
}

fn provider_cases(client: Arc<ScriptedHttpClient>) -> Vec<ProviderCase> {
    vec![
        ProviderCase {
            id: ProviderId::OpenAq,
            source: Arc::new(OpenAqAdapter::new(client.clone(), "oaq-key")),
        },
        ProviderCase {
            id: ProviderId::OpenWeatherMap,
            source: Arc::new(OpenWeatherMapAdapter::new(
                client,
                Some(String::from("owm-key")),
            )),
        },
    ]
}

#[tokio::test]
async fn adapters_report_their_provider_id() {
    for case in provider_cases(healthy_client()) {
        assert_eq!(case.source.id(), case.id);
    }
}

#[tokio::test]
async fn adapters_emit_only_canonical_fields() {
    let allowed = CANONICAL_KEYS.into_iter().collect::<BTreeSet<_>>();

    for case in provider_cases(healthy_client()) {
        let results = case
            .source
            .fetch(&request("Delhi", 50))
            .await
            .unwrap_or_else(|error| panic!("provider '{}' fetch failed: {error}", case.id));
        assert!(!results.is_empty(), "provider '{}': results", case.id);

        let encoded = serde_json::to_value(&results).expect("measurements serialize");
        let Value::Array(records) = encoded else {
            panic!("provider '{}': expected an array", case.id);
        };
        for record in records {
            let Value::Object(fields) = record else {
                panic!("provider '{}': expected an object", case.id);
            };
            for key in fields.keys() {
                assert!(
                    allowed.contains(key.as_str()),
                    "provider '{}': unexpected field '{key}'",
                    case.id
                );
            }
            assert!(
                fields.get("value").is_some_and(Value::is_number),
                "provider '{}': numeric value",
                case.id
            );
            assert!(
                fields.get("location").is_some_and(Value::is_string),
                "provider '{}': location",
                case.id
            );
        }
    }
}

#[tokio::test]
async fn timestamps_are_emitted_in_utc() {
    for case in provider_cases(healthy_client()) {
        let results = case
            .source
            .fetch(&request("Delhi", 50))
            .await
            .unwrap_or_else(|error| panic!("provider '{}' fetch failed: {error}", case.id));

        for measurement in results {
            let Some(timestamp) = measurement.timestamp else {
                continue;
            };
            let text = timestamp.format_rfc3339();
            assert!(
                text.ends_with('Z'),
                "provider '{}': '{text}' is not UTC",
                case.id
            );
        }
    }
}

#[tokio::test]
async fn secondary_extracts_only_tracked_pollutants() {
    let client = healthy_client();
    let adapter = OpenWeatherMapAdapter::new(client, Some(String::from("owm-key")));

    let results = adapter
        .fetch(&request("Delhi", 50))
        .await
        .expect("fetch succeeds");

    let parameters = results
        .iter()
        .filter_map(|m| m.parameter.as_ref().map(|p| p.as_str().to_owned()))
        .collect::<Vec<_>>();
    assert_eq!(parameters, vec!["pm25", "pm10", "no2"]);
    assert!(results.iter().all(|m| m.unit.as_deref() == Some("µg/m³")));
    assert!(results.iter().all(|m| m.location == "Delhi, IN"));
}

#[tokio::test]
async fn upstream_rejection_is_a_provider_error_for_all_adapters() {
    let client = Arc::new(
        ScriptedHttpClient::default()
            .route(
                OPENAQ_PATH,
                Ok(HttpResponse::with_status(503, "{\"message\":\"maintenance\"}")),
            )
            .route(
                GEOCODE_PATH,
                Ok(HttpResponse::with_status(503, "{\"message\":\"maintenance\"}")),
            ),
    );

    for case in provider_cases(client) {
        let error = case
            .source
            .fetch(&request("Delhi", 50))
            .await
            .expect_err("rejection must surface");
        assert_eq!(error.kind(), SourceErrorKind::Provider, "provider '{}'", case.id);
        assert_eq!(error.status(), Some(503), "provider '{}'", case.id);
        assert_eq!(error.provider(), case.id);
        assert_eq!(error.body(), Some("{\"message\":\"maintenance\"}"));
    }
}
