//! Integration tests for PostcodeLookup using wiremock.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::time::Duration;

use brolly_postcodes::{LookupError, PostcodeLookup};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn lookup_for(server: &MockServer) -> PostcodeLookup {
    PostcodeLookup::new(server.uri(), Duration::from_secs(5)).unwrap()
}

fn found(postcode: &str, longitude: f64, latitude: f64) -> serde_json::Value {
    serde_json::json!({
        "status": 200,
        "result": {
            "postcode": postcode,
            "longitude": longitude,
            "latitude": latitude,
            "admin_district": "Westminster",
            "country": "England"
        }
    })
}

fn not_found() -> serde_json::Value {
    serde_json::json!({ "status": 404, "error": "Invalid postcode" })
}

#[tokio::test]
async fn test_resolve_known_postcode() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/postcodes/SW1A1AA"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(found("SW1A 1AA", -0.141588, 51.501009)),
        )
        .mount(&server)
        .await;

    let coords = lookup_for(&server).resolve("SW1A1AA").await.unwrap().unwrap();
    assert_eq!(coords.longitude, -0.141588);
    assert_eq!(coords.latitude, 51.501009);
}

#[tokio::test]
async fn test_space_in_postcode_is_encoded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/postcodes/SW1A%201AA"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(found("SW1A 1AA", -0.141588, 51.501009)),
        )
        .mount(&server)
        .await;

    assert!(lookup_for(&server).is_valid("SW1A 1AA").await.unwrap());
}

#[tokio::test]
async fn test_unknown_postcode_is_invalid() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/postcodes/NOTAPOSTCODE"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found()))
        .mount(&server)
        .await;

    let lookup = lookup_for(&server);
    assert!(!lookup.is_valid("NOTAPOSTCODE").await.unwrap());
    assert!(lookup.resolve("NOTAPOSTCODE").await.unwrap().is_none());
}

#[tokio::test]
async fn test_postcode_without_location_does_not_resolve() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/postcodes/BX11LT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": 200,
            "result": { "postcode": "BX1 1LT", "longitude": null, "latitude": null }
        })))
        .mount(&server)
        .await;

    let lookup = lookup_for(&server);
    assert!(lookup.is_valid("BX11LT").await.unwrap());
    assert!(lookup.resolve("BX11LT").await.unwrap().is_none());
}

#[tokio::test]
async fn test_blank_postcode_skips_network() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(found("X", 0.0, 0.0)))
        .expect(0)
        .mount(&server)
        .await;

    assert!(!lookup_for(&server).is_valid("   ").await.unwrap());
}

#[tokio::test]
async fn test_malformed_response_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let result = lookup_for(&server).is_valid("SW1A1AA").await;
    assert!(matches!(result, Err(LookupError::Parse(_))));
}
