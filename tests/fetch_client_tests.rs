// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fetch layer tests against a mock Avito server.

use avito_tracker::config::Config;
use avito_tracker::error::AppError;
use avito_tracker::services::AvitoClient;
use httpmock::prelude::*;

fn client_for(server: &MockServer) -> AvitoClient {
    let config = Config {
        base_url: server.base_url(),
        ..Config::default()
    };
    AvitoClient::new(&config).expect("Failed to build Avito client")
}

#[tokio::test]
async fn test_fetch_search_page_url_and_body() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/yoshkar-ola/kvartiry/prodam-ASgBAgICAUSSA8YQ")
            .query_param("p", "2");
        then.status(200).body("<html>search</html>");
    });

    let client = client_for(&server);
    let html = client
        .fetch_search_page("prodam-ASgBAgICAUSSA8YQ", 2)
        .await
        .expect("fetch should succeed");

    assert_eq!(html, "<html>search</html>");
    mock.assert();
}

#[tokio::test]
async fn test_fetch_house_page_url() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/catalog/houses/yoshkar-ola/ul-suvorova-15/123456");
        then.status(200).body("<html>house</html>");
    });

    let client = client_for(&server);
    let html = client
        .fetch_house_page("ul-suvorova-15", 123456)
        .await
        .expect("fetch should succeed");

    assert_eq!(html, "<html>house</html>");
    mock.assert();
}

#[tokio::test]
async fn test_fetch_listing_page_relative_url() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/yoshkar-ola/kvartiry/item_42");
        then.status(200).body("<html>listing</html>");
    });

    let client = client_for(&server);
    let html = client
        .fetch_listing_page("/yoshkar-ola/kvartiry/item_42")
        .await
        .expect("fetch should succeed");

    assert_eq!(html, "<html>listing</html>");
    mock.assert();
}

#[tokio::test]
async fn test_fetch_listing_page_absolute_url() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/abs");
        then.status(200).body("ok");
    });

    let client = client_for(&server);
    let html = client
        .fetch_listing_page(&server.url("/abs"))
        .await
        .expect("fetch should succeed");

    assert_eq!(html, "ok");
}

#[tokio::test]
async fn test_non_200_is_an_upstream_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path_contains("kvartiry");
        then.status(429).body("blocked");
    });

    let client = client_for(&server);
    let err = client
        .fetch_search_page("prodam-ASgBAgICAUSSA8YQ", 1)
        .await
        .expect_err("429 must be an error");

    match err {
        AppError::Upstream(msg) => assert!(msg.contains("429")),
        other => panic!("Expected Upstream error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_user_agent_is_sent() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/catalog/houses/yoshkar-ola/slug/1")
            .header("user-agent", Config::default().user_agent);
        then.status(200).body("ok");
    });

    let client = client_for(&server);
    client
        .fetch_house_page("slug", 1)
        .await
        .expect("fetch should succeed");

    mock.assert();
}
