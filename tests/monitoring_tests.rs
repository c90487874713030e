// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stats and monitoring endpoint tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

mod common;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_stats_zeroed_when_offline() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_houses"], 0);
    assert_eq!(body["total_listings"], 0);
    assert_eq!(body["listings_sale"], 0);
    assert!(body["last_scan"].is_null());
}

#[tokio::test]
async fn test_monitoring_warns_on_empty_database() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/monitoring")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "warning");
    assert_eq!(body["service"], "avito-tracker");
    let alerts = body["alerts"].as_array().unwrap();
    assert!(alerts.iter().any(|a| a == "No houses in database"));
}
