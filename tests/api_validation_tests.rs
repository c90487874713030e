// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

mod common;

async fn get_status(uri: &str) -> StatusCode {
    let (app, _state) = common::create_test_app();
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    response.status()
}

#[tokio::test]
async fn test_limit_zero_is_rejected() {
    assert_eq!(get_status("/houses?limit=0").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_limit_above_max_is_rejected() {
    assert_eq!(get_status("/houses?limit=501").await, StatusCode::BAD_REQUEST);
    assert_eq!(
        get_status("/listings?limit=501").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_negative_offset_is_rejected() {
    assert_eq!(
        get_status("/listings?offset=-1").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_limit_at_bounds_is_accepted() {
    assert_eq!(get_status("/houses?limit=1").await, StatusCode::OK);
    assert_eq!(get_status("/houses?limit=500").await, StatusCode::OK);
}

#[tokio::test]
async fn test_search_query_too_short() {
    assert_eq!(
        get_status("/houses/search?q=a").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_search_query_missing() {
    // Missing required `q` fails query deserialization
    assert_eq!(get_status("/houses/search").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_scan_phase_is_rejected() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/scan/start?phase=3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
