// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Avito page fetcher.
//!
//! Avito serves datacenter IPs a block page unless requests look like a
//! real browser, so the client pins a browser user-agent, realistic
//! Accept headers and a cookie store. The data itself is server-rendered
//! into the HTML (see [`crate::services::extract`]), so a plain HTTP
//! fetch is sufficient.

use std::time::Duration;

use crate::config::{Config, CITY};
use crate::error::AppError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for Avito search, listing and house catalog pages.
#[derive(Clone)]
pub struct AvitoClient {
    http: reqwest::Client,
    base_url: String,
}

impl AvitoClient {
    /// Create a client configured from the application config.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch a search results page for a category.
    pub async fn fetch_search_page(
        &self,
        category_slug: &str,
        page: u32,
    ) -> Result<String, AppError> {
        let url = format!(
            "{}/{}/kvartiry/{}?p={}",
            self.base_url, CITY, category_slug, page
        );
        self.fetch_page(&url).await
    }

    /// Fetch a single listing page. Accepts absolute or site-relative URLs.
    pub async fn fetch_listing_page(&self, url: &str) -> Result<String, AppError> {
        let full_url = if url.starts_with("http") {
            url.to_string()
        } else {
            format!("{}{}", self.base_url, url)
        };
        self.fetch_page(&full_url).await
    }

    /// Fetch a house catalog page.
    pub async fn fetch_house_page(&self, slug: &str, address_id: i32) -> Result<String, AppError> {
        let url = format!(
            "{}/catalog/houses/{}/{}/{}",
            self.base_url, CITY, slug, address_id
        );
        self.fetch_page(&url).await
    }

    /// GET a page and return its HTML body on HTTP 200.
    async fn fetch_page(&self, url: &str) -> Result<String, AppError> {
        let response = self
            .http
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml")
            .header("Accept-Language", "ru-RU,ru;q=0.9")
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Request failed for {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            // 429 means the anti-bot layer noticed us; the scanner backs
            // off via its consecutive-error counter.
            if status.as_u16() == 429 {
                tracing::warn!(url, "Avito rate limit hit (429)");
            }
            return Err(AppError::Upstream(format!("HTTP {} for {}", status, url)));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::Upstream(format!("Body read failed for {}: {}", url, e)))
    }
}
