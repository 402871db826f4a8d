use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ApiSettings;
use crate::error::BackendError;
use crate::hosting::BookingSource;
use crate::probe::{self, FieldProbe};
use crate::search::{PropertySource, SearchRequest};

const SEARCH_PATH: &str = "properties/search";
const HOST_BOOKINGS_PATH: &str = "bookings/host";

const PROPERTY_LIST: FieldProbe = FieldProbe::new(
    "properties",
    &["/data", "/properties", "/results", "/data/properties"],
);

/// HTTP adapter for the marketplace backend
#[derive(Debug, Clone)]
pub struct MarketplaceClient {
    client: Client,
    base_url: String,
}

impl MarketplaceClient {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &settings.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .context("Auth token is not a valid header value")?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<Value, BackendError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "Fetching");

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, status = %status, "Backend returned error status");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "Downloaded response");
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl PropertySource for MarketplaceClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Value>, BackendError> {
        let payload = self.get_json(SEARCH_PATH, request).await?;
        Ok(probe::take_records(payload, &PROPERTY_LIST))
    }

    fn source_name(&self) -> &'static str {
        "marketplace"
    }
}

#[async_trait]
impl BookingSource for MarketplaceClient {
    async fn host_bookings(&self) -> Result<Value, BackendError> {
        self.get_json(HOST_BOOKINGS_PATH, &[] as &[(&str, &str)])
            .await
            .map_err(|error| match error {
                BackendError::Status { status, .. } if status == StatusCode::FORBIDDEN.as_u16() => {
                    BackendError::AuthorizationPending
                }
                other => other,
            })
    }
}
