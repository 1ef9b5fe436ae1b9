//! WooCommerce REST API store adapters.
//!
//! Orders and customers are read and deleted through the `wc/v3` REST
//! endpoints with consumer-key basic auth. Deletes pass `force=true` so
//! entities are removed permanently instead of landing in trash, and a
//! 404/410 from a delete maps to [`DeleteOutcome::AlreadyGone`].
//!
//! Counts come from the `X-WP-Total` header of a single-item list request,
//! which the platform computes as a cheap estimate for any filter
//! combination.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;

use super::{AccountId, AccountStore, DeleteOutcome, OrderId, OrderStore, StoreError, StoreResult};
use crate::config::PlatformConfig;

const TOTAL_HEADER: &str = "X-WP-Total";

/// Shared HTTP client for the WooCommerce REST API.
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
}

/// A list item with only the `id` field requested via `_fields=id`.
#[derive(Debug, Deserialize)]
struct IdOnly {
    id: u64,
}

impl PlatformClient {
    pub fn new(http: reqwest::Client, config: &PlatformConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
        }
    }

    /// Build a client with its own connection pool and timeout.
    pub fn from_config(config: &PlatformConfig) -> StoreResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::new(http, config))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/wp-json/wc/v3/{}", self.base_url, path)
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> StoreResult<Response> {
        let endpoint = self.endpoint(path);
        let response = self
            .http
            .get(&endpoint)
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::UnexpectedStatus {
                status: response.status().as_u16(),
                endpoint,
            });
        }
        Ok(response)
    }

    /// Read the collection total from the `X-WP-Total` header of a
    /// single-item list request.
    async fn count(&self, path: &str, query: &[(&str, String)]) -> StoreResult<u64> {
        let mut query = query.to_vec();
        query.push(("per_page", "1".to_string()));
        query.push(("_fields", "id".to_string()));

        let response = self.get(path, &query).await?;
        let total = response
            .headers()
            .get(TOTAL_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| {
                StoreError::InvalidResponse(format!("missing or malformed {TOTAL_HEADER} header"))
            })?;
        Ok(total)
    }

    async fn fetch_ids(&self, path: &str, query: &[(&str, String)], limit: u32) -> StoreResult<Vec<u64>> {
        let mut query = query.to_vec();
        query.push(("per_page", limit.to_string()));
        query.push(("_fields", "id".to_string()));

        let items: Vec<IdOnly> = self.get(path, &query).await?.json().await?;
        Ok(items.into_iter().map(|item| item.id).collect())
    }

    /// Issue a permanent delete, mapping not-found to `AlreadyGone`.
    async fn delete(&self, path: &str, query: &[(&str, String)]) -> StoreResult<DeleteOutcome> {
        let endpoint = self.endpoint(path);
        let response = self
            .http
            .delete(&endpoint)
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
            .query(query)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(DeleteOutcome::Deleted),
            StatusCode::NOT_FOUND | StatusCode::GONE => Ok(DeleteOutcome::AlreadyGone),
            status => Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                endpoint,
            }),
        }
    }
}

/// Order access through `wc/v3/orders`.
pub struct WooOrderStore {
    client: Arc<PlatformClient>,
}

impl WooOrderStore {
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrderStore for WooOrderStore {
    async fn count(&self, statuses: &[String]) -> StoreResult<u64> {
        let query = [("status", statuses.join(","))];
        self.client.count("orders", &query).await
    }

    async fn fetch_batch(&self, statuses: &[String], limit: u32) -> StoreResult<Vec<OrderId>> {
        let query = [("status", statuses.join(","))];
        self.client.fetch_ids("orders", &query, limit).await
    }

    async fn delete_permanently(&self, id: OrderId) -> StoreResult<DeleteOutcome> {
        let query = [("force", "true".to_string())];
        self.client.delete(&format!("orders/{id}"), &query).await
    }
}

/// Customer-account access through `wc/v3/customers`.
///
/// The customers endpoint filters on a single `role` per request, so
/// multi-role counts and batches are composed by iterating the configured
/// roles.
pub struct WooAccountStore {
    client: Arc<PlatformClient>,
}

impl WooAccountStore {
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AccountStore for WooAccountStore {
    async fn count_by_roles(&self, roles: &[String]) -> StoreResult<u64> {
        let mut total = 0;
        for role in roles {
            let query = [("role", role.clone())];
            total += self.client.count("customers", &query).await?;
        }
        Ok(total)
    }

    async fn fetch_batch(&self, roles: &[String], limit: u32) -> StoreResult<Vec<AccountId>> {
        let mut ids = Vec::new();
        for role in roles {
            let remaining = limit as usize - ids.len();
            if remaining == 0 {
                break;
            }
            let query = [("role", role.clone())];
            let batch = self
                .client
                .fetch_ids("customers", &query, remaining as u32)
                .await?;
            ids.extend(batch);
        }
        Ok(ids)
    }

    async fn delete(&self, id: AccountId) -> StoreResult<DeleteOutcome> {
        let query = [("force", "true".to_string()), ("reassign", "0".to_string())];
        self.client.delete(&format!("customers/{id}"), &query).await
    }
}
