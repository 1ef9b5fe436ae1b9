//! Store adapters for the external commerce platform.
//!
//! The purge engine never talks to the platform directly; it consumes the
//! narrow [`OrderStore`] and [`AccountStore`] traits defined here. The one
//! production implementation speaks the WooCommerce REST API (see
//! [`woocommerce`]), which is HPOS-safe because all reads and deletes go
//! through the platform API rather than direct table access.

mod woocommerce;

use async_trait::async_trait;
use thiserror::Error;
pub use woocommerce::{PlatformClient, WooAccountStore, WooOrderStore};

/// Platform-assigned order identifier.
pub type OrderId = u64;

/// Platform-assigned account identifier.
pub type AccountId = u64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Platform request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Platform returned unexpected status {status} for {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: String },

    #[error("Invalid platform response: {0}")]
    InvalidResponse(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a destructive delete.
///
/// `AlreadyGone` is not an error: deleting an entity that no longer exists
/// is treated as already-satisfied and counts toward progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyGone,
}

/// Paginated read + delete-by-id access to the platform's order collection.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Best-effort count of orders across the given statuses.
    async fn count(&self, statuses: &[String]) -> StoreResult<u64>;

    /// Fetch up to `limit` order ids across the given statuses, in
    /// store-defined order. Orders are independently and idempotently
    /// deletable, so no ordering is required.
    async fn fetch_batch(&self, statuses: &[String], limit: u32) -> StoreResult<Vec<OrderId>>;

    /// Permanently delete an order (no soft-delete/trash step).
    async fn delete_permanently(&self, id: OrderId) -> StoreResult<DeleteOutcome>;
}

/// Paginated read + delete-by-id access to the platform's account collection.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Count accounts holding any of the given roles.
    async fn count_by_roles(&self, roles: &[String]) -> StoreResult<u64>;

    /// Fetch up to `limit` account ids filtered to the given roles.
    async fn fetch_batch(&self, roles: &[String], limit: u32) -> StoreResult<Vec<AccountId>>;

    /// Delete an account. Cascading removal of the account's owned data is
    /// the platform's responsibility, not orchestrated here.
    async fn delete(&self, id: AccountId) -> StoreResult<DeleteOutcome>;
}
