//! In-memory store fakes shared across test modules.

use std::{
    collections::HashSet,
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::stores::{
    AccountId, AccountStore, DeleteOutcome, OrderId, OrderStore, StoreError, StoreResult,
};

/// Order store over a plain vector.
///
/// Supports two fault injections: "ghost" ids that show up in a fetch but
/// are already gone by delete time, and ids whose first delete attempt
/// fails with an error.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: Mutex<Vec<OrderId>>,
    ghosts: Mutex<Vec<OrderId>>,
    fail_once: Mutex<HashSet<OrderId>>,
    /// Sizes of each returned fetch batch, in call order.
    pub fetch_sizes: Mutex<Vec<usize>>,
    pub fetch_calls: AtomicU64,
    pub delete_calls: AtomicU64,
}

impl InMemoryOrderStore {
    pub fn with_orders(n: u64) -> Self {
        let store = Self::default();
        *store.orders.lock() = (1..=n).collect();
        store
    }

    /// Make `id` appear in the next fetch even though it does not exist;
    /// deleting it reports `AlreadyGone`.
    pub fn push_ghost(&self, id: OrderId) {
        self.ghosts.lock().push(id);
    }

    /// Make the first delete of `id` fail; subsequent attempts succeed.
    pub fn fail_delete_once(&self, id: OrderId) {
        self.fail_once.lock().insert(id);
    }

    pub fn remaining(&self) -> usize {
        self.orders.lock().len()
    }

    pub fn fetches(&self) -> u64 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> u64 {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn count(&self, _statuses: &[String]) -> StoreResult<u64> {
        Ok(self.orders.lock().len() as u64)
    }

    async fn fetch_batch(&self, _statuses: &[String], limit: u32) -> StoreResult<Vec<OrderId>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let mut ids: Vec<OrderId> = self.ghosts.lock().drain(..).collect();
        for id in self.orders.lock().iter() {
            if ids.len() >= limit as usize {
                break;
            }
            ids.push(*id);
        }
        ids.truncate(limit as usize);
        self.fetch_sizes.lock().push(ids.len());
        Ok(ids)
    }

    async fn delete_permanently(&self, id: OrderId) -> StoreResult<DeleteOutcome> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_once.lock().remove(&id) {
            return Err(StoreError::InvalidResponse(format!(
                "injected delete failure for order {id}"
            )));
        }
        let mut orders = self.orders.lock();
        match orders.iter().position(|o| *o == id) {
            Some(pos) => {
                orders.remove(pos);
                Ok(DeleteOutcome::Deleted)
            }
            None => Ok(DeleteOutcome::AlreadyGone),
        }
    }
}

/// Account store over `(id, role)` pairs.
#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: Mutex<Vec<(AccountId, String)>>,
    pub fetch_calls: AtomicU64,
    pub delete_calls: AtomicU64,
}

impl InMemoryAccountStore {
    pub fn with_accounts(accounts: &[(AccountId, &str)]) -> Self {
        let store = Self::default();
        *store.accounts.lock() = accounts
            .iter()
            .map(|(id, role)| (*id, role.to_string()))
            .collect();
        store
    }

    pub fn remaining(&self) -> usize {
        self.accounts.lock().len()
    }

    pub fn fetches(&self) -> u64 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> u64 {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn count_by_roles(&self, roles: &[String]) -> StoreResult<u64> {
        let count = self
            .accounts
            .lock()
            .iter()
            .filter(|(_, role)| roles.contains(role))
            .count();
        Ok(count as u64)
    }

    async fn fetch_batch(&self, roles: &[String], limit: u32) -> StoreResult<Vec<AccountId>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let ids = self
            .accounts
            .lock()
            .iter()
            .filter(|(_, role)| roles.contains(role))
            .take(limit as usize)
            .map(|(id, _)| *id)
            .collect();
        Ok(ids)
    }

    async fn delete(&self, id: AccountId) -> StoreResult<DeleteOutcome> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.lock();
        match accounts.iter().position(|(a, _)| *a == id) {
            Some(pos) => {
                accounts.remove(pos);
                Ok(DeleteOutcome::Deleted)
            }
            None => Ok(DeleteOutcome::AlreadyGone),
        }
    }
}
