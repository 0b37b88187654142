//! Ownership store - the single source of truth for purchase records
//!
//! The store is append-only for the data modeled here: records are created
//! once per (strategy, owner) key and never updated or deleted.
//! `put_if_absent` is the at-most-once primitive the access-control layer
//! builds its idempotent purchase on.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::RwLock;

use crate::error::MarketResult;
use crate::models::{normalize_address, OwnershipRecord};

#[async_trait]
pub trait OwnershipStore: Send + Sync {
    /// Insert the record unless one already exists for its
    /// (strategy, owner) key. Returns the record that is durable after the
    /// call - the existing one when the key was already present.
    async fn put_if_absent(&self, record: OwnershipRecord) -> MarketResult<OwnershipRecord>;

    /// Fetch the record for a (strategy, owner) key, if any
    async fn get(
        &self,
        strategy_id: &str,
        owner_address: &str,
    ) -> MarketResult<Option<OwnershipRecord>>;

    /// All records for an owner, in purchase insertion order
    async fn list_for_owner(&self, owner_address: &str) -> MarketResult<Vec<OwnershipRecord>>;
}

/// In-memory store for tests and single-node runs
#[derive(Default)]
pub struct MemoryOwnershipStore {
    records: RwLock<HashMap<String, Vec<OwnershipRecord>>>,
}

impl MemoryOwnershipStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OwnershipStore for MemoryOwnershipStore {
    async fn put_if_absent(&self, record: OwnershipRecord) -> MarketResult<OwnershipRecord> {
        let owner = normalize_address(&record.owner_address);
        let mut records = self.records.write().await;
        let owned = records.entry(owner.clone()).or_default();

        if let Some(existing) = owned.iter().find(|r| r.strategy_id == record.strategy_id) {
            return Ok(existing.clone());
        }

        let stored = OwnershipRecord {
            owner_address: owner,
            ..record
        };
        owned.push(stored.clone());
        Ok(stored)
    }

    async fn get(
        &self,
        strategy_id: &str,
        owner_address: &str,
    ) -> MarketResult<Option<OwnershipRecord>> {
        let owner = normalize_address(owner_address);
        let records = self.records.read().await;
        Ok(records
            .get(&owner)
            .and_then(|owned| owned.iter().find(|r| r.strategy_id == strategy_id))
            .cloned())
    }

    async fn list_for_owner(&self, owner_address: &str) -> MarketResult<Vec<OwnershipRecord>> {
        let owner = normalize_address(owner_address);
        let records = self.records.read().await;
        Ok(records.get(&owner).cloned().unwrap_or_default())
    }
}

/// Redis-backed store. `SET NX` carries the at-most-once guarantee; a
/// per-owner index list preserves purchase insertion order.
pub struct RedisOwnershipStore {
    client: Arc<redis::Client>,
}

impl RedisOwnershipStore {
    pub fn new(client: Arc<redis::Client>) -> Self {
        Self { client }
    }

    fn record_key(strategy_id: &str, owner: &str) -> String {
        format!("ownership:{}:{}", owner, strategy_id)
    }

    fn index_key(owner: &str) -> String {
        format!("ownership:{}:index", owner)
    }
}

#[async_trait]
impl OwnershipStore for RedisOwnershipStore {
    async fn put_if_absent(&self, record: OwnershipRecord) -> MarketResult<OwnershipRecord> {
        let owner = normalize_address(&record.owner_address);
        let stored = OwnershipRecord {
            owner_address: owner.clone(),
            ..record
        };
        let key = Self::record_key(&stored.strategy_id, &owner);

        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(anyhow::Error::from)?;

        let payload = serde_json::to_string(&stored).map_err(anyhow::Error::from)?;
        let inserted: bool = con
            .set_nx(&key, payload)
            .await
            .map_err(anyhow::Error::from)?;

        if inserted {
            let _: i64 = con
                .rpush(Self::index_key(&owner), &stored.strategy_id)
                .await
                .map_err(anyhow::Error::from)?;
            tracing::debug!("recorded ownership of {} for {}", stored.strategy_id, owner);
            return Ok(stored);
        }

        // Lost the race or already owned; return what is durable.
        let existing: String = con.get(&key).await.map_err(anyhow::Error::from)?;
        let existing: OwnershipRecord =
            serde_json::from_str(&existing).map_err(anyhow::Error::from)?;
        Ok(existing)
    }

    async fn get(
        &self,
        strategy_id: &str,
        owner_address: &str,
    ) -> MarketResult<Option<OwnershipRecord>> {
        let owner = normalize_address(owner_address);
        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(anyhow::Error::from)?;

        let payload: Option<String> = con
            .get(Self::record_key(strategy_id, &owner))
            .await
            .map_err(anyhow::Error::from)?;

        match payload {
            Some(json) => {
                let record = serde_json::from_str(&json).map_err(anyhow::Error::from)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn list_for_owner(&self, owner_address: &str) -> MarketResult<Vec<OwnershipRecord>> {
        let owner = normalize_address(owner_address);
        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(anyhow::Error::from)?;

        let strategy_ids: Vec<String> = con
            .lrange(Self::index_key(&owner), 0, -1)
            .await
            .map_err(anyhow::Error::from)?;

        let mut records = Vec::with_capacity(strategy_ids.len());
        for strategy_id in strategy_ids {
            let payload: Option<String> = con
                .get(Self::record_key(&strategy_id, &owner))
                .await
                .map_err(anyhow::Error::from)?;
            if let Some(json) = payload {
                records.push(serde_json::from_str(&json).map_err(anyhow::Error::from)?);
            }
        }
        Ok(records)
    }
}
