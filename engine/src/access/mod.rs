//! Access Control Module
//!
//! Gates strategy content behind a purchase and answers ownership queries.
//! A purchase encrypts the strategy's serialized operation list, grants the
//! buyer and the fixed executor identity access to it, and appends one
//! ownership record. Purchases are idempotent per (strategy, buyer) pair.

pub mod protector;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use shared::error::{MarketError, MarketResult};
use shared::models::{normalize_address, OwnershipRecord, OwnershipStatus, PurchaseOutcome};
use shared::store::OwnershipStore;

use crate::access::protector::{DataProtector, ProtectedBlob};
use crate::strategy::StrategyDefinition;

/// Caller-held signing credential the service binds to on initialize
#[derive(Debug, Clone)]
pub struct SignerContext {
    pub address: String,
    pub secret: String,
}

impl SignerContext {
    pub fn new(address: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            secret: secret.into(),
        }
    }
}

struct BoundSigner {
    address: String,
    protector: Arc<DataProtector>,
}

pub struct AccessControlService {
    executor_address: String,
    store: Arc<dyn OwnershipStore>,
    signer: RwLock<Option<BoundSigner>>,
    /// One async mutex per (strategy, buyer) key; serializes concurrent
    /// purchase attempts for the same key without a global lock.
    purchase_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AccessControlService {
    pub fn new(executor_address: String, store: Arc<dyn OwnershipStore>) -> Self {
        Self {
            executor_address,
            store,
            signer: RwLock::new(None),
            purchase_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Bind the service to a signing credential. Idempotent: initializing
    /// an already-initialized service is a no-op.
    pub async fn initialize(&self, signer: SignerContext) -> MarketResult<()> {
        let mut guard = self.signer.write().await;
        if guard.is_some() {
            tracing::debug!("access control service already initialized");
            return Ok(());
        }

        if signer.secret.is_empty() {
            return Err(MarketError::Config("signer secret is empty".to_string()));
        }

        let address = normalize_address(&signer.address);
        tracing::info!("✅ access control service initialized for signer {}", address);
        *guard = Some(BoundSigner {
            address,
            protector: Arc::new(DataProtector::new(signer.secret)),
        });
        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        self.signer.read().await.is_some()
    }

    pub fn executor_address(&self) -> &str {
        &self.executor_address
    }

    /// Purchase a strategy for a buyer.
    ///
    /// Requires prior [`initialize`](Self::initialize) (`ServiceNotReady`
    /// otherwise). Idempotent: an existing record is returned as-is, with
    /// no re-encryption and no second charge. Encryption or store failures
    /// come back as `success=false` and leave no partial record behind.
    pub async fn purchase_strategy(
        &self,
        definition: &StrategyDefinition,
        buyer_address: &str,
    ) -> MarketResult<PurchaseOutcome> {
        let protector = {
            let signer = self.signer.read().await;
            match signer.as_ref() {
                Some(bound) => bound.protector.clone(),
                None => return Err(MarketError::ServiceNotReady),
            }
        };

        let buyer = normalize_address(buyer_address);
        if buyer.is_empty() {
            return Ok(PurchaseOutcome::rejected("buyer address is empty"));
        }

        // Serialize concurrent purchases of the same (strategy, buyer) key.
        let key_lock = {
            let mut locks = self.purchase_locks.lock().await;
            locks
                .entry(format!("{}:{}", definition.id(), buyer))
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = key_lock.lock().await;

        let existing = match self.store.get(definition.id(), &buyer).await {
            Ok(existing) => existing,
            Err(e) => {
                return Ok(PurchaseOutcome::rejected(format!(
                    "ownership lookup failed: {}",
                    e
                )))
            }
        };
        if let Some(record) = existing {
            tracing::debug!(
                "purchase of {} by {} already recorded, returning existing reference",
                definition.id(),
                buyer
            );
            return Ok(PurchaseOutcome::granted(record.protected_data_reference));
        }

        let payload = match definition.serialize() {
            Ok(payload) => payload,
            Err(e) => {
                return Ok(PurchaseOutcome::rejected(format!(
                    "strategy serialization failed: {}",
                    e
                )))
            }
        };

        let grantees = vec![buyer.clone(), normalize_address(&self.executor_address)];
        let reference = match protector.protect(&payload, &grantees).await {
            Ok(reference) => reference,
            Err(e) => {
                return Ok(PurchaseOutcome::rejected(format!(
                    "payload protection failed: {}",
                    e
                )))
            }
        };

        let record = OwnershipRecord {
            strategy_id: definition.id().to_string(),
            owner_address: buyer.clone(),
            protected_data_reference: reference.clone(),
            purchased_at: Utc::now(),
        };

        match self.store.put_if_absent(record).await {
            Ok(stored) => {
                if stored.protected_data_reference != reference {
                    // Lost a cross-process race: keep the durable record,
                    // drop our orphaned ciphertext.
                    protector.discard(&reference).await;
                }
                tracing::info!("💳 {} purchased strategy {}", buyer, definition.id());
                Ok(PurchaseOutcome::granted(stored.protected_data_reference))
            }
            Err(e) => {
                protector.discard(&reference).await;
                Ok(PurchaseOutcome::rejected(format!(
                    "ownership record write failed: {}",
                    e
                )))
            }
        }
    }

    /// Pure ownership lookup. Never fails: an uninitialized service, a
    /// missing record, or a store error all read as "not an owner", so the
    /// check is safe to call speculatively.
    pub async fn check_strategy_ownership(
        &self,
        strategy_id: &str,
        user_address: &str,
    ) -> OwnershipStatus {
        if !self.is_initialized().await {
            return OwnershipStatus::not_owner();
        }

        match self.store.get(strategy_id, user_address).await {
            Ok(Some(record)) => OwnershipStatus::owner(&record),
            Ok(None) => OwnershipStatus::not_owner(),
            Err(e) => {
                tracing::warn!("ownership lookup failed for {}: {}", strategy_id, e);
                OwnershipStatus::not_owner()
            }
        }
    }

    /// Ids of every strategy the address owns, in purchase order
    pub async fn get_user_owned_strategies(&self, user_address: &str) -> Vec<String> {
        if !self.is_initialized().await {
            return Vec::new();
        }

        match self.store.list_for_owner(user_address).await {
            Ok(records) => records.into_iter().map(|r| r.strategy_id).collect(),
            Err(e) => {
                tracing::warn!("owned-strategies lookup failed for {}: {}", user_address, e);
                Vec::new()
            }
        }
    }

    /// Precondition gate used by the execution orchestrator
    pub async fn verify_strategy_access(
        &self,
        strategy_id: &str,
        user_address: &str,
    ) -> MarketResult<()> {
        let ownership = self.check_strategy_ownership(strategy_id, user_address).await;
        if ownership.is_owner {
            Ok(())
        } else {
            Err(MarketError::AccessDenied(format!(
                "{} does not own strategy {}",
                user_address, strategy_id
            )))
        }
    }

    /// Decrypt a protected payload for an authorized address
    pub async fn reveal_protected(
        &self,
        reference: &str,
        address: &str,
    ) -> MarketResult<String> {
        let protector = self.protector().await?;
        protector.reveal(reference, address).await
    }

    /// Transport form of a protected payload for an authorized address
    pub async fn export_protected(
        &self,
        reference: &str,
        address: &str,
    ) -> MarketResult<ProtectedBlob> {
        let protector = self.protector().await?;
        protector.export(reference, address).await
    }

    /// Whether an address is on a payload's grant list
    pub async fn is_authorized(&self, reference: &str, address: &str) -> bool {
        match self.protector().await {
            Ok(protector) => protector.is_authorized(reference, address).await,
            Err(_) => false,
        }
    }

    async fn protector(&self) -> MarketResult<Arc<DataProtector>> {
        let signer = self.signer.read().await;
        signer
            .as_ref()
            .map(|bound| bound.protector.clone())
            .ok_or(MarketError::ServiceNotReady)
    }

    /// Address the service signs as, once initialized
    pub async fn signer_address(&self) -> Option<String> {
        let signer = self.signer.read().await;
        signer.as_ref().map(|bound| bound.address.clone())
    }
}
