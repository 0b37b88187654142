//! AlphaVault engine: the marketplace core behind the UI
//!
//! This crate provides the two service boundaries the caller-facing layer
//! talks to:
//!
//! - **Access control**: purchase a strategy, encrypt its operation list,
//!   grant the buyer and the remote executor access, answer ownership
//!   queries ([`access::AccessControlService`])
//! - **Execution orchestration**: submit an owned strategy for asynchronous
//!   execution and poll its status until terminal
//!   ([`execution::ExecutionOrchestrator`])
//!
//! Strategy definitions, validation, and the preset catalog live in
//! [`strategy`].
//!
//! # Example
//!
//! ```no_run
//! use engine::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(MemoryOwnershipStore::new());
//!     let access = Arc::new(AccessControlService::new("0xExecutor".into(), store));
//!     access.initialize(SignerContext::new("0xMarket", "secret")).await?;
//!
//!     let registry = Arc::new(StrategyRegistry::new());
//!     let strategy = registry.create("funding-rate-arb")?;
//!     let outcome = access.purchase_strategy(&strategy, "0xBuyer").await?;
//!     println!("protected data: {:?}", outcome.protected_data_reference);
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod execution;
pub mod strategy;

// Re-export commonly used types
pub mod prelude {
    pub use crate::access::{AccessControlService, SignerContext};
    pub use crate::execution::remote::{ExecutorApiClient, RemoteExecutor, SimulatedExecutor};
    pub use crate::execution::{ExecutionOrchestrator, OrchestratorConfig, OrchestratorConfigPatch};
    pub use crate::strategy::{StrategyDefinition, StrategyRegistry};

    pub use shared::error::{MarketError, MarketResult};
    pub use shared::models::*;
    pub use shared::store::{MemoryOwnershipStore, OwnershipStore, RedisOwnershipStore};
}
