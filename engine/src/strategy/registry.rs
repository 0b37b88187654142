//! Strategy Registry - maps strategy ids to definition factories
//!
//! Replaces id-switch dispatch with a closed, extensible mapping: every
//! purchasable strategy is registered here and resolved by id.

use std::collections::HashMap;

use shared::error::{MarketError, MarketResult};

use crate::strategy::{catalog, StrategyDefinition};

pub type StrategyFactory = Box<dyn Fn() -> MarketResult<StrategyDefinition> + Send + Sync>;

pub struct StrategyRegistry {
    factories: HashMap<String, StrategyFactory>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };

        // Register built-in strategies
        registry.register(catalog::FUNDING_RATE_ARB, catalog::funding_rate_arbitrage);
        registry.register(catalog::MOMENTUM_SHORT, catalog::momentum_short);
        registry.register(catalog::SPOT_ACCUMULATOR, catalog::spot_accumulator);

        registry
    }

    /// Register a strategy factory under an id
    pub fn register<F>(&mut self, id: &str, factory: F)
    where
        F: Fn() -> MarketResult<StrategyDefinition> + Send + Sync + 'static,
    {
        self.factories.insert(id.to_string(), Box::new(factory));
    }

    /// Build a definition for a registered strategy id
    pub fn create(&self, id: &str) -> MarketResult<StrategyDefinition> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| MarketError::NotFound(format!("unknown strategy id: {}", id)))?;

        factory()
    }

    /// Ids of every registered strategy
    pub fn available_ids(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Check whether a strategy id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
