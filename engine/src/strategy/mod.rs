//! Strategy Definition Module
//!
//! A [`StrategyDefinition`] wraps an immutable [`Strategy`] and is the only
//! gate between caller-supplied run configuration and the execution layer:
//! - construction enforces the operation-ordering invariants
//! - `validate` accumulates every configuration violation
//! - `serialize` produces the wire payload that gets encrypted on purchase

pub mod catalog;
pub mod registry;

pub use registry::{StrategyFactory, StrategyRegistry};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{MarketError, MarketResult};
use shared::models::{
    ExecutionMode, RiskLevel, Strategy, StrategyConfig, StrategyOperation, ValidationReport,
};

/// Version tag stamped on every serialized payload
pub const PAYLOAD_VERSION: &str = "1.0.0";

/// Wire payload of a strategy - this is what gets encrypted for the buyer
/// and the executor. All fields mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyPayload {
    #[serde(rename = "strategyId")]
    pub strategy_id: String,
    #[serde(rename = "strategyName")]
    pub strategy_name: String,
    pub version: String,
    pub operations: Vec<StrategyOperation>,
}

/// An immutable, validated strategy
#[derive(Debug, Clone)]
pub struct StrategyDefinition {
    strategy: Strategy,
}

impl StrategyDefinition {
    /// Build a definition, enforcing the operation invariants: every
    /// `order` is at least 1 and unique within the strategy. Operations
    /// are kept sorted by `order`.
    pub fn new(mut strategy: Strategy) -> MarketResult<Self> {
        if strategy.operations.is_empty() {
            return Err(MarketError::InvalidInput(format!(
                "strategy {} has no operations",
                strategy.id
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for op in &strategy.operations {
            if op.order < 1 {
                return Err(MarketError::InvalidInput(format!(
                    "strategy {}: operation order must be >= 1",
                    strategy.id
                )));
            }
            if !seen.insert(op.order) {
                return Err(MarketError::InvalidInput(format!(
                    "strategy {}: duplicate operation order {}",
                    strategy.id, op.order
                )));
            }
        }

        if strategy.apr_range.min > strategy.apr_range.max {
            return Err(MarketError::InvalidInput(format!(
                "strategy {}: APR range min exceeds max",
                strategy.id
            )));
        }

        strategy.operations.sort_by_key(|op| op.order);
        Ok(Self { strategy })
    }

    pub fn id(&self) -> &str {
        &self.strategy.id
    }

    pub fn name(&self) -> &str {
        &self.strategy.name
    }

    pub fn risk(&self) -> RiskLevel {
        self.strategy.risk
    }

    pub fn price(&self) -> Decimal {
        self.strategy.price
    }

    pub fn min_capital(&self) -> Option<Decimal> {
        self.strategy.min_capital
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Operations in execution order. Returns a copy; mutating it never
    /// touches the definition's own state.
    pub fn operations(&self) -> Vec<StrategyOperation> {
        self.strategy.operations.clone()
    }

    /// Validate a run configuration, accumulating all violated rules
    /// instead of stopping at the first.
    pub fn validate(&self, config: &StrategyConfig) -> ValidationReport {
        let mut errors = Vec::new();

        let mode = ExecutionMode::parse(&config.execution_mode);
        if mode.is_none() {
            errors.push(format!(
                "Execution mode must be 'instant' or 'optimized', got '{}'",
                config.execution_mode
            ));
        }

        if !(0.0..=100.0).contains(&config.slippage_tolerance) {
            errors.push(format!(
                "Slippage tolerance must be between 0 and 100, got {}",
                config.slippage_tolerance
            ));
        }

        match config.spread_percentage {
            Some(spread) if !(0.0..=100.0).contains(&spread) => {
                errors.push(format!(
                    "Spread percentage must be between 0 and 100, got {}",
                    spread
                ));
            }
            None if mode == Some(ExecutionMode::Optimized) => {
                errors.push("Spread percentage is required in optimized mode".to_string());
            }
            _ => {}
        }

        match config.capital_allocation.as_deref() {
            None => {
                errors.push("Capital allocation is required".to_string());
            }
            Some(raw) => match raw.trim().parse::<Decimal>() {
                Err(_) => {
                    errors.push(format!("Capital allocation must be numeric, got '{}'", raw));
                }
                Ok(capital) if capital <= Decimal::ZERO => {
                    errors.push(format!(
                        "Capital allocation must be positive, got {}",
                        capital
                    ));
                }
                Ok(capital) => {
                    if let Some(min) = self.strategy.min_capital {
                        if capital < min {
                            errors.push(format!(
                                "Capital allocation {} is below the strategy minimum {}",
                                capital, min
                            ));
                        }
                    }
                }
            },
        }

        ValidationReport {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Deterministic JSON encoding of the strategy payload. Same strategy,
    /// same bytes (modulo the version tag); operation order is preserved
    /// exactly as stored.
    pub fn serialize(&self) -> MarketResult<String> {
        let payload = StrategyPayload {
            strategy_id: self.strategy.id.clone(),
            strategy_name: self.strategy.name.clone(),
            version: PAYLOAD_VERSION.to_string(),
            operations: self.strategy.operations.clone(),
        };
        serde_json::to_string(&payload).map_err(|e| MarketError::Unknown(e.into()))
    }
}
