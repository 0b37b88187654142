use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Normalize a wallet address for comparison and storage.
///
/// Addresses are displayed with mixed-case checksums, so every lookup and
/// every stored record goes through this first.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// Operations a strategy can instruct the executor to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    CheckFundingRate,
    OpenShort,
    OpenLong,
    CloseShort,
    SpotBuy,
    SpotSell,
    CollectFunding,
    Rebalance,
}

/// One step of a strategy. `order` is unique within a strategy and starts at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyOperation {
    #[serde(rename = "type")]
    pub op_type: OperationType,
    pub order: u32,
    pub params: BTreeMap<String, serde_json::Value>,
}

impl StrategyOperation {
    pub fn new(op_type: OperationType, order: u32) -> Self {
        Self {
            op_type,
            order,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: serde_json::Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Advertised APR band, `min <= max`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AprRange {
    pub min: f64,
    pub max: f64,
}

/// A purchasable strategy. Immutable once built; construction-time
/// invariants are enforced by `engine`'s `StrategyDefinition`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    pub name: String,
    pub description: String,
    pub risk: RiskLevel,
    pub apr_range: AprRange,
    pub price: Decimal,
    pub min_capital: Option<Decimal>,
    pub operations: Vec<StrategyOperation>,
}

/// Recognized execution modes for a strategy run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Instant,
    Optimized,
}

impl ExecutionMode {
    /// Parse a caller-supplied mode string, `None` when unrecognized
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "instant" => Some(Self::Instant),
            "optimized" => Some(Self::Optimized),
            _ => None,
        }
    }
}

/// Caller-supplied run parameters, validated by the strategy before use.
///
/// Fields arrive as loosely-typed UI input; `capital_allocation` stays a
/// decimal string until validation parses it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub execution_mode: String,
    pub slippage_tolerance: f64,
    #[serde(default)]
    pub spread_percentage: Option<f64>,
    #[serde(default)]
    pub capital_allocation: Option<String>,
}

/// Outcome of validating a `StrategyConfig`; accumulates every violation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Durable proof that an address purchased a strategy. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    pub strategy_id: String,
    pub owner_address: String,
    pub protected_data_reference: String,
    pub purchased_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRate {
    pub market: String,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSummary {
    pub market: String,
    pub side: String,
    pub size: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotTradeSummary {
    pub market: String,
    pub side: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    pub gas_used: Decimal,
    pub profit_estimate: Decimal,
    pub funding_rates: Vec<FundingRate>,
    pub positions: Vec<PositionSummary>,
    pub spot_trades: Vec<SpotTradeSummary>,
}

/// Result payload present once a task reaches `completed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub executed_operations: u32,
    pub metrics: ExecutionMetrics,
}

/// Structured result of a purchase attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected_data_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PurchaseOutcome {
    pub fn granted(reference: String) -> Self {
        Self {
            success: true,
            protected_data_reference: Some(reference),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            protected_data_reference: None,
            error: Some(error.into()),
        }
    }
}

/// Answer to an ownership query. Safe to request speculatively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipStatus {
    pub is_owner: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected_data_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchased_at: Option<DateTime<Utc>>,
}

impl OwnershipStatus {
    pub fn not_owner() -> Self {
        Self {
            is_owner: false,
            protected_data_reference: None,
            purchased_at: None,
        }
    }

    pub fn owner(record: &OwnershipRecord) -> Self {
        Self {
            is_owner: true,
            protected_data_reference: Some(record.protected_data_reference.clone()),
            purchased_at: Some(record.purchased_at),
        }
    }
}

/// Structured result of an execution request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecuteOutcome {
    pub fn submitted(task_id: String) -> Self {
        Self {
            success: true,
            task_id: Some(task_id),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            task_id: None,
            error: Some(error.into()),
        }
    }
}

/// Snapshot of a task's progress. `result` only when completed, `error`
/// only when failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: ExecutionStatus,
    pub task_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExecutionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
