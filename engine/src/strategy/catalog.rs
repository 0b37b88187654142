//! Preset strategy catalog
//!
//! The purchasable strategies shipped with the marketplace. Each builder
//! produces a fresh, validated [`StrategyDefinition`].

use rust_decimal::Decimal;
use serde_json::json;
use shared::error::MarketResult;
use shared::models::{
    AprRange, OperationType, RiskLevel, Strategy, StrategyOperation,
};

use crate::strategy::StrategyDefinition;

pub const FUNDING_RATE_ARB: &str = "funding-rate-arb";
pub const MOMENTUM_SHORT: &str = "momentum-short";
pub const SPOT_ACCUMULATOR: &str = "spot-accumulator";

/// (id, display name, blurb) for every preset
pub const PRESET_STRATEGIES: &[(&str, &str, &str)] = &[
    (
        FUNDING_RATE_ARB,
        "Funding Rate Arbitrage",
        "Delta-neutral: short the perp, hold spot, collect funding",
    ),
    (
        MOMENTUM_SHORT,
        "Momentum Short",
        "Short on negative momentum with periodic rebalancing",
    ),
    (
        SPOT_ACCUMULATOR,
        "Spot Accumulator",
        "Staged spot accumulation with profit-taking",
    ),
];

pub fn funding_rate_arbitrage() -> MarketResult<StrategyDefinition> {
    StrategyDefinition::new(Strategy {
        id: FUNDING_RATE_ARB.to_string(),
        name: "Funding Rate Arbitrage".to_string(),
        description: "Delta-neutral: short the perp, hold spot, collect funding".to_string(),
        risk: RiskLevel::Low,
        apr_range: AprRange { min: 8.0, max: 15.0 },
        price: Decimal::new(4999, 2),
        min_capital: Some(Decimal::new(500, 0)),
        operations: vec![
            StrategyOperation::new(OperationType::CheckFundingRate, 1)
                .with_param("market", json!("ETH-PERP"))
                .with_param("min_rate", json!(0.0001)),
            StrategyOperation::new(OperationType::OpenShort, 2)
                .with_param("market", json!("ETH-PERP"))
                .with_param("leverage", json!(1)),
            StrategyOperation::new(OperationType::SpotBuy, 3)
                .with_param("market", json!("ETH/USDC")),
            StrategyOperation::new(OperationType::CollectFunding, 4)
                .with_param("market", json!("ETH-PERP")),
        ],
    })
}

pub fn momentum_short() -> MarketResult<StrategyDefinition> {
    StrategyDefinition::new(Strategy {
        id: MOMENTUM_SHORT.to_string(),
        name: "Momentum Short".to_string(),
        description: "Short on negative momentum with periodic rebalancing".to_string(),
        risk: RiskLevel::High,
        apr_range: AprRange {
            min: 12.0,
            max: 40.0,
        },
        price: Decimal::new(9999, 2),
        min_capital: Some(Decimal::new(1000, 0)),
        operations: vec![
            StrategyOperation::new(OperationType::OpenShort, 1)
                .with_param("market", json!("BTC-PERP"))
                .with_param("leverage", json!(2)),
            StrategyOperation::new(OperationType::Rebalance, 2)
                .with_param("interval_hours", json!(8)),
            StrategyOperation::new(OperationType::CloseShort, 3)
                .with_param("market", json!("BTC-PERP")),
        ],
    })
}

pub fn spot_accumulator() -> MarketResult<StrategyDefinition> {
    StrategyDefinition::new(Strategy {
        id: SPOT_ACCUMULATOR.to_string(),
        name: "Spot Accumulator".to_string(),
        description: "Staged spot accumulation with profit-taking".to_string(),
        risk: RiskLevel::Medium,
        apr_range: AprRange { min: 5.0, max: 22.0 },
        price: Decimal::new(2999, 2),
        min_capital: Some(Decimal::new(100, 0)),
        operations: vec![
            StrategyOperation::new(OperationType::SpotBuy, 1)
                .with_param("market", json!("ETH/USDC"))
                .with_param("tranche_pct", json!(25)),
            StrategyOperation::new(OperationType::Rebalance, 2)
                .with_param("interval_hours", json!(24)),
            StrategyOperation::new(OperationType::SpotSell, 3)
                .with_param("market", json!("ETH/USDC"))
                .with_param("take_profit_pct", json!(10)),
        ],
    })
}
