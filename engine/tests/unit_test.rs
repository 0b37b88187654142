//! Unit tests for engine modules

#[cfg(test)]
mod tests {
    use engine::execution::task::{decode_task_id, encode_task_id, TASK_PREFIX};
    use engine::prelude::*;
    use engine::strategy::{catalog, StrategyPayload, PAYLOAD_VERSION};
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn sample_strategy() -> Strategy {
        Strategy {
            id: "funding-rate-arb".to_string(),
            name: "Funding Rate Arbitrage".to_string(),
            description: "Delta-neutral funding capture".to_string(),
            risk: RiskLevel::Low,
            apr_range: AprRange { min: 8.0, max: 15.0 },
            price: rust_decimal::Decimal::new(4999, 2),
            min_capital: Some(rust_decimal::Decimal::new(500, 0)),
            operations: vec![
                StrategyOperation::new(OperationType::CheckFundingRate, 1)
                    .with_param("market", json!("ETH-PERP")),
                StrategyOperation::new(OperationType::OpenShort, 2)
                    .with_param("leverage", json!(1)),
                StrategyOperation::new(OperationType::SpotBuy, 3)
                    .with_param("market", json!("ETH/USDC")),
            ],
        }
    }

    fn valid_config() -> StrategyConfig {
        StrategyConfig {
            execution_mode: "instant".to_string(),
            slippage_tolerance: 0.5,
            spread_percentage: None,
            capital_allocation: Some("1000".to_string()),
        }
    }

    #[test]
    fn test_definition_rejects_duplicate_order() {
        let mut strategy = sample_strategy();
        strategy.operations[2].order = 2;

        let result = StrategyDefinition::new(strategy);
        assert!(matches!(result, Err(MarketError::InvalidInput(_))));
    }

    #[test]
    fn test_definition_rejects_zero_order() {
        let mut strategy = sample_strategy();
        strategy.operations[0].order = 0;

        assert!(StrategyDefinition::new(strategy).is_err());
    }

    #[test]
    fn test_definition_rejects_empty_operations() {
        let mut strategy = sample_strategy();
        strategy.operations.clear();

        assert!(StrategyDefinition::new(strategy).is_err());
    }

    #[test]
    fn test_definition_sorts_operations_by_order() {
        let mut strategy = sample_strategy();
        strategy.operations.reverse();

        let definition = StrategyDefinition::new(strategy).unwrap();
        let orders: Vec<u32> = definition.operations().iter().map(|op| op.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn test_operations_returns_defensive_copy() {
        let definition = StrategyDefinition::new(sample_strategy()).unwrap();

        let mut copy = definition.operations();
        copy.clear();
        copy.push(StrategyOperation::new(OperationType::Rebalance, 9));

        let refetched = definition.operations();
        assert_eq!(refetched.len(), 3);
        assert_eq!(refetched[0].op_type, OperationType::CheckFundingRate);
    }

    #[test]
    fn test_serialize_round_trip_preserves_operations() {
        let definition = StrategyDefinition::new(sample_strategy()).unwrap();
        let serialized = definition.serialize().unwrap();

        let payload: StrategyPayload = serde_json::from_str(&serialized).unwrap();
        assert_eq!(payload.strategy_id, "funding-rate-arb");
        assert_eq!(payload.version, PAYLOAD_VERSION);
        assert_eq!(payload.operations.len(), 3);

        let orders: Vec<u32> = payload.operations.iter().map(|op| op.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(
            payload.operations[0].params.get("market"),
            Some(&json!("ETH-PERP"))
        );
    }

    #[test]
    fn test_serialize_is_deterministic() {
        let definition = StrategyDefinition::new(sample_strategy()).unwrap();
        assert_eq!(
            definition.serialize().unwrap(),
            definition.serialize().unwrap()
        );
    }

    #[test]
    fn test_serialize_uses_wire_operation_names() {
        let definition = StrategyDefinition::new(sample_strategy()).unwrap();
        let serialized = definition.serialize().unwrap();

        assert!(serialized.contains("CHECK_FUNDING_RATE"));
        assert!(serialized.contains("\"strategyId\""));
        assert!(serialized.contains("\"version\":\"1.0.0\""));
    }

    #[test]
    fn test_validate_accepts_valid_config() {
        let definition = StrategyDefinition::new(sample_strategy()).unwrap();
        let report = definition.validate(&valid_config());

        assert!(report.is_valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_validate_accumulates_all_errors() {
        let definition = StrategyDefinition::new(sample_strategy()).unwrap();
        let config = StrategyConfig {
            execution_mode: "instant".to_string(),
            slippage_tolerance: -5.0,
            spread_percentage: Some(150.0),
            capital_allocation: None,
        };

        let report = definition.validate(&config);
        assert!(!report.is_valid);
        assert!(report.errors.len() >= 3, "errors: {:?}", report.errors);
    }

    #[test]
    fn test_validate_requires_spread_in_optimized_mode() {
        let definition = StrategyDefinition::new(sample_strategy()).unwrap();
        let mut config = valid_config();
        config.execution_mode = "optimized".to_string();

        let report = definition.validate(&config);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("Spread")));
    }

    #[test]
    fn test_validate_rejects_unknown_execution_mode() {
        let definition = StrategyDefinition::new(sample_strategy()).unwrap();
        let mut config = valid_config();
        config.execution_mode = "turbo".to_string();

        let report = definition.validate(&config);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("Execution mode")));
    }

    #[test]
    fn test_validate_rejects_non_numeric_capital() {
        let definition = StrategyDefinition::new(sample_strategy()).unwrap();
        let mut config = valid_config();
        config.capital_allocation = Some("a lot".to_string());

        let report = definition.validate(&config);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("numeric")));
    }

    #[test]
    fn test_validate_rejects_capital_below_minimum() {
        let definition = StrategyDefinition::new(sample_strategy()).unwrap();
        let mut config = valid_config();
        config.capital_allocation = Some("100".to_string());

        let report = definition.validate(&config);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("minimum")));
    }

    #[test]
    fn test_validate_rejects_negative_capital() {
        let definition = StrategyDefinition::new(sample_strategy()).unwrap();
        let mut config = valid_config();
        config.capital_allocation = Some("-50".to_string());

        let report = definition.validate(&config);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("positive")));
    }

    #[test]
    fn test_registry_creates_presets() {
        let registry = StrategyRegistry::new();
        assert_eq!(registry.available_ids().len(), 3);
        assert!(registry.contains(catalog::FUNDING_RATE_ARB));

        let definition = registry.create(catalog::FUNDING_RATE_ARB).unwrap();
        assert_eq!(definition.id(), "funding-rate-arb");
        assert_eq!(definition.operations().len(), 4);
    }

    #[test]
    fn test_registry_rejects_unknown_id() {
        let registry = StrategyRegistry::new();
        let result = registry.create("no-such-strategy");
        assert!(matches!(result, Err(MarketError::NotFound(_))));
    }

    #[test]
    fn test_registry_accepts_custom_strategy() {
        let mut registry = StrategyRegistry::new();
        registry.register("custom", || {
            StrategyDefinition::new(Strategy {
                id: "custom".to_string(),
                ..sample_strategy_for_registry()
            })
        });

        assert!(registry.contains("custom"));
        assert_eq!(registry.create("custom").unwrap().id(), "custom");
    }

    fn sample_strategy_for_registry() -> Strategy {
        Strategy {
            id: "custom".to_string(),
            name: "Custom".to_string(),
            description: "Test strategy".to_string(),
            risk: RiskLevel::Medium,
            apr_range: AprRange { min: 1.0, max: 2.0 },
            price: rust_decimal::Decimal::new(100, 0),
            min_capital: None,
            operations: vec![StrategyOperation::new(OperationType::SpotBuy, 1)],
        }
    }

    #[test]
    fn test_task_id_round_trip() {
        let submitted_at = Utc::now();
        let task_id = encode_task_id(submitted_at, 4);

        assert!(task_id.starts_with(TASK_PREFIX));
        let stamp = decode_task_id(&task_id).unwrap();
        assert_eq!(stamp.operation_count, 4);
        // millisecond precision survives the encoding
        assert_eq!(
            stamp.submitted_at.timestamp_millis(),
            submitted_at.timestamp_millis()
        );
    }

    #[test]
    fn test_task_id_rejects_malformed_input() {
        for bad in [
            "not-a-real-id",
            "",
            "task",
            "task_",
            "task_xyz_1_abc",
            "task_1a2b3c_zz_abc",
            "task_1a2b3c_4_",
            "job_1a2b3c_4_abc",
            "task_1a2b3c_4_abc_extra",
        ] {
            let result = decode_task_id(bad);
            assert!(result.is_err(), "expected {:?} to be rejected", bad);
        }
    }

    #[test]
    fn test_task_id_decodes_past_instants() {
        let past = Utc::now() - Duration::seconds(35);
        let task_id = encode_task_id(past, 3);

        let stamp = decode_task_id(&task_id).unwrap();
        assert!(Utc::now() - stamp.submitted_at >= Duration::seconds(35));
    }

    #[test]
    fn test_execution_mode_parsing() {
        assert_eq!(ExecutionMode::parse("instant"), Some(ExecutionMode::Instant));
        assert_eq!(
            ExecutionMode::parse(" Optimized "),
            Some(ExecutionMode::Optimized)
        );
        assert_eq!(ExecutionMode::parse("turbo"), None);
    }

    #[test]
    fn test_address_normalization() {
        assert_eq!(
            normalize_address(" 0xAbC123 "),
            normalize_address("0xabc123")
        );
    }

    #[tokio::test]
    async fn test_memory_store_put_if_absent_is_idempotent() {
        let store = MemoryOwnershipStore::new();
        let record = OwnershipRecord {
            strategy_id: "funding-rate-arb".to_string(),
            owner_address: "0xBuYeR".to_string(),
            protected_data_reference: "0xref1".to_string(),
            purchased_at: Utc::now(),
        };

        let first = store.put_if_absent(record.clone()).await.unwrap();
        let second = store
            .put_if_absent(OwnershipRecord {
                protected_data_reference: "0xref2".to_string(),
                ..record
            })
            .await
            .unwrap();

        assert_eq!(first.protected_data_reference, "0xref1");
        assert_eq!(second.protected_data_reference, "0xref1");
        assert_eq!(store.list_for_owner("0xbuyer").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_preserves_insertion_order() {
        let store = MemoryOwnershipStore::new();
        for (strategy_id, reference) in [("s-one", "0xr1"), ("s-two", "0xr2"), ("s-three", "0xr3")]
        {
            store
                .put_if_absent(OwnershipRecord {
                    strategy_id: strategy_id.to_string(),
                    owner_address: "0xOwner".to_string(),
                    protected_data_reference: reference.to_string(),
                    purchased_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let ids: Vec<String> = store
            .list_for_owner("0xowner")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.strategy_id)
            .collect();
        assert_eq!(ids, vec!["s-one", "s-two", "s-three"]);
    }

    #[tokio::test]
    async fn test_protector_reveal_round_trip() {
        use engine::access::protector::DataProtector;

        let protector = DataProtector::new("test-secret");
        let reference = protector
            .protect("{\"hello\":\"world\"}", &["0xBuyer".to_string()])
            .await
            .unwrap();

        assert!(reference.starts_with("0x"));
        let revealed = protector.reveal(&reference, "0xbuyer").await.unwrap();
        assert_eq!(revealed, "{\"hello\":\"world\"}");
    }

    #[tokio::test]
    async fn test_protector_denies_unauthorized_reveal() {
        use engine::access::protector::DataProtector;

        let protector = DataProtector::new("test-secret");
        let reference = protector
            .protect("secret payload", &["0xBuyer".to_string()])
            .await
            .unwrap();

        let result = protector.reveal(&reference, "0xIntruder").await;
        assert!(matches!(result, Err(MarketError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn test_protector_grants_are_case_insensitive() {
        use engine::access::protector::DataProtector;

        let protector = DataProtector::new("test-secret");
        let reference = protector
            .protect("payload", &["0xAbCdEf".to_string()])
            .await
            .unwrap();

        assert!(protector.is_authorized(&reference, "0xABCDEF").await);
        assert!(protector.is_authorized(&reference, "0xabcdef").await);
        assert!(!protector.is_authorized(&reference, "0xother").await);
    }

    #[tokio::test]
    async fn test_protector_export_and_discard() {
        use engine::access::protector::DataProtector;

        let protector = DataProtector::new("test-secret");
        let reference = protector
            .protect("payload", &["0xBuyer".to_string()])
            .await
            .unwrap();

        let blob = protector.export(&reference, "0xBuyer").await.unwrap();
        assert_eq!(blob.reference, reference);
        assert!(!blob.ciphertext.is_empty());
        assert_eq!(blob.nonce.len(), 24); // 12 bytes hex-encoded

        protector.discard(&reference).await;
        let result = protector.reveal(&reference, "0xBuyer").await;
        assert!(matches!(result, Err(MarketError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_protector_grant_access_extends_audience() {
        use engine::access::protector::DataProtector;

        let protector = DataProtector::new("test-secret");
        let reference = protector
            .protect("payload", &["0xBuyer".to_string()])
            .await
            .unwrap();

        assert!(!protector.is_authorized(&reference, "0xLate").await);
        protector.grant_access(&reference, "0xLate").await.unwrap();
        assert!(protector.is_authorized(&reference, "0xlate").await);
    }
}
