//! Remote executor clients
//!
//! The orchestrator submits work through the [`RemoteExecutor`] seam.
//! [`SimulatedExecutor`] mints task ids locally and performs no I/O - the
//! stand-in wired up by default. [`ExecutorApiClient`] talks to a real
//! executor service over HTTP.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use shared::error::{MarketError, MarketResult};
use shared::models::{StrategyConfig, StrategyOperation};

use crate::execution::task::encode_task_id;

#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Submit a protected payload's operations for execution. Returns the
    /// opaque task id the caller polls with.
    async fn submit(
        &self,
        reference: &str,
        operations: &[StrategyOperation],
        config: &StrategyConfig,
    ) -> MarketResult<String>;
}

/// No-I/O executor: mints a task id that encodes the submission instant
/// and operation count, which is all the status machine needs.
#[derive(Debug, Clone, Default)]
pub struct SimulatedExecutor;

impl SimulatedExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RemoteExecutor for SimulatedExecutor {
    async fn submit(
        &self,
        reference: &str,
        operations: &[StrategyOperation],
        _config: &StrategyConfig,
    ) -> MarketResult<String> {
        let task_id = encode_task_id(Utc::now(), operations.len() as u32);
        tracing::debug!(
            "submitted {} operations for {} as {}",
            operations.len(),
            reference,
            task_id
        );
        Ok(task_id)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecutorVersion {
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TaskSubmission {
    task_id: String,
}

/// HTTP client for a remote executor service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorApiClient {
    pub base_url: String,
    pub api_token: String,
}

impl ExecutorApiClient {
    pub fn new(base_url: String, api_token: String) -> Self {
        Self {
            base_url,
            api_token,
        }
    }

    pub async fn ping(&self) -> MarketResult<ExecutorVersion> {
        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}/api/v1/ping", self.base_url))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(anyhow::Error::from)?;

        let version: ExecutorVersion = response.json().await.map_err(anyhow::Error::from)?;
        Ok(version)
    }
}

#[async_trait]
impl RemoteExecutor for ExecutorApiClient {
    async fn submit(
        &self,
        reference: &str,
        operations: &[StrategyOperation],
        config: &StrategyConfig,
    ) -> MarketResult<String> {
        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}/api/v1/tasks", self.base_url))
            .bearer_auth(&self.api_token)
            .json(&serde_json::json!({
                "protected_data": reference,
                "operations": operations,
                "config": config,
            }))
            .send()
            .await
            .map_err(anyhow::Error::from)?;

        if !response.status().is_success() {
            return Err(MarketError::Unknown(anyhow::anyhow!(
                "executor rejected submission: {}",
                response.status()
            )));
        }

        let submission: TaskSubmission = response.json().await.map_err(anyhow::Error::from)?;
        Ok(submission.task_id)
    }
}
