//! Task identifier codec
//!
//! A task id carries everything status derivation needs, so the
//! orchestrator holds no per-task state:
//!
//! ```plain
//! task_<submission instant, millis hex>_<operation count hex>_<uuid>
//! ```
//!
//! Any string that does not match this shape is rejected outright, never
//! silently coerced.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use shared::error::{MarketError, MarketResult};

pub const TASK_PREFIX: &str = "task";

/// Message used for every malformed-id rejection
pub const INVALID_TASK_ID: &str = "Invalid task ID";

/// What a task id encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskStamp {
    pub submitted_at: DateTime<Utc>,
    pub operation_count: u32,
}

/// Mint a task id for a submission happening now
pub fn encode_task_id(submitted_at: DateTime<Utc>, operation_count: u32) -> String {
    format!(
        "{}_{:x}_{:x}_{}",
        TASK_PREFIX,
        submitted_at.timestamp_millis(),
        operation_count,
        Uuid::new_v4().simple()
    )
}

/// Recover the submission instant and operation count from a task id
pub fn decode_task_id(task_id: &str) -> MarketResult<TaskStamp> {
    let invalid = || MarketError::InvalidInput(INVALID_TASK_ID.to_string());

    let parts: Vec<&str> = task_id.split('_').collect();
    if parts.len() != 4 || parts[0] != TASK_PREFIX || parts[3].is_empty() {
        return Err(invalid());
    }

    let millis = i64::from_str_radix(parts[1], 16).map_err(|_| invalid())?;
    let operation_count = u32::from_str_radix(parts[2], 16).map_err(|_| invalid())?;

    let submitted_at = match Utc.timestamp_millis_opt(millis) {
        chrono::LocalResult::Single(instant) => instant,
        _ => return Err(invalid()),
    };

    Ok(TaskStamp {
        submitted_at,
        operation_count,
    })
}
