pub mod config;
pub mod error;
pub mod models;
pub mod redis;
pub mod store;

pub use config::Config;
pub use error::{MarketError, MarketResult};
pub use models::*;
pub use redis::{get_redis_client, Redis};
pub use store::{MemoryOwnershipStore, OwnershipStore, RedisOwnershipStore};
