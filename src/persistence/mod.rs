//! Persistence Module
//!
//! Storage of the plan configuration and trade records. The plan controller
//! treats every store as a key-value collection with read-all / upsert /
//! delete-by-id; last write wins.

mod file_store;
mod memory_store;

pub use file_store::CsvStore;
pub use memory_store::MemoryStore;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{PlanConfig, TradeRecord};

/// Backing store for one plan
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Persisted configuration, if any was saved
    async fn load_config(&self) -> Result<Option<PlanConfig>>;

    async fn save_config(&self, config: &PlanConfig) -> Result<()>;

    /// Every stored trade, oldest first
    async fn load_trades(&self) -> Result<Vec<TradeRecord>>;

    /// Insert or replace by id
    async fn upsert_trade(&self, trade: &TradeRecord) -> Result<()>;

    /// Insert or replace a batch by id
    async fn upsert_trades(&self, trades: &[TradeRecord]) -> Result<()> {
        for trade in trades {
            self.upsert_trade(trade).await?;
        }
        Ok(())
    }

    /// Remove by id. Unknown ids are ignored.
    async fn delete_trade(&self, id: &str) -> Result<()>;
}
