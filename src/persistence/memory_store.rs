use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::PlanStore;
use crate::types::{PlanConfig, TradeRecord};

/// Process-local store. State lives as long as the value does.
///
/// Trades are kept in insertion order so equal timestamps load deterministically.
#[derive(Default)]
pub struct MemoryStore {
    config: RwLock<Option<PlanConfig>>,
    trades: RwLock<Vec<TradeRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a configuration and trades
    pub fn with_state(config: PlanConfig, trades: Vec<TradeRecord>) -> Self {
        Self {
            config: RwLock::new(Some(config)),
            trades: RwLock::new(trades),
        }
    }
}

fn upsert(trades: &mut Vec<TradeRecord>, trade: &TradeRecord) {
    match trades.iter_mut().find(|t| t.id == trade.id) {
        Some(existing) => *existing = trade.clone(),
        None => trades.push(trade.clone()),
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn load_config(&self) -> Result<Option<PlanConfig>> {
        Ok(self.config.read().await.clone())
    }

    async fn save_config(&self, config: &PlanConfig) -> Result<()> {
        *self.config.write().await = Some(config.clone());
        Ok(())
    }

    async fn load_trades(&self) -> Result<Vec<TradeRecord>> {
        let mut trades = self.trades.read().await.clone();
        // Stable: ties keep insertion order
        trades.sort_by_key(|t| t.timestamp);
        Ok(trades)
    }

    async fn upsert_trade(&self, trade: &TradeRecord) -> Result<()> {
        upsert(&mut *self.trades.write().await, trade);
        Ok(())
    }

    async fn upsert_trades(&self, trades: &[TradeRecord]) -> Result<()> {
        let mut stored = self.trades.write().await;
        for trade in trades {
            upsert(&mut stored, trade);
        }
        Ok(())
    }

    async fn delete_trade(&self, id: &str) -> Result<()> {
        self.trades.write().await.retain(|t| t.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let store = MemoryStore::new();
        let mut trade = TradeRecord::new(5.0, None);
        store.upsert_trade(&trade).await.unwrap();

        trade.result_value = -2.0;
        store.upsert_trade(&trade).await.unwrap();

        let trades = store.load_trades().await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].result_value, -2.0);
    }

    #[tokio::test]
    async fn test_load_is_ordered_and_delete_ignores_unknown() {
        let now = Utc::now();
        let late = TradeRecord::at(now, 1.0, None);
        let early = TradeRecord::at(now - Duration::days(1), 2.0, None);
        let store = MemoryStore::with_state(PlanConfig::default(), vec![late, early.clone()]);

        let trades = store.load_trades().await.unwrap();
        assert_eq!(trades[0].id, early.id);

        store.delete_trade("missing").await.unwrap();
        store.delete_trade(&early.id).await.unwrap();
        assert_eq!(store.load_trades().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_equal_timestamps_keep_insertion_order() {
        let now = Utc::now();
        let seeded: Vec<TradeRecord> = (0..16)
            .map(|i| TradeRecord::at(now, i as f64, None))
            .collect();
        let store = MemoryStore::with_state(PlanConfig::default(), seeded.clone());

        let extra = TradeRecord::at(now, 99.0, None);
        store.upsert_trade(&extra).await.unwrap();
        // Replacing an existing id keeps its slot
        let mut edited = seeded[3].clone();
        edited.result_value = -3.0;
        store.upsert_trade(&edited).await.unwrap();

        let loaded = store.load_trades().await.unwrap();
        let ids: Vec<&str> = loaded.iter().map(|t| t.id.as_str()).collect();
        let mut expected: Vec<&str> = seeded.iter().map(|t| t.id.as_str()).collect();
        expected.push(extra.id.as_str());
        assert_eq!(ids, expected);
        assert_eq!(loaded[3].result_value, -3.0);
        assert_eq!(store.load_trades().await.unwrap(), loaded);
    }

    #[tokio::test]
    async fn test_config_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.load_config().await.unwrap().is_none());

        let config = PlanConfig {
            daily_percentage: 1.5,
            ..Default::default()
        };
        store.save_config(&config).await.unwrap();
        assert_eq!(store.load_config().await.unwrap(), Some(config));
    }
}
