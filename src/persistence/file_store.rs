//! CSV + JSON file store
//!
//! Trades live in `<data_dir>/trades.csv`, the configuration in
//! `<data_dir>/plan_config.json`. Every write rewrites the whole file through
//! a temporary file and a rename.

use anyhow::{Context, Result};
use async_trait::async_trait;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::PlanStore;
use crate::types::{PlanConfig, TradeRecord};

const TRADES_FILE: &str = "trades.csv";
const CONFIG_FILE: &str = "plan_config.json";

/// File-backed plan store
pub struct CsvStore {
    data_dir: PathBuf,
    /// Serializes read-modify-write cycles on the trades file
    write_lock: Mutex<()>,
}

impl CsvStore {
    /// Open (and create if needed) a store rooted at `data_dir`
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        info!(data_dir = %data_dir.display(), "💾 CSV store opened");
        Ok(Self {
            data_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn trades_path(&self) -> PathBuf {
        self.data_dir.join(TRADES_FILE)
    }

    fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    fn read_trades(&self) -> Result<Vec<TradeRecord>> {
        let path = self.trades_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&path).context("Failed to open trades file")?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        let mut records = Vec::new();
        for result in reader.deserialize() {
            let record: TradeRecord = result.context("Failed to deserialize trade record")?;
            records.push(record);
        }

        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }

    fn write_trades(&self, trades: &[TradeRecord]) -> Result<()> {
        let path = self.trades_path();
        let tmp = path.with_extension("csv.tmp");

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)
            .context("Failed to create temporary trades file")?;

        let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
        for trade in trades {
            writer
                .serialize(trade)
                .context("Failed to write trade record")?;
        }
        writer.flush().context("Failed to flush trades writer")?;
        drop(writer);

        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed replacing {}", path.display()))?;
        debug!(trades = trades.len(), path = %path.display(), "Trades file written");
        Ok(())
    }

    fn merge(existing: &mut Vec<TradeRecord>, trade: &TradeRecord) {
        match existing.iter_mut().find(|t| t.id == trade.id) {
            Some(slot) => *slot = trade.clone(),
            None => existing.push(trade.clone()),
        }
    }
}

#[async_trait]
impl PlanStore for CsvStore {
    async fn load_config(&self) -> Result<Option<PlanConfig>> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed reading {}", path.display()))?;
        let config = serde_json::from_str(&json).context("Failed to parse plan config")?;
        Ok(Some(config))
    }

    async fn save_config(&self, config: &PlanConfig) -> Result<()> {
        let path = self.config_path();
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(config)?;
        fs::write(&tmp, json).context("Failed to write plan config")?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed replacing {}", path.display()))?;
        Ok(())
    }

    async fn load_trades(&self) -> Result<Vec<TradeRecord>> {
        let _guard = self.write_lock.lock().await;
        self.read_trades()
    }

    async fn upsert_trade(&self, trade: &TradeRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut trades = self.read_trades()?;
        Self::merge(&mut trades, trade);
        trades.sort_by_key(|t| t.timestamp);
        self.write_trades(&trades)
    }

    async fn upsert_trades(&self, batch: &[TradeRecord]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut trades = self.read_trades()?;
        for trade in batch {
            Self::merge(&mut trades, trade);
        }
        trades.sort_by_key(|t| t.timestamp);
        self.write_trades(&trades)
    }

    async fn delete_trade(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut trades = self.read_trades()?;
        let before = trades.len();
        trades.retain(|t| t.id != id);
        if trades.len() != before {
            self.write_trades(&trades)?;
        }
        Ok(())
    }
}
