//! Plan Controller
//!
//! Owns the configuration and trade list of one plan. Every mutation replays
//! the whole chain before anything is committed, and mutations are serialized
//! behind a single lock so a reconciliation never runs on a stale list.
//!
//! In-memory state is the source of truth. The store is written after each
//! commit; a failed write marks the plan dirty until `flush` succeeds.

pub mod status;

pub use status::{summarize, PlanStatus, Trend};

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{PlanError, PlanResult};
use crate::persistence::PlanStore;
use crate::projection::Roadmap;
use crate::reconcile::{reconcile, Reconciliation};
use crate::types::{PlanConfig, TradeRecord};

struct PlanState {
    config: PlanConfig,
    trades: Vec<TradeRecord>,
    current_balance: f64,
    /// Roadmap of the last reconciliation, anchored on `config.initial_balance`
    roadmap: Roadmap,
    version: u64,
    dirty: bool,
}

impl PlanState {
    fn commit(&mut self, config: PlanConfig, reconciliation: Reconciliation) {
        self.config = config;
        self.trades = reconciliation.trades;
        self.current_balance = reconciliation.final_balance;
        self.roadmap = reconciliation.roadmap;
        self.version += 1;
    }
}

/// What a mutation needs written back
#[derive(Default)]
struct WriteBack<'a> {
    config_changed: bool,
    deleted: &'a [String],
}

/// Single-writer owner of one plan
pub struct PlanController {
    store: Arc<dyn PlanStore>,
    state: Mutex<PlanState>,
}

impl PlanController {
    /// Load the plan from `store`, seeding it with `default_config` when none was saved
    pub async fn open(store: Arc<dyn PlanStore>, default_config: PlanConfig) -> PlanResult<Self> {
        let config = match store.load_config().await? {
            Some(config) => config,
            None => {
                info!("[PLAN] No saved configuration, using defaults");
                store.save_config(&default_config).await?;
                default_config
            }
        };
        warn_on_issues(&config);

        let trades = store.load_trades().await?;
        let reconciliation = reconcile(&trades, config.initial_balance, &config)?;

        info!(
            trades = reconciliation.trades.len(),
            balance = reconciliation.final_balance,
            roadmap_days = reconciliation.roadmap.len(),
            "[PLAN] Plan loaded"
        );

        let mut state = PlanState {
            config: config.clone(),
            trades: Vec::new(),
            current_balance: config.initial_balance,
            roadmap: Roadmap::default(),
            version: 0,
            dirty: false,
        };
        state.commit(config, reconciliation);

        Ok(Self {
            store,
            state: Mutex::new(state),
        })
    }

    /// Close the current day with `result_value` (positive = win, negative = loss)
    pub async fn finish_day(
        &self,
        result_value: f64,
        note: Option<String>,
    ) -> PlanResult<TradeRecord> {
        let mut state = self.state.lock().await;

        let timestamp = next_timestamp(state.trades.last().map(|t| t.timestamp), Utc::now());
        let trade = TradeRecord::at(timestamp, result_value, note);
        let id = trade.id.clone();

        let mut trades = state.trades.clone();
        trades.push(trade);
        let config = state.config.clone();
        let reconciliation = reconcile(&trades, config.initial_balance, &config)?;
        state.commit(config, reconciliation);

        let recorded = find(&state.trades, &id)?.clone();
        info!(
            id = %recorded.id,
            result = recorded.result_value,
            balance = recorded.end_balance,
            day_shift = recorded.day_shift,
            "[PLAN] Day finished"
        );

        self.write_back(&mut state, WriteBack::default()).await;
        Ok(recorded)
    }

    /// Replace the result of an existing trade
    pub async fn edit_trade(&self, id: &str, result_value: f64) -> PlanResult<TradeRecord> {
        let mut state = self.state.lock().await;

        let mut trades = state.trades.clone();
        let trade = trades
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| PlanError::TradeNotFound(id.to_string()))?;
        let previous = trade.result_value;
        trade.result_value = result_value;

        let config = state.config.clone();
        let reconciliation = reconcile(&trades, config.initial_balance, &config)?;
        state.commit(config, reconciliation);

        let edited = find(&state.trades, id)?.clone();
        info!(
            id,
            previous,
            result = result_value,
            balance = state.current_balance,
            "[PLAN] Trade edited"
        );

        self.write_back(&mut state, WriteBack::default()).await;
        Ok(edited)
    }

    /// Remove a trade and re-chain everything after it
    pub async fn delete_trade(&self, id: &str) -> PlanResult<TradeRecord> {
        let mut state = self.state.lock().await;

        let removed = find(&state.trades, id)?.clone();
        let trades: Vec<TradeRecord> = state
            .trades
            .iter()
            .filter(|t| t.id != id)
            .cloned()
            .collect();

        let config = state.config.clone();
        let reconciliation = reconcile(&trades, config.initial_balance, &config)?;
        state.commit(config, reconciliation);

        info!(
            id,
            remaining = state.trades.len(),
            balance = state.current_balance,
            "[PLAN] Trade deleted"
        );

        let deleted = [removed.id.clone()];
        self.write_back(
            &mut state,
            WriteBack {
                deleted: &deleted,
                ..Default::default()
            },
        )
        .await;
        Ok(removed)
    }

    /// Replace the configuration and replay the chain from its initial balance
    pub async fn update_config(&self, config: PlanConfig) -> PlanResult<()> {
        let mut state = self.state.lock().await;
        warn_on_issues(&config);

        let reconciliation = reconcile(&state.trades, config.initial_balance, &config)?;
        state.commit(config, reconciliation);

        info!(
            initial = state.config.initial_balance,
            target = state.config.target_balance,
            pct = state.config.daily_percentage,
            roadmap_days = state.roadmap.len(),
            balance = state.current_balance,
            "[PLAN] Configuration updated"
        );

        self.write_back(
            &mut state,
            WriteBack {
                config_changed: true,
                ..Default::default()
            },
        )
        .await;
        Ok(())
    }

    /// Drop every trade; the balance returns to the initial balance
    pub async fn reset_history(&self) -> PlanResult<usize> {
        let mut state = self.state.lock().await;

        let deleted: Vec<String> = state.trades.iter().map(|t| t.id.clone()).collect();
        let config = state.config.clone();
        let reconciliation = reconcile(&[], config.initial_balance, &config)?;
        state.commit(config, reconciliation);

        info!(deleted = deleted.len(), "[PLAN] History reset");

        self.write_back(
            &mut state,
            WriteBack {
                deleted: &deleted,
                ..Default::default()
            },
        )
        .await;
        Ok(deleted.len())
    }

    /// Write the full in-memory state to the store, removing trades it no longer has
    pub async fn flush(&self) -> PlanResult<()> {
        let mut state = self.state.lock().await;
        self.sync_all(&state).await?;
        state.dirty = false;
        debug!(version = state.version, "Plan flushed");
        Ok(())
    }

    pub async fn config(&self) -> PlanConfig {
        self.state.lock().await.config.clone()
    }

    /// Reconciled trades, oldest first
    pub async fn trades(&self) -> Vec<TradeRecord> {
        self.state.lock().await.trades.clone()
    }

    pub async fn current_balance(&self) -> f64 {
        self.state.lock().await.current_balance
    }

    pub async fn roadmap(&self) -> Roadmap {
        self.state.lock().await.roadmap.clone()
    }

    pub async fn current_plan_day(&self) -> u32 {
        let state = self.state.lock().await;
        state.roadmap.locate(state.current_balance)
    }

    pub async fn status(&self) -> PlanStatus {
        let state = self.state.lock().await;
        summarize(
            &state.config,
            &state.roadmap,
            state.current_balance,
            state.trades.last(),
        )
    }

    /// Incremented on every committed mutation
    pub async fn version(&self) -> u64 {
        self.state.lock().await.version
    }

    /// True while the store is behind the in-memory state
    pub async fn is_dirty(&self) -> bool {
        self.state.lock().await.dirty
    }

    async fn write_back(&self, state: &mut PlanState, write: WriteBack<'_>) {
        let result = if state.dirty {
            self.sync_all(state).await
        } else {
            self.write_changes(state, &write).await
        };

        match result {
            Ok(()) => state.dirty = false,
            Err(e) => {
                warn!(error = %e, version = state.version, "Failed to persist plan state");
                state.dirty = true;
            }
        }
    }

    async fn write_changes(&self, state: &PlanState, write: &WriteBack<'_>) -> PlanResult<()> {
        if write.config_changed {
            self.store.save_config(&state.config).await?;
        }
        for id in write.deleted {
            self.store.delete_trade(id).await?;
        }
        // Derived fields move for every trade after the change point
        self.store.upsert_trades(&state.trades).await?;
        Ok(())
    }

    async fn sync_all(&self, state: &PlanState) -> PlanResult<()> {
        self.store.save_config(&state.config).await?;

        let live: HashSet<&str> = state.trades.iter().map(|t| t.id.as_str()).collect();
        for stored in self.store.load_trades().await? {
            if !live.contains(stored.id.as_str()) {
                self.store.delete_trade(&stored.id).await?;
            }
        }
        self.store.upsert_trades(&state.trades).await?;
        Ok(())
    }
}

fn find<'a>(trades: &'a [TradeRecord], id: &str) -> PlanResult<&'a TradeRecord> {
    trades
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| PlanError::TradeNotFound(id.to_string()))
}

/// Timestamp for a new trade that always sorts after the current last one
fn next_timestamp(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match last {
        Some(last) if last >= now => last + Duration::milliseconds(1),
        _ => now,
    }
}

fn warn_on_issues(config: &PlanConfig) {
    for issue in config.issues() {
        warn!(issue = %issue, "Plan configuration issue");
    }
}
