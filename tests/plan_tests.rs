//! Tests for the plan engine and controller

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use std::path::PathBuf;
    use std::sync::Arc;
    use traderplan::persistence::{CsvStore, MemoryStore, PlanStore};
    use traderplan::plan::{PlanController, Trend};
    use traderplan::{locate, project, reconcile, PlanConfig, TradeRecord, DAY_CAP};

    fn scenario_config() -> PlanConfig {
        PlanConfig {
            initial_balance: 150.0,
            target_balance: 10_000.0,
            win_amount: 3.0,
            loss_amount: 20.0,
            daily_percentage: 3.0,
            max_trades_per_day: None,
        }
    }

    fn chain(results: &[f64]) -> Vec<TradeRecord> {
        let base = Utc.with_ymd_and_hms(2025, 3, 3, 20, 0, 0).unwrap();
        results
            .iter()
            .enumerate()
            .map(|(i, r)| TradeRecord::at(base + Duration::days(i as i64), *r, None))
            .collect()
    }

    fn temp_data_dir(test_name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "traderplan_it_{}_{}",
            test_name,
            uuid::Uuid::new_v4()
        ))
    }

    // ============================================================================
    // Projection
    // ============================================================================

    #[test]
    fn test_scenario_a_first_roadmap_day() {
        let roadmap = project(&scenario_config());
        let day1 = roadmap.entries()[0];

        assert_eq!(day1.day, 1);
        assert!((day1.start_balance - 150.0).abs() < 1e-9);
        assert!((day1.end_balance - 154.5).abs() < 1e-9);
        assert!((day1.daily_target_value - 4.5).abs() < 1e-9);
        assert!((day1.trades_needed - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_roadmap_monotonic_for_many_rates() {
        for pct in [0.5, 1.0, 3.0, 12.5, 50.0, 100.0] {
            let config = PlanConfig {
                daily_percentage: pct,
                ..scenario_config()
            };
            let roadmap = project(&config);
            assert!(!roadmap.is_empty());
            assert!(roadmap.len() <= DAY_CAP as usize);

            for entry in &roadmap {
                assert!(entry.end_balance > entry.start_balance);
                assert!(
                    (entry.accumulated_profit - (entry.end_balance - 150.0)).abs() < 1e-6
                );
            }
            for pair in roadmap.entries().windows(2) {
                assert_eq!(pair[1].start_balance, pair[0].end_balance);
                assert_eq!(pair[1].day, pair[0].day + 1);
            }
        }
    }

    #[test]
    fn test_termination_for_tiny_rate() {
        let config = PlanConfig {
            daily_percentage: 1e-9,
            ..scenario_config()
        };
        let roadmap = project(&config);
        assert_eq!(roadmap.len(), DAY_CAP as usize);
        assert!(roadmap.is_truncated());
    }

    #[test]
    fn test_zero_and_negative_rates_run_to_day_cap() {
        for pct in [0.0, -1.0] {
            let config = PlanConfig {
                daily_percentage: pct,
                ..scenario_config()
            };
            let roadmap = project(&config);
            assert_eq!(roadmap.len(), DAY_CAP as usize, "pct {}", pct);
            assert!(roadmap.is_truncated());
        }
    }

    #[test]
    fn test_scenario_e_inverted_target() {
        let config = PlanConfig {
            initial_balance: 500.0,
            target_balance: 400.0,
            ..scenario_config()
        };
        let roadmap = project(&config);
        assert!(roadmap.is_empty());
        assert_eq!(locate(450.0, roadmap.entries(), 500.0), 0);
        assert_eq!(locate(1_000.0, &[], 500.0), 0);
    }

    // ============================================================================
    // Locator
    // ============================================================================

    #[test]
    fn test_scenario_b_locate() {
        let roadmap = project(&scenario_config());
        assert_eq!(locate(150.0, roadmap.entries(), 150.0), 1);
        assert_eq!(locate(149.0, roadmap.entries(), 150.0), 0);
        assert_eq!(locate(154.5, roadmap.entries(), 150.0), 2);
    }

    #[test]
    fn test_locator_monotonic() {
        let roadmap = project(&scenario_config());
        let balances: Vec<f64> = (0..2_000).map(|i| 100.0 + i as f64 * 6.3).collect();
        for pair in balances.windows(2) {
            assert!(
                locate(pair[0], roadmap.entries(), 150.0)
                    <= locate(pair[1], roadmap.entries(), 150.0)
            );
        }
    }

    // ============================================================================
    // Reconciliation
    // ============================================================================

    #[test]
    fn test_scenario_c_single_trade() {
        let out = reconcile(&chain(&[10.0]), 150.0, &scenario_config()).unwrap();
        let trade = &out.trades[0];

        assert_eq!(trade.start_balance, 150.0);
        assert_eq!(trade.end_balance, 160.0);
        assert_eq!(trade.start_plan_day, 1);
        assert_eq!(
            trade.end_plan_day,
            locate(160.0, out.roadmap.entries(), 150.0)
        );
        assert_eq!(trade.day_shift, trade.end_plan_day as i64 - 1);
    }

    #[test]
    fn test_scenario_d_delete_middle_trade() {
        let first = reconcile(&chain(&[10.0, -5.0, 8.0]), 150.0, &scenario_config()).unwrap();
        let remaining: Vec<TradeRecord> = first
            .trades
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 1)
            .map(|(_, t)| t.clone())
            .collect();

        let out = reconcile(&remaining, 150.0, &scenario_config()).unwrap();
        assert_eq!(out.trades.len(), 2);
        assert_eq!(out.trades[0].end_balance, 160.0);
        assert_eq!(out.trades[1].start_balance, 160.0);
        assert_eq!(out.trades[1].end_balance, 168.0);
        assert_eq!(out.final_balance, 168.0);
    }

    #[test]
    fn test_idempotent_and_chained() {
        let trades = chain(&[12.0, -30.0, 4.5, 0.0, 60.0, -1.25]);
        let once = reconcile(&trades, 150.0, &scenario_config()).unwrap();
        let twice = reconcile(&once.trades, 150.0, &scenario_config()).unwrap();

        assert_eq!(once.trades, twice.trades);
        assert_eq!(once.final_balance, twice.final_balance);
        for pair in twice.trades.windows(2) {
            assert_eq!(pair[1].start_balance, pair[0].end_balance);
        }
    }

    #[test]
    fn test_edit_changes_downstream_only_through_balances() {
        let trades = chain(&[5.0, 5.0, 5.0]);
        let before = reconcile(&trades, 150.0, &scenario_config()).unwrap();

        let mut edited = before.trades.clone();
        edited[0].result_value = 50.0;
        let after = reconcile(&edited, 150.0, &scenario_config()).unwrap();

        assert_eq!(after.trades[1].start_balance, 200.0);
        assert_eq!(after.trades[2].end_balance, 210.0);
        assert!(after.trades[0].day_shift > before.trades[0].day_shift);
    }

    // ============================================================================
    // Controller
    // ============================================================================

    #[tokio::test]
    async fn test_controller_scenario_d() {
        let plan = PlanController::open(Arc::new(MemoryStore::new()), scenario_config())
            .await
            .unwrap();
        plan.finish_day(10.0, None).await.unwrap();
        let middle = plan.finish_day(-5.0, None).await.unwrap();
        plan.finish_day(8.0, None).await.unwrap();

        plan.delete_trade(&middle.id).await.unwrap();

        let trades = plan.trades().await;
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[1].start_balance, trades[0].end_balance);
        assert_eq!(plan.current_balance().await, 168.0);
    }

    #[tokio::test]
    async fn test_controller_status_follows_history() {
        let plan = PlanController::open(Arc::new(MemoryStore::new()), scenario_config())
            .await
            .unwrap();

        plan.finish_day(10.0, None).await.unwrap();
        let status = plan.status().await;
        assert_eq!(status.current_plan_day, 3);
        assert_eq!(status.last_trend, Some(Trend::Advanced));

        plan.finish_day(-15.0, None).await.unwrap();
        let status = plan.status().await;
        assert_eq!(status.current_plan_day, 0);
        assert_eq!(status.last_trend, Some(Trend::Regressed));
        assert!(status.risk.is_high_risk);
    }

    #[tokio::test]
    async fn test_csv_store_survives_reopen() {
        let data_dir = temp_data_dir("reopen");

        {
            let store = Arc::new(CsvStore::new(&data_dir).unwrap());
            let plan = PlanController::open(store, scenario_config()).await.unwrap();
            plan.finish_day(10.0, Some("first day".into())).await.unwrap();
            plan.finish_day(-2.5, None).await.unwrap();
            plan.update_config(PlanConfig {
                daily_percentage: 2.0,
                ..scenario_config()
            })
            .await
            .unwrap();
        }

        let store = Arc::new(CsvStore::new(&data_dir).unwrap());
        let saved = store.load_trades().await.unwrap();
        let plan = PlanController::open(store, scenario_config()).await.unwrap();

        assert_eq!(plan.config().await.daily_percentage, 2.0);
        assert_eq!(plan.trades().await, saved);
        assert_eq!(plan.current_balance().await, 157.5);
        assert_eq!(saved[0].note.as_deref(), Some("first day"));

        let _ = std::fs::remove_dir_all(&data_dir);
    }

    #[tokio::test]
    async fn test_concurrent_finish_day_is_serialized() {
        let plan = Arc::new(
            PlanController::open(Arc::new(MemoryStore::new()), scenario_config())
                .await
                .unwrap(),
        );

        let mut handles = Vec::new();
        for _ in 0..20 {
            let plan = plan.clone();
            handles.push(tokio::spawn(async move {
                plan.finish_day(1.0, None).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let trades = plan.trades().await;
        assert_eq!(trades.len(), 20);
        assert_eq!(plan.current_balance().await, 170.0);
        assert_eq!(plan.version().await, 21);
        for pair in trades.windows(2) {
            assert_eq!(pair[1].start_balance, pair[0].end_balance);
        }
    }
}
