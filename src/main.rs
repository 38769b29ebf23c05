use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use traderplan::config::{AppConfig, LoggingConfig, StoreBackend};
use traderplan::persistence::{CsvStore, MemoryStore, PlanStore};
use traderplan::plan::PlanController;
use traderplan::risk;
use traderplan::types::{PlanConfig, TradeRecord};

#[derive(Parser)]
#[command(name = "traderplan", version, about = "Compounding growth plan tracker")]
struct Cli {
    /// Override persistence.backend (csv | memory)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Override persistence.data_dir
    #[arg(long, global = true)]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the projected roadmap
    Roadmap {
        /// Only show the first N days
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show where the current balance sits in the plan
    Status,
    /// Close the day with a result (negative for a loss)
    FinishDay {
        #[arg(allow_negative_numbers = true)]
        result: f64,
        #[arg(long)]
        note: Option<String>,
    },
    /// Change the result of a recorded day
    Edit {
        id: String,
        #[arg(allow_negative_numbers = true)]
        result: f64,
    },
    /// Delete a recorded day
    Delete { id: String },
    /// List recorded days, newest first
    History,
    /// Risk per trade for the current (or given) balance
    Risk {
        #[arg(long)]
        balance: Option<f64>,
    },
    /// Update plan parameters; omitted values are kept
    Configure(ConfigureArgs),
    /// Delete every recorded day
    Reset,
}

#[derive(Args)]
struct ConfigureArgs {
    #[arg(long)]
    initial_balance: Option<f64>,
    #[arg(long)]
    target_balance: Option<f64>,
    #[arg(long)]
    win_amount: Option<f64>,
    #[arg(long)]
    loss_amount: Option<f64>,
    #[arg(long)]
    daily_percentage: Option<f64>,
    /// 0 clears the cap
    #[arg(long)]
    max_trades_per_day: Option<u32>,
}

impl ConfigureArgs {
    fn apply(&self, base: PlanConfig) -> PlanConfig {
        PlanConfig {
            initial_balance: self.initial_balance.unwrap_or(base.initial_balance),
            target_balance: self.target_balance.unwrap_or(base.target_balance),
            win_amount: self.win_amount.unwrap_or(base.win_amount),
            loss_amount: self.loss_amount.unwrap_or(base.loss_amount),
            daily_percentage: self.daily_percentage.unwrap_or(base.daily_percentage),
            max_trades_per_day: match self.max_trades_per_day {
                Some(0) => None,
                Some(cap) => Some(cap),
                None => base.max_trades_per_day,
            },
        }
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Failed to create EnvFilter")?;

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_with_overrides(cli.backend.clone(), cli.data_dir.clone())
        .context("Failed to load configuration")?;

    init_tracing(&config.logging)?;
    debug!(config = %config, "Configuration loaded");

    let store: Arc<dyn PlanStore> = match config.store_backend()? {
        StoreBackend::Csv => Arc::new(CsvStore::new(&config.persistence.data_dir)?),
        StoreBackend::Memory => {
            info!("Using in-memory store, nothing will be saved");
            Arc::new(MemoryStore::new())
        }
    };

    let plan = PlanController::open(store, config.plan.clone()).await?;
    run(&plan, cli.command).await
}

async fn run(plan: &PlanController, command: Command) -> Result<()> {
    match command {
        Command::Roadmap { limit } => {
            let roadmap = plan.roadmap().await;
            let current_day = plan.current_plan_day().await;
            let limit = limit.unwrap_or(roadmap.len());

            println!(
                "{:>5}  {:>12}  {:>10}  {:>12}  {:>7}  {:>12}",
                "DAY", "START", "TARGET", "END", "TRADES", "PROFIT"
            );
            for entry in roadmap.iter().take(limit) {
                let marker = if entry.day == current_day { ">" } else { " " };
                println!(
                    "{}{:>4}  {:>12.2}  {:>10.2}  {:>12.2}  {:>7.1}  {:>12.2}",
                    marker,
                    entry.day,
                    entry.start_balance,
                    entry.daily_target_value,
                    entry.end_balance,
                    entry.trades_needed,
                    entry.accumulated_profit
                );
            }
            if roadmap.is_empty() {
                println!("(empty roadmap: target must exceed a positive initial balance)");
            } else if roadmap.is_truncated() {
                println!("(truncated at day {}: target not reached)", roadmap.len());
            }
        }
        Command::Status => {
            let status = plan.status().await;
            println!("Balance:          {:.2}", status.current_balance);
            println!(
                "Plan day:         {} of {} ({:.1}%)",
                status.current_plan_day, status.total_days, status.progress_pct
            );
            println!("Days remaining:   {}", status.days_remaining);
            if let Some(exit_target) = status.exit_target {
                println!("Close day at:     {:.2}", exit_target);
            }
            println!("To final target:  {:.2}", status.remaining_to_target);
            println!(
                "Today:            {:.2} (~{} wins{})",
                status.daily_goal,
                status.wins_needed_today,
                if status.over_trade_budget {
                    ", over trade budget"
                } else {
                    ""
                }
            );
            if let (Some(shift), Some(trend)) = (status.last_day_shift, status.last_trend) {
                println!("Last day:         {} ({:+} days)", trend, shift);
            }
            print_risk(status.current_balance, &status.risk);
        }
        Command::FinishDay { result, note } => {
            let trade = plan.finish_day(result, note).await?;
            print_trade(&trade);
        }
        Command::Edit { id, result } => {
            let trade = plan.edit_trade(&id, result).await?;
            print_trade(&trade);
        }
        Command::Delete { id } => {
            let removed = plan.delete_trade(&id).await?;
            println!("Deleted {}", removed.id);
            println!("Balance: {:.2}", plan.current_balance().await);
        }
        Command::History => {
            let trades = plan.trades().await;
            if trades.is_empty() {
                println!("No recorded days");
            }
            for trade in trades.iter().rev() {
                print_trade(trade);
            }
        }
        Command::Risk { balance } => {
            let balance = match balance {
                Some(b) => b,
                None => plan.current_balance().await,
            };
            let loss_amount = plan.config().await.loss_amount;
            print_risk(balance, &risk::assess(balance, loss_amount));
        }
        Command::Configure(args) => {
            let updated = args.apply(plan.config().await);
            plan.update_config(updated).await?;
            let config = plan.config().await;
            println!(
                "initial={:.2} target={:.2} win={:.2} loss={:.2} daily_pct={:.2} max_trades={}",
                config.initial_balance,
                config.target_balance,
                config.win_amount,
                config.loss_amount,
                config.daily_percentage,
                config
                    .max_trades_per_day
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
            for issue in config.issues() {
                println!("warning: {}", issue);
            }
        }
        Command::Reset => {
            let deleted = plan.reset_history().await?;
            println!("Deleted {} recorded days", deleted);
        }
    }

    if plan.is_dirty().await {
        plan.flush().await?;
    }
    Ok(())
}

fn print_trade(trade: &TradeRecord) {
    println!(
        "{}  {}  {:>+9.2}  {:>10.2} -> {:>10.2}  day {} -> {} ({:+}){}",
        trade.id,
        trade.timestamp.format("%Y-%m-%d %H:%M"),
        trade.result_value,
        trade.start_balance,
        trade.end_balance,
        trade.start_plan_day,
        trade.end_plan_day,
        trade.day_shift,
        trade
            .note
            .as_deref()
            .map(|n| format!("  {}", n))
            .unwrap_or_default()
    );
}

fn print_risk(balance: f64, analysis: &traderplan::RiskAnalysis) {
    println!(
        "Risk per trade:   {:.2}% of {:.2}{}",
        analysis.risk_percentage,
        balance,
        if analysis.is_high_risk { " (HIGH)" } else { "" }
    );
    println!("Losses to zero:   {}", analysis.max_consecutive_losses);
    println!("Stop loss (3%):   {:.2}", analysis.recommended_stop_loss);
}
