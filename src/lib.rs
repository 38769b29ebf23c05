//! TraderPlan Library
//!
//! Compounding growth planner: projects a daily roadmap to a target balance,
//! locates the plan day of any balance, and replays the trade history against it.

pub mod config;
pub mod error;
pub mod persistence;
pub mod plan;
pub mod projection;
pub mod reconcile;
pub mod risk;
pub mod types;

pub use error::{PlanError, PlanResult};
pub use plan::{PlanController, PlanStatus};
pub use projection::{locate, project, Roadmap, DAY_CAP};
pub use reconcile::{reconcile, Reconciliation};
pub use risk::assess;
pub use types::{PlanConfig, ProjectionEntry, RiskAnalysis, TradeRecord};
