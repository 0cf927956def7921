mod build_retain;
mod capacity;
mod engine;
mod error;
mod graph;
mod portfolio;
mod ratio;
mod scenario;
mod sensitivity;
mod subscription;
mod types;

pub use build_retain::{build_hours_rollup, line_metrics, monthly_timeline, unit_economics};
pub use capacity::{base_capacity_hours, compute_capacity};
pub use engine::{EngineSnapshot, PortfolioEngine};
pub use error::EngineError;
pub use graph::{DependencyGraph, Node};
pub use portfolio::{aggregate, classify_status};
pub use ratio::{ratio, round_half_up};
pub use scenario::{
    CURRENT_SCENARIO_NAME, SCENARIO_PRESETS, ScenarioPreset, evaluate_mix, evaluate_scenarios,
    find_preset,
};
pub use sensitivity::{classify_cell, grid_bounds, mix_for_cell, sensitivity_grid};
pub use subscription::{average_tier_price, subscription_hours_rollup, subscription_metrics};
pub use types::{
    AssumptionSet, BuildHoursRollup, CapacityResult, Field, FieldValue, GridCell, GridStatus,
    Line, LineMetrics, Phase, PortfolioMetrics, PortfolioMix, PortfolioStatus, ScenarioKind,
    ScenarioResult, SensitivityGrid, SubscriptionHoursRollup, SubscriptionMetrics, Tier,
    TierMetrics, Timeline, TimelineMonth, UnitEconomics, UnitsPerClient,
};
