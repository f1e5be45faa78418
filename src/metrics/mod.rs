//! Build metrics - performance aggregation and cost estimation

pub mod cost;
pub mod performance;

pub use cost::{
    budget_status, estimate_cost, estimate_cost_with, BudgetState, BudgetStatus, CostEstimate,
    CostMode, CostPlaceholders, CostShare, PlaceholderLine,
};
pub use performance::{
    compute_build_metrics, compute_metrics, gear_ratio, BuildMetrics, PerformanceOptions,
    PerformanceTier, TierProfile, DEFAULT_BASE_KART_WEIGHT_LBS,
};
