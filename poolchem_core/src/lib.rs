#![forbid(unsafe_code)]

//! Core chemistry engine for the poolchem system.
//!
//! This crate provides:
//! - Domain types (parameters, products, adjustments, plans)
//! - Parameter and product catalogs
//! - Adjustment calculation and priority ranking
//! - Compatibility checks and dosing sequence planning
//! - Water balance (LSI) evaluation

pub mod types;
pub mod error;
pub mod catalog;
pub mod compatibility;
pub mod calculator;
pub mod priority;
pub mod planner;
pub mod balance;
pub mod config;
pub mod logging;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{
    build_default_catalog, default_catalog, default_parameter_catalog, default_product_catalog, Catalog,
    ParameterCatalog, ProductCatalog,
};
pub use compatibility::IncompatibilityIndex;
pub use calculator::AdjustmentCalculator;
pub use priority::{PriorityRanker, PriorityRules};
pub use planner::SequencePlanner;
pub use balance::{InvalidInputPolicy, WaterBalanceEvaluator};
pub use config::Config;
pub use engine::{
    build_sequence_plan, calculate_adjustments, check_compatibility, evaluate_water_balance,
    load_readings, rank_priority, PoolAnalysis, PoolAnalyzer,
};
