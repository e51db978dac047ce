//! Pool analysis engine.
//!
//! `PoolAnalyzer` wires the catalogs, ranker, planner and water-balance
//! evaluator together. The free functions at the bottom of this module run
//! against a shared analyzer built from the default catalog.

use crate::balance::{WaterBalanceEvaluator, DEFAULT_TEMPERATURE_F};
use crate::calculator::{AdjustmentCalculator, DEFAULT_DRAIN_FRACTION};
use crate::catalog::{default_catalog, Catalog};
use crate::planner::SequencePlanner;
use crate::priority::{PriorityRanker, PriorityRules};
use crate::types::*;
use crate::{Config, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

static DEFAULT_ANALYZER: Lazy<PoolAnalyzer> =
    Lazy::new(|| PoolAnalyzer::new(Arc::new(default_catalog().clone())));

/// Everything computed for one set of readings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PoolAnalysis {
    pub pool_type: String,
    pub pool_volume: f64,
    pub adjustments: Adjustments,
    pub plan: SequencePlan,
    /// Present when pH, alkalinity and hardness were all measured and usable
    pub water_balance: Option<WaterBalanceResult>,
}

#[derive(Clone, Debug)]
pub struct PoolAnalyzer {
    catalog: Arc<Catalog>,
    ranker: PriorityRanker,
    planner: SequencePlanner,
    evaluator: WaterBalanceEvaluator,
    drain_fraction: f64,
    default_temperature_f: f64,
}

impl PoolAnalyzer {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let planner = SequencePlanner::new(catalog.products().incompatibilities().clone());
        Self {
            catalog,
            ranker: PriorityRanker::default(),
            planner,
            evaluator: WaterBalanceEvaluator::default(),
            drain_fraction: DEFAULT_DRAIN_FRACTION,
            default_temperature_f: DEFAULT_TEMPERATURE_F,
        }
    }

    /// Build an analyzer from configuration, loading external catalogs if configured
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let catalog = match (&config.catalog.parameters_path, &config.catalog.products_path) {
            (None, None) => default_catalog().clone(),
            (parameters, products) => Catalog::load(parameters.as_deref(), products.as_deref())?,
        };

        let mut analyzer = Self::new(Arc::new(catalog));
        analyzer.planner = analyzer
            .planner
            .with_default_wait_hours(config.dosing.default_wait_hours)
            .with_wait_hours(&config.dosing.wait_hours);
        analyzer.evaluator = WaterBalanceEvaluator::new(config.balance.invalid_input);
        analyzer.drain_fraction = config.dosing.drain_fraction;
        analyzer.default_temperature_f = config.balance.default_temperature_f;
        Ok(analyzer)
    }

    pub fn with_priority_rules(mut self, rules: PriorityRules) -> Self {
        self.ranker = PriorityRanker::new(rules);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn planner(&self) -> &SequencePlanner {
        &self.planner
    }

    pub fn evaluator(&self) -> &WaterBalanceEvaluator {
        &self.evaluator
    }

    fn calculator(&self) -> AdjustmentCalculator<'_> {
        AdjustmentCalculator::new(&self.catalog)
            .with_ranker(self.ranker.clone())
            .with_drain_fraction(self.drain_fraction)
    }

    pub fn calculate_adjustments(
        &self,
        pool_type: &str,
        pool_volume: f64,
        readings: &Readings,
    ) -> Result<Adjustments> {
        self.calculator().calculate(pool_type, pool_volume, readings)
    }

    pub fn rank_priority(&self, result: &AdjustmentResult) -> u8 {
        self.ranker.rank(result)
    }

    pub fn check_compatibility<S: AsRef<str>>(&self, product_ids: &[S]) -> BTreeMap<String, Vec<String>> {
        self.catalog.products().incompatibilities().check(product_ids)
    }

    pub fn build_sequence_plan(&self, adjustments: &Adjustments) -> SequencePlan {
        self.planner.plan(adjustments)
    }

    pub fn evaluate_water_balance(
        &self,
        ph: f64,
        alkalinity: f64,
        calcium_hardness: f64,
        temperature_f: Option<f64>,
    ) -> Result<WaterBalanceResult> {
        self.evaluator.evaluate(
            ph,
            alkalinity,
            calcium_hardness,
            temperature_f.unwrap_or(self.default_temperature_f),
        )
    }

    /// Adjustments, dosing plan and, when possible, water balance in one pass
    pub fn analyze(&self, pool_type: &str, pool_volume: f64, readings: &Readings) -> Result<PoolAnalysis> {
        let adjustments = self.calculate_adjustments(pool_type, pool_volume, readings)?;
        let plan = self.build_sequence_plan(&adjustments);

        let water_balance = match (
            readings.get("ph"),
            readings.get("total_alkalinity"),
            readings.get("calcium_hardness"),
        ) {
            (Some(&ph), Some(&alkalinity), Some(&hardness)) => match self.evaluate_water_balance(
                ph,
                alkalinity,
                hardness,
                readings.get("temperature").copied(),
            ) {
                Ok(balance) => Some(balance),
                Err(e) => {
                    tracing::warn!("Skipping water balance: {}", e);
                    None
                }
            },
            _ => {
                tracing::debug!("Skipping water balance: pH, alkalinity or hardness not measured");
                None
            }
        };

        tracing::info!(
            "Analyzed {} readings: {} out of range, {} plan steps",
            readings.len(),
            adjustments.out_of_range().count(),
            plan.len()
        );

        Ok(PoolAnalysis {
            pool_type: pool_type.to_string(),
            pool_volume,
            adjustments,
            plan,
            water_balance,
        })
    }
}

// ============================================================================
// Default-catalog entry points
// ============================================================================

/// Read a flat `parameter = value` map from a JSON or TOML file
pub fn load_readings(path: &Path) -> Result<Readings> {
    crate::catalog::read_data_file(path)
}

pub fn default_analyzer() -> &'static PoolAnalyzer {
    &DEFAULT_ANALYZER
}

/// Fails with `Error::Configuration` for an unknown pool type and
/// `Error::Validation` for a non-positive volume
pub fn calculate_adjustments(pool_type: &str, pool_volume: f64, readings: &Readings) -> Result<Adjustments> {
    DEFAULT_ANALYZER.calculate_adjustments(pool_type, pool_volume, readings)
}

pub fn rank_priority(result: &AdjustmentResult) -> u8 {
    DEFAULT_ANALYZER.rank_priority(result)
}

pub fn check_compatibility<S: AsRef<str>>(product_ids: &[S]) -> BTreeMap<String, Vec<String>> {
    DEFAULT_ANALYZER.check_compatibility(product_ids)
}

pub fn build_sequence_plan(adjustments: &Adjustments) -> SequencePlan {
    DEFAULT_ANALYZER.build_sequence_plan(adjustments)
}

/// LSI at the given temperature, 78°F when `None`
pub fn evaluate_water_balance(
    ph: f64,
    alkalinity: f64,
    calcium_hardness: f64,
    temperature_f: Option<f64>,
) -> Result<WaterBalanceResult> {
    DEFAULT_ANALYZER.evaluate_water_balance(ph, alkalinity, calcium_hardness, temperature_f)
}
