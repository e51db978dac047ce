//! Core domain types for pool water chemistry.
//!
//! This module defines the data that flows through the engine:
//! - Parameters, ideal ranges and per-status guidance
//! - Chemical products and dose rates
//! - Adjustment results, dosing candidates and warnings
//! - Sequence steps and water-balance results

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Caller-supplied measurements, keyed by parameter id.
pub type Readings = HashMap<String, f64>;

/// Product id used for the "let it dissipate" non-chemical action
pub const NATURAL_DISSIPATION_ID: &str = "natural_dissipation";

/// Product id used for the "partial drain and refill" non-chemical action
pub const PARTIAL_DRAIN_ID: &str = "partial_drain";

// ============================================================================
// Ranges and Status
// ============================================================================

/// Where a reading sits relative to its ideal range
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Low,
    High,
    Ok,
}

/// Inclusive ideal window for a parameter
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct IdealRange {
    pub min: f64,
    pub max: f64,
}

impl IdealRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Classify a value against this range (both bounds inclusive)
    pub fn status_of(&self, value: f64) -> Status {
        if value < self.min {
            Status::Low
        } else if value > self.max {
            Status::High
        } else {
            Status::Ok
        }
    }

    /// Signed distance from the nearest boundary.
    ///
    /// Negative when below `min`, positive when above `max`, zero inside.
    pub fn deviation(&self, value: f64) -> f64 {
        match self.status_of(value) {
            Status::Low => value - self.min,
            Status::High => value - self.max,
            Status::Ok => 0.0,
        }
    }

    /// The boundary a value violates, if any
    pub fn violated_boundary(&self, value: f64) -> Option<f64> {
        match self.status_of(value) {
            Status::Low => Some(self.min),
            Status::High => Some(self.max),
            Status::Ok => None,
        }
    }
}

// ============================================================================
// Warnings and Guidance
// ============================================================================

/// Warning severity, in ascending order
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Routine information about the out-of-range condition
    Advisory,
    /// Risk to equipment, surfaces or sanitizer effectiveness
    Caution,
    /// Unsafe to use the pool until corrected
    Hazard,
}

/// A catalog rule that produces a warning for an out-of-range reading.
///
/// `threshold` is compared against the reading in the direction of the
/// status it is attached to: low rules fire below it, high rules above it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WarningRule {
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub threshold: Option<f64>,
    /// Restrict the rule to these pool types (empty = every pool type)
    #[serde(default)]
    pub pool_types: Vec<String>,
}

/// Recommendation, instructions and warning rules for one out-of-range side
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct StatusGuidance {
    pub recommendation: String,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<WarningRule>,
}

/// Per-status guidance for a parameter
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct Guidance {
    pub low: StatusGuidance,
    pub high: StatusGuidance,
    pub in_range: String,
}

impl Guidance {
    /// Guidance for an out-of-range status; `None` for `Status::Ok`
    pub fn for_status(&self, status: Status) -> Option<&StatusGuidance> {
        match status {
            Status::Low => Some(&self.low),
            Status::High => Some(&self.high),
            Status::Ok => None,
        }
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// Amount of product needed per unit of parameter change.
///
/// Reads as "`amount` product units per `per_change` parameter units per
/// `reference_volume` gallons".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DoseRate {
    pub amount: f64,
    pub per_change: f64,
    pub reference_volume: f64,
    /// Divide by product concentration (available-sanitizer formulas)
    #[serde(default)]
    pub concentration_adjusted: bool,
    /// Largest change that should be made in a single treatment
    #[serde(default)]
    pub max_change_per_treatment: Option<f64>,
}

impl DoseRate {
    /// Product amount before concentration and tablet conversion
    pub fn base_amount(&self, change: f64, pool_volume: f64) -> f64 {
        (change / self.per_change) * (pool_volume / self.reference_volume) * self.amount
    }
}

/// Non-chemical remedy for a parameter that has no lowering product
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HighFallback {
    /// Stop adding the chemical and let pump and sunlight bring it down
    NaturalDissipation { steps: Vec<String> },
    /// Replace a fraction of the water
    PartialDrain { steps: Vec<String> },
}

/// A measurable water parameter
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    pub id: String,
    pub name: String,
    pub unit: String,
    /// Range used when the pool type has no override
    pub range: IdealRange,
    #[serde(default)]
    pub pool_ranges: HashMap<String, IdealRange>,
    #[serde(default)]
    pub raise: Option<DoseRate>,
    #[serde(default)]
    pub lower: Option<DoseRate>,
    #[serde(default)]
    pub high_fallback: Option<HighFallback>,
    #[serde(default)]
    pub guidance: Guidance,
}

impl Parameter {
    /// Ideal range for a pool type, falling back to the default range
    pub fn range_for(&self, pool_type: &str) -> IdealRange {
        self.pool_ranges
            .get(pool_type)
            .copied()
            .unwrap_or(self.range)
    }
}

// ============================================================================
// Products
// ============================================================================

/// Unit a product is dosed in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DoseUnit {
    Pound,
    Ounce,
    Gallon,
    Quart,
    Tablet,
}

impl fmt::Display for DoseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DoseUnit::Pound => "pound",
            DoseUnit::Ounce => "ounce",
            DoseUnit::Gallon => "gallon",
            DoseUnit::Quart => "quart",
            DoseUnit::Tablet => "tablet",
        };
        f.write_str(s)
    }
}

/// A chemical product that can be added to the pool
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Active fraction, 0 < concentration <= 1
    pub concentration: f64,
    pub unit: DoseUnit,
    #[serde(default)]
    pub tablet_weight_oz: Option<f64>,
    #[serde(default)]
    pub raises: Vec<String>,
    #[serde(default)]
    pub lowers: Vec<String>,
    #[serde(default)]
    pub safety: Vec<String>,
    #[serde(default)]
    pub application: Vec<String>,
    #[serde(default)]
    pub incompatible_with: Vec<String>,
}

// ============================================================================
// Adjustment Results
// ============================================================================

/// What a dosing candidate asks the operator to do
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Chemical,
    NaturalDissipation,
    PartialDrain,
}

/// One way of correcting an out-of-range parameter
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DoseCandidate {
    pub action: ActionKind,
    pub product_id: String,
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub safety: Vec<String>,
    pub application: Vec<String>,
}

/// A rendered warning
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Warning {
    pub severity: Severity,
    pub message: String,
}

/// Evaluation of a single parameter reading
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AdjustmentResult {
    pub parameter_id: String,
    pub pool_type: String,
    pub status: Status,
    pub current: f64,
    pub range: IdealRange,
    /// Signed distance to the violated boundary, 0 when in range
    pub deviation: f64,
    pub candidates: Vec<DoseCandidate>,
    pub warnings: Vec<Warning>,
    pub recommendation: String,
    pub instructions: Vec<String>,
    /// Urgency, 0..=10
    pub priority: u8,
}

impl AdjustmentResult {
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Highest warning severity, if any warning was raised
    pub fn max_severity(&self) -> Option<Severity> {
        self.warnings.iter().map(|w| w.severity).max()
    }
}

/// Adjustment results in parameter-catalog declaration order
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct Adjustments {
    results: Vec<AdjustmentResult>,
}

impl Adjustments {
    pub fn new(results: Vec<AdjustmentResult>) -> Self {
        Self { results }
    }

    pub fn get(&self, parameter_id: &str) -> Option<&AdjustmentResult> {
        self.results.iter().find(|r| r.parameter_id == parameter_id)
    }

    pub fn contains_key(&self, parameter_id: &str) -> bool {
        self.get(parameter_id).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AdjustmentResult> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results that need correcting
    pub fn out_of_range(&self) -> impl Iterator<Item = &AdjustmentResult> {
        self.results.iter().filter(|r| !r.is_ok())
    }
}

impl<'a> IntoIterator for &'a Adjustments {
    type Item = &'a AdjustmentResult;
    type IntoIter = std::slice::Iter<'a, AdjustmentResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

// ============================================================================
// Sequence Plan
// ============================================================================

/// One timed addition in a dosing plan
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SequenceStep {
    /// Hours from plan start
    pub offset_hours: u32,
    pub parameter_id: String,
    pub action: ActionKind,
    pub product_id: String,
    pub product_name: String,
    pub amount: f64,
    pub unit: String,
    pub application: Vec<String>,
    pub safety: Vec<String>,
    /// Hours to wait before the next addition
    pub wait_hours: u32,
}

/// Ordered dosing plan, offsets relative to plan start
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct SequencePlan {
    steps: Vec<SequenceStep>,
}

impl SequencePlan {
    pub fn new(steps: Vec<SequenceStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[SequenceStep] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SequenceStep> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Hours until the last step's wait has elapsed
    pub fn total_hours(&self) -> u32 {
        self.steps
            .last()
            .map(|s| s.offset_hours.saturating_add(s.wait_hours))
            .unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a SequencePlan {
    type Item = &'a SequenceStep;
    type IntoIter = std::slice::Iter<'a, SequenceStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

// ============================================================================
// Water Balance
// ============================================================================

/// Corrosion/scaling tendency derived from the LSI
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WaterBalanceStatus {
    Corrosive,
    Balanced,
    Scaling,
}

impl fmt::Display for WaterBalanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WaterBalanceStatus::Corrosive => "Corrosive",
            WaterBalanceStatus::Balanced => "Balanced",
            WaterBalanceStatus::Scaling => "Scaling",
        };
        f.write_str(s)
    }
}

/// Inputs to the LSI calculation
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct WaterSample {
    pub ph: f64,
    pub alkalinity: f64,
    pub calcium_hardness: f64,
    pub temperature_f: f64,
    /// Total dissolved solids in ppm
    #[serde(default)]
    pub tds: Option<f64>,
}

/// Individual LSI terms, kept for traceability
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct LsiFactors {
    pub ph: f64,
    pub temperature_factor: f64,
    pub calcium_factor: f64,
    pub alkalinity_factor: f64,
    pub tds_factor: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WaterBalanceResult {
    /// Langelier Saturation Index, rounded to 2 decimals
    pub lsi: f64,
    pub status: WaterBalanceStatus,
    pub recommendation: String,
    pub factors: LsiFactors,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_status_is_inclusive() {
        let range = IdealRange::new(7.4, 7.6);
        assert_eq!(range.status_of(7.4), Status::Ok);
        assert_eq!(range.status_of(7.6), Status::Ok);
        assert_eq!(range.status_of(7.3), Status::Low);
        assert_eq!(range.status_of(7.7), Status::High);
    }

    #[test]
    fn test_deviation_is_signed_distance_to_boundary() {
        let range = IdealRange::new(80.0, 120.0);
        assert_eq!(range.deviation(60.0), -20.0);
        assert_eq!(range.deviation(150.0), 30.0);
        assert_eq!(range.deviation(100.0), 0.0);
        assert_eq!(range.violated_boundary(60.0), Some(80.0));
        assert_eq!(range.violated_boundary(100.0), None);
    }

    #[test]
    fn test_guidance_has_nothing_for_ok() {
        let guidance = Guidance::default();
        assert!(guidance.for_status(Status::Ok).is_none());
        assert!(guidance.for_status(Status::Low).is_some());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Hazard > Severity::Caution);
        assert!(Severity::Caution > Severity::Advisory);
    }

    #[test]
    fn test_dose_rate_scales_with_volume() {
        let rate = DoseRate {
            amount: 1.5,
            per_change: 10.0,
            reference_volume: 10_000.0,
            concentration_adjusted: false,
            max_change_per_treatment: None,
        };
        assert_eq!(rate.base_amount(20.0, 10_000.0), 3.0);
        assert_eq!(rate.base_amount(20.0, 20_000.0), 6.0);
    }
}
