//! Dosing sequence planning.
//!
//! Turns ranked adjustments into an ordered list of additions with relative
//! hour offsets. The plan never reads the clock; callers map offsets onto
//! wall-clock time.

use crate::compatibility::IncompatibilityIndex;
use crate::types::*;
use std::collections::HashMap;

pub const DEFAULT_WAIT_HOURS: u32 = 4;

/// Longest wait a config file may set for one product (30 days)
pub const MAX_WAIT_HOURS: u32 = 720;

/// Built-in wait times per product, in hours
pub fn default_wait_table() -> HashMap<String, u32> {
    [
        ("liquid_chlorine", 4),
        ("chlorine_tablets", 4),
        ("chlorine_granules", 4),
        ("calcium_hypochlorite", 4),
        ("non_chlorine_shock", 1),
        ("muriatic_acid", 4),
        ("ph_decreaser", 4),
        ("ph_increaser", 4),
        ("alkalinity_increaser", 6),
        ("calcium_increaser", 6),
        ("cyanuric_acid", 24),
        ("salt", 24),
        ("bromine_tablets", 4),
        (NATURAL_DISSIPATION_ID, 0),
        (PARTIAL_DRAIN_ID, 0),
    ]
    .into_iter()
    .map(|(id, hours)| (id.to_string(), hours))
    .collect()
}

#[derive(Clone, Debug)]
pub struct SequencePlanner {
    incompatibilities: IncompatibilityIndex,
    wait_hours: HashMap<String, u32>,
    default_wait_hours: u32,
}

impl SequencePlanner {
    pub fn new(incompatibilities: IncompatibilityIndex) -> Self {
        Self {
            incompatibilities,
            wait_hours: default_wait_table(),
            default_wait_hours: DEFAULT_WAIT_HOURS,
        }
    }

    /// Merge per-product overrides over the current table
    pub fn with_wait_hours(mut self, overrides: &HashMap<String, u32>) -> Self {
        self.wait_hours
            .extend(overrides.iter().map(|(k, v)| (k.clone(), *v)));
        self
    }

    pub fn with_default_wait_hours(mut self, hours: u32) -> Self {
        self.default_wait_hours = hours;
        self
    }

    pub fn wait_hours_for(&self, product_id: &str) -> u32 {
        self.wait_hours
            .get(product_id)
            .copied()
            .unwrap_or(self.default_wait_hours)
    }

    /// Build the addition sequence.
    ///
    /// Out-of-range results are taken by descending priority (ties keep
    /// catalog order) and every candidate becomes a step. Each step starts
    /// when the previous step's wait has elapsed, and no earlier than the
    /// larger of both waits after any earlier incompatible step.
    pub fn plan(&self, adjustments: &Adjustments) -> SequencePlan {
        let mut pending: Vec<&AdjustmentResult> = adjustments.out_of_range().collect();
        pending.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut steps: Vec<SequenceStep> = Vec::new();
        for result in pending {
            for candidate in &result.candidates {
                let wait_hours = self.wait_hours_for(&candidate.product_id);

                let mut offset_hours = steps
                    .last()
                    .map(|prev| prev.offset_hours.saturating_add(prev.wait_hours))
                    .unwrap_or(0);
                for earlier in &steps {
                    if self
                        .incompatibilities
                        .are_incompatible(&earlier.product_id, &candidate.product_id)
                    {
                        let gap = earlier.wait_hours.max(wait_hours);
                        offset_hours = offset_hours.max(earlier.offset_hours.saturating_add(gap));
                    }
                }

                tracing::debug!(
                    "Step {}: {} for {} at +{}h (wait {}h)",
                    steps.len() + 1,
                    candidate.product_id,
                    result.parameter_id,
                    offset_hours,
                    wait_hours
                );

                steps.push(SequenceStep {
                    offset_hours,
                    parameter_id: result.parameter_id.clone(),
                    action: candidate.action,
                    product_id: candidate.product_id.clone(),
                    product_name: candidate.name.clone(),
                    amount: candidate.amount,
                    unit: candidate.unit.clone(),
                    application: candidate.application.clone(),
                    safety: candidate.safety.clone(),
                    wait_hours,
                });
            }
        }

        SequencePlan::new(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::AdjustmentCalculator;
    use crate::catalog::{default_catalog, default_product_catalog};

    fn planner() -> SequencePlanner {
        SequencePlanner::new(default_product_catalog().incompatibilities().clone())
    }

    fn analyze(pool_type: &str, pairs: &[(&str, f64)]) -> Adjustments {
        let readings: Readings = pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        AdjustmentCalculator::new(default_catalog())
            .calculate(pool_type, 10_000.0, &readings)
            .unwrap()
    }

    fn assert_plan_invariants(planner: &SequencePlanner, plan: &SequencePlan) {
        let index = default_product_catalog().incompatibilities();
        let steps = plan.steps();

        for pair in steps.windows(2) {
            assert!(pair[0].offset_hours <= pair[1].offset_hours);
        }
        for (i, a) in steps.iter().enumerate() {
            for b in &steps[i + 1..] {
                if index.are_incompatible(&a.product_id, &b.product_id) {
                    let gap = b.offset_hours - a.offset_hours;
                    let required = planner
                        .wait_hours_for(&a.product_id)
                        .max(planner.wait_hours_for(&b.product_id));
                    assert!(
                        gap >= required,
                        "{} -> {} gap {} < {}",
                        a.product_id,
                        b.product_id,
                        gap,
                        required
                    );
                }
            }
        }
    }

    #[test]
    fn test_empty_when_everything_in_range() {
        let adjustments = analyze("chlorine", &[("ph", 7.5), ("free_chlorine", 2.0)]);
        let plan = planner().plan(&adjustments);
        assert!(plan.is_empty());
        assert_eq!(plan.total_hours(), 0);
    }

    #[test]
    fn test_highest_priority_goes_first() {
        let adjustments = analyze("chlorine", &[("calcium_hardness", 150.0), ("ph", 6.8)]);
        let plan = planner().plan(&adjustments);

        assert_eq!(plan.steps()[0].parameter_id, "ph");
        assert_eq!(plan.steps()[0].offset_hours, 0);
        assert_eq!(plan.steps()[1].parameter_id, "calcium_hardness");
        assert_eq!(plan.steps()[1].offset_hours, 4);
    }

    #[test]
    fn test_offsets_accumulate_waits() {
        let adjustments = analyze("chlorine", &[("total_alkalinity", 60.0), ("cyanuric_acid", 20.0)]);
        let plan = planner().plan(&adjustments);

        let offsets: Vec<_> = plan.iter().map(|s| (s.product_id.as_str(), s.offset_hours)).collect();
        // Alkalinity ranks above stabilizer; stabilizer products follow in catalog order
        assert_eq!(
            offsets,
            vec![
                ("alkalinity_increaser", 0),
                ("chlorine_tablets", 6),
                ("chlorine_granules", 10),
                ("cyanuric_acid", 14),
            ]
        );
        assert_eq!(plan.total_hours(), 38);
    }

    #[test]
    fn test_incompatible_products_are_separated() {
        let adjustments = analyze(
            "chlorine",
            &[("ph", 8.4), ("free_chlorine", 0.2), ("total_alkalinity", 200.0)],
        );
        let planner = planner();
        let plan = planner.plan(&adjustments);

        assert!(plan.iter().any(|s| s.product_id == "muriatic_acid"));
        assert!(plan.iter().any(|s| s.product_id == "liquid_chlorine"));
        assert_plan_invariants(&planner, &plan);
    }

    #[test]
    fn test_custom_waits_still_separate_incompatible_products() {
        let overrides = HashMap::from([
            ("muriatic_acid".to_string(), 0),
            ("ph_decreaser".to_string(), 0),
            ("liquid_chlorine".to_string(), 12),
        ]);
        let planner = planner().with_wait_hours(&overrides);
        let adjustments = analyze("chlorine", &[("ph", 8.4), ("free_chlorine", 0.2)]);
        let plan = planner.plan(&adjustments);

        assert_plan_invariants(&planner, &plan);
    }

    #[test]
    fn test_non_chemical_actions_are_scheduled() {
        let adjustments = analyze("saltwater", &[("salt", 4200.0), ("free_chlorine", 6.0)]);
        let plan = planner().plan(&adjustments);

        let actions: Vec<_> = plan.iter().map(|s| s.action).collect();
        assert!(actions.contains(&ActionKind::NaturalDissipation));
        assert!(actions.contains(&ActionKind::PartialDrain));
        assert_eq!(plan.total_hours(), 0);
    }

    #[test]
    fn test_unknown_product_uses_default_wait() {
        let planner = planner().with_default_wait_hours(3);
        assert_eq!(planner.wait_hours_for("mystery_powder"), 3);
        assert_eq!(planner.wait_hours_for("salt"), 24);
    }

    #[test]
    fn test_huge_waits_saturate_instead_of_overflowing() {
        let overrides = HashMap::from([("ph_increaser".to_string(), u32::MAX)]);
        let planner = planner().with_wait_hours(&overrides);
        let adjustments = analyze("chlorine", &[("ph", 7.0), ("calcium_hardness", 100.0)]);
        let plan = planner.plan(&adjustments);

        assert_eq!(plan.steps()[0].product_id, "ph_increaser");
        assert_eq!(plan.steps()[1].offset_hours, u32::MAX);
        assert_eq!(plan.total_hours(), u32::MAX);
        for pair in plan.steps().windows(2) {
            assert!(pair[0].offset_hours <= pair[1].offset_hours);
        }
    }
}
