//! Urgency ranking for adjustment results.
//!
//! Rules:
//! - Base priority from a fixed parameter order (pH first)
//! - Bonus for the size of the deviation relative to the violated boundary
//! - Bonus for readings past a critical safety limit
//! - Clamped to 0..=10; in-range results always rank 0

use crate::{AdjustmentResult, Status};
use serde::{Deserialize, Serialize};

pub const MAX_PRIORITY: u8 = 10;

/// Bonus applied when a reading crosses a critical limit
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CriticalLimit {
    pub parameter_id: String,
    /// Fires when the reading is strictly below this value
    #[serde(default)]
    pub below: Option<f64>,
    /// Fires when the reading is strictly above this value
    #[serde(default)]
    pub above: Option<f64>,
    /// Restrict to these pool types (empty = every pool type)
    #[serde(default)]
    pub pool_types: Vec<String>,
    pub bonus: u8,
}

impl CriticalLimit {
    fn applies(&self, result: &AdjustmentResult) -> bool {
        if self.parameter_id != result.parameter_id {
            return false;
        }
        if !self.pool_types.is_empty() && !self.pool_types.contains(&result.pool_type) {
            return false;
        }
        self.below.is_some_and(|b| result.current < b)
            || self.above.is_some_and(|a| result.current > a)
    }
}

/// Bonus for deviations larger than `percent` of the violated boundary
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct MagnitudeTier {
    pub percent: f64,
    pub bonus: u8,
}

/// Data driving the ranker
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PriorityRules {
    /// Parameters in treatment order; position `i` gets base `10 - i`
    pub order: Vec<String>,
    /// Base for parameters outside `order`
    pub default_base: u8,
    /// Checked from the first entry; the first tier exceeded wins
    pub magnitude_tiers: Vec<MagnitudeTier>,
    pub critical_limits: Vec<CriticalLimit>,
}

impl Default for PriorityRules {
    fn default() -> Self {
        Self {
            order: [
                "ph",
                "total_alkalinity",
                "calcium_hardness",
                "cyanuric_acid",
                "free_chlorine",
                "total_chlorine",
                "salt",
                "total_bromine",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            default_base: 5,
            magnitude_tiers: vec![
                MagnitudeTier { percent: 50.0, bonus: 3 },
                MagnitudeTier { percent: 25.0, bonus: 2 },
                MagnitudeTier { percent: 10.0, bonus: 1 },
            ],
            critical_limits: vec![
                CriticalLimit {
                    parameter_id: "ph".into(),
                    below: Some(7.0),
                    above: Some(8.0),
                    pool_types: vec![],
                    bonus: 2,
                },
                CriticalLimit {
                    parameter_id: "free_chlorine".into(),
                    below: Some(0.5),
                    above: None,
                    pool_types: vec![],
                    bonus: 3,
                },
                CriticalLimit {
                    parameter_id: "total_bromine".into(),
                    below: Some(1.0),
                    above: None,
                    pool_types: vec!["bromine".into()],
                    bonus: 3,
                },
            ],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriorityRanker {
    rules: PriorityRules,
}

impl PriorityRanker {
    pub fn new(rules: PriorityRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &PriorityRules {
        &self.rules
    }

    /// Urgency of an adjustment, 0..=10
    pub fn rank(&self, result: &AdjustmentResult) -> u8 {
        let boundary = match result.status {
            Status::Ok => return 0,
            Status::Low => result.range.min,
            Status::High => result.range.max,
        };

        let base = self
            .rules
            .order
            .iter()
            .position(|id| *id == result.parameter_id)
            .map(|idx| i64::from(MAX_PRIORITY) - idx as i64)
            .unwrap_or_else(|| i64::from(self.rules.default_base));

        let percent = percent_deviation(result.current, boundary);
        let magnitude = self
            .rules
            .magnitude_tiers
            .iter()
            .find(|tier| percent > tier.percent)
            .map(|tier| i64::from(tier.bonus))
            .unwrap_or(0);

        let critical: i64 = self
            .rules
            .critical_limits
            .iter()
            .filter(|limit| limit.applies(result))
            .map(|limit| i64::from(limit.bonus))
            .sum();

        let priority = (base + magnitude + critical).clamp(0, i64::from(MAX_PRIORITY));

        tracing::trace!(
            parameter = %result.parameter_id,
            base,
            magnitude,
            critical,
            priority,
            "ranked adjustment"
        );

        priority as u8
    }
}

/// Distance from the boundary as a percentage of it; a zero boundary counts as 100%
fn percent_deviation(value: f64, boundary: f64) -> f64 {
    if boundary == 0.0 {
        100.0
    } else {
        ((value - boundary) / boundary).abs() * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IdealRange;

    fn result(parameter_id: &str, pool_type: &str, current: f64, range: IdealRange) -> AdjustmentResult {
        AdjustmentResult {
            parameter_id: parameter_id.into(),
            pool_type: pool_type.into(),
            status: range.status_of(current),
            current,
            range,
            deviation: range.deviation(current),
            candidates: vec![],
            warnings: vec![],
            recommendation: String::new(),
            instructions: vec![],
            priority: 0,
        }
    }

    #[test]
    fn test_ok_ranks_zero() {
        let ranker = PriorityRanker::default();
        let r = result("ph", "chlorine", 7.5, IdealRange::new(7.4, 7.6));
        assert_eq!(ranker.rank(&r), 0);
    }

    #[test]
    fn test_ph_outranks_salt_at_equal_relative_deviation() {
        let ranker = PriorityRanker::default();
        // Both 20% above their upper boundary
        let ph = result("ph", "saltwater", 7.6 * 1.2, IdealRange::new(7.4, 7.6));
        let salt = result("salt", "saltwater", 3500.0 * 1.2, IdealRange::new(2500.0, 3500.0));

        assert!(ranker.rank(&ph) >= ranker.rank(&salt));
        assert_eq!(ranker.rank(&salt), 5);
    }

    #[test]
    fn test_magnitude_tiers() {
        let ranker = PriorityRanker::default();
        let range = IdealRange::new(200.0, 400.0);

        // Base for calcium hardness is 8
        assert_eq!(ranker.rank(&result("calcium_hardness", "chlorine", 190.0, range)), 8);
        assert_eq!(ranker.rank(&result("calcium_hardness", "chlorine", 170.0, range)), 9);
        assert_eq!(ranker.rank(&result("calcium_hardness", "chlorine", 140.0, range)), 10);
        assert_eq!(ranker.rank(&result("calcium_hardness", "chlorine", 90.0, range)), 10);
    }

    #[test]
    fn test_unlisted_parameter_uses_default_base() {
        let ranker = PriorityRanker::default();
        let r = result("temperature", "chlorine", 86.0, IdealRange::new(75.0, 85.0));
        assert_eq!(ranker.rank(&r), 5);
    }

    #[test]
    fn test_critical_sanitizer_floor() {
        let ranker = PriorityRanker::default();
        let range = IdealRange::new(1.0, 3.0);

        // free_chlorine base 6, 100% deviation +3, below 0.5 +3, clamped
        assert_eq!(ranker.rank(&result("free_chlorine", "chlorine", 0.0, range)), 10);
        // 0.8 is 20% low: base 6 + 1
        assert_eq!(ranker.rank(&result("free_chlorine", "chlorine", 0.8, range)), 7);
    }

    #[test]
    fn test_bromine_floor_only_in_bromine_pools() {
        let rules = PriorityRules {
            magnitude_tiers: vec![],
            ..PriorityRules::default()
        };
        let ranker = PriorityRanker::new(rules);
        let range = IdealRange::new(3.0, 5.0);

        // total_bromine base 3
        assert_eq!(ranker.rank(&result("total_bromine", "bromine", 0.5, range)), 6);
        assert_eq!(ranker.rank(&result("total_bromine", "chlorine", 0.5, range)), 3);
    }

    #[test]
    fn test_zero_boundary_counts_as_full_deviation() {
        let ranker = PriorityRanker::default();
        // Bromine pool free chlorine range is 0-0; base 6 + 3
        let r = result("free_chlorine", "bromine", 0.6, IdealRange::new(0.0, 0.0));
        assert_eq!(ranker.rank(&r), 9);
    }
}
