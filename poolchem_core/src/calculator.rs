//! Adjustment calculation.
//!
//! Compares each reading against its ideal range for the pool type and, for
//! out-of-range readings, lists every product (or non-chemical action) that
//! corrects it together with the amount needed, rendered guidance and
//! warnings. Calculation is a pure function of the readings and the catalog.

use crate::priority::PriorityRanker;
use crate::types::*;
use crate::{Catalog, Error, Result};

/// Fraction of the pool replaced by a partial drain
pub const DEFAULT_DRAIN_FRACTION: f64 = 0.25;

const OUNCES_PER_POUND: f64 = 16.0;

#[derive(Clone, Debug)]
pub struct AdjustmentCalculator<'c> {
    catalog: &'c Catalog,
    ranker: PriorityRanker,
    drain_fraction: f64,
}

impl<'c> AdjustmentCalculator<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            ranker: PriorityRanker::default(),
            drain_fraction: DEFAULT_DRAIN_FRACTION,
        }
    }

    pub fn with_ranker(mut self, ranker: PriorityRanker) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn with_drain_fraction(mut self, drain_fraction: f64) -> Self {
        self.drain_fraction = drain_fraction;
        self
    }

    /// Evaluate every catalogued parameter present in `readings`.
    ///
    /// Results come back in catalog declaration order. Parameters without a
    /// reading are skipped, so partial test-strip data yields partial results.
    pub fn calculate(
        &self,
        pool_type: &str,
        pool_volume: f64,
        readings: &Readings,
    ) -> Result<Adjustments> {
        if !pool_volume.is_finite() || pool_volume <= 0.0 {
            return Err(Error::validation(format!(
                "Pool volume must be positive, got {}",
                pool_volume
            )));
        }
        if !self.catalog.parameters().has_pool_type(pool_type) {
            return Err(Error::configuration(format!(
                "Unknown pool type '{}' (known: {})",
                pool_type,
                self.catalog.parameters().pool_types().join(", ")
            )));
        }

        for key in readings.keys() {
            if self.catalog.parameters().get(key).is_none() {
                tracing::warn!("Ignoring reading for unknown parameter '{}'", key);
            }
        }

        let mut results = Vec::new();
        for parameter in self.catalog.parameters().iter() {
            let Some(&value) = readings.get(&parameter.id) else {
                tracing::debug!("No reading for {}, skipping", parameter.id);
                continue;
            };
            if !value.is_finite() {
                return Err(Error::validation(format!(
                    "Reading for '{}' is not a finite number",
                    parameter.id
                )));
            }
            results.push(self.evaluate(parameter, pool_type, pool_volume, value));
        }

        Ok(Adjustments::new(results))
    }

    /// Evaluate a single reading. Inputs are assumed validated.
    pub fn evaluate(
        &self,
        parameter: &Parameter,
        pool_type: &str,
        pool_volume: f64,
        value: f64,
    ) -> AdjustmentResult {
        let range = parameter.range_for(pool_type);
        let status = range.status_of(value);
        let deviation = range.deviation(value);
        let render = |template: &str| render_template(template, value, &parameter.unit, &range);

        let mut result = AdjustmentResult {
            parameter_id: parameter.id.clone(),
            pool_type: pool_type.to_string(),
            status,
            current: value,
            range,
            deviation,
            candidates: vec![],
            warnings: vec![],
            recommendation: String::new(),
            instructions: vec![],
            priority: 0,
        };

        let Some(guidance) = parameter.guidance.for_status(status) else {
            result.recommendation = render(&parameter.guidance.in_range);
            tracing::debug!("{} = {} is in range", parameter.id, value);
            return result;
        };

        result.recommendation = render(&guidance.recommendation);
        result.instructions = guidance.instructions.iter().map(|i| render(i)).collect();
        result.warnings = guidance
            .warnings
            .iter()
            .filter(|rule| rule_fires(rule, status, pool_type, value))
            .map(|rule| Warning {
                severity: rule.severity,
                message: render(&rule.message),
            })
            .collect();

        let change = deviation.abs();
        let (rate, products): (_, Vec<&Product>) = match status {
            Status::Low => (
                parameter.raise.as_ref(),
                self.catalog.products().raising(&parameter.id).collect(),
            ),
            Status::High => (
                parameter.lower.as_ref(),
                self.catalog.products().lowering(&parameter.id).collect(),
            ),
            Status::Ok => (None, vec![]),
        };

        if let Some(rate) = rate {
            result.candidates = products
                .into_iter()
                .map(|product| chemical_candidate(product, rate, change, pool_volume))
                .collect();

            if let Some(max) = rate.max_change_per_treatment {
                if change > max && !result.candidates.is_empty() {
                    let treatments = (change / max).ceil();
                    result.warnings.push(Warning {
                        severity: Severity::Caution,
                        message: format!(
                            "A change of {} {} exceeds the recommended {} {} per treatment. \
                             Split the dose into {} treatments and retest between them.",
                            round_for_display(change),
                            parameter.unit,
                            max,
                            parameter.unit,
                            treatments
                        ),
                    });
                }
            }
        }

        if status == Status::High {
            if let Some(fallback) = &parameter.high_fallback {
                result
                    .candidates
                    .push(self.fallback_candidate(fallback, pool_volume));
            }
        }

        result.priority = self.ranker.rank(&result);

        tracing::debug!(
            "{} = {} is {:?} (deviation {}, {} candidates, priority {})",
            parameter.id,
            value,
            status,
            deviation,
            result.candidates.len(),
            result.priority
        );

        result
    }

    fn fallback_candidate(&self, fallback: &HighFallback, pool_volume: f64) -> DoseCandidate {
        match fallback {
            HighFallback::NaturalDissipation { steps } => DoseCandidate {
                action: ActionKind::NaturalDissipation,
                product_id: NATURAL_DISSIPATION_ID.to_string(),
                name: "Natural Dissipation".to_string(),
                amount: 0.0,
                unit: "none".to_string(),
                safety: vec!["Do not swim until levels return to the safe range".to_string()],
                application: steps.clone(),
            },
            HighFallback::PartialDrain { steps } => {
                let gallons = pool_volume * self.drain_fraction;
                let mut application = vec![format!(
                    "Drain about {} gallons ({}% of the pool volume)",
                    round_for_display(gallons),
                    round_for_display(self.drain_fraction * 100.0)
                )];
                application.extend(steps.iter().cloned());

                DoseCandidate {
                    action: ActionKind::PartialDrain,
                    product_id: PARTIAL_DRAIN_ID.to_string(),
                    name: "Partial Drain and Refill".to_string(),
                    amount: gallons,
                    unit: "gallon".to_string(),
                    safety: vec![
                        "Never drain a pool completely without professional advice".to_string(),
                        "Discharge water according to local regulations".to_string(),
                    ],
                    application,
                }
            }
        }
    }
}

/// Amount of `product` needed to move a parameter by `change`.
///
/// Tablet products in a validated catalog always carry a positive weight.
pub(crate) fn dose_amount(product: &Product, rate: &DoseRate, change: f64, pool_volume: f64) -> f64 {
    let mut amount = rate.base_amount(change, pool_volume);
    if rate.concentration_adjusted {
        amount /= product.concentration;
    }
    match (product.unit, product.tablet_weight_oz) {
        (DoseUnit::Tablet, Some(weight_oz)) if weight_oz > 0.0 => {
            amount * OUNCES_PER_POUND / weight_oz
        }
        _ => amount,
    }
}

fn chemical_candidate(product: &Product, rate: &DoseRate, change: f64, pool_volume: f64) -> DoseCandidate {
    DoseCandidate {
        action: ActionKind::Chemical,
        product_id: product.id.clone(),
        name: product.name.clone(),
        amount: dose_amount(product, rate, change, pool_volume),
        unit: product.unit.to_string(),
        safety: product.safety.clone(),
        application: product.application.clone(),
    }
}

fn rule_fires(rule: &WarningRule, status: Status, pool_type: &str, value: f64) -> bool {
    if !rule.pool_types.is_empty() && !rule.pool_types.iter().any(|p| p == pool_type) {
        return false;
    }
    match (status, rule.threshold) {
        (_, None) => true,
        (Status::Low, Some(threshold)) => value < threshold,
        (Status::High, Some(threshold)) => value > threshold,
        (Status::Ok, Some(_)) => false,
    }
}

fn render_template(template: &str, value: f64, unit: &str, range: &IdealRange) -> String {
    template
        .replace("{value}", &value.to_string())
        .replace("{unit}", unit)
        .replace("{min}", &range.min.to_string())
        .replace("{max}", &range.max.to_string())
}

fn round_for_display(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{build_default_catalog, default_catalog};
    use approx::assert_relative_eq;

    fn readings(pairs: &[(&str, f64)]) -> Readings {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn in_range_readings() -> Readings {
        readings(&[
            ("free_chlorine", 2.0),
            ("total_chlorine", 2.0),
            ("ph", 7.5),
            ("total_alkalinity", 100.0),
            ("calcium_hardness", 300.0),
            ("cyanuric_acid", 40.0),
            ("salt", 500.0),
            ("total_bromine", 0.0),
            ("temperature", 80.0),
        ])
    }

    #[test]
    fn test_in_range_readings_are_ok_with_empty_lists() {
        let calc = AdjustmentCalculator::new(default_catalog());
        let results = calc.calculate("chlorine", 10_000.0, &in_range_readings()).unwrap();

        assert_eq!(results.len(), 9);
        for result in &results {
            assert_eq!(result.status, Status::Ok, "{} not ok", result.parameter_id);
            assert!(result.candidates.is_empty());
            assert!(result.warnings.is_empty());
            assert_eq!(result.deviation, 0.0);
            assert_eq!(result.priority, 0);
        }
    }

    #[test]
    fn test_zero_sanitizer_is_a_hazard() {
        let calc = AdjustmentCalculator::new(default_catalog());
        let results = calc
            .calculate("chlorine", 10_000.0, &readings(&[("free_chlorine", 0.0)]))
            .unwrap();

        let fc = results.get("free_chlorine").unwrap();
        assert_eq!(fc.status, Status::Low);
        assert_eq!(fc.max_severity(), Some(Severity::Hazard));
        assert!(fc.warnings.iter().any(|w| w.message.contains("Do not swim")));
    }

    #[test]
    fn test_zero_bromine_in_bromine_pool_is_a_hazard() {
        let calc = AdjustmentCalculator::new(default_catalog());
        let results = calc
            .calculate("bromine", 10_000.0, &readings(&[("total_bromine", 0.0)]))
            .unwrap();

        let tb = results.get("total_bromine").unwrap();
        assert_eq!(tb.status, Status::Low);
        assert_eq!(tb.max_severity(), Some(Severity::Hazard));
        assert_eq!(tb.candidates[0].product_id, "bromine_tablets");
    }

    #[test]
    fn test_dose_scales_linearly_with_volume() {
        let calc = AdjustmentCalculator::new(default_catalog());
        let input = readings(&[("ph", 7.0), ("total_alkalinity", 60.0), ("free_chlorine", 0.5)]);

        let small = calc.calculate("chlorine", 10_000.0, &input).unwrap();
        let large = calc.calculate("chlorine", 20_000.0, &input).unwrap();

        for (a, b) in small.iter().zip(large.iter()) {
            for (ca, cb) in a.candidates.iter().zip(b.candidates.iter()) {
                assert_relative_eq!(cb.amount, ca.amount * 2.0, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_ph_increaser_amount() {
        let calc = AdjustmentCalculator::new(default_catalog());
        let results = calc
            .calculate("chlorine", 10_000.0, &readings(&[("ph", 7.2)]))
            .unwrap();

        let ph = results.get("ph").unwrap();
        assert_relative_eq!(ph.deviation, -0.2, epsilon = 1e-9);
        assert_eq!(ph.candidates.len(), 1);
        assert_eq!(ph.candidates[0].product_id, "ph_increaser");
        assert_relative_eq!(ph.candidates[0].amount, 0.375, epsilon = 1e-9);
        assert_eq!(ph.candidates[0].unit, "pound");
    }

    #[test]
    fn test_sanitizer_dose_is_concentration_adjusted_and_tablets_converted() {
        let calc = AdjustmentCalculator::new(default_catalog());
        let results = calc
            .calculate("chlorine", 10_000.0, &readings(&[("free_chlorine", 0.0)]))
            .unwrap();
        let fc = results.get("free_chlorine").unwrap();

        let liquid = fc.candidates.iter().find(|c| c.product_id == "liquid_chlorine").unwrap();
        assert_relative_eq!(liquid.amount, 1.0 / 0.125, epsilon = 1e-9);
        assert_eq!(liquid.unit, "gallon");

        let tablets = fc.candidates.iter().find(|c| c.product_id == "chlorine_tablets").unwrap();
        assert_relative_eq!(tablets.amount, (1.0 / 0.9) * 16.0 / 3.0, epsilon = 1e-9);
        assert_eq!(tablets.unit, "tablet");
    }

    #[test]
    fn test_high_sanitizer_falls_back_to_dissipation() {
        let calc = AdjustmentCalculator::new(default_catalog());
        let results = calc
            .calculate("chlorine", 10_000.0, &readings(&[("free_chlorine", 6.0)]))
            .unwrap();
        let fc = results.get("free_chlorine").unwrap();

        assert_eq!(fc.status, Status::High);
        assert_eq!(fc.candidates.len(), 1);
        assert_eq!(fc.candidates[0].action, ActionKind::NaturalDissipation);
        assert_eq!(fc.candidates[0].amount, 0.0);
        assert_eq!(fc.max_severity(), Some(Severity::Hazard));
    }

    #[test]
    fn test_high_hardness_drains_configured_fraction() {
        let catalog = build_default_catalog();
        let calc = AdjustmentCalculator::new(&catalog).with_drain_fraction(0.2);
        let results = calc
            .calculate("chlorine", 15_000.0, &readings(&[("calcium_hardness", 450.0)]))
            .unwrap();
        let ch = results.get("calcium_hardness").unwrap();

        assert_eq!(ch.candidates.len(), 1);
        assert_eq!(ch.candidates[0].product_id, PARTIAL_DRAIN_ID);
        assert_relative_eq!(ch.candidates[0].amount, 3_000.0);
        assert!(ch.candidates[0].application[0].contains("3000 gallons"));
    }

    #[test]
    fn test_high_ph_lists_every_lowering_product() {
        let calc = AdjustmentCalculator::new(default_catalog());
        let results = calc
            .calculate("chlorine", 10_000.0, &readings(&[("ph", 8.2)]))
            .unwrap();
        let ph = results.get("ph").unwrap();

        let ids: Vec<_> = ph.candidates.iter().map(|c| c.product_id.as_str()).collect();
        assert_eq!(ids, vec!["chlorine_tablets", "muriatic_acid", "ph_decreaser"]);
        // 8.2 is above the 8.0 caution threshold
        assert_eq!(ph.max_severity(), Some(Severity::Caution));
        assert_eq!(ph.instructions[0], "Adjust pH first before making other chemical adjustments.");
    }

    #[test]
    fn test_large_change_recommends_split_treatments() {
        let calc = AdjustmentCalculator::new(default_catalog());
        let results = calc
            .calculate("chlorine", 10_000.0, &readings(&[("total_alkalinity", 20.0)]))
            .unwrap();
        let ta = results.get("total_alkalinity").unwrap();

        // 60 ppm short with a 50 ppm per-treatment limit
        assert!(ta
            .warnings
            .iter()
            .any(|w| w.severity == Severity::Caution && w.message.contains("2 treatments")));
        // Amount is not capped
        assert_relative_eq!(ta.candidates[0].amount, 9.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pool_type_selects_range_and_filters_warnings() {
        let calc = AdjustmentCalculator::new(default_catalog());
        let input = readings(&[("salt", 2000.0), ("cyanuric_acid", 20.0)]);

        let salt_pool = calc.calculate("saltwater", 10_000.0, &input).unwrap();
        assert_eq!(salt_pool.get("salt").unwrap().status, Status::Low);
        assert!(!salt_pool.get("salt").unwrap().warnings.is_empty());
        // Low stabilizer warnings only apply to chlorine pools
        assert!(salt_pool.get("cyanuric_acid").unwrap().warnings.is_empty());

        let chlorine_pool = calc.calculate("chlorine", 10_000.0, &input).unwrap();
        assert_eq!(chlorine_pool.get("salt").unwrap().status, Status::High);
        assert!(!chlorine_pool.get("cyanuric_acid").unwrap().warnings.is_empty());
    }

    #[test]
    fn test_recommendation_renders_placeholders() {
        let calc = AdjustmentCalculator::new(default_catalog());
        let results = calc
            .calculate("chlorine", 10_000.0, &readings(&[("ph", 7.2), ("temperature", 90.0)]))
            .unwrap();

        assert_eq!(results.get("ph").unwrap().recommendation, "Increase pH from 7.2 to 7.4-7.6.");
        let temp = results.get("temperature").unwrap();
        assert!(temp.recommendation.contains("90°F"));
        assert!(temp.candidates.is_empty());
    }

    #[test]
    fn test_missing_readings_are_skipped() {
        let calc = AdjustmentCalculator::new(default_catalog());
        let results = calc
            .calculate("chlorine", 10_000.0, &readings(&[("ph", 7.5), ("mystery", 1.0)]))
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results.contains_key("ph"));
        assert!(!results.contains_key("free_chlorine"));
    }

    #[test]
    fn test_results_follow_catalog_order() {
        let calc = AdjustmentCalculator::new(default_catalog());
        let results = calc
            .calculate("chlorine", 10_000.0, &readings(&[("salt", 500.0), ("ph", 7.5), ("free_chlorine", 2.0)]))
            .unwrap();

        let ids: Vec<_> = results.iter().map(|r| r.parameter_id.as_str()).collect();
        assert_eq!(ids, vec!["free_chlorine", "ph", "salt"]);
    }

    #[test]
    fn test_unknown_pool_type_is_configuration_error() {
        let calc = AdjustmentCalculator::new(default_catalog());
        let err = calc.calculate("lagoon", 10_000.0, &in_range_readings()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_non_positive_volume_is_validation_error() {
        let calc = AdjustmentCalculator::new(default_catalog());
        for volume in [0.0, -5.0, f64::NAN] {
            let err = calc.calculate("chlorine", volume, &in_range_readings()).unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
    }

    #[test]
    fn test_non_finite_reading_is_validation_error() {
        let calc = AdjustmentCalculator::new(default_catalog());
        let err = calc
            .calculate("chlorine", 10_000.0, &readings(&[("ph", f64::INFINITY)]))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_calculation_is_idempotent() {
        let calc = AdjustmentCalculator::new(default_catalog());
        let input = readings(&[
            ("free_chlorine", 0.2),
            ("ph", 8.1),
            ("calcium_hardness", 600.0),
            ("salt", 4500.0),
        ]);

        let first = calc.calculate("saltwater", 12_000.0, &input).unwrap();
        let second = calc.calculate("saltwater", 12_000.0, &input).unwrap();
        assert_eq!(first, second);
    }
}
