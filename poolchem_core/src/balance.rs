//! Water balance via the Langelier Saturation Index.
//!
//! LSI = pH + TF + CF + AF - TDS constant
//!
//! A negative index means the water dissolves calcium (corrosive), a positive
//! one that it deposits it (scaling).

use crate::types::{LsiFactors, WaterBalanceResult, WaterBalanceStatus, WaterSample};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEMPERATURE_F: f64 = 78.0;

const BALANCED_LIMIT: f64 = 0.3;
const SEVERE_LIMIT: f64 = 1.0;
const BASE_TDS_CONSTANT: f64 = 12.1;

/// How non-positive alkalinity or hardness is handled
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvalidInputPolicy {
    /// Fail with `Error::Validation`
    #[default]
    Reject,
    /// Substitute 1.0 and log a warning
    Clamp,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct WaterBalanceEvaluator {
    policy: InvalidInputPolicy,
}

impl WaterBalanceEvaluator {
    pub fn new(policy: InvalidInputPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> InvalidInputPolicy {
        self.policy
    }

    pub fn evaluate(
        &self,
        ph: f64,
        alkalinity: f64,
        calcium_hardness: f64,
        temperature_f: f64,
    ) -> Result<WaterBalanceResult> {
        self.evaluate_sample(&WaterSample {
            ph,
            alkalinity,
            calcium_hardness,
            temperature_f,
            tds: None,
        })
    }

    pub fn evaluate_sample(&self, sample: &WaterSample) -> Result<WaterBalanceResult> {
        for (name, value) in [
            ("pH", sample.ph),
            ("alkalinity", sample.alkalinity),
            ("calcium hardness", sample.calcium_hardness),
            ("temperature", sample.temperature_f),
        ] {
            if !value.is_finite() {
                return Err(Error::validation(format!("{} must be a finite number", name)));
            }
        }
        if let Some(tds) = sample.tds {
            if !tds.is_finite() || tds < 0.0 {
                return Err(Error::validation(format!(
                    "TDS must be a non-negative number, got {}",
                    tds
                )));
            }
        }

        let alkalinity = self.log_argument("alkalinity", sample.alkalinity)?;
        let calcium_hardness = self.log_argument("calcium hardness", sample.calcium_hardness)?;

        let factors = LsiFactors {
            ph: sample.ph,
            temperature_factor: temperature_factor(sample.temperature_f),
            calcium_factor: calcium_hardness.log10() - 0.4,
            alkalinity_factor: alkalinity.log10() - 0.7,
            tds_factor: tds_factor(sample.tds),
        };

        let raw = factors.ph + factors.temperature_factor + factors.calcium_factor
            + factors.alkalinity_factor
            - factors.tds_factor;
        let lsi = (raw * 100.0).round() / 100.0;
        let status = classify(lsi);

        tracing::debug!("LSI {} ({}) from {:?}", lsi, status, factors);

        Ok(WaterBalanceResult {
            lsi,
            status,
            recommendation: recommendation(lsi, status),
            factors,
        })
    }

    fn log_argument(&self, name: &str, value: f64) -> Result<f64> {
        if value > 0.0 {
            return Ok(value);
        }
        match self.policy {
            InvalidInputPolicy::Reject => Err(Error::validation(format!(
                "{} must be positive for the LSI calculation, got {}",
                name, value
            ))),
            InvalidInputPolicy::Clamp => {
                tracing::warn!("{} is {}; clamping to 1.0 for the LSI calculation", name, value);
                Ok(value.max(1.0))
            }
        }
    }
}

/// Temperature factor from degrees Fahrenheit
pub fn temperature_factor(temperature_f: f64) -> f64 {
    let celsius = (temperature_f - 32.0) * 5.0 / 9.0;
    if celsius <= 0.0 {
        0.0
    } else if celsius <= 28.0 {
        0.2 * (celsius / 6.0)
    } else {
        0.8 + 0.2 * (celsius - 28.0) / 50.0
    }
}

fn tds_factor(tds: Option<f64>) -> f64 {
    match tds {
        Some(tds) if tds > 1000.0 => 12.3 + (tds / 1000.0).log10(),
        _ => BASE_TDS_CONSTANT,
    }
}

fn classify(lsi: f64) -> WaterBalanceStatus {
    if lsi < -BALANCED_LIMIT {
        WaterBalanceStatus::Corrosive
    } else if lsi > BALANCED_LIMIT {
        WaterBalanceStatus::Scaling
    } else {
        WaterBalanceStatus::Balanced
    }
}

fn recommendation(lsi: f64, status: WaterBalanceStatus) -> String {
    let mut text = match status {
        WaterBalanceStatus::Corrosive => format!(
            "Water is corrosive (LSI {}). Raise pH, total alkalinity or calcium hardness to protect surfaces and equipment.",
            lsi
        ),
        WaterBalanceStatus::Scaling => format!(
            "Water is scale forming (LSI {}). Lower pH, total alkalinity or calcium hardness to prevent deposits.",
            lsi
        ),
        WaterBalanceStatus::Balanced => format!("Water is balanced (LSI {}).", lsi),
    };
    if lsi.abs() > SEVERE_LIMIT {
        text.push_str(" The imbalance is severe; correct it before further use.");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_reference_sample() {
        // pH 7.5, TA 100, CH 300 at 78°F:
        // TF 0.8519 + CF 2.0771 + AF 1.3 + 7.5 - 12.1 = -0.371
        let result = WaterBalanceEvaluator::default()
            .evaluate(7.5, 100.0, 300.0, DEFAULT_TEMPERATURE_F)
            .unwrap();

        assert_abs_diff_eq!(result.lsi, -0.37, epsilon = 1e-9);
        assert_eq!(result.status, WaterBalanceStatus::Corrosive);
        assert_abs_diff_eq!(result.factors.alkalinity_factor, 1.3, epsilon = 1e-9);
        assert_abs_diff_eq!(result.factors.temperature_factor, 0.851_851_851, epsilon = 1e-6);
        assert_abs_diff_eq!(result.factors.tds_factor, 12.1);
    }

    #[test]
    fn test_balanced_sample() {
        let result = WaterBalanceEvaluator::default()
            .evaluate(7.8, 100.0, 300.0, 78.0)
            .unwrap();
        assert_abs_diff_eq!(result.lsi, -0.07, epsilon = 1e-9);
        assert_eq!(result.status, WaterBalanceStatus::Balanced);
        assert_eq!(result.recommendation, "Water is balanced (LSI -0.07).");
    }

    #[test]
    fn test_scaling_and_severe_note() {
        let result = WaterBalanceEvaluator::default()
            .evaluate(8.6, 200.0, 600.0, 90.0)
            .unwrap();
        assert_eq!(result.status, WaterBalanceStatus::Scaling);
        assert!(result.lsi > 1.0);
        assert!(result.recommendation.contains("severe"));
    }

    #[test]
    fn test_temperature_factor_pieces() {
        assert_eq!(temperature_factor(32.0), 0.0);
        assert_eq!(temperature_factor(10.0), 0.0);
        // 27°C
        assert_abs_diff_eq!(temperature_factor(80.6), 0.9, epsilon = 1e-9);
        // 38°C
        assert_abs_diff_eq!(temperature_factor(100.4), 0.8 + 0.2 * 10.0 / 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_alkalinity_rejected() {
        let err = WaterBalanceEvaluator::default()
            .evaluate(7.5, 0.0, 300.0, DEFAULT_TEMPERATURE_F)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_negative_hardness_rejected() {
        let err = WaterBalanceEvaluator::default()
            .evaluate(7.5, 100.0, -1.0, DEFAULT_TEMPERATURE_F)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_clamp_policy_substitutes_one() {
        let evaluator = WaterBalanceEvaluator::new(InvalidInputPolicy::Clamp);
        let result = evaluator.evaluate(7.5, 0.0, 300.0, 78.0).unwrap();
        assert_abs_diff_eq!(result.factors.alkalinity_factor, -0.7, epsilon = 1e-9);
    }

    #[test]
    fn test_non_finite_rejected_under_any_policy() {
        let evaluator = WaterBalanceEvaluator::new(InvalidInputPolicy::Clamp);
        assert!(evaluator.evaluate(f64::NAN, 100.0, 300.0, 78.0).is_err());
        assert!(evaluator.evaluate(7.5, 100.0, 300.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_high_tds_raises_constant() {
        let sample = WaterSample {
            ph: 7.5,
            alkalinity: 100.0,
            calcium_hardness: 300.0,
            temperature_f: 78.0,
            tds: Some(10_000.0),
        };
        let result = WaterBalanceEvaluator::default().evaluate_sample(&sample).unwrap();
        assert_abs_diff_eq!(result.factors.tds_factor, 13.3, epsilon = 1e-9);
        assert_abs_diff_eq!(result.lsi, -1.57, epsilon = 1e-9);
        assert!(result.recommendation.contains("severe"));
    }
}
