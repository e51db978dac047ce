//! Parameter and product catalogs.
//!
//! Catalogs are immutable reference data. The built-in defaults are cached in
//! statics; custom catalogs can be loaded from JSON or TOML files and injected
//! wherever a catalog is consumed.

use crate::compatibility::IncompatibilityIndex;
use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

pub const POOL_TYPE_CHLORINE: &str = "chlorine";
pub const POOL_TYPE_SALTWATER: &str = "saltwater";
pub const POOL_TYPE_BROMINE: &str = "bromine";

/// Cached default catalog - built once and shared by every default-configured engine
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

pub fn default_parameter_catalog() -> &'static ParameterCatalog {
    &DEFAULT_CATALOG.parameters
}

pub fn default_product_catalog() -> &'static ProductCatalog {
    &DEFAULT_CATALOG.products
}

// ============================================================================
// Catalog Types
// ============================================================================

/// Ideal ranges and guidance for every known parameter
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterCatalog {
    pool_types: Vec<String>,
    parameters: Vec<Parameter>,
}

impl ParameterCatalog {
    pub fn new(pool_types: Vec<String>, parameters: Vec<Parameter>) -> Self {
        Self {
            pool_types,
            parameters,
        }
    }

    pub fn pool_types(&self) -> &[String] {
        &self.pool_types
    }

    pub fn has_pool_type(&self, pool_type: &str) -> bool {
        self.pool_types.iter().any(|p| p == pool_type)
    }

    pub fn get(&self, id: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.id == id)
    }

    /// Parameters in declaration order
    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Validate ranges, ids and dose rates.
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.pool_types.is_empty() {
            errors.push("Parameter catalog declares no pool types".to_string());
        }

        let mut seen = HashSet::new();
        for parameter in &self.parameters {
            if parameter.id.is_empty() {
                errors.push("Parameter has empty ID".to_string());
            }
            if !seen.insert(parameter.id.as_str()) {
                errors.push(format!("Duplicate parameter '{}'", parameter.id));
            }
            if parameter.name.is_empty() {
                errors.push(format!("Parameter '{}' has empty name", parameter.id));
            }

            check_range(&mut errors, &parameter.id, "default", &parameter.range);
            for (pool_type, range) in &parameter.pool_ranges {
                if !self.has_pool_type(pool_type) {
                    errors.push(format!(
                        "Parameter '{}' has a range for unknown pool type '{}'",
                        parameter.id, pool_type
                    ));
                }
                check_range(&mut errors, &parameter.id, pool_type, range);
            }

            for (direction, rate) in [("raise", &parameter.raise), ("lower", &parameter.lower)] {
                if let Some(rate) = rate {
                    if !(rate.amount > 0.0 && rate.per_change > 0.0 && rate.reference_volume > 0.0)
                    {
                        errors.push(format!(
                            "Parameter '{}': {} dose rate must be positive",
                            parameter.id, direction
                        ));
                    }
                    if rate.max_change_per_treatment.is_some_and(|max| max <= 0.0) {
                        errors.push(format!(
                            "Parameter '{}': {} max change per treatment must be positive",
                            parameter.id, direction
                        ));
                    }
                }
            }
        }

        errors
    }
}

fn check_range(errors: &mut Vec<String>, id: &str, label: &str, range: &IdealRange) {
    if !(range.min.is_finite() && range.max.is_finite()) {
        errors.push(format!("Parameter '{}': {} range is not finite", id, label));
    } else if range.min > range.max {
        errors.push(format!(
            "Parameter '{}': {} range min {} > max {}",
            id, label, range.min, range.max
        ));
    }
}

/// Chemical products with a symmetric incompatibility index
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "ProductFile")]
pub struct ProductCatalog {
    products: Vec<Product>,
    #[serde(skip)]
    incompatibilities: IncompatibilityIndex,
}

impl ProductCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        let incompatibilities = IncompatibilityIndex::from_products(&products);
        Self {
            products,
            incompatibilities,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Products in declaration order
    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn incompatibilities(&self) -> &IncompatibilityIndex {
        &self.incompatibilities
    }

    /// Products whose raises-set names the parameter
    pub fn raising(&self, parameter_id: &str) -> impl Iterator<Item = &Product> {
        let parameter_id = parameter_id.to_string();
        self.products
            .iter()
            .filter(move |p| p.raises.iter().any(|r| *r == parameter_id))
    }

    /// Products whose lowers-set names the parameter
    pub fn lowering(&self, parameter_id: &str) -> impl Iterator<Item = &Product> {
        let parameter_id = parameter_id.to_string();
        self.products
            .iter()
            .filter(move |p| p.lowers.iter().any(|l| *l == parameter_id))
    }

    /// Validate product fields and incompatibility references.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let mut seen = HashSet::new();
        for product in &self.products {
            if product.id.is_empty() {
                errors.push("Product has empty ID".to_string());
            }
            if !seen.insert(product.id.as_str()) {
                errors.push(format!("Duplicate product '{}'", product.id));
            }
            if product.id == NATURAL_DISSIPATION_ID || product.id == PARTIAL_DRAIN_ID {
                errors.push(format!(
                    "Product id '{}' is reserved for non-chemical actions",
                    product.id
                ));
            }
            if !(product.concentration > 0.0 && product.concentration <= 1.0) {
                errors.push(format!(
                    "Product '{}': concentration {} outside (0, 1]",
                    product.id, product.concentration
                ));
            }
            if product.unit == DoseUnit::Tablet
                && !product.tablet_weight_oz.is_some_and(|w| w > 0.0)
            {
                errors.push(format!(
                    "Product '{}' is dosed in tablets but has no tablet weight",
                    product.id
                ));
            }
            for other in &product.incompatible_with {
                if self.get(other).is_none() {
                    errors.push(format!(
                        "Product '{}' is incompatible with unknown product '{}'",
                        product.id, other
                    ));
                }
            }
        }

        errors
    }
}

/// The parameter and product catalogs an engine works against.
///
/// Only constructed through `Catalog::new` or `Catalog::load`, so every
/// instance has passed validation.
#[derive(Clone, Debug, Serialize)]
pub struct Catalog {
    parameters: ParameterCatalog,
    products: ProductCatalog,
}

impl Catalog {
    /// Build a catalog, failing with `Error::Configuration` if it is inconsistent
    pub fn new(parameters: ParameterCatalog, products: ProductCatalog) -> Result<Self> {
        let catalog = Self {
            parameters,
            products,
        };
        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(Error::configuration(format!(
                "Invalid catalog: {}",
                errors.join("; ")
            )));
        }
        Ok(catalog)
    }

    /// Load catalogs from files, using the built-in default for any path not given
    pub fn load(parameters_path: Option<&Path>, products_path: Option<&Path>) -> Result<Self> {
        let (parameters, products) = read_catalogs(parameters_path, products_path)?;
        let catalog = Self::new(parameters, products)?;
        tracing::info!(
            "Loaded catalog: {} parameters, {} products",
            catalog.parameters.len(),
            catalog.products.len()
        );
        Ok(catalog)
    }

    /// Read catalog files and list every problem without building a catalog.
    ///
    /// Unset paths fall back to the built-in catalogs. Fails only when a file
    /// cannot be read or parsed.
    pub fn check_files(parameters_path: Option<&Path>, products_path: Option<&Path>) -> Result<Vec<String>> {
        let (parameters, products) = read_catalogs(parameters_path, products_path)?;
        Ok(cross_validate(&parameters, &products))
    }

    pub fn parameters(&self) -> &ParameterCatalog {
        &self.parameters
    }

    pub fn products(&self) -> &ProductCatalog {
        &self.products
    }

    /// Validate both catalogs and every cross reference between them.
    pub fn validate(&self) -> Vec<String> {
        cross_validate(&self.parameters, &self.products)
    }
}

fn read_catalogs(
    parameters_path: Option<&Path>,
    products_path: Option<&Path>,
) -> Result<(ParameterCatalog, ProductCatalog)> {
    let parameters = match parameters_path {
        Some(path) => read_data_file::<ParameterCatalog>(path)?,
        None => default_parameter_catalog().clone(),
    };
    let products = match products_path {
        Some(path) => read_data_file::<ProductCatalog>(path)?,
        None => default_product_catalog().clone(),
    };
    Ok((parameters, products))
}

fn cross_validate(parameters: &ParameterCatalog, products: &ProductCatalog) -> Vec<String> {
    let mut errors = parameters.validate();
    errors.extend(products.validate());

    for product in products.iter() {
        for parameter_id in &product.raises {
            match parameters.get(parameter_id) {
                None => errors.push(format!(
                    "Product '{}' raises unknown parameter '{}'",
                    product.id, parameter_id
                )),
                Some(p) if p.raise.is_none() => errors.push(format!(
                    "Product '{}' raises '{}' which has no raise dose rate",
                    product.id, parameter_id
                )),
                Some(_) => {}
            }
        }
        for parameter_id in &product.lowers {
            match parameters.get(parameter_id) {
                None => errors.push(format!(
                    "Product '{}' lowers unknown parameter '{}'",
                    product.id, parameter_id
                )),
                Some(p) if p.lower.is_none() => errors.push(format!(
                    "Product '{}' lowers '{}' which has no lower dose rate",
                    product.id, parameter_id
                )),
                Some(_) => {}
            }
        }
    }

    errors
}

/// On-disk shape of a product catalog; the index is rebuilt on load
#[derive(Deserialize)]
struct ProductFile {
    products: Vec<Product>,
}

impl From<ProductFile> for ProductCatalog {
    fn from(file: ProductFile) -> Self {
        ProductCatalog::new(file.products)
    }
}

/// Read a JSON or TOML data file, chosen by extension
pub(crate) fn read_data_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
    let value = if is_toml {
        toml::from_str(&contents)?
    } else {
        serde_json::from_str(&contents)?
    };
    tracing::debug!("Read data file {:?}", path);
    Ok(value)
}

// ============================================================================
// Default Catalog
// ============================================================================

/// Builds the default catalog of chlorine, saltwater and bromine pool data
///
/// **Note**: For production use, prefer `default_catalog()` which returns a
/// cached reference. This function is retained for tests and customization.
pub fn build_default_catalog() -> Catalog {
    Catalog {
        parameters: build_default_parameters(),
        products: build_default_products(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn rule(severity: Severity, message: &str) -> WarningRule {
    WarningRule {
        severity,
        message: message.into(),
        threshold: None,
        pool_types: vec![],
    }
}

fn rule_at(severity: Severity, threshold: f64, message: &str) -> WarningRule {
    WarningRule {
        threshold: Some(threshold),
        ..rule(severity, message)
    }
}

fn only_in(mut rule: WarningRule, pool_type: &str) -> WarningRule {
    rule.pool_types.push(pool_type.into());
    rule
}

fn guidance_side(recommendation: &str, instructions: &[&str], warnings: Vec<WarningRule>) -> StatusGuidance {
    StatusGuidance {
        recommendation: recommendation.into(),
        instructions: strings(instructions),
        warnings,
    }
}

fn rate(amount: f64, per_change: f64, reference_volume: f64) -> DoseRate {
    DoseRate {
        amount,
        per_change,
        reference_volume,
        concentration_adjusted: false,
        max_change_per_treatment: None,
    }
}

fn sanitizer_rate() -> DoseRate {
    DoseRate {
        concentration_adjusted: true,
        max_change_per_treatment: Some(4.0),
        ..rate(1.0, 1.0, 10_000.0)
    }
}

fn ph_rate() -> DoseRate {
    // 6 oz per 0.2 pH per 10,000 gallons
    DoseRate {
        max_change_per_treatment: Some(0.5),
        ..rate(0.375, 0.2, 10_000.0)
    }
}

fn ranges(chlorine: (f64, f64), saltwater: (f64, f64), bromine: (f64, f64)) -> HashMap<String, IdealRange> {
    HashMap::from([
        (POOL_TYPE_CHLORINE.to_string(), IdealRange::new(chlorine.0, chlorine.1)),
        (POOL_TYPE_SALTWATER.to_string(), IdealRange::new(saltwater.0, saltwater.1)),
        (POOL_TYPE_BROMINE.to_string(), IdealRange::new(bromine.0, bromine.1)),
    ])
}

fn dissipation(steps: &[&str]) -> Option<HighFallback> {
    Some(HighFallback::NaturalDissipation {
        steps: strings(steps),
    })
}

fn partial_drain(target: &str) -> Option<HighFallback> {
    Some(HighFallback::PartialDrain {
        steps: vec![
            "Refill with fresh water".into(),
            "Balance other chemicals after refilling".into(),
            format!("Repeat if necessary until {} is in range", target),
        ],
    })
}

fn build_default_parameters() -> ParameterCatalog {
    use Severity::*;

    let mut parameters = Vec::new();

    // ========================================================================
    // Sanitizers
    // ========================================================================

    parameters.push(Parameter {
        id: "free_chlorine".into(),
        name: "Free Chlorine".into(),
        unit: "ppm".into(),
        range: IdealRange::new(1.0, 3.0),
        pool_ranges: ranges((1.0, 3.0), (1.0, 3.0), (0.0, 0.0)),
        raise: Some(sanitizer_rate()),
        lower: None,
        high_fallback: dissipation(&[
            "Turn off chlorine generator or feeder",
            "Remove chlorine tablets from dispensers",
            "Keep the pool uncovered and exposed to sunlight",
            "Run the pump to accelerate dissipation",
            "Test chlorine levels daily until they return to normal",
        ]),
        guidance: Guidance {
            low: guidance_side(
                "Increase free chlorine from {value} ppm to {min}-{max} ppm.",
                &[
                    "Ensure pH is in range before adding chlorine for maximum effectiveness.",
                    "Test free chlorine again 4 hours after adjustment.",
                ],
                vec![
                    rule(Advisory, "Low free chlorine ({value} ppm) may lead to algae growth and cloudy water."),
                    rule(Caution, "Bacteria and other pathogens may thrive in water with insufficient chlorine."),
                    rule_at(Hazard, 0.5, "HEALTH HAZARD: Extremely low chlorine levels. Do not swim until corrected."),
                ],
            ),
            high: guidance_side(
                "Decrease free chlorine from {value} ppm to {min}-{max} ppm.",
                &[
                    "Do not swim until chlorine levels return to safe range.",
                    "Test free chlorine daily until levels return to normal.",
                ],
                vec![
                    rule(Advisory, "High free chlorine ({value} ppm) can cause eye and skin irritation."),
                    rule(Advisory, "High chlorine levels can bleach swimwear and pool liners."),
                    rule_at(Hazard, 5.0, "HEALTH HAZARD: Chlorine levels above 5.0 ppm. Do not swim until levels decrease."),
                ],
            ),
            in_range: "Free chlorine is in the ideal range ({value} ppm).".into(),
        },
    });

    parameters.push(Parameter {
        id: "total_chlorine".into(),
        name: "Total Chlorine".into(),
        unit: "ppm".into(),
        range: IdealRange::new(1.0, 3.0),
        pool_ranges: ranges((1.0, 3.0), (1.0, 3.0), (0.0, 0.0)),
        raise: Some(sanitizer_rate()),
        lower: None,
        high_fallback: dissipation(&[
            "Stop adding chlorine until levels fall",
            "Shock with non-chlorine shock if combined chlorine is present",
            "Run the pump to accelerate dissipation",
            "Test total and free chlorine daily until they return to normal",
        ]),
        guidance: Guidance {
            low: guidance_side(
                "Increase total chlorine from {value} ppm to {min}-{max} ppm.",
                &["Test total chlorine again 4 hours after adjustment."],
                vec![rule(
                    Advisory,
                    "Low total chlorine ({value} ppm) indicates insufficient sanitizer in the water.",
                )],
            ),
            high: guidance_side(
                "Decrease total chlorine from {value} ppm to {min}-{max} ppm.",
                &["Compare with free chlorine; a gap above 0.5 ppm means chloramines are present."],
                vec![
                    rule(Caution, "High total chlorine ({value} ppm) may indicate chloramines (combined chlorine)."),
                    rule(Advisory, "Chloramines cause strong chlorine odor and eye irritation. Shock treatment is recommended."),
                ],
            ),
            in_range: "Total chlorine is in the ideal range ({value} ppm).".into(),
        },
    });

    // ========================================================================
    // Balance
    // ========================================================================

    parameters.push(Parameter {
        id: "ph".into(),
        name: "pH".into(),
        unit: "pH".into(),
        range: IdealRange::new(7.4, 7.6),
        pool_ranges: HashMap::new(),
        raise: Some(ph_rate()),
        lower: Some(ph_rate()),
        high_fallback: None,
        guidance: Guidance {
            low: guidance_side(
                "Increase pH from {value} to {min}-{max}.",
                &[
                    "Adjust pH first before making other chemical adjustments.",
                    "Test pH again 4 hours after adjustment.",
                ],
                vec![
                    rule(Advisory, "Low pH ({value}) can cause eye and skin irritation."),
                    rule(Advisory, "Low pH can damage pool equipment and surfaces through corrosion."),
                    rule(Advisory, "Low pH causes chlorine to dissipate more quickly, reducing effectiveness."),
                    rule_at(Caution, 7.0, "EQUIPMENT RISK: pH below 7.0 can cause serious damage to pool equipment."),
                ],
            ),
            high: guidance_side(
                "Decrease pH from {value} to {min}-{max}.",
                &[
                    "Adjust pH first before making other chemical adjustments.",
                    "Test pH again 4 hours after adjustment.",
                ],
                vec![
                    rule(Advisory, "High pH ({value}) can cause cloudy water and reduced chlorine effectiveness."),
                    rule(Advisory, "High pH can cause scale formation on pool surfaces and equipment."),
                    rule_at(Caution, 8.0, "SANITIZER RISK: pH above 8.0 significantly reduces chlorine effectiveness."),
                ],
            ),
            in_range: "pH is in the ideal range ({value}).".into(),
        },
    });

    parameters.push(Parameter {
        id: "total_alkalinity".into(),
        name: "Total Alkalinity".into(),
        unit: "ppm".into(),
        range: IdealRange::new(80.0, 120.0),
        pool_ranges: HashMap::new(),
        raise: Some(DoseRate {
            max_change_per_treatment: Some(50.0),
            ..rate(1.5, 10.0, 10_000.0)
        }),
        // Quarts of muriatic acid
        lower: Some(DoseRate {
            max_change_per_treatment: Some(50.0),
            ..rate(1.0, 10.0, 10_000.0)
        }),
        high_fallback: None,
        guidance: Guidance {
            low: guidance_side(
                "Increase total alkalinity from {value} ppm to {min}-{max} ppm.",
                &[
                    "Adjust total alkalinity before adjusting calcium hardness.",
                    "Test total alkalinity again 24 hours after adjustment.",
                ],
                vec![
                    rule(Advisory, "Low total alkalinity ({value} ppm) can cause pH to fluctuate rapidly."),
                    rule(Advisory, "Low alkalinity can lead to corrosion of pool surfaces and equipment."),
                    rule_at(Caution, 60.0, "Very low alkalinity can cause pH bounce, corrosion, and staining."),
                ],
            ),
            high: guidance_side(
                "Decrease total alkalinity from {value} ppm to {min}-{max} ppm.",
                &[
                    "Lower total alkalinity gradually to avoid large pH fluctuations.",
                    "Test total alkalinity again 24 hours after adjustment.",
                ],
                vec![
                    rule(Advisory, "High total alkalinity ({value} ppm) can make pH adjustment difficult."),
                    rule(Advisory, "High alkalinity can contribute to cloudy water and scale formation."),
                    rule_at(Caution, 180.0, "Very high alkalinity can cause cloudy water, scale formation, and difficulty adjusting pH."),
                ],
            ),
            in_range: "Total alkalinity is in the ideal range ({value} ppm).".into(),
        },
    });

    parameters.push(Parameter {
        id: "calcium_hardness".into(),
        name: "Calcium Hardness".into(),
        unit: "ppm".into(),
        range: IdealRange::new(200.0, 400.0),
        pool_ranges: HashMap::new(),
        raise: Some(DoseRate {
            max_change_per_treatment: Some(50.0),
            ..rate(1.0, 10.0, 10_000.0)
        }),
        lower: None,
        high_fallback: partial_drain("calcium hardness"),
        guidance: Guidance {
            low: guidance_side(
                "Increase calcium hardness from {value} ppm to {min}-{max} ppm.",
                &[
                    "Adjust calcium hardness after pH and alkalinity are in range.",
                    "Test calcium hardness again 24 hours after adjustment.",
                ],
                vec![
                    rule(Advisory, "Low calcium hardness ({value} ppm) can cause etching of plaster and grout."),
                    rule(Advisory, "Low calcium hardness can lead to corrosion of metal components."),
                    rule_at(Caution, 150.0, "SURFACE RISK: Calcium hardness below 150 ppm can damage pool surfaces."),
                ],
            ),
            high: guidance_side(
                "Decrease calcium hardness from {value} ppm to {min}-{max} ppm.",
                &[
                    "Partial drain and refill is the only effective way to reduce calcium hardness.",
                    "Test calcium hardness again after refilling.",
                ],
                vec![
                    rule(Advisory, "High calcium hardness ({value} ppm) can cause scale formation on surfaces and equipment."),
                    rule(Advisory, "High calcium hardness can contribute to cloudy water."),
                    rule_at(Caution, 500.0, "EQUIPMENT RISK: Calcium hardness above 500 ppm can cause severe scaling."),
                ],
            ),
            in_range: "Calcium hardness is in the ideal range ({value} ppm).".into(),
        },
    });

    parameters.push(Parameter {
        id: "cyanuric_acid".into(),
        name: "Cyanuric Acid (Stabilizer)".into(),
        unit: "ppm".into(),
        range: IdealRange::new(30.0, 50.0),
        pool_ranges: ranges((30.0, 50.0), (60.0, 80.0), (0.0, 0.0)),
        raise: Some(DoseRate {
            max_change_per_treatment: Some(40.0),
            ..rate(1.0, 10.0, 10_000.0)
        }),
        lower: None,
        high_fallback: partial_drain("cyanuric acid"),
        guidance: Guidance {
            low: guidance_side(
                "Increase cyanuric acid from {value} ppm to {min}-{max} ppm.",
                &[
                    "Cyanuric acid dissolves very slowly. Broadcast directly into the pool or pre-dissolve in hot water.",
                    "Test cyanuric acid again 24-48 hours after adjustment.",
                ],
                vec![
                    only_in(
                        rule(Advisory, "Low cyanuric acid ({value} ppm) provides insufficient protection for chlorine against UV rays."),
                        POOL_TYPE_CHLORINE,
                    ),
                    only_in(
                        rule(Advisory, "Chlorine will dissipate quickly in sunlight without adequate cyanuric acid."),
                        POOL_TYPE_CHLORINE,
                    ),
                ],
            ),
            high: guidance_side(
                "Decrease cyanuric acid from {value} ppm to {min}-{max} ppm.",
                &[
                    "Partial drain and refill is the only effective way to reduce cyanuric acid.",
                    "Test cyanuric acid again after refilling.",
                ],
                vec![
                    rule(Advisory, "High cyanuric acid ({value} ppm) can reduce chlorine effectiveness."),
                    rule_at(Caution, 100.0, "SANITIZER RISK: Cyanuric acid above 100 ppm significantly locks up chlorine, reducing its ability to sanitize (chlorine lock)."),
                    rule_at(Advisory, 100.0, "Partial drain and refill is the only way to reduce cyanuric acid levels."),
                ],
            ),
            in_range: "Cyanuric acid is in the ideal range ({value} ppm).".into(),
        },
    });

    parameters.push(Parameter {
        id: "salt".into(),
        name: "Salt".into(),
        unit: "ppm".into(),
        range: IdealRange::new(0.0, 1000.0),
        pool_ranges: ranges((0.0, 1000.0), (2500.0, 3500.0), (0.0, 1000.0)),
        // 1 lb per 12 ppm per 100 gallons
        raise: Some(rate(1.0, 12.0, 100.0)),
        lower: None,
        high_fallback: partial_drain("salt level"),
        guidance: Guidance {
            low: guidance_side(
                "Increase salt level from {value} ppm to {min}-{max} ppm.",
                &[
                    "Broadcast salt across the deep end of the pool and brush to distribute.",
                    "Run the pump continuously for 24 hours after adding salt.",
                    "Test salt level again 24 hours after adjustment.",
                ],
                vec![
                    only_in(
                        rule(Advisory, "Low salt level ({value} ppm) may prevent chlorine generator from functioning properly."),
                        POOL_TYPE_SALTWATER,
                    ),
                    only_in(
                        rule(Advisory, "Check salt cell and generator for proper operation."),
                        POOL_TYPE_SALTWATER,
                    ),
                ],
            ),
            high: guidance_side(
                "Decrease salt level from {value} ppm to {min}-{max} ppm.",
                &[
                    "Partial drain and refill is the only effective way to reduce salt level.",
                    "Test salt level again after refilling.",
                ],
                vec![
                    only_in(
                        rule(Advisory, "High salt level ({value} ppm) can damage pool equipment and surfaces."),
                        POOL_TYPE_SALTWATER,
                    ),
                    only_in(
                        rule_at(Caution, 4000.0, "EQUIPMENT RISK: Salt levels above 4000 ppm can damage salt cell and other equipment."),
                        POOL_TYPE_SALTWATER,
                    ),
                ],
            ),
            in_range: "Salt level is in the ideal range ({value} ppm).".into(),
        },
    });

    parameters.push(Parameter {
        id: "total_bromine".into(),
        name: "Total Bromine".into(),
        unit: "ppm".into(),
        range: IdealRange::new(0.0, 0.0),
        pool_ranges: ranges((0.0, 0.0), (0.0, 0.0), (3.0, 5.0)),
        raise: Some(sanitizer_rate()),
        lower: None,
        high_fallback: dissipation(&[
            "Remove bromine tablets from dispensers",
            "Keep the pool uncovered and exposed to sunlight",
            "Run the pump to accelerate dissipation",
            "Test bromine levels daily until they return to normal",
        ]),
        guidance: Guidance {
            low: guidance_side(
                "Increase bromine level from {value} ppm to {min}-{max} ppm.",
                &[
                    "Ensure pH is in range before adding bromine for maximum effectiveness.",
                    "Test bromine again 4 hours after adjustment.",
                ],
                vec![
                    only_in(
                        rule(Advisory, "Low bromine level ({value} ppm) provides insufficient sanitization."),
                        POOL_TYPE_BROMINE,
                    ),
                    only_in(
                        rule(Caution, "Bacteria and other pathogens may thrive in water with insufficient bromine."),
                        POOL_TYPE_BROMINE,
                    ),
                    only_in(
                        rule_at(Hazard, 1.0, "HEALTH HAZARD: Extremely low bromine levels. Do not swim until corrected."),
                        POOL_TYPE_BROMINE,
                    ),
                ],
            ),
            high: guidance_side(
                "Decrease bromine level from {value} ppm to {min}-{max} ppm.",
                &[
                    "Do not swim until bromine levels return to safe range.",
                    "Test bromine daily until levels return to normal.",
                ],
                vec![
                    only_in(
                        rule(Advisory, "High bromine level ({value} ppm) can cause skin and eye irritation."),
                        POOL_TYPE_BROMINE,
                    ),
                    only_in(
                        rule_at(Hazard, 10.0, "HEALTH HAZARD: Bromine levels above 10.0 ppm. Do not swim until levels decrease."),
                        POOL_TYPE_BROMINE,
                    ),
                ],
            ),
            in_range: "Bromine level is in the ideal range ({value} ppm).".into(),
        },
    });

    // ========================================================================
    // Advisory only
    // ========================================================================

    parameters.push(Parameter {
        id: "temperature".into(),
        name: "Water Temperature".into(),
        unit: "°F".into(),
        range: IdealRange::new(75.0, 85.0),
        pool_ranges: HashMap::new(),
        raise: None,
        lower: None,
        high_fallback: None,
        guidance: Guidance {
            low: guidance_side(
                "Water temperature is low ({value}{unit}). Consider heating the pool for comfort.",
                &[],
                vec![],
            ),
            high: guidance_side(
                "Water temperature is high ({value}{unit}).",
                &["Monitor chlorine levels more frequently as higher temperatures increase chlorine consumption."],
                vec![rule(
                    Advisory,
                    "Warm water ({value}{unit}) increases chlorine consumption and algae risk.",
                )],
            ),
            in_range: "Water temperature is in the ideal range ({value}{unit}).".into(),
        },
    });

    ParameterCatalog::new(
        strings(&[POOL_TYPE_CHLORINE, POOL_TYPE_SALTWATER, POOL_TYPE_BROMINE]),
        parameters,
    )
}

fn build_default_products() -> ProductCatalog {
    const CHLORINE_FAMILY: &[&str] = &[
        "liquid_chlorine",
        "chlorine_tablets",
        "chlorine_granules",
        "calcium_hypochlorite",
    ];
    const ACIDS_AND_BASES: &[&str] = &["muriatic_acid", "ph_decreaser", "ph_increaser"];

    let powder_safety = || {
        strings(&[
            "Wear chemical-resistant gloves and eye protection",
            "Do not inhale dust or fumes",
            "Do not mix with other chemicals",
            "Store in cool, dry place in original container",
            "Keep out of reach of children",
        ])
    };
    let mild_powder_safety = || {
        strings(&[
            "Wear chemical-resistant gloves and eye protection",
            "Do not inhale dust or fumes",
            "Store in cool, dry place in original container",
            "Keep out of reach of children",
        ])
    };
    let dissolve_steps = |pump_hours: u32, swim_wait: &str| {
        vec![
            "Pre-dissolve in a bucket of pool water".to_string(),
            "Pour slowly around the perimeter of the pool".to_string(),
            format!("Run the pump for at least {} hours after adding", pump_hours),
            swim_wait.to_string(),
        ]
    };

    let products = vec![
        Product {
            id: "liquid_chlorine".into(),
            name: "Liquid Chlorine (Sodium Hypochlorite)".into(),
            concentration: 0.125,
            unit: DoseUnit::Gallon,
            tablet_weight_oz: None,
            raises: strings(&["free_chlorine", "total_chlorine"]),
            lowers: vec![],
            safety: strings(&[
                "Wear chemical-resistant gloves and eye protection",
                "Add to water, never add water to chemical",
                "Do not mix with other chemicals, especially acids",
                "Store in cool, dry place away from direct sunlight",
                "Keep out of reach of children",
            ]),
            application: strings(&[
                "Pre-dilute in a bucket of pool water",
                "Pour slowly around the perimeter of the pool",
                "Run the pump for at least 4 hours after adding",
                "Wait at least 4 hours before swimming",
            ]),
            incompatible_with: strings(ACIDS_AND_BASES),
        },
        Product {
            id: "chlorine_tablets".into(),
            name: "Chlorine Tablets (Trichlor)".into(),
            concentration: 0.90,
            unit: DoseUnit::Tablet,
            tablet_weight_oz: Some(3.0),
            raises: strings(&["free_chlorine", "total_chlorine", "cyanuric_acid"]),
            lowers: strings(&["ph"]),
            safety: strings(&[
                "Wear chemical-resistant gloves and eye protection",
                "Do not handle with bare hands",
                "Do not mix with other chemicals",
                "Store in cool, dry place in original container",
                "Keep out of reach of children",
            ]),
            application: strings(&[
                "Place tablets in skimmer basket, floater, or automatic feeder",
                "Never throw tablets directly into pool",
                "Add one tablet per 5,000 gallons per week",
                "Run the pump at least 8 hours per day",
            ]),
            incompatible_with: strings(ACIDS_AND_BASES),
        },
        Product {
            id: "chlorine_granules".into(),
            name: "Chlorine Granules (Dichlor)".into(),
            concentration: 0.56,
            unit: DoseUnit::Pound,
            tablet_weight_oz: None,
            raises: strings(&["free_chlorine", "total_chlorine", "cyanuric_acid"]),
            lowers: vec![],
            safety: powder_safety(),
            application: dissolve_steps(4, "Wait at least 1 hour before swimming"),
            incompatible_with: strings(ACIDS_AND_BASES),
        },
        Product {
            id: "calcium_hypochlorite".into(),
            name: "Calcium Hypochlorite (Cal-Hypo)".into(),
            concentration: 0.65,
            unit: DoseUnit::Pound,
            tablet_weight_oz: None,
            raises: strings(&["free_chlorine", "total_chlorine", "calcium_hardness"]),
            lowers: vec![],
            safety: powder_safety(),
            application: dissolve_steps(4, "Wait at least 4 hours before swimming"),
            incompatible_with: strings(ACIDS_AND_BASES),
        },
        Product {
            id: "non_chlorine_shock".into(),
            name: "Non-Chlorine Shock (Potassium Monopersulfate)".into(),
            concentration: 1.0,
            unit: DoseUnit::Pound,
            tablet_weight_oz: None,
            raises: strings(&["total_chlorine"]),
            lowers: vec![],
            safety: powder_safety(),
            application: dissolve_steps(2, "Can swim after 15 minutes"),
            incompatible_with: vec![],
        },
        Product {
            id: "muriatic_acid".into(),
            name: "Muriatic Acid (Hydrochloric Acid)".into(),
            concentration: 0.317,
            unit: DoseUnit::Quart,
            tablet_weight_oz: None,
            raises: vec![],
            lowers: strings(&["ph", "total_alkalinity"]),
            safety: strings(&[
                "DANGER: Highly corrosive",
                "Wear chemical-resistant gloves, eye protection, and protective clothing",
                "Always add acid to water, never water to acid",
                "Do not mix with other chemicals, especially chlorine",
                "Work in well-ventilated area",
                "Keep out of reach of children",
            ]),
            application: strings(&[
                "Pre-dilute by adding acid to a 5-gallon bucket of pool water",
                "Pour slowly around the deep end of the pool",
                "Stay away from the area while adding",
                "Run the pump for at least 4 hours after adding",
                "Wait at least 4 hours before swimming",
            ]),
            incompatible_with: strings(CHLORINE_FAMILY),
        },
        Product {
            id: "ph_decreaser".into(),
            name: "pH Decreaser (Sodium Bisulfate)".into(),
            concentration: 0.95,
            unit: DoseUnit::Pound,
            tablet_weight_oz: None,
            raises: vec![],
            lowers: strings(&["ph"]),
            safety: powder_safety(),
            application: dissolve_steps(2, "Wait at least 1 hour before swimming"),
            incompatible_with: strings(CHLORINE_FAMILY),
        },
        Product {
            id: "ph_increaser".into(),
            name: "pH Increaser (Sodium Carbonate)".into(),
            concentration: 0.99,
            unit: DoseUnit::Pound,
            tablet_weight_oz: None,
            raises: strings(&["ph"]),
            lowers: vec![],
            safety: powder_safety(),
            application: dissolve_steps(2, "Wait at least 1 hour before swimming"),
            incompatible_with: strings(CHLORINE_FAMILY),
        },
        Product {
            id: "alkalinity_increaser".into(),
            name: "Alkalinity Increaser (Sodium Bicarbonate)".into(),
            concentration: 0.99,
            unit: DoseUnit::Pound,
            tablet_weight_oz: None,
            raises: strings(&["total_alkalinity"]),
            lowers: vec![],
            safety: mild_powder_safety(),
            application: dissolve_steps(2, "Wait at least 1 hour before swimming"),
            incompatible_with: vec![],
        },
        Product {
            id: "calcium_increaser".into(),
            name: "Calcium Hardness Increaser (Calcium Chloride)".into(),
            concentration: 0.99,
            unit: DoseUnit::Pound,
            tablet_weight_oz: None,
            raises: strings(&["calcium_hardness"]),
            lowers: vec![],
            safety: mild_powder_safety(),
            application: dissolve_steps(2, "Wait at least 1 hour before swimming"),
            incompatible_with: vec![],
        },
        Product {
            id: "cyanuric_acid".into(),
            name: "Cyanuric Acid (Stabilizer)".into(),
            concentration: 0.99,
            unit: DoseUnit::Pound,
            tablet_weight_oz: None,
            raises: strings(&["cyanuric_acid"]),
            lowers: vec![],
            safety: mild_powder_safety(),
            application: strings(&[
                "Pre-dissolve in a bucket of warm water (dissolves slowly)",
                "Pour slowly around the perimeter of the pool",
                "Run the pump for at least 24 hours after adding",
                "Wait at least 24 hours before swimming",
            ]),
            incompatible_with: vec![],
        },
        Product {
            id: "salt".into(),
            name: "Pool Salt (Sodium Chloride)".into(),
            concentration: 0.99,
            unit: DoseUnit::Pound,
            tablet_weight_oz: None,
            raises: strings(&["salt"]),
            lowers: vec![],
            safety: strings(&[
                "Wear gloves to protect hands from abrasion",
                "Store in cool, dry place in original container",
                "Keep out of reach of children",
            ]),
            application: strings(&[
                "Broadcast salt evenly across the deep end of the pool",
                "Brush any undissolved salt to prevent staining",
                "Run the pump for at least 24 hours after adding",
                "Wait until salt is fully dissolved before swimming",
            ]),
            incompatible_with: vec![],
        },
        Product {
            id: "bromine_tablets".into(),
            name: "Bromine Tablets".into(),
            concentration: 0.98,
            unit: DoseUnit::Tablet,
            tablet_weight_oz: Some(1.0),
            raises: strings(&["total_bromine"]),
            lowers: vec![],
            safety: strings(&[
                "Wear chemical-resistant gloves and eye protection",
                "Do not handle with bare hands",
                "Do not mix with other chemicals",
                "Store in cool, dry place in original container",
                "Keep out of reach of children",
            ]),
            application: strings(&[
                "Place tablets in floating dispenser or automatic feeder",
                "Never throw tablets directly into pool",
                "Add one tablet per 2,000 gallons per week",
                "Run the pump at least 8 hours per day",
            ]),
            incompatible_with: vec![],
        },
    ];

    ProductCatalog::new(products)
}
