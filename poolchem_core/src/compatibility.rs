//! Chemical incompatibility checks.
//!
//! Products declare the products they must not be mixed with. The index
//! materializes those declarations into a symmetric adjacency map once, when
//! the product catalog is built, so every lookup is a set probe.

use crate::Product;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Symmetric "must not be mixed" relation between product ids
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IncompatibilityIndex {
    adjacency: HashMap<String, HashSet<String>>,
}

impl IncompatibilityIndex {
    /// Build the index from product declarations.
    ///
    /// If A lists B, both A→B and B→A are recorded. Self references are ignored.
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        let mut adjacency: HashMap<String, HashSet<String>> = HashMap::new();

        for product in products {
            adjacency.entry(product.id.clone()).or_default();
            for other in &product.incompatible_with {
                if other == &product.id {
                    continue;
                }
                adjacency
                    .entry(product.id.clone())
                    .or_default()
                    .insert(other.clone());
                adjacency
                    .entry(other.clone())
                    .or_default()
                    .insert(product.id.clone());
            }
        }

        Self { adjacency }
    }

    /// True if the two products must not be mixed
    pub fn are_incompatible(&self, a: &str, b: &str) -> bool {
        self.adjacency
            .get(a)
            .is_some_and(|partners| partners.contains(b))
    }

    /// Every product `id` must not be mixed with, sorted
    pub fn partners_of(&self, id: &str) -> Vec<&str> {
        let mut partners: Vec<&str> = self
            .adjacency
            .get(id)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default();
        partners.sort_unstable();
        partners
    }

    /// Report incompatible pairs within `product_ids`.
    ///
    /// Only pairs drawn from the input are considered. Each flagged pair is
    /// reported under both ids, partners listed in input order. Ids that are
    /// not in the index (e.g. non-chemical actions) have no incompatibilities.
    pub fn check<S: AsRef<str>>(&self, product_ids: &[S]) -> BTreeMap<String, Vec<String>> {
        let mut report: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (i, a) in product_ids.iter().enumerate() {
            let a = a.as_ref();
            for b in &product_ids[i + 1..] {
                let b = b.as_ref();
                if a == b || !self.are_incompatible(a, b) {
                    continue;
                }
                push_unique(report.entry(a.to_string()).or_default(), b);
                push_unique(report.entry(b.to_string()).or_default(), a);
            }
        }

        if !report.is_empty() {
            tracing::debug!("Incompatible products in selection: {:?}", report);
        }

        report
    }
}

fn push_unique(list: &mut Vec<String>, id: &str) {
    if !list.iter().any(|existing| existing == id) {
        list.push(id.to_string());
    }
}
