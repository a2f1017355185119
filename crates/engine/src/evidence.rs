use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Immutable key/value snapshot a rule hands to its children.
///
/// Cloning is cheap: every reader shares the same map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidencePayload(Arc<BTreeMap<String, f64>>);

impl EvidencePayload {
    pub fn new(values: BTreeMap<String, f64>) -> Self {
        Self(Arc::new(values))
    }

    /// The payload seen when a parent published nothing
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// True when both payloads share the same snapshot
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<BTreeMap<String, f64>> for EvidencePayload {
    fn from(values: BTreeMap<String, f64>) -> Self {
        Self::new(values)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for EvidencePayload {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Per-unit store of published evidence, keyed by publishing rule.
///
/// One channel lives for exactly one pass over one profiled unit.
#[derive(Debug, Default)]
pub struct EvidenceChannel {
    unit: String,
    published: HashMap<String, EvidencePayload>,
}

impl EvidenceChannel {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            published: HashMap::new(),
        }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Make `payload` visible as `rule`'s evidence; replaces earlier evidence
    pub fn publish(&mut self, rule: &str, payload: EvidencePayload) {
        if self.published.insert(rule.to_string(), payload).is_some() {
            log::debug!(
                "Rule {rule} re-published evidence on unit {}; previous payload replaced",
                self.unit
            );
        }
    }

    /// Evidence published by `rule`, empty when it published nothing
    pub fn receive(&self, rule: &str) -> EvidencePayload {
        self.published.get(rule).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn has_published(&self, rule: &str) -> bool {
        self.published.contains_key(rule)
    }

    /// Snapshot of everything published so far, ordered by rule
    pub fn snapshot(&self) -> BTreeMap<String, EvidencePayload> {
        self.published
            .iter()
            .map(|(rule, payload)| (rule.clone(), payload.clone()))
            .collect()
    }
}
