use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{MetricError, Result};
use crate::metric::Metric;
use crate::request::{MetricRequest, Reliability};

/// A requested metric after resolution.
///
/// `handle` is `None` for a best-effort metric that was neither found nor
/// given a fallback.
#[derive(Debug, Clone)]
pub struct ResolvedMetric {
    name: String,
    handle: Option<Arc<Metric>>,
    reliability: Reliability,
    alias: Option<String>,
    synthesized: bool,
}

impl ResolvedMetric {
    pub fn found(request: &MetricRequest, handle: Arc<Metric>) -> Self {
        Self::from_request(request, Some(handle), false)
    }

    pub fn synthesized(request: &MetricRequest, handle: Arc<Metric>) -> Self {
        Self::from_request(request, Some(handle), true)
    }

    pub fn missing(request: &MetricRequest) -> Self {
        Self::from_request(request, None, false)
    }

    fn from_request(
        request: &MetricRequest,
        handle: Option<Arc<Metric>>,
        synthesized: bool,
    ) -> Self {
        Self {
            name: request.name.clone(),
            handle,
            reliability: request.reliability,
            alias: request.alias.clone(),
            synthesized,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn handle(&self) -> Option<&Arc<Metric>> {
        self.handle.as_ref()
    }

    #[must_use]
    pub const fn reliability(&self) -> Reliability {
        self.reliability
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The value came from a fallback, not from the catalog
    #[must_use]
    pub const fn is_synthesized(&self) -> bool {
        self.synthesized
    }

    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.handle.is_some()
    }
}

/// Lookup table keyed by metric name or alias.
///
/// Names live in the primary map, aliases in a secondary alias → name map.
/// Every key resolves to exactly one metric; insertions that would make a key
/// ambiguous are rejected before anything is modified.
#[derive(Debug, Clone, Default)]
pub struct ResolutionTable {
    entries: Vec<ResolvedMetric>,
    by_name: HashMap<String, usize>,
    aliases: HashMap<String, String>,
}

impl ResolutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resolved metric under its name and alias.
    ///
    /// Re-inserting the same `(name, alias, reliability)` keeps the first
    /// resolution.
    pub fn insert(&mut self, resolved: ResolvedMetric) -> Result<()> {
        let name = resolved.name.as_str();

        if let Some(&idx) = self.by_name.get(name) {
            let existing = &self.entries[idx];
            if existing.alias == resolved.alias && existing.reliability == resolved.reliability {
                return Ok(());
            }
            return Err(MetricError::ConflictingRequest {
                name: name.to_string(),
                detail: format!(
                    "already resolved with alias {:?} and {:?}, requested with alias {:?} and {:?}",
                    existing.alias, existing.reliability, resolved.alias, resolved.reliability
                ),
            });
        }

        if let Some(owner) = self.aliases.get(name) {
            return Err(MetricError::AliasCollision {
                alias: name.to_string(),
                existing: owner.clone(),
                requested: name.to_string(),
            });
        }

        if let Some(alias) = resolved.alias.as_deref().filter(|alias| *alias != name) {
            if let Some(owner) = self.aliases.get(alias) {
                return Err(MetricError::AliasCollision {
                    alias: alias.to_string(),
                    existing: owner.clone(),
                    requested: name.to_string(),
                });
            }
            if self.by_name.contains_key(alias) {
                return Err(MetricError::AliasCollision {
                    alias: alias.to_string(),
                    existing: alias.to_string(),
                    requested: name.to_string(),
                });
            }
            self.aliases.insert(alias.to_string(), name.to_string());
        }

        self.by_name.insert(name.to_string(), self.entries.len());
        self.entries.push(resolved);
        Ok(())
    }

    /// The resolved wrapper for a name or alias
    #[must_use]
    pub fn resolved(&self, key: &str) -> Option<&ResolvedMetric> {
        let idx = self.by_name.get(key).or_else(|| {
            self.aliases
                .get(key)
                .and_then(|name| self.by_name.get(name))
        })?;
        self.entries.get(*idx)
    }

    /// Live handle for a name or alias; `None` for unknown keys and missing markers
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Arc<Metric>> {
        self.resolved(key).and_then(ResolvedMetric::handle)
    }

    /// Whether the key was requested, present or not
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.by_name.contains_key(key) || self.aliases.contains_key(key)
    }

    /// Handle for a key that must be present
    pub fn require(&self, key: &str) -> Result<&Arc<Metric>> {
        self.get(key)
            .ok_or_else(|| MetricError::NotResolved(key.to_string()))
    }

    /// Scalar value for a key, if present
    #[must_use]
    pub fn value(&self, key: &str) -> Option<f64> {
        self.get(key).map(|metric| metric.value())
    }

    /// No entry is a missing marker
    #[must_use]
    pub fn all_present(&self) -> bool {
        self.entries.iter().all(ResolvedMetric::is_present)
    }

    /// Names of best-effort metrics that resolved to the missing marker
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|entry| !entry.is_present())
            .map(ResolvedMetric::name)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedMetric> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
