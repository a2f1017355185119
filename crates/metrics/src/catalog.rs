use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use crate::metric::{Metric, MetricValue};
use crate::request::FallbackValue;

/// Source of measured counters for one profiled unit.
///
/// Implemented by the host. `synthesize` builds the value holder for a
/// best-effort fallback; the default returns a detached entry so fallbacks
/// never leak back into the host's data.
pub trait MetricCatalog: Send + Sync {
    fn lookup(&self, name: &str) -> Option<Arc<Metric>>;

    fn synthesize(&self, name: &str, fallback: &FallbackValue) -> Metric {
        let mut metric = Metric::detached(name);
        fallback.apply(&mut metric);
        metric
    }
}

impl<C: MetricCatalog + ?Sized> MetricCatalog for &C {
    fn lookup(&self, name: &str) -> Option<Arc<Metric>> {
        (**self).lookup(name)
    }

    fn synthesize(&self, name: &str, fallback: &FallbackValue) -> Metric {
        (**self).synthesize(name, fallback)
    }
}

impl<C: MetricCatalog + ?Sized> MetricCatalog for Arc<C> {
    fn lookup(&self, name: &str) -> Option<Arc<Metric>> {
        (**self).lookup(name)
    }

    fn synthesize(&self, name: &str, fallback: &FallbackValue) -> Metric {
        (**self).synthesize(name, fallback)
    }
}

/// Catalog backed by a hash map; also reads counter dumps from JSON or TOML.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    metrics: HashMap<String, Arc<Metric>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a counter
    pub fn insert(&mut self, name: impl Into<String>, value: MetricValue) -> Arc<Metric> {
        let name = name.into();
        let metric = Arc::new(Metric::new(name.clone(), value));
        self.metrics.insert(name, Arc::clone(&metric));
        metric
    }

    /// Builder: add a counter
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: MetricValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<Metric>> {
        self.metrics.remove(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    /// Parse a `{ name = value }` dump, JSON first and TOML as fallback
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let raw: BTreeMap<String, MetricValue> = match serde_json::from_slice(bytes) {
            Ok(raw) => raw,
            Err(json_err) => {
                let utf8 =
                    std::str::from_utf8(bytes).map_err(|err| anyhow!("{json_err}; {err}"))?;
                toml::from_str(utf8).map_err(|toml_err| {
                    anyhow!(
                        "Metric dump is not valid JSON or TOML ({json_err}); TOML parse error: {toml_err}"
                    )
                })?
            }
        };

        let mut catalog = Self::new();
        for (name, value) in raw {
            catalog.insert(name, value);
        }
        log::debug!("Loaded metric catalog with {} counters", catalog.len());
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read metric dump {}", path.display()))?;
        Self::parse(&bytes).with_context(|| format!("Invalid metric dump {}", path.display()))
    }
}

impl MetricCatalog for InMemoryCatalog {
    fn lookup(&self, name: &str) -> Option<Arc<Metric>> {
        self.metrics.get(name).cloned()
    }
}

impl FromIterator<(String, MetricValue)> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = (String, MetricValue)>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for (name, value) in iter {
            catalog.insert(name, value);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::MetricInstance;
    use std::io::Write;

    #[test]
    fn parses_json_dump() {
        let catalog = InMemoryCatalog::parse(
            br#"{"sm__throughput.avg.pct_of_peak_sustained_elapsed": 71.5, "launch__grid_size": 128}"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        let sol = catalog
            .lookup("sm__throughput.avg.pct_of_peak_sustained_elapsed")
            .unwrap();
        assert_eq!(sol.value(), 71.5);
        assert_eq!(catalog.lookup("launch__grid_size").unwrap().as_u64(), Some(128));
    }

    #[test]
    fn falls_back_to_toml() {
        let dump = r#"
"launch__execution_model" = "Tile"
"sass__inst_executed_per_opcode" = [["FADD", 12], ["FFMA", 30]]
"#;
        let catalog = InMemoryCatalog::parse(dump.as_bytes()).unwrap();
        let per_opcode = catalog.lookup("sass__inst_executed_per_opcode").unwrap();

        assert_eq!(
            per_opcode.instances(),
            &[MetricInstance::new("FADD", 12.0), MetricInstance::new("FFMA", 30.0)]
        );
        assert_eq!(
            catalog.lookup("launch__execution_model").unwrap().as_str(),
            Some("Tile")
        );
    }

    #[test]
    fn rejects_garbage() {
        let err = InMemoryCatalog::parse(b"not = [valid").unwrap_err();
        assert!(err.to_string().contains("not valid JSON or TOML"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"gpu__time_duration.sum": 1200}"#).unwrap();

        let catalog = InMemoryCatalog::load(file.path()).unwrap();
        assert!(catalog.lookup("gpu__time_duration.sum").is_some());
    }

    #[test]
    fn synthesized_entries_are_detached() {
        let catalog = InMemoryCatalog::new();
        let metric = catalog.synthesize("launch__uses_green_context", &FallbackValue::UInt(0));

        assert_eq!(metric.as_u64(), Some(0));
        assert!(catalog.lookup("launch__uses_green_context").is_none());
    }
}
