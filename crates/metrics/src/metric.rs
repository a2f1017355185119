use serde::{Deserialize, Serialize};
use std::fmt;

/// One element of an instanced counter: a correlation id (e.g. an opcode
/// mnemonic) and its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricInstance(pub String, pub f64);

impl MetricInstance {
    pub fn new(correlation_id: impl Into<String>, value: f64) -> Self {
        Self(correlation_id.into(), value)
    }

    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub const fn value(&self) -> f64 {
        self.1
    }
}

/// Value carried by a counter.
///
/// Catalog files use the natural JSON/TOML shape of each variant; instanced
/// values are arrays of `[correlation_id, value]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    UInt(u64),
    Float(f64),
    Bool(bool),
    Text(String),
    Instanced(Vec<MetricInstance>),
}

impl Default for MetricValue {
    fn default() -> Self {
        Self::UInt(0)
    }
}

/// A named counter handle as exposed by a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    name: String,
    value: MetricValue,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: MetricValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// A fresh entry with a zero value, to be filled through the typed setters
    pub fn detached(name: impl Into<String>) -> Self {
        Self::new(name, MetricValue::default())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn raw(&self) -> &MetricValue {
        &self.value
    }

    pub fn set_u64(&mut self, value: u64) {
        self.value = MetricValue::UInt(value);
    }

    pub fn set_f64(&mut self, value: f64) {
        self.value = MetricValue::Float(value);
    }

    pub fn set_string(&mut self, value: impl Into<String>) {
        self.value = MetricValue::Text(value.into());
    }

    /// Numeric view of a scalar counter
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match &self.value {
            MetricValue::UInt(v) => Some(*v as f64),
            MetricValue::Float(v) => Some(*v),
            MetricValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            MetricValue::Text(_) | MetricValue::Instanced(_) => None,
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match &self.value {
            MetricValue::UInt(v) => Some(*v),
            MetricValue::Float(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as u64),
            MetricValue::Bool(v) => Some(u64::from(*v)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            MetricValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Scalar value, `0.0` for text and instanced counters
    #[must_use]
    pub fn value(&self) -> f64 {
        self.as_f64().unwrap_or(0.0)
    }

    /// Non-zero, non-empty or `true`
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match &self.value {
            MetricValue::UInt(v) => *v != 0,
            MetricValue::Float(v) => *v != 0.0,
            MetricValue::Bool(v) => *v,
            MetricValue::Text(v) => !v.is_empty(),
            MetricValue::Instanced(v) => !v.is_empty(),
        }
    }

    /// Number of instances; scalar counters have none
    #[must_use]
    pub fn num_instances(&self) -> usize {
        match &self.value {
            MetricValue::Instanced(v) => v.len(),
            _ => 0,
        }
    }

    #[must_use]
    pub fn instances(&self) -> &[MetricInstance] {
        match &self.value {
            MetricValue::Instanced(v) => v,
            _ => &[],
        }
    }

    #[must_use]
    pub fn correlation_id(&self, index: usize) -> Option<&str> {
        self.instances()
            .get(index)
            .map(MetricInstance::correlation_id)
    }

    #[must_use]
    pub fn instance_value(&self, index: usize) -> Option<f64> {
        self.instances().get(index).map(MetricInstance::value)
    }

    /// Value of the first instance whose correlation id matches, ignoring case
    #[must_use]
    pub fn instance_by_id(&self, correlation_id: &str) -> Option<f64> {
        self.instances()
            .iter()
            .find(|inst| inst.correlation_id().eq_ignore_ascii_case(correlation_id))
            .map(MetricInstance::value)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            MetricValue::UInt(v) => write!(f, "{v}"),
            MetricValue::Float(v) => write!(f, "{v}"),
            MetricValue::Bool(v) => write!(f, "{v}"),
            MetricValue::Text(v) => f.write_str(v),
            MetricValue::Instanced(v) => {
                let parts: Vec<String> = v
                    .iter()
                    .map(|inst| format!("{}={}", inst.correlation_id(), inst.value()))
                    .collect();
                f.write_str(&parts.join(","))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_setters_replace_value() {
        let mut metric = Metric::detached("launch__grid_size");
        assert_eq!(metric.as_u64(), Some(0));

        metric.set_f64(2.5);
        assert_eq!(metric.as_f64(), Some(2.5));
        assert_eq!(metric.as_u64(), None);

        metric.set_string("Tile");
        assert_eq!(metric.as_str(), Some("Tile"));
        assert_eq!(metric.value(), 0.0);
        assert_eq!(metric.to_string(), "Tile");
    }

    #[test]
    fn instanced_counter_exposes_correlation_ids() {
        let metric = Metric::new(
            "sass__inst_executed_per_opcode",
            MetricValue::Instanced(vec![
                MetricInstance::new("FADD", 10.0),
                MetricInstance::new("ffma", 4.0),
            ]),
        );

        assert_eq!(metric.num_instances(), 2);
        assert_eq!(metric.correlation_id(1), Some("ffma"));
        assert_eq!(metric.instance_value(0), Some(10.0));
        assert_eq!(metric.instance_by_id("FFMA"), Some(4.0));
        assert_eq!(metric.instance_by_id("DADD"), None);
        assert!(metric.is_truthy());
    }

    #[test]
    fn untagged_values_parse_from_json() {
        let values: Vec<MetricValue> =
            serde_json::from_str(r#"[3, 0.5, true, "SIMT", [["FMUL", 2]]]"#).unwrap();
        assert_eq!(
            values,
            vec![
                MetricValue::UInt(3),
                MetricValue::Float(0.5),
                MetricValue::Bool(true),
                MetricValue::Text("SIMT".to_string()),
                MetricValue::Instanced(vec![MetricInstance::new("FMUL", 2.0)]),
            ]
        );
    }
}
