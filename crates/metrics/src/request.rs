use serde::{Deserialize, Serialize};

use crate::error::MetricError;
use crate::metric::Metric;

/// Whether a missing metric aborts the rule or degrades gracefully
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    #[default]
    Mandatory,
    BestEffort,
}

/// Value used to synthesize a best-effort metric that the catalog lacks.
///
/// Only shapes the resolver can write through the catalog's typed setters are
/// representable; everything else is rejected when the request is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FallbackValue {
    UInt(u64),
    Float(f64),
    Text(String),
}

impl FallbackValue {
    /// Write the fallback into a synthesized entry
    pub fn apply(&self, metric: &mut Metric) {
        match self {
            Self::UInt(v) => metric.set_u64(*v),
            Self::Float(v) => metric.set_f64(*v),
            Self::Text(v) => metric.set_string(v.clone()),
        }
    }
}

impl From<u64> for FallbackValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<u32> for FallbackValue {
    fn from(value: u32) -> Self {
        Self::UInt(u64::from(value))
    }
}

impl From<f64> for FallbackValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FallbackValue {
    fn from(value: bool) -> Self {
        Self::UInt(u64::from(value))
    }
}

impl From<&str> for FallbackValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FallbackValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl TryFrom<i64> for FallbackValue {
    type Error = MetricError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value).map(Self::UInt).map_err(|_| {
            MetricError::invalid_fallback(format!(
                "integer fallback must be >= 0, got {value}"
            ))
        })
    }
}

impl TryFrom<serde_json::Value> for FallbackValue {
    type Error = MetricError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        match value {
            Value::Bool(v) => Ok(Self::from(v)),
            Value::Number(n) => {
                if let Some(v) = n.as_u64() {
                    Ok(Self::UInt(v))
                } else if let Some(v) = n.as_i64() {
                    Self::try_from(v)
                } else {
                    n.as_f64().map(Self::Float).ok_or_else(|| {
                        MetricError::invalid_fallback(format!("unrepresentable number {n}"))
                    })
                }
            }
            Value::String(v) => Ok(Self::Text(v)),
            other => Err(MetricError::invalid_fallback(format!(
                "can only create fallback metric from uint, float or str, got {other}"
            ))),
        }
    }
}

/// Declarative description of one counter a rule wants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMetricRequest")]
pub struct MetricRequest {
    /// Catalog key
    pub name: String,

    /// Second valid lookup key
    pub alias: Option<String>,

    pub reliability: Reliability,

    /// Only consulted for best-effort requests
    pub fallback: Option<FallbackValue>,

    /// Report the metric in the batched missing-metric warning
    pub warn_if_missing: bool,
}

impl MetricRequest {
    /// A mandatory request
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            reliability: Reliability::Mandatory,
            fallback: None,
            warn_if_missing: true,
        }
    }

    /// A best-effort request without fallback
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            reliability: Reliability::BestEffort,
            ..Self::required(name)
        }
    }

    /// Builder: set alias
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Builder: set fallback
    #[must_use]
    pub fn fallback(mut self, value: impl Into<FallbackValue>) -> Self {
        self.fallback = Some(value.into());
        self
    }

    /// Builder: set fallback from a value that may not be representable
    pub fn try_fallback<V>(mut self, value: V) -> Result<Self, MetricError>
    where
        V: TryInto<FallbackValue, Error = MetricError>,
    {
        self.fallback = Some(value.try_into()?);
        Ok(self)
    }

    /// Builder: do not mention this metric in missing-metric warnings
    #[must_use]
    pub fn quiet(mut self) -> Self {
        self.warn_if_missing = false;
        self
    }

    #[must_use]
    pub const fn is_mandatory(&self) -> bool {
        matches!(self.reliability, Reliability::Mandatory)
    }

    /// Every key this request can be looked up by
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.alias.as_deref())
    }
}

/// Configuration shape of a request; the fallback is type-checked on conversion
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMetricRequest {
    name: String,
    #[serde(default)]
    alias: Option<String>,
    #[serde(default)]
    reliability: Reliability,
    #[serde(default)]
    fallback: Option<serde_json::Value>,
    #[serde(default = "default_warn")]
    warn_if_missing: bool,
}

const fn default_warn() -> bool {
    true
}

impl TryFrom<RawMetricRequest> for MetricRequest {
    type Error = MetricError;

    fn try_from(raw: RawMetricRequest) -> Result<Self, Self::Error> {
        let fallback = raw.fallback.map(FallbackValue::try_from).transpose()?;
        if fallback.is_some() && raw.reliability == Reliability::Mandatory {
            log::debug!(
                "Fallback for mandatory metric {} will never be used",
                raw.name
            );
        }
        Ok(Self {
            name: raw.name,
            alias: raw.alias,
            reliability: raw.reliability,
            fallback,
            warn_if_missing: raw.warn_if_missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builders_compose() {
        let request = MetricRequest::optional("launch__uses_green_context")
            .alias("is_green_context")
            .fallback(false)
            .quiet();

        assert_eq!(request.reliability, Reliability::BestEffort);
        assert_eq!(request.fallback, Some(FallbackValue::UInt(0)));
        assert!(!request.warn_if_missing);
        assert_eq!(
            request.keys().collect::<Vec<_>>(),
            vec!["launch__uses_green_context", "is_green_context"]
        );
    }

    #[test]
    fn negative_integer_fallback_is_rejected() {
        let err = MetricRequest::optional("x").try_fallback(-1_i64).unwrap_err();
        assert!(matches!(err, MetricError::InvalidFallback(_)));

        let ok = MetricRequest::optional("x").try_fallback(7_i64).unwrap();
        assert_eq!(ok.fallback, Some(FallbackValue::UInt(7)));
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let request: MetricRequest =
            serde_json::from_str(r#"{"name": "gpu__time_duration.sum", "alias": "duration"}"#)
                .unwrap();

        assert_eq!(
            request,
            MetricRequest::required("gpu__time_duration.sum").alias("duration")
        );
    }

    #[test]
    fn config_fallback_of_wrong_shape_fails_construction() {
        for bad in [r"[1, 2]", r#"{"a": 1}"#, "-4", "null"] {
            let json = format!(
                r#"{{"name": "y", "reliability": "best_effort", "fallback": {bad}}}"#
            );
            let result: Result<MetricRequest, _> = serde_json::from_str(&json);
            // `null` reads as "no fallback" rather than a malformed one
            if bad == "null" {
                assert_eq!(result.unwrap().fallback, None);
            } else {
                let err = result.unwrap_err().to_string();
                assert!(err.contains("Invalid fallback value"), "{bad}: {err}");
            }
        }
    }

    #[test]
    fn toml_request_accepts_float_fallback() {
        let request: MetricRequest = toml::from_str(
            r#"
name = "y"
reliability = "best_effort"
fallback = 0.0
warn_if_missing = false
"#,
        )
        .unwrap();

        assert_eq!(request.fallback, Some(FallbackValue::Float(0.0)));
        assert!(!request.warn_if_missing);
    }
}
