use anyhow::{anyhow, Context, Result as AnyResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{EngineError, Result};
use crate::rule::RuleInfo;

/// Configuration for a rule set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Rules that never run, by identifier
    pub disabled_rules: Vec<String>,

    /// Section identifiers allowed to run (None = all sections)
    pub sections: Option<Vec<String>>,

    /// Emit the batched warning for missing best-effort metrics
    pub warn_on_missing_optional: bool,

    /// Log a warning when a rule reads evidence from a rule it did not declare as parent
    pub warn_on_undeclared_parent: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            disabled_rules: Vec::new(),
            sections: None,
            warn_on_missing_optional: true,
            warn_on_undeclared_parent: true,
        }
    }
}

impl EngineConfig {
    /// Create config that runs only rules from `sections`
    pub fn for_sections<I, S>(sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sections: Some(sections.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Builder: disable a rule
    #[must_use]
    pub fn disable(mut self, rule: impl Into<String>) -> Self {
        self.disabled_rules.push(rule.into());
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for rule in &self.disabled_rules {
            if rule.trim().is_empty() {
                return Err(EngineError::invalid_config("disabled_rules contains an empty identifier"));
            }
            if !seen.insert(rule.as_str()) {
                return Err(EngineError::invalid_config(format!(
                    "rule {rule} is listed twice in disabled_rules"
                )));
            }
        }

        if let Some(sections) = &self.sections {
            if sections.iter().any(|s| s.trim().is_empty()) {
                return Err(EngineError::invalid_config("sections contains an empty identifier"));
            }
        }

        Ok(())
    }

    /// Whether a rule passes the disabled list and the section filter
    #[must_use]
    pub fn is_enabled(&self, info: &RuleInfo) -> bool {
        if self.disabled_rules.iter().any(|r| *r == info.identifier) {
            return false;
        }
        match &self.sections {
            Some(sections) => sections.iter().any(|s| *s == info.section_identifier),
            None => true,
        }
    }

    pub fn from_json(text: &str) -> AnyResult<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|err| anyhow!("Config parse error: {err}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> AnyResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|err| anyhow!("Config parse error: {err}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse JSON, falling back to TOML
    pub fn parse(bytes: &[u8]) -> AnyResult<Self> {
        let value: serde_json::Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(json_err) => {
                let utf8 =
                    std::str::from_utf8(bytes).map_err(|err| anyhow!("{json_err}; {err}"))?;
                let toml_value: toml::Value = toml::from_str(utf8).map_err(|toml_err| {
                    anyhow!(
                        "Config is not valid JSON or TOML ({json_err}); TOML parse error: {toml_err}"
                    )
                })?;
                serde_json::to_value(toml_value)
                    .map_err(|err| anyhow!("Failed to convert TOML config to JSON: {err}"))?
            }
        };

        let config: Self =
            serde_json::from_value(value).map_err(|err| anyhow!("Config parse error: {err}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> AnyResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&bytes).with_context(|| format!("Invalid config {}", path.display()))
    }
}
