use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use advisor_protocol::ReportingSink;

use crate::catalog::MetricCatalog;
use crate::error::{MetricError, Result};
use crate::metric::Metric;
use crate::request::{MetricRequest, Reliability};
use crate::table::{ResolutionTable, ResolvedMetric};

/// Resolves batches of [`MetricRequest`]s against a catalog.
///
/// Missing best-effort metrics are substituted by their fallback or by a
/// missing marker and reported in a single warning per batch. Missing
/// mandatory metrics are each reported as an error and then fail the whole
/// batch together, so a rule never sees a partially resolved mandatory set.
#[derive(Debug, Clone, Copy)]
pub struct MetricResolver {
    warn_on_missing_optional: bool,
}

impl Default for MetricResolver {
    fn default() -> Self {
        Self {
            warn_on_missing_optional: true,
        }
    }
}

impl MetricResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: enable or silence the batched missing-metric warning
    #[must_use]
    pub const fn warn_on_missing_optional(mut self, enabled: bool) -> Self {
        self.warn_on_missing_optional = enabled;
        self
    }

    /// Resolve `requests` for `rule`, reporting diagnostics to `sink`.
    pub fn resolve(
        &self,
        rule: &str,
        catalog: &dyn MetricCatalog,
        sink: &mut dyn ReportingSink,
        requests: &[MetricRequest],
    ) -> Result<ResolutionTable> {
        let requests = dedup_requests(requests)?;
        check_keys(&requests)?;

        let mut table = ResolutionTable::new();
        let mut missing_required: Vec<String> = Vec::new();
        let mut missing_optional: Vec<&str> = Vec::new();

        for request in requests {
            if let Some(handle) = catalog.lookup(&request.name) {
                table.insert(ResolvedMetric::found(request, handle))?;
                continue;
            }

            match request.reliability {
                Reliability::BestEffort => {
                    let resolved = match &request.fallback {
                        Some(fallback) => {
                            let metric = catalog.synthesize(&request.name, fallback);
                            ResolvedMetric::synthesized(request, Arc::new(metric))
                        }
                        None => ResolvedMetric::missing(request),
                    };
                    table.insert(resolved)?;
                    if request.warn_if_missing {
                        missing_optional.push(&request.name);
                    }
                }
                Reliability::Mandatory => {
                    let message = format!("Required metric {} could not be found.", request.name);
                    sink.emit_error(rule, &message);
                    missing_required.push(request.name.clone());
                }
            }
        }

        if self.warn_on_missing_optional && !missing_optional.is_empty() {
            sink.emit_warning(rule, &missing_optional_warning(&missing_optional));
        }

        if !missing_required.is_empty() {
            let err = MetricError::MissingRequired {
                names: missing_required,
            };
            log::warn!("Rule {rule}: {err}");
            return Err(err);
        }

        log::debug!(
            "Rule {rule}: resolved {} metrics ({} missing optional)",
            table.len(),
            table.missing().count()
        );
        Ok(table)
    }

    /// Resolve the metrics listed by a breakdown counter.
    ///
    /// A breakdown counter holds a comma-separated list of metric names; each
    /// listed metric is resolved as mandatory.
    pub fn resolve_breakdown(
        &self,
        rule: &str,
        catalog: &dyn MetricCatalog,
        sink: &mut dyn ReportingSink,
        breakdown: &Metric,
    ) -> Result<ResolutionTable> {
        let list = breakdown
            .as_str()
            .ok_or_else(|| MetricError::InvalidBreakdown(breakdown.name().to_string()))?;

        let requests: Vec<MetricRequest> = list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(MetricRequest::required)
            .collect();

        self.resolve(rule, catalog, sink, &requests)
    }
}

/// Drop exact repeats of a request; repeats that disagree are an error.
fn dedup_requests(requests: &[MetricRequest]) -> Result<Vec<&MetricRequest>> {
    let mut seen: HashMap<&str, &MetricRequest> = HashMap::new();
    let mut unique = Vec::with_capacity(requests.len());

    for request in requests {
        match seen.get(request.name.as_str()) {
            Some(first) if first.alias == request.alias && first.reliability == request.reliability => {
                log::debug!("Reusing resolution of repeated request {}", request.name);
            }
            Some(first) => {
                return Err(MetricError::ConflictingRequest {
                    name: request.name.clone(),
                    detail: format!(
                        "requested with alias {:?} and {:?}, then with alias {:?} and {:?}",
                        first.alias, first.reliability, request.alias, request.reliability
                    ),
                });
            }
            None => {
                seen.insert(&request.name, request);
                unique.push(request);
            }
        }
    }

    Ok(unique)
}

/// Every name and alias in the batch must point at exactly one request.
fn check_keys(requests: &[&MetricRequest]) -> Result<()> {
    let names: HashSet<&str> = requests.iter().map(|r| r.name.as_str()).collect();
    let mut aliases: HashMap<&str, &str> = HashMap::new();

    for request in requests {
        let Some(alias) = request.alias.as_deref().filter(|alias| *alias != request.name) else {
            continue;
        };
        if names.contains(alias) {
            return Err(MetricError::AliasCollision {
                alias: alias.to_string(),
                existing: alias.to_string(),
                requested: request.name.clone(),
            });
        }
        if let Some(owner) = aliases.insert(alias, &request.name) {
            return Err(MetricError::AliasCollision {
                alias: alias.to_string(),
                existing: owner.to_string(),
                requested: request.name.clone(),
            });
        }
    }

    Ok(())
}

fn missing_optional_warning(names: &[&str]) -> String {
    match names {
        [name] => format!(
            "The optional metric {name} could not be found. Collecting it as an additional \
             metric could enable the rule to provide more guidance."
        ),
        _ => format!(
            "The optional metrics {} could not be found. Collecting them as additional \
             metrics could enable the rule to provide more guidance.",
            names.join(", ")
        ),
    }
}
