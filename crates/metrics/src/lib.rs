//! # Advisor Metrics
//!
//! Metric resolution for performance rules: locate named counters in a
//! partially populated catalog under two reliability contracts.
//!
//! ## Contracts
//!
//! - **Mandatory** - absence aborts the rule; every missing mandatory metric
//!   is named in the failure
//! - **Best effort** - absence is substituted by a fallback value or by an
//!   explicit missing marker, reported in one batched warning
//!
//! ## Architecture
//!
//! ```text
//! MetricRequest[]
//!     │
//!     ├──> MetricResolver
//!     │      ├─ Catalog lookup by name
//!     │      ├─ Fallback synthesis (typed setters)
//!     │      └─ Diagnostics to the ReportingSink
//!     │
//!     └──> ResolutionTable
//!            ├─ name  → ResolvedMetric
//!            └─ alias → name
//! ```
//!
//! ## Example
//!
//! ```rust
//! use advisor_metrics::{InMemoryCatalog, MetricRequest, MetricResolver, MetricValue};
//! use advisor_protocol::MemorySink;
//!
//! let catalog = InMemoryCatalog::new()
//!     .with("sm__throughput.avg.pct_of_peak_sustained_elapsed", MetricValue::Float(71.0));
//! let requests = [
//!     MetricRequest::required("sm__throughput.avg.pct_of_peak_sustained_elapsed").alias("sm_sol_pct"),
//!     MetricRequest::optional("launch__uses_green_context").fallback(false).quiet(),
//! ];
//!
//! let mut sink = MemorySink::new();
//! let metrics = MetricResolver::new()
//!     .resolve("SOLBottleneck", &catalog, &mut sink, &requests)
//!     .unwrap();
//!
//! assert_eq!(metrics.value("sm_sol_pct"), Some(71.0));
//! assert!(!metrics.get("launch__uses_green_context").unwrap().is_truthy());
//! ```

mod catalog;
mod error;
mod metric;
mod request;
mod resolver;
mod table;

pub use catalog::{InMemoryCatalog, MetricCatalog};
pub use error::{MetricError, Result, MISSING_REQUIRED_MESSAGE};
pub use metric::{Metric, MetricInstance, MetricValue};
pub use request::{FallbackValue, MetricRequest, Reliability};
pub use resolver::MetricResolver;
pub use table::{ResolutionTable, ResolvedMetric};
