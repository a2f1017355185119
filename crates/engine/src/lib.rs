//! # Advisor Engine
//!
//! Runs performance rules over profiled units: resolves each rule's metrics,
//! evaluates it, and carries evidence from parent rules to their children.
//!
//! ## Features
//!
//! - **Eager ordering** - the rule graph is built once; cycles fail construction
//! - **Per-unit evidence** - every pass owns a fresh [`EvidenceChannel`]
//! - **All-or-nothing findings** - an aborted rule reports no finding
//! - **Speedup policy** - global when a parent weight exists, local otherwise
//!
//! ## Architecture
//!
//! ```text
//! RuleSet (immutable, Send + Sync)
//!     │
//!     ├──> RuleGraph: parents before children
//!     │
//!     └──> evaluate_unit(unit, sink)
//!            │
//!            ├─ EvidenceChannel (fresh per call)
//!            │
//!            └─ per rule: Declared → Resolving ─┬─> Aborted
//!                                               └─> Evaluating ─┬─> Emitted
//!                                                               ├─> Skipped
//!                                                               └─> Aborted
//! ```
//!
//! ## Example
//!
//! ```rust
//! use advisor_engine::{Result, Rule, RuleContext, RuleInfo, RuleSet, ProfiledUnit};
//! use advisor_metrics::{InMemoryCatalog, MetricRequest, MetricValue, ResolutionTable};
//! use advisor_protocol::{MemorySink, Severity};
//!
//! struct Occupancy(RuleInfo);
//!
//! impl Rule for Occupancy {
//!     fn info(&self) -> &RuleInfo {
//!         &self.0
//!     }
//!
//!     fn requested_metrics(&self) -> Vec<MetricRequest> {
//!         vec![MetricRequest::required("sm__warps_active.avg.pct_of_peak_sustained_active")
//!             .alias("achieved_occupancy")]
//!     }
//!
//!     fn evaluate(&self, ctx: &mut RuleContext<'_>, metrics: &ResolutionTable) -> Result<()> {
//!         let achieved = metrics.require("achieved_occupancy")?.value();
//!         if achieved < 50.0 {
//!             let finding = ctx.finding(Severity::Optimization, "Occupancy", "Low achieved occupancy");
//!             ctx.report(finding);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let set = RuleSet::with_defaults(vec![Box::new(Occupancy(RuleInfo::new("Occupancy")))]).unwrap();
//! let unit = ProfiledUnit::new(
//!     "kernel-0",
//!     InMemoryCatalog::new()
//!         .with("sm__warps_active.avg.pct_of_peak_sustained_active", MetricValue::Float(31.5)),
//! );
//!
//! let mut sink = MemorySink::new();
//! set.evaluate_unit(&unit, &mut sink).unwrap();
//! assert_eq!(sink.findings().len(), 1);
//! ```

mod config;
mod context;
mod error;
mod evidence;
mod lifecycle;
mod orchestrator;
mod rule;
mod speedup;
mod unit;

pub use config::EngineConfig;
pub use context::RuleContext;
pub use error::{EngineError, Result};
pub use evidence::{EvidenceChannel, EvidencePayload};
pub use lifecycle::{Lifecycle, RuleOutcome, RuleState};
pub use orchestrator::{RuleReport, RuleSet, UnitReport};
pub use rule::{Rule, RuleInfo};
pub use speedup::estimate_speedup;
pub use unit::{ProfiledUnit, WorkloadKind};
