//! # Advisor Graph
//!
//! Dependency graph over rule declarations.
//!
//! ## Features
//!
//! - **Eager ordering** - topological order computed once, parents first
//! - **Cycle detection** - cycles fail the build and name every rule involved
//! - **Dangling parents** - references to undeclared rules are recorded, not fatal
//!
//! ## Architecture
//!
//! ```text
//! RuleDeclaration[]
//!     │
//!     ├──> Nodes: rule identifiers
//!     ├──> Edges: parent -> child (evidence flow)
//!     │
//!     └──> RuleGraph (petgraph)
//!            ├─ order(): Kahn's algorithm, declaration order on ties
//!            └─ Cycle: tarjan SCC members
//! ```

mod error;
mod graph;
mod types;

pub use error::{GraphError, Result};
pub use types::{DanglingParent, RuleDeclaration, RuleGraph};
