use crate::error::{GraphError, Result};
use crate::types::{DanglingParent, RuleDeclaration, RuleGraph};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};

impl RuleGraph {
    /// Build the graph and its execution order.
    ///
    /// Parents that name no declared rule are kept as dangling references
    /// (their evidence simply never arrives). Cycles fail the build and name
    /// every rule involved.
    pub fn build<I>(declarations: I) -> Result<Self>
    where
        I: IntoIterator<Item = RuleDeclaration>,
    {
        let declarations: Vec<RuleDeclaration> = declarations.into_iter().collect();
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        // Phase 1: one node per rule
        for decl in &declarations {
            if decl.identifier.trim().is_empty() {
                return Err(GraphError::EmptyIdentifier);
            }
            if index.contains_key(&decl.identifier) {
                return Err(GraphError::DuplicateRule(decl.identifier.clone()));
            }
            let idx = graph.add_node(decl.identifier.clone());
            index.insert(decl.identifier.clone(), idx);
        }

        // Phase 2: parent -> child edges
        let mut dangling = Vec::new();
        for decl in &declarations {
            let child = index[&decl.identifier];
            for parent in &decl.parents {
                match index.get(parent) {
                    Some(&parent_idx) => {
                        graph.update_edge(parent_idx, child, ());
                    }
                    None => {
                        log::warn!(
                            "Rule {} declares unknown parent {parent}; its evidence will be empty",
                            decl.identifier
                        );
                        dangling.push(DanglingParent {
                            rule: decl.identifier.clone(),
                            parent: parent.clone(),
                        });
                    }
                }
            }
        }

        let order = topological_order(&graph)?;

        log::info!(
            "Built rule graph: {} rules, {} dependencies",
            graph.node_count(),
            graph.edge_count()
        );

        Ok(Self {
            graph,
            index,
            order,
            dangling,
        })
    }

    /// Rule identifiers, parents before children
    #[must_use]
    pub fn order(&self) -> &[String] {
        &self.order
    }

    #[must_use]
    pub fn contains(&self, rule: &str) -> bool {
        self.index.contains_key(rule)
    }

    /// Declared parents that exist in the graph
    pub fn parents(&self, rule: &str) -> Result<Vec<&str>> {
        self.neighbors(rule, Direction::Incoming)
    }

    pub fn children(&self, rule: &str) -> Result<Vec<&str>> {
        self.neighbors(rule, Direction::Outgoing)
    }

    /// Parent identifiers that name no declared rule
    #[must_use]
    pub fn dangling_parents(&self) -> &[DanglingParent] {
        &self.dangling
    }

    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn neighbors(&self, rule: &str, direction: Direction) -> Result<Vec<&str>> {
        let idx = self
            .index
            .get(rule)
            .ok_or_else(|| GraphError::RuleNotFound(rule.to_string()))?;

        let mut found: Vec<NodeIndex> = self.graph.neighbors_directed(*idx, direction).collect();
        found.sort();
        Ok(found
            .into_iter()
            .map(|n| self.graph[n].as_str())
            .collect())
    }
}

/// Kahn's algorithm; ready rules are taken in declaration order.
fn topological_order(graph: &DiGraph<String, ()>) -> Result<Vec<String>> {
    let mut in_degree: HashMap<NodeIndex, usize> = graph
        .node_indices()
        .map(|n| (n, graph.neighbors_directed(n, Direction::Incoming).count()))
        .collect();

    let mut ready: BTreeSet<NodeIndex> = in_degree
        .iter()
        .filter(|&(_, &deg)| deg == 0)
        .map(|(&n, _)| n)
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some(node) = ready.pop_first() {
        order.push(graph[node].clone());
        for child in graph.neighbors_directed(node, Direction::Outgoing) {
            if let Some(deg) = in_degree.get_mut(&child) {
                *deg -= 1;
                if *deg == 0 {
                    ready.insert(child);
                }
            }
        }
    }

    if order.len() == graph.node_count() {
        return Ok(order);
    }

    let mut rules: Vec<NodeIndex> = tarjan_scc(graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .flatten()
        .collect();
    rules.sort();
    let rules: Vec<String> = rules.into_iter().map(|n| graph[n].clone()).collect();

    log::error!("Rule graph has a dependency cycle: {}", rules.join(", "));
    Err(GraphError::Cycle { rules })
}
