//! Graph view of a circuit's wiring, built with petgraph.

use std::collections::HashMap;

use petgraph::algo::{is_cyclic_directed, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use super::IntegratedCircuit;
use crate::model::{Element, ElementId, WireId};

/// Statistics about a circuit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitStats {
    pub element_count: usize,
    pub gate_count: usize,
    pub pin_count: usize,
    pub subcircuit_count: usize,
    pub wire_count: usize,
    /// Levels of nesting below this circuit (0 if flat).
    pub depth: usize,
    /// True if the wiring of this circuit contains a directed cycle.
    pub has_feedback: bool,
}

impl IntegratedCircuit {
    /// Directed graph with one node per element and one edge per wire.
    /// Wires whose endpoints are missing are left out.
    pub fn to_graph(&self) -> DiGraph<ElementId, WireId> {
        let mut graph = DiGraph::with_capacity(self.elements.len(), self.wires.len());
        let mut indices: HashMap<ElementId, NodeIndex> = HashMap::new();

        for element in &self.elements {
            let idx = graph.add_node(element.id());
            indices.insert(element.id(), idx);
        }

        for wire in &self.wires {
            let (Some(&from), Some(&to)) = (
                indices.get(&wire.from.element_id),
                indices.get(&wire.to.element_id),
            ) else {
                continue;
            };
            graph.add_edge(from, to, wire.id);
        }

        graph
    }

    /// Groups of elements that form feedback loops. Each group lists element
    /// ids in ascending order.
    pub fn feedback_loops(&self) -> Vec<Vec<ElementId>> {
        let graph = self.to_graph();
        let mut loops: Vec<Vec<ElementId>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || scc.iter().any(|&n| graph.contains_edge(n, n)))
            .map(|scc| {
                let mut ids: Vec<ElementId> = scc.into_iter().map(|n| graph[n]).collect();
                ids.sort_unstable();
                ids
            })
            .collect();
        loops.sort();
        loops
    }

    /// Wires that reference an element which is not in this circuit.
    pub fn dangling_wires(&self) -> Vec<WireId> {
        self.wires
            .iter()
            .filter(|w| {
                self.find_element(w.from.element_id).is_none()
                    || self.find_element(w.to.element_id).is_none()
            })
            .map(|w| w.id)
            .collect()
    }

    /// Levels of nested circuits below this one.
    pub fn depth(&self) -> usize {
        self.elements
            .iter()
            .filter_map(Element::as_circuit)
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn stats(&self) -> CircuitStats {
        let mut gate_count = 0;
        let mut pin_count = 0;
        let mut subcircuit_count = 0;
        for element in &self.elements {
            match element {
                Element::Gate(_) => gate_count += 1,
                Element::Pin(_) => pin_count += 1,
                Element::Circuit(_) => subcircuit_count += 1,
            }
        }

        CircuitStats {
            element_count: self.elements.len(),
            gate_count,
            pin_count,
            subcircuit_count,
            wire_count: self.wires.len(),
            depth: self.depth(),
            has_feedback: is_cyclic_directed(&self.to_graph()),
        }
    }
}
