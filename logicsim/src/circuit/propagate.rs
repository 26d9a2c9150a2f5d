//! Signal propagation
//!
//! Propagation pushes a changed state along outgoing wires, depth first in
//! wire order. Every pass keeps a visited set of element ids: a target that
//! was already visited still receives the written value but is not expanded
//! again, so each element is expanded at most once per pass and feedback
//! loops terminate. Feedback networks therefore get one update per trigger;
//! the periodic [`IntegratedCircuit::refresh_state`] tick re-settles them.
//!
//! The walk keeps its own stack of `(element, next wire)` frames, so chain
//! length is bounded by memory rather than by the thread stack.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::IntegratedCircuit;
use crate::error::{CircuitError, Result};
use crate::model::{ConnectorType, Element, ElementId, ElementKind};

/// Outcome of one propagation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropagationReport {
    /// Elements expanded during the pass, in visiting order.
    pub visited: Vec<ElementId>,
    /// Number of connector writes performed.
    pub writes: usize,
    /// Wires skipped because their target is missing or rejected the write.
    pub skipped: usize,
}

impl PropagationReport {
    fn merge(&mut self, other: PropagationReport) {
        self.visited.extend(other.visited);
        self.writes += other.writes;
        self.skipped += other.skipped;
    }
}

/// Per-pass lookup tables. Element and wire lists do not change while a
/// pass runs, so positions and fan-out are indexed once up front.
struct Pass {
    visited: HashSet<ElementId>,
    positions: HashMap<ElementId, usize>,
    outgoing: HashMap<ElementId, Vec<(usize, ElementId, usize)>>,
    report: PropagationReport,
}

impl Pass {
    fn new(circuit: &IntegratedCircuit) -> Self {
        let mut positions = HashMap::with_capacity(circuit.elements.len());
        for (pos, element) in circuit.elements.iter().enumerate() {
            positions.entry(element.id()).or_insert(pos);
        }

        let mut outgoing: HashMap<ElementId, Vec<_>> = HashMap::new();
        for wire in &circuit.wires {
            outgoing.entry(wire.from.element_id).or_default().push((
                wire.from.pin_index,
                wire.to.element_id,
                wire.to.pin_index,
            ));
        }

        Self {
            visited: HashSet::new(),
            positions,
            outgoing,
            report: PropagationReport::default(),
        }
    }

    /// Marks an element as expanded. Returns false if it already was.
    fn enter(&mut self, element_id: ElementId) -> bool {
        if !self.visited.insert(element_id) {
            return false;
        }
        self.report.visited.push(element_id);
        true
    }
}

/// Readable state of one element, for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementState {
    pub id: ElementId,
    pub kind: ElementKind,
    pub label: String,
    /// Connector states in connector order.
    pub states: Vec<bool>,
}

impl IntegratedCircuit {
    /// Propagates the current outputs of `element_id` through the circuit.
    pub fn propagate_from(&mut self, element_id: ElementId) -> PropagationReport {
        let mut pass = Pass::new(self);
        self.propagate(element_id, &mut pass);
        tracing::debug!(
            "Propagated from element {} in '{}': {} visited, {} writes",
            element_id,
            self.label,
            pass.report.visited.len(),
            pass.report.writes
        );
        pass.report
    }

    fn propagate(&mut self, root: ElementId, pass: &mut Pass) {
        if !pass.enter(root) {
            return;
        }
        let mut stack: Vec<(ElementId, usize)> = vec![(root, 0)];

        while let Some(frame) = stack.last_mut() {
            let (element_id, cursor) = *frame;
            let next = pass
                .outgoing
                .get(&element_id)
                .and_then(|wires| wires.get(cursor))
                .copied();
            let Some((from_index, target_id, to_index)) = next else {
                stack.pop();
                continue;
            };
            frame.1 += 1;

            let Some(source) = pass
                .positions
                .get(&element_id)
                .and_then(|&pos| self.elements.get(pos))
            else {
                stack.pop();
                continue;
            };
            let state = match source.connector_state(from_index) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!("Skipping wire from element {}: {}", element_id, e);
                    pass.report.skipped += 1;
                    continue;
                }
            };

            let Some(target) = pass
                .positions
                .get(&target_id)
                .and_then(|&pos| self.elements.get_mut(pos))
            else {
                tracing::debug!("Skipping wire to missing element {}", target_id);
                pass.report.skipped += 1;
                continue;
            };
            if let Err(e) = target.set_connector_state(to_index, state) {
                tracing::warn!("Skipping write to element {}: {}", target_id, e);
                pass.report.skipped += 1;
                continue;
            }
            pass.report.writes += 1;

            if pass.enter(target_id) {
                stack.push((target_id, 0));
            }
        }
    }

    /// Re-evaluates the whole circuit, as done on every simulation tick.
    ///
    /// Nested circuits are refreshed first so their internal sources settle.
    /// Then one pass runs from every pin in index order and finally from
    /// every element no pin reached, sharing a single visited set.
    pub fn refresh_state(&mut self) -> PropagationReport {
        for element in self.elements.iter_mut() {
            if let Element::Circuit(nested) = element {
                nested.refresh_state();
            }
        }

        let mut roots: Vec<ElementId> = self.pins().iter().map(|p| p.id).collect();
        roots.extend(self.elements.iter().map(Element::id));

        let mut pass = Pass::new(self);
        for id in roots {
            self.propagate(id, &mut pass);
        }
        pass.report
    }

    /// Runs [`Self::refresh_state`] until no state changes or `max_passes` is
    /// reached. Returns the number of passes run. Oscillating feedback
    /// networks never settle and always use all passes.
    pub fn settle(&mut self, max_passes: usize) -> usize {
        let mut passes = 0;
        while passes < max_passes {
            let before = self.signature();
            self.refresh_state();
            passes += 1;
            if self.signature() == before {
                break;
            }
        }
        passes
    }

    /// Flips a pin and propagates the new value.
    pub fn toggle_input_pin(&mut self, element_id: ElementId) -> Result<PropagationReport> {
        let element = self
            .find_element_mut(element_id)
            .ok_or(CircuitError::ElementNotFound(element_id))?;
        let pin = element
            .as_pin_mut()
            .ok_or(CircuitError::NotAPin(element_id))?;
        let next = !pin.state();
        pin.set_connector_state(0, next)?;
        Ok(self.propagate_from(element_id))
    }

    /// Writes one connector of a child element and propagates from it.
    pub fn set_element_state(
        &mut self,
        element_id: ElementId,
        index: usize,
        state: bool,
    ) -> Result<PropagationReport> {
        self.find_element_mut(element_id)
            .ok_or(CircuitError::ElementNotFound(element_id))?
            .set_connector_state(index, state)?;
        Ok(self.propagate_from(element_id))
    }

    /// Sets the input pins, in index order, from `values` and propagates each
    /// change. Extra values are ignored.
    pub fn apply_inputs(&mut self, values: &[bool]) -> Result<PropagationReport> {
        let inputs: Vec<ElementId> = self
            .pins_of_type(ConnectorType::Input)
            .iter()
            .map(|p| p.id)
            .collect();
        let mut report = PropagationReport::default();
        for (id, &value) in inputs.into_iter().zip(values) {
            report.merge(self.set_element_state(id, 0, value)?);
        }
        Ok(report)
    }

    /// Snapshot of every child element's connector states.
    pub fn snapshot(&self) -> Vec<ElementState> {
        self.elements
            .iter()
            .map(|e| ElementState {
                id: e.id(),
                kind: e.kind(),
                label: e.label().into_owned(),
                states: e
                    .connectors()
                    .iter()
                    .filter_map(|c| e.connector_state(c.pin_index).ok())
                    .collect(),
            })
            .collect()
    }

    /// All states of the tree, including nested internals.
    fn signature(&self) -> Vec<bool> {
        let mut out = Vec::new();
        self.collect_signature(&mut out);
        out
    }

    fn collect_signature(&self, out: &mut Vec<bool>) {
        for element in &self.elements {
            match element {
                Element::Gate(g) => {
                    out.extend_from_slice(g.inputs());
                    out.push(g.output());
                }
                Element::Pin(p) => out.push(p.state()),
                Element::Circuit(c) => c.collect_signature(out),
            }
        }
    }
}
