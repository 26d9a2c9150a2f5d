//! Integrated circuits
//!
//! An [`IntegratedCircuit`] owns a set of child elements and the wires between
//! them. Because it is itself an [`Element`], a circuit can be placed inside
//! another circuit; its pins then become the connectors of the nested block.
//! Ownership is a strict tree: elements are addressed by circuit-local ids and
//! never shared between circuits.

pub mod graph;
pub mod propagate;
pub mod truth_table;

use std::collections::HashSet;
use std::hash::Hash;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{CircuitError, Result};
use crate::model::element::{CircuitFields, ElementRecord};
use crate::model::{
    Connector, ConnectorType, Element, ElementId, Gate, GateType, Pin, PinType, Point, Wire,
    WireId,
};

pub use graph::CircuitStats;
pub use propagate::{ElementState, PropagationReport};
pub use truth_table::{TruthRow, TruthTable};

/// A circuit of gates, pins and nested circuits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegratedCircuit {
    pub id: ElementId,
    pub label: String,
    pub position: Point,
    pub(crate) elements: Vec<Element>,
    pub(crate) wires: Vec<Wire>,
}

impl Default for IntegratedCircuit {
    fn default() -> Self {
        Self::new(0, "CIRCUIT", Point::default())
    }
}

impl IntegratedCircuit {
    /// Create a new empty circuit
    pub fn new(id: ElementId, label: impl Into<String>, position: Point) -> Self {
        Self {
            id,
            label: label.into(),
            position,
            elements: Vec::new(),
            wires: Vec::new(),
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    pub fn find_element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    pub fn find_element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id() == id)
    }

    pub fn find_wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.iter().find(|w| w.id == id)
    }

    /// Boundary pins ordered by their index.
    pub fn pins(&self) -> Vec<&Pin> {
        let mut pins: Vec<&Pin> = self.elements.iter().filter_map(Element::as_pin).collect();
        pins.sort_by_key(|p| p.index);
        pins
    }

    /// Boundary pins of one role, ordered by index.
    pub fn pins_of_type(&self, pin_type: PinType) -> Vec<&Pin> {
        self.pins()
            .into_iter()
            .filter(|p| p.pin_type == pin_type)
            .collect()
    }

    pub fn pin_by_index(&self, index: usize) -> Result<&Pin> {
        self.elements
            .iter()
            .filter_map(Element::as_pin)
            .find(|p| p.index == index)
            .ok_or(CircuitError::PinNotFound(index))
    }

    fn pin_by_index_mut(&mut self, index: usize) -> Option<&mut Pin> {
        self.elements
            .iter_mut()
            .filter_map(Element::as_pin_mut)
            .find(|p| p.index == index)
    }

    // ---------------------------------------------------------------------
    // Element contract: the circuit seen as a block inside its parent.
    // ---------------------------------------------------------------------

    fn upper_half(&self) -> usize {
        self.pins().len().div_ceil(2)
    }

    pub fn dimensions(&self) -> (i32, i32) {
        (3, self.upper_half() as i32 + 1)
    }

    /// Boundary connectors: the first half of the pins on the left edge, the
    /// rest on the right edge.
    pub fn connectors(&self) -> Vec<Connector> {
        let upper_half = self.upper_half();
        self.pins()
            .into_iter()
            .enumerate()
            .map(|(i, pin)| {
                let (dx, row) = if i < upper_half {
                    (0, i)
                } else {
                    (3, i % upper_half)
                };
                Connector::new(
                    self.position.offset(dx, row as i32 + 1),
                    pin.pin_type,
                    self.id,
                    pin.index,
                )
                .with_label(pin.label())
            })
            .collect()
    }

    pub fn connector_type(&self, index: usize) -> Result<ConnectorType> {
        self.boundary_pin(index).map(|p| p.pin_type)
    }

    pub fn connector_state(&self, index: usize) -> Result<bool> {
        self.boundary_pin(index).map(|p| p.state())
    }

    /// Drives an input pin from outside and propagates the new value through
    /// the internal wiring.
    pub fn set_connector_state(&mut self, index: usize, state: bool) -> Result<PropagationReport> {
        let id = self.id;
        let pin = self
            .pin_by_index_mut(index)
            .ok_or(CircuitError::InvalidConnectorIndex { element: id, index })?;
        if pin.pin_type != ConnectorType::Input {
            return Err(CircuitError::ReadOnlyConnector { element: id, index });
        }
        pin.set_connector_state(0, state)?;
        let pin_id = pin.id;
        Ok(self.propagate_from(pin_id))
    }

    fn boundary_pin(&self, index: usize) -> Result<&Pin> {
        self.pin_by_index(index)
            .map_err(|_| CircuitError::InvalidConnectorIndex {
                element: self.id,
                index,
            })
    }

    // ---------------------------------------------------------------------
    // Element management
    // ---------------------------------------------------------------------

    /// One past the largest element id, or 0 for an empty circuit. Once
    /// `u32::MAX` is taken, the lowest unused id.
    pub fn next_element_id(&self) -> ElementId {
        next_free(
            self.elements.iter().map(Element::id).collect(),
            0,
            |id: ElementId| id.checked_add(1),
        )
    }

    /// One past the largest pin index, or 0 if there are no pins.
    pub fn next_pin_index(&self) -> usize {
        next_free(
            self.elements
                .iter()
                .filter_map(Element::as_pin)
                .map(|p| p.index)
                .collect(),
            0,
            |index: usize| index.checked_add(1),
        )
    }

    /// One past the largest wire id, or 0 if there are no wires.
    pub fn next_wire_id(&self) -> WireId {
        next_free(
            self.wires.iter().map(|w| w.id).collect(),
            0,
            |id: WireId| id.checked_add(1),
        )
    }

    /// Adds an element, keeping its id.
    pub fn add_element(&mut self, element: Element) -> Result<ElementId> {
        let id = element.id();
        if self.find_element(id).is_some() {
            return Err(CircuitError::DuplicateElementId(id));
        }
        match &element {
            Element::Pin(pin) if self.pin_by_index(pin.index).is_ok() => {
                return Err(CircuitError::DuplicatePinIndex(pin.index));
            }
            Element::Circuit(nested) => nested.check_nesting_under(&self.label)?,
            _ => {}
        }
        tracing::debug!("Adding {} element {} to '{}'", element.kind(), id, self.label);
        self.elements.push(element);
        Ok(id)
    }

    pub fn add_gate(&mut self, gate_type: GateType, position: Point) -> ElementId {
        let id = self.next_element_id();
        self.elements.push(Element::Gate(Gate::new(id, gate_type, position)));
        id
    }

    /// Adds a pin with the next free pin index.
    pub fn add_pin(&mut self, pin_type: PinType, position: Point) -> ElementId {
        let id = self.next_element_id();
        let index = self.next_pin_index();
        self.elements
            .push(Element::Pin(Pin::new(id, pin_type, position, index)));
        id
    }

    /// Embeds `circuit` as a child block with a fresh id.
    pub fn add_subcircuit(&mut self, mut circuit: IntegratedCircuit, position: Point) -> Result<ElementId> {
        circuit.id = self.next_element_id();
        circuit.position = position;
        self.add_element(Element::Circuit(Box::new(circuit)))
    }

    /// Removes an element and every wire attached to it.
    pub fn delete_element(&mut self, id: ElementId) -> Result<Element> {
        let pos = self
            .elements
            .iter()
            .position(|e| e.id() == id)
            .ok_or(CircuitError::ElementNotFound(id))?;
        let element = self.elements.remove(pos);
        let before = self.wires.len();
        self.wires.retain(|w| !w.touches(id));
        tracing::debug!(
            "Deleted element {} from '{}' with {} wires",
            id,
            self.label,
            before - self.wires.len()
        );
        Ok(element)
    }

    /// Moves an element and re-anchors the endpoints of its wires. Interior
    /// waypoints are left alone.
    pub fn move_element(&mut self, id: ElementId, position: Point) -> Result<()> {
        let element = self
            .find_element_mut(id)
            .ok_or(CircuitError::ElementNotFound(id))?;
        element.set_position(position);
        let connectors = element.connectors();

        for wire in self.wires.iter_mut() {
            if wire.from.element_id == id {
                if let Some(c) = connectors.iter().find(|c| c.pin_index == wire.from.pin_index) {
                    wire.reattach_from(c.clone());
                }
            }
            if wire.to.element_id == id {
                if let Some(c) = connectors.iter().find(|c| c.pin_index == wire.to.pin_index) {
                    wire.reattach_to(c.clone());
                }
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Wire management
    // ---------------------------------------------------------------------

    /// True if a wire already joins these two terminals in this direction.
    pub fn wire_exists(&self, from: &Connector, to: &Connector) -> bool {
        self.wires.iter().any(|w| w.connects(from, to))
    }

    /// Connects an output terminal to an input terminal.
    ///
    /// The endpoint snapshots are taken from the live elements, so only the
    /// element id and pin index of `from` and `to` matter.
    pub fn add_wire(&mut self, from: &Connector, to: &Connector, waypoints: &[Point]) -> Result<WireId> {
        let from = self.live_connector(from, ConnectorType::Output)?;
        let to = self.live_connector(to, ConnectorType::Input)?;
        if self.wire_exists(&from, &to) {
            return Err(CircuitError::DuplicateWire {
                from_element: from.element_id,
                from_index: from.pin_index,
                to_element: to.element_id,
                to_index: to.pin_index,
            });
        }
        let id = self.next_wire_id();
        self.wires.push(Wire::new(id, from, to, waypoints));
        Ok(id)
    }

    /// Convenience wrapper around [`Self::add_wire`] taking element ids and
    /// connector indices.
    pub fn connect(
        &mut self,
        from: (ElementId, usize),
        to: (ElementId, usize),
    ) -> Result<WireId> {
        let from = self.terminal(from.0, from.1)?;
        let to = self.terminal(to.0, to.1)?;
        self.add_wire(&from, &to, &[])
    }

    pub fn remove_wire(&mut self, id: WireId) -> Result<Wire> {
        let pos = self
            .wires
            .iter()
            .position(|w| w.id == id)
            .ok_or(CircuitError::WireNotFound(id))?;
        Ok(self.wires.remove(pos))
    }

    fn terminal(&self, element: ElementId, index: usize) -> Result<Connector> {
        self.find_element(element)
            .ok_or(CircuitError::ElementNotFound(element))?
            .connector(index)
    }

    fn live_connector(&self, connector: &Connector, expected: ConnectorType) -> Result<Connector> {
        let live = self.terminal(connector.element_id, connector.pin_index)?;
        if live.connector_type != expected {
            return Err(CircuitError::ConnectorMismatch {
                expected,
                actual: live.connector_type,
            });
        }
        Ok(live)
    }

    // ---------------------------------------------------------------------
    // Clock sources
    // ---------------------------------------------------------------------

    /// Advances every clock pin in this circuit and all nested circuits.
    /// Returns true if any clock changed level. Nothing is propagated.
    pub fn advance_clocks(&mut self, now: Duration) -> bool {
        let mut changed = false;
        for element in self.elements.iter_mut() {
            changed |= element.advance(now);
        }
        changed
    }

    pub fn set_clock_period(&mut self, period: Duration) {
        for element in self.elements.iter_mut() {
            match element {
                Element::Pin(p) => p.set_clock_period(period),
                Element::Circuit(c) => c.set_clock_period(period),
                Element::Gate(_) => {}
            }
        }
    }

    /// Cancels every clock oscillator in the tree.
    pub fn stop_clocks(&mut self) {
        for element in self.elements.iter_mut() {
            match element {
                Element::Pin(p) => p.stop_clock(),
                Element::Circuit(c) => c.stop_clocks(),
                Element::Gate(_) => {}
            }
        }
    }

    pub fn start_clocks(&mut self) {
        for element in self.elements.iter_mut() {
            match element {
                Element::Pin(p) => p.start_clock(),
                Element::Circuit(c) => c.start_clocks(),
                Element::Gate(_) => {}
            }
        }
    }

    // ---------------------------------------------------------------------
    // Serialization
    // ---------------------------------------------------------------------

    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rebuilds a circuit from its `IC` record and validates the result.
    pub fn from_json(value: Value) -> Result<Self> {
        if let Some(kind) = value.get("kind").and_then(Value::as_str) {
            if kind != "IC" {
                return Err(CircuitError::InvalidRecord(format!(
                    "expected an IC record, found {}",
                    kind
                )));
            }
        }

        let record: CircuitRecord = serde_json::from_value(value)?;
        let elements = record
            .elements
            .into_iter()
            .map(Element::from_json)
            .collect::<Result<Vec<_>>>()?;

        let circuit = Self {
            id: record.id,
            label: record.label,
            position: record.position,
            elements,
            wires: record.wires,
        };
        circuit.validate()?;
        Ok(circuit)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json(value)
    }

    /// Checks structural invariants: element ids, pin indices, wire ids and
    /// wire endpoints are unique per circuit, and no nested circuit carries the
    /// label of one of its ancestors.
    pub fn validate(&self) -> Result<()> {
        self.validate_scope(&mut Vec::new())
    }

    fn validate_scope<'a>(&'a self, ancestors: &mut Vec<&'a str>) -> Result<()> {
        if ancestors.contains(&self.label.as_str()) {
            return Err(CircuitError::RecursiveNesting(self.label.clone()));
        }

        let mut seen = HashSet::new();
        let mut indices = HashSet::new();
        for element in &self.elements {
            if !seen.insert(element.id()) {
                return Err(CircuitError::DuplicateElementId(element.id()));
            }
            if let Element::Pin(pin) = element {
                if !indices.insert(pin.index) {
                    return Err(CircuitError::DuplicatePinIndex(pin.index));
                }
            }
        }

        let mut wire_ids = HashSet::new();
        let mut endpoints = HashSet::new();
        for wire in &self.wires {
            if !wire_ids.insert(wire.id) {
                return Err(CircuitError::DuplicateWireId(wire.id));
            }
            let key = (
                wire.from.element_id,
                wire.from.pin_index,
                wire.to.element_id,
                wire.to.pin_index,
            );
            if !endpoints.insert(key) {
                return Err(CircuitError::DuplicateWire {
                    from_element: key.0,
                    from_index: key.1,
                    to_element: key.2,
                    to_index: key.3,
                });
            }
        }

        ancestors.push(&self.label);
        for element in &self.elements {
            if let Element::Circuit(nested) = element {
                nested.validate_scope(ancestors)?;
            }
        }
        ancestors.pop();
        Ok(())
    }

    /// Validates this circuit as if it were placed inside a circuit labelled
    /// `parent_label`.
    pub(crate) fn check_nesting_under(&self, parent_label: &str) -> Result<()> {
        let mut ancestors = vec![parent_label];
        self.validate_scope(&mut ancestors)
    }
}

/// Successor of the largest value in `used`, falling back to the lowest
/// value not in `used` when the successor would overflow.
fn next_free<T>(used: Vec<T>, zero: T, succ: impl Fn(T) -> Option<T>) -> T
where
    T: Copy + Ord + Hash,
{
    let Some(&max) = used.iter().max() else {
        return zero;
    };
    if let Some(next) = succ(max) {
        return next;
    }
    let used: HashSet<T> = used.into_iter().collect();
    std::iter::successors(Some(zero), |&value| succ(value))
        .find(|value| !used.contains(value))
        .unwrap_or(zero)
}

#[derive(Deserialize)]
struct CircuitRecord {
    id: ElementId,
    label: String,
    position: Point,
    #[serde(default)]
    elements: Vec<Value>,
    #[serde(default)]
    wires: Vec<Wire>,
}

impl Serialize for IntegratedCircuit {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        ElementRecord::Circuit(CircuitFields {
            id: self.id,
            label: &self.label,
            position: self.position,
            elements: &self.elements,
            wires: &self.wires,
        })
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for IntegratedCircuit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        IntegratedCircuit::from_json(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(circuit: &IntegratedCircuit, id: ElementId, index: usize) -> Connector {
        circuit.find_element(id).unwrap().connector(index).unwrap()
    }

    #[test]
    fn test_id_allocation() {
        let mut circuit = IntegratedCircuit::default();
        assert_eq!(circuit.next_element_id(), 0);
        assert_eq!(circuit.next_pin_index(), 0);
        assert_eq!(circuit.next_wire_id(), 0);

        let a = circuit.add_pin(ConnectorType::Input, Point(0, 0));
        let b = circuit.add_gate(GateType::Not, Point(4, 0));
        let c = circuit.add_pin(ConnectorType::Output, Point(8, 0));
        assert_eq!((a, b, c), (0, 1, 2));
        assert_eq!(circuit.next_pin_index(), 2);

        circuit.delete_element(b).unwrap();
        assert_eq!(circuit.next_element_id(), 3);
        circuit.delete_element(c).unwrap();
        assert_eq!(circuit.next_element_id(), 1);
    }

    #[test]
    fn test_add_element_rejects_duplicate_id() {
        let mut circuit = IntegratedCircuit::default();
        circuit.add_gate(GateType::And, Point(0, 0));
        let err = circuit
            .add_element(Gate::new(0, GateType::Or, Point(0, 0)).into())
            .unwrap_err();
        assert!(matches!(err, CircuitError::DuplicateElementId(0)));
    }

    #[test]
    fn test_add_element_rejects_duplicate_pin_index() {
        let mut circuit = IntegratedCircuit::default();
        circuit.add_pin(ConnectorType::Input, Point(0, 0));
        let err = circuit
            .add_element(Pin::new(5, ConnectorType::Output, Point(4, 0), 0).into())
            .unwrap_err();
        assert!(matches!(err, CircuitError::DuplicatePinIndex(0)));
        assert_eq!(circuit.elements().len(), 1);

        circuit
            .add_element(Pin::new(5, ConnectorType::Output, Point(4, 0), 1).into())
            .unwrap();
        assert_eq!(circuit.next_pin_index(), 2);
    }

    #[test]
    fn test_load_rejects_duplicate_pin_index() {
        let mut circuit = IntegratedCircuit::default();
        circuit
            .elements
            .push(Pin::new(0, ConnectorType::Input, Point(0, 0), 3).into());
        circuit
            .elements
            .push(Pin::new(1, ConnectorType::Output, Point(4, 0), 3).into());
        let record = circuit.to_json().unwrap();
        assert!(matches!(
            IntegratedCircuit::from_json(record),
            Err(CircuitError::DuplicatePinIndex(3))
        ));
    }

    #[test]
    fn test_id_allocation_after_max_value() {
        let mut circuit = IntegratedCircuit::default();
        circuit.add_gate(GateType::Not, Point(0, 0));
        circuit
            .add_element(Gate::new(u32::MAX, GateType::Not, Point(4, 0)).into())
            .unwrap();
        assert_eq!(circuit.next_element_id(), 1);

        circuit
            .add_element(Pin::new(1, ConnectorType::Input, Point(0, 4), usize::MAX).into())
            .unwrap();
        assert_eq!(circuit.next_pin_index(), 0);
        let pin = circuit.add_pin(ConnectorType::Output, Point(8, 0));
        assert_eq!(pin, 2);
        assert_eq!(circuit.next_pin_index(), 1);

        let from = conn(&circuit, 1, 0);
        let to = conn(&circuit, 0, 0);
        circuit.wires.push(Wire::new(u32::MAX, from, to, &[]));
        assert_eq!(circuit.next_wire_id(), 0);
    }

    #[test]
    fn test_wire_exists_and_duplicate_rejected() {
        let mut circuit = IntegratedCircuit::default();
        let pin = circuit.add_pin(ConnectorType::Input, Point(0, 0));
        let gate = circuit.add_gate(GateType::Not, Point(4, 0));
        let from = conn(&circuit, pin, 0);
        let to = conn(&circuit, gate, 0);

        assert!(!circuit.wire_exists(&from, &to));
        circuit.add_wire(&from, &to, &[]).unwrap();
        assert!(circuit.wire_exists(&from, &to));
        assert!(!circuit.wire_exists(&to, &from));

        let err = circuit.add_wire(&from, &to, &[Point(3, 3)]).unwrap_err();
        assert!(matches!(err, CircuitError::DuplicateWire { .. }));
        assert_eq!(circuit.wires().len(), 1);
    }

    #[test]
    fn test_add_wire_checks_direction() {
        let mut circuit = IntegratedCircuit::default();
        let pin = circuit.add_pin(ConnectorType::Input, Point(0, 0));
        let gate = circuit.add_gate(GateType::Not, Point(4, 0));

        let err = circuit.connect((gate, 0), (pin, 0)).unwrap_err();
        assert!(matches!(
            err,
            CircuitError::ConnectorMismatch {
                expected: ConnectorType::Output,
                actual: ConnectorType::Input
            }
        ));
        assert!(matches!(
            circuit.connect((pin, 0), (42, 0)),
            Err(CircuitError::ElementNotFound(42))
        ));
        assert!(matches!(
            circuit.connect((pin, 3), (gate, 0)),
            Err(CircuitError::InvalidConnectorIndex { index: 3, .. })
        ));
    }

    #[test]
    fn test_delete_cascades_wires() {
        let mut circuit = IntegratedCircuit::default();
        let a = circuit.add_pin(ConnectorType::Input, Point(0, 0));
        let g = circuit.add_gate(GateType::And, Point(4, 0));
        let b = circuit.add_pin(ConnectorType::Input, Point(0, 4));
        let out = circuit.add_pin(ConnectorType::Output, Point(8, 0));
        circuit.connect((a, 0), (g, 0)).unwrap();
        circuit.connect((b, 0), (g, 1)).unwrap();
        circuit.connect((g, 2), (out, 0)).unwrap();
        circuit.connect((a, 0), (out, 0)).unwrap();

        circuit.delete_element(g).unwrap();
        assert!(circuit.wires().iter().all(|w| !w.touches(g)));
        assert_eq!(circuit.wires().len(), 1);
        assert!(matches!(
            circuit.delete_element(g),
            Err(CircuitError::ElementNotFound(_))
        ));
    }

    #[test]
    fn test_move_updates_endpoints_only() {
        let mut circuit = IntegratedCircuit::default();
        let a = circuit.add_pin(ConnectorType::Input, Point(0, 0));
        let g = circuit.add_gate(GateType::Not, Point(10, 0));
        let from = conn(&circuit, a, 0);
        let to = conn(&circuit, g, 0);
        let waypoints = [Point(5, 1), Point(5, 7), Point(8, 7)];
        let wire = circuit.add_wire(&from, &to, &waypoints).unwrap();

        circuit.move_element(g, Point(20, 20)).unwrap();
        let w = circuit.find_wire(wire).unwrap();
        assert_eq!(w.to.position, Point(20, 21));
        assert_eq!(*w.path.last().unwrap(), Point(20, 21));
        assert_eq!(w.path[0], Point(2, 1));
        assert_eq!(w.waypoints(), &waypoints);

        circuit.move_element(a, Point(-4, 3)).unwrap();
        let w = circuit.find_wire(wire).unwrap();
        assert_eq!(w.from.position, Point(-2, 4));
        assert_eq!(w.path[0], Point(-2, 4));
        assert_eq!(w.waypoints(), &waypoints);
    }

    #[test]
    fn test_boundary_layout() {
        let mut ic = IntegratedCircuit::new(7, "ADDER", Point(10, 10));
        for t in [
            ConnectorType::Input,
            ConnectorType::Input,
            ConnectorType::Input,
            ConnectorType::Output,
            ConnectorType::Output,
        ] {
            ic.add_pin(t, Point(0, 0));
        }
        assert_eq!(ic.dimensions(), (3, 4));
        let conns = ic.connectors();
        let positions: Vec<Point> = conns.iter().map(|c| c.position).collect();
        assert_eq!(
            positions,
            vec![
                Point(10, 11),
                Point(10, 12),
                Point(10, 13),
                Point(13, 11),
                Point(13, 12)
            ]
        );
        assert_eq!(conns[0].connector_type, ConnectorType::Input);
        assert_eq!(conns[4].connector_type, ConnectorType::Output);
        assert_eq!(conns[3].label.as_deref(), Some("OUT_3"));
        assert!(conns.iter().all(|c| c.element_id == 7));
    }

    #[test]
    fn test_external_write_only_on_input_pins() {
        let mut ic = IntegratedCircuit::new(1, "BUF", Point(0, 0));
        ic.add_pin(ConnectorType::Input, Point(0, 0));
        ic.add_pin(ConnectorType::Output, Point(6, 0));
        ic.connect((0, 0), (1, 0)).unwrap();

        ic.set_connector_state(0, true).unwrap();
        assert!(ic.connector_state(1).unwrap());
        assert!(matches!(
            ic.set_connector_state(1, false),
            Err(CircuitError::ReadOnlyConnector { index: 1, .. })
        ));
        assert!(matches!(
            ic.set_connector_state(9, false),
            Err(CircuitError::InvalidConnectorIndex { index: 9, .. })
        ));
    }

    #[test]
    fn test_nesting_self_label_rejected() {
        let mut outer = IntegratedCircuit::new(0, "LATCH", Point(0, 0));
        let inner = IntegratedCircuit::new(0, "LATCH", Point(0, 0));
        let err = outer.add_subcircuit(inner, Point(3, 3)).unwrap_err();
        assert!(matches!(err, CircuitError::RecursiveNesting(label) if label == "LATCH"));

        let other = IntegratedCircuit::new(0, "NOT_LATCH", Point(0, 0));
        let id = outer.add_subcircuit(other, Point(3, 3)).unwrap();
        assert_eq!(outer.find_element(id).unwrap().position(), Point(3, 3));
    }
}
