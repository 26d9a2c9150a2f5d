//! The placeable element variants and the tagged record factory.

use std::borrow::Cow;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::{Connector, ConnectorType, ElementId, Gate, Pin, Point, Wire};
use crate::circuit::IntegratedCircuit;
use crate::error::{CircuitError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    #[serde(rename = "GATE")]
    Gate,
    #[serde(rename = "PIN")]
    Pin,
    #[serde(rename = "IC")]
    Ic,
}

impl ElementKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Gate => "GATE",
            ElementKind::Pin => "PIN",
            ElementKind::Ic => "IC",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Any node that can be placed in a circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Gate(Gate),
    Pin(Pin),
    Circuit(Box<IntegratedCircuit>),
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Gate(_) => ElementKind::Gate,
            Element::Pin(_) => ElementKind::Pin,
            Element::Circuit(_) => ElementKind::Ic,
        }
    }

    pub fn id(&self) -> ElementId {
        match self {
            Element::Gate(g) => g.id,
            Element::Pin(p) => p.id,
            Element::Circuit(c) => c.id,
        }
    }

    pub fn set_id(&mut self, id: ElementId) {
        match self {
            Element::Gate(g) => g.id = id,
            Element::Pin(p) => p.id = id,
            Element::Circuit(c) => c.id = id,
        }
    }

    pub fn label(&self) -> Cow<'_, str> {
        match self {
            Element::Gate(g) => Cow::Borrowed(g.label()),
            Element::Pin(p) => Cow::Owned(p.label()),
            Element::Circuit(c) => Cow::Borrowed(c.label.as_str()),
        }
    }

    pub fn position(&self) -> Point {
        match self {
            Element::Gate(g) => g.position,
            Element::Pin(p) => p.position,
            Element::Circuit(c) => c.position,
        }
    }

    pub fn set_position(&mut self, position: Point) {
        match self {
            Element::Gate(g) => g.position = position,
            Element::Pin(p) => p.position = position,
            Element::Circuit(c) => c.position = position,
        }
    }

    /// Size in grid units as `(width, height)`.
    pub fn dimensions(&self) -> (i32, i32) {
        match self {
            Element::Gate(g) => g.dimensions(),
            Element::Pin(p) => p.dimensions(),
            Element::Circuit(c) => c.dimensions(),
        }
    }

    pub fn connectors(&self) -> Vec<Connector> {
        match self {
            Element::Gate(g) => g.connectors(),
            Element::Pin(p) => p.connectors(),
            Element::Circuit(c) => c.connectors(),
        }
    }

    /// Looks up a connector by its `pin_index`.
    pub fn connector(&self, index: usize) -> Result<Connector> {
        self.connectors()
            .into_iter()
            .find(|c| c.pin_index == index)
            .ok_or(CircuitError::InvalidConnectorIndex {
                element: self.id(),
                index,
            })
    }

    pub fn connector_type(&self, index: usize) -> Result<ConnectorType> {
        match self {
            Element::Gate(g) => g.connector_type(index),
            Element::Pin(p) => p.connector_type(index),
            Element::Circuit(c) => c.connector_type(index),
        }
    }

    pub fn connector_state(&self, index: usize) -> Result<bool> {
        match self {
            Element::Gate(g) => g.connector_state(index),
            Element::Pin(p) => p.connector_state(index),
            Element::Circuit(c) => c.connector_state(index),
        }
    }

    /// Writes one terminal. Gates re-evaluate, nested circuits propagate the
    /// new value through their own wiring before returning.
    pub fn set_connector_state(&mut self, index: usize, state: bool) -> Result<()> {
        match self {
            Element::Gate(g) => g.set_connector_state(index, state),
            Element::Pin(p) => p.set_connector_state(index, state),
            Element::Circuit(c) => c.set_connector_state(index, state).map(|_| ()),
        }
    }

    /// Advances every clock oscillator owned by this element.
    pub fn advance(&mut self, now: Duration) -> bool {
        match self {
            Element::Gate(_) => false,
            Element::Pin(p) => p.advance(now),
            Element::Circuit(c) => c.advance_clocks(now),
        }
    }

    pub fn as_gate(&self) -> Option<&Gate> {
        match self {
            Element::Gate(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_pin(&self) -> Option<&Pin> {
        match self {
            Element::Pin(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_pin_mut(&mut self) -> Option<&mut Pin> {
        match self {
            Element::Pin(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_circuit(&self) -> Option<&IntegratedCircuit> {
        match self {
            Element::Circuit(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_circuit_mut(&mut self) -> Option<&mut IntegratedCircuit> {
        match self {
            Element::Circuit(c) => Some(c),
            _ => None,
        }
    }

    /// Rebuilds an element from its tagged record, dispatching on `kind`.
    pub fn from_json(value: Value) -> Result<Element> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| CircuitError::InvalidRecord("element record has no kind".into()))?
            .to_owned();

        match kind.as_str() {
            "GATE" => {
                let mut gate: Gate = serde_json::from_value(value)?;
                gate.normalize()?;
                Ok(Element::Gate(gate))
            }
            "PIN" => {
                let mut pin: Pin = serde_json::from_value(value)?;
                pin.normalize();
                Ok(Element::Pin(pin))
            }
            "IC" => Ok(Element::Circuit(Box::new(IntegratedCircuit::from_json(value)?))),
            _ => Err(CircuitError::UnknownKind(kind)),
        }
    }

    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl From<Gate> for Element {
    fn from(gate: Gate) -> Self {
        Element::Gate(gate)
    }
}

impl From<Pin> for Element {
    fn from(pin: Pin) -> Self {
        Element::Pin(pin)
    }
}

impl From<IntegratedCircuit> for Element {
    fn from(circuit: IntegratedCircuit) -> Self {
        Element::Circuit(Box::new(circuit))
    }
}

/// Borrowed view of a circuit's persisted fields.
#[derive(Serialize)]
pub(crate) struct CircuitFields<'a> {
    pub id: ElementId,
    pub label: &'a str,
    pub position: Point,
    pub elements: &'a [Element],
    pub wires: &'a [Wire],
}

/// Serialization side of the tagged record format.
#[derive(Serialize)]
#[serde(tag = "kind")]
pub(crate) enum ElementRecord<'a> {
    #[serde(rename = "GATE")]
    Gate(&'a Gate),
    #[serde(rename = "PIN")]
    Pin(&'a Pin),
    #[serde(rename = "IC")]
    Circuit(CircuitFields<'a>),
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Element::Gate(g) => ElementRecord::Gate(g).serialize(serializer),
            Element::Pin(p) => ElementRecord::Pin(p).serialize(serializer),
            Element::Circuit(c) => c.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Element::from_json(value).map_err(serde::de::Error::custom)
    }
}
