//! Error type shared by the circuit model, the simulation context and the
//! saved-circuit library.

use crate::model::{ConnectorType, ElementId, PinType, WireId};

#[derive(Debug, thiserror::Error)]
pub enum CircuitError {
    #[error("Invalid connector index {index} on element {element}")]
    InvalidConnectorIndex { element: ElementId, index: usize },

    #[error("{0} pins have fixed states")]
    ImmutablePin(PinType),

    #[error("Connector {index} of element {element} cannot be written")]
    ReadOnlyConnector { element: ElementId, index: usize },

    #[error("Unknown element kind: {0}")]
    UnknownKind(String),

    #[error("Element {0} not found")]
    ElementNotFound(ElementId),

    #[error("Pin with index {0} not found")]
    PinNotFound(usize),

    #[error("Element {0} is not a pin")]
    NotAPin(ElementId),

    #[error("Element {0} is not a circuit")]
    NotACircuit(ElementId),

    #[error("Element id {0} is already in use")]
    DuplicateElementId(ElementId),

    #[error("Pin index {0} is already in use")]
    DuplicatePinIndex(usize),

    #[error("Wire id {0} is already in use")]
    DuplicateWireId(WireId),

    #[error("Wire from {from_element}:{from_index} to {to_element}:{to_index} already exists")]
    DuplicateWire {
        from_element: ElementId,
        from_index: usize,
        to_element: ElementId,
        to_index: usize,
    },

    #[error("Wire {0} not found")]
    WireNotFound(WireId),

    #[error("Expected {expected} connector, found {actual}")]
    ConnectorMismatch {
        expected: ConnectorType,
        actual: ConnectorType,
    },

    #[error("Circuit has {count} input pins, at most {max} can be enumerated")]
    TooManyInputs { count: usize, max: usize },

    #[error("Circuit '{0}' contains itself")]
    RecursiveNesting(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Saved circuit '{0}' not found")]
    SavedCircuitNotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CircuitError>;
