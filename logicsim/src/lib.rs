//! logicsim - digital logic circuit model and signal propagation engine
//!
//! Circuits are built from gates, pins and nested integrated circuits joined
//! by directed wires. Changing an input pushes the new value along the wiring
//! depth first; a periodic refresh re-evaluates the whole circuit so clock
//! sources and feedback networks keep moving.
//!
//! # Quick Start
//!
//! ```
//! use logicsim::prelude::*;
//!
//! let mut circuit = IntegratedCircuit::new(0, "AND_DEMO", Point(0, 0));
//! let a = circuit.add_pin(ConnectorType::Input, Point(0, 0));
//! let b = circuit.add_pin(ConnectorType::Input, Point(0, 4));
//! let and = circuit.add_gate(GateType::And, Point(4, 0));
//! let out = circuit.add_pin(ConnectorType::Output, Point(8, 0));
//! circuit.connect((a, 0), (and, 0)).unwrap();
//! circuit.connect((b, 0), (and, 1)).unwrap();
//! circuit.connect((and, 2), (out, 0)).unwrap();
//!
//! circuit.toggle_input_pin(a).unwrap();
//! circuit.toggle_input_pin(b).unwrap();
//! assert!(circuit.find_element(out).unwrap().connector_state(0).unwrap());
//! ```
//!
//! # Features
//!
//! - **Element model**: gates, boundary pins, power/ground/clock sources
//! - **Hierarchy**: circuits nest as blocks whose pins are their connectors
//! - **Persistence**: JSON records and a capped library of saved circuits
//! - **Analysis**: petgraph view, feedback detection, truth tables

pub mod circuit;
pub mod core;
pub mod error;
pub mod library;
pub mod model;

// Re-export main types
pub use circuit::{
    CircuitStats, ElementState, IntegratedCircuit, PropagationReport, TruthRow, TruthTable,
};
pub use self::core::{Simulation, SimulationConfig, TickReport};
pub use error::{CircuitError, Result};
pub use library::{CircuitLibrary, LibraryEntry};
pub use model::{
    Connector, ConnectorType, Element, ElementId, ElementKind, Gate, GateType, Pin, PinType,
    Point, Wire, WireId,
};

/// Reads a circuit record from a JSON file (convenience wrapper).
pub fn load_circuit(path: &std::path::Path) -> Result<IntegratedCircuit> {
    let content = std::fs::read_to_string(path)?;
    IntegratedCircuit::from_json_str(&content)
}

/// Writes a circuit record as pretty JSON (convenience wrapper).
pub fn save_circuit(circuit: &IntegratedCircuit, path: &std::path::Path) -> Result<()> {
    std::fs::write(path, circuit.to_json_string()?)?;
    Ok(())
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CircuitError, ConnectorType, Element, GateType, IntegratedCircuit, Point, Simulation,
        SimulationConfig,
    };
}
