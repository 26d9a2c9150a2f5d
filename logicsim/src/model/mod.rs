//! Circuit element model
//!
//! Elements are the nodes of a circuit: logic gates, pins and nested
//! integrated circuits. Each element exposes an ordered set of connectors
//! that wires attach to.

pub mod connector;
pub mod element;
pub mod gate;
pub mod pin;
pub mod wire;

/// Element identifier, unique within one circuit only.
pub type ElementId = u32;

/// Wire identifier, unique within one circuit only.
pub type WireId = u32;

pub use connector::{Connector, ConnectorType, PinType, Point};
pub use element::{Element, ElementKind};
pub use gate::{Gate, GateType};
pub use pin::{Oscillator, Pin, DEFAULT_CLOCK_PERIOD};
pub use wire::Wire;
