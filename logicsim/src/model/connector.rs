//! Grid coordinates, connector types and connector snapshots.

use serde::{Deserialize, Serialize};

use super::ElementId;

/// Integer grid coordinate, serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point(pub i32, pub i32);

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point(x, y)
    }

    pub const fn x(&self) -> i32 {
        self.0
    }

    pub const fn y(&self) -> i32 {
        self.1
    }

    /// Returns this point shifted by `(dx, dy)`.
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Point(self.0 + dx, self.1 + dy)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// Direction of a terminal. Pins reuse this type for their role inside the
/// owning circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorType {
    #[serde(rename = "IN", alias = "INPUT")]
    Input,
    #[serde(rename = "OUT", alias = "OUTPUT")]
    Output,
    #[serde(rename = "PWR", alias = "POWER")]
    Power,
    #[serde(rename = "GND", alias = "GROUND")]
    Ground,
    #[serde(rename = "CLK", alias = "CLOCK")]
    Clock,
}

impl ConnectorType {
    pub const ALL: [ConnectorType; 5] = [
        ConnectorType::Input,
        ConnectorType::Output,
        ConnectorType::Power,
        ConnectorType::Ground,
        ConnectorType::Clock,
    ];

    /// Short tag used in the persisted format and in default pin labels.
    pub fn tag(&self) -> &'static str {
        match self {
            ConnectorType::Input => "IN",
            ConnectorType::Output => "OUT",
            ConnectorType::Power => "PWR",
            ConnectorType::Ground => "GND",
            ConnectorType::Clock => "CLK",
        }
    }
}

impl std::fmt::Display for ConnectorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectorType::Input => write!(f, "INPUT"),
            ConnectorType::Output => write!(f, "OUTPUT"),
            ConnectorType::Power => write!(f, "POWER"),
            ConnectorType::Ground => write!(f, "GROUND"),
            ConnectorType::Clock => write!(f, "CLOCK"),
        }
    }
}

/// Role of a pin as seen from inside its owning circuit.
pub type PinType = ConnectorType;

/// One terminal of an element. Always derived from the owning element; wires
/// keep a snapshot of their two endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub position: Point,
    #[serde(rename = "type")]
    pub connector_type: ConnectorType,
    pub element_id: ElementId,
    pub pin_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Connector {
    pub fn new(
        position: Point,
        connector_type: ConnectorType,
        element_id: ElementId,
        pin_index: usize,
    ) -> Self {
        Self {
            position,
            connector_type,
            element_id,
            pin_index,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// True if both connectors address the same terminal, ignoring the cached
    /// position.
    pub fn same_terminal(&self, other: &Connector) -> bool {
        self.element_id == other.element_id && self.pin_index == other.pin_index
    }
}
