//! Logic gates with a fixed boolean function over one or two inputs.

use serde::{Deserialize, Serialize};

use super::{Connector, ConnectorType, ElementId, Point};
use crate::error::{CircuitError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateType {
    And,
    Or,
    Not,
    Nand,
    Nor,
    Xor,
    Xnor,
}

impl GateType {
    pub const ALL: [GateType; 7] = [
        GateType::And,
        GateType::Or,
        GateType::Not,
        GateType::Nand,
        GateType::Nor,
        GateType::Xor,
        GateType::Xnor,
    ];

    /// Number of inputs the gate reads.
    pub fn input_count(&self) -> usize {
        match self {
            GateType::Not => 1,
            _ => 2,
        }
    }

    /// Evaluates the gate function. Missing inputs read as `false`.
    pub fn evaluate(&self, inputs: &[bool]) -> bool {
        let a = inputs.first().copied().unwrap_or(false);
        let b = inputs.get(1).copied().unwrap_or(false);
        match self {
            GateType::And => a && b,
            GateType::Or => a || b,
            GateType::Not => !a,
            GateType::Nand => !(a && b),
            GateType::Nor => !(a || b),
            GateType::Xor => a != b,
            GateType::Xnor => a == b,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GateType::And => "AND",
            GateType::Or => "OR",
            GateType::Not => "NOT",
            GateType::Nand => "NAND",
            GateType::Nor => "NOR",
            GateType::Xor => "XOR",
            GateType::Xnor => "XNOR",
        }
    }
}

impl std::fmt::Display for GateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A gate element. `output` is always the gate function of `inputs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub gate_type: GateType,
    pub position: Point,
    inputs: Vec<bool>,
    output: bool,
}

impl Gate {
    pub fn new(id: ElementId, gate_type: GateType, position: Point) -> Self {
        let inputs = vec![false; gate_type.input_count()];
        let output = gate_type.evaluate(&inputs);
        Self {
            id,
            gate_type,
            position,
            inputs,
            output,
        }
    }

    pub fn label(&self) -> &'static str {
        self.gate_type.name()
    }

    pub fn inputs(&self) -> &[bool] {
        &self.inputs
    }

    pub fn output(&self) -> bool {
        self.output
    }

    /// Connector index of the output terminal.
    pub fn output_index(&self) -> usize {
        self.inputs.len()
    }

    pub fn dimensions(&self) -> (i32, i32) {
        match self.gate_type {
            GateType::Not => (2, 2),
            _ => (2, 4),
        }
    }

    pub fn connectors(&self) -> Vec<Connector> {
        let p = self.position;
        match self.gate_type {
            GateType::Not => vec![
                Connector::new(p.offset(0, 1), ConnectorType::Input, self.id, 0),
                Connector::new(p.offset(2, 1), ConnectorType::Output, self.id, 1),
            ],
            _ => vec![
                Connector::new(p.offset(0, 1), ConnectorType::Input, self.id, 0),
                Connector::new(p.offset(0, 3), ConnectorType::Input, self.id, 1),
                Connector::new(p.offset(2, 2), ConnectorType::Output, self.id, 2),
            ],
        }
    }

    pub fn connector_type(&self, index: usize) -> Result<ConnectorType> {
        if index < self.inputs.len() {
            Ok(ConnectorType::Input)
        } else if index == self.output_index() {
            Ok(ConnectorType::Output)
        } else {
            Err(self.invalid_index(index))
        }
    }

    pub fn connector_state(&self, index: usize) -> Result<bool> {
        if let Some(&state) = self.inputs.get(index) {
            Ok(state)
        } else if index == self.output_index() {
            Ok(self.output)
        } else {
            Err(self.invalid_index(index))
        }
    }

    /// Writes an input and recomputes the output. The output terminal is
    /// read-only.
    pub fn set_connector_state(&mut self, index: usize, state: bool) -> Result<()> {
        if index == self.output_index() {
            return Err(CircuitError::ReadOnlyConnector {
                element: self.id,
                index,
            });
        }
        let slot = self
            .inputs
            .get_mut(index)
            .ok_or(CircuitError::InvalidConnectorIndex {
                element: self.id,
                index,
            })?;
        *slot = state;
        self.output = self.gate_type.evaluate(&self.inputs);
        Ok(())
    }

    /// Checks a deserialized gate and re-derives its output.
    pub(crate) fn normalize(&mut self) -> Result<()> {
        let expected = self.gate_type.input_count();
        if self.inputs.len() != expected {
            return Err(CircuitError::InvalidRecord(format!(
                "gate {} ({}) has {} inputs, expected {}",
                self.id,
                self.gate_type,
                self.inputs.len(),
                expected
            )));
        }
        self.output = self.gate_type.evaluate(&self.inputs);
        Ok(())
    }

    fn invalid_index(&self, index: usize) -> CircuitError {
        CircuitError::InvalidConnectorIndex {
            element: self.id,
            index,
        }
    }
}
