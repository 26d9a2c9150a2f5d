//! Exhaustive input enumeration.
//!
//! Each row drives the input pins of a stopped copy of the circuit and
//! settles it before reading the output pins.

use serde::Serialize;

use super::IntegratedCircuit;
use crate::error::{CircuitError, Result};
use crate::model::ConnectorType;

/// Largest number of input pins enumerated by [`IntegratedCircuit::truth_table`].
pub const MAX_TRUTH_TABLE_INPUTS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TruthRow {
    pub inputs: Vec<bool>,
    pub outputs: Vec<bool>,
}

/// Output pin levels for every combination of input pin levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TruthTable {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub rows: Vec<TruthRow>,
}

impl TruthTable {
    /// Looks up the outputs for one input combination.
    pub fn outputs_for(&self, inputs: &[bool]) -> Option<&[bool]> {
        self.rows
            .iter()
            .find(|r| r.inputs == inputs)
            .map(|r| r.outputs.as_slice())
    }
}

impl IntegratedCircuit {
    /// Enumerates all input pin combinations on a copy of this circuit.
    ///
    /// Rows are ordered with the lowest-indexed input as the most significant
    /// bit. Each row is settled with repeated refresh passes, so feedback
    /// circuits report whatever state they reach within the pass limit.
    pub fn truth_table(&self) -> Result<TruthTable> {
        let mut work = self.clone();
        work.stop_clocks();

        let inputs: Vec<_> = work
            .pins_of_type(ConnectorType::Input)
            .iter()
            .map(|p| (p.id, p.label()))
            .collect();
        let outputs: Vec<_> = work
            .pins_of_type(ConnectorType::Output)
            .iter()
            .map(|p| (p.id, p.label()))
            .collect();

        if inputs.len() > MAX_TRUTH_TABLE_INPUTS {
            return Err(CircuitError::TooManyInputs {
                count: inputs.len(),
                max: MAX_TRUTH_TABLE_INPUTS,
            });
        }

        let max_passes = work.elements.len() + 2;
        let n = inputs.len();
        let mut rows = Vec::with_capacity(1 << n);

        for combination in 0..(1usize << n) {
            let levels: Vec<bool> = (0..n)
                .map(|i| (combination >> (n - 1 - i)) & 1 == 1)
                .collect();
            for (&(id, _), &level) in inputs.iter().zip(&levels) {
                work.set_element_state(id, 0, level)?;
            }
            work.settle(max_passes);

            let out_levels = outputs
                .iter()
                .map(|&(id, _)| {
                    work.find_element(id)
                        .ok_or(CircuitError::ElementNotFound(id))?
                        .connector_state(0)
                })
                .collect::<Result<Vec<bool>>>()?;

            rows.push(TruthRow {
                inputs: levels,
                outputs: out_levels,
            });
        }

        Ok(TruthTable {
            inputs: inputs.into_iter().map(|(_, label)| label).collect(),
            outputs: outputs.into_iter().map(|(_, label)| label).collect(),
            rows,
        })
    }
}
