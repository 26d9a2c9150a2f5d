//! Half adder example: build the circuit in code, save it and print its truth table.

use logicsim::prelude::*;

fn main() -> Result<(), CircuitError> {
    let mut circuit = IntegratedCircuit::new(0, "HALF_ADDER", Point(0, 0));
    let a = circuit.add_pin(ConnectorType::Input, Point(0, 0));
    let b = circuit.add_pin(ConnectorType::Input, Point(0, 6));
    let xor = circuit.add_gate(GateType::Xor, Point(6, 0));
    let and = circuit.add_gate(GateType::And, Point(6, 6));
    let sum = circuit.add_pin(ConnectorType::Output, Point(12, 1));
    let carry = circuit.add_pin(ConnectorType::Output, Point(12, 7));

    circuit.connect((a, 0), (xor, 0))?;
    circuit.connect((a, 0), (and, 0))?;
    circuit.connect((b, 0), (xor, 1))?;
    circuit.connect((b, 0), (and, 1))?;
    circuit.connect((xor, 2), (sum, 0))?;
    circuit.connect((and, 2), (carry, 0))?;

    let table = circuit.truth_table()?;
    println!("{} | {}", table.inputs.join(" "), table.outputs.join(" "));
    for row in &table.rows {
        let bits = |levels: &[bool]| {
            levels
                .iter()
                .map(|&v| if v { "1" } else { "0" })
                .collect::<Vec<_>>()
                .join("    ")
        };
        println!("{}    | {}", bits(&row.inputs), bits(&row.outputs));
    }

    if let Some(path) = std::env::args().nth(1) {
        logicsim::save_circuit(&circuit, std::path::Path::new(&path))?;
        println!("\nSaved to {}", path);
    }
    Ok(())
}
