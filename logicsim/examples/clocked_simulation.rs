//! Clocked simulation example: drive a toggling output from a clock pin and
//! step session time by hand.

use logicsim::prelude::*;
use std::time::Duration;

fn main() -> Result<(), CircuitError> {
    let mut circuit = IntegratedCircuit::new(0, "BLINKER", Point(0, 0));
    let clock = circuit.add_pin(ConnectorType::Clock, Point(0, 0));
    let not = circuit.add_gate(GateType::Not, Point(4, 0));
    let out = circuit.add_pin(ConnectorType::Output, Point(8, 0));
    circuit.connect((clock, 0), (not, 0))?;
    circuit.connect((not, 1), (out, 0))?;

    let config = SimulationConfig {
        tick_interval_ms: 50,
        clock_period_ms: 200,
        ..SimulationConfig::default()
    };
    let mut sim = Simulation::new(circuit, config);
    sim.start(Duration::ZERO)?;

    for step in 0..=20u64 {
        let now = Duration::from_millis(step * 50);
        sim.advance(now)?;
        let level = sim
            .current()
            .find_element(out)
            .ok_or(CircuitError::ElementNotFound(out))?
            .connector_state(0)?;
        println!("{:>5} ms  OUT = {}", now.as_millis(), u8::from(level));
    }

    sim.stop();
    Ok(())
}
