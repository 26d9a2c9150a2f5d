//! Integration tests for circuit loading, propagation and analysis

use logicsim::prelude::*;
use logicsim::{load_circuit, save_circuit, ElementId, ElementKind};
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture_value(name: &str) -> Value {
    let content = std::fs::read_to_string(fixture_path(name)).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn state(circuit: &IntegratedCircuit, id: ElementId, index: usize) -> bool {
    circuit
        .find_element(id)
        .unwrap()
        .connector_state(index)
        .unwrap()
}

#[test]
fn test_half_adder_truth_table() {
    let circuit = load_circuit(&fixture_path("half_adder.json")).unwrap();
    let table = circuit.truth_table().unwrap();

    assert_eq!(table.inputs, vec!["IN_0", "IN_1"]);
    assert_eq!(table.outputs, vec!["OUT_2", "OUT_3"]);
    let rows: Vec<(Vec<bool>, Vec<bool>)> = table
        .rows
        .iter()
        .map(|r| (r.inputs.clone(), r.outputs.clone()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (vec![false, false], vec![false, false]),
            (vec![false, true], vec![true, false]),
            (vec![true, false], vec![true, false]),
            (vec![true, true], vec![false, true]),
        ]
    );
}

#[test]
fn test_round_trip_preserves_records() {
    for name in ["half_adder.json", "buffer.json", "sr_latch.json", "blinker.json"] {
        let value = fixture_value(name);
        let circuit = IntegratedCircuit::from_json(value.clone()).unwrap();
        assert_eq!(circuit.to_json().unwrap(), value, "{} changed on round trip", name);

        let again = IntegratedCircuit::from_json_str(&circuit.to_json_string().unwrap()).unwrap();
        assert_eq!(again, circuit);
    }
}

#[test]
fn test_round_trip_every_element_kind() {
    let mut inner = IntegratedCircuit::new(0, "INNER", Point(0, 0));
    let a = inner.add_pin(ConnectorType::Input, Point(0, 0));
    let not = inner.add_gate(GateType::Not, Point(4, 0));
    let out = inner.add_pin(ConnectorType::Output, Point(8, 0));
    inner.connect((a, 0), (not, 0)).unwrap();
    inner.connect((not, 1), (out, 0)).unwrap();

    let mut outer = IntegratedCircuit::new(0, "OUTER", Point(0, 0));
    for gate_type in GateType::ALL {
        outer.add_gate(gate_type, Point(0, 0));
    }
    for pin_type in ConnectorType::ALL {
        outer.add_pin(pin_type, Point(0, 0));
    }
    outer.add_subcircuit(inner, Point(20, 20)).unwrap();
    outer.refresh_state();

    let json = outer.to_json_string().unwrap();
    let restored = IntegratedCircuit::from_json_str(&json).unwrap();
    assert_eq!(restored, outer);

    let kinds: Vec<ElementKind> = restored.elements().iter().map(Element::kind).collect();
    assert!(kinds.contains(&ElementKind::Gate));
    assert!(kinds.contains(&ElementKind::Pin));
    assert!(kinds.contains(&ElementKind::Ic));
}

#[test]
fn test_unknown_kind_is_rejected() {
    let err = load_circuit(&fixture_path("unknown_kind.json")).unwrap_err();
    assert!(matches!(err, CircuitError::UnknownKind(kind) if kind == "RESISTOR"));
}

#[test]
fn test_duplicate_wire_is_rejected_on_load() {
    let err = load_circuit(&fixture_path("duplicate_wire.json")).unwrap_err();
    assert!(matches!(
        err,
        CircuitError::DuplicateWire {
            from_element: 0,
            from_index: 0,
            to_element: 1,
            to_index: 0,
        }
    ));
}

#[test]
fn test_duplicate_wire_id_is_rejected_on_load() {
    let err = load_circuit(&fixture_path("duplicate_wire_id.json")).unwrap_err();
    assert!(matches!(err, CircuitError::DuplicateWireId(0)));
}

#[test]
fn test_duplicate_pin_index_is_rejected_on_load() {
    let mut value = fixture_value("inverter.json");
    value["elements"][2]["index"] = json!(0);
    let err = IntegratedCircuit::from_json(value).unwrap_err();
    assert!(matches!(err, CircuitError::DuplicatePinIndex(0)));
}

#[test]
fn test_recursive_nesting_is_rejected_on_load() {
    let value = json!({
        "kind": "IC",
        "id": 0,
        "label": "LOOP",
        "position": [0, 0],
        "elements": [{
            "kind": "IC",
            "id": 0,
            "label": "MIDDLE",
            "position": [0, 0],
            "elements": [{
                "kind": "IC",
                "id": 0,
                "label": "LOOP",
                "position": [0, 0],
                "elements": [],
                "wires": []
            }],
            "wires": []
        }],
        "wires": []
    });
    let err = IntegratedCircuit::from_json(value).unwrap_err();
    assert!(matches!(err, CircuitError::RecursiveNesting(label) if label == "LOOP"));
}

#[test]
fn test_boundary_inversion() {
    let circuit = load_circuit(&fixture_path("buffer.json")).unwrap();

    let input = circuit.find_element(0).unwrap();
    assert_eq!(input.connector_type(0).unwrap(), ConnectorType::Output);
    let output = circuit.find_element(3).unwrap();
    assert_eq!(output.connector_type(0).unwrap(), ConnectorType::Input);

    let block = circuit.find_element(1).unwrap();
    assert_eq!(block.connector_type(0).unwrap(), ConnectorType::Input);
    assert_eq!(block.connector_type(1).unwrap(), ConnectorType::Output);
    let labels: Vec<Option<String>> = block.connectors().into_iter().map(|c| c.label).collect();
    assert_eq!(
        labels,
        vec![Some("IN_0".to_string()), Some("OUT_1".to_string())]
    );
}

#[test]
fn test_nested_buffer_follows_input() {
    let mut circuit = load_circuit(&fixture_path("buffer.json")).unwrap();
    assert!(!state(&circuit, 3, 0));

    let report = circuit.toggle_input_pin(0).unwrap();
    assert_eq!(report.visited, vec![0, 1, 2, 3]);
    assert!(state(&circuit, 3, 0));

    circuit.toggle_input_pin(0).unwrap();
    assert!(!state(&circuit, 3, 0));
}

#[test]
fn test_not_scenario() {
    let mut circuit = load_circuit(&fixture_path("inverter.json")).unwrap();
    assert!(state(&circuit, 2, 0));

    circuit.toggle_input_pin(0).unwrap();
    assert!(!state(&circuit, 1, 1));
    assert!(!state(&circuit, 2, 0));
}

#[test]
fn test_power_drives_not_and_stays_fixed() {
    let mut circuit = IntegratedCircuit::default();
    let pwr = circuit.add_pin(ConnectorType::Power, Point(0, 0));
    let not = circuit.add_gate(GateType::Not, Point(4, 0));
    let out = circuit.add_pin(ConnectorType::Output, Point(8, 0));
    circuit.connect((pwr, 0), (not, 0)).unwrap();
    circuit.connect((not, 1), (out, 0)).unwrap();

    circuit.refresh_state();
    assert!(!state(&circuit, out, 0));
    assert!(matches!(
        circuit.toggle_input_pin(pwr),
        Err(CircuitError::ImmutablePin(ConnectorType::Power))
    ));
    assert!(state(&circuit, pwr, 0));
}

#[test]
fn test_latch_analysis() {
    let circuit = load_circuit(&fixture_path("sr_latch.json")).unwrap();
    let stats = circuit.stats();
    assert_eq!(stats.gate_count, 2);
    assert_eq!(stats.pin_count, 4);
    assert_eq!(stats.wire_count, 6);
    assert!(stats.has_feedback);
    assert_eq!(circuit.feedback_loops(), vec![vec![2, 3]]);
    assert!(circuit.dangling_wires().is_empty());
}

#[test]
fn test_latch_holds_state() {
    let mut circuit = load_circuit(&fixture_path("sr_latch.json")).unwrap();
    assert!(state(&circuit, 4, 0));

    // Reset.
    circuit.set_element_state(1, 0, true).unwrap();
    circuit.settle(8);
    circuit.set_element_state(1, 0, false).unwrap();
    circuit.settle(8);
    assert!(!state(&circuit, 4, 0));
    assert!(state(&circuit, 5, 0));

    // Set.
    circuit.set_element_state(0, 0, true).unwrap();
    circuit.settle(8);
    circuit.set_element_state(0, 0, false).unwrap();
    circuit.settle(8);
    assert!(state(&circuit, 4, 0));
    assert!(!state(&circuit, 5, 0));
}

#[test]
fn test_save_and_load_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("circuit.json");

    let mut circuit = load_circuit(&fixture_path("half_adder.json")).unwrap();
    circuit.apply_inputs(&[true, true]).unwrap();
    circuit.settle(8);
    save_circuit(&circuit, &path).unwrap();

    let loaded = load_circuit(&path).unwrap();
    assert_eq!(loaded, circuit);
    assert!(state(&loaded, 5, 0));
    assert!(!state(&loaded, 4, 0));
}
