//! Simulation session shared by the CLI and any interactive front end.
//! Holds no timers: the host drives time through [`Simulation::advance`].

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::circuit::{IntegratedCircuit, PropagationReport};
use crate::error::{CircuitError, Result};
use crate::model::{Element, ElementId};

/// Options for a simulation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Interval between full refresh passes while the simulation runs.
    pub tick_interval_ms: u64,
    /// Toggle period of clock pins.
    pub clock_period_ms: u64,
    /// Capacity of the saved-circuit library.
    pub max_saved_circuits: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            clock_period_ms: 500,
            max_saved_circuits: 10,
        }
    }
}

impl SimulationConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn clock_period(&self) -> Duration {
        Duration::from_millis(self.clock_period_ms)
    }
}

/// What happened during one call to [`Simulation::advance`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// True if any clock pin changed level.
    pub clocks_changed: bool,
    /// Refresh passes run (0 or 1).
    pub ticks_run: usize,
    /// Tick slots that were due but collapsed into the single refresh.
    pub ticks_skipped: u64,
    pub propagation: Option<PropagationReport>,
}

/// A simulation session: the root circuit plus the view and tick state that
/// front ends need.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    root: IntegratedCircuit,
    /// Path of nested circuit ids from the root to the circuit being edited.
    focus: Vec<ElementId>,
    selected: BTreeSet<ElementId>,
    next_tick: Option<Duration>,
    ticks: u64,
}

impl Simulation {
    pub fn new(mut root: IntegratedCircuit, config: SimulationConfig) -> Self {
        root.set_clock_period(config.clock_period());
        Self {
            config,
            root,
            focus: Vec::new(),
            selected: BTreeSet::new(),
            next_tick: None,
            ticks: 0,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn root(&self) -> &IntegratedCircuit {
        &self.root
    }

    pub fn into_root(self) -> IntegratedCircuit {
        self.root
    }

    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Ticks run since the session was created.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    // ---------------------------------------------------------------------
    // Focus (which circuit is being viewed)
    // ---------------------------------------------------------------------

    pub fn focus(&self) -> &[ElementId] {
        &self.focus
    }

    /// The circuit currently in focus.
    pub fn current(&self) -> &IntegratedCircuit {
        let mut circuit = &self.root;
        for id in &self.focus {
            match circuit.find_element(*id).and_then(Element::as_circuit) {
                Some(nested) => circuit = nested,
                None => break,
            }
        }
        circuit
    }

    /// The circuit currently in focus, for editing.
    pub fn current_mut(&mut self) -> Result<&mut IntegratedCircuit> {
        let mut circuit = &mut self.root;
        for &id in &self.focus {
            circuit = circuit
                .find_element_mut(id)
                .ok_or(CircuitError::ElementNotFound(id))?
                .as_circuit_mut()
                .ok_or(CircuitError::NotACircuit(id))?;
        }
        Ok(circuit)
    }

    /// Moves the focus into a nested circuit of the current one.
    pub fn enter(&mut self, id: ElementId) -> Result<()> {
        let element = self
            .current()
            .find_element(id)
            .ok_or(CircuitError::ElementNotFound(id))?;
        if element.as_circuit().is_none() {
            return Err(CircuitError::NotACircuit(id));
        }
        self.focus.push(id);
        self.selected.clear();
        Ok(())
    }

    /// Moves the focus one level up. Returns false at the root.
    pub fn leave(&mut self) -> bool {
        let left = self.focus.pop().is_some();
        if left {
            self.selected.clear();
        }
        left
    }

    // ---------------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------------

    pub fn selected(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.selected.iter().copied()
    }

    /// Toggles the selection of an element. Returns true if it is now selected.
    pub fn toggle_selection(&mut self, id: ElementId) -> bool {
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Deletes every selected element from the current circuit. Returns the
    /// number of elements removed.
    pub fn delete_selected(&mut self) -> Result<usize> {
        let ids: Vec<ElementId> = std::mem::take(&mut self.selected).into_iter().collect();
        let circuit = self.current_mut()?;
        Ok(ids
            .into_iter()
            .filter(|&id| circuit.delete_element(id).is_ok())
            .count())
    }

    // ---------------------------------------------------------------------
    // Simulation mode
    // ---------------------------------------------------------------------

    /// Enters simulation mode at session time `now`: refreshes the current
    /// circuit once and schedules the next tick.
    pub fn start(&mut self, now: Duration) -> Result<PropagationReport> {
        let report = self.current_mut()?.refresh_state();
        self.selected.clear();
        self.next_tick = Some(now + self.config.tick_interval());
        tracing::info!(
            "Simulation started on '{}' (tick {} ms)",
            self.current().label,
            self.config.tick_interval_ms
        );
        Ok(report)
    }

    /// Leaves simulation mode and cancels the tick schedule.
    pub fn stop(&mut self) {
        if self.next_tick.take().is_some() {
            tracing::info!("Simulation stopped after {} ticks", self.ticks);
        }
        self.selected.clear();
    }

    /// Advances session time. Clock pins always advance; while running, one
    /// refresh pass runs if a tick is due. Ticks missed by a late call are
    /// collapsed into that single pass.
    pub fn advance(&mut self, now: Duration) -> Result<TickReport> {
        let mut report = TickReport {
            clocks_changed: self.root.advance_clocks(now),
            ..TickReport::default()
        };

        let Some(due) = self.next_tick else {
            return Ok(report);
        };
        if now < due {
            return Ok(report);
        }

        let interval = self.config.tick_interval();
        let elapsed_slots = if interval.is_zero() {
            1
        } else {
            ((now - due).as_nanos() / interval.as_nanos()) as u64 + 1
        };
        let advance_by = interval
            .checked_mul(elapsed_slots.min(u32::MAX as u64) as u32)
            .unwrap_or(interval);
        self.next_tick = Some(due + advance_by.max(interval));

        report.propagation = Some(self.current_mut()?.refresh_state());
        report.ticks_run = 1;
        report.ticks_skipped = elapsed_slots - 1;
        self.ticks += 1;
        Ok(report)
    }

    /// Runs `count` ticks back to back, advancing session time by one tick
    /// interval each, starting after `now`. Returns the session time reached.
    pub fn run_ticks(&mut self, now: Duration, count: u64) -> Result<Duration> {
        let mut time = now;
        if !self.is_running() {
            self.start(time)?;
        }
        for _ in 0..count {
            time += self.config.tick_interval();
            self.advance(time)?;
        }
        Ok(time)
    }

    /// Flips a pin of the current circuit and propagates.
    pub fn toggle_input(&mut self, id: ElementId) -> Result<PropagationReport> {
        self.current_mut()?.toggle_input_pin(id)
    }

    /// Drives the input pin with `index` of the current circuit.
    pub fn set_input(&mut self, index: usize, state: bool) -> Result<PropagationReport> {
        let id = self.current().pin_by_index(index)?.id;
        self.current_mut()?.set_element_state(id, 0, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConnectorType, GateType, Point};

    fn clocked_circuit() -> IntegratedCircuit {
        let mut c = IntegratedCircuit::new(0, "BLINK", Point(0, 0));
        let clk = c.add_pin(ConnectorType::Clock, Point(0, 0));
        let out = c.add_pin(ConnectorType::Output, Point(4, 0));
        c.connect((clk, 0), (out, 0)).unwrap();
        c
    }

    fn out_state(sim: &Simulation) -> bool {
        sim.current().find_element(1).unwrap().connector_state(0).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config: SimulationConfig = serde_json::from_str(r#"{"tick_interval_ms": 50}"#).unwrap();
        assert_eq!(config.tick_interval_ms, 50);
        assert_eq!(config.clock_period_ms, 500);
        assert_eq!(config.max_saved_circuits, 10);
    }

    #[test]
    fn test_clock_reaches_output_on_tick() {
        let mut sim = Simulation::new(clocked_circuit(), SimulationConfig::default());
        sim.start(Duration::ZERO).unwrap();
        assert!(sim.is_running());

        // First advance anchors the oscillator.
        sim.advance(Duration::ZERO).unwrap();
        let report = sim.advance(Duration::from_millis(500)).unwrap();
        assert!(report.clocks_changed);
        assert_eq!(report.ticks_run, 1);
        assert_eq!(report.ticks_skipped, 4);
        assert!(out_state(&sim));

        let report = sim.advance(Duration::from_millis(550)).unwrap();
        assert_eq!(report.ticks_run, 0);
        let report = sim.advance(Duration::from_millis(600)).unwrap();
        assert_eq!(report.ticks_run, 1);
        assert!(out_state(&sim));
    }

    #[test]
    fn test_stop_cancels_ticks() {
        let mut sim = Simulation::new(clocked_circuit(), SimulationConfig::default());
        sim.start(Duration::ZERO).unwrap();
        sim.advance(Duration::ZERO).unwrap();
        sim.stop();
        assert!(!sim.is_running());

        let report = sim.advance(Duration::from_millis(500)).unwrap();
        assert!(report.clocks_changed);
        assert_eq!(report.ticks_run, 0);
        // The clock flipped but nothing pushed it to the output.
        assert!(!out_state(&sim));
    }

    #[test]
    fn test_focus_and_selection() {
        let mut inner = IntegratedCircuit::new(0, "INNER", Point(0, 0));
        inner.add_gate(GateType::Not, Point(0, 0));
        let mut root = IntegratedCircuit::new(0, "ROOT", Point(0, 0));
        let gate = root.add_gate(GateType::And, Point(0, 0));
        let block = root.add_subcircuit(inner, Point(5, 5)).unwrap();

        let mut sim = Simulation::new(root, SimulationConfig::default());
        assert!(matches!(sim.enter(gate), Err(CircuitError::NotACircuit(id)) if id == gate));
        sim.enter(block).unwrap();
        assert_eq!(sim.current().label, "INNER");

        assert!(sim.toggle_selection(0));
        assert_eq!(sim.delete_selected().unwrap(), 1);
        assert!(sim.current().elements().is_empty());

        assert!(sim.leave());
        assert!(!sim.leave());
        assert_eq!(sim.current().label, "ROOT");
        assert_eq!(sim.root().elements().len(), 2);
    }

    #[test]
    fn test_stale_focus_reports_error() {
        let mut root = IntegratedCircuit::new(0, "ROOT", Point(0, 0));
        let gate = root.add_gate(GateType::Not, Point(0, 0));
        let mut sim = Simulation::new(root, SimulationConfig::default());

        sim.focus.push(gate);
        assert!(matches!(sim.current_mut(), Err(CircuitError::NotACircuit(id)) if id == gate));
        assert!(sim.start(Duration::ZERO).is_err());
        assert!(!sim.is_running());

        sim.focus = vec![42];
        assert!(matches!(sim.current_mut(), Err(CircuitError::ElementNotFound(42))));
        assert!(sim.toggle_input(gate).is_err());
        assert_eq!(sim.current().label, "ROOT");

        sim.focus.clear();
        assert!(sim.current_mut().is_ok());
    }

    #[test]
    fn test_set_input_by_index() {
        let mut c = IntegratedCircuit::default();
        let a = c.add_pin(ConnectorType::Input, Point(0, 0));
        let not = c.add_gate(GateType::Not, Point(4, 0));
        c.connect((a, 0), (not, 0)).unwrap();

        let mut sim = Simulation::new(c, SimulationConfig::default());
        sim.set_input(0, true).unwrap();
        assert!(!sim.current().find_element(not).unwrap().connector_state(1).unwrap());
        assert!(matches!(sim.set_input(5, true), Err(CircuitError::PinNotFound(5))));
    }

    #[test]
    fn test_run_ticks() {
        let mut sim = Simulation::new(clocked_circuit(), SimulationConfig::default());
        let end = sim.run_ticks(Duration::ZERO, 10).unwrap();
        assert_eq!(end, Duration::from_millis(1000));
        assert_eq!(sim.tick_count(), 10);
    }
}
