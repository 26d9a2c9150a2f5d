//! Boundary pins and fixed or periodic signal sources.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{Connector, ConnectorType, ElementId, PinType, Point};
use crate::error::{CircuitError, Result};

/// Toggle period of a clock pin unless configured otherwise.
pub const DEFAULT_CLOCK_PERIOD: Duration = Duration::from_millis(500);

/// Host-driven oscillator state of a clock pin.
///
/// The oscillator never schedules anything itself: the host calls
/// [`Pin::advance`] with the current session time and the pin toggles once for
/// every full period elapsed since the last toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Oscillator {
    period: Duration,
    anchor: Option<Duration>,
    running: bool,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self {
            period: DEFAULT_CLOCK_PERIOD,
            anchor: None,
            running: true,
        }
    }
}

impl Oscillator {
    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of toggles due at `now`. Moves the anchor past them.
    fn take_toggles(&mut self, now: Duration) -> u128 {
        if !self.running || self.period.is_zero() {
            return 0;
        }
        let Some(anchor) = self.anchor else {
            self.anchor = Some(now);
            return 0;
        };
        let period = self.period.as_nanos();
        let toggles = now.saturating_sub(anchor).as_nanos() / period;
        if toggles > 0 {
            let advanced = toggles.saturating_mul(period).min(u64::MAX as u128) as u64;
            self.anchor = Some(anchor + Duration::from_nanos(advanced));
        }
        toggles
    }
}

/// A circuit boundary terminal or a fixed/periodic source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub pin_type: PinType,
    pub position: Point,
    pub index: usize,
    state: bool,
    #[serde(skip)]
    oscillator: Oscillator,
}

impl PartialEq for Pin {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.pin_type == other.pin_type
            && self.position == other.position
            && self.index == other.index
            && self.state == other.state
    }
}

impl Eq for Pin {}

impl Pin {
    pub fn new(id: ElementId, pin_type: PinType, position: Point, index: usize) -> Self {
        Self {
            id,
            pin_type,
            position,
            index,
            state: pin_type == ConnectorType::Power,
            oscillator: Oscillator::default(),
        }
    }

    pub fn label(&self) -> String {
        format!("{}_{}", self.pin_type.tag(), self.index)
    }

    pub fn state(&self) -> bool {
        self.state
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self.pin_type, ConnectorType::Power | ConnectorType::Ground)
    }

    pub fn is_clock(&self) -> bool {
        self.pin_type == ConnectorType::Clock
    }

    pub fn dimensions(&self) -> (i32, i32) {
        (2, 2)
    }

    /// Type of the single connector as seen by the wiring of the owning
    /// circuit. Sources (input, power, clock) drive the network, so they expose
    /// an output terminal; sinks expose an input terminal.
    pub fn internal_connector_type(&self) -> ConnectorType {
        match self.pin_type {
            ConnectorType::Input | ConnectorType::Power | ConnectorType::Clock => {
                ConnectorType::Output
            }
            ConnectorType::Output | ConnectorType::Ground => ConnectorType::Input,
        }
    }

    pub fn connectors(&self) -> Vec<Connector> {
        let connector_type = self.internal_connector_type();
        let position = match connector_type {
            ConnectorType::Output => self.position.offset(2, 1),
            _ => self.position.offset(0, 1),
        };
        vec![Connector::new(position, connector_type, self.id, 0)]
    }

    pub fn connector_type(&self, index: usize) -> Result<ConnectorType> {
        self.check_index(index)?;
        Ok(self.internal_connector_type())
    }

    pub fn connector_state(&self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        Ok(self.state)
    }

    pub fn set_connector_state(&mut self, index: usize, state: bool) -> Result<()> {
        self.check_index(index)?;
        if self.is_fixed() {
            return Err(CircuitError::ImmutablePin(self.pin_type));
        }
        self.state = state;
        Ok(())
    }

    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    pub fn set_clock_period(&mut self, period: Duration) {
        self.oscillator.period = period;
    }

    /// Advances a clock pin to session time `now`, toggling its state once per
    /// elapsed period. Returns true if the observable state changed. Other pin
    /// types are unaffected.
    pub fn advance(&mut self, now: Duration) -> bool {
        if !self.is_clock() {
            return false;
        }
        let toggles = self.oscillator.take_toggles(now);
        let flipped = toggles % 2 == 1;
        if flipped {
            self.state = !self.state;
        }
        flipped
    }

    /// Cancels the oscillator. State is frozen until [`Pin::start_clock`].
    pub fn stop_clock(&mut self) {
        self.oscillator.running = false;
        self.oscillator.anchor = None;
    }

    pub fn start_clock(&mut self) {
        self.oscillator.running = true;
    }

    /// Restores the fixed levels of power and ground pins after loading.
    pub(crate) fn normalize(&mut self) {
        match self.pin_type {
            ConnectorType::Power => self.state = true,
            ConnectorType::Ground => self.state = false,
            _ => {}
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index == 0 {
            Ok(())
        } else {
            Err(CircuitError::InvalidConnectorIndex {
                element: self.id,
                index,
            })
        }
    }
}
