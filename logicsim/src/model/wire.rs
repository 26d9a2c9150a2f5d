use serde::{Deserialize, Serialize};

use super::{Connector, Point, WireId};

/// Directed connection between two connectors of the same circuit.
///
/// `path` starts at `from.position` and ends at `to.position`; the interior
/// waypoints only describe the drawn route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wire {
    pub id: WireId,
    pub from: Connector,
    pub to: Connector,
    pub path: Vec<Point>,
}

impl Wire {
    /// Builds a wire whose path runs from `from` through `waypoints` to `to`.
    pub fn new(id: WireId, from: Connector, to: Connector, waypoints: &[Point]) -> Self {
        let mut path = Vec::with_capacity(waypoints.len() + 2);
        path.push(from.position);
        path.extend_from_slice(waypoints);
        path.push(to.position);
        Self { id, from, to, path }
    }

    /// True if this wire connects exactly these two terminals in this direction.
    pub fn connects(&self, from: &Connector, to: &Connector) -> bool {
        self.from.same_terminal(from) && self.to.same_terminal(to)
    }

    pub fn touches(&self, element_id: super::ElementId) -> bool {
        self.from.element_id == element_id || self.to.element_id == element_id
    }

    /// Interior route points, excluding both endpoints.
    pub fn waypoints(&self) -> &[Point] {
        if self.path.len() <= 2 {
            &[]
        } else {
            &self.path[1..self.path.len() - 1]
        }
    }

    /// Replaces the source snapshot and the first path point.
    pub(crate) fn reattach_from(&mut self, from: Connector) {
        match self.path.first_mut() {
            Some(first) => *first = from.position,
            None => self.path.push(from.position),
        }
        self.from = from;
    }

    /// Replaces the target snapshot and the last path point.
    pub(crate) fn reattach_to(&mut self, to: Connector) {
        if self.path.len() < 2 {
            self.path.push(to.position);
        } else if let Some(last) = self.path.last_mut() {
            *last = to.position;
        }
        self.to = to;
    }
}
