//! Saved-circuit library
//!
//! Named circuits that can be placed as blocks inside other circuits. Entries
//! are kept most recent first and the library holds at most a configured
//! number of them; saving beyond that drops the oldest.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::circuit::IntegratedCircuit;
use crate::error::{CircuitError, Result};
use crate::model::{Element, ElementId, Point};

/// Default number of circuits kept in a library.
pub const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    pub name: String,
    pub saved_at: DateTime<Utc>,
    pub circuit: IntegratedCircuit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitLibrary {
    entries: Vec<LibraryEntry>,
    capacity: usize,
}

#[derive(Serialize)]
struct LibraryFileRef<'a> {
    entries: &'a [LibraryEntry],
}

#[derive(Deserialize)]
struct LibraryFile {
    #[serde(default)]
    entries: Vec<LibraryEntry>,
}

impl Default for CircuitLibrary {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl CircuitLibrary {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    /// Saved names, most recent first.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Stores `circuit` under `name`, replacing any entry with that name.
    ///
    /// The stored copy is relabelled to `name`, so a circuit containing a
    /// nested block with the same label is rejected.
    pub fn save(&mut self, circuit: &IntegratedCircuit, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(CircuitError::InvalidRecord(
                "saved circuit name must not be empty".to_string(),
            ));
        }

        let mut stored = circuit.clone();
        stored.label = name.to_string();
        stored.id = 0;
        stored.position = Point::default();
        stored.validate()?;

        self.entries.retain(|e| e.name != name);
        self.entries.insert(
            0,
            LibraryEntry {
                name: name.to_string(),
                saved_at: Utc::now(),
                circuit: stored,
            },
        );

        if self.entries.len() > self.capacity {
            let dropped: Vec<String> = self
                .entries
                .drain(self.capacity..)
                .map(|e| e.name)
                .collect();
            tracing::debug!("Library full, dropped {:?}", dropped);
        }

        tracing::info!("Saved circuit '{}' ({} in library)", name, self.entries.len());
        Ok(())
    }

    pub fn load(&self, name: &str) -> Result<&IntegratedCircuit> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.circuit)
            .ok_or_else(|| CircuitError::SavedCircuitNotFound(name.to_string()))
    }

    pub fn remove(&mut self, name: &str) -> Result<LibraryEntry> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| CircuitError::SavedCircuitNotFound(name.to_string()))?;
        Ok(self.entries.remove(pos))
    }

    /// A copy of a saved circuit ready to be added as a child block.
    pub fn instantiate(&self, name: &str, id: ElementId, position: Point) -> Result<Element> {
        let mut circuit = self.load(name)?.clone();
        circuit.id = id;
        circuit.position = position;
        Ok(Element::Circuit(Box::new(circuit)))
    }

    /// Reads a library file. A missing file yields an empty library.
    pub fn load_from_path(path: &Path, capacity: usize) -> Result<Self> {
        let mut library = Self::with_capacity(capacity);
        if !path.exists() {
            tracing::debug!("No library at {}, starting empty", path.display());
            return Ok(library);
        }

        let content = std::fs::read_to_string(path)?;
        let file: LibraryFile = serde_json::from_str(&content)?;
        library.entries = file.entries;
        library.entries.truncate(library.capacity);
        Ok(library)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&LibraryFileRef {
            entries: &self.entries,
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
