//! Battle history hooks.

use serde::{Deserialize, Serialize};

use crate::board::UnitId;

/// Receives child entries for the current history event.
pub trait HistoryWriter {
    fn add_child_to_event(&mut self, text: String, units: Vec<UnitId>);
}

/// One recorded history line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub text: String,
    pub units: Vec<UnitId>,
}

/// In-memory history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    pub entries: Vec<HistoryEntry>,
}

impl HistoryWriter for History {
    fn add_child_to_event(&mut self, text: String, units: Vec<UnitId>) {
        tracing::info!(%text, "history");
        self.entries.push(HistoryEntry { text, units });
    }
}
