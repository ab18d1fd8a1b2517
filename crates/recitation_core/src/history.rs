//! crates/recitation_core/src/history.rs
//!
//! Date-keyed store of computed daily assignments with a rolling retention window.

use serde::{Deserialize, Serialize};

use crate::domain::{DailyAssignment, DateKey};

/// How many distinct days of assignments are kept.
pub const HISTORY_RETENTION_DAYS: usize = 7;

/// At most one assignment per date key, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentHistory {
    entries: Vec<DailyAssignment>,
}

impl AssignmentHistory {
    pub fn get(&self, date: &DateKey) -> Option<&DailyAssignment> {
        self.entries.iter().find(|a| &a.date == date)
    }

    /// Replaces the entry for the assignment's date in place, or appends it and
    /// drops the oldest entries past the retention bound.
    pub fn upsert(&mut self, assignment: DailyAssignment) {
        if let Some(existing) = self.entries.iter_mut().find(|a| a.date == assignment.date) {
            *existing = assignment;
            return;
        }
        self.entries.push(assignment);
        let excess = self.entries.len().saturating_sub(HISTORY_RETENTION_DAYS);
        self.entries.drain(..excess);
    }

    pub fn remove(&mut self, date: &DateKey) -> Option<DailyAssignment> {
        let pos = self.entries.iter().position(|a| &a.date == date)?;
        Some(self.entries.remove(pos))
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[DailyAssignment] {
        &self.entries
    }

    /// Entries sorted by date, most recent first.
    pub fn newest_first(&self) -> Vec<DailyAssignment> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
