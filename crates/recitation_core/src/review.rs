//! crates/recitation_core/src/review.rs
//!
//! The review queue: recited ranges the user marked as needing another look.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ReviewCandidate, VerseSpan};

/// One queued review entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub id: Uuid,
    pub unit_number: u32,
    pub start_verse: u32,
    pub end_verse: u32,
    pub origin_session_name: Option<String>,
    #[serde(default)]
    pub forgotten_sub_ranges: Vec<VerseSpan>,
    pub added_at: DateTime<Utc>,
}

impl ReviewItem {
    fn covers_same_range(&self, candidate: &ReviewCandidate) -> bool {
        self.unit_number == candidate.unit_number
            && self.start_verse == candidate.start_verse
            && self.end_verse == candidate.end_verse
    }
}

/// Review items, at most one per (unit, start, end).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewQueue {
    items: Vec<ReviewItem>,
}

impl ReviewQueue {
    /// Queues the candidate unless the same range is already queued. Forgotten
    /// sub-ranges outside the candidate's range are dropped. Returns the queued
    /// item, existing or new.
    pub fn add(&mut self, candidate: ReviewCandidate, forgotten: Vec<VerseSpan>) -> &ReviewItem {
        if let Some(pos) = self.items.iter().position(|i| i.covers_same_range(&candidate)) {
            return &self.items[pos];
        }
        let forgotten_sub_ranges = forgotten
            .into_iter()
            .filter(|s| {
                !s.is_empty() && s.start >= candidate.start_verse && s.end <= candidate.end_verse
            })
            .collect();
        self.items.push(ReviewItem {
            id: Uuid::new_v4(),
            unit_number: candidate.unit_number,
            start_verse: candidate.start_verse,
            end_verse: candidate.end_verse,
            origin_session_name: Some(candidate.origin_session_name),
            forgotten_sub_ranges,
            added_at: Utc::now(),
        });
        &self.items[self.items.len() - 1]
    }

    pub fn remove(&mut self, id: Uuid) -> Option<ReviewItem> {
        let pos = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(pos))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[ReviewItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
