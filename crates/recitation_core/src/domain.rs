//! crates/recitation_core/src/domain.rs
//!
//! Defines the pure, core data structures for the planner.
//! These structs are independent of any storage backend or transport; they derive
//! `serde` traits only so the persistence layer can write them back as one record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Reference Data
//=========================================================================================

/// A named block of source text (a surah) with a fixed verse count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextUnit {
    pub unit_number: u32,
    pub verse_count: u32,
    pub name: String,
    /// The coarse groups ("juz") this unit has verses in.
    pub groups: Vec<u32>,
}

/// An inclusive, 1-based verse range inside one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VerseSpan {
    pub start: u32,
    pub end: u32,
}

impl VerseSpan {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Number of verses covered by the span.
    pub fn len(&self) -> u32 {
        (self.end + 1).saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

//=========================================================================================
// Chunks
//=========================================================================================

/// A contiguous sub-range of a unit's verses, the atomic schedulable item.
///
/// Identity is the full triple: two ranges with identical fields are the same chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkRange {
    pub unit_number: u32,
    pub start_verse: u32,
    pub end_verse: u32,
}

impl ChunkRange {
    pub fn new(unit_number: u32, start_verse: u32, end_verse: u32) -> Self {
        Self {
            unit_number,
            start_verse,
            end_verse,
        }
    }

    /// A chunk covering an entire unit.
    pub fn whole(unit: &TextUnit) -> Self {
        Self::new(unit.unit_number, 1, unit.verse_count)
    }

    pub fn id(&self) -> ChunkId {
        ChunkId(format!(
            "{}-{}-{}",
            self.unit_number, self.start_verse, self.end_verse
        ))
    }

    pub fn span(&self) -> VerseSpan {
        VerseSpan::new(self.start_verse, self.end_verse)
    }
}

/// The stable string identifier of a chunk, formatted `unit-start-end`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(String);

impl ChunkId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recovers the range this id was built from, if the id is well formed.
    pub fn to_range(&self) -> Option<ChunkRange> {
        let mut parts = self.0.splitn(3, '-').map(str::parse::<u32>);
        let unit_number = parts.next()?.ok()?;
        let start_verse = parts.next()?.ok()?;
        let end_verse = parts.next()?.ok()?;
        if unit_number == 0 || start_verse == 0 || start_verse > end_verse {
            return None;
        }
        Some(ChunkRange::new(unit_number, start_verse, end_verse))
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&ChunkRange> for ChunkId {
    fn from(range: &ChunkRange) -> Self {
        range.id()
    }
}

/// Returned when a string is not a `unit-start-end` chunk id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid chunk id (expected unit-start-end)")]
pub struct InvalidChunkId(pub String);

impl FromStr for ChunkId {
    type Err = InvalidChunkId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let candidate = ChunkId(s.to_string());
        match candidate.to_range() {
            Some(range) => Ok(range.id()),
            None => Err(InvalidChunkId(s.to_string())),
        }
    }
}

//=========================================================================================
// Sessions
//=========================================================================================

/// Whether a session is one of the obligatory prayers or a voluntary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionCategory {
    Main,
    Sunnah,
}

/// One schedulable recitation slot of the session template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    /// Fixed consumption/display position, assigned once from the default catalog.
    pub order: u32,
    pub category: SessionCategory,
    pub enabled: bool,
    /// Total rakaat of the session.
    pub total_units: u32,
    /// Rakaat that carry a recitation; `None` means all of them.
    pub recitation_units: Option<u32>,
    pub min_units: u32,
    pub max_units: u32,
    pub must_be_odd: bool,
}

impl Session {
    /// How many chunks this session consumes from a draw.
    pub fn recitation_count(&self) -> u32 {
        self.recitation_units
            .unwrap_or(self.total_units)
            .min(self.total_units)
    }
}

//=========================================================================================
// Daily Assignments
//=========================================================================================

/// A local calendar-day key, formatted as zero-padded `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(String);

impl DateKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%Y-%m-%d").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, "%Y-%m-%d").ok()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DateKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Self::from_date)
    }
}

/// One rakaat and the chunk recited in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitAssignment {
    /// 1-based position within the session.
    pub sequence_number: u32,
    pub unit_number: u32,
    pub start_verse: u32,
    pub end_verse: u32,
    pub is_temporary: bool,
}

impl UnitAssignment {
    pub fn new(sequence_number: u32, chunk: &ChunkRange, is_temporary: bool) -> Self {
        Self {
            sequence_number,
            unit_number: chunk.unit_number,
            start_verse: chunk.start_verse,
            end_verse: chunk.end_verse,
            is_temporary,
        }
    }

    pub fn chunk(&self) -> ChunkRange {
        ChunkRange::new(self.unit_number, self.start_verse, self.end_verse)
    }
}

/// The recitations drawn for one session on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAssignment {
    pub session_id: String,
    pub session_name: String,
    pub order: u32,
    pub is_temporary: bool,
    pub unit_assignments: Vec<UnitAssignment>,
}

impl SessionAssignment {
    /// The sequence number the next appended unit should carry.
    pub fn next_sequence_number(&self) -> u32 {
        self.unit_assignments
            .iter()
            .map(|u| u.sequence_number)
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// Everything scheduled for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAssignment {
    pub date: DateKey,
    pub session_assignments: Vec<SessionAssignment>,
}

impl DailyAssignment {
    pub fn total_units(&self) -> usize {
        self.session_assignments
            .iter()
            .map(|s| s.unit_assignments.len())
            .sum()
    }

    /// Every chunk recited during the day, in consumption order.
    pub fn chunks(&self) -> impl Iterator<Item = ChunkRange> + '_ {
        self.session_assignments
            .iter()
            .flat_map(|s| s.unit_assignments.iter().map(UnitAssignment::chunk))
    }

    /// Builds the payload needed to queue one unit assignment for review.
    pub fn review_candidate(
        &self,
        session_id: &str,
        sequence_number: u32,
    ) -> Option<ReviewCandidate> {
        let session = self
            .session_assignments
            .iter()
            .find(|s| s.session_id == session_id)?;
        let unit = session
            .unit_assignments
            .iter()
            .find(|u| u.sequence_number == sequence_number)?;
        Some(ReviewCandidate {
            unit_number: unit.unit_number,
            start_verse: unit.start_verse,
            end_verse: unit.end_verse,
            origin_session_name: session.session_name.clone(),
        })
    }
}

/// Identifies a recited range the user marked as needing review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCandidate {
    pub unit_number: u32,
    pub start_verse: u32,
    pub end_verse: u32,
    pub origin_session_name: String,
}
