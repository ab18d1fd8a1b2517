//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged with HTTP clients. Core types stay free of
//! transport concerns; these structs carry the OpenAPI schemas and are built from
//! the core types with `From` conversions.

use chrono::{DateTime, Utc};
use recitation_core::domain::{
    DailyAssignment, Session, SessionAssignment, SessionCategory, TextUnit, UnitAssignment,
    VerseSpan,
};
use recitation_core::partition::{ChunkSettings, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
use recitation_core::review::ReviewItem;
use recitation_core::state::PlannerState;
use recitation_core::template::SessionTemplate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Payloads Sent FROM the Client TO the Server
//=========================================================================================

#[derive(Deserialize, Debug, ToSchema)]
pub struct TemporaryEntryRequest {
    pub session_id: String,
    pub units: u32,
}

/// Same-day sessions to add on top of today's assignment.
#[derive(Deserialize, Debug, ToSchema)]
pub struct TemporarySessionsRequest {
    pub entries: Vec<TemporaryEntryRequest>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SetUnitsRequest {
    pub units: u32,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SelectGroupsRequest {
    pub group_ids: Vec<u32>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ChunkSizeRequest {
    pub chunk_size: u32,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ChunkingRequest {
    pub enabled: bool,
}

/// Marks one of today's unit assignments for review.
#[derive(Deserialize, Debug, ToSchema)]
pub struct ReviewRequest {
    pub session_id: String,
    pub sequence_number: u32,
    /// Verse ranges inside the assignment the reciter stumbled on.
    #[serde(default)]
    pub forgotten: Vec<VerseSpanDto>,
}

//=========================================================================================
// Payloads Sent FROM the Server TO the Client
//=========================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
pub struct VerseSpanDto {
    pub start: u32,
    pub end: u32,
}

impl From<VerseSpan> for VerseSpanDto {
    fn from(span: VerseSpan) -> Self {
        Self {
            start: span.start,
            end: span.end,
        }
    }
}

impl From<VerseSpanDto> for VerseSpan {
    fn from(dto: VerseSpanDto) -> Self {
        VerseSpan::new(dto.start, dto.end)
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct UnitAssignmentDto {
    pub sequence_number: u32,
    pub unit_number: u32,
    pub start_verse: u32,
    pub end_verse: u32,
    pub is_temporary: bool,
}

impl From<&UnitAssignment> for UnitAssignmentDto {
    fn from(unit: &UnitAssignment) -> Self {
        Self {
            sequence_number: unit.sequence_number,
            unit_number: unit.unit_number,
            start_verse: unit.start_verse,
            end_verse: unit.end_verse,
            is_temporary: unit.is_temporary,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct SessionAssignmentDto {
    pub session_id: String,
    pub session_name: String,
    pub order: u32,
    pub is_temporary: bool,
    pub unit_assignments: Vec<UnitAssignmentDto>,
}

impl From<&SessionAssignment> for SessionAssignmentDto {
    fn from(session: &SessionAssignment) -> Self {
        Self {
            session_id: session.session_id.clone(),
            session_name: session.session_name.clone(),
            order: session.order,
            is_temporary: session.is_temporary,
            unit_assignments: session.unit_assignments.iter().map(Into::into).collect(),
        }
    }
}

/// One day's recitation plan.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct DailyAssignmentDto {
    /// Local calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub total_units: usize,
    pub session_assignments: Vec<SessionAssignmentDto>,
}

impl From<&DailyAssignment> for DailyAssignmentDto {
    fn from(assignment: &DailyAssignment) -> Self {
        Self {
            date: assignment.date.to_string(),
            total_units: assignment.total_units(),
            session_assignments: assignment.session_assignments.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct SessionDto {
    pub id: String,
    pub name: String,
    pub order: u32,
    /// `main` or `sunnah`.
    pub category: String,
    pub enabled: bool,
    pub total_units: u32,
    pub recitation_units: Option<u32>,
    pub min_units: u32,
    pub max_units: u32,
    pub must_be_odd: bool,
}

impl From<&Session> for SessionDto {
    fn from(session: &Session) -> Self {
        let category = match session.category {
            SessionCategory::Main => "main",
            SessionCategory::Sunnah => "sunnah",
        };
        Self {
            id: session.id.clone(),
            name: session.name.clone(),
            order: session.order,
            category: category.to_string(),
            enabled: session.enabled,
            total_units: session.total_units,
            recitation_units: session.recitation_units,
            min_units: session.min_units,
            max_units: session.max_units,
            must_be_odd: session.must_be_odd,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct TemplateResponse {
    pub sessions: Vec<SessionDto>,
    pub total_required_units: u32,
}

impl From<&SessionTemplate> for TemplateResponse {
    fn from(template: &SessionTemplate) -> Self {
        Self {
            sessions: template.sessions().iter().map(Into::into).collect(),
            total_required_units: template.total_required_units(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ChunkDto {
    pub id: String,
    pub unit_number: u32,
    pub start_verse: u32,
    pub end_verse: u32,
    pub mandatory: bool,
    pub used: bool,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct SelectionResponse {
    pub selected_groups: Vec<u32>,
    pub catalog: Vec<ChunkDto>,
    pub used_count: usize,
    pub last_shuffle_date: Option<String>,
}

impl From<&PlannerState> for SelectionResponse {
    fn from(state: &PlannerState) -> Self {
        let selection = &state.selection;
        let catalog = selection
            .catalog
            .iter()
            .map(|chunk| {
                let id = chunk.id();
                ChunkDto {
                    mandatory: selection.mandatory.contains(&id),
                    used: selection.used.contains(&id),
                    id: id.to_string(),
                    unit_number: chunk.unit_number,
                    start_verse: chunk.start_verse,
                    end_verse: chunk.end_verse,
                }
            })
            .collect();
        Self {
            selected_groups: state.selected_groups.clone(),
            catalog,
            used_count: selection.used.len(),
            last_shuffle_date: state.last_shuffle_date.as_ref().map(ToString::to_string),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct SettingsResponse {
    pub chunk_size: u32,
    pub chunking_enabled: bool,
    pub min_chunk_size: u32,
    pub max_chunk_size: u32,
}

impl From<ChunkSettings> for SettingsResponse {
    fn from(settings: ChunkSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunking_enabled: settings.chunking_enabled,
            min_chunk_size: MIN_CHUNK_SIZE,
            max_chunk_size: MAX_CHUNK_SIZE,
        }
    }
}

/// The state of a toggled or adjusted item after the request.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ToggleResponse {
    pub id: String,
    pub enabled: bool,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct SessionUnitsResponse {
    pub id: String,
    pub total_units: u32,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ReviewItemDto {
    pub id: Uuid,
    pub unit_number: u32,
    pub start_verse: u32,
    pub end_verse: u32,
    pub origin_session_name: Option<String>,
    pub forgotten_sub_ranges: Vec<VerseSpanDto>,
    pub added_at: DateTime<Utc>,
}

impl From<&ReviewItem> for ReviewItemDto {
    fn from(item: &ReviewItem) -> Self {
        Self {
            id: item.id,
            unit_number: item.unit_number,
            start_verse: item.start_verse,
            end_verse: item.end_verse,
            origin_session_name: item.origin_session_name.clone(),
            forgotten_sub_ranges: item.forgotten_sub_ranges.iter().copied().map(Into::into).collect(),
            added_at: item.added_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct UnitDto {
    pub unit_number: u32,
    pub name: String,
    pub verse_count: u32,
    pub groups: Vec<u32>,
}

impl From<TextUnit> for UnitDto {
    fn from(unit: TextUnit) -> Self {
        Self {
            unit_number: unit.unit_number,
            name: unit.name,
            verse_count: unit.verse_count,
            groups: unit.groups,
        }
    }
}
