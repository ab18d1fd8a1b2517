//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::protocol::*;
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use recitation_core::domain::{ChunkId, DailyAssignment, VerseSpan};
use recitation_core::ports::PortError;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        today_handler,
        shuffle_handler,
        reshuffle_handler,
        temporary_sessions_handler,
        history_handler,
        template_handler,
        toggle_session_handler,
        set_session_units_handler,
        selection_handler,
        select_groups_handler,
        toggle_unit_handler,
        toggle_chunk_handler,
        toggle_mandatory_handler,
        reset_used_handler,
        settings_handler,
        set_chunk_size_handler,
        set_chunking_handler,
        list_reviews_handler,
        add_review_handler,
        remove_review_handler,
        clear_reviews_handler,
        list_units_handler,
    ),
    components(schemas(
        DailyAssignmentDto,
        SessionAssignmentDto,
        UnitAssignmentDto,
        TemporarySessionsRequest,
        TemporaryEntryRequest,
        TemplateResponse,
        SessionDto,
        SetUnitsRequest,
        SessionUnitsResponse,
        SelectionResponse,
        ChunkDto,
        SelectGroupsRequest,
        ToggleResponse,
        SettingsResponse,
        ChunkSizeRequest,
        ChunkingRequest,
        ReviewRequest,
        ReviewItemDto,
        VerseSpanDto,
        UnitDto,
    )),
    tags(
        (name = "Recitation Planner API", description = "Daily recitation scheduling across prayer sessions.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Helpers
//=========================================================================================

type HandlerError = (StatusCode, String);

fn internal_error(context: &str, e: PortError) -> HandlerError {
    error!("{}: {:?}", context, e);
    (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
}

fn not_found(message: String) -> HandlerError {
    (StatusCode::NOT_FOUND, message)
}

/// 200 with the assignment, or 204 when nothing could be scheduled.
fn assignment_response(assignment: Option<DailyAssignment>) -> Response {
    match assignment {
        Some(a) => Json(DailyAssignmentDto::from(&a)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

fn parse_chunk_id(raw: &str) -> Result<ChunkId, HandlerError> {
    raw.parse::<ChunkId>()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

//=========================================================================================
// Schedule
//=========================================================================================

/// Today's assignment, if one has been drawn.
#[utoipa::path(
    get,
    path = "/schedule/today",
    responses(
        (status = 200, description = "Today's assignment", body = DailyAssignmentDto),
        (status = 204, description = "Nothing drawn for today yet")
    )
)]
pub async fn today_handler(State(app_state): State<Arc<AppState>>) -> Response {
    let planner = app_state.planner.lock().await;
    assignment_response(planner.today_assignment())
}

/// Draws today's assignment unless one already exists.
#[utoipa::path(
    post,
    path = "/schedule/shuffle",
    responses(
        (status = 200, description = "Today's assignment", body = DailyAssignmentDto),
        (status = 204, description = "No enabled sessions or an empty selection"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn shuffle_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Response, HandlerError> {
    let mut planner = app_state.planner.lock().await;
    let assignment = planner
        .shuffle_for_today()
        .await
        .map_err(|e| internal_error("Failed to schedule today", e))?;
    Ok(assignment_response(assignment))
}

/// Replaces today's assignment with a fresh draw.
#[utoipa::path(
    post,
    path = "/schedule/reshuffle",
    responses(
        (status = 200, description = "The new assignment", body = DailyAssignmentDto),
        (status = 204, description = "No enabled sessions or an empty selection"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn reshuffle_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Response, HandlerError> {
    let mut planner = app_state.planner.lock().await;
    let assignment = planner
        .force_reshuffle()
        .await
        .map_err(|e| internal_error("Failed to reshuffle today", e))?;
    Ok(assignment_response(assignment))
}

/// Adds same-day sessions to today's assignment.
///
/// Unit counts are corrected into what each session can still take today.
#[utoipa::path(
    post,
    path = "/schedule/temporary",
    request_body = TemporarySessionsRequest,
    responses(
        (status = 200, description = "The merged assignment", body = DailyAssignmentDto),
        (status = 204, description = "Nothing to add"),
        (status = 400, description = "Unknown session id"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn temporary_sessions_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<TemporarySessionsRequest>,
) -> Result<Response, HandlerError> {
    let mut planner = app_state.planner.lock().await;
    let entries = planner
        .temporary_entries(
            request
                .entries
                .iter()
                .map(|e| (e.session_id.as_str(), e.units)),
        )
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let assignment = planner
        .add_temporary_sessions(&entries)
        .await
        .map_err(|e| internal_error("Failed to add temporary sessions", e))?;
    Ok(assignment_response(assignment))
}

/// Stored assignments, most recent first.
#[utoipa::path(
    get,
    path = "/schedule/history",
    responses((status = 200, description = "Assignment history", body = [DailyAssignmentDto]))
)]
pub async fn history_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let planner = app_state.planner.lock().await;
    let history: Vec<DailyAssignmentDto> = planner.history().iter().map(Into::into).collect();
    Json(history)
}

//=========================================================================================
// Session Template
//=========================================================================================

#[utoipa::path(
    get,
    path = "/template",
    responses((status = 200, description = "The session template", body = TemplateResponse))
)]
pub async fn template_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let planner = app_state.planner.lock().await;
    Json(TemplateResponse::from(planner.template()))
}

/// Enables or disables a session. Fixed sessions keep their flag.
#[utoipa::path(
    post,
    path = "/template/{id}/toggle",
    params(("id" = String, Path, description = "Session id, e.g. `dhuha`")),
    responses(
        (status = 200, description = "The session's enabled flag", body = ToggleResponse),
        (status = 404, description = "Unknown session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn toggle_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut planner = app_state.planner.lock().await;
    match planner.toggle_session(&id).await {
        Ok(Some(enabled)) => Ok(Json(ToggleResponse { id, enabled })),
        Ok(None) => Err(not_found(format!("Unknown session '{}'", id))),
        Err(e) => Err(internal_error("Failed to toggle session", e)),
    }
}

/// Sets a session's unit count, corrected into the session's bounds.
#[utoipa::path(
    put,
    path = "/template/{id}/units",
    params(("id" = String, Path, description = "Session id")),
    request_body = SetUnitsRequest,
    responses(
        (status = 200, description = "The stored count", body = SessionUnitsResponse),
        (status = 404, description = "Unknown session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn set_session_units_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<SetUnitsRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut planner = app_state.planner.lock().await;
    match planner.set_session_units(&id, request.units).await {
        Ok(Some(total_units)) => Ok(Json(SessionUnitsResponse { id, total_units })),
        Ok(None) => Err(not_found(format!("Unknown session '{}'", id))),
        Err(e) => Err(internal_error("Failed to update session units", e)),
    }
}

//=========================================================================================
// Selection
//=========================================================================================

#[utoipa::path(
    get,
    path = "/selection",
    responses((status = 200, description = "Selected groups and the chunk catalog", body = SelectionResponse))
)]
pub async fn selection_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let planner = app_state.planner.lock().await;
    Json(SelectionResponse::from(planner.state()))
}

/// Replaces the selected groups (juz) and rebuilds the catalog.
#[utoipa::path(
    put,
    path = "/selection/groups",
    request_body = SelectGroupsRequest,
    responses(
        (status = 200, description = "The updated selection", body = SelectionResponse),
        (status = 400, description = "Empty group list"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn select_groups_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<SelectGroupsRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut planner = app_state.planner.lock().await;
    match planner.select_groups(request.group_ids).await {
        Ok(true) => Ok(Json(SelectionResponse::from(planner.state()))),
        Ok(false) => Err((
            StatusCode::BAD_REQUEST,
            "At least one group must stay selected".to_string(),
        )),
        Err(e) => Err(internal_error("Failed to select groups", e)),
    }
}

/// Adds all chunks of a unit, or removes them if any are selected.
#[utoipa::path(
    post,
    path = "/selection/units/{unit_number}/toggle",
    params(("unit_number" = u32, Path, description = "Surah number")),
    responses(
        (status = 200, description = "Whether the unit is selected afterwards", body = ToggleResponse),
        (status = 404, description = "Unknown unit"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn toggle_unit_handler(
    State(app_state): State<Arc<AppState>>,
    Path(unit_number): Path<u32>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut planner = app_state.planner.lock().await;
    match planner.toggle_unit(unit_number).await {
        Ok(Some(enabled)) => Ok(Json(ToggleResponse {
            id: unit_number.to_string(),
            enabled,
        })),
        Ok(None) => Err(not_found(format!("Unknown unit {}", unit_number))),
        Err(e) => Err(internal_error("Failed to toggle unit", e)),
    }
}

#[utoipa::path(
    post,
    path = "/selection/chunks/{id}/toggle",
    params(("id" = String, Path, description = "Chunk id, `unit-start-end`")),
    responses(
        (status = 200, description = "Whether the chunk is selected afterwards", body = ToggleResponse),
        (status = 400, description = "Malformed chunk id"),
        (status = 404, description = "Not a chunk of the unit's current partition"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn toggle_chunk_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let chunk_id = parse_chunk_id(&id)?;
    let mut planner = app_state.planner.lock().await;
    match planner.toggle_chunk(&chunk_id).await {
        Ok(Some(enabled)) => Ok(Json(ToggleResponse {
            id: chunk_id.to_string(),
            enabled,
        })),
        Ok(None) => Err(not_found(format!("Unknown chunk '{}'", chunk_id))),
        Err(e) => Err(internal_error("Failed to toggle chunk", e)),
    }
}

/// Marks a chunk as mandatory so it is drawn every day, or unmarks it.
#[utoipa::path(
    post,
    path = "/selection/chunks/{id}/mandatory",
    params(("id" = String, Path, description = "Chunk id, `unit-start-end`")),
    responses(
        (status = 200, description = "The chunk's mandatory flag", body = ToggleResponse),
        (status = 400, description = "Malformed chunk id"),
        (status = 404, description = "Chunk is not selected"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn toggle_mandatory_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let chunk_id = parse_chunk_id(&id)?;
    let mut planner = app_state.planner.lock().await;
    match planner.toggle_mandatory(&chunk_id).await {
        Ok(Some(enabled)) => Ok(Json(ToggleResponse {
            id: chunk_id.to_string(),
            enabled,
        })),
        Ok(None) => Err(not_found(format!("Chunk '{}' is not selected", chunk_id))),
        Err(e) => Err(internal_error("Failed to toggle mandatory chunk", e)),
    }
}

/// Forgets which chunks were drawn recently.
#[utoipa::path(
    post,
    path = "/selection/used/reset",
    responses(
        (status = 204, description = "Used set cleared"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn reset_used_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut planner = app_state.planner.lock().await;
    planner
        .reset_used()
        .await
        .map_err(|e| internal_error("Failed to reset used chunks", e))?;
    info!("Used chunks reset on request");
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Chunk Settings
//=========================================================================================

#[utoipa::path(
    get,
    path = "/settings",
    responses((status = 200, description = "Chunking preferences", body = SettingsResponse))
)]
pub async fn settings_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let planner = app_state.planner.lock().await;
    Json(SettingsResponse::from(planner.settings()))
}

/// Sets the chunk size (clamped) and re-chunks the selection.
#[utoipa::path(
    put,
    path = "/settings/chunk-size",
    request_body = ChunkSizeRequest,
    responses(
        (status = 200, description = "Stored preferences", body = SettingsResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn set_chunk_size_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ChunkSizeRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut planner = app_state.planner.lock().await;
    let settings = planner
        .set_chunk_size(request.chunk_size)
        .await
        .map_err(|e| internal_error("Failed to update chunk size", e))?;
    Ok(Json(SettingsResponse::from(settings)))
}

#[utoipa::path(
    put,
    path = "/settings/chunking",
    request_body = ChunkingRequest,
    responses(
        (status = 200, description = "Stored preferences", body = SettingsResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn set_chunking_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ChunkingRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut planner = app_state.planner.lock().await;
    let settings = planner
        .set_chunking_enabled(request.enabled)
        .await
        .map_err(|e| internal_error("Failed to update chunking", e))?;
    Ok(Json(SettingsResponse::from(settings)))
}

//=========================================================================================
// Review Queue
//=========================================================================================

#[utoipa::path(
    get,
    path = "/review",
    responses((status = 200, description = "Queued review items", body = [ReviewItemDto]))
)]
pub async fn list_reviews_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let planner = app_state.planner.lock().await;
    let items: Vec<ReviewItemDto> = planner.reviews().iter().map(Into::into).collect();
    Json(items)
}

/// Queues one of today's unit assignments for review.
#[utoipa::path(
    post,
    path = "/review",
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "The queued item", body = ReviewItemDto),
        (status = 404, description = "No such assignment today"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn add_review_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ReviewRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let forgotten: Vec<VerseSpan> = request.forgotten.into_iter().map(Into::into).collect();
    let mut planner = app_state.planner.lock().await;
    match planner
        .mark_for_review(&request.session_id, request.sequence_number, forgotten)
        .await
    {
        Ok(Some(item)) => Ok((StatusCode::CREATED, Json(ReviewItemDto::from(&item)))),
        Ok(None) => Err(not_found(format!(
            "No assignment #{} in session '{}' today",
            request.sequence_number, request.session_id
        ))),
        Err(e) => Err(internal_error("Failed to queue review", e)),
    }
}

#[utoipa::path(
    delete,
    path = "/review/{id}",
    params(("id" = Uuid, Path, description = "Review item id")),
    responses(
        (status = 204, description = "Removed"),
        (status = 404, description = "Unknown review item"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn remove_review_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut planner = app_state.planner.lock().await;
    match planner.remove_review(id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(not_found(format!("Unknown review item {}", id))),
        Err(e) => Err(internal_error("Failed to remove review item", e)),
    }
}

#[utoipa::path(
    delete,
    path = "/review",
    responses(
        (status = 204, description = "Queue cleared"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn clear_reviews_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut planner = app_state.planner.lock().await;
    planner
        .clear_reviews()
        .await
        .map_err(|e| internal_error("Failed to clear review queue", e))?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Reference Data
//=========================================================================================

/// Every surah with its verse count and juz.
#[utoipa::path(
    get,
    path = "/units",
    responses(
        (status = 200, description = "The unit catalog", body = [UnitDto]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_units_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let planner = app_state.planner.lock().await;
    let units = planner
        .units()
        .await
        .map_err(|e| internal_error("Failed to list units", e))?;
    let units: Vec<UnitDto> = units.into_iter().map(Into::into).collect();
    Ok(Json(units))
}
