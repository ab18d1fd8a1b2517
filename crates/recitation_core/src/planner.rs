//! crates/recitation_core/src/planner.rs
//!
//! The `Planner` application service. It owns the in-memory planner record and
//! drives every operation against the injected ports: the catalog for text units,
//! the clock for "today", the random source for draws and the key-value store,
//! which receives the whole updated record after each mutation.
//!
//! Every mutation is computed on a copy; the live record only changes once the
//! store has accepted the copy.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{ChunkId, DailyAssignment, DateKey, TextUnit, VerseSpan};
use crate::partition::ChunkSettings;
use crate::persistence::StateRepository;
use crate::ports::{Clock, KeyValueStore, PortResult, RandomSource, TextCatalog};
use crate::review::{ReviewItem, ReviewQueue};
use crate::scheduler::{self, TemporaryEntry, UnknownSession};
use crate::state::PlannerState;
use crate::template::SessionTemplate;

pub struct Planner {
    state: PlannerState,
    settings: ChunkSettings,
    reviews: ReviewQueue,
    repository: StateRepository,
    catalog: Arc<dyn TextCatalog>,
    clock: Arc<dyn Clock>,
    random: Box<dyn RandomSource>,
}

impl Planner {
    /// Restores the planner from `store`. A missing or unreadable record is replaced
    /// by a fresh one covering `default_groups`, which is written back immediately.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        catalog: Arc<dyn TextCatalog>,
        clock: Arc<dyn Clock>,
        random: Box<dyn RandomSource>,
        default_groups: Vec<u32>,
    ) -> PortResult<Self> {
        let repository = StateRepository::new(store);
        let settings = repository.load_chunk_settings().await?;
        let reviews = repository.load_reviews().await?;

        let state = match repository.load_state().await? {
            Some(state) => state,
            None => {
                info!("No usable planner state; starting from groups {:?}", default_groups);
                let units = catalog.units_in_groups(&default_groups).await?;
                let state = PlannerState::initial(default_groups, &units, &settings);
                repository.save_state(&state).await?;
                state
            }
        };

        Ok(Self {
            state,
            settings,
            reviews,
            repository,
            catalog,
            clock,
            random,
        })
    }

    pub fn today(&self) -> DateKey {
        DateKey::from_date(self.clock.today())
    }

    pub fn state(&self) -> &PlannerState {
        &self.state
    }

    pub fn template(&self) -> &SessionTemplate {
        &self.state.template
    }

    pub fn settings(&self) -> ChunkSettings {
        self.settings
    }

    pub fn reviews(&self) -> &[ReviewItem] {
        self.reviews.items()
    }

    /// Saves `next` and then makes it the live record.
    async fn commit(&mut self, next: PlannerState) -> PortResult<()> {
        self.repository.save_state(&next).await?;
        self.state = next;
        Ok(())
    }

    //=====================================================================================
    // Scheduling
    //=====================================================================================

    /// Today's assignment, drawing it on the first call of the day.
    #[instrument(skip(self))]
    pub async fn shuffle_for_today(&mut self) -> PortResult<Option<DailyAssignment>> {
        let today = self.today();
        if let Some(existing) = self.state.history.get(&today) {
            return Ok(Some(existing.clone()));
        }
        let mut next = self.state.clone();
        let assignment = scheduler::shuffle_for_today(&mut next, &today, self.random.as_mut());
        if assignment.is_some() {
            self.commit(next).await?;
        }
        Ok(assignment)
    }

    /// Replaces today's assignment with a new draw. Today's old assignment is removed
    /// even when nothing can be drawn.
    #[instrument(skip(self))]
    pub async fn force_reshuffle(&mut self) -> PortResult<Option<DailyAssignment>> {
        let today = self.today();
        let mut next = self.state.clone();
        let assignment = scheduler::force_reshuffle(&mut next, &today, self.random.as_mut());
        if next != self.state {
            self.commit(next).await?;
        }
        Ok(assignment)
    }

    /// Resolves a batch of `(session id, units)` requests against the template and
    /// what today already holds, in request order.
    pub fn temporary_entries<'a>(
        &self,
        requests: impl IntoIterator<Item = (&'a str, u32)>,
    ) -> Result<Vec<TemporaryEntry>, UnknownSession> {
        let today = self.state.history.get(&self.today());
        scheduler::resolve_temporary_entries(&self.state.template, today, requests)
    }

    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    pub async fn add_temporary_sessions(
        &mut self,
        entries: &[TemporaryEntry],
    ) -> PortResult<Option<DailyAssignment>> {
        let today = self.today();
        let mut next = self.state.clone();
        let assignment = scheduler::add_temporary_sessions(&mut next, &today, entries, self.random.as_mut());
        if next != self.state {
            self.commit(next).await?;
        }
        Ok(assignment)
    }

    pub fn today_assignment(&self) -> Option<DailyAssignment> {
        self.state.history.get(&self.today()).cloned()
    }

    /// Stored assignments, most recent first.
    pub fn history(&self) -> Vec<DailyAssignment> {
        self.state.history.newest_first()
    }

    //=====================================================================================
    // Template
    //=====================================================================================

    pub async fn toggle_session(&mut self, session_id: &str) -> PortResult<Option<bool>> {
        let mut next = self.state.clone();
        let Some(enabled) = next.template.toggle_enabled(session_id) else {
            return Ok(None);
        };
        self.commit(next).await?;
        Ok(Some(enabled))
    }

    pub async fn set_session_units(&mut self, session_id: &str, count: u32) -> PortResult<Option<u32>> {
        let mut next = self.state.clone();
        let Some(stored) = next.template.set_recitation_count(session_id, count) else {
            return Ok(None);
        };
        self.commit(next).await?;
        Ok(Some(stored))
    }

    //=====================================================================================
    // Selection
    //=====================================================================================

    async fn find_unit(&self, unit_number: u32) -> PortResult<Option<TextUnit>> {
        Ok(self
            .catalog
            .list_units()
            .await?
            .into_iter()
            .find(|u| u.unit_number == unit_number))
    }

    /// Replaces the selected groups. Returns `false` (and changes nothing) for an
    /// empty selection.
    pub async fn select_groups(&mut self, group_ids: Vec<u32>) -> PortResult<bool> {
        if group_ids.is_empty() {
            return Ok(false);
        }
        let units = self.catalog.units_in_groups(&group_ids).await?;
        let mut next = self.state.clone();
        next.select_groups(group_ids, &units, &self.settings);
        self.commit(next).await?;
        Ok(true)
    }

    /// Returns whether the unit is in the catalog afterwards, or `None` for an
    /// unknown unit.
    pub async fn toggle_unit(&mut self, unit_number: u32) -> PortResult<Option<bool>> {
        let Some(unit) = self.find_unit(unit_number).await? else {
            return Ok(None);
        };
        let mut next = self.state.clone();
        let present = next.toggle_unit(&unit, &self.settings);
        self.commit(next).await?;
        Ok(Some(present))
    }

    pub async fn toggle_chunk(&mut self, id: &ChunkId) -> PortResult<Option<bool>> {
        let Some(range) = id.to_range() else {
            return Ok(None);
        };
        let Some(unit) = self.find_unit(range.unit_number).await? else {
            return Ok(None);
        };
        let mut next = self.state.clone();
        let Some(present) = next.toggle_chunk(id, &unit, &self.settings) else {
            return Ok(None);
        };
        self.commit(next).await?;
        Ok(Some(present))
    }

    /// Returns the chunk's mandatory flag afterwards, or `None` when it is not in the
    /// catalog.
    pub async fn toggle_mandatory(&mut self, id: &ChunkId) -> PortResult<Option<bool>> {
        let mut next = self.state.clone();
        let Some(mandatory) = next.selection.toggle_mandatory(id) else {
            return Ok(None);
        };
        self.commit(next).await?;
        Ok(Some(mandatory))
    }

    pub async fn reset_used(&mut self) -> PortResult<()> {
        let mut next = self.state.clone();
        next.selection.reset_used();
        self.commit(next).await
    }

    //=====================================================================================
    // Chunk Settings
    //=====================================================================================

    /// Stores `settings` and re-chunks every unit currently in the catalog with them.
    async fn apply_chunk_settings(&mut self, settings: ChunkSettings) -> PortResult<ChunkSettings> {
        self.repository.save_chunk_settings(&settings).await?;
        self.settings = settings;

        let in_catalog = self.state.units_in_catalog();
        let units: Vec<TextUnit> = self
            .catalog
            .list_units()
            .await?
            .into_iter()
            .filter(|u| in_catalog.contains(&u.unit_number))
            .collect();
        let mut next = self.state.clone();
        next.regenerate_catalog(&units, &settings);
        self.commit(next).await?;
        Ok(settings)
    }

    /// Stores the clamped size and re-chunks every unit currently in the catalog.
    pub async fn set_chunk_size(&mut self, chunk_size: u32) -> PortResult<ChunkSettings> {
        self.apply_chunk_settings(self.settings.with_chunk_size(chunk_size)).await
    }

    pub async fn set_chunking_enabled(&mut self, enabled: bool) -> PortResult<ChunkSettings> {
        let settings = ChunkSettings {
            chunking_enabled: enabled,
            ..self.settings
        };
        self.apply_chunk_settings(settings).await
    }

    //=====================================================================================
    // Review Queue
    //=====================================================================================

    /// Queues one of today's unit assignments for review. Returns `None` when today
    /// has no such assignment.
    pub async fn mark_for_review(
        &mut self,
        session_id: &str,
        sequence_number: u32,
        forgotten: Vec<VerseSpan>,
    ) -> PortResult<Option<ReviewItem>> {
        let Some(candidate) = self
            .today_assignment()
            .and_then(|a| a.review_candidate(session_id, sequence_number))
        else {
            return Ok(None);
        };
        let mut next = self.reviews.clone();
        let item = next.add(candidate, forgotten).clone();
        self.repository.save_reviews(&next).await?;
        self.reviews = next;
        Ok(Some(item))
    }

    pub async fn remove_review(&mut self, id: Uuid) -> PortResult<bool> {
        let mut next = self.reviews.clone();
        if next.remove(id).is_none() {
            return Ok(false);
        }
        self.repository.save_reviews(&next).await?;
        self.reviews = next;
        Ok(true)
    }

    pub async fn clear_reviews(&mut self) -> PortResult<()> {
        let next = ReviewQueue::default();
        self.repository.save_reviews(&next).await?;
        self.reviews = next;
        Ok(())
    }

    pub async fn units(&self) -> PortResult<Vec<TextUnit>> {
        self.catalog.list_units().await
    }
}
