//! crates/recitation_core/src/scheduler.rs
//!
//! The assignment scheduler. Combines a draw from the selection pool with the
//! session template to produce one day's assignment, then records the draw in the
//! used set and the history.
//!
//! These functions are pure state transitions over [`PlannerState`]; persisting the
//! result is left to the caller.

use std::collections::HashSet;
use tracing::info;

use crate::domain::{ChunkRange, DailyAssignment, DateKey, Session, SessionAssignment, UnitAssignment};
use crate::pool::{compute_draw_pool, DrawPool};
use crate::ports::RandomSource;
use crate::state::PlannerState;
use crate::template::{adjust_units, default_session, SessionTemplate};

//=========================================================================================
// Temporary Sessions
//=========================================================================================

/// An ad-hoc, same-day session that is not part of the persisted template.
///
/// `units` are the session's rakaat; `recitations` is how many chunks it consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryEntry {
    pub session_id: String,
    pub session_name: String,
    pub units: u32,
    pub recitations: u32,
}

/// A temporary entry named a session outside the default catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown session '{0}'")]
pub struct UnknownSession(pub String);

impl TemporaryEntry {
    /// An entry that recites in every one of its `units`.
    pub fn new(session_id: impl Into<String>, session_name: impl Into<String>, units: u32) -> Self {
        Self {
            session_id: session_id.into(),
            session_name: session_name.into(),
            units,
            recitations: units,
        }
    }

    /// Builds an entry for a catalog session, clamping `units` to what is left of the
    /// session's maximum after the enabled template's rakaat. Temporary rakaat already
    /// in `today` or `pending` in the same batch count against it too. Returns `None`
    /// for ids outside the default catalog.
    pub fn for_session(
        template: &SessionTemplate,
        today: Option<&DailyAssignment>,
        pending: &[TemporaryEntry],
        session_id: &str,
        units: u32,
    ) -> Option<Self> {
        let session = default_session(session_id)?;
        let in_template = template
            .get(session_id)
            .filter(|s| s.enabled)
            .map(|s| s.total_units)
            .unwrap_or(0);
        let already_added = today
            .and_then(|a| a.session_assignments.iter().find(|s| s.session_id == session_id))
            .map(|s| s.unit_assignments.iter().filter(|u| u.is_temporary).count() as u32)
            .map(|recitations| rakaat_for(&session, recitations))
            .unwrap_or(0);
        let in_batch: u32 = pending
            .iter()
            .filter(|e| e.session_id == session_id)
            .map(|e| e.units)
            .sum();

        let scheduled = in_template + already_added + in_batch;
        let max = session.max_units.saturating_sub(scheduled);
        let min = session.min_units.min(max);
        let units = adjust_units(min, units, min, max, session.must_be_odd);
        let recitations = session.recitation_units.map_or(units, |r| r.min(units));
        Some(Self {
            session_id: session.id,
            session_name: session.name,
            units,
            recitations,
        })
    }
}

/// Rakaat behind `recitations` temporary recitations of a catalog session.
fn rakaat_for(session: &Session, recitations: u32) -> u32 {
    match session.recitation_units {
        Some(per_session) if per_session > 0 => recitations.div_ceil(per_session) * session.total_units,
        _ => recitations,
    }
}

/// Resolves a batch of `(session id, units)` requests in order, each entry seeing the
/// capacity the earlier ones used up.
pub fn resolve_temporary_entries<'a>(
    template: &SessionTemplate,
    today: Option<&DailyAssignment>,
    requests: impl IntoIterator<Item = (&'a str, u32)>,
) -> Result<Vec<TemporaryEntry>, UnknownSession> {
    let mut entries = Vec::new();
    for (session_id, units) in requests {
        let entry = TemporaryEntry::for_session(template, today, &entries, session_id, units)
            .ok_or_else(|| UnknownSession(session_id.to_string()))?;
        entries.push(entry);
    }
    Ok(entries)
}

//=========================================================================================
// Draw Consumption
//=========================================================================================

/// Walks a draw sequence, wrapping around when more items are consumed than drawn.
struct DrawCursor {
    sequence: Vec<ChunkRange>,
    position: usize,
}

impl DrawCursor {
    fn new(sequence: Vec<ChunkRange>) -> Self {
        Self {
            sequence,
            position: 0,
        }
    }

    fn take(&mut self, count: u32, first_sequence_number: u32, is_temporary: bool) -> Vec<UnitAssignment> {
        (0..count)
            .map(|offset| {
                let chunk = self.sequence[self.position % self.sequence.len()];
                self.position += 1;
                UnitAssignment::new(first_sequence_number + offset, &chunk, is_temporary)
            })
            .collect()
    }
}

fn template_sessions(template: &SessionTemplate, cursor: &mut DrawCursor) -> Vec<SessionAssignment> {
    template
        .enabled_sessions_in_order()
        .into_iter()
        .map(|session| SessionAssignment {
            session_id: session.id.clone(),
            session_name: session.name.clone(),
            order: session.order,
            is_temporary: false,
            unit_assignments: cursor.take(session.recitation_count(), 1, false),
        })
        .collect()
}

/// Stores the assignment and folds the consumed chunks into the used set.
fn commit(state: &mut PlannerState, pool: DrawPool, assignment: &DailyAssignment) {
    state.selection.used = pool.used;
    state.selection.record_usage(assignment.chunks());
    state.last_shuffle_date = Some(assignment.date.clone());
    state.history.upsert(assignment.clone());
}

fn draw_fresh(state: &mut PlannerState, today: &DateKey, random: &mut dyn RandomSource) -> Option<DailyAssignment> {
    let required = state.template.total_required_units() as usize;
    if required == 0 || state.selection.catalog.is_empty() {
        info!("Nothing to schedule for {} (required {}, catalog {})", today, required, state.selection.catalog.len());
        return None;
    }

    let pool = compute_draw_pool(&state.selection, required, random);
    if pool.is_empty() {
        return None;
    }
    let mut cursor = DrawCursor::new(pool.sequence.clone());
    let assignment = DailyAssignment {
        date: today.clone(),
        session_assignments: template_sessions(&state.template, &mut cursor),
    };
    commit(state, pool, &assignment);
    info!("Scheduled {} recitations for {}", assignment.total_units(), today);
    Some(assignment)
}

//=========================================================================================
// Public Operations
//=========================================================================================

/// Returns today's assignment, drawing one only if the history has none yet.
///
/// `None` means nothing can be scheduled (no enabled recitations or an empty
/// catalog); it is not an error.
pub fn shuffle_for_today(state: &mut PlannerState, today: &DateKey, random: &mut dyn RandomSource) -> Option<DailyAssignment> {
    if let Some(existing) = state.history.get(today) {
        return Some(existing.clone());
    }
    draw_fresh(state, today, random)
}

/// Drops today's assignment and draws a new one in its place. Other dates in the
/// history are left untouched.
///
/// When nothing can be scheduled the old assignment is still removed.
pub fn force_reshuffle(state: &mut PlannerState, today: &DateKey, random: &mut dyn RandomSource) -> Option<DailyAssignment> {
    info!("Reshuffling assignment for {}", today);
    if state.history.remove(today).is_some() {
        info!("Dropped the previous assignment for {}", today);
    }
    draw_fresh(state, today, random)
}

/// Adds same-day temporary sessions to today's assignment.
///
/// A single draw covers the template and the temporary entries together. When today
/// already has an assignment its drawn units are kept and only the temporary units
/// are taken from the draw, preferring chunks not yet recited today. Entries whose
/// session is already present are appended to it with continuing sequence numbers.
pub fn add_temporary_sessions(
    state: &mut PlannerState,
    today: &DateKey,
    entries: &[TemporaryEntry],
    random: &mut dyn RandomSource,
) -> Option<DailyAssignment> {
    let entries: Vec<&TemporaryEntry> = entries.iter().filter(|e| e.recitations > 0).collect();
    if entries.is_empty() {
        return state.history.get(today).cloned();
    }

    let temporary_total: u32 = entries.iter().map(|e| e.recitations).sum();
    let required = (state.template.total_required_units() + temporary_total) as usize;
    if state.selection.catalog.is_empty() {
        info!("Nothing to schedule for {}: empty catalog", today);
        return None;
    }

    let pool = compute_draw_pool(&state.selection, required, random);
    if pool.is_empty() {
        return None;
    }

    let (mut sessions, mut cursor) = match state.history.get(today) {
        Some(existing) => {
            let recited: HashSet<ChunkRange> = existing.chunks().collect();
            let (fresh, repeated): (Vec<ChunkRange>, Vec<ChunkRange>) =
                pool.sequence.iter().copied().partition(|c| !recited.contains(c));
            let mut ordered = fresh;
            ordered.extend(repeated);
            (existing.session_assignments.clone(), DrawCursor::new(ordered))
        }
        None => {
            let mut cursor = DrawCursor::new(pool.sequence.clone());
            (template_sessions(&state.template, &mut cursor), cursor)
        }
    };

    for entry in entries {
        if let Some(target) = sessions.iter_mut().find(|s| s.session_id == entry.session_id) {
            let next = target.next_sequence_number();
            target
                .unit_assignments
                .extend(cursor.take(entry.recitations, next, true));
        } else {
            sessions.push(SessionAssignment {
                session_id: entry.session_id.clone(),
                session_name: entry.session_name.clone(),
                order: state.template.order_of(&entry.session_id),
                is_temporary: true,
                unit_assignments: cursor.take(entry.recitations, 1, true),
            });
        }
    }
    sessions.sort_by_key(|s| s.order);

    let assignment = DailyAssignment {
        date: today.clone(),
        session_assignments: sessions,
    };
    commit(state, pool, &assignment);
    info!(
        "Added {} temporary recitations to {}",
        temporary_total, today
    );
    Some(assignment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChunkId;
    use crate::pool::SelectionState;
    use crate::random::SeededRandom;
    use crate::template::default_sessions;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn day(d: u32) -> DateKey {
        DateKey::from_date(NaiveDate::from_ymd_opt(2024, 7, d).unwrap())
    }

    fn catalog(n: u32) -> Vec<ChunkRange> {
        (1..=n).map(|u| ChunkRange::new(u, 1, 10)).collect()
    }

    /// Only "dhuha" enabled, reciting `units` times.
    fn single_session_state(units: u32, chunks: u32) -> PlannerState {
        let mut template = SessionTemplate::default();
        for session in default_sessions() {
            if session.enabled {
                template.toggle_enabled(&session.id);
            }
        }
        template.toggle_enabled("dhuha");
        template.set_recitation_count("dhuha", units);
        PlannerState {
            template,
            selected_groups: vec![30],
            selection: SelectionState::new(catalog(chunks)),
            ..PlannerState::default()
        }
    }

    fn assigned_ids(assignment: &DailyAssignment) -> BTreeSet<ChunkId> {
        assignment.chunks().map(|c| c.id()).collect()
    }

    #[test]
    fn same_day_shuffle_is_idempotent() {
        let mut state = PlannerState {
            selection: SelectionState::new(catalog(20)),
            ..PlannerState::default()
        };
        let mut random = SeededRandom::new(1);
        let first = shuffle_for_today(&mut state, &day(1), &mut random).unwrap();
        let used_after_first = state.selection.used.clone();
        let second = shuffle_for_today(&mut state, &day(1), &mut random).unwrap();

        assert_eq!(first, second);
        assert_eq!(state.selection.used, used_after_first);
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn sessions_follow_template_order_and_counts() {
        let mut state = PlannerState {
            selection: SelectionState::new(catalog(30)),
            ..PlannerState::default()
        };
        let assignment = shuffle_for_today(&mut state, &day(1), &mut SeededRandom::new(2)).unwrap();

        let shape: Vec<(&str, usize)> = assignment
            .session_assignments
            .iter()
            .map(|s| (s.session_id.as_str(), s.unit_assignments.len()))
            .collect();
        assert_eq!(shape, vec![("tahajud", 4), ("witir", 3), ("dhuha", 4)]);
        for session in &assignment.session_assignments {
            let numbers: Vec<u32> = session.unit_assignments.iter().map(|u| u.sequence_number).collect();
            assert_eq!(numbers, (1..=session.unit_assignments.len() as u32).collect::<Vec<_>>());
        }
        assert_eq!(state.last_shuffle_date, Some(day(1)));
        assert_eq!(state.selection.used, assigned_ids(&assignment));
    }

    #[test]
    fn unconfigured_state_returns_none() {
        let mut random = SeededRandom::new(3);

        let mut empty_catalog = PlannerState::default();
        assert!(shuffle_for_today(&mut empty_catalog, &day(1), &mut random).is_none());

        let mut no_sessions = single_session_state(2, 5);
        no_sessions.template.toggle_enabled("dhuha");
        assert!(shuffle_for_today(&mut no_sessions, &day(1), &mut random).is_none());
        assert!(no_sessions.history.is_empty());
    }

    #[test]
    fn draw_wraps_around_small_catalogs() {
        let mut state = single_session_state(6, 2);
        let assignment = shuffle_for_today(&mut state, &day(1), &mut SeededRandom::new(4)).unwrap();
        let units = &assignment.session_assignments[0].unit_assignments;
        assert_eq!(units.len(), 6);
        assert_eq!(assigned_ids(&assignment).len(), 2);
        assert_eq!(units[0].chunk(), units[2].chunk());
    }

    #[test]
    fn exhausted_pool_resets_on_the_next_day() {
        let mut state = single_session_state(5, 5);
        let mut random = SeededRandom::new(5);
        let first = shuffle_for_today(&mut state, &day(1), &mut random).unwrap();
        assert_eq!(assigned_ids(&first).len(), 5);
        assert_eq!(state.selection.used.len(), 5);

        let second = shuffle_for_today(&mut state, &day(2), &mut random).unwrap();
        assert_eq!(assigned_ids(&second), assigned_ids(&first));
        assert!(state.selection.used.len() <= state.selection.catalog.len());
    }

    #[test]
    fn rotation_avoids_recent_chunks_until_exhausted() {
        let mut state = single_session_state(4, 12);
        let mut random = SeededRandom::new(6);
        let mut seen = BTreeSet::new();
        for d in 1..=3 {
            let assignment = shuffle_for_today(&mut state, &day(d), &mut random).unwrap();
            let ids = assigned_ids(&assignment);
            assert!(ids.is_disjoint(&seen), "day {d} repeated a chunk");
            seen.extend(ids);
        }
        assert_eq!(seen.len(), 12);
    }

    #[test]
    fn mandatory_chunks_appear_every_day() {
        let mut state = single_session_state(3, 20);
        let must = ChunkRange::new(13, 1, 10);
        state.selection.toggle_mandatory(&must.id());
        let mut random = SeededRandom::new(7);
        for d in 1..=6 {
            let assignment = shuffle_for_today(&mut state, &day(d), &mut random).unwrap();
            assert!(assignment.chunks().any(|c| c == must), "day {d}");
        }
        assert!(state.selection.used.contains(&must.id()));
    }

    #[test]
    fn reshuffle_replaces_only_today() {
        let mut state = single_session_state(3, 40);
        let mut random = SeededRandom::new(8);
        let yesterday = shuffle_for_today(&mut state, &day(1), &mut random).unwrap();
        let today = shuffle_for_today(&mut state, &day(2), &mut random).unwrap();

        let redrawn = force_reshuffle(&mut state, &day(2), &mut random).unwrap();
        assert_ne!(redrawn, today);
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.history.get(&day(1)), Some(&yesterday));
        assert_eq!(state.history.get(&day(2)), Some(&redrawn));
        assert_eq!(state.history.entries()[1].date, day(2));
    }

    #[test]
    fn temporary_session_is_added_after_template_sessions() {
        let mut state = single_session_state(2, 30);
        let mut random = SeededRandom::new(9);
        let entries = [TemporaryEntry::new("maghrib", "Maghrib", 2)];
        let assignment = add_temporary_sessions(&mut state, &day(1), &entries, &mut random).unwrap();

        let ids: Vec<(&str, bool)> = assignment
            .session_assignments
            .iter()
            .map(|s| (s.session_id.as_str(), s.is_temporary))
            .collect();
        assert_eq!(ids, vec![("dhuha", false), ("maghrib", true)]);
        assert!(assignment.session_assignments[1].unit_assignments.iter().all(|u| u.is_temporary));
        assert_eq!(assigned_ids(&assignment).len(), 4);
    }

    #[test]
    fn temporary_units_append_to_matching_session() {
        let mut state = single_session_state(2, 30);
        let mut random = SeededRandom::new(10);
        let original = shuffle_for_today(&mut state, &day(1), &mut random).unwrap();

        let entries = [TemporaryEntry::new("dhuha", "Dhuha", 4)];
        let merged = add_temporary_sessions(&mut state, &day(1), &entries, &mut random).unwrap();

        let dhuha = &merged.session_assignments[0];
        let numbers: Vec<u32> = dhuha.unit_assignments.iter().map(|u| u.sequence_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
        // Already drawn units survive.
        assert_eq!(
            dhuha.unit_assignments[..2],
            original.session_assignments[0].unit_assignments[..]
        );
        assert!(dhuha.unit_assignments[2..].iter().all(|u| u.is_temporary));
        // New units prefer chunks not yet recited today.
        assert_eq!(assigned_ids(&merged).len(), 6);
        assert_eq!(state.history.get(&day(1)), Some(&merged));
    }

    #[test]
    fn second_temporary_batch_keeps_numbering() {
        let mut state = single_session_state(2, 30);
        let mut random = SeededRandom::new(11);
        let entries = [TemporaryEntry::new("witir", "Witir", 1)];
        add_temporary_sessions(&mut state, &day(1), &entries, &mut random).unwrap();
        let assignment = add_temporary_sessions(&mut state, &day(1), &entries, &mut random).unwrap();

        let witir = assignment
            .session_assignments
            .iter()
            .find(|s| s.session_id == "witir")
            .unwrap();
        let numbers: Vec<u32> = witir.unit_assignments.iter().map(|u| u.sequence_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        // witir (order 2) sorts before dhuha (order 5)
        assert_eq!(assignment.session_assignments[0].session_id, "witir");
    }

    #[test]
    fn temporary_sessions_work_without_template_sessions() {
        let mut state = single_session_state(2, 10);
        state.template.toggle_enabled("dhuha");
        let entries = [TemporaryEntry::new("custom", "Custom", 3)];
        let assignment = add_temporary_sessions(&mut state, &day(1), &entries, &mut SeededRandom::new(12)).unwrap();
        assert_eq!(assignment.session_assignments.len(), 1);
        assert_eq!(assignment.session_assignments[0].order, u32::MAX);
    }

    #[test]
    fn empty_temporary_batch_changes_nothing() {
        let mut state = single_session_state(2, 10);
        let mut random = SeededRandom::new(13);
        assert!(add_temporary_sessions(&mut state, &day(1), &[], &mut random).is_none());
        let zero = [TemporaryEntry::new("dhuha", "Dhuha", 0)];
        assert!(add_temporary_sessions(&mut state, &day(1), &zero, &mut random).is_none());
        assert!(state.history.is_empty());
    }

    #[test]
    fn reshuffle_of_an_unconfigured_day_drops_the_old_assignment() {
        let mut state = single_session_state(3, 20);
        let mut random = SeededRandom::new(14);
        shuffle_for_today(&mut state, &day(1), &mut random).unwrap();
        state.template.toggle_enabled("dhuha");

        assert!(force_reshuffle(&mut state, &day(1), &mut random).is_none());
        assert!(state.history.get(&day(1)).is_none());
        assert!(state.history.is_empty());
    }

    #[test]
    fn temporary_entry_respects_remaining_capacity() {
        let template = SessionTemplate::default();
        // dhuha is enabled with 4 of 12
        let dhuha = TemporaryEntry::for_session(&template, None, &[], "dhuha", 20).unwrap();
        assert_eq!(dhuha.units, 8);
        assert_eq!(dhuha.recitations, 8);
        assert_eq!(dhuha.session_name, "Dhuha");
        // maghrib is disabled, so its own bounds apply: 3 rakaat, 2 recited
        let maghrib = TemporaryEntry::for_session(&template, None, &[], "maghrib", 1).unwrap();
        assert_eq!(maghrib.units, 3);
        assert_eq!(maghrib.recitations, 2);
        // witir is odd-only: 3 of 11 scheduled leaves room for 8 -> 7
        let witir = TemporaryEntry::for_session(&template, None, &[], "witir", 8).unwrap();
        assert_eq!(witir.units, 7);
        assert!(TemporaryEntry::for_session(&template, None, &[], "nope", 2).is_none());
    }

    #[test]
    fn temporary_main_session_consumes_only_its_recitations() {
        let mut state = single_session_state(2, 30);
        let mut random = SeededRandom::new(15);
        let maghrib = TemporaryEntry::for_session(&state.template, None, &[], "maghrib", 3).unwrap();
        let assignment = add_temporary_sessions(&mut state, &day(1), &[maghrib], &mut random).unwrap();

        let session = assignment
            .session_assignments
            .iter()
            .find(|s| s.session_id == "maghrib")
            .unwrap();
        assert_eq!(session.unit_assignments.len(), 2);
        assert_eq!(assignment.total_units(), 2 + 2);
    }

    #[test]
    fn batch_entries_share_the_session_maximum() {
        let template = SessionTemplate::default();
        let requests = [("dhuha", 6), ("dhuha", 6), ("dhuha", 6)];
        let entries = resolve_temporary_entries(&template, None, requests).unwrap();
        let units: Vec<u32> = entries.iter().map(|e| e.units).collect();
        // 4 in the template leaves 8: 6, then 2, then nothing
        assert_eq!(units, vec![6, 2, 0]);

        let maghrib = resolve_temporary_entries(&template, None, [("maghrib", 3), ("maghrib", 3)]).unwrap();
        assert_eq!(maghrib[1].units, 0);
        assert_eq!(maghrib[1].recitations, 0);

        let unknown = resolve_temporary_entries(&template, None, [("dhuha", 2), ("nope", 2)]);
        assert_eq!(unknown, Err(UnknownSession("nope".to_string())));
    }

    #[test]
    fn repeated_batches_never_exceed_the_session_maximum() {
        let mut state = single_session_state(4, 40);
        let mut random = SeededRandom::new(16);
        shuffle_for_today(&mut state, &day(1), &mut random).unwrap();

        for _ in 0..3 {
            let entries =
                resolve_temporary_entries(&state.template, state.history.get(&day(1)), [("dhuha", 12)]).unwrap();
            add_temporary_sessions(&mut state, &day(1), &entries, &mut random).unwrap();
        }

        let dhuha = state
            .history
            .get(&day(1))
            .and_then(|a| a.session_assignments.iter().find(|s| s.session_id == "dhuha"))
            .unwrap();
        assert_eq!(dhuha.unit_assignments.len(), 12);
    }

    #[test]
    fn repeated_main_session_batches_stop_at_one_instance() {
        let mut state = single_session_state(2, 30);
        let mut random = SeededRandom::new(17);

        for _ in 0..2 {
            let entries =
                resolve_temporary_entries(&state.template, state.history.get(&day(1)), [("isya", 4)]).unwrap();
            add_temporary_sessions(&mut state, &day(1), &entries, &mut random).unwrap();
        }

        let isya = state
            .history
            .get(&day(1))
            .and_then(|a| a.session_assignments.iter().find(|s| s.session_id == "isya"))
            .unwrap();
        assert_eq!(isya.unit_assignments.len(), 2);
    }
}
