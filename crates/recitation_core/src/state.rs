//! crates/recitation_core/src/state.rs
//!
//! The single persisted planner record and the reconfiguration operations that
//! regenerate its chunk catalog.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

use crate::domain::{ChunkId, ChunkRange, DateKey, TextUnit};
use crate::history::AssignmentHistory;
use crate::partition::{build_catalog, chunk_unit, ChunkSettings};
use crate::pool::SelectionState;
use crate::template::SessionTemplate;

/// Everything the planner writes back after a mutation (apart from the chunk
/// scalars and the review queue, which are stored under their own keys).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerState {
    pub template: SessionTemplate,
    pub selected_groups: Vec<u32>,
    pub selection: SelectionState,
    pub last_shuffle_date: Option<DateKey>,
    pub history: AssignmentHistory,
}

impl PlannerState {
    /// A fresh state covering every unit of the given groups.
    pub fn initial(groups: Vec<u32>, units: &[TextUnit], settings: &ChunkSettings) -> Self {
        Self {
            selected_groups: groups,
            selection: SelectionState::new(build_catalog(units, settings)),
            ..Self::default()
        }
    }

    /// Unit numbers with at least one chunk in the catalog.
    pub fn units_in_catalog(&self) -> BTreeSet<u32> {
        self.selection
            .catalog
            .iter()
            .map(|c| c.unit_number)
            .collect()
    }

    /// Replaces the selected groups and rebuilds the catalog from their units.
    /// An empty selection is ignored so at least one group always stays selected.
    pub fn select_groups(&mut self, groups: Vec<u32>, units: &[TextUnit], settings: &ChunkSettings) -> bool {
        if groups.is_empty() {
            return false;
        }
        info!("Selecting groups {:?} ({} units)", groups, units.len());
        self.selected_groups = groups;
        self.selection.replace_catalog(build_catalog(units, settings));
        true
    }

    /// Regenerates the chunks of the given units (typically the ones currently in the
    /// catalog) after a chunk size or chunking-mode change.
    pub fn regenerate_catalog(&mut self, units: &[TextUnit], settings: &ChunkSettings) {
        let before = self.selection.catalog.len();
        self.selection.replace_catalog(build_catalog(units, settings));
        info!(
            "Regenerated chunk catalog: {} -> {} chunks",
            before,
            self.selection.catalog.len()
        );
    }

    /// Removes every chunk of the unit if any is present, otherwise adds all of them.
    /// Returns whether the unit is in the catalog afterwards.
    pub fn toggle_unit(&mut self, unit: &TextUnit, settings: &ChunkSettings) -> bool {
        let present = self
            .selection
            .catalog
            .iter()
            .any(|c| c.unit_number == unit.unit_number);
        if present {
            self.selection
                .catalog
                .retain(|c| c.unit_number != unit.unit_number);
            self.selection.prune_stale();
            false
        } else {
            let mut catalog = self.selection.catalog.clone();
            catalog.extend(chunk_unit(unit, settings));
            catalog.sort();
            self.selection.replace_catalog(catalog);
            true
        }
    }

    /// Toggles a single chunk. Re-adding is only allowed for ranges that belong to the
    /// unit's current partition. Returns the membership afterwards, or `None` if the
    /// id is malformed or not a valid chunk of `unit`.
    pub fn toggle_chunk(&mut self, id: &ChunkId, unit: &TextUnit, settings: &ChunkSettings) -> Option<bool> {
        let range: ChunkRange = id.to_range()?;
        if self.selection.contains(id) {
            return Some(self.selection.toggle_chunk(range));
        }
        if !chunk_unit(unit, settings).contains(&range) {
            return None;
        }
        let added = self.selection.toggle_chunk(range);
        self.selection.catalog.sort();
        Some(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(unit_number: u32, verse_count: u32) -> TextUnit {
        TextUnit {
            unit_number,
            verse_count,
            name: format!("Unit {unit_number}"),
            groups: vec![30],
        }
    }

    fn units() -> Vec<TextUnit> {
        vec![unit(78, 40), unit(79, 46), unit(114, 6)]
    }

    #[test]
    fn initial_state_chunks_every_unit() {
        let state = PlannerState::initial(vec![30], &units(), &ChunkSettings::default());
        assert_eq!(state.selected_groups, vec![30]);
        // 78: 20+20, 79: 20+20+6, 114: 6
        assert_eq!(state.selection.catalog.len(), 2 + 3 + 1);
    }

    #[test]
    fn empty_group_selection_is_ignored() {
        let settings = ChunkSettings::default();
        let mut state = PlannerState::initial(vec![30], &units(), &settings);
        assert!(!state.select_groups(Vec::new(), &[], &settings));
        assert_eq!(state.selected_groups, vec![30]);
        assert_eq!(state.selection.catalog.len(), 6);
    }

    #[test]
    fn regenerating_prunes_ids_that_no_longer_exist() {
        let settings = ChunkSettings::default();
        let mut state = PlannerState::initial(vec![30], &units(), &settings);
        let first = ChunkRange::new(78, 1, 20);
        state.selection.toggle_mandatory(&first.id());
        state.selection.record_usage([first, ChunkRange::new(114, 1, 6)]);

        state.regenerate_catalog(&units(), &ChunkSettings { chunking_enabled: false, ..settings });
        assert_eq!(state.selection.catalog.len(), 3);
        assert!(state.selection.mandatory.is_empty());
        assert_eq!(
            state.selection.used.iter().cloned().collect::<Vec<_>>(),
            vec![ChunkRange::new(114, 1, 6).id()]
        );
    }

    #[test]
    fn toggling_a_unit_removes_and_restores_all_its_chunks() {
        let settings = ChunkSettings::default();
        let mut state = PlannerState::initial(vec![30], &units(), &settings);
        assert!(!state.toggle_unit(&unit(79, 46), &settings));
        assert_eq!(state.units_in_catalog(), BTreeSet::from([78, 114]));

        assert!(state.toggle_unit(&unit(79, 46), &settings));
        assert_eq!(state.selection.catalog.len(), 6);
        assert_eq!(state.selection.catalog[2].unit_number, 79);
    }

    #[test]
    fn toggling_a_chunk_only_readds_current_partition_ranges() {
        let settings = ChunkSettings::default();
        let mut state = PlannerState::initial(vec![30], &units(), &settings);
        let chunk = ChunkRange::new(78, 21, 40);

        assert_eq!(state.toggle_chunk(&chunk.id(), &unit(78, 40), &settings), Some(false));
        assert_eq!(state.toggle_chunk(&chunk.id(), &unit(78, 40), &settings), Some(true));

        let foreign = ChunkRange::new(78, 5, 9);
        assert_eq!(state.toggle_chunk(&foreign.id(), &unit(78, 40), &settings), None);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let state: PlannerState = serde_json::from_str(r#"{"selected_groups":[29,30]}"#).unwrap();
        assert_eq!(state.selected_groups, vec![29, 30]);
        assert_eq!(state.template, SessionTemplate::default());
        assert!(state.history.is_empty());
    }
}
