//! crates/recitation_core/src/pool.rs
//!
//! The selection pool: which chunks may be drawn, which must be, and which were
//! drawn recently.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

use crate::domain::{ChunkId, ChunkRange};
use crate::ports::RandomSource;
use crate::random::shuffle;

/// The chunk catalog plus the mandatory and recently-used id sets.
///
/// `mandatory` is always a subset of the catalog. `used` may hold ids that are no
/// longer in the catalog; those are harmless and pruned on reconfiguration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionState {
    pub catalog: Vec<ChunkRange>,
    pub mandatory: BTreeSet<ChunkId>,
    pub used: BTreeSet<ChunkId>,
}

impl SelectionState {
    pub fn new(catalog: Vec<ChunkRange>) -> Self {
        let mut state = Self::default();
        state.replace_catalog(catalog);
        state
    }

    pub fn contains(&self, id: &ChunkId) -> bool {
        self.catalog.iter().any(|c| &c.id() == id)
    }

    pub fn is_mandatory(&self, id: &ChunkId) -> bool {
        self.mandatory.contains(id)
    }

    /// Replaces the catalog (dropping duplicate ranges) and prunes ids that no longer resolve.
    pub fn replace_catalog(&mut self, catalog: Vec<ChunkRange>) {
        let mut seen = HashSet::new();
        self.catalog = catalog.into_iter().filter(|c| seen.insert(*c)).collect();
        self.prune_stale();
    }

    /// Drops `mandatory` and `used` ids that are not in the catalog.
    pub fn prune_stale(&mut self) {
        let live: HashSet<ChunkId> = self.catalog.iter().map(ChunkRange::id).collect();
        let before = self.mandatory.len() + self.used.len();
        self.mandatory.retain(|id| live.contains(id));
        self.used.retain(|id| live.contains(id));
        let pruned = before - self.mandatory.len() - self.used.len();
        if pruned > 0 {
            debug!("Pruned {} stale chunk ids", pruned);
        }
    }

    /// Adds the chunk to the catalog, or removes it (and its mandatory flag) if present.
    /// Returns whether the chunk is in the catalog afterwards.
    pub fn toggle_chunk(&mut self, chunk: ChunkRange) -> bool {
        if let Some(pos) = self.catalog.iter().position(|c| *c == chunk) {
            self.catalog.remove(pos);
            self.mandatory.remove(&chunk.id());
            false
        } else {
            self.catalog.push(chunk);
            true
        }
    }

    /// Flips the mandatory flag. Returns the new flag, or `None` when the id is not
    /// in the catalog (the flag is left untouched in that case).
    pub fn toggle_mandatory(&mut self, id: &ChunkId) -> Option<bool> {
        if !self.contains(id) {
            return None;
        }
        if self.mandatory.remove(id) {
            Some(false)
        } else {
            self.mandatory.insert(id.clone());
            Some(true)
        }
    }

    /// Marks every given chunk as used.
    pub fn record_usage<I>(&mut self, chunks: I)
    where
        I: IntoIterator<Item = ChunkRange>,
    {
        for chunk in chunks {
            self.used.insert(chunk.id());
        }
    }

    pub fn reset_used(&mut self) {
        self.used.clear();
    }
}

/// The ordered chunks a scheduler consumes for one draw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawPool {
    pub sequence: Vec<ChunkRange>,
    /// The used set to continue from once the draw is consumed.
    pub used: BTreeSet<ChunkId>,
    /// True when the pool was exhausted and `used` was ignored for this draw.
    pub was_reset: bool,
}

impl DrawPool {
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Computes the draw sequence for `required` recitations.
///
/// Mandatory chunks are always part of the sequence. The remaining slots are filled
/// from the shuffled non-mandatory chunks that have not been used yet; when those plus
/// the mandatory chunks cannot cover `required`, the used set is ignored and cleared.
/// The combined sequence is shuffled again so mandatory chunks do not cluster at the front.
pub fn compute_draw_pool(
    state: &SelectionState,
    required: usize,
    random: &mut dyn RandomSource,
) -> DrawPool {
    if required == 0 || state.catalog.is_empty() {
        return DrawPool {
            sequence: Vec::new(),
            used: state.used.clone(),
            was_reset: false,
        };
    }

    let (mandatory, non_mandatory): (Vec<ChunkRange>, Vec<ChunkRange>) = state
        .catalog
        .iter()
        .copied()
        .partition(|c| state.mandatory.contains(&c.id()));

    let mut available: Vec<ChunkRange> = non_mandatory
        .iter()
        .copied()
        .filter(|c| !state.used.contains(&c.id()))
        .collect();

    let mut used = state.used.clone();
    let was_reset = available.len() + mandatory.len() < required;
    if was_reset {
        info!(
            "Selection pool exhausted ({} available, {} mandatory, {} required); resetting used chunks",
            available.len(),
            mandatory.len(),
            required
        );
        available = non_mandatory;
        used.clear();
    }

    shuffle(&mut available, random);
    let fill = required.saturating_sub(mandatory.len());
    let mut sequence = mandatory;
    sequence.extend(available.into_iter().take(fill));
    shuffle(&mut sequence, random);

    debug!(
        "Drew {} chunks for {} required recitations",
        sequence.len(),
        required
    );
    DrawPool {
        sequence,
        used,
        was_reset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandom;

    fn catalog(n: u32) -> Vec<ChunkRange> {
        (1..=n).map(|u| ChunkRange::new(u, 1, 5)).collect()
    }

    fn ids(chunks: &[ChunkRange]) -> BTreeSet<ChunkId> {
        chunks.iter().map(ChunkRange::id).collect()
    }

    #[test]
    fn empty_catalog_or_zero_requirement_yields_empty_pool() {
        let mut random = SeededRandom::new(1);
        assert!(compute_draw_pool(&SelectionState::default(), 3, &mut random).is_empty());
        assert!(compute_draw_pool(&SelectionState::new(catalog(3)), 0, &mut random).is_empty());
    }

    #[test]
    fn draws_only_unused_chunks_when_enough_remain() {
        let mut state = SelectionState::new(catalog(6));
        state.record_usage(catalog(3));
        let pool = compute_draw_pool(&state, 3, &mut SeededRandom::new(3));

        assert!(!pool.was_reset);
        assert_eq!(ids(&pool.sequence), ids(&catalog(6)[3..]));
        assert_eq!(pool.used, state.used);
    }

    #[test]
    fn exhausted_pool_resets_and_redraws_full_catalog() {
        // Five chunks, none mandatory, all used, five required.
        let mut state = SelectionState::new(catalog(5));
        state.record_usage(catalog(5));

        let pool = compute_draw_pool(&state, 5, &mut SeededRandom::new(11));
        assert!(pool.was_reset);
        assert!(pool.used.is_empty());
        assert_eq!(pool.sequence.len(), 5);
        assert_eq!(ids(&pool.sequence), ids(&catalog(5)));
    }

    #[test]
    fn partial_exhaustion_counts_mandatory_toward_supply() {
        let mut state = SelectionState::new(catalog(4));
        state.toggle_mandatory(&ChunkRange::new(1, 1, 5).id());
        state.record_usage(catalog(4)[1..3].to_vec());

        // One unused non-mandatory chunk plus one mandatory covers two recitations.
        let pool = compute_draw_pool(&state, 2, &mut SeededRandom::new(5));
        assert!(!pool.was_reset);
        assert_eq!(
            ids(&pool.sequence),
            ids(&[ChunkRange::new(1, 1, 5), ChunkRange::new(4, 1, 5)])
        );

        // But not three.
        let pool = compute_draw_pool(&state, 3, &mut SeededRandom::new(5));
        assert!(pool.was_reset);
    }

    #[test]
    fn mandatory_chunks_are_always_in_the_sequence() {
        let mut state = SelectionState::new(catalog(30));
        let must = [ChunkRange::new(7, 1, 5), ChunkRange::new(19, 1, 5)];
        for chunk in &must {
            state.toggle_mandatory(&chunk.id());
        }
        // Even when they were recently used.
        state.record_usage(must);

        for seed in 0..25 {
            let pool = compute_draw_pool(&state, 4, &mut SeededRandom::new(seed));
            assert_eq!(pool.sequence.len(), 4);
            for chunk in &must {
                assert!(pool.sequence.contains(chunk), "seed {seed}");
            }
        }
    }

    #[test]
    fn mandatory_chunks_do_not_always_lead() {
        let mut state = SelectionState::new(catalog(10));
        state.toggle_mandatory(&ChunkRange::new(1, 1, 5).id());

        let leading = (0..40)
            .filter(|seed| {
                let pool = compute_draw_pool(&state, 5, &mut SeededRandom::new(*seed));
                pool.sequence[0] == ChunkRange::new(1, 1, 5)
            })
            .count();
        assert!(leading < 40);
    }

    #[test]
    fn small_catalog_yields_short_sequence() {
        let state = SelectionState::new(catalog(2));
        let pool = compute_draw_pool(&state, 5, &mut SeededRandom::new(2));
        assert_eq!(pool.sequence.len(), 2);
    }

    #[test]
    fn toggling_chunk_out_drops_mandatory_flag() {
        let chunk = ChunkRange::new(3, 1, 5);
        let mut state = SelectionState::new(catalog(3));
        assert_eq!(state.toggle_mandatory(&chunk.id()), Some(true));

        assert!(!state.toggle_chunk(chunk));
        assert!(!state.is_mandatory(&chunk.id()));
        assert!(state.toggle_chunk(chunk));
        assert_eq!(state.catalog.len(), 3);
    }

    #[test]
    fn mandatory_toggle_ignores_unknown_ids() {
        let mut state = SelectionState::new(catalog(2));
        assert_eq!(state.toggle_mandatory(&ChunkRange::new(99, 1, 5).id()), None);
        assert!(state.mandatory.is_empty());
    }

    #[test]
    fn replacing_catalog_prunes_stale_ids() {
        let mut state = SelectionState::new(catalog(4));
        state.toggle_mandatory(&ChunkRange::new(4, 1, 5).id());
        state.record_usage(catalog(4));

        state.replace_catalog(catalog(2));
        assert!(state.mandatory.is_empty());
        assert_eq!(state.used, ids(&catalog(2)));
    }

    #[test]
    fn duplicate_ranges_collapse() {
        let mut chunks = catalog(2);
        chunks.push(ChunkRange::new(1, 1, 5));
        assert_eq!(SelectionState::new(chunks).catalog.len(), 2);
    }
}
