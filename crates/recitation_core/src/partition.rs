//! crates/recitation_core/src/partition.rs
//!
//! Splits text units into bounded-size chunks.
//!
//! A unit longer than the configured chunk size is cut into contiguous ranges of at
//! most `max_chunk_size` verses. When a full-size cut would leave a tail shorter than
//! [`MIN_REMAINDER`], the remaining span is halved instead so no orphan 1-2 verse
//! chunk is produced.

use serde::{Deserialize, Serialize};

use crate::domain::{ChunkRange, TextUnit, VerseSpan};

/// Smallest trailing chunk the partitioner will leave behind when it can avoid it.
pub const MIN_REMAINDER: u32 = 3;
pub const DEFAULT_CHUNK_SIZE: u32 = 20;
pub const MIN_CHUNK_SIZE: u32 = 5;
pub const MAX_CHUNK_SIZE: u32 = 50;

/// System-wide chunking preferences, persisted as two separate scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSettings {
    pub chunk_size: u32,
    pub chunking_enabled: bool,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunking_enabled: true,
        }
    }
}

impl ChunkSettings {
    /// Returns a copy with `chunk_size` clamped into the supported range.
    pub fn with_chunk_size(self, chunk_size: u32) -> Self {
        Self {
            chunk_size: chunk_size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE),
            ..self
        }
    }
}

/// Partitions `[1, verse_count]` into ordered, contiguous, non-overlapping spans.
pub fn partition(verse_count: u32, max_chunk_size: u32, min_remainder: u32) -> Vec<VerseSpan> {
    if verse_count == 0 {
        return Vec::new();
    }
    let max = max_chunk_size.max(1);
    if verse_count <= max {
        return vec![VerseSpan::new(1, verse_count)];
    }

    let mut spans = Vec::with_capacity((verse_count / max + 2) as usize);
    let mut start = 1;
    while start <= verse_count {
        let remaining = verse_count - start + 1;
        if remaining <= max {
            spans.push(VerseSpan::new(start, verse_count));
            break;
        }

        let half = remaining.div_ceil(2);
        let size = if remaining - max < min_remainder && half <= max {
            half
        } else {
            max
        };
        spans.push(VerseSpan::new(start, start + size - 1));
        start += size;
    }
    spans
}

/// Chunks for one unit under the given settings. With chunking disabled the
/// whole unit is a single chunk regardless of size.
pub fn chunk_unit(unit: &TextUnit, settings: &ChunkSettings) -> Vec<ChunkRange> {
    if !settings.chunking_enabled {
        return vec![ChunkRange::whole(unit)];
    }
    partition(unit.verse_count, settings.chunk_size, MIN_REMAINDER)
        .into_iter()
        .map(|span| ChunkRange::new(unit.unit_number, span.start, span.end))
        .collect()
}

/// Chunks for every unit, in unit order.
pub fn build_catalog(units: &[TextUnit], settings: &ChunkSettings) -> Vec<ChunkRange> {
    units
        .iter()
        .flat_map(|unit| chunk_unit(unit, settings))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unit(unit_number: u32, verse_count: u32) -> TextUnit {
        TextUnit {
            unit_number,
            verse_count,
            name: format!("Unit {unit_number}"),
            groups: vec![1],
        }
    }

    #[test]
    fn short_unit_is_a_single_chunk() {
        assert_eq!(partition(7, 20, MIN_REMAINDER), vec![VerseSpan::new(1, 7)]);
        assert_eq!(partition(20, 20, MIN_REMAINDER), vec![VerseSpan::new(1, 20)]);
    }

    #[test]
    fn even_split_uses_full_chunks() {
        let spans = partition(60, 20, MIN_REMAINDER);
        assert_eq!(
            spans,
            vec![
                VerseSpan::new(1, 20),
                VerseSpan::new(21, 40),
                VerseSpan::new(41, 60)
            ]
        );
    }

    #[test]
    fn tiny_tail_is_folded_into_two_halves() {
        // 42 = 20 + 22, and 22 would leave a 2 verse tail.
        let spans = partition(42, 20, MIN_REMAINDER);
        assert_eq!(
            spans,
            vec![
                VerseSpan::new(1, 20),
                VerseSpan::new(21, 31),
                VerseSpan::new(32, 42)
            ]
        );
    }

    #[test]
    fn large_enough_tail_is_kept() {
        let spans = partition(286, 20, MIN_REMAINDER);
        assert_eq!(spans.len(), 15);
        assert_eq!(spans.last(), Some(&VerseSpan::new(281, 286)));
    }

    #[test]
    fn odd_remaining_span_rounds_first_half_up() {
        // 23 remaining with max 20 leaves a 3 verse tail, which is allowed.
        assert_eq!(
            partition(23, 20, MIN_REMAINDER),
            vec![VerseSpan::new(1, 20), VerseSpan::new(21, 23)]
        );
        // 21 remaining leaves 1, so it is halved into 11 + 10.
        assert_eq!(
            partition(21, 20, MIN_REMAINDER),
            vec![VerseSpan::new(1, 11), VerseSpan::new(12, 21)]
        );
    }

    #[test]
    fn disabled_chunking_keeps_whole_units() {
        let settings = ChunkSettings {
            chunk_size: 5,
            chunking_enabled: false,
        };
        assert_eq!(
            chunk_unit(&unit(2, 286), &settings),
            vec![ChunkRange::new(2, 1, 286)]
        );
    }

    #[test]
    fn catalog_follows_unit_order() {
        let settings = ChunkSettings::default();
        let catalog = build_catalog(&[unit(78, 40), unit(114, 6)], &settings);
        assert_eq!(
            catalog,
            vec![
                ChunkRange::new(78, 1, 20),
                ChunkRange::new(78, 21, 40),
                ChunkRange::new(114, 1, 6)
            ]
        );
    }

    #[test]
    fn chunk_size_is_clamped() {
        let settings = ChunkSettings::default();
        assert_eq!(settings.with_chunk_size(1).chunk_size, MIN_CHUNK_SIZE);
        assert_eq!(settings.with_chunk_size(500).chunk_size, MAX_CHUNK_SIZE);
        assert_eq!(settings.with_chunk_size(35).chunk_size, 35);
    }

    proptest! {
        #[test]
        fn spans_cover_the_unit_exactly(verse_count in 1u32..400, max in 1u32..60, min_remainder in 0u32..6) {
            let spans = partition(verse_count, max, min_remainder);
            prop_assert!(!spans.is_empty());
            prop_assert_eq!(spans[0].start, 1);
            prop_assert_eq!(spans.last().unwrap().end, verse_count);
            for pair in spans.windows(2) {
                prop_assert_eq!(pair[0].end + 1, pair[1].start);
            }
            for span in &spans {
                prop_assert!(!span.is_empty());
                prop_assert!(span.len() <= max.max(1));
            }
        }

        #[test]
        fn no_orphan_chunks_for_supported_sizes(verse_count in 1u32..400, max in MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE) {
            let spans = partition(verse_count, max, MIN_REMAINDER);
            if spans.len() > 1 {
                for span in &spans {
                    prop_assert!(span.len() >= MIN_REMAINDER, "{:?} in {:?}", span, spans);
                }
            }
        }
    }
}
