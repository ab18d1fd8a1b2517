//! crates/recitation_core/src/random.rs
//!
//! Random sources and the shuffle primitive built on top of them.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::ports::RandomSource;

/// Shuffles `items` in place with the generator behind `random`.
pub fn shuffle<T>(items: &mut [T], random: &mut dyn RandomSource) {
    items.shuffle(random.rng());
}

/// Entropy-seeded generator for production use.
pub struct ThreadRandom {
    rng: StdRng,
}

impl ThreadRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn rng(&mut self) -> &mut dyn RngCore {
        &mut self.rng
    }
}

/// Deterministic generator: the same seed always yields the same shuffles.
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn rng(&mut self) -> &mut dyn RngCore {
        &mut self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shuffle_is_a_permutation() {
        let mut random = SeededRandom::new(7);
        let mut items: Vec<u32> = (0..50).collect();
        shuffle(&mut items, &mut random);

        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_order() {
        let mut a: Vec<u32> = (0..20).collect();
        let mut b = a.clone();
        shuffle(&mut a, &mut SeededRandom::new(42));
        shuffle(&mut b, &mut SeededRandom::new(42));
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_give_different_orders() {
        let mut a: Vec<u32> = (0..20).collect();
        let mut b = a.clone();
        shuffle(&mut a, &mut SeededRandom::new(1));
        shuffle(&mut b, &mut SeededRandom::new(2));
        assert_ne!(a, b);
    }

    #[test]
    fn empty_and_single_slices_are_untouched() {
        let mut random = ThreadRandom::new();
        let mut empty: Vec<u32> = Vec::new();
        shuffle(&mut empty, &mut random);
        assert!(empty.is_empty());

        let mut single = vec![9];
        shuffle(&mut single, &mut random);
        assert_eq!(single, vec![9]);
    }
}
