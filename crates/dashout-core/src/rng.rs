use rand::RngCore;
use serde::{Deserialize, Serialize};

/// LCG multiplier.
const MULTIPLIER: u64 = 9301;
/// LCG increment.
const INCREMENT: u64 = 49297;
/// LCG modulus. Every output is `state / MODULUS`.
const MODULUS: u64 = 233_280;

/// Seeded linear-congruential generator used by every level generation path.
///
/// Same seed, same sequence. This is all the quality the generators need, so
/// there is no cryptographic strength here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed % MODULUS,
        }
    }

    /// Next float in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        self.state = (self.state * MULTIPLIER + INCREMENT) % MODULUS;
        self.state as f32 / MODULUS as f32
    }

    /// Float in `[min, max)`.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Integer in `[min, max]`, both ends inclusive.
    pub fn integer(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f32;
        // Float rounding can land exactly on the span for the last bucket.
        (min + (self.next_f32() * span).floor() as i64).min(max)
    }

    /// Uniformly pick an element, `None` on an empty slice.
    pub fn choice<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.integer(0, items.len() as i64 - 1) as usize;
        items.get(idx)
    }

    /// `true` with the given probability.
    pub fn chance(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }
}

impl RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        // Two draws give more than the ~17.8 bits a single LCG step carries.
        let hi = (self.next_f32() * 65_536.0) as u32;
        let lo = (self.next_f32() * 65_536.0) as u32;
        (hi << 16) | (lo & 0xFFFF)
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.next_u32());
        let lo = u64::from(self.next_u32());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SeededRng::new(42);
        let mut b = SeededRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_f32(), b.next_f32());
        }
    }

    #[test]
    fn first_value_matches_recurrence() {
        let mut rng = SeededRng::new(42);
        let expected = ((42 * 9301 + 49297) % 233_280) as f32 / 233_280.0;
        assert_eq!(rng.next_f32(), expected);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SeededRng::new(1);
        let mut b = SeededRng::new(2);
        let va: Vec<f32> = (0..10).map(|_| a.next_f32()).collect();
        let vb: Vec<f32> = (0..10).map(|_| b.next_f32()).collect();
        assert_ne!(va, vb);
    }

    #[test]
    fn choice_on_empty_is_none() {
        let mut rng = SeededRng::new(7);
        let empty: [u8; 0] = [];
        assert!(rng.choice(&empty).is_none());
    }

    #[test]
    fn fill_bytes_is_reproducible() {
        let mut a = SeededRng::new(99);
        let mut b = SeededRng::new(99);
        let mut ba = [0u8; 16];
        let mut bb = [0u8; 16];
        a.fill_bytes(&mut ba);
        b.fill_bytes(&mut bb);
        assert_eq!(ba, bb);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn next_stays_in_unit_interval(seed in any::<u64>()) {
                let mut rng = SeededRng::new(seed);
                for _ in 0..200 {
                    let v = rng.next_f32();
                    prop_assert!((0.0..1.0).contains(&v), "value {v} out of [0,1)");
                }
            }

            #[test]
            fn integer_is_inclusive_and_bounded(
                seed in any::<u64>(),
                min in -50i64..50,
                span in 0i64..20,
            ) {
                let mut rng = SeededRng::new(seed);
                let max = min + span;
                for _ in 0..100 {
                    let v = rng.integer(min, max);
                    prop_assert!(v >= min && v <= max);
                }
            }
        }
    }
}
