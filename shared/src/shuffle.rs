//! Seeded Fisher-Yates permutation of turn tokens.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Returns a permutation of `0..n`, reproducible for the same `seed`.
pub fn shuffle(n: usize, seed: u64) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    shuffle_with(n, &mut rng)
}

/// Fisher-Yates over `0..n` drawing from `rng`: for each `i` from `n - 1`
/// down to 1, swap position `i` with a uniform pick from `0..=i`.
pub fn shuffle_with<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<u32> {
    let mut tokens: Vec<u32> = (0..n as u32).collect();
    for i in (1..n).rev() {
        let j = rng.gen_range(0..=i);
        tokens.swap(i, j);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_shuffle() {
        assert!(shuffle(0, 7).is_empty());
    }

    #[test]
    fn test_single_element() {
        assert_eq!(shuffle(1, 7), vec![0]);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        for n in [2usize, 5, 15, 64, 257] {
            for seed in 0..8u64 {
                let mut tokens = shuffle(n, seed);
                assert_eq!(tokens.len(), n);
                tokens.sort_unstable();
                let expected: Vec<u32> = (0..n as u32).collect();
                assert_eq!(tokens, expected, "n={} seed={}", n, seed);
            }
        }
    }

    #[test]
    fn test_shuffle_is_reproducible() {
        assert_eq!(shuffle(40, 12), shuffle(40, 12));
        assert_eq!(shuffle(3, 999), shuffle(3, 999));
    }

    #[test]
    fn test_different_seeds_differ() {
        // 40! orderings; two seeds colliding would point at a broken swap loop.
        assert_ne!(shuffle(40, 1), shuffle(40, 2));
    }

    #[test]
    fn test_shuffle_with_continues_the_stream() {
        let mut rng = StdRng::seed_from_u64(5);
        let first = shuffle_with(20, &mut rng);
        let second = shuffle_with(20, &mut rng);
        assert_eq!(first, shuffle(20, 5));
        assert_ne!(first, second);
    }
}
