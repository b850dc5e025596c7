use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn next_random_u32(state: &mut u32) -> u32 {
    let mut next = state.wrapping_add(0x6d2b79f5);
    *state = next;
    next = (next ^ (next >> 15)).wrapping_mul(next | 1);
    next ^= next.wrapping_add((next ^ (next >> 7)).wrapping_mul(next | 61));
    next ^ (next >> 14)
}

/// Uniform index in `0..len` without modulo bias. `len` must be non-zero.
pub(crate) fn pick_index(state: &mut u32, len: usize) -> usize {
    let bound = u32::try_from(len).unwrap_or(u32::MAX);
    let threshold = (u64::from(u32::MAX) + 1) / u64::from(bound) * u64::from(bound);
    let mut candidate = next_random_u32(state);
    while u64::from(candidate) >= threshold {
        candidate = next_random_u32(state);
    }
    (candidate % bound) as usize
}

pub(crate) fn clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.subsec_nanos() ^ (elapsed.as_secs() as u32))
        .unwrap_or(1)
}

#[cfg(test)]
mod rng_tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut first = 7u32;
        let mut second = 7u32;
        let a = (0..5).map(|_| pick_index(&mut first, 3)).collect::<Vec<_>>();
        let b = (0..5).map(|_| pick_index(&mut second, 3)).collect::<Vec<_>>();
        assert_eq!(a, b);
        assert_eq!(first, second);
    }

    #[test]
    fn pick_index_stays_in_range() {
        let mut state = 1u32;
        for _ in 0..200 {
            assert!(pick_index(&mut state, 4) < 4);
        }
        assert_eq!(pick_index(&mut state, 1), 0);
    }
}
