//! Exact-sum quantization of recorded timings.
//!
//! Free-form rhythm gestures arrive as raw millisecond spans. Scaling them
//! to the fixed-point grid rounds each span independently, so the rounded
//! sum can drift a few units from the full cycle. The round-robin pass here
//! spreads the correction one unit per step, deterministically, until the
//! `(duration + 1)` sum is exactly [`LEN_MAX`].

use crate::step::LEN_MAX;

/// Quantize raw millisecond durations into stored step durations whose
/// `(d + 1)` values sum to exactly [`LEN_MAX`].
///
/// Returns `None` for an empty recording or a zero total span; callers
/// treat that as a cancelled session and keep their previous table.
pub fn normalize(raw_ms: &[u32]) -> Option<Vec<u16>> {
    if raw_ms.is_empty() {
        return None;
    }
    let span: u64 = raw_ms.iter().map(|&r| r as u64).sum();
    if span == 0 {
        return None;
    }

    let mut durations: Vec<u16> = raw_ms
        .iter()
        .map(|&r| {
            let quota = (r as u64 * LEN_MAX as u64 + span / 2) / span;
            // Stored value is the share minus one, kept on the grid.
            quota.clamp(1, LEN_MAX as u64) as u16 - 1
        })
        .collect();

    let mut sum: u32 = durations.iter().map(|&d| d as u32 + 1).sum();
    let mut idx = 0usize;
    while sum != LEN_MAX {
        let d = &mut durations[idx];
        if sum < LEN_MAX && (*d as u32) < LEN_MAX - 1 {
            *d += 1;
            sum += 1;
        } else if sum > LEN_MAX && *d > 0 {
            *d -= 1;
            sum -= 1;
        }
        idx = (idx + 1) % durations.len();
    }

    Some(durations)
}

/// Stored durations for `total` equal steps, remainder spread one unit at a
/// time from index 0. Sum of `(d + 1)` is exactly [`LEN_MAX`].
pub fn equal_durations(total: usize) -> Vec<u16> {
    if total == 0 {
        return Vec::new();
    }
    let base = LEN_MAX / total as u32;
    let remainder = (LEN_MAX % total as u32) as usize;
    (0..total)
        .map(|i| {
            let share = if i < remainder { base + 1 } else { base };
            (share - 1) as u16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum_plus_one(durations: &[u16]) -> u32 {
        durations.iter().map(|&d| d as u32 + 1).sum()
    }

    #[test]
    fn equal_raw_durations_need_no_adjustment() {
        // Four equal 1000 ms presses: each quota rounds to 2048 exactly.
        let durations = normalize(&[1000, 1000, 1000, 1000]).unwrap();
        assert_eq!(durations, vec![2047, 2047, 2047, 2047]);
        assert_eq!(sum_plus_one(&durations), LEN_MAX);
    }

    #[test]
    fn short_sum_increments_round_robin_from_zero() {
        // Seven equal presses: quotas round to 1170 each, sum 8190, two
        // short of the cycle. The scan bumps indices 0 and 1 by one unit.
        let durations = normalize(&[1; 7]).unwrap();
        assert_eq!(durations, vec![1170, 1170, 1169, 1169, 1169, 1169, 1169]);
        assert_eq!(sum_plus_one(&durations), LEN_MAX);
    }

    #[test]
    fn adjustment_terminates_and_hits_exact_sum() {
        // Awkward proportions that cannot round cleanly.
        for raw in [
            vec![1, 1, 1],
            vec![7, 13, 29, 3],
            vec![1000, 1, 1, 1, 1, 1, 1, 1],
            vec![333, 333, 333],
        ] {
            let durations = normalize(&raw).unwrap();
            assert_eq!(durations.len(), raw.len());
            assert_eq!(sum_plus_one(&durations), LEN_MAX, "raw {:?}", raw);
        }
    }

    #[test]
    fn excess_adjustment_decrements_round_robin_from_zero() {
        // Three equal steps: quotas 2731 each, sum 8193, one in excess.
        // The scan starts at index 0, so index 0 takes the decrement.
        let durations = normalize(&[500, 500, 500]).unwrap();
        assert_eq!(durations, vec![2729, 2730, 2730]);
    }

    #[test]
    fn zero_span_is_rejected() {
        assert_eq!(normalize(&[0, 0, 0]), None);
        assert_eq!(normalize(&[]), None);
    }

    #[test]
    fn single_step_takes_whole_cycle() {
        let durations = normalize(&[123]).unwrap();
        assert_eq!(durations, vec![(LEN_MAX - 1) as u16]);
    }

    #[test]
    fn equal_durations_sum_exactly() {
        for total in 1..=32 {
            let durations = equal_durations(total);
            assert_eq!(durations.len(), total);
            assert_eq!(sum_plus_one(&durations), LEN_MAX, "total {}", total);
        }
        assert!(equal_durations(0).is_empty());
    }

    #[test]
    fn equal_durations_spread_remainder_from_front() {
        // 8192 / 3 = 2730 r 2: first two steps get the extra unit.
        assert_eq!(equal_durations(3), vec![2730, 2730, 2729]);
    }
}
