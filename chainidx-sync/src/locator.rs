//! Block locator construction: a logarithmically-sampled list of heights
//! sent in `getblocks` so the remote peer can find the common ancestor
//! between our view of the chain and its own.

/// The descending sequence of heights to resolve into a locator: the top
/// ten heights one by one, then exponentially widening gaps (the step
/// doubles every entry past the tenth), always ending at `0`.
pub fn locator_heights(tip: u64) -> Vec<u64> {
    let mut heights = Vec::new();
    let mut index = tip as i64;
    let mut step: i64 = 1;
    while index > 0 {
        if heights.len() >= 10 {
            step *= 2;
        }
        heights.push(index as u64);
        index -= step;
    }
    heights.push(0);
    heights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_locator_is_just_zero() {
        assert_eq!(locator_heights(0), vec![0]);
    }

    #[test]
    fn short_chain_counts_down_to_zero() {
        assert_eq!(locator_heights(5), vec![5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn long_chain_widens_after_the_tenth_entry() {
        let heights = locator_heights(1_000);
        assert_eq!(
            &heights[..10],
            &[1000, 999, 998, 997, 996, 995, 994, 993, 992, 991]
        );
        // Step doubles every entry past the tenth: 1 -> 2 -> 4 -> 8 ...
        assert_eq!(heights[10], 990);
        assert_eq!(heights[11], 988);
        assert_eq!(heights[12], 984);
        assert_eq!(*heights.last().unwrap(), 0);
    }

    #[test]
    fn always_strictly_decreasing_and_starts_at_tip_ends_at_zero() {
        for tip in [0, 1, 9, 10, 11, 500, 100_000] {
            let heights = locator_heights(tip);
            assert_eq!(heights[0], tip);
            assert_eq!(*heights.last().unwrap(), 0);
            for pair in heights.windows(2) {
                assert!(pair[0] > pair[1], "not strictly decreasing: {:?}", heights);
            }
        }
    }

    #[test]
    fn length_is_logarithmic_in_tip_height() {
        // A linear locator would have ~1_000_000 entries; the exponential
        // tail keeps this in the dozens.
        let heights = locator_heights(1_000_000);
        assert!(heights.len() < 50, "locator too long: {}", heights.len());
    }
}
