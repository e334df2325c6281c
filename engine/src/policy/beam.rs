// engine/src/policy/beam.rs
#![forbid(unsafe_code)]

/**
 * Beam pruning configuration for the lookahead search.
 *
 * Depth meaning:
 * - 0 = choosing the action applied to the current state
 * - 1 = choosing the action one decision later
 * - 2+ = deeper recursion
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeamConfig {
    /// Start pruning from this depth onward.
    pub beam_from_depth: u8,
    /// Keep top-N candidates (by immediate reward) at pruned depths.
    pub beam_width: usize,
}

impl BeamConfig {
    pub fn new(beam_from_depth: u8, beam_width: usize) -> Self {
        Self {
            beam_from_depth,
            beam_width: beam_width.max(1),
        }
    }
}

/**
 * Deterministic top-N selection for (key, score) without sorting the entire list.
 * - O(n) partition + O(k log k) sort of the kept prefix.
 */
pub(crate) fn prune_top_n_scores(mut xs: Vec<(usize, f64)>, n: usize) -> Vec<(usize, f64)> {
    if xs.is_empty() || n == 0 {
        xs.clear();
        return xs;
    }
    if n >= xs.len() {
        // No effective pruning => don't pay sorting cost.
        return xs;
    }

    let nth = n - 1;
    xs.select_nth_unstable_by(nth, |a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    xs.truncate(n);

    // Deterministic iteration order among kept elements.
    xs.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    xs
}
