//! Base tap pattern.

use crate::types::EchoParams;

/// Build the sorted tap pattern: the implicit hit at 0 plus every nonzero base.
///
/// Duplicates are kept, so two bases with the same offset produce two taps.
pub fn tap_pattern(params: &EchoParams) -> Vec<i64> {
    let mut taps = Vec::with_capacity(1 + params.bases.len());
    taps.push(0);
    taps.extend(params.bases.iter().copied().filter(|&b| b != 0));
    taps.sort_unstable();
    taps
}
