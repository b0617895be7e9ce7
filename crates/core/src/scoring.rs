//! Scoring module - classic line clear scoring
//!
//! Score deltas are part of the wire contract: clients classify single, double,
//! triple and tetris clears purely from the 40/100/300/1200 increments.

use crate::types::LINE_SCORES;

/// Points awarded for clearing `lines` rows with a single lock.
///
/// Returns 0 for no lines or for counts a single piece cannot produce.
pub fn line_clear_score(lines: usize) -> u32 {
    LINE_SCORES.get(lines).copied().unwrap_or(0)
}
