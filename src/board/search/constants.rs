//! Search constants and score helpers.

/// Larger than any reachable score
pub const INF: i32 = 1_048_576;

/// Score of delivering mate at the root
pub const MATE: i32 = 1_048_575;

/// Deepest ply the search stack supports
pub const MAX_SEARCH_PLY: usize = 256;

/// Scores at or beyond this magnitude are mate scores
pub const MATE_BOUND: i32 = MATE - MAX_SEARCH_PLY as i32;

/// Initial aspiration half-width
pub const DELTA: i32 = 20;

/// Nodes between stop-flag and clock polls
pub const CHECK_INTERVAL: u64 = 2048;

// ============================================================================
// MOVE ORDERING PRIORITIES
// ============================================================================

/// Transposition table move
pub const TT_MOVE_SCORE: i32 = 10_000_000;

/// Added to captures that do not lose material
pub const GOOD_CAPTURE_BONUS: i32 = 1_000_000;

/// Quiet move that cut off at the same ply
pub const KILLER_SCORE: i32 = 800_000;

#[inline]
#[must_use]
pub const fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_BOUND
}

/// Signed distance to mate in full moves, if `score` is a mate score
#[must_use]
pub fn mate_in(score: i32) -> Option<i32> {
    if !is_mate_score(score) {
        return None;
    }
    let moves = (MATE - score.abs() + 1) / 2;
    Some(if score > 0 { moves } else { -moves })
}

/// Make a mate score relative to the node before storing it
#[inline]
#[must_use]
pub(crate) fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_BOUND {
        score + ply as i32
    } else if score <= -MATE_BOUND {
        score - ply as i32
    } else {
        score
    }
}

/// Inverse of [`score_to_tt`]
#[inline]
#[must_use]
pub(crate) fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_BOUND {
        score - ply as i32
    } else if score <= -MATE_BOUND {
        score + ply as i32
    } else {
        score
    }
}
