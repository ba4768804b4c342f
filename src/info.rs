//! Progress snapshots published by a search driver's `info_cb` (§6):
//! depth, node count, timing, and the current principal variation.

use crate::types::{Color, Move};

/// One progress sample handed to a search's `info_cb`. `score_cp` and
/// `mate_score` are mutually exclusive: a mate-distance score is reported
/// via `mate_score` (plies to mate, signed for who is winning) instead of
/// `score_cp` once the search sees a forced mate.
#[derive(Clone, Debug, Default)]
pub struct SearchInfo {
    pub depth: u32,
    pub nodes: u64,
    pub elapsed_ms: u64,
    pub nps: u64,
    pub side_to_move: Option<Color>,
    pub score_cp: Option<i32>,
    pub mate_score: Option<i32>,
    pub pv: Vec<Move>,
}

impl SearchInfo {
    #[must_use]
    pub fn nps_from(nodes: u64, elapsed_ms: u64) -> u64 {
        if elapsed_ms == 0 {
            0
        } else {
            (nodes * 1000) / elapsed_ms
        }
    }
}
