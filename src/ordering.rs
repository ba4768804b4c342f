//! Move ordering for α-β search (§4.4's `order_moves`): each move gets a
//! score of `PV_bonus[is PV move] + history[ctm][src][dst] + SEE(move)`
//! (SEE only for captures/en-passant), and `MoveList::pick_best` does an
//! incremental selection sort driven by these scores so a beta cutoff
//! found early skips scoring the rest of the list's relative order.

use crate::board::Board;
use crate::see;
use crate::types::{Color, Move, MoveList, Square, MAX_MOVES};

const PV_BONUS: i32 = 1_000_000;

/// Butterfly history table: one score per (side to move, source, dest),
/// incremented when a quiet move causes a beta cutoff - the standard
/// history heuristic bookkeeping used to order quiet moves in later
/// searches of the same position.
pub struct OrderingContext {
    history: Vec<i32>,
}

impl OrderingContext {
    #[must_use]
    pub fn new() -> Self {
        OrderingContext { history: vec![0i32; 2 * 64 * 64] }
    }

    #[inline]
    fn index(color: Color, from: Square, to: Square) -> usize {
        (color.index() * 64 + from.as_index()) * 64 + to.as_index()
    }

    pub fn record_history(&mut self, color: Color, from: Square, to: Square, delta: i32) {
        let idx = Self::index(color, from, to);
        self.history[idx] = self.history[idx].saturating_add(delta);
    }

    #[inline]
    fn history_score(&self, color: Color, from: Square, to: Square) -> i32 {
        self.history[Self::index(color, from, to)]
    }

    pub fn clear(&mut self) {
        self.history.iter_mut().for_each(|h| *h = 0);
    }
}

impl Default for OrderingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Fills `scores[..moves.len()]` with each move's ordering score.
pub fn score_moves(
    ctx: &OrderingContext,
    board: &Board,
    side_to_move: Color,
    moves: &MoveList,
    pv_move: Option<Move>,
    scores: &mut [i32; MAX_MOVES],
) {
    for (i, &m) in moves.iter().enumerate() {
        let mut score = ctx.history_score(side_to_move, m.from(), m.to());
        if Some(m) == pv_move {
            score += PV_BONUS;
        }
        if m.is_capture() {
            score += see::see(board, m);
        }
        scores[i] = score;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MoveFlags;

    #[test]
    fn pv_move_outscores_everything_else() {
        let ctx = OrderingContext::new();
        let mut board = Board::empty();
        board.place(Square::new(0, 4), Color::White, crate::types::Piece::King);
        board.place(Square::new(7, 4), Color::Black, crate::types::Piece::King);
        let pv = Move::new(Square::new(1, 0), Square::new(2, 0), None, MoveFlags::default());
        let other = Move::new(Square::new(1, 1), Square::new(2, 1), None, MoveFlags::default());
        let mut moves = MoveList::new();
        moves.push(other);
        moves.push(pv);
        let mut scores = [0i32; MAX_MOVES];
        score_moves(&ctx, &board, Color::White, &moves, Some(pv), &mut scores);
        assert!(scores[1] > scores[0]);
    }

    #[test]
    fn history_bumps_a_quiet_move_above_an_unrecorded_one() {
        let mut ctx = OrderingContext::new();
        let from = Square::new(1, 0);
        let to = Square::new(2, 0);
        ctx.record_history(Color::White, from, to, 500);
        assert!(ctx.history_score(Color::White, from, to) > 0);
        assert_eq!(ctx.history_score(Color::White, Square::new(1, 1), Square::new(2, 1)), 0);
    }
}
