//! Tapered static evaluation (§4.5): a set of weighted feature counts,
//! computed once from White's point of view and interpolated between
//! middlegame and endgame weights by a phase derived from remaining
//! non-pawn material.
//!
//! Every feature below nets to a single signed count (White positive,
//! Black negative) before the mg/eg weights are applied, so the whole
//! function is a sum of `count * weight` terms plus the material term,
//! which is already computed incrementally on `Board`. Nothing here
//! allocates: every intermediate is a `Bitboard` or a scalar.

use crate::attacks;
use crate::board::Board;
use crate::pawn_hash::PawnHashTable;
use crate::types::{Bitboard, Color, Piece, Square};
use crate::zobrist;

use std::sync::atomic::{AtomicI32, Ordering};

const CENTER_SQUARES: [Square; 4] =
    [Square::new(3, 3), Square::new(3, 4), Square::new(4, 3), Square::new(4, 4)];

fn phase_weight(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn | Piece::King => 0,
        Piece::Knight | Piece::Bishop => 1,
        Piece::Rook => 2,
        Piece::Queen => 4,
    }
}

const PHASE_TOTAL: i32 = 24;

/// One tunable feature weight, independently set for middlegame and
/// endgame. `set_option` addresses these by `"<name>_mg"` / `"<name>_eg"`.
struct Weight {
    name: &'static str,
    mg: AtomicI32,
    eg: AtomicI32,
}

impl Weight {
    const fn new(name: &'static str, mg: i32, eg: i32) -> Self {
        Weight { name, mg: AtomicI32::new(mg), eg: AtomicI32::new(eg) }
    }

    #[inline]
    fn mg(&self) -> i32 {
        self.mg.load(Ordering::Relaxed)
    }

    #[inline]
    fn eg(&self) -> i32 {
        self.eg.load(Ordering::Relaxed)
    }
}

/// Default weights per the feature table; Material has no entry here since
/// it comes straight from `Board`'s running material sums rather than a
/// count-times-weight product.
struct Weights {
    center_control: Weight,
    king_safety: Weight,
    development: Weight,
    edge_knights: Weight,
    passed_pawns: Weight,
    passer_rank_bonus: Weight,
    king_first_rank: Weight,
    pawns_protecting_king: Weight,
    isolated_pawns: Weight,
    backward_pawns: Weight,
    doubled_pawns: Weight,
    pawn_chains: Weight,
    open_file_rook: Weight,
    open_file_queen: Weight,
}

impl Weights {
    fn defaults() -> Self {
        Weights {
            center_control: Weight::new("center_control", 20, 8),
            king_safety: Weight::new("king_safety", 7, 6),
            development: Weight::new("development", 35, 20),
            edge_knights: Weight::new("edge_knights", -10, -5),
            passed_pawns: Weight::new("passed_pawns", 15, 30),
            passer_rank_bonus: Weight::new("passer_rank_bonus", 8, 8),
            king_first_rank: Weight::new("king_first_rank", 10, -10),
            pawns_protecting_king: Weight::new("pawns_protecting_king", 8, 8),
            isolated_pawns: Weight::new("isolated_pawns", -10, -10),
            backward_pawns: Weight::new("backward_pawns", -10, -10),
            doubled_pawns: Weight::new("doubled_pawns", -10, -20),
            pawn_chains: Weight::new("pawn_chains", 4, 4),
            open_file_rook: Weight::new("open_file_rook", 5, 5),
            open_file_queen: Weight::new("open_file_queen", 5, 5),
        }
    }

    fn all(&self) -> [&Weight; 14] {
        [
            &self.center_control,
            &self.king_safety,
            &self.development,
            &self.edge_knights,
            &self.passed_pawns,
            &self.passer_rank_bonus,
            &self.king_first_rank,
            &self.pawns_protecting_king,
            &self.isolated_pawns,
            &self.backward_pawns,
            &self.doubled_pawns,
            &self.pawn_chains,
            &self.open_file_rook,
            &self.open_file_queen,
        ]
    }
}

/// Per-kind weight used by `guard_value`: how much a single attacker of
/// that kind contributes to a square's control tally.
fn attacker_weight(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => 9,
        Piece::Knight => 6,
        Piece::Bishop => 5,
        Piece::Rook => 2,
        Piece::Queen => 1,
        Piece::King => 1,
    }
}

fn attackers_of_kind(board: &Board, sq: Square, color: Color, piece: Piece) -> Bitboard {
    let candidates = board.pieces_of(color, piece);
    match piece {
        Piece::Pawn => attacks::pawn_attacks(color.opponent(), sq) & candidates,
        Piece::Knight => attacks::knight_attacks(sq) & candidates,
        Piece::King => attacks::king_attacks(sq) & candidates,
        Piece::Bishop => attacks::bishop_attacks(sq, board.global_occupancy()) & candidates,
        Piece::Rook => attacks::rook_attacks(sq, board.global_occupancy()) & candidates,
        Piece::Queen => attacks::queen_attacks(sq, board.global_occupancy()) & candidates,
    }
}

/// Sum over attackers of `sq` of a per-kind weight, signed by colour
/// (White positive, Black negative).
fn guard_value(board: &Board, sq: Square) -> i32 {
    let mut total = 0i32;
    for &color in &[Color::White, Color::Black] {
        let sign = color.sign();
        for &piece in &Piece::ALL {
            let count = attackers_of_kind(board, sq, color, piece).popcount() as i32;
            total += sign * attacker_weight(piece) * count;
        }
    }
    total
}

fn center_control_count(board: &Board) -> i32 {
    CENTER_SQUARES.iter().map(|&sq| guard_value(board, sq)).sum()
}

fn king_safety_count(board: &Board) -> i32 {
    let mut total = 0i32;
    for &color in &[Color::White, Color::Black] {
        let king_sq = board.king_square(color);
        let net: i32 = attacks::king_attacks(king_sq).iter().map(|sq| guard_value(board, sq)).sum();
        total += match color {
            // White is under-defended when net favours Black (negative).
            Color::White => net.min(0),
            // Black is under-defended when net favours White (positive).
            Color::Black => net.max(0),
        };
    }
    total
}

fn development_count(board: &Board) -> i32 {
    let minors = board.piece_occupancy(Piece::Knight) | board.piece_occupancy(Piece::Bishop);
    let white_ranks = Bitboard::rank_mask(2) | Bitboard::rank_mask(3) | Bitboard::rank_mask(4);
    let black_ranks = Bitboard::rank_mask(3) | Bitboard::rank_mask(4) | Bitboard::rank_mask(5);
    let white = (minors & board.color_occupancy(Color::White) & white_ranks).popcount() as i32;
    let black = (minors & board.color_occupancy(Color::Black) & black_ranks).popcount() as i32;
    white - black
}

fn edge_knights_count(board: &Board) -> i32 {
    let edges = Bitboard::file_mask(0) | Bitboard::file_mask(7);
    let knights = board.piece_occupancy(Piece::Knight) & edges;
    let white = (knights & board.color_occupancy(Color::White)).popcount() as i32;
    let black = (knights & board.color_occupancy(Color::Black)).popcount() as i32;
    white - black
}

fn passed_pawns_count(board: &Board) -> i32 {
    board.passers(Color::White).popcount() as i32 - board.passers(Color::Black).popcount() as i32
}

fn passer_rank_bonus_count(board: &Board) -> i32 {
    let white: i32 = board.passers(Color::White).iter().map(|sq| sq.rank() as i32).sum();
    let black: i32 = board.passers(Color::Black).iter().map(|sq| 7 - sq.rank() as i32).sum();
    white - black
}

fn king_first_rank_count(board: &Board) -> i32 {
    let white = i32::from(board.king_square(Color::White).rank() == 0);
    let black = i32::from(board.king_square(Color::Black).rank() == 7);
    white - black
}

fn pawns_protecting_king_count(board: &Board) -> i32 {
    let mut total = 0i32;
    let white_king = board.king_square(Color::White);
    if white_king.rank() == 0 {
        let shield = attacks::king_attacks(white_king) & Bitboard::rank_mask(1);
        total += (shield & board.pieces_of(Color::White, Piece::Pawn)).popcount() as i32;
    }
    let black_king = board.king_square(Color::Black);
    if black_king.rank() == 7 {
        let shield = attacks::king_attacks(black_king) & Bitboard::rank_mask(6);
        total -= (shield & board.pieces_of(Color::Black, Piece::Pawn)).popcount() as i32;
    }
    total
}

fn doubled_pawns_count(board: &Board) -> i32 {
    let mut total = 0i32;
    for &color in &[Color::White, Color::Black] {
        let pawns = board.pieces_of(color, Piece::Pawn);
        let mut doubled = 0i32;
        for file in 0..8 {
            let n = (pawns & Bitboard::file_mask(file)).popcount() as i32;
            doubled += (n - 1).max(0);
        }
        total += color.sign() * doubled;
    }
    total
}

fn pawn_chains_count(board: &Board) -> i32 {
    let mut total = 0i32;
    for &color in &[Color::White, Color::Black] {
        let pawns = board.pieces_of(color, Piece::Pawn);
        let mut defended_squares = Bitboard::EMPTY;
        for sq in pawns.iter() {
            defended_squares |= attacks::pawn_attacks(color, sq);
        }
        total += color.sign() * (defended_squares & pawns).popcount() as i32;
    }
    total
}

fn open_file_count(board: &Board, piece: Piece) -> i32 {
    let all_pawns = board.piece_occupancy(Piece::Pawn);
    let mut total = 0i32;
    for &color in &[Color::White, Color::Black] {
        for sq in board.pieces_of(color, piece).iter() {
            if (Bitboard::file_mask(sq.file()) & all_pawns).is_empty() {
                total += color.sign();
            }
        }
    }
    total
}

/// Pawn-only Zobrist key, used to key the pawn-structure sub-score cache.
/// Cheap to compute (at most 16 XORs) relative to the structural features
/// it lets us skip recomputing on a cache hit.
fn pawn_key(board: &Board) -> u64 {
    let mut key = 0u64;
    for &color in &[Color::White, Color::Black] {
        for sq in board.pieces_of(color, Piece::Pawn).iter() {
            key ^= zobrist::piece_key(color, Piece::Pawn, sq);
        }
    }
    key
}

pub struct Eval {
    weights: Weights,
    pawn_hash: PawnHashTable,
}

impl Eval {
    #[must_use]
    pub fn new() -> Self {
        Eval { weights: Weights::defaults(), pawn_hash: PawnHashTable::default() }
    }

    /// Updates one named feature weight. `name` is one of the feature
    /// names from §4.5's table, suffixed `_mg` or `_eg` (e.g.
    /// `"passed_pawns_eg"`). Returns `false` for an unrecognised name.
    pub fn set_option(&self, name: &str, value: i32) -> bool {
        for weight in self.weights.all() {
            if let Some(suffix) = name.strip_prefix(weight.name) {
                match suffix {
                    "_mg" => {
                        weight.mg.store(value, Ordering::Relaxed);
                        return true;
                    }
                    "_eg" => {
                        weight.eg.store(value, Ordering::Relaxed);
                        return true;
                    }
                    _ => {}
                }
            }
        }
        false
    }

    fn pawn_structure_score(&self, board: &Board) -> (i32, i32) {
        let key = pawn_key(board);
        if let Some(entry) = self.pawn_hash.probe(key) {
            return (entry.mg, entry.eg);
        }
        let w = &self.weights;
        let passed = passed_pawns_count(board);
        let passer_rank = passer_rank_bonus_count(board);
        let isolated =
            board.isolated(Color::White).popcount() as i32 - board.isolated(Color::Black).popcount() as i32;
        let backward =
            board.backward(Color::White).popcount() as i32 - board.backward(Color::Black).popcount() as i32;
        let doubled = doubled_pawns_count(board);
        let chains = pawn_chains_count(board);

        let mg = passed * w.passed_pawns.mg()
            + passer_rank * w.passer_rank_bonus.mg()
            + isolated * w.isolated_pawns.mg()
            + backward * w.backward_pawns.mg()
            + doubled * w.doubled_pawns.mg()
            + chains * w.pawn_chains.mg();
        let eg = passed * w.passed_pawns.eg()
            + passer_rank * w.passer_rank_bonus.eg()
            + isolated * w.isolated_pawns.eg()
            + backward * w.backward_pawns.eg()
            + doubled * w.doubled_pawns.eg()
            + chains * w.pawn_chains.eg();

        self.pawn_hash.store(key, mg, eg);
        (mg, eg)
    }

    /// Centipawn score from the perspective of `side_to_move`: computed
    /// from White's viewpoint, then negated for Black. Allocation-free.
    #[must_use]
    pub fn evaluate(&self, board: &Board, side_to_move: Color) -> i32 {
        let w = &self.weights;

        let mut mg = board.material_mg();
        let mut eg = board.material_eg();

        let center = center_control_count(board);
        mg += center * w.center_control.mg();
        eg += center * w.center_control.eg();

        let king_safety = king_safety_count(board);
        mg += king_safety * w.king_safety.mg();
        eg += king_safety * w.king_safety.eg();

        let development = development_count(board);
        mg += development * w.development.mg();
        eg += development * w.development.eg();

        let edge_knights = edge_knights_count(board);
        mg += edge_knights * w.edge_knights.mg();
        eg += edge_knights * w.edge_knights.eg();

        let king_first_rank = king_first_rank_count(board);
        mg += king_first_rank * w.king_first_rank.mg();
        eg += king_first_rank * w.king_first_rank.eg();

        let pawn_shield = pawns_protecting_king_count(board);
        mg += pawn_shield * w.pawns_protecting_king.mg();
        eg += pawn_shield * w.pawns_protecting_king.eg();

        let open_rook = open_file_count(board, Piece::Rook);
        mg += open_rook * w.open_file_rook.mg();
        eg += open_rook * w.open_file_rook.eg();

        let open_queen = open_file_count(board, Piece::Queen);
        mg += open_queen * w.open_file_queen.mg();
        eg += open_queen * w.open_file_queen.eg();

        let (pawn_mg, pawn_eg) = self.pawn_structure_score(board);
        mg += pawn_mg;
        eg += pawn_eg;

        let material_count: i32 =
            Piece::ALL.iter().map(|&p| board.piece_occupancy(p).popcount() as i32 * phase_weight(p)).sum();
        let phase = ((PHASE_TOTAL - material_count).clamp(0, PHASE_TOTAL) * 256) / PHASE_TOTAL;

        let score = (mg * (256 - phase) + eg * phase) / 256;
        score * side_to_move.sign()
    }
}

impl Default for Eval {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        crate::zobrist::init();
        crate::attacks::init();
    }

    #[test]
    fn starting_position_is_symmetric() {
        init();
        let board = Board::starting_position();
        let eval = Eval::new();
        let white_view = eval.evaluate(&board, Color::White);
        let black_view = eval.evaluate(&board, Color::Black);
        assert_eq!(white_view, -black_view);
    }

    #[test]
    fn extra_queen_scores_strongly_positive() {
        init();
        let mut board = Board::empty();
        board.place(Square::new(0, 4), Color::White, Piece::King);
        board.place(Square::new(7, 4), Color::Black, Piece::King);
        board.place(Square::new(3, 3), Color::White, Piece::Queen);
        let eval = Eval::new();
        assert!(eval.evaluate(&board, Color::White) > 500);
    }

    #[test]
    fn set_option_updates_named_weight() {
        init();
        let eval = Eval::new();
        assert!(eval.set_option("passed_pawns_mg", 999));
        assert_eq!(eval.weights.passed_pawns.mg(), 999);
        assert!(!eval.set_option("not_a_real_feature_mg", 1));
    }

    #[test]
    fn isolated_pawn_is_a_penalty() {
        init();
        let mut board = Board::empty();
        board.place(Square::new(0, 4), Color::White, Piece::King);
        board.place(Square::new(7, 4), Color::Black, Piece::King);
        board.place(Square::new(1, 0), Color::White, Piece::Pawn);
        let eval = Eval::new();
        assert!(eval.evaluate(&board, Color::White) < 100);
    }
}
