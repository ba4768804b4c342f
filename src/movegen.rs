//! Pseudo-legal move generation, split by category (quiet / capture /
//! promotion / castle / check-evasion).
//!
//! "Pseudo-legal" here is evasion-aware: when the side to move is in check,
//! only king moves, captures of the checking piece, and interpositions (for
//! a single sliding checker) are emitted; in double check only king moves
//! are. Moves that are otherwise pseudo-legal may still leave the mover's
//! king in check through a pin - `Position::make_move`'s post-move attack
//! test is what actually rejects those.

use crate::attacks;
use crate::board::Board;
use crate::types::{Bitboard, CastlingRights, Color, Move, MoveFlags, MoveList, Piece, Square, PROMOTION_PIECES};

/// Squares a king/rook must not have moved from/through for a given castle.
struct CastlePath {
    king_from: Square,
    king_to: Square,
    rook_from: Square,
    rook_to: Square,
    /// Squares that must be empty (excludes king_from, includes king_to/rook_to).
    must_be_empty: Bitboard,
    /// Squares the king passes through or lands on, none of which may be attacked.
    king_path: [Square; 3],
}

pub(crate) fn castle_rook_squares(color: Color, kingside: bool) -> (Square, Square) {
    match (color, kingside) {
        (Color::White, true) => (Square::new(0, 7), Square::new(0, 5)),
        (Color::White, false) => (Square::new(0, 0), Square::new(0, 3)),
        (Color::Black, true) => (Square::new(7, 7), Square::new(7, 5)),
        (Color::Black, false) => (Square::new(7, 0), Square::new(7, 3)),
    }
}

fn castle_path(color: Color, kingside: bool) -> CastlePath {
    let rank = match color {
        Color::White => 0,
        Color::Black => 7,
    };
    let (rook_from, rook_to) = castle_rook_squares(color, kingside);
    let king_from = Square::new(rank, 4);
    if kingside {
        let king_to = Square::new(rank, 6);
        CastlePath {
            king_from,
            king_to,
            rook_from,
            rook_to,
            must_be_empty: Bitboard::from_square(Square::new(rank, 5)) | Bitboard::from_square(Square::new(rank, 6)),
            king_path: [king_from, Square::new(rank, 5), king_to],
        }
    } else {
        let king_to = Square::new(rank, 2);
        CastlePath {
            king_from,
            king_to,
            rook_from,
            rook_to,
            must_be_empty: Bitboard::from_square(Square::new(rank, 1))
                | Bitboard::from_square(Square::new(rank, 2))
                | Bitboard::from_square(Square::new(rank, 3)),
            king_path: [king_from, Square::new(rank, 3), king_to],
        }
    }
}

fn push_quiet(out: &mut MoveList, from: Square, to: Square) {
    out.push(Move::new(from, to, None, MoveFlags::default()));
}

fn push_capture(out: &mut MoveList, from: Square, to: Square) {
    out.push(Move::new(from, to, None, MoveFlags { capture: true, ..Default::default() }));
}

/// Quiescence search only widens material swings a queen or knight
/// promotion can cause; under-promotions to rook/bishop are never stronger
/// than the queen and are dropped from the narrower quiescence move set.
const QUIESCENCE_PROMOTION_PIECES: [Piece; 2] = [Piece::Queen, Piece::Knight];

fn push_promotions(out: &mut MoveList, from: Square, to: Square, capture: bool, kinds: &[Piece]) {
    for &p in kinds {
        out.push(Move::new(from, to, Some(p), MoveFlags { capture, ..Default::default() }));
    }
}

fn generate_knight_moves(board: &Board, color: Color, targets: Bitboard, out: &mut MoveList) {
    for from in board.pieces_of(color, Piece::Knight).iter() {
        for to in (attacks::knight_attacks(from) & targets).iter() {
            if board.color_occupancy(color.opponent()).contains(to) {
                push_capture(out, from, to);
            } else {
                push_quiet(out, from, to);
            }
        }
    }
}

fn generate_king_moves(board: &Board, color: Color, targets: Bitboard, out: &mut MoveList) {
    let from = board.king_square(color);
    for to in (attacks::king_attacks(from) & targets).iter() {
        if board.color_occupancy(color.opponent()).contains(to) {
            push_capture(out, from, to);
        } else {
            push_quiet(out, from, to);
        }
    }
}

fn generate_slider_moves(board: &Board, color: Color, piece: Piece, targets: Bitboard, out: &mut MoveList) {
    let occ = board.global_occupancy();
    let enemy = board.color_occupancy(color.opponent());
    for from in board.pieces_of(color, piece).iter() {
        let attacks = match piece {
            Piece::Bishop => attacks::bishop_attacks(from, occ),
            Piece::Rook => attacks::rook_attacks(from, occ),
            Piece::Queen => attacks::queen_attacks(from, occ),
            _ => unreachable!("generate_slider_moves only called for bishop/rook/queen"),
        };
        for to in (attacks & targets).iter() {
            if enemy.contains(to) {
                push_capture(out, from, to);
            } else {
                push_quiet(out, from, to);
            }
        }
    }
}

/// `quiescence_only` restricts pawn moves to captures, en-passant, and
/// queen/knight promotions.
///
/// `ep_evasion_square` is `Some(ep)` when the position is in check from a
/// pawn that just double-pushed and capturing it en passant is the only way
/// a pawn move can resolve that check; the en-passant capture to `ep` is
/// then allowed even though `ep` is neither the checker's square nor a
/// between-square (the `targets` mask only knows those two shapes).
#[allow(clippy::too_many_arguments)]
fn generate_pawn_moves(
    board: &Board,
    color: Color,
    en_passant_target: Option<Square>,
    targets: Bitboard,
    ep_evasion_square: Option<Square>,
    quiescence_only: bool,
    out: &mut MoveList,
) {
    let occ = board.global_occupancy();
    let enemy = board.color_occupancy(color.opponent());
    let promo_rank = match color {
        Color::White => 7,
        Color::Black => 0,
    };
    let double_push_rank = match color {
        Color::White => 1,
        Color::Black => 6,
    };

    let promo_kinds: &[Piece] =
        if quiescence_only { &QUIESCENCE_PROMOTION_PIECES } else { &PROMOTION_PIECES };

    for from in board.pieces_of(color, Piece::Pawn).iter() {
        if let Some(one) = from.forward(color) {
            let reaches_promo = one.rank() == promo_rank;
            if !occ.contains(one) && targets.contains(one) {
                if reaches_promo {
                    push_promotions(out, from, one, false, promo_kinds);
                } else if !quiescence_only {
                    push_quiet(out, from, one);
                }
                if !reaches_promo && from.rank() == double_push_rank && !quiescence_only {
                    if let Some(two) = one.forward(color) {
                        if !occ.contains(two) && targets.contains(two) {
                            out.push(Move::new(from, two, None, MoveFlags { double_push: true, ..Default::default() }));
                        }
                    }
                }
            }
        }
        for to in attacks::pawn_attacks(color, from).iter() {
            if !targets.contains(to) && ep_evasion_square != Some(to) {
                continue;
            }
            let reaches_promo = to.rank() == promo_rank;
            if enemy.contains(to) {
                if reaches_promo {
                    push_promotions(out, from, to, true, promo_kinds);
                } else {
                    push_capture(out, from, to);
                }
            } else if Some(to) == en_passant_target {
                out.push(Move::new(from, to, None, MoveFlags { en_passant: true, ..Default::default() }));
            }
        }
    }
}

fn generate_castle_moves(
    board: &Board,
    color: Color,
    castling_rights: CastlingRights,
    out: &mut MoveList,
) {
    let occ = board.global_occupancy();
    for &kingside in &[true, false] {
        if !castling_rights.has(color, kingside) {
            continue;
        }
        let path = castle_path(color, kingside);
        if !(path.must_be_empty & occ).is_empty() {
            continue;
        }
        if board.mask_is_attacked(
            path.king_path.iter().fold(Bitboard::EMPTY, |acc, &sq| acc | Bitboard::from_square(sq)),
            color.opponent(),
        ) {
            continue;
        }
        let mut flags = MoveFlags::default();
        if kingside {
            flags.castle_kingside = true;
        } else {
            flags.castle_queenside = true;
        }
        out.push(Move::new(path.king_from, path.king_to, None, flags));
    }
}

/// Full pseudo-legal move set for the position described by the arguments,
/// evasion-aware when `checkers` is non-empty.
#[allow(clippy::too_many_arguments)]
pub fn generate(
    board: &Board,
    color: Color,
    en_passant_target: Option<Square>,
    castling_rights: CastlingRights,
    out: &mut MoveList,
) {
    let king_sq = board.king_square(color);
    let checkers = board.attackers_of_color(king_sq, color.opponent());
    let own = board.color_occupancy(color);
    let not_own = !own;

    if checkers.popcount() >= 2 {
        generate_king_moves(board, color, not_own, out);
        return;
    }

    let checker = checkers.getlsb();
    let targets = if let Some(checker) = checker {
        Bitboard::from_square(checker) | attacks::between(king_sq, checker)
    } else {
        Bitboard::ALL
    };

    // A single checking pawn that just double-pushed can only be captured
    // en passant, landing behind it rather than on its square or a
    // between-square - the `targets` mask alone would drop that evasion.
    let ep_evasion_square = match (checker, en_passant_target) {
        (Some(checker), Some(ep)) => {
            let is_checking_pawn = matches!(board.piece_at(checker), Some((_, Piece::Pawn)))
                && ep.forward(color.opponent()) == Some(checker);
            is_checking_pawn.then_some(ep)
        }
        _ => None,
    };

    generate_king_moves(board, color, not_own, out);
    generate_knight_moves(board, color, not_own & targets, out);
    generate_slider_moves(board, color, Piece::Bishop, not_own & targets, out);
    generate_slider_moves(board, color, Piece::Rook, not_own & targets, out);
    generate_slider_moves(board, color, Piece::Queen, not_own & targets, out);
    generate_pawn_moves(board, color, en_passant_target, not_own & targets, ep_evasion_square, false, out);
    if checkers.is_empty() {
        generate_castle_moves(board, color, castling_rights, out);
    }
}

/// Captures, queen/knight promotions, and (if in check) evasions - the
/// narrower set quiescence search recurses on.
pub fn generate_quiescence(
    board: &Board,
    color: Color,
    en_passant_target: Option<Square>,
    out: &mut MoveList,
) {
    let king_sq = board.king_square(color);
    let checkers = board.attackers_of_color(king_sq, color.opponent());
    let own = board.color_occupancy(color);
    let not_own = !own;

    if !checkers.is_empty() {
        // In check: fall back to the full evasion set, quiescence has no
        // narrower subset that's still safe.
        generate(board, color, en_passant_target, CastlingRights::none(), out);
        return;
    }

    let enemy = board.color_occupancy(color.opponent());
    generate_king_moves(board, color, enemy, out);
    generate_knight_moves(board, color, enemy, out);
    generate_slider_moves(board, color, Piece::Bishop, enemy, out);
    generate_slider_moves(board, color, Piece::Rook, enemy, out);
    generate_slider_moves(board, color, Piece::Queen, enemy, out);
    generate_pawn_moves(board, color, en_passant_target, not_own, None, true, out);
    generate_checking_quiet_moves(board, color, out);
}

/// Occupancy after vacating `from` and occupying `to`, used to test whether
/// a quiet move gives check without mutating the board.
fn occupancy_after_quiet_move(board: &Board, from: Square, to: Square) -> Bitboard {
    (board.global_occupancy() & !Bitboard::from_square(from)) | Bitboard::from_square(to)
}

/// True iff the piece of `color` moving `from` -> `to` attacks the enemy
/// king directly once it lands. Discovered checks - a friendly slider
/// unmasked by vacating `from` - are not tested; this is the same direct-
/// check-only scope quiescence "gives check" extensions use in practice,
/// trading a few missed discovered checks for an O(1) test per candidate.
fn gives_direct_check(board: &Board, color: Color, piece: Piece, from: Square, to: Square) -> bool {
    let enemy_king = board.king_square(color.opponent());
    let occ = occupancy_after_quiet_move(board, from, to);
    let attacked = match piece {
        Piece::Pawn => attacks::pawn_attacks(color, to),
        Piece::Knight => attacks::knight_attacks(to),
        Piece::Bishop => attacks::bishop_attacks(to, occ),
        Piece::Rook => attacks::rook_attacks(to, occ),
        Piece::Queen => attacks::queen_attacks(to, occ),
        Piece::King => Bitboard::EMPTY,
    };
    attacked.contains(enemy_king)
}

/// Adds quiet (non-capturing, non-promoting) moves that give direct check -
/// the third leg of the quiescence move set alongside captures and
/// queen/knight promotions.
fn generate_checking_quiet_moves(board: &Board, color: Color, out: &mut MoveList) {
    let empty = !board.global_occupancy();

    for &piece in &[Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
        for from in board.pieces_of(color, piece).iter() {
            let targets = match piece {
                Piece::Knight => attacks::knight_attacks(from),
                Piece::Bishop => attacks::bishop_attacks(from, board.global_occupancy()),
                Piece::Rook => attacks::rook_attacks(from, board.global_occupancy()),
                Piece::Queen => attacks::queen_attacks(from, board.global_occupancy()),
                _ => unreachable!("only called for knight/bishop/rook/queen"),
            } & empty;
            for to in targets.iter() {
                if gives_direct_check(board, color, piece, from, to) {
                    push_quiet(out, from, to);
                }
            }
        }
    }

    let double_push_rank = match color {
        Color::White => 1,
        Color::Black => 6,
    };
    let promo_rank = match color {
        Color::White => 7,
        Color::Black => 0,
    };
    for from in board.pieces_of(color, Piece::Pawn).iter() {
        let Some(one) = from.forward(color) else { continue };
        if !empty.contains(one) || one.rank() == promo_rank {
            continue;
        }
        if gives_direct_check(board, color, Piece::Pawn, from, one) {
            push_quiet(out, from, one);
        }
        if from.rank() == double_push_rank {
            if let Some(two) = one.forward(color) {
                if empty.contains(two) && gives_direct_check(board, color, Piece::Pawn, from, two) {
                    out.push(Move::new(from, two, None, MoveFlags { double_push: true, ..Default::default() }));
                }
            }
        }
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
    fn starting_position_has_twenty_moves() {
        init();
        let board = Board::starting_position();
        let mut out = MoveList::new();
        generate(&board, Color::White, None, CastlingRights::all(), &mut out);
        assert_eq!(out.len(), 20);
    }

    #[test]
    fn double_check_only_generates_king_moves() {
        init();
        // Construct a contrived double-check: white king on e1 attacked by
        // a rook on e8 (file) and a knight on d3 (simultaneously), black to
        // move is irrelevant here since we query White's own generation
        // directly against an attacks_on() computation.
        let mut board = Board::empty();
        board.place(Square::new(0, 4), Color::White, Piece::King);
        board.place(Square::new(7, 4), Color::Black, Piece::Rook);
        board.place(Square::new(2, 3), Color::Black, Piece::Knight);
        let mut out = MoveList::new();
        generate(&board, Color::White, None, CastlingRights::none(), &mut out);
        assert!(out.iter().all(|m| m.from() == Square::new(0, 4)));
    }

    #[test]
    fn pawn_reaching_last_rank_produces_four_promotions() {
        init();
        let mut board = Board::empty();
        board.place(Square::new(0, 4), Color::White, Piece::King);
        board.place(Square::new(7, 4), Color::Black, Piece::King);
        board.place(Square::new(6, 0), Color::White, Piece::Pawn);
        let mut out = MoveList::new();
        generate(&board, Color::White, None, CastlingRights::none(), &mut out);
        let promos: Vec<_> = out.iter().filter(|m| m.is_promotion()).collect();
        assert_eq!(promos.len(), 4);
    }

    #[test]
    fn quiescence_promotions_are_restricted_to_queen_and_knight() {
        init();
        let mut board = Board::empty();
        board.place(Square::new(0, 4), Color::White, Piece::King);
        board.place(Square::new(7, 4), Color::Black, Piece::King);
        board.place(Square::new(6, 0), Color::White, Piece::Pawn);
        let mut out = MoveList::new();
        generate_quiescence(&board, Color::White, None, &mut out);
        let promos: Vec<Piece> = out.iter().filter_map(|m| m.promotion()).collect();
        assert_eq!(promos.len(), 2);
        assert!(promos.contains(&Piece::Queen));
        assert!(promos.contains(&Piece::Knight));
        assert!(!promos.contains(&Piece::Rook));
        assert!(!promos.contains(&Piece::Bishop));
    }

    #[test]
    fn quiescence_includes_a_quiet_move_that_gives_check() {
        init();
        // A rook already on the enemy king's file, free to slide further up
        // that same file, gives direct check on every such quiet move.
        let mut board = Board::empty();
        board.place(Square::new(0, 0), Color::White, Piece::King);
        board.place(Square::new(7, 4), Color::Black, Piece::King);
        board.place(Square::new(3, 4), Color::White, Piece::Rook);
        let mut out = MoveList::new();
        generate_quiescence(&board, Color::White, None, &mut out);
        let gives_check = out
            .iter()
            .any(|m| m.from() == Square::new(3, 4) && m.to().file() == 4 && m.to().rank() > 3 && !m.is_capture());
        assert!(
            gives_check,
            "a rook quiet move that stays aligned with the enemy king should be flagged as giving check"
        );
    }
}
