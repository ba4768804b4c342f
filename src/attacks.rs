//! Precomputed piece-attack lookup tables, including magic-indexed sliders.
//!
//! Every table here is built once by [`init`] and never mutated afterward.
//! Lookups taken before `init()` has run panic with `InitializationOrderError`
//! rather than silently building an empty table or lazily initializing -
//! the fixed order Zobrist -> Attacks -> everything else is load-bearing for
//! search correctness, so a caller that skips `init()` should fail loudly.

use std::sync::OnceLock;

use crate::error::initialization_order_violation;
use crate::magic::{self, MagicTables};
use crate::types::{Bitboard, Color, Square};

static TABLES: OnceLock<AttackTables> = OnceLock::new();

/// Builds every attack table if this is the first call; a no-op otherwise.
/// Matches §8's "`init()` is idempotent after the first call."
pub fn init() {
    TABLES.get_or_init(build);
}

fn tables() -> &'static AttackTables {
    TABLES.get().unwrap_or_else(|| initialization_order_violation("attack tables"))
}

struct AttackTables {
    king: [Bitboard; 64],
    knight: [Bitboard; 64],
    pawn: [[Bitboard; 64]; 2],
    pawn_frontspan: [[Bitboard; 64]; 2],
    pawn_attackspan: [[Bitboard; 64]; 2],
    between: Vec<[Bitboard; 64]>,
    magics: MagicTables,
}

const KING_DELTAS: [(i32, i32); 8] = [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];
const KNIGHT_DELTAS: [(i32, i32); 8] =
    [(2, 1), (2, -1), (-2, 1), (-2, -1), (1, 2), (1, -2), (-1, 2), (-1, -2)];

fn leaper_attacks(sq: usize, deltas: &[(i32, i32)]) -> Bitboard {
    let rank = (sq / 8) as i32;
    let file = (sq % 8) as i32;
    let mut bb = 0u64;
    for &(dr, df) in deltas {
        let r = rank + dr;
        let f = file + df;
        if (0..8).contains(&r) && (0..8).contains(&f) {
            bb |= 1u64 << (r * 8 + f);
        }
    }
    Bitboard(bb)
}

fn pawn_attacks_for(color: Color, sq: usize) -> Bitboard {
    let rank = (sq / 8) as i32;
    let file = (sq % 8) as i32;
    let dr = match color {
        Color::White => 1,
        Color::Black => -1,
    };
    let mut bb = 0u64;
    for df in [-1, 1] {
        let r = rank + dr;
        let f = file + df;
        if (0..8).contains(&r) && (0..8).contains(&f) {
            bb |= 1u64 << (r * 8 + f);
        }
    }
    Bitboard(bb)
}

/// Squares strictly ahead of `sq` on its own file, in `color`'s direction of
/// travel. Used to test whether any pawn blocks a passer on its own file.
fn frontspan_for(color: Color, sq: usize) -> Bitboard {
    let rank = (sq / 8) as i32;
    let file = (sq % 8) as i32;
    let mut bb = 0u64;
    match color {
        Color::White => {
            let mut r = rank + 1;
            while r < 8 {
                bb |= 1u64 << (r * 8 + file);
                r += 1;
            }
        }
        Color::Black => {
            let mut r = rank - 1;
            while r >= 0 {
                bb |= 1u64 << (r * 8 + file);
                r -= 1;
            }
        }
    }
    Bitboard(bb)
}

/// Squares strictly ahead of `sq` on the two adjacent files, in `color`'s
/// direction of travel. Used to test whether any enemy pawn can ever capture
/// onto this pawn's file ahead of it (passed-pawn / backward-pawn tests).
fn attackspan_for(color: Color, sq: usize) -> Bitboard {
    let rank = (sq / 8) as i32;
    let file = (sq % 8) as i32;
    let mut bb = 0u64;
    for df in [-1, 1] {
        let f = file + df;
        if !(0..8).contains(&f) {
            continue;
        }
        match color {
            Color::White => {
                let mut r = rank + 1;
                while r < 8 {
                    bb |= 1u64 << (r * 8 + f);
                    r += 1;
                }
            }
            Color::Black => {
                let mut r = rank - 1;
                while r >= 0 {
                    bb |= 1u64 << (r * 8 + f);
                    r -= 1;
                }
            }
        }
    }
    Bitboard(bb)
}

/// Squares strictly between `a` and `b` if they share a rank, file, or
/// diagonal; empty otherwise.
fn between_for(a: usize, b: usize) -> Bitboard {
    let (ar, af) = ((a / 8) as i32, (a % 8) as i32);
    let (br, bf) = ((b / 8) as i32, (b % 8) as i32);
    let dr = (br - ar).signum();
    let df = (bf - af).signum();
    let aligned = ar == br || af == bf || (br - ar).abs() == (bf - af).abs();
    if !aligned || a == b {
        return Bitboard::EMPTY;
    }
    let mut bb = 0u64;
    let mut r = ar + dr;
    let mut f = af + df;
    while (r, f) != (br, bf) {
        bb |= 1u64 << (r * 8 + f);
        r += dr;
        f += df;
    }
    Bitboard(bb)
}

fn build() -> AttackTables {
    let mut king = [Bitboard::EMPTY; 64];
    let mut knight = [Bitboard::EMPTY; 64];
    let mut pawn = [[Bitboard::EMPTY; 64]; 2];
    let mut pawn_frontspan = [[Bitboard::EMPTY; 64]; 2];
    let mut pawn_attackspan = [[Bitboard::EMPTY; 64]; 2];

    for sq in 0..64 {
        king[sq] = leaper_attacks(sq, &KING_DELTAS);
        knight[sq] = leaper_attacks(sq, &KNIGHT_DELTAS);
        for &color in &[Color::White, Color::Black] {
            pawn[color.index()][sq] = pawn_attacks_for(color, sq);
            pawn_frontspan[color.index()][sq] = frontspan_for(color, sq);
            pawn_attackspan[color.index()][sq] = attackspan_for(color, sq);
        }
    }

    let mut between = vec![[Bitboard::EMPTY; 64]; 64];
    for a in 0..64 {
        for b in 0..64 {
            between[a][b] = between_for(a, b);
        }
    }

    AttackTables { king, knight, pawn, pawn_frontspan, pawn_attackspan, between, magics: magic::build() }
}

#[inline]
#[must_use]
pub fn king_attacks(sq: Square) -> Bitboard {
    tables().king[sq.as_index()]
}

#[inline]
#[must_use]
pub fn knight_attacks(sq: Square) -> Bitboard {
    tables().knight[sq.as_index()]
}

#[inline]
#[must_use]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    tables().pawn[color.index()][sq.as_index()]
}

#[inline]
#[must_use]
pub fn pawn_frontspan(color: Color, sq: Square) -> Bitboard {
    tables().pawn_frontspan[color.index()][sq.as_index()]
}

#[inline]
#[must_use]
pub fn pawn_attackspan(color: Color, sq: Square) -> Bitboard {
    tables().pawn_attackspan[color.index()][sq.as_index()]
}

#[inline]
#[must_use]
pub fn rook_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    tables().magics.rook[sq.as_index()].attacks(occ)
}

#[inline]
#[must_use]
pub fn bishop_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    tables().magics.bishop[sq.as_index()].attacks(occ)
}

#[inline]
#[must_use]
pub fn queen_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    rook_attacks(sq, occ) | bishop_attacks(sq, occ)
}

#[inline]
#[must_use]
pub fn between(a: Square, b: Square) -> Bitboard {
    tables().between[a.as_index()][b.as_index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knight_attacks_corner_has_two_targets() {
        init();
        assert_eq!(knight_attacks(Square::new(0, 0)).popcount(), 2);
    }

    #[test]
    fn king_attacks_center_has_eight_targets() {
        init();
        assert_eq!(king_attacks(Square::new(3, 3)).popcount(), 8);
    }

    #[test]
    fn pawn_attacks_are_diagonal_only() {
        init();
        let attacks = pawn_attacks(Color::White, Square::new(1, 4));
        assert_eq!(attacks.popcount(), 2);
        assert!(attacks.contains(Square::new(2, 3)));
        assert!(attacks.contains(Square::new(2, 5)));
    }

    #[test]
    fn between_on_same_rank_excludes_endpoints() {
        init();
        let bb = between(Square::new(0, 0), Square::new(0, 3));
        assert_eq!(bb.popcount(), 2);
        assert!(bb.contains(Square::new(0, 1)));
        assert!(bb.contains(Square::new(0, 2)));
    }

    #[test]
    fn between_unaligned_squares_is_empty() {
        init();
        assert!(between(Square::new(0, 0), Square::new(3, 5)).is_empty());
    }

    #[test]
    fn queen_attacks_union_rook_and_bishop() {
        init();
        let sq = Square::new(3, 3);
        let occ = Bitboard::EMPTY;
        assert_eq!(queen_attacks(sq, occ), rook_attacks(sq, occ) | bishop_attacks(sq, occ));
    }
}
