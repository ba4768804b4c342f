//! Zobrist hashing: 64-bit random key tables and incremental update
//! primitives.
//!
//! A position's key is the XOR of one token per (piece, color, square)
//! present on the board, the side-to-move token when Black is to move, a
//! castling-rights token per still-held right, and an en-passant token for
//! the file of the current en-passant target, if any. XOR is its own
//! inverse, so `unmake_move` undoes a key update by re-XORing the same
//! tokens `make_move` applied.

use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::initialization_order_violation;
use crate::types::{Color, Piece, Square};

/// Fixed seed: successive `init()` calls, in this process or a fresh one,
/// rediscover identical keys.
const ZOBRIST_SEED: u64 = 1_234_567_890;

struct ZobristKeys {
    // piece_keys[color][piece][square]
    piece_keys: [[[u64; 64]; 6]; 2],
    black_to_move_key: u64,
    // castling_keys[color][kingside]
    castling_keys: [[u64; 2]; 2],
    en_passant_keys: [u64; 8],
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
        let mut piece_keys = [[[0u64; 64]; 6]; 2];
        for color in &mut piece_keys {
            for piece in color.iter_mut() {
                for key in piece.iter_mut() {
                    *key = rng.next_u64();
                }
            }
        }

        let black_to_move_key = rng.next_u64();

        let mut castling_keys = [[0u64; 2]; 2];
        for color in &mut castling_keys {
            for key in color.iter_mut() {
                *key = rng.next_u64();
            }
        }

        let mut en_passant_keys = [0u64; 8];
        for key in &mut en_passant_keys {
            *key = rng.next_u64();
        }

        ZobristKeys { piece_keys, black_to_move_key, castling_keys, en_passant_keys }
    }
}

static KEYS: OnceLock<ZobristKeys> = OnceLock::new();

/// Builds the key tables if this is the first call; a no-op otherwise.
pub fn init() {
    KEYS.get_or_init(ZobristKeys::new);
}

fn keys() -> &'static ZobristKeys {
    KEYS.get().unwrap_or_else(|| initialization_order_violation("zobrist keys"))
}

#[inline]
#[must_use]
pub fn piece_key(color: Color, piece: Piece, sq: Square) -> u64 {
    keys().piece_keys[color.index()][piece.index()][sq.as_index()]
}

#[inline]
#[must_use]
pub fn black_to_move_key() -> u64 {
    keys().black_to_move_key
}

#[inline]
#[must_use]
pub fn castling_key(color: Color, kingside: bool) -> u64 {
    keys().castling_keys[color.index()][usize::from(!kingside)]
}

#[inline]
#[must_use]
pub fn en_passant_key(file: usize) -> u64 {
    keys().en_passant_keys[file]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_pieces_get_distinct_keys() {
        init();
        let a = piece_key(Color::White, Piece::Pawn, Square::new(1, 0));
        let b = piece_key(Color::White, Piece::Pawn, Square::new(1, 1));
        let c = piece_key(Color::Black, Piece::Pawn, Square::new(1, 0));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn init_is_idempotent() {
        init();
        let before = piece_key(Color::White, Piece::King, Square::new(0, 4));
        init();
        let after = piece_key(Color::White, Piece::King, Square::new(0, 4));
        assert_eq!(before, after);
    }

    #[test]
    fn castling_keys_distinguish_side_and_color() {
        init();
        let wk = castling_key(Color::White, true);
        let wq = castling_key(Color::White, false);
        let bk = castling_key(Color::Black, true);
        assert_ne!(wk, wq);
        assert_ne!(wk, bk);
    }
}
