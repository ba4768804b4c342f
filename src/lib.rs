//! Chess engine core: bitboard primitives, magic-bitboard attack tables,
//! Zobrist hashing, reversible make/unmake move generation, tapered static
//! evaluation, and two search drivers (Lazy-SMP alpha-beta and
//! multi-threaded MCTS) behind a single dispatch facade.
//!
//! Call [`init`] once, before anything else in this crate is used.

pub mod attacks;
pub mod board;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod eval;
pub mod info;
pub mod magic;
pub mod mcts;
pub mod movegen;
pub mod ordering;
pub mod pawn_hash;
pub mod position;
pub mod search;
pub mod see;
pub mod sync;
pub mod timer;
pub mod transposition_table;
pub mod types;
pub mod zobrist;

/// Builds every lookup table this crate depends on (Zobrist keys, attack
/// tables, magic numbers). Idempotent; must run before any other call.
///
/// Initialization order is fixed: Zobrist, then attacks (which also builds
/// the magic tables and the between-squares ray table internally).
pub fn init() {
    zobrist::init();
    attacks::init();
}
