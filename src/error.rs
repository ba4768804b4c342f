//! Error taxonomy for the core.
//!
//! Recoverable failures (malformed text, a move that doesn't parse) are
//! hand-rolled `enum`s implementing `std::error::Error`, in the style the
//! rest of this crate uses throughout - no `thiserror`/`anyhow` dependency
//! is pulled in for this. Fatal conditions (`InitializationOrderError`,
//! `NodeArenaExhausted`) are not represented as `Result` variants at all:
//! per the design, they abort the process from the single call site each
//! can occur at, with a descriptive panic message.

use std::fmt;

/// Malformed FEN text passed to `Position::from_fen`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    TooFewParts { found: usize },
    InvalidPiece { char: char },
    InvalidCastling { char: char },
    InvalidSideToMove { found: String },
    InvalidEnPassant { found: String },
    InvalidRank { rank: usize },
    TooManyFiles { rank: usize, files: usize },
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::TooFewParts { found } => write!(f, "FEN must have at least 4 parts, found {found}"),
            FenError::InvalidPiece { char } => write!(f, "invalid piece character '{char}' in FEN"),
            FenError::InvalidCastling { char } => write!(f, "invalid castling character '{char}' in FEN"),
            FenError::InvalidSideToMove { found } => write!(f, "invalid side to move '{found}', expected 'w' or 'b'"),
            FenError::InvalidEnPassant { found } => write!(f, "invalid en passant square '{found}'"),
            FenError::InvalidRank { rank } => write!(f, "invalid rank index {rank} in FEN"),
            FenError::TooManyFiles { rank, files } => write!(f, "too many files ({files}) in rank {rank}"),
        }
    }
}

impl std::error::Error for FenError {}

/// A UCI move-text string (`e2e4`, `a7a8q`) that does not parse, or does
/// not match any pseudo-legal move in the loaded position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveParseError {
    InvalidLength { len: usize },
    InvalidSquare { notation: String },
    InvalidPromotion { char: char },
    IllegalMove { notation: String },
}

impl fmt::Display for MoveParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveParseError::InvalidLength { len } => write!(f, "move must be 4-5 characters, found {len}"),
            MoveParseError::InvalidSquare { notation } => write!(f, "invalid square notation in '{notation}'"),
            MoveParseError::InvalidPromotion { char } => write!(f, "invalid promotion piece '{char}'"),
            MoveParseError::IllegalMove { notation } => write!(f, "illegal move '{notation}'"),
        }
    }
}

impl std::error::Error for MoveParseError {}

/// Out-of-range rank/file passed to `Square` construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    RankOutOfBounds { rank: usize },
    FileOutOfBounds { file: usize },
    InvalidNotation { notation: String },
}

impl fmt::Display for SquareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquareError::RankOutOfBounds { rank } => write!(f, "rank {rank} out of bounds (must be 0-7)"),
            SquareError::FileOutOfBounds { file } => write!(f, "file {file} out of bounds (must be 0-7)"),
            SquareError::InvalidNotation { notation } => write!(f, "invalid square notation '{notation}'"),
        }
    }
}

impl std::error::Error for SquareError {}

/// Panics with a message naming the violated initialization order
/// (Zobrist -> Attacks -> Between-squares ray table -> everything else).
/// Called from the single lookup site that can observe tables as
/// uninitialized; never reachable once `crate::init()` has run.
#[cold]
pub(crate) fn initialization_order_violation(what: &str) -> ! {
    panic!("InitializationOrderError: {what} was looked up before init() ran");
}

/// Panics naming the MCTS arena-capacity limit that was exceeded.
#[cold]
pub(crate) fn node_arena_exhausted(capacity: usize) -> ! {
    panic!("NodeArenaExhausted: MCTS tree arena exceeded its capacity of {capacity} nodes");
}
