//! Square type and algebraic-notation conversions.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::SquareError;

#[inline]
#[must_use]
pub fn file_to_index(file: char) -> usize {
    file as usize - 'a' as usize
}

#[inline]
#[must_use]
pub fn rank_to_index(rank: char) -> usize {
    rank as usize - '1' as usize
}

/// A square on the chess board, stored as a compact 0-63 index.
///
/// Index layout: rank * 8 + file, so a1 = 0, b1 = 1, ..., h8 = 63. Rank 0 is
/// White's back rank, matching the root-key convention used by `Zobrist`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Square(u8);

impl Square {
    /// Construct from rank/file (both 0-7), unchecked.
    #[inline]
    #[must_use]
    pub const fn new(rank: usize, file: usize) -> Self {
        Square((rank * 8 + file) as u8)
    }

    #[must_use]
    pub const fn try_new(rank: usize, file: usize) -> Option<Self> {
        if rank < 8 && file < 8 {
            Some(Square::new(rank, file))
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub const fn rank(self) -> usize {
        (self.0 / 8) as usize
    }

    #[inline]
    #[must_use]
    pub const fn file(self) -> usize {
        (self.0 % 8) as usize
    }

    #[inline]
    #[must_use]
    pub const fn flip_vertical(self) -> Self {
        Square::new(7 - self.rank(), self.file())
    }

    #[inline]
    #[must_use]
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    #[must_use]
    pub const fn from_index(idx: usize) -> Self {
        Square(idx as u8)
    }

    /// The square one rank forward from `color`'s perspective, or `None` at the edge.
    #[inline]
    #[must_use]
    pub const fn forward(self, color: super::Color) -> Option<Self> {
        let rank = self.rank();
        match color {
            super::Color::White if rank < 7 => Some(Square::new(rank + 1, self.file())),
            super::Color::Black if rank > 0 => Some(Square::new(rank - 1, self.file())),
            _ => None,
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (self.file() as u8 + b'a') as char, self.rank() + 1)
    }
}

impl TryFrom<(usize, usize)> for Square {
    type Error = SquareError;

    fn try_from((rank, file): (usize, usize)) -> Result<Self, Self::Error> {
        if rank >= 8 {
            return Err(SquareError::RankOutOfBounds { rank });
        }
        if file >= 8 {
            return Err(SquareError::FileOutOfBounds { file });
        }
        Ok(Square::new(rank, file))
    }
}

impl FromStr for Square {
    type Err = SquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 2 {
            return Err(SquareError::InvalidNotation { notation: s.to_string() });
        }
        let file = match chars[0] {
            'a'..='h' => chars[0] as usize - 'a' as usize,
            _ => return Err(SquareError::InvalidNotation { notation: s.to_string() }),
        };
        let rank = match chars[1] {
            '1'..='8' => chars[1] as usize - '1' as usize,
            _ => return Err(SquareError::InvalidNotation { notation: s.to_string() }),
        };
        Ok(Square::new(rank, file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_index() {
        for idx in 0..64 {
            let sq = Square::from_index(idx);
            assert_eq!(sq.as_index(), idx);
        }
    }

    #[test]
    fn display_matches_algebraic_notation() {
        assert_eq!(Square::new(0, 0).to_string(), "a1");
        assert_eq!(Square::new(7, 7).to_string(), "h8");
        assert_eq!(Square::new(3, 4).to_string(), "e4");
    }

    #[test]
    fn from_str_rejects_garbage() {
        assert!("z1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("a".parse::<Square>().is_err());
    }

    #[test]
    fn forward_stops_at_back_rank() {
        let e8 = Square::new(7, 4);
        assert!(e8.forward(super::super::Color::White).is_none());
        let e1 = Square::new(0, 4);
        assert!(e1.forward(super::super::Color::Black).is_none());
    }
}
