//! Square indexing (A1 = 0, H8 = 63).

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::super::error::SquareError;
use super::piece::Color;

/// A board square, indexed 0..64 with A1 = 0, files running a..h within a
/// rank and ranks running 1..8 from White's side.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Square(u8);

impl Square {
    pub const A1: Square = Square(0);
    pub const C1: Square = Square(2);
    pub const D1: Square = Square(3);
    pub const E1: Square = Square(4);
    pub const F1: Square = Square(5);
    pub const G1: Square = Square(6);
    pub const H1: Square = Square(7);
    pub const A8: Square = Square(56);
    pub const H8: Square = Square(63);

    /// Build a square from a 0..64 index.
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        debug_assert!(index < 64);
        Square(index as u8)
    }

    /// Build a square from file (0 = a) and rank (0 = 1).
    #[inline]
    #[must_use]
    pub const fn from_coords(file: usize, rank: usize) -> Self {
        debug_assert!(file < 8 && rank < 8);
        Square((rank * 8 + file) as u8)
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// File index, 0 = a-file.
    #[inline]
    #[must_use]
    pub const fn file(self) -> usize {
        (self.0 & 7) as usize
    }

    /// Rank index, 0 = first rank.
    #[inline]
    #[must_use]
    pub const fn rank(self) -> usize {
        (self.0 >> 3) as usize
    }

    /// The same square seen from `color`'s side of the board: identity for
    /// White, vertical mirror for Black.
    #[inline]
    #[must_use]
    pub const fn relative_to(self, color: Color) -> Self {
        match color {
            Color::White => self,
            Color::Black => Square(self.0 ^ 56),
        }
    }

    /// For a double-push target or an en-passant square, the square one rank
    /// towards the mover's side (the skipped / captured-pawn square).
    #[inline]
    #[must_use]
    pub const fn ep_counterpart(self) -> Self {
        Square(self.0 ^ 8)
    }

    /// Is this square on `color`'s back rank?
    #[inline]
    #[must_use]
    pub const fn on_back_rank(self, color: Color) -> bool {
        match color {
            Color::White => self.0 >> 3 == 0,
            Color::Black => self.0 >> 3 == 7,
        }
    }

    /// Where the king lands when castling (G or C file of the back rank).
    #[inline]
    #[must_use]
    pub const fn castling_king_target(king_side: bool, color: Color) -> Self {
        let sq = if king_side { Square::G1 } else { Square::C1 };
        sq.relative_to(color)
    }

    /// Where the rook lands when castling (F or D file of the back rank).
    #[inline]
    #[must_use]
    pub const fn castling_rook_target(king_side: bool, color: Color) -> Self {
        let sq = if king_side { Square::F1 } else { Square::D1 };
        sq.relative_to(color)
    }

    /// Offset by a signed delta. The caller guarantees the result stays on
    /// the board (the shift masks in the move generator do).
    #[inline]
    #[must_use]
    pub const fn offset(self, delta: i8) -> Self {
        Square((self.0 as i8 + delta) as u8)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            (b'a' + self.file() as u8) as char,
            (b'1' + self.rank() as u8) as char
        )
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Square({self})")
    }
}

impl FromStr for Square {
    type Err = SquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || SquareError::InvalidNotation {
            notation: s.to_string(),
        };
        let mut chars = s.chars();
        let (Some(file), Some(rank)) = (chars.next(), chars.next()) else {
            return Err(bad());
        };
        if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) || chars.next().is_some() {
            return Err(bad());
        }
        Ok(Square::from_coords(
            file as usize - 'a' as usize,
            rank as usize - '1' as usize,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trip() {
        for i in 0..64 {
            let sq = Square::from_index(i);
            assert_eq!(sq.index(), i);
            assert_eq!(Square::from_coords(sq.file(), sq.rank()), sq);
        }
    }

    #[test]
    fn relative_square_mirrors_for_black() {
        assert_eq!(Square::E1.relative_to(Color::White), Square::E1);
        assert_eq!(
            Square::E1.relative_to(Color::Black),
            Square::from_coords(4, 7)
        );
        assert_eq!(Square::A1.relative_to(Color::Black), Square::A8);
    }

    #[test]
    fn ep_counterpart_flips_one_rank() {
        // e4 <-> e3
        assert_eq!(
            Square::from_coords(4, 3).ep_counterpart(),
            Square::from_coords(4, 2)
        );
        assert_eq!(
            Square::from_coords(4, 2).ep_counterpart(),
            Square::from_coords(4, 3)
        );
    }

    #[test]
    fn parse_and_display() {
        let sq: Square = "e4".parse().unwrap();
        assert_eq!(sq, Square::from_coords(4, 3));
        assert_eq!(sq.to_string(), "e4");
        assert!("i9".parse::<Square>().is_err());
        assert!("e".parse::<Square>().is_err());
        assert!("e44".parse::<Square>().is_err());
    }

    #[test]
    fn castling_targets() {
        assert_eq!(Square::castling_king_target(true, Color::White), Square::G1);
        assert_eq!(
            Square::castling_king_target(false, Color::Black),
            Square::from_coords(2, 7)
        );
        assert_eq!(
            Square::castling_rook_target(true, Color::Black),
            Square::from_coords(5, 7)
        );
    }
}
