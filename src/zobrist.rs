//! Zobrist hashing for chess positions.
//!
//! Deterministic 64-bit keys for (piece, square), side to move, the castling
//! presence mask and the en-passant file, generated once from a fixed seed.

use once_cell::sync::Lazy;
use rand::prelude::*;

use crate::board::{CastlingRights, Piece, Square};

pub(crate) struct ZobristKeys {
    /// piece_square[piece.index()][square]
    piece_square: [[u64; 64]; 12],
    /// One key per (color, side) castling-right slot.
    castling_slot: [u64; 4],
    /// Folded keys for all 16 presence masks, castling_mask[0] == 0.
    castling_mask: [u64; 16],
    /// en_passant[file]
    en_passant: [u64; 8],
    side: u64,
}

impl ZobristKeys {
    fn new() -> Self {
        // Fixed seed keeps hashes stable across runs and builds.
        let mut rng = StdRng::seed_from_u64(0x4112_CF68_649A_260E);

        let mut piece_square = [[0u64; 64]; 12];
        for piece in &mut piece_square {
            for key in piece.iter_mut() {
                *key = rng.gen();
            }
        }

        let mut castling_slot = [0u64; 4];
        for key in &mut castling_slot {
            *key = rng.gen();
        }

        let mut castling_mask = [0u64; 16];
        for (mask, key) in castling_mask.iter_mut().enumerate() {
            for (slot, slot_key) in castling_slot.iter().enumerate() {
                if mask & (1 << slot) != 0 {
                    *key ^= slot_key;
                }
            }
        }

        let mut en_passant = [0u64; 8];
        for key in &mut en_passant {
            *key = rng.gen();
        }

        let side = rng.gen();

        ZobristKeys {
            piece_square,
            castling_slot,
            castling_mask,
            en_passant,
            side,
        }
    }
}

static KEYS: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::new);

#[inline]
pub(crate) fn piece(piece: Piece, sq: Square) -> u64 {
    KEYS.piece_square[piece.index()][sq.index()]
}

#[inline]
pub(crate) fn en_passant(file: usize) -> u64 {
    KEYS.en_passant[file]
}

/// Key for one castling-right slot (0..4), as returned by
/// [`CastlingRights::clear_one`].
#[inline]
pub(crate) fn castling_slot(slot: usize) -> u64 {
    KEYS.castling_slot[slot]
}

/// Folded key for a full 4-bit castling presence mask.
#[inline]
pub(crate) fn castling_mask(rights: &CastlingRights) -> u64 {
    KEYS.castling_mask[rights.hash_index()]
}

#[inline]
pub(crate) fn side_to_move() -> u64 {
    KEYS.side
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{CastleSide, Color};

    #[test]
    fn keys_are_deterministic_and_distinct() {
        let a = piece(Piece::WhitePawn, Square::from_index(0));
        let b = piece(Piece::WhitePawn, Square::from_index(1));
        let c = piece(Piece::BlackPawn, Square::from_index(0));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, piece(Piece::WhitePawn, Square::from_index(0)));
    }

    #[test]
    fn castling_mask_is_fold_of_slots() {
        let mut rights = CastlingRights::none();
        rights.grant(Color::White, CastleSide::King, 7);
        rights.grant(Color::Black, CastleSide::Queen, 0);
        let folded = castling_mask(&rights);
        assert_eq!(folded, castling_slot(0) ^ castling_slot(3));

        let empty = CastlingRights::none();
        assert_eq!(castling_mask(&empty), 0);
    }
}
