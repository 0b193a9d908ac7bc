//! Chess board representation and legal move generation.
//!
//! Bitboard position with make/unmake over a bounded undo ring, incremental
//! Zobrist hashing, and a pin-aware legal move generator. Every piece
//! placement and removal is reported to a [`PieceSetListener`], which is how
//! the evaluator's accumulator stays in sync without the board knowing about
//! evaluation at all.

pub(crate) mod attack_tables;
mod error;
mod fen;
mod make_unmake;
mod movegen;
mod state;
mod types;

pub use error::{FenError, MoveParseError, SquareError};
pub use movegen::{piece_mask, GenType};
pub use state::{Board, NullListener, PieceSetListener};
pub use types::{
    Bitboard, CastleSide, CastlingRights, Color, Move, MoveKind, MoveList, Piece, PieceType,
    ScoredMove, Square,
};
