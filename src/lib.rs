//! kestrel - a bitboard chess engine with an arithmetic-coded NNUE
//! evaluator.
//!
//! The crate splits into a board layer (position, make/unmake, legal move
//! generation), an evaluation layer (the incrementally updated network
//! accumulator), a search layer (iterative-deepening negamax over a
//! clustered transposition table) and the engine shell speaking the one-line
//! command protocol.

pub mod board;
pub mod engine;
pub mod nnue;
pub mod search;
pub mod tt;
mod zobrist;

pub use engine::Engine;
