//! The engine value: board, transposition table and search state under one
//! owner.
//!
//! Everything mutable lives here; there are no hidden singletons beyond the
//! lazily built lookup tables and the decoded network weights, which are
//! immutable.

mod io;
pub mod protocol;

pub use io::{CommandSource, InputProbe, ScriptedInput, StdinChannel, MAX_COMMAND_BYTES};
pub use protocol::LoopExit;

use std::time::{Duration, Instant};

use crate::board::{Board, FenError, Move, MoveParseError};
use crate::nnue::Accumulator;
use crate::search::{NoInput, SearchContext, SearchReport, SearchState};
use crate::tt::{TranspositionTable, DEFAULT_TT_CLUSTERS};

/// How long the engine thinks on the opponent's time before giving up.
const PONDER_BUDGET: Duration = Duration::from_secs(10);

pub struct Engine {
    board: Board<Accumulator>,
    tt: TranspositionTable,
    state: SearchState,
}

impl Engine {
    /// Engine at the starting position with the default table size.
    #[must_use]
    pub fn new() -> Self {
        Engine::with_tt_clusters(DEFAULT_TT_CLUSTERS)
    }

    #[must_use]
    pub fn with_tt_clusters(clusters: usize) -> Self {
        Engine {
            board: Board::new(),
            tt: TranspositionTable::new(clusters),
            state: SearchState::new(),
        }
    }

    #[must_use]
    pub fn board(&self) -> &Board<Accumulator> {
        &self.board
    }

    #[must_use]
    pub fn tt_cluster_count(&self) -> usize {
        self.tt.cluster_count()
    }

    /// Reset the position and forget everything position-dependent: the
    /// table and the ordering heuristics start fresh.
    pub fn set_position_from_fen(&mut self, fen: &str) -> Result<(), FenError> {
        self.board.set_from_fen(fen)?;
        self.tt.clear();
        self.state.clear_tables();
        Ok(())
    }

    /// Parse and apply an opponent move. Returns the applied move; a
    /// well-formed-but-invalid promotion is reported as an error without
    /// touching the position.
    pub fn apply_external_move(&mut self, uci: &str) -> Result<Move, MoveParseError> {
        let mv = protocol::parse_uci_move(&self.board, uci)?;
        self.board.make_move(mv);
        Ok(mv)
    }

    /// Apply a move the engine itself chose.
    pub fn apply_move(&mut self, mv: Move) {
        self.board.make_move(mv);
    }

    /// Drop undo history from before the last irreversible move.
    pub fn compact(&mut self) {
        self.board.compact();
    }

    /// Search the current position within a time budget and report the
    /// chosen move, nodes and the last completed evaluation.
    pub fn search_with_budget(&mut self, budget: Duration) -> SearchReport {
        let mut probe = NoInput;
        let mut ctx = SearchContext {
            board: &mut self.board,
            tt: &mut self.tt,
            state: &mut self.state,
            probe: &mut probe,
            started: Instant::now(),
            budget,
        };
        let best_move = ctx.run(false);
        SearchReport {
            best_move,
            nodes: self.state.nodes,
            value: self.state.last_value,
        }
    }

    /// Think on the opponent's time until input arrives (or the ponder
    /// budget runs out). Returns the nodes visited.
    pub fn ponder_until_input<P: InputProbe>(&mut self, probe: &mut P) -> u64 {
        let mut ctx = SearchContext {
            board: &mut self.board,
            tt: &mut self.tt,
            state: &mut self.state,
            probe,
            started: Instant::now(),
            budget: PONDER_BUDGET,
        };
        ctx.run(true);
        self.state.nodes
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}
