//! Iterative-deepening negamax search.
//!
//! Depth is counted in quarter-ply units: the driver deepens in steps of 4
//! and a normal recursion step costs 4, so a check extension (cost 1) lets a
//! forcing line run deeper. Alpha-beta is augmented with transposition-table
//! cutoffs, null-move pruning, a late-move-reduction probe, killer and
//! history ordering and a quiescence stage; the whole search stops
//! cooperatively on a time or input poll every 4096 nodes.

mod history;
mod ordering;

pub use history::{HistoryTable, Killers};

use std::time::{Duration, Instant};

use crate::board::{piece_mask, Board, GenType, Move, MoveList};
use crate::nnue::Accumulator;
use crate::tt::{self, TranspositionTable, TT_NO_VALUE};

/// Centipawn-domain evaluation value.
pub type Value = i16;

/// Mate at the mated ply; the mate counter walks scores toward zero by one
/// per ply of distance.
pub const MATE: Value = 32000;

pub(crate) const MAX_PLY: usize = 64;
pub(crate) const KILLERS: usize = 2;

const NODES_PER_POLL: u64 = 4096;

/// Non-blocking "has a command line arrived?" probe, satisfied by the stdin
/// channel in the binary and by test doubles elsewhere.
pub trait InputProbe {
    fn input_ready(&mut self) -> bool;
}

/// Probe that never reports input; used for normal (non-ponder) searches.
pub struct NoInput;

impl InputProbe for NoInput {
    #[inline]
    fn input_ready(&mut self) -> bool {
        false
    }
}

/// Result of one budgeted search.
#[derive(Clone, Copy, Debug)]
pub struct SearchReport {
    pub best_move: Move,
    pub nodes: u64,
    pub value: Value,
}

/// All mutable search state that survives across searches: ordering tables,
/// per-ply stacks and the running counters.
pub struct SearchState {
    pub(crate) history: HistoryTable,
    pub(crate) killers: Killers,
    search_moves: [Move; MAX_PLY],
    /// Static eval per ply, recorded for every node on the current path.
    #[allow(dead_code)]
    static_evals: [Value; MAX_PLY],
    pv: Move,
    pub nodes: u64,
    max_ply_reached: u64,
    pub last_value: Value,
    stop: bool,
    pondering: bool,
}

impl SearchState {
    #[must_use]
    pub fn new() -> Self {
        SearchState {
            history: HistoryTable::new(),
            killers: Killers::new(),
            search_moves: [Move::NONE; MAX_PLY],
            static_evals: [0; MAX_PLY],
            pv: Move::NONE,
            nodes: 0,
            max_ply_reached: 0,
            last_value: 0,
            stop: false,
            pondering: false,
        }
    }

    /// Forget everything learned about move ordering (used on position
    /// resets).
    pub fn clear_tables(&mut self) {
        self.history.clear();
        self.killers.clear();
    }
}

impl Default for SearchState {
    fn default() -> Self {
        SearchState::new()
    }
}

/// Shift a mate-magnitude score one ply toward zero.
#[inline]
fn mate_counter(x: Value) -> Value {
    x + Value::from(x < -31000) - Value::from(x > 31000)
}

/// Borrowed view over everything one search needs.
pub(crate) struct SearchContext<'a, P: InputProbe> {
    pub board: &'a mut Board<Accumulator>,
    pub tt: &'a mut TranspositionTable,
    pub state: &'a mut SearchState,
    pub probe: &'a mut P,
    pub started: Instant,
    pub budget: Duration,
}

impl<P: InputProbe> SearchContext<'_, P> {
    #[inline]
    fn static_eval(&self) -> Value {
        self.board.listener().evaluate(self.board.side_to_move())
    }

    /// Iterative deepening driver. Commits the root PV after every
    /// uninterrupted iteration and returns the last committed move, falling
    /// back to the freshest root PV when nothing was committed.
    pub(crate) fn run(&mut self, pondering: bool) -> Move {
        self.state.nodes = 0;
        self.state.stop = false;
        self.state.pondering = pondering;
        self.tt.advance_generation();

        let mut best_move = Move::NONE;
        let min_value: Value = -(MATE + 1);
        let max_value: Value = MATE + 1;

        let mut depth = 4;
        while depth < 256 && !self.state.stop {
            self.state.max_ply_reached = 0;
            self.state.pv = Move::NONE;

            let v = self.alpha_beta(depth, 0, min_value, max_value, Move::NONE);
            if v != -(MATE + 1) {
                self.state.last_value = v;
            }

            #[cfg(feature = "logging")]
            log::debug!(
                "depth {} value {} nodes {} seldepth {} pv {:?}",
                depth,
                self.state.last_value,
                self.state.nodes,
                self.state.max_ply_reached,
                self.state.pv
            );

            if v >= min_value && v <= max_value {
                best_move = self.state.pv;
            }
            if v != MATE + 1 && !self.state.stop && v >= min_value && v <= max_value {
                depth += 4;
            }
        }

        if best_move != Move::NONE {
            best_move
        } else {
            self.state.pv
        }
    }

    /// Negamax with `lower`/`upper` as the alpha-beta window, `depth` in
    /// quarter-ply units (≤ 0 enters quiescence) and an optional move to
    /// exclude from this node.
    #[allow(clippy::too_many_lines)]
    fn alpha_beta(
        &mut self,
        depth: i32,
        ply: usize,
        mut lower: Value,
        upper: Value,
        skip_move: Move,
    ) -> Value {
        self.state.nodes += 1;
        self.state.max_ply_reached = self.state.max_ply_reached.max(ply as u64);

        let hash = self.board.hash();
        let slot = self.tt.probe(hash);
        // Copy the entry: the recursion below may recycle the slot.
        let entry = self.tt.entry(slot);
        let found = slot.found;

        if ply > 0 {
            // Draw adjudication. The insufficient-material rule is the
            // arena's, not FIDE's, and repetitions count on the second
            // occurrence.
            if self.board.halfmove_clock() >= 100
                || self.board.is_adjudicated_insufficient()
                || self.board.is_repetition()
            {
                return 0;
            }

            if ply >= MAX_PLY {
                if found {
                    let se = entry.search_eval();
                    if se != TT_NO_VALUE {
                        if entry.has_lower() && se >= upper {
                            return se;
                        }
                        if entry.has_upper() && se <= lower {
                            return se;
                        }
                    }
                    return entry.static_eval();
                }
                // Leaf past the ply horizon: evaluate without creating an
                // entry.
                return self.static_eval();
            }

            if self.state.nodes % NODES_PER_POLL == 0 {
                let out_of_time = self.started.elapsed() > self.budget;
                if out_of_time || (self.state.pondering && self.probe.input_ready()) {
                    self.state.stop = true;
                    return 0;
                }
            }
        }

        let mut best_value: Value = -(MATE + 1);
        let mut best_move = Move::NONE;

        // Transposition cutoff. At the root this only fires for completed
        // entries carrying a move, and never while pondering.
        if found && entry.depth() >= depth && skip_move == Move::NONE {
            let se = entry.search_eval();
            if se != TT_NO_VALUE
                && (ply > 0 || entry.best_move() != Move::NONE)
                && (ply > 0 || !self.state.pondering)
            {
                if entry.is_exact()
                    || (entry.has_lower() && se >= upper)
                    || (entry.has_upper() && se <= lower)
                {
                    if ply == 0 {
                        self.state.pv = entry.best_move();
                    }
                    return se;
                } else if entry.has_lower() {
                    // Not a cutoff, but a usable floor.
                    best_value = se;
                    best_move = entry.best_move();
                }
            }
        }

        let static_eval = if found {
            entry.static_eval()
        } else {
            self.static_eval()
        };
        self.state.static_evals[ply] = static_eval;

        let in_check = self.board.in_check();

        if ply + 1 < MAX_PLY {
            self.state.killers.clear_ply(ply + 1);
        }

        // Quiescence entry: stand pat, then captures only (all evasions when
        // in check).
        #[derive(PartialEq, Clone, Copy)]
        enum Mode {
            Evasions,
            Captures,
            Full,
        }

        let mut depth = depth;
        let mode;
        if depth <= 0 {
            depth = 0;
            if !in_check {
                best_value = best_value.max(static_eval);
            }
            if best_value >= upper {
                if !found {
                    self.tt.write(
                        slot,
                        hash,
                        Move::NONE,
                        static_eval,
                        best_value,
                        0,
                        tt::BOUND_LOWER,
                    );
                }
                return best_value;
            }
            if best_value > lower {
                lower = best_value;
            }
            mode = if in_check { Mode::Evasions } else { Mode::Captures };
        } else {
            mode = Mode::Full;
        }

        // Null-move pruning: hand the opponent a free move; if the reduced
        // zero-window search still fails high, the real move surely would.
        let mut null_eval = if found { entry.search_eval() } else { TT_NO_VALUE };
        if null_eval == TT_NO_VALUE {
            null_eval = static_eval;
        }
        if !in_check
            && ply > 1
            && skip_move == Move::NONE
            && null_eval >= upper
            && self.state.search_moves[ply - 1] != Move::NONE
            && self.board.has_non_pawn_material(self.board.side_to_move())
        {
            self.board.make_null_move();
            self.state.search_moves[ply] = Move::NONE;
            let null_value = -self.alpha_beta(
                depth - depth / 3 - 4,
                ply + 1,
                -upper,
                -upper + 1,
                Move::NONE,
            );
            self.board.unmake_null_move();
            if null_value >= upper {
                return null_value;
            }
        }

        let tt_move = if found { entry.best_move() } else { Move::NONE };

        let mut moves = MoveList::new();
        let mut generated = false;
        let mut in_tt_phase = true;
        let mut list_idx = 0usize;

        loop {
            let mv;
            let mv_score: Value;

            if in_tt_phase {
                in_tt_phase = false;
                mv = tt_move;
                mv_score = 0;
                if mv == Move::NONE || mv == skip_move {
                    continue;
                }
            } else {
                if !generated {
                    generated = true;
                    match mode {
                        Mode::Evasions => {
                            self.board.generate_moves_into(
                                &mut moves,
                                GenType::All,
                                piece_mask::ALL,
                            );
                            if moves.is_empty() {
                                return -MATE;
                            }
                            ordering::score_evasions(self.board, &mut moves);
                        }
                        Mode::Captures => {
                            self.board.generate_moves_into(
                                &mut moves,
                                GenType::Captures,
                                piece_mask::ALL,
                            );
                            let capture_count = moves.len();
                            ordering::score_qsearch_captures(
                                self.board,
                                &self.state.history,
                                &mut moves,
                                capture_count,
                            );
                            // Quiet pawn moves only contribute promotions.
                            self.board.generate_moves_into(
                                &mut moves,
                                GenType::Quiets,
                                piece_mask::PAWN,
                            );
                            ordering::filter_qsearch_quiet_pawns(&mut moves, capture_count);
                        }
                        Mode::Full => {
                            self.board.generate_moves_into(
                                &mut moves,
                                GenType::All,
                                piece_mask::ALL,
                            );
                            if moves.is_empty() {
                                return if in_check { -MATE } else { 0 };
                            }
                            ordering::score_main(self.board, &self.state.history, &mut moves);
                        }
                    }

                    if ply > 0 {
                        ordering::boost_killers(&mut moves, &self.state.killers.at(ply));
                    }
                    ordering::sort_moves(&mut moves);
                }

                if list_idx >= moves.len() {
                    break;
                }
                mv = moves.get(list_idx);
                mv_score = moves.score(list_idx);
                list_idx += 1;

                if found && mv == tt_move {
                    continue;
                }
                if mv == Move::NONE || mv == skip_move {
                    continue;
                }
            }

            // Keep a fallback at the root in case the search is interrupted
            // before anything completes.
            if ply == 0 && self.state.pv == Move::NONE {
                self.state.pv = mv;
            }

            let depth_reduction = if in_check { 1 } else { 4 };

            // Late-move reduction: a cheap null-window probe for moves the
            // ordering already dislikes; a fail-low skips the full search.
            if (ply > 0 || best_move != Move::NONE) && depth > 11 && mv_score < 0 {
                self.board.make_move(mv);
                self.state.search_moves[ply] = mv;
                let probe_value =
                    -self.alpha_beta(depth - 8, ply + 1, -lower, -lower + 1, Move::NONE);
                self.board.unmake_move(mv);

                if probe_value < lower {
                    if self.state.stop {
                        break;
                    }
                    continue;
                }
            }

            self.board.make_move(mv);
            self.state.search_moves[ply] = mv;
            let value = mate_counter(-self.alpha_beta(
                depth - depth_reduction,
                ply + 1,
                -upper,
                -lower,
                Move::NONE,
            ));
            self.board.unmake_move(mv);

            if self.state.stop {
                break;
            }

            if value > lower {
                lower = value;
            }
            if value > best_value {
                best_value = value;
                best_move = mv;
                if ply == 0 {
                    self.state.pv = mv;
                }
            }

            // Fail high.
            if value > upper {
                if skip_move == Move::NONE {
                    self.tt.write(
                        slot,
                        hash,
                        best_move,
                        static_eval,
                        best_value,
                        depth,
                        tt::BOUND_LOWER,
                    );
                }
                let tried = list_idx.saturating_sub(1);
                self.state
                    .history
                    .update_batch(self.board, &moves, tried, best_move, depth);
                if ordering::is_quiet_for_killers(self.board, best_move) {
                    self.state.killers.insert(ply, best_move);
                }
                return value;
            }
        }

        // Interrupted nodes must not pollute the table.
        if !self.state.stop {
            if skip_move == Move::NONE {
                let bound = if best_value >= lower {
                    tt::BOUND_EXACT
                } else {
                    tt::BOUND_UPPER
                };
                self.tt
                    .write(slot, hash, best_move, static_eval, best_value, depth, bound);
            }
            if best_value >= lower {
                self.state.history.update_batch(
                    self.board,
                    &moves,
                    moves.len(),
                    best_move,
                    depth,
                );
            }
        }

        best_value
    }
}
