//! The one-line command protocol.
//!
//! Each command is a single line whose first byte selects the action:
//! `q` quits, `f` loads a FEN and searches for 500 ms, and any other
//! printable byte `c` applies the following UCI move and searches for
//! `(c - 32) * 20` ms. Every search answers with `Mtime=`/`Mnodes=`/
//! `Mvalue=` lines and the chosen move, then the engine plays its own move,
//! compacts the history and ponders until the next line arrives.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crate::board::{Board, Move, MoveKind, MoveParseError, PieceSetListener, PieceType, Square};

use super::io::CommandSource;
use super::Engine;

/// Budget for the FEN-set search.
const FEN_SEARCH_BUDGET: Duration = Duration::from_millis(500);
/// Budget granularity of the move opcode.
const MOVE_BUDGET_STEP_MS: u64 = 20;

/// Why the command loop returned.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoopExit {
    /// `q` received or input closed.
    Quit,
    /// An unparseable external move; the process should exit non-zero.
    BadMove,
}

/// Parse a UCI move (`<file><rank><file><rank>[nbrq]`) against the current
/// position.
///
/// A king moving two files becomes the king-takes-corner-rook castling
/// encoding; a pawn landing on the en-passant square becomes an en-passant
/// capture; a promotion letter is validated but other trailing bytes are
/// ignored.
pub fn parse_uci_move<L: PieceSetListener>(
    board: &Board<L>,
    input: &str,
) -> Result<Move, MoveParseError> {
    let input = input.trim();
    let bad_square = || MoveParseError::InvalidSquare {
        notation: input.to_string(),
    };

    let source: Square = input
        .get(0..2)
        .and_then(|s| s.parse().ok())
        .ok_or_else(bad_square)?;
    let target: Square = input
        .get(2..4)
        .and_then(|s| s.parse().ok())
        .ok_or_else(bad_square)?;

    let piece = board.piece_type_at(source);

    // King sliding two files is castling, re-encoded onto the corner rook.
    if piece == Some(PieceType::King) && chebyshev(source, target) == 2 {
        let rook_file = if target > source { 7 } else { 0 };
        let rook_sq = Square::from_coords(rook_file, source.rank());
        return Ok(Move::castling(source, rook_sq));
    }

    if piece == Some(PieceType::Pawn) && board.en_passant_square() == Some(target) {
        return Ok(Move::en_passant(source, target));
    }

    if piece == Some(PieceType::Pawn) && target.on_back_rank(!board.side_to_move()) {
        if let Some(promo) = input.as_bytes().get(4).copied().filter(|&b| b > b'a') {
            let promotion = match promo {
                b'n' => PieceType::Knight,
                b'b' => PieceType::Bishop,
                b'r' => PieceType::Rook,
                b'q' => PieceType::Queen,
                other => {
                    return Err(MoveParseError::InvalidPromotion {
                        char: other as char,
                    })
                }
            };
            return Ok(Move::promotion(source, target, promotion));
        }
    }

    Ok(Move::normal(source, target))
}

/// Format a move for emission. Castling is shown as the king's true
/// destination (G or C file), not the internal rook-capture encoding.
#[must_use]
pub fn format_uci_move(mv: Move) -> String {
    let from = mv.from();
    let to = if mv.is_castling() {
        let file = if mv.to() > mv.from() { 6 } else { 2 };
        Square::from_coords(file, from.rank())
    } else {
        mv.to()
    };

    let mut out = format!("{from}{to}");
    if mv.kind() == MoveKind::Promotion {
        out.push(mv.promotion_type().to_char());
    }
    out
}

fn chebyshev(a: Square, b: Square) -> usize {
    let df = a.file().abs_diff(b.file());
    let dr = a.rank().abs_diff(b.rank());
    df.max(dr)
}

/// Drive the engine over a command source until quit, EOF or a fatal input
/// error.
pub fn run<S: CommandSource, W: Write>(
    engine: &mut Engine,
    input: &mut S,
    out: &mut W,
) -> io::Result<LoopExit> {
    writeln!(out, "M{}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "MTT{}", engine.tt_cluster_count())?;
    out.flush()?;

    while let Some(line) = input.read_command() {
        let received = Instant::now();
        let Some(&opcode) = line.as_bytes().first() else {
            continue;
        };

        let budget;
        match opcode {
            b'q' => return Ok(LoopExit::Quit),
            b'f' => {
                if let Err(err) = engine.set_position_from_fen(line.get(1..).unwrap_or("")) {
                    eprintln!("bad fen: {err}");
                    continue;
                }
                budget = FEN_SEARCH_BUDGET;
            }
            c if c >= 32 => {
                match engine.apply_external_move(line.get(1..).unwrap_or("")) {
                    Ok(_) => {}
                    Err(MoveParseError::InvalidSquare { .. }) => {
                        eprintln!("Bad move");
                        return Ok(LoopExit::BadMove);
                    }
                    Err(MoveParseError::InvalidPromotion { .. }) => {
                        // Reported on the protocol stream; the move is not
                        // played and the search proceeds from the unchanged
                        // position.
                        writeln!(out, "Bad move")?;
                    }
                }
                budget = Duration::from_millis(u64::from(c - 32) * MOVE_BUDGET_STEP_MS);
            }
            _ => continue,
        }

        let report = engine.search_with_budget(budget);

        writeln!(out, "Mtime={}", received.elapsed().as_millis())?;
        writeln!(out, "Mnodes={}", report.nodes)?;
        writeln!(out, "Mvalue={}", report.value)?;
        writeln!(out, "{}", format_uci_move(report.best_move))?;
        out.flush()?;

        if report.best_move != Move::NONE {
            engine.apply_move(report.best_move);
        }
        engine.compact();

        let ponder_nodes = engine.ponder_until_input(input);
        writeln!(out, "Mponder_nodes={ponder_nodes}")?;
        out.flush()?;
    }

    Ok(LoopExit::Quit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::NullListener;

    fn board(fen: &str) -> Board<NullListener> {
        let mut b = Board::empty();
        b.set_from_fen(fen).unwrap();
        b
    }

    #[test]
    fn plain_moves_parse() {
        let b: Board<NullListener> = Board::new();
        let mv = parse_uci_move(&b, "e2e4").unwrap();
        assert_eq!(mv, Move::normal("e2".parse().unwrap(), "e4".parse().unwrap()));
    }

    #[test]
    fn castling_translates_to_rook_capture_encoding() {
        let b = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let mv = parse_uci_move(&b, "e1g1").unwrap();
        assert!(mv.is_castling());
        assert_eq!(mv.to(), Square::H1);

        let mv = parse_uci_move(&b, "e1c1").unwrap();
        assert!(mv.is_castling());
        assert_eq!(mv.to(), Square::A1);
    }

    #[test]
    fn ep_target_square_becomes_en_passant() {
        let b = board("rnbqkbnr/pppp1ppp/8/8/3Pp3/8/PPP1PPPP/RNBQKBNR b KQkq d3 0 2");
        let mv = parse_uci_move(&b, "e4d3").unwrap();
        assert!(mv.is_en_passant());
    }

    #[test]
    fn promotions_parse_and_validate() {
        let b = board("8/P7/8/8/8/8/k7/4K3 w - - 0 1");
        let mv = parse_uci_move(&b, "a7a8q").unwrap();
        assert_eq!(mv.kind(), MoveKind::Promotion);
        assert_eq!(mv.promotion_type(), PieceType::Queen);

        let err = parse_uci_move(&b, "a7a8x").unwrap_err();
        assert!(matches!(err, MoveParseError::InvalidPromotion { char: 'x' }));
    }

    #[test]
    fn malformed_squares_are_fatal_parse_errors() {
        let b: Board<NullListener> = Board::new();
        assert!(matches!(
            parse_uci_move(&b, "zz9q"),
            Err(MoveParseError::InvalidSquare { .. })
        ));
        assert!(matches!(
            parse_uci_move(&b, "e2"),
            Err(MoveParseError::InvalidSquare { .. })
        ));
    }

    #[test]
    fn formatting_round_trips_and_unfolds_castling() {
        assert_eq!(
            format_uci_move(Move::normal(
                "e2".parse().unwrap(),
                "e4".parse().unwrap()
            )),
            "e2e4"
        );
        assert_eq!(
            format_uci_move(Move::castling(Square::E1, Square::H1)),
            "e1g1"
        );
        assert_eq!(
            format_uci_move(Move::castling(Square::E1, Square::A1)),
            "e1c1"
        );
        assert_eq!(
            format_uci_move(Move::promotion(
                "a7".parse().unwrap(),
                "a8".parse().unwrap(),
                PieceType::Queen
            )),
            "a7a8q"
        );
    }
}
