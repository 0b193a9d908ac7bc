//! End-to-end protocol scenarios over a scripted command source.

use kestrel::engine::{protocol, LoopExit, ScriptedInput};
use kestrel::Engine;

/// Run a command script and return (exit, emitted lines).
fn run_script<I, S>(lines: I) -> (LoopExit, Vec<String>)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut engine = Engine::new();
    let mut input = ScriptedInput::new(lines);
    let mut out: Vec<u8> = Vec::new();

    let exit = protocol::run(&mut engine, &mut input, &mut out).expect("in-memory io");
    let text = String::from_utf8(out).expect("protocol output is ascii");
    (exit, text.lines().map(str::to_string).collect())
}

/// The move the engine emitted for the `n`-th search (the line after the
/// `Mvalue=` line).
fn chosen_move(lines: &[String], n: usize) -> &str {
    let mut seen = 0;
    for (i, line) in lines.iter().enumerate() {
        if line.starts_with("Mvalue=") {
            if seen == n {
                return &lines[i + 1];
            }
            seen += 1;
        }
    }
    panic!("no move line for search {n} in {lines:?}");
}

#[test]
fn startup_banner_reports_version_and_table_size() {
    let (exit, lines) = run_script(["q"]);
    assert_eq!(exit, LoopExit::Quit);
    assert!(lines[0].starts_with('M'));
    assert!(lines[1].starts_with("MTT"));
    let clusters: usize = lines[1][3..].parse().unwrap();
    assert_eq!(clusters, Engine::new().tt_cluster_count());
}

#[test]
fn fools_mate_scenario() {
    let (_, lines) = run_script([
        "frnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2",
        "q",
    ]);
    assert_eq!(chosen_move(&lines, 0), "d8h4");

    // The full emission set is present.
    assert!(lines.iter().any(|l| l.starts_with("Mtime=")));
    assert!(lines.iter().any(|l| l.starts_with("Mnodes=")));
    assert!(lines.iter().any(|l| l.starts_with("Mvalue=")));
    assert!(lines.iter().any(|l| l.starts_with("Mponder_nodes=")));
}

#[test]
fn back_rank_mate_scenario() {
    let (_, lines) = run_script(["f6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", "q"]);
    assert_eq!(chosen_move(&lines, 0), "a1a8");
}

#[test]
fn castling_through_attack_never_emitted() {
    let (_, lines) = run_script(["fr3k2r/8/8/8/8/4b3/8/R3K2R w KQkq - 0 1", "q"]);
    assert_ne!(chosen_move(&lines, 0), "e1g1");
}

#[test]
fn opponent_move_opcode_scales_the_budget() {
    // '!' = 33: apply e2e4 and think for (33-32)*20 = 20 ms.
    let (_, lines) = run_script(["!e2e4", "q"]);
    let mv = chosen_move(&lines, 0);
    assert_eq!(mv.len(), 4);
    // The reply must be a black move.
    assert!(mv.as_bytes()[1] == b'7' || mv.as_bytes()[1] == b'8');
}

#[test]
fn ponder_interrupt_emits_node_count() {
    let (_, lines) = run_script(["f6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", "q"]);
    let ponder_line = lines
        .iter()
        .find(|l| l.starts_with("Mponder_nodes="))
        .expect("ponder line");
    let nodes: u64 = ponder_line["Mponder_nodes=".len()..].parse().unwrap();
    // Input (the quit line) was pending the whole time, so pondering must
    // stop within a few poll intervals.
    assert!(nodes <= 3 * 4096, "pondered {nodes} nodes");
}

#[test]
fn malformed_move_squares_abort_the_loop() {
    let (exit, _) = run_script(["!zz9q"]);
    assert_eq!(exit, LoopExit::BadMove);
}

#[test]
fn malformed_promotion_is_reported_but_not_fatal() {
    // A pawn-to-back-rank move with a junk promotion letter: reported on
    // the protocol stream, not played, and the loop keeps going.
    let (exit, lines) = run_script(["!a7a8x", "q"]);
    assert_eq!(exit, LoopExit::Quit);
    assert!(lines.iter().any(|l| l == "Bad move"));
    // The search still ran from the unchanged position.
    assert!(lines.iter().any(|l| l.starts_with("Mvalue=")));
}

#[test]
fn quit_opcode_exits_cleanly() {
    let (exit, lines) = run_script(["q"]);
    assert_eq!(exit, LoopExit::Quit);
    // Nothing beyond the banner was emitted.
    assert_eq!(lines.len(), 2);
}
