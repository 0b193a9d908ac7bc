//! Property tests: random legal play must preserve every board invariant.

use proptest::prelude::*;

use kestrel::board::{Board, Color, NullListener, PieceType};

fn invariants_hold(b: &Board<NullListener>) -> bool {
    let white = b.us(Color::White);
    let black = b.us(Color::Black);
    if !(white & black).is_empty() {
        return false;
    }

    let mut union = kestrel::board::Bitboard::EMPTY;
    for pt in PieceType::ALL {
        union |= b.pieces(pt);
    }
    if white | black != union {
        return false;
    }

    if b.pieces_of(PieceType::King, Color::White).popcount() != 1
        || b.pieces_of(PieceType::King, Color::Black).popcount() != 1
    {
        return false;
    }

    b.hash() == b.full_zobrist()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Play a random legal line, checking the invariants at every step,
    /// then unwind it and require the starting state back, hash included.
    #[test]
    fn random_play_preserves_invariants(choices in proptest::collection::vec(0usize..256, 1..40)) {
        let mut board: Board<NullListener> = Board::new();
        let initial_hash = board.hash();
        let mut line = Vec::new();

        for choice in choices {
            let moves = board.generate_moves();
            if moves.is_empty() {
                break;
            }
            let mv = moves.get(choice % moves.len());
            board.make_move(mv);
            line.push(mv);

            prop_assert!(invariants_hold(&board));
        }

        for mv in line.into_iter().rev() {
            board.unmake_move(mv);
            prop_assert!(invariants_hold(&board));
        }
        prop_assert_eq!(board.hash(), initial_hash);
    }

    /// Every generated move must pass the brute-force legality check.
    #[test]
    fn generated_moves_are_always_legal(choices in proptest::collection::vec(0usize..256, 1..24)) {
        let mut board: Board<NullListener> = Board::new();

        for choice in choices {
            let moves = board.generate_moves();
            if moves.is_empty() {
                break;
            }
            for mv in moves.iter() {
                prop_assert!(board.leaves_king_safe(mv));
            }
            let mv = moves.get(choice % moves.len());
            board.make_move(mv);
        }
    }

    /// Null moves never disturb anything but the side to move and the
    /// en-passant square.
    #[test]
    fn null_moves_round_trip_anywhere(choices in proptest::collection::vec(0usize..256, 0..16)) {
        let mut board: Board<NullListener> = Board::new();
        for choice in choices {
            let moves = board.generate_moves();
            if moves.is_empty() {
                break;
            }
            board.make_move(moves.get(choice % moves.len()));
        }

        let hash = board.hash();
        let side = board.side_to_move();
        board.make_null_move();
        board.unmake_null_move();
        prop_assert_eq!(board.hash(), hash);
        prop_assert_eq!(board.side_to_move(), side);
        prop_assert!(invariants_hold(&board));
    }
}
