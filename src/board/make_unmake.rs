//! Move make/unmake with incremental hash maintenance.

use crate::zobrist;

use super::attack_tables;
use super::state::{Board, PieceSetListener, Undo};
use super::types::{CastleSide, Move, MoveKind, Piece, PieceType, Square};

impl<L: PieceSetListener> Board<L> {
    /// Apply a legal move. Every invariant listed on [`Board`] holds again on
    /// return; the prior state is pushed onto the undo ring.
    pub fn make_move(&mut self, mv: Move) {
        let stm = self.stm;
        let captures = self.at(mv.to()).is_some() && !mv.is_castling();
        let captured = self.at(mv.to());
        let moving_type = self
            .piece_type_at(mv.from())
            .expect("make_move source square is occupied");

        self.undo[self.plies] = Undo {
            hash: self.hash,
            castling: self.castling,
            ep_square: self.ep_square,
            halfmove_clock: self.halfmove_clock,
            captured,
        };
        self.plies += 1;

        let mut key = self.hash;
        self.halfmove_clock = self.halfmove_clock.wrapping_add(1);

        if let Some(old_ep) = self.ep_square.take() {
            key ^= zobrist::en_passant(old_ep.file());
        }

        if captures {
            let victim = captured.expect("capture flag implies a victim");
            self.remove_piece(victim, mv.to());
            self.halfmove_clock = 0;
            key ^= zobrist::piece(victim, mv.to());

            // A rook captured on its back rank may take a castling right
            // with it.
            if victim.piece_type() == PieceType::Rook && mv.to().on_back_rank(!stm) {
                let side = CastleSide::closest_to(mv.to(), self.king_square(!stm));
                if self.castling.rook_file(!stm, side) == Some(mv.to().file()) {
                    key ^= zobrist::castling_slot(self.castling.clear_one(!stm, side));
                }
            }
        }

        match moving_type {
            PieceType::King if self.castling.has_any(stm) => {
                key ^= zobrist::castling_mask(&self.castling);
                self.castling.clear_color(stm);
                key ^= zobrist::castling_mask(&self.castling);
            }
            PieceType::Rook if mv.from().on_back_rank(stm) => {
                let side = CastleSide::closest_to(mv.from(), self.king_square(stm));
                if self.castling.rook_file(stm, side) == Some(mv.from().file()) {
                    key ^= zobrist::castling_slot(self.castling.clear_one(stm, side));
                }
            }
            PieceType::Pawn => {
                self.halfmove_clock = 0;

                let diff = mv.to().index() as isize - mv.from().index() as isize;
                if diff.unsigned_abs() == 16 {
                    let skipped = mv.to().ep_counterpart();
                    // Record the square whenever an enemy pawn attacks it;
                    // whether the capture is actually legal is the move
                    // generator's problem.
                    let ep_attackers = attack_tables::pawn_attacks(stm, skipped)
                        & self.pieces_of(PieceType::Pawn, !stm);
                    if ep_attackers.any() {
                        self.ep_square = Some(skipped);
                        key ^= zobrist::en_passant(skipped.file());
                    }
                }
            }
            _ => {}
        }

        match mv.kind() {
            MoveKind::Castling => {
                let king_side = mv.to() > mv.from();
                let king_to = Square::castling_king_target(king_side, stm);
                let rook_to = Square::castling_rook_target(king_side, stm);
                let king = Piece::new(stm, PieceType::King);
                let rook = Piece::new(stm, PieceType::Rook);
                debug_assert_eq!(self.at(mv.from()), Some(king));
                debug_assert_eq!(self.at(mv.to()), Some(rook));

                self.remove_piece(king, mv.from());
                self.remove_piece(rook, mv.to());
                self.place_piece(king, king_to);
                self.place_piece(rook, rook_to);

                key ^= zobrist::piece(king, mv.from()) ^ zobrist::piece(king, king_to);
                key ^= zobrist::piece(rook, mv.to()) ^ zobrist::piece(rook, rook_to);
            }
            MoveKind::Promotion => {
                let pawn = Piece::new(stm, PieceType::Pawn);
                let promoted = Piece::new(stm, mv.promotion_type());
                self.remove_piece(pawn, mv.from());
                self.place_piece(promoted, mv.to());
                key ^= zobrist::piece(pawn, mv.from()) ^ zobrist::piece(promoted, mv.to());
            }
            _ => {
                let piece = self.at(mv.from()).expect("source still occupied");
                self.remove_piece(piece, mv.from());
                self.place_piece(piece, mv.to());
                key ^= zobrist::piece(piece, mv.from()) ^ zobrist::piece(piece, mv.to());
            }
        }

        if mv.kind() == MoveKind::EnPassant {
            let victim_sq = mv.to().ep_counterpart();
            let victim = Piece::new(!stm, PieceType::Pawn);
            debug_assert_eq!(self.at(victim_sq), Some(victim));
            self.remove_piece(victim, victim_sq);
            key ^= zobrist::piece(victim, victim_sq);
        }

        key ^= zobrist::side_to_move();
        self.stm = !stm;
        self.hash = key;
    }

    /// Revert the most recent [`make_move`](Board::make_move). Must be paired
    /// LIFO with it; the hash comes back from the saved frame rather than
    /// being recomputed.
    pub fn unmake_move(&mut self, mv: Move) {
        self.plies -= 1;
        let prev = self.undo[self.plies];

        self.ep_square = prev.ep_square;
        self.castling = prev.castling;
        self.halfmove_clock = prev.halfmove_clock;
        self.stm = !self.stm;
        let stm = self.stm;

        match mv.kind() {
            MoveKind::Castling => {
                let king_side = mv.to() > mv.from();
                let rook_from = Square::castling_rook_target(king_side, stm);
                let king_from = Square::castling_king_target(king_side, stm);
                let king = Piece::new(stm, PieceType::King);
                let rook = Piece::new(stm, PieceType::Rook);
                debug_assert_eq!(self.at(rook_from), Some(rook));
                debug_assert_eq!(self.at(king_from), Some(king));

                self.remove_piece(rook, rook_from);
                self.remove_piece(king, king_from);
                self.place_piece(king, mv.from());
                self.place_piece(rook, mv.to());

                self.hash = prev.hash;
                return;
            }
            MoveKind::Promotion => {
                let promoted = Piece::new(stm, mv.promotion_type());
                let pawn = Piece::new(stm, PieceType::Pawn);
                self.remove_piece(promoted, mv.to());
                self.place_piece(pawn, mv.from());
                if let Some(victim) = prev.captured {
                    self.place_piece(victim, mv.to());
                }
                self.hash = prev.hash;
                return;
            }
            _ => {
                let piece = self.at(mv.to()).expect("moved piece sits on the target");
                self.remove_piece(piece, mv.to());
                self.place_piece(piece, mv.from());
            }
        }

        if mv.kind() == MoveKind::EnPassant {
            let pawn = Piece::new(!stm, PieceType::Pawn);
            self.place_piece(pawn, mv.to().ep_counterpart());
        } else if let Some(victim) = prev.captured {
            self.place_piece(victim, mv.to());
        }

        self.hash = prev.hash;
    }

    /// Give the move to the opponent: flip the side, clear the en-passant
    /// square, save a frame. No piece moves.
    pub fn make_null_move(&mut self) {
        self.undo[self.plies] = Undo {
            hash: self.hash,
            castling: self.castling,
            ep_square: self.ep_square,
            halfmove_clock: self.halfmove_clock,
            captured: None,
        };
        self.plies += 1;

        let mut key = self.hash ^ zobrist::side_to_move();
        if let Some(old_ep) = self.ep_square.take() {
            key ^= zobrist::en_passant(old_ep.file());
        }
        self.stm = !self.stm;
        self.hash = key;
    }

    pub fn unmake_null_move(&mut self) {
        self.plies -= 1;
        let prev = self.undo[self.plies];
        self.ep_square = prev.ep_square;
        self.castling = prev.castling;
        self.halfmove_clock = prev.halfmove_clock;
        self.hash = prev.hash;
        self.stm = !self.stm;
    }
}
