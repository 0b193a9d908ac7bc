//! Pawn move generation, monomorphized per color so the push direction and
//! the promotion/double-push ranks are compile-time constants.

use super::super::state::{Board, PieceSetListener};
use super::super::types::{Bitboard, Color, Move, MoveList, PieceType, Square};
use super::GenType;

#[inline]
const fn color<const WHITE: bool>() -> Color {
    if WHITE {
        Color::White
    } else {
        Color::Black
    }
}

#[inline]
fn up<const WHITE: bool>(bb: Bitboard) -> Bitboard {
    if WHITE {
        bb.north()
    } else {
        bb.south()
    }
}

/// Capture towards the a-file from the mover's point of view.
#[inline]
fn up_left<const WHITE: bool>(bb: Bitboard) -> Bitboard {
    if WHITE {
        bb.north_west()
    } else {
        bb.south_east()
    }
}

/// Capture towards the h-file from the mover's point of view.
#[inline]
fn up_right<const WHITE: bool>(bb: Bitboard) -> Bitboard {
    if WHITE {
        bb.north_east()
    } else {
        bb.south_west()
    }
}

const fn down_delta<const WHITE: bool>() -> i8 {
    if WHITE {
        -8
    } else {
        8
    }
}

/// Reverse of [`up_right`]: recovers the source of a right capture.
const fn down_left_delta<const WHITE: bool>() -> i8 {
    if WHITE {
        -9
    } else {
        9
    }
}

/// Reverse of [`up_left`]: recovers the source of a left capture.
const fn down_right_delta<const WHITE: bool>() -> i8 {
    if WHITE {
        -7
    } else {
        7
    }
}

fn push_promotions(moves: &mut MoveList, to: Square, from: Square) {
    moves.push(Move::promotion(from, to, PieceType::Queen));
    moves.push(Move::promotion(from, to, PieceType::Rook));
    moves.push(Move::promotion(from, to, PieceType::Bishop));
    moves.push(Move::promotion(from, to, PieceType::Knight));
}

pub(super) fn generate<const WHITE: bool, L: PieceSetListener>(
    board: &Board<L>,
    gt: GenType,
    moves: &mut MoveList,
    pin_d: Bitboard,
    pin_hv: Bitboard,
    checkmask: Bitboard,
    occ_opp: Bitboard,
) {
    let us = color::<WHITE>();
    let occ = board.occupied();

    // Relative ranks: promotion source, promotion target, and the rank a
    // single push from the initial rank lands on.
    let pre_promo_rank = Bitboard::rank_mask(if WHITE { 6 } else { 1 });
    let promo_rank = Bitboard::rank_mask(if WHITE { 7 } else { 0 });
    let double_push_rank = Bitboard::rank_mask(if WHITE { 2 } else { 5 });

    let pawns = board.pieces_of(PieceType::Pawn, us);

    // Straight-pinned pawns can never capture; diagonally pinned pawns may
    // capture only along their pin ray.
    let pawns_lr = pawns & !pin_hv;
    let unpinned_lr = pawns_lr & !pin_d;
    let pinned_lr = pawns_lr & pin_d;

    let mut left = up_left::<WHITE>(unpinned_lr) | (up_left::<WHITE>(pinned_lr) & pin_d);
    let mut right = up_right::<WHITE>(unpinned_lr) | (up_right::<WHITE>(pinned_lr) & pin_d);
    left &= occ_opp & checkmask;
    right &= occ_opp & checkmask;

    // Diagonally pinned pawns can never push; straight-pinned pawns may push
    // only along their file.
    let pawns_fwd = pawns & !pin_d;
    let pinned_fwd = pawns_fwd & pin_hv;
    let unpinned_fwd = pawns_fwd & !pin_hv;

    let push_unpinned = up::<WHITE>(unpinned_fwd) & !occ;
    let push_pinned = up::<WHITE>(pinned_fwd) & pin_hv & !occ;

    let mut single_push = (push_unpinned | push_pinned) & checkmask;
    let double_push = (up::<WHITE>(push_unpinned & double_push_rank) & !occ
        | up::<WHITE>(push_pinned & double_push_rank) & !occ)
        & checkmask;

    if (pawns & pre_promo_rank).any() {
        let promo_left = left & promo_rank;
        let promo_right = right & promo_rank;
        let promo_push = single_push & promo_rank;

        if gt != GenType::Quiets {
            for to in promo_left {
                push_promotions(moves, to, to.offset(down_right_delta::<WHITE>()));
            }
            for to in promo_right {
                push_promotions(moves, to, to.offset(down_left_delta::<WHITE>()));
            }
        }
        if gt != GenType::Captures {
            for to in promo_push {
                push_promotions(moves, to, to.offset(down_delta::<WHITE>()));
            }
        }
    }

    single_push &= !promo_rank;
    left &= !promo_rank;
    right &= !promo_rank;

    if gt != GenType::Quiets {
        for to in left {
            moves.push(Move::normal(to.offset(down_right_delta::<WHITE>()), to));
        }
        for to in right {
            moves.push(Move::normal(to.offset(down_left_delta::<WHITE>()), to));
        }
    }

    if gt != GenType::Captures {
        for to in single_push {
            moves.push(Move::normal(to.offset(down_delta::<WHITE>()), to));
        }
        for to in double_push {
            moves.push(Move::normal(to.offset(2 * down_delta::<WHITE>()), to));
        }
    }

    if gt == GenType::Quiets {
        return;
    }

    if let Some(ep) = board.en_passant_square() {
        for mv in board.ep_moves(checkmask, pin_d, pawns_lr, ep, us) {
            if mv != Move::NONE {
                moves.push(mv);
            }
        }
    }
}
