//! Precomputed attack tables.
//!
//! Leaper attacks (pawn, knight, king) and the between-squares table are
//! filled lazily at first use. Sliding attacks have two interchangeable
//! carriages: magic bitboards (default) and BMI2 PEXT rook extraction behind
//! the `pext` feature; both resolve identical attack sets.

mod magic;

#[cfg(all(feature = "pext", target_arch = "x86_64"))]
mod pext;

use once_cell::sync::Lazy;

use super::types::{Bitboard, Color, Square};

pub(crate) use magic::{bishop_rays, rook_rays};

static KNIGHT_ATTACKS: Lazy<[u64; 64]> = Lazy::new(|| {
    let deltas = [
        (2, 1),
        (1, 2),
        (-1, 2),
        (-2, 1),
        (-2, -1),
        (-1, -2),
        (1, -2),
        (2, -1),
    ];
    leaper_table(&deltas)
});

static KING_ATTACKS: Lazy<[u64; 64]> = Lazy::new(|| {
    let deltas = [
        (1, 0),
        (-1, 0),
        (0, 1),
        (0, -1),
        (1, 1),
        (1, -1),
        (-1, 1),
        (-1, -1),
    ];
    leaper_table(&deltas)
});

static PAWN_ATTACKS: Lazy<[[u64; 64]; 2]> = Lazy::new(|| {
    let white = leaper_table(&[(1, -1), (1, 1)]);
    let black = leaper_table(&[(-1, -1), (-1, 1)]);
    [white, black]
});

fn leaper_table(deltas: &[(isize, isize)]) -> [u64; 64] {
    let mut table = [0u64; 64];
    for (sq, slot) in table.iter_mut().enumerate() {
        let r = (sq / 8) as isize;
        let f = (sq % 8) as isize;
        let mut mask = 0u64;
        for &(dr, df) in deltas {
            let nr = r + dr;
            let nf = f + df;
            if (0..8).contains(&nr) && (0..8).contains(&nf) {
                mask |= 1u64 << (nr * 8 + nf);
            }
        }
        *slot = mask;
    }
    table
}

/// Squares strictly between two squares on a shared rank, file or diagonal,
/// empty otherwise (and for identical squares).
static BETWEEN: Lazy<Box<[[u64; 64]; 64]>> = Lazy::new(|| {
    let mut table = vec![[0u64; 64]; 64];
    for a in 0..64usize {
        for b in 0..64usize {
            if a == b {
                continue;
            }
            let endpoints = (1u64 << a) | (1u64 << b);
            let (ar, af) = (a / 8, a % 8);
            let (br, bf) = (b / 8, b % 8);
            if ar == br || af == bf {
                table[a][b] = rook_rays(a, endpoints) & rook_rays(b, endpoints);
            } else if ar + bf == br + af || ar + af == br + bf {
                table[a][b] = bishop_rays(a, endpoints) & bishop_rays(b, endpoints);
            }
        }
    }
    table
        .into_boxed_slice()
        .try_into()
        .expect("between table has 64 rows")
});

#[inline]
pub(crate) fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    Bitboard(PAWN_ATTACKS[color.index()][sq.index()])
}

#[inline]
pub(crate) fn knight_attacks(sq: Square) -> Bitboard {
    Bitboard(KNIGHT_ATTACKS[sq.index()])
}

#[inline]
pub(crate) fn king_attacks(sq: Square) -> Bitboard {
    Bitboard(KING_ATTACKS[sq.index()])
}

#[inline]
pub(crate) fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    Bitboard(magic::bishop_attacks(sq.index(), occupied.0))
}

#[cfg(all(feature = "pext", target_arch = "x86_64"))]
#[inline]
pub(crate) fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    Bitboard(pext::rook_attacks(sq.index(), occupied.0))
}

#[cfg(not(all(feature = "pext", target_arch = "x86_64")))]
#[inline]
pub(crate) fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    Bitboard(magic::rook_attacks(sq.index(), occupied.0))
}

#[inline]
pub(crate) fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)
}

#[inline]
pub(crate) fn between(a: Square, b: Square) -> Bitboard {
    Bitboard(BETWEEN[a.index()][b.index()])
}

/// One-step pawn capture shifts over a whole pawn set, "left" and "right"
/// from the mover's own point of view.
#[inline]
pub(crate) fn pawn_left_attacks(color: Color, pawns: Bitboard) -> Bitboard {
    match color {
        Color::White => pawns.north_west(),
        Color::Black => pawns.south_east(),
    }
}

#[inline]
pub(crate) fn pawn_right_attacks(color: Color, pawns: Bitboard) -> Bitboard {
    match color {
        Color::White => pawns.north_east(),
        Color::Black => pawns.south_west(),
    }
}
