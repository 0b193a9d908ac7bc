//! BMI2 PEXT rook lookups.
//!
//! Trades two 64x64 tables per direction for a PEXT extraction instead of the
//! magic multiply: the vertical ray indexes with the file mask
//! `0x01010101010100 << file`, the horizontal ray with the rank mask
//! `126 << 8*rank`. Bishops stay on the magic carriage.

use once_cell::sync::Lazy;

use super::magic::rook_rays;

/// Vertical rook attacks per (square, 6-bit file occupancy).
static V_ROOK: Lazy<Box<[[u64; 64]; 64]>> = Lazy::new(|| {
    let mut table = vec![[0u64; 64]; 64];
    for sq in 0..64 {
        let file = sq % 8;
        for occ6 in 0..64u64 {
            // Expand the 6 occupancy bits onto ranks 2..7, all files.
            let ranks = ((occ6 & 1) << 8)
                + ((occ6 & 2) << 15)
                + ((occ6 & 4) << 22)
                + ((occ6 & 8) << 29)
                + ((occ6 & 16) << 36)
                + ((occ6 & 32) << 43);
            let occupied = 255u64.wrapping_mul(ranks);
            table[sq][occ6 as usize] =
                rook_rays(sq, occupied) & (0x0101_0101_0101_0101u64 << file);
        }
    }
    table
        .into_boxed_slice()
        .try_into()
        .expect("table has 64 rows")
});

/// Horizontal rook attacks per (square, 6-bit rank occupancy).
static H_ROOK: Lazy<Box<[[u64; 64]; 64]>> = Lazy::new(|| {
    let mut table = vec![[0u64; 64]; 64];
    for sq in 0..64 {
        let rank = sq / 8;
        for occ6 in 0..64u64 {
            // Expand the 6 occupancy bits onto files b..g, all ranks.
            let occupied = occ6 * 2 * 0x0101_0101_0101_0101;
            table[sq][occ6 as usize] = rook_rays(sq, occupied) & (0xFFu64 << (rank * 8));
        }
    }
    table
        .into_boxed_slice()
        .try_into()
        .expect("table has 64 rows")
});

#[inline]
fn pext(bits: u64, mask: u64) -> u64 {
    // SAFETY: the `pext` build is only meaningful on BMI2 hardware; the
    // default build uses the magic carriage instead.
    unsafe { core::arch::x86_64::_pext_u64(bits, mask) }
}

#[inline]
pub(crate) fn rook_attacks(sq: usize, occupied: u64) -> u64 {
    let file = sq % 8;
    let rank = sq / 8;
    let v = pext(occupied, 0x0001_0101_0101_0100u64 << file) as usize;
    let h = pext(occupied, 126u64 << (rank * 8)) as usize;
    V_ROOK[sq][v] | H_ROOK[sq][h]
}
