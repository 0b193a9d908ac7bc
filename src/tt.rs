//! Cluster-associative transposition table.
//!
//! Open addressing with five 12-byte entries per 64-byte cluster. The
//! cluster index is the high word of the 128-bit product of cluster count
//! and hash (a fast-mod). Only 32 bits of the hash verify an entry; within a
//! cluster a collision can alias at large scale, which is accepted for
//! density.

use crate::board::Move;
use crate::search::Value;

/// Sentinel for "no stored eval".
pub const TT_NO_VALUE: Value = Value::MIN;

pub const BOUND_EMPTY: u8 = 0;
pub const BOUND_LOWER: u8 = 1;
pub const BOUND_UPPER: u8 = 2;
pub const BOUND_EXACT: u8 = 3;

/// Default table size: 49152 clusters = 3 MiB.
pub const DEFAULT_TT_CLUSTERS: usize = 49152;

const ENTRIES_PER_CLUSTER: usize = 5;

/// One stored position. 12 bytes.
#[derive(Clone, Copy)]
pub struct TtEntry {
    hash32: u32,
    mv: u16,
    static_eval: Value,
    search_eval: Value,
    depth: u8,
    /// Generation in the high 6 bits, bound kind in the low 2.
    gen_bound: u8,
}

impl TtEntry {
    const EMPTY: TtEntry = TtEntry {
        hash32: 0,
        mv: 0,
        static_eval: TT_NO_VALUE,
        search_eval: TT_NO_VALUE,
        depth: 0,
        gen_bound: BOUND_EMPTY,
    };

    #[inline]
    #[must_use]
    pub fn best_move(&self) -> Move {
        Move::from_raw(self.mv)
    }

    #[inline]
    #[must_use]
    pub fn static_eval(&self) -> Value {
        self.static_eval
    }

    #[inline]
    #[must_use]
    pub fn search_eval(&self) -> Value {
        self.search_eval
    }

    #[inline]
    #[must_use]
    pub fn depth(&self) -> i32 {
        i32::from(self.depth)
    }

    #[inline]
    #[must_use]
    pub fn bound(&self) -> u8 {
        self.gen_bound & 3
    }

    /// The stored eval is a lower bound (LOWER or EXACT).
    #[inline]
    #[must_use]
    pub fn has_lower(&self) -> bool {
        self.gen_bound & BOUND_LOWER != 0
    }

    /// The stored eval is an upper bound (UPPER or EXACT).
    #[inline]
    #[must_use]
    pub fn has_upper(&self) -> bool {
        self.gen_bound & BOUND_UPPER != 0
    }

    #[inline]
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.bound() == BOUND_EXACT
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
struct Cluster {
    entries: [TtEntry; ENTRIES_PER_CLUSTER],
    _pad: [u8; 4],
}

const _: () = assert!(std::mem::size_of::<TtEntry>() == 12);
const _: () = assert!(std::mem::size_of::<Cluster>() == 64);

/// Handle to a probed slot: either the matching entry or the replacement
/// victim within the chosen cluster.
#[derive(Clone, Copy)]
pub struct SlotRef {
    cluster: usize,
    slot: usize,
    pub found: bool,
}

pub struct TranspositionTable {
    clusters: Vec<Cluster>,
    generation: u8,
}

impl TranspositionTable {
    #[must_use]
    pub fn new(cluster_count: usize) -> Self {
        let cluster_count = cluster_count.max(1);
        TranspositionTable {
            clusters: vec![
                Cluster {
                    entries: [TtEntry::EMPTY; ENTRIES_PER_CLUSTER],
                    _pad: [0; 4],
                };
                cluster_count
            ],
            generation: 0,
        }
    }

    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn clear(&mut self) {
        for cluster in &mut self.clusters {
            cluster.entries = [TtEntry::EMPTY; ENTRIES_PER_CLUSTER];
        }
    }

    /// Bump the generation (6-bit counter in the high bits of the bound
    /// byte). Call once per search.
    pub fn advance_generation(&mut self) {
        self.generation = (self.generation + 1) & 63;
    }

    #[inline]
    fn cluster_index(&self, hash: u64) -> usize {
        ((self.clusters.len() as u128 * hash as u128) >> 64) as usize
    }

    #[inline]
    fn age(&self, entry: &TtEntry) -> i32 {
        i32::from((64 + self.generation - (entry.gen_bound >> 2)) & 63)
    }

    /// Find the entry for `hash`, or the cluster slot it should replace.
    /// A hit refreshes the entry's generation.
    pub fn probe(&mut self, hash: u64) -> SlotRef {
        let cluster = self.cluster_index(hash);
        let resolver = hash as u32;

        for (slot, entry) in self.clusters[cluster].entries.iter_mut().enumerate() {
            if entry.hash32 == resolver {
                // Reading means the entry was useful; keep it young.
                entry.gen_bound = (self.generation << 2) | (entry.gen_bound & 3);
                return SlotRef {
                    cluster,
                    slot,
                    found: true,
                };
            }
        }

        // Replacement victim: minimize depth - 8 * age.
        let mut best = 0;
        let mut best_score =
            self.clusters[cluster].entries[0].depth() - 8 * self.age(&self.clusters[cluster].entries[0]);
        for slot in 1..ENTRIES_PER_CLUSTER {
            let entry = &self.clusters[cluster].entries[slot];
            let score = entry.depth() - 8 * self.age(entry);
            if score < best_score {
                best = slot;
                best_score = score;
            }
        }

        SlotRef {
            cluster,
            slot: best,
            found: false,
        }
    }

    /// Copy out the entry behind a [`SlotRef`].
    #[inline]
    #[must_use]
    pub fn entry(&self, slot: SlotRef) -> TtEntry {
        self.clusters[slot.cluster].entries[slot.slot]
    }

    /// Store through a [`SlotRef`]. The move is kept when the incoming move
    /// is null and the hash matches; the rest of the entry is overwritten
    /// when the hash differs, the bound is exact, or the depth is at least
    /// the stored depth.
    pub fn write(
        &mut self,
        slot: SlotRef,
        hash: u64,
        mv: Move,
        static_eval: Value,
        search_eval: Value,
        depth: i32,
        bound: u8,
    ) {
        let generation = self.generation;
        let entry = &mut self.clusters[slot.cluster].entries[slot.slot];
        let resolver = hash as u32;

        if resolver != entry.hash32 || mv != Move::NONE {
            entry.mv = mv.raw();
        }

        if resolver != entry.hash32 || bound == BOUND_EXACT || depth >= entry.depth() {
            entry.hash32 = resolver;
            entry.mv = mv.raw();
            entry.static_eval = static_eval;
            entry.search_eval = search_eval;
            entry.depth = depth.clamp(0, 255) as u8;
            entry.gen_bound = bound | (generation << 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Square;

    fn mv(from: usize, to: usize) -> Move {
        Move::normal(Square::from_index(from), Square::from_index(to))
    }

    #[test]
    fn store_then_probe_round_trips() {
        let mut tt = TranspositionTable::new(64);
        tt.advance_generation();

        let hash = 0xDEAD_BEEF_1234_5678;
        let slot = tt.probe(hash);
        assert!(!slot.found);
        tt.write(slot, hash, mv(12, 28), 33, 55, 16, BOUND_EXACT);

        let slot = tt.probe(hash);
        assert!(slot.found);
        let entry = tt.entry(slot);
        assert_eq!(entry.best_move(), mv(12, 28));
        assert_eq!(entry.static_eval(), 33);
        assert_eq!(entry.search_eval(), 55);
        assert_eq!(entry.depth(), 16);
        assert!(entry.is_exact());
        assert!(entry.has_lower());
        assert!(entry.has_upper());
    }

    #[test]
    fn probe_survives_generation_advance() {
        let mut tt = TranspositionTable::new(64);
        let hash = 42u64.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let slot = tt.probe(hash);
        tt.write(slot, hash, mv(0, 8), 1, 2, 8, BOUND_LOWER);

        tt.advance_generation();
        let slot = tt.probe(hash);
        assert!(slot.found);
        let entry = tt.entry(slot);
        assert_eq!(entry.best_move(), mv(0, 8));
        assert_eq!(entry.bound(), BOUND_LOWER);
        assert!(entry.has_lower());
        assert!(!entry.has_upper());
    }

    #[test]
    fn null_move_write_keeps_existing_move_on_same_hash() {
        let mut tt = TranspositionTable::new(64);
        let hash = 7u64 << 60;
        let slot = tt.probe(hash);
        tt.write(slot, hash, mv(12, 28), 0, 0, 8, BOUND_LOWER);

        let slot = tt.probe(hash);
        tt.write(slot, hash, Move::NONE, 5, 9, 12, BOUND_UPPER);
        let probe_result = tt.probe(hash);
        let entry = tt.entry(probe_result);
        assert_eq!(entry.best_move(), mv(12, 28));
        assert_eq!(entry.depth(), 12);
        assert_eq!(entry.bound(), BOUND_UPPER);
    }

    #[test]
    fn shallow_write_does_not_clobber_deeper_entry() {
        let mut tt = TranspositionTable::new(64);
        let hash = 0x0123_4567_89AB_CDEF;
        let slot = tt.probe(hash);
        tt.write(slot, hash, mv(1, 2), 10, 10, 32, BOUND_LOWER);

        let slot = tt.probe(hash);
        tt.write(slot, hash, mv(3, 4), 20, 20, 8, BOUND_UPPER);
        let probe_result = tt.probe(hash);
        let entry = tt.entry(probe_result);
        // Move updates, the deeper data stays.
        assert_eq!(entry.best_move(), mv(3, 4));
        assert_eq!(entry.depth(), 32);
        assert_eq!(entry.search_eval(), 10);
    }

    #[test]
    fn replacement_prefers_empty_slots() {
        let mut tt = TranspositionTable::new(1);
        tt.advance_generation();

        // Fill two slots with deep, fresh entries.
        let h1 = 0x1111_1111_1111_1111;
        let h2 = 0x2222_2222_2222_2222;
        let s1 = tt.probe(h1);
        tt.write(s1, h1, mv(1, 2), 0, 0, 100, BOUND_EXACT);
        let s2 = tt.probe(h2);
        tt.write(s2, h2, mv(3, 4), 0, 0, 90, BOUND_EXACT);

        // A miss must pick one of the three empty slots, not evict the
        // fresh deep entries.
        let victim = tt.probe(0x3333_3333_3333_3333);
        assert!(!victim.found);
        let entry = tt.entry(victim);
        assert_eq!(entry.bound(), BOUND_EMPTY);
        assert_eq!(entry.depth(), 0);
    }

    #[test]
    fn clear_wipes_everything() {
        let mut tt = TranspositionTable::new(16);
        let hash = 0xABCD_EF01_2345_6789;
        let slot = tt.probe(hash);
        tt.write(slot, hash, mv(9, 18), 1, 2, 3, BOUND_EXACT);
        tt.clear();
        assert!(!tt.probe(hash).found);
    }
}
