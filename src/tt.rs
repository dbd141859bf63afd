//! Transposition table for caching search results.
//!
//! Entries are stored as atomic u64 pairs using XOR verification to detect
//! torn reads, so the table can be shared behind an `Arc` without locks.

use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::board::Move;

/// Bound semantics of a stored score
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    /// Exact score
    Pv,
    /// Upper bound (failed low)
    All,
    /// Lower bound (failed high)
    Cut,
}

impl NodeType {
    // Zero is reserved for empty slots.
    fn to_bits(self) -> u64 {
        match self {
            NodeType::Pv => 1,
            NodeType::All => 2,
            NodeType::Cut => 3,
        }
    }

    fn from_bits(v: u64) -> Self {
        match v & 0x3 {
            2 => NodeType::All,
            3 => NodeType::Cut,
            _ => NodeType::Pv,
        }
    }
}

/// Unpacked TT entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub mv: Move,
    pub score: i32,
    pub depth: u8,
    pub node_type: NodeType,
    pub tt_pv: bool,
    pub(crate) generation: u8,
}

const SCORE_BITS: u32 = 22;
const SCORE_MASK: u64 = (1 << SCORE_BITS) - 1;
const SCORE_MAX: i32 = (1 << (SCORE_BITS - 1)) - 1;

/// Packed entry format:
/// - bits 0-15:  move
/// - bits 16-37: score (22-bit two's complement)
/// - bits 38-45: depth
/// - bits 46-47: node type (1..=3)
/// - bit  48:    tt_pv
/// - bits 49-54: generation
fn pack_entry(entry: &Entry) -> u64 {
    let score = entry.score.clamp(-SCORE_MAX, SCORE_MAX) as u64 & SCORE_MASK;
    u64::from(entry.mv.as_u16())
        | (score << 16)
        | (u64::from(entry.depth) << 38)
        | (entry.node_type.to_bits() << 46)
        | (u64::from(entry.tt_pv) << 48)
        | (u64::from(entry.generation & 0x3F) << 49)
}

fn unpack_entry(data: u64) -> Entry {
    let raw = ((data >> 16) & SCORE_MASK) as u32;
    // Sign-extend from 22 bits.
    let score = ((raw << (32 - SCORE_BITS)) as i32) >> (32 - SCORE_BITS);
    Entry {
        mv: Move::from_u16((data & 0xFFFF) as u16),
        score,
        depth: ((data >> 38) & 0xFF) as u8,
        node_type: NodeType::from_bits(data >> 46),
        tt_pv: (data >> 48) & 1 == 1,
        generation: ((data >> 49) & 0x3F) as u8,
    }
}

/// A single slot: stores `hash ^ data` alongside `data`.
#[repr(C)]
struct Slot {
    key_xor: AtomicU64,
    data: AtomicU64,
}

impl Slot {
    fn new() -> Self {
        Slot {
            key_xor: AtomicU64::new(0),
            data: AtomicU64::new(0),
        }
    }

    fn store(&self, hash: u64, packed: u64) {
        self.data.store(packed, Ordering::Relaxed);
        self.key_xor.store(hash ^ packed, Ordering::Relaxed);
    }

    fn probe(&self, hash: u64) -> Option<Entry> {
        let key_xor = self.key_xor.load(Ordering::Relaxed);
        let data = self.data.load(Ordering::Relaxed);
        if data != 0 && key_xor ^ data == hash {
            Some(unpack_entry(data))
        } else {
            None
        }
    }

    fn is_empty(&self) -> bool {
        self.data.load(Ordering::Relaxed) == 0
    }

    fn generation(&self) -> u8 {
        ((self.data.load(Ordering::Relaxed) >> 49) & 0x3F) as u8
    }

    fn depth(&self) -> u8 {
        ((self.data.load(Ordering::Relaxed) >> 38) & 0xFF) as u8
    }

    fn clear(&self) {
        self.key_xor.store(0, Ordering::Relaxed);
        self.data.store(0, Ordering::Relaxed);
    }
}

const BUCKET_SIZE: usize = 4;

#[repr(C)]
struct Bucket {
    slots: [Slot; BUCKET_SIZE],
}

impl Bucket {
    fn new() -> Self {
        Bucket {
            slots: [Slot::new(), Slot::new(), Slot::new(), Slot::new()],
        }
    }
}

/// Lockless transposition table
pub struct TranspositionTable {
    buckets: Vec<Bucket>,
    mask: usize,
    generation: AtomicU64,
}

impl TranspositionTable {
    /// Create a table of roughly `size_mb` megabytes (rounded down to a power of two buckets)
    #[must_use]
    pub fn new(size_mb: usize) -> Self {
        let bucket_size = mem::size_of::<Bucket>();
        let wanted = (size_mb.max(1) * 1024 * 1024) / bucket_size;
        let mut num_buckets = wanted.next_power_of_two();
        if num_buckets > wanted {
            num_buckets /= 2;
        }
        let num_buckets = num_buckets.max(1024);

        log::debug!("transposition table: {size_mb} MB, {num_buckets} buckets");
        TranspositionTable {
            buckets: (0..num_buckets).map(|_| Bucket::new()).collect(),
            mask: num_buckets - 1,
            generation: AtomicU64::new(0),
        }
    }

    #[inline]
    fn bucket(&self, hash: u64) -> &Bucket {
        &self.buckets[(hash as usize) & self.mask]
    }

    /// Age entries; called once per search
    pub fn new_search(&self) {
        self.generation.fetch_add(1, Ordering::Relaxed);
    }

    fn current_generation(&self) -> u8 {
        (self.generation.load(Ordering::Relaxed) & 0x3F) as u8
    }

    /// Look up `hash`
    #[must_use]
    pub fn probe(&self, hash: u64) -> Option<Entry> {
        self.bucket(hash).slots.iter().find_map(|slot| slot.probe(hash))
    }

    /// Store an entry. Prefers an empty or same-position slot, otherwise the
    /// oldest and shallowest one.
    pub fn add(&self, hash: u64, mv: Move, score: i32, depth: i32, node_type: NodeType, tt_pv: bool) {
        let generation = self.current_generation();
        let bucket = self.bucket(hash);

        let mut target = None;
        for slot in &bucket.slots {
            if slot.is_empty() {
                target = Some(slot);
                break;
            }
            if let Some(existing) = slot.probe(hash) {
                // Keep the old move when the new result has none.
                let mv = if mv.is_none() { existing.mv } else { mv };
                let packed = pack_entry(&Entry {
                    mv,
                    score,
                    depth: depth.clamp(0, 255) as u8,
                    node_type,
                    tt_pv,
                    generation,
                });
                slot.store(hash, packed);
                return;
            }
        }

        let slot = target.unwrap_or_else(|| {
            bucket
                .slots
                .iter()
                .min_by_key(|slot| {
                    let age = generation.wrapping_sub(slot.generation()) & 0x3F;
                    i32::from(slot.depth()) * 2 - i32::from(age) * 4
                })
                .unwrap_or(&bucket.slots[0])
        });

        let packed = pack_entry(&Entry {
            mv,
            score,
            depth: depth.clamp(0, 255) as u8,
            node_type,
            tt_pv,
            generation,
        });
        slot.store(hash, packed);
    }

    /// Fullness in per mille, sampled over the first 1000 buckets
    #[must_use]
    pub fn hashfull_per_mille(&self) -> u32 {
        let sample = self.buckets.len().min(1000);
        let current = self.current_generation();
        let occupied = self
            .buckets
            .iter()
            .take(sample)
            .flat_map(|b| b.slots.iter())
            .filter(|s| !s.is_empty() && s.generation() == current)
            .count();
        ((occupied * 1000) / (sample * BUCKET_SIZE)) as u32
    }

    pub fn clear(&self) {
        for bucket in &self.buckets {
            for slot in &bucket.slots {
                slot.clear();
            }
        }
        self.generation.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Square;

    fn entry(mv: Move, score: i32, depth: u8, node_type: NodeType, tt_pv: bool, generation: u8) -> Entry {
        Entry {
            mv,
            score,
            depth,
            node_type,
            tt_pv,
            generation,
        }
    }

    #[test]
    fn pack_unpack_keeps_every_field() {
        let e2e4 = Move::normal(Square::from_index(12), Square::from_index(28));
        let cases = [
            entry(e2e4, 500, 10, NodeType::Pv, true, 5),
            entry(Move::NONE, -1_048_000, 255, NodeType::Cut, false, 63),
            entry(Move::from_u16(0xFFFF), 1_048_575, 0, NodeType::All, true, 0),
        ];
        for e in cases {
            assert_eq!(unpack_entry(pack_entry(&e)), e);
        }
    }

    #[test]
    fn store_and_probe() {
        let tt = TranspositionTable::new(1);
        let hash = 0x1234_5678_9ABC_DEF0;
        tt.add(hash, Move::NONE, -37, 7, NodeType::All, false);

        let e = tt.probe(hash).unwrap();
        assert_eq!(e.score, -37);
        assert_eq!(e.depth, 7);
        assert_eq!(e.node_type, NodeType::All);
        assert!(tt.probe(0xFEDC_BA98_7654_3210).is_none());
    }

    #[test]
    fn empty_move_keeps_previous_move() {
        let tt = TranspositionTable::new(1);
        let hash = 42;
        let mv = Move::normal(Square::from_index(1), Square::from_index(18));
        tt.add(hash, mv, 10, 3, NodeType::Cut, false);
        tt.add(hash, Move::NONE, 20, 4, NodeType::All, false);
        let e = tt.probe(hash).unwrap();
        assert_eq!(e.mv, mv);
        assert_eq!(e.score, 20);
    }

    #[test]
    fn qsearch_entry_at_depth_zero_is_visible() {
        let tt = TranspositionTable::new(1);
        tt.add(99, Move::NONE, 0, 0, NodeType::Pv, false);
        assert!(tt.probe(99).is_some());
    }

    #[test]
    fn clear_empties_table() {
        let tt = TranspositionTable::new(1);
        tt.add(7, Move::NONE, 1, 1, NodeType::Pv, true);
        assert!(tt.hashfull_per_mille() <= 1000);
        tt.clear();
        assert!(tt.probe(7).is_none());
        assert_eq!(tt.hashfull_per_mille(), 0);
    }
}
