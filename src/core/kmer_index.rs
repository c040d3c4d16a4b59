//! Flat bitset "seen" cache used to seed candidate overlap offsets in O(1)
//! per k-mer instead of hashing.
//!
//! The bitset is sized `2 * 4^K * MAX_LEN` bits: one bit per (k-mer, which
//! read, position) triple. It is a pure existence filter; the actual
//! candidate-offset enumeration walks two small per-pair position lists that
//! are populated alongside the bitset and cleared in lock-step with it, so a
//! bit is never left set across pairs.

use crate::core::read::{MAX_LEN, Read};
use std::collections::HashSet;

/// K-mer size used for seeding. Must keep `4^K` small enough that the flat
/// bitset stays a few MiB.
pub const K: usize = 8;

const KMER_SPACE: usize = 1 << (2 * K); // 4^K
const WHICH_FORWARD: usize = 0;
const WHICH_REVERSE: usize = 1;
const TOTAL_BITS: usize = 2 * KMER_SPACE * MAX_LEN;
const WORDS: usize = TOTAL_BITS.div_ceil(64);

/// The index's dynamic per-pair state plus the static bitset it maintains.
pub struct KmerIndex {
    bits: Box<[u64]>,
    fwd_marks: Vec<(u16, usize)>,
    rev_marks: Vec<(u16, usize)>,
}

impl KmerIndex {
    pub fn new() -> Self {
        KmerIndex {
            bits: vec![0u64; WORDS].into_boxed_slice(),
            fwd_marks: Vec::with_capacity(MAX_LEN),
            rev_marks: Vec::with_capacity(MAX_LEN),
        }
    }

    #[inline]
    fn bit_index(kmer: u16, which: usize, pos: usize) -> usize {
        (kmer as usize) * 2 * MAX_LEN + which * MAX_LEN + pos
    }

    #[inline]
    fn set_bit(&mut self, i: usize) {
        self.bits[i / 64] |= 1u64 << (i % 64);
    }

    #[inline]
    fn clear_bit(&mut self, i: usize) {
        self.bits[i / 64] &= !(1u64 << (i % 64));
    }

    #[inline]
    #[cfg(test)]
    fn get_bit(&self, i: usize) -> bool {
        self.bits[i / 64] & (1u64 << (i % 64)) != 0
    }

    /// Marks every non-degenerate k-mer of `read` as seen on the forward
    /// side and records the positions so [`Self::reset`] can undo exactly
    /// this call.
    pub fn mark_forward(&mut self, read: &Read) {
        for (kmer, pos) in iter_kmers(read) {
            let i = Self::bit_index(kmer, WHICH_FORWARD, pos);
            self.set_bit(i);
            self.fwd_marks.push((kmer, pos));
        }
    }

    /// Same as [`Self::mark_forward`] but for the reverse-complemented
    /// mate (`r_rc`), which is what the overlap scorer actually aligns
    /// against the forward read.
    pub fn mark_reverse(&mut self, read: &Read) {
        for (kmer, pos) in iter_kmers(read) {
            let i = Self::bit_index(kmer, WHICH_REVERSE, pos);
            self.set_bit(i);
            self.rev_marks.push((kmer, pos));
        }
    }

    /// Candidate overlap lengths proposed by shared k-mers, restricted to
    /// `[min_overlap, nf + nr]`. Returned offsets are deduplicated and in no
    /// particular order; the scorer ranks them.
    pub fn candidate_offsets(&self, nf: usize, nr: usize, min_overlap: usize) -> Vec<usize> {
        // An overlap length o aligns r_rc[0..o] against f[nf-o..nf]; a
        // length beyond either read would run off the end of that read, so
        // the true upper bound is the shorter of the two lengths.
        let max_overlap = nf.min(nr);
        let mut seen: HashSet<usize, foldhash::fast::RandomState> = HashSet::default();
        for &(kmer, i) in &self.fwd_marks {
            for &(kmer2, j) in &self.rev_marks {
                if kmer != kmer2 {
                    continue;
                }
                // The shared k-mer at forward position i and r_rc position j
                // implies an overlap length o such that the k-mer occupies
                // the same absolute coordinate in both reads once r_rc is
                // shifted to start at offset nf - o: i = (nf - o) + j.
                let o = nf as isize - i as isize + j as isize;
                if o >= min_overlap as isize && o <= max_overlap as isize {
                    seen.insert(o as usize);
                }
            }
        }
        seen.into_iter().collect()
    }

    /// Clears exactly the bits set by the marks recorded since the last
    /// reset, mirroring the set path so no bit survives into the next pair.
    pub fn reset(&mut self) {
        for (kmer, pos) in self.fwd_marks.drain(..) {
            let i = Self::bit_index(kmer, WHICH_FORWARD, pos);
            let word = i / 64;
            let mask = !(1u64 << (i % 64));
            // inline clear_bit to avoid a second borrow of self while draining
            self.bits[word] &= mask;
            let _ = pos;
        }
        for (kmer, pos) in self.rev_marks.drain(..) {
            let i = Self::bit_index(kmer, WHICH_REVERSE, pos);
            let word = i / 64;
            let mask = !(1u64 << (i % 64));
            self.bits[word] &= mask;
            let _ = pos;
        }
    }
}

impl Default for KmerIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Packs each non-degenerate base of a `K`-base window into 2 bits and
/// yields `(kmer, start_position)`. Windows containing any ambiguous base
/// are skipped entirely, matching the "non-degenerate k-mer" requirement.
pub(crate) fn iter_kmers(read: &Read) -> impl Iterator<Item = (u16, usize)> + '_ {
    let len = read.len();
    let windows = len.checked_sub(K).map_or(0, |d| d + 1);
    (0..windows).filter_map(move |start| {
        let mut kmer: u16 = 0;
        for cell in &read.bases[start..start + K] {
            let two_bit = match cell.nt.bits() {
                0b0001 => 0u16, // A
                0b0010 => 1u16, // C
                0b0100 => 2u16, // G
                0b1000 => 3u16, // T
                _ => return None,
            };
            kmer = (kmer << 2) | two_bit;
        }
        Some((kmer, start))
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::quality::Quality;
    use crate::core::read::BaseCell;

    fn make_read(seq: &str) -> Read {
        let mut r = Read::new();
        r.id.push_str("r");
        for b in seq.bytes() {
            r.push(BaseCell { nt: crate::core::nucleotide::Nucleotide::from_ascii(b), qual: Quality::new(30) });
        }
        r
    }

    #[test]
    fn reset_restores_an_all_zero_bitset() {
        let mut idx = KmerIndex::new();
        let f = make_read("ACGTACGTACGT");
        let r = make_read("TTTTACGTACGT");
        idx.mark_forward(&f);
        idx.mark_reverse(&r);
        assert!(idx.bits.iter().any(|&w| w != 0));
        idx.reset();
        assert!(idx.bits.iter().all(|&w| w == 0));
        assert!(idx.fwd_marks.is_empty());
        assert!(idx.rev_marks.is_empty());
    }

    #[test]
    fn shared_kmer_produces_a_candidate_offset() {
        let mut idx = KmerIndex::new();
        // forward ends with ACGTACGT, reverse-complement-space read starts
        // with the same 8-mer, so an overlap of 8 should be proposed.
        let f = make_read("TTTTTTTTACGTACGT");
        let r = make_read("ACGTACGTGGGGGGGG");
        idx.mark_forward(&f);
        idx.mark_reverse(&r);
        let candidates = idx.candidate_offsets(f.len(), r.len(), 1);
        assert!(candidates.contains(&8), "candidates={candidates:?}");
        idx.reset();
    }

    #[test]
    fn get_bit_round_trips_through_mark() {
        let mut idx = KmerIndex::new();
        let f = make_read("ACGTACGTACGT");
        idx.mark_forward(&f);
        let (kmer, pos) = idx.fwd_marks[0];
        assert!(idx.get_bit(KmerIndex::bit_index(kmer, WHICH_FORWARD, pos)));
        idx.reset();
    }

    #[test]
    fn reads_shorter_than_k_yield_no_kmers_and_do_not_panic() {
        let short = make_read("ACG"); // len 3 < K (8)
        let kmers: Vec<_> = iter_kmers(&short).collect();
        assert!(kmers.is_empty());

        let mut idx = KmerIndex::new();
        idx.mark_forward(&short);
        idx.mark_reverse(&short);
        assert!(idx.fwd_marks.is_empty());
        assert!(idx.rev_marks.is_empty());
        let candidates = idx.candidate_offsets(short.len(), short.len(), 1);
        assert!(candidates.is_empty());
        idx.reset();
    }

    #[test]
    fn empty_read_yields_no_kmers_and_does_not_panic() {
        let empty = make_read("");
        assert!(iter_kmers(&empty).collect::<Vec<_>>().is_empty());
    }
}
