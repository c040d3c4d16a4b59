//! Forward/reverse primer location-and-clip, or plain fixed-length trim.
//!
//! Each end of the assembled consensus is configured independently as
//! either "trim N bases" or "locate and clip this IUPAC primer pattern",
//! never both (configuring one clears the other).

use crate::core::nucleotide::Nucleotide;
use crate::core::read::{BaseCell, MAX_LEN};

/// A primer pattern, stored as a fixed-size IUPAC buffer so configuring one
/// doesn't allocate.
#[derive(Debug, Clone, Copy)]
pub struct PrimerBuffer {
    pattern: [Nucleotide; MAX_LEN],
    len: usize,
}

impl PrimerBuffer {
    pub fn from_ascii(seq: &[u8]) -> Self {
        let len = seq.len().min(MAX_LEN);
        let mut pattern = [Nucleotide::from_bits(0); MAX_LEN];
        for (slot, &b) in pattern.iter_mut().zip(seq.iter()).take(len) {
            *slot = Nucleotide::from_ascii(b);
        }
        PrimerBuffer { pattern, len }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn as_slice(&self) -> &[Nucleotide] {
        &self.pattern[..self.len]
    }
}

/// How one end of the assembled read is configured.
#[derive(Debug, Clone, Copy)]
pub enum EndMode {
    /// Unconditionally remove this many bases (0 means leave untouched).
    Trim(usize),
    /// Locate this primer pattern and clip it plus everything beyond it.
    Primer(PrimerBuffer),
}

impl Default for EndMode {
    fn default() -> Self {
        EndMode::Trim(0)
    }
}

/// Finds the leftmost position where `pattern` matches `consensus` under
/// IUPAC intersection (every pattern base must share at least one allele
/// with the corresponding consensus base). Returns the match's start index.
pub fn locate_primer(pattern: &[Nucleotide], consensus: &[BaseCell]) -> Option<usize> {
    if pattern.is_empty() || consensus.len() < pattern.len() {
        return None;
    }
    'outer: for start in 0..=(consensus.len() - pattern.len()) {
        for (i, &p) in pattern.iter().enumerate() {
            if p.intersect(consensus[start + i].nt) == Nucleotide::from_bits(0) {
                continue 'outer;
            }
        }
        return Some(start);
    }
    None
}

/// Applies the forward-end configuration: either drop a fixed prefix, or
/// locate the forward primer and drop everything up to and including it.
/// Returns `false` (leaving `bases` untouched) if a primer was configured
/// but not found.
pub fn apply_forward(mode: &EndMode, bases: &mut Vec<BaseCell>) -> bool {
    match mode {
        EndMode::Trim(n) => {
            let n = (*n).min(bases.len());
            bases.drain(0..n);
            true
        }
        EndMode::Primer(p) => match locate_primer(p.as_slice(), bases) {
            Some(start) => {
                bases.drain(0..start + p.len());
                true
            }
            None => false,
        },
    }
}

/// Applies the reverse-end configuration symmetrically, operating on the
/// tail of `bases`.
pub fn apply_reverse(mode: &EndMode, bases: &mut Vec<BaseCell>) -> bool {
    match mode {
        EndMode::Trim(n) => {
            let n = (*n).min(bases.len());
            bases.truncate(bases.len() - n);
            true
        }
        EndMode::Primer(p) => {
            // The reverse primer is expected to read in the same
            // orientation as the assembled consensus (5'->3' of the
            // reverse strand, i.e. already reverse-complemented by the
            // caller when configuring it), so it is located the same way
            // and everything from its start onward is clipped.
            match locate_primer(p.as_slice(), bases) {
                Some(start) => {
                    bases.truncate(start);
                    true
                }
                None => false,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::quality::Quality;

    fn consensus_of(seq: &str) -> Vec<BaseCell> {
        seq.bytes()
            .map(|b| BaseCell { nt: Nucleotide::from_ascii(b), qual: Quality::new(30) })
            .collect()
    }

    #[test]
    fn locate_primer_finds_leftmost_match() {
        let pattern = PrimerBuffer::from_ascii(b"ACGT");
        let consensus = consensus_of("TTACGTACGTTT");
        assert_eq!(locate_primer(pattern.as_slice(), &consensus), Some(2));
    }

    #[test]
    fn locate_primer_respects_ambiguity_codes() {
        let pattern = PrimerBuffer::from_ascii(b"ACRT"); // R = A|G
        let consensus = consensus_of("ACGT");
        assert_eq!(locate_primer(pattern.as_slice(), &consensus), Some(0));
    }

    #[test]
    fn apply_forward_trim_drops_a_fixed_prefix() {
        let mut bases = consensus_of("ACGTACGT");
        assert!(apply_forward(&EndMode::Trim(3), &mut bases));
        assert_eq!(bases.len(), 5);
    }

    #[test]
    fn apply_forward_primer_not_found_leaves_bases_untouched() {
        let mode = EndMode::Primer(PrimerBuffer::from_ascii(b"GGGG"));
        let mut bases = consensus_of("ACGTACGT");
        let before = bases.len();
        assert!(!apply_forward(&mode, &mut bases));
        assert_eq!(bases.len(), before);
    }

    #[test]
    fn setting_one_end_mode_conceptually_excludes_the_other() {
        // EndMode itself is an enum, so constructing a Primer variant
        // naturally discards any prior Trim configuration and vice versa.
        let mut mode = EndMode::Trim(5);
        mode = EndMode::Primer(PrimerBuffer::from_ascii(b"ACGT"));
        assert!(matches!(mode, EndMode::Primer(_)));
    }
}
