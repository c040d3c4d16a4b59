//! Fixed-capacity read buffers shared across a pair's whole lifecycle.
//!
//! Buffers are allocated once by the assembler and reused pair-to-pair via
//! [`Read::clear`], so steady-state assembly does not allocate on the hot
//! path beyond the initial capacity reservation.

use crate::core::nucleotide::Nucleotide;
use crate::core::quality::Quality;
use std::sync::atomic::{AtomicBool, Ordering};

/// Hard cap on a single read's length. Chosen to comfortably cover any
/// current Illumina read length with headroom.
pub const MAX_LEN: usize = 512;

#[derive(Debug, Clone, Copy, Default)]
pub struct BaseCell {
    pub nt: Nucleotide,
    pub qual: Quality,
}

static WARNED_TRUNCATED: AtomicBool = AtomicBool::new(false);

/// A single sequencing read: an identifier plus up to [`MAX_LEN`] basecalls.
#[derive(Debug, Clone, Default)]
pub struct Read {
    pub id: String,
    pub bases: Vec<BaseCell>,
}

impl Read {
    pub fn new() -> Self {
        Read { id: String::new(), bases: Vec::with_capacity(MAX_LEN) }
    }

    pub fn clear(&mut self) {
        self.id.clear();
        self.bases.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Appends a basecall if there is still room. Returns `false` (without
    /// panicking) once [`MAX_LEN`] has been reached; callers that exceed the
    /// cap are responsible for surfacing the truncation, see
    /// [`warn_truncated_once`].
    #[inline]
    pub fn push(&mut self, cell: BaseCell) -> bool {
        if self.bases.len() >= MAX_LEN {
            return false;
        }
        self.bases.push(cell);
        true
    }

    /// Writes the reverse complement of `self` into `out`, reusing `out`'s
    /// existing allocation.
    pub fn reverse_complement_into(&self, out: &mut Read) {
        out.clear();
        out.id.push_str(&self.id);
        out.bases.extend(self.bases.iter().rev().map(|cell| BaseCell {
            nt: cell.nt.complement(),
            qual: cell.qual,
        }));
    }
}

/// Logs a single, process-wide "read truncated to MAX_LEN" warning the first
/// time it happens, then stays silent for the remainder of the run so a
/// noisy input can't flood stderr.
pub fn warn_truncated_once(read_id: &str) {
    if !WARNED_TRUNCATED.swap(true, Ordering::Relaxed) {
        eprintln!(
            "[pandiff_core::core::read] WARNING read '{read_id}' exceeds MAX_LEN ({MAX_LEN}); truncating \
             (further occurrences in this run will not be logged individually)"
        );
    }
}
