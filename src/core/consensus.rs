//! Builds the merged consensus read from a forward read, a reverse-complemented
//! mate, and a chosen overlap length.

use crate::core::nucleotide::Nucleotide;
use crate::core::prob;
use crate::core::read::{BaseCell, Read};

/// The assembled consensus plus the bookkeeping needed to report and
/// classify it. Reused pair-to-pair like [`Read`].
#[derive(Debug, Clone, Default)]
pub struct AssembledResult {
    pub id: String,
    pub bases: Vec<BaseCell>,
    pub overlap: usize,
    /// Sum of per-position log-probabilities across the overlap region
    /// only (the non-overlapping flanks are single-observation copies with
    /// nothing to combine against).
    pub overall_log_p: f64,
    pub degenerate: bool,
}

impl AssembledResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.id.clear();
        self.bases.clear();
        self.overlap = 0;
        self.overall_log_p = 0.0;
        self.degenerate = false;
    }

    #[inline]
    pub fn overall_quality(&self) -> f64 {
        self.overall_log_p.exp()
    }
}

/// Merges `f` and `r_rc` at the given overlap length into `out`.
///
/// `out.degenerate` is set if any consensus base in the overlap region
/// turned out ambiguous (including an `N`); callers decide whether that is
/// fatal.
pub fn build(f: &Read, r_rc: &Read, overlap: usize, out: &mut AssembledResult) {
    let nf = f.len();
    let nr = r_rc.len();
    debug_assert!(overlap <= nf && overlap <= nr);

    out.clear();
    out.id.push_str(&f.id);
    out.overlap = overlap;
    out.bases.reserve(nf + nr - overlap);

    out.bases.extend_from_slice(&f.bases[..nf - overlap]);

    let mut log_p_sum = 0.0f64;
    for k in 0..overlap {
        let a = f.bases[nf - overlap + k];
        let b = r_rc.bases[k];

        let either_n = a.nt.is_n() || b.nt.is_n();
        let intersection = a.nt.intersect(b.nt);
        let agree = intersection != Nucleotide::from_bits(0);

        let entry = prob::lookup(a.qual.value(), b.qual.value(), agree, either_n);
        log_p_sum += entry.log_p;

        let consensus_nt = if either_n {
            Nucleotide::from_bits(0)
        } else if agree {
            intersection
        } else if a.qual >= b.qual {
            a.nt
        } else {
            b.nt
        };

        if consensus_nt.is_degenerate() {
            out.degenerate = true;
        }

        out.bases.push(BaseCell {
            nt: consensus_nt,
            qual: crate::core::quality::Quality::new(entry.quality),
        });
    }

    out.bases.extend_from_slice(&r_rc.bases[overlap..]);
    out.overall_log_p = log_p_sum;
}
