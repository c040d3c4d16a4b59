//! Quality-pair-indexed log-probability tables for consensus scoring.
//!
//! For every pair of PHRED qualities `(qa, qb)` we precompute the
//! log-probability of the observation under two hypotheses (the two
//! basecalls agree / disagree) plus a recalibrated quality for the
//! resulting consensus base. Tables are built once, lazily, and indexed
//! directly by quality value rather than hashed.

use crate::core::quality::MAX_QUAL;
use std::sync::LazyLock;

const DIM: usize = MAX_QUAL as usize + 1;

#[derive(Debug, Clone, Copy)]
pub struct ProbEntry {
    /// Natural-log probability of this observation.
    pub log_p: f64,
    /// Recalibrated PHRED quality for the resulting consensus call.
    pub quality: u8,
}

struct Tables {
    agree: Vec<ProbEntry>,
    disagree: Vec<ProbEntry>,
}

fn build() -> Tables {
    let mut agree = Vec::with_capacity(DIM * DIM);
    let mut disagree = Vec::with_capacity(DIM * DIM);
    for qa in 0..DIM {
        let ea = 10f64.powf(-(qa as f64) / 10.0);
        for qb in 0..DIM {
            let eb = 10f64.powf(-(qb as f64) / 10.0);

            // P(both calls correct, or both wrong and happen to agree by chance).
            let p_agree = ((1.0 - ea) * (1.0 - eb) + ea * eb / 3.0).clamp(1e-300, 1.0);
            let recal_err_agree = (1.0 - p_agree).max(1e-300);
            agree.push(ProbEntry {
                log_p: p_agree.ln(),
                quality: (-10.0 * recal_err_agree.log10()).round().clamp(0.0, MAX_QUAL as f64) as u8,
            });

            // P(exactly one call wrong landing on the other's base, or both wrong
            // and landing on the same wrong base).
            let p_disagree = ((ea * (1.0 - eb) + eb * (1.0 - ea)) / 3.0 + 2.0 * ea * eb / 3.0).clamp(1e-300, 1.0);
            let recal_err_disagree = (1.0 - p_disagree).max(1e-300);
            disagree.push(ProbEntry {
                log_p: p_disagree.ln(),
                quality: (-10.0 * recal_err_disagree.log10()).round().clamp(0.0, MAX_QUAL as f64) as u8,
            });
        }
    }
    Tables { agree, disagree }
}

static TABLES: LazyLock<Tables> = LazyLock::new(build);

#[inline]
fn idx(qa: u8, qb: u8) -> usize {
    (qa.min(MAX_QUAL) as usize) * DIM + (qb.min(MAX_QUAL) as usize)
}

/// log(0.25): the probability contribution used whenever either basecall is
/// `N` (no information to combine).
#[inline]
pub fn p_random() -> f64 {
    0.25f64.ln()
}

#[inline]
pub fn lookup_agree(qa: u8, qb: u8) -> ProbEntry {
    TABLES.agree[idx(qa, qb)]
}

#[inline]
pub fn lookup_disagree(qa: u8, qb: u8) -> ProbEntry {
    TABLES.disagree[idx(qa, qb)]
}

/// Looks up the contribution for a single overlap position.
///
/// `either_n` takes priority: an `N` on either side carries no information,
/// so it always scores as the random background regardless of `agree`.
pub fn lookup(qa: u8, qb: u8, agree: bool, either_n: bool) -> ProbEntry {
    if either_n {
        ProbEntry { log_p: p_random(), quality: 0 }
    } else if agree {
        lookup_agree(qa, qb)
    } else {
        lookup_disagree(qa, qb)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn agreement_at_high_quality_outscores_agreement_at_low_quality() {
        let high = lookup_agree(40, 40);
        let low = lookup_agree(2, 2);
        assert!(high.log_p > low.log_p);
    }

    #[test]
    fn agreement_always_outscores_disagreement_at_equal_quality() {
        for q in [0u8, 10, 20, 30, 40] {
            let agree = lookup_agree(q, q);
            let disagree = lookup_disagree(q, q);
            assert!(agree.log_p > disagree.log_p, "q={q}");
        }
    }

    #[test]
    fn either_n_forces_random_background() {
        let e = lookup(40, 40, true, true);
        assert_eq!(e.log_p, p_random());
        assert_eq!(e.quality, 0);
    }

    #[test]
    fn table_indices_are_clamped_within_bounds() {
        // Should not panic even if called with an out-of-range value upstream.
        let _ = lookup_agree(255, 255);
    }
}
