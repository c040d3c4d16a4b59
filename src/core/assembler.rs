//! The per-pair state machine: read a pair, seed and score its overlap,
//! build a consensus, run it through the module pipeline, and classify the
//! result. Mirrors the reference implementation's single-threaded,
//! mutex-guarded-configuration assembler object.

use crate::core::classification::{Classification, Counters};
use crate::core::consensus::{self, AssembledResult};
use crate::core::kmer_index::KmerIndex;
use crate::core::module_pipeline::ModulePipeline;
use crate::core::nucleotide::Nucleotide;
use crate::core::overlap::{self, OverlapOutcome};
use crate::core::primer::{self, EndMode};
use crate::core::quality::QualityEncoding;
use crate::core::read::{BaseCell, MAX_LEN, Read, warn_truncated_once};
use crate::io::logger::Logger;
use crate::io::source::{RawRead, ReadPairSource};
use std::sync::{Arc, Mutex};

/// `q`'s default under the original probabilistic model: roughly the
/// fraction of overlap mismatches tolerated before a base is distrusted.
pub const DEFAULT_ERROR_ESTIMATION: f64 = 0.36;
/// Default minimum fraction of per-base overlap probability required to
/// accept an assembly.
pub const DEFAULT_THRESHOLD: f64 = 0.6;
/// Arbitrary but sane default; the guard below requires strictly more than
/// one base of overlap, so `1` (the smallest "valid" value in some other
/// tools) is deliberately not the default here.
pub const DEFAULT_MIN_OVERLAP: usize = 10;

/// The mutable, concurrently-configurable half of an assembler: everything
/// a caller may legitimately change while a run is in progress.
#[derive(Debug, Clone)]
pub struct Config {
    q: f64,
    log_threshold: f64,
    min_overlap: usize,
    disallow_degenerates: bool,
    forward: EndMode,
    reverse: EndMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            q: DEFAULT_ERROR_ESTIMATION,
            log_threshold: DEFAULT_THRESHOLD.ln(),
            min_overlap: DEFAULT_MIN_OVERLAP,
            disallow_degenerates: false,
            forward: EndMode::default(),
            reverse: EndMode::default(),
        }
    }
}

impl Config {
    /// Silently ignores `t` outside `(0, 1)`, preserving whatever threshold
    /// was previously configured.
    pub fn set_threshold(&mut self, t: f64) {
        if t > 0.0 && t < 1.0 {
            self.log_threshold = t.ln();
        }
    }

    pub fn threshold(&self) -> f64 {
        self.log_threshold.exp()
    }

    /// Silently ignores `q` outside `(0, 1)`. Retained for CLI/API
    /// compatibility with the reference error-estimation knob; the overlap
    /// scorer itself (`core::overlap`) no longer derives anything from it,
    /// scoring every candidate directly against the quality-pair table.
    pub fn set_error_estimation(&mut self, q: f64) {
        if q > 0.0 && q < 1.0 {
            self.q = q;
        }
    }

    pub fn error_estimation(&self) -> f64 {
        self.q
    }

    /// Silently ignores `overlap` outside `(1, MAX_LEN)`.
    pub fn set_minimum_overlap(&mut self, overlap: usize) {
        if overlap > 1 && overlap < MAX_LEN {
            self.min_overlap = overlap;
        }
    }

    pub fn minimum_overlap(&self) -> usize {
        self.min_overlap
    }

    pub fn set_disallow_degenerates(&mut self, disallow: bool) {
        self.disallow_degenerates = disallow;
    }

    pub fn disallow_degenerates(&self) -> bool {
        self.disallow_degenerates
    }

    /// Configures a forward trim, discarding any forward primer previously
    /// configured (the two are mutually exclusive).
    pub fn set_forward_trim(&mut self, n: usize) {
        self.forward = EndMode::Trim(n);
    }

    /// Configures a forward primer to locate and clip, discarding any
    /// forward trim previously configured.
    pub fn set_forward_primer(&mut self, primer: primer::PrimerBuffer) {
        self.forward = EndMode::Primer(primer);
    }

    pub fn set_reverse_trim(&mut self, n: usize) {
        self.reverse = EndMode::Trim(n);
    }

    pub fn set_reverse_primer(&mut self, primer: primer::PrimerBuffer) {
        self.reverse = EndMode::Primer(primer);
    }
}

/// Drives one source of read pairs through overlap assembly to completion.
///
/// Not `Sync`: only one thread may call [`Assembler::next`] at a time (this
/// matches the reference tool, which is single-threaded per assembler
/// instance); multiple assemblers, each with their own source, are how the
/// process layer parallelizes across shards. [`Config`] is the one piece
/// that may be mutated concurrently with an in-flight `next()` call, so it
/// alone sits behind a mutex; `next()` snapshots it once at the top of each
/// pair so a mid-pair configuration change never applies until the pair
/// after.
pub struct Assembler<'a, S, L> {
    config: Arc<Mutex<Config>>,
    modules: ModulePipeline,
    source: S,
    logger: L,
    quality_encoding: QualityEncoding,
    kmer_index: KmerIndex,
    fwd: Read,
    rev: Read,
    rev_rc: Read,
    result: AssembledResult,
    counters: Counters,
    last_error: Option<std::io::Error>,
    reject_sink: Option<Box<dyn FnMut(&str, &Classification, &RawRead, &RawRead) + 'a>>,
}

impl<'a, S: ReadPairSource, L: Logger> Assembler<'a, S, L> {
    pub fn new(source: S, logger: L, quality_encoding: QualityEncoding) -> Self {
        Assembler {
            config: Arc::new(Mutex::new(Config::default())),
            modules: ModulePipeline::new(),
            source,
            logger,
            quality_encoding,
            kmer_index: KmerIndex::new(),
            fwd: Read::new(),
            rev: Read::new(),
            rev_rc: Read::new(),
            result: AssembledResult::new(),
            counters: Counters::new(),
            last_error: None,
            reject_sink: None,
        }
    }

    /// Registers a callback invoked with the raw mates of every pair that
    /// does not reach [`Classification::Ok`]. Used by the process layer to
    /// implement `--unaligned-output`.
    pub fn set_reject_sink(&mut self, sink: Box<dyn FnMut(&str, &Classification, &RawRead, &RawRead) + 'a>) {
        self.reject_sink = Some(sink);
    }

    /// A cloneable handle to this assembler's configuration, safe to move
    /// to another thread and mutate while `next()` runs here.
    pub fn config_handle(&self) -> Arc<Mutex<Config>> {
        Arc::clone(&self.config)
    }

    pub fn add_module(&mut self, module: Arc<dyn crate::core::module_pipeline::Module>) {
        self.modules.add(module);
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Takes the last source IO error, if one ended iteration.
    pub fn take_error(&mut self) -> Option<std::io::Error> {
        self.last_error.take()
    }

    fn load_mate(&self, raw: &RawRead, out: &mut Read) {
        let mut truncated = false;
        let out_id = raw.id.clone();
        out.clear();
        out.id.push_str(&out_id);
        for (i, &byte) in raw.seq.iter().enumerate() {
            let qual_byte = raw.qual.get(i).copied().unwrap_or(self.quality_encoding.offset());
            let qual = self.quality_encoding.decode(qual_byte);
            let nt = Nucleotide::from_ascii(byte);
            if !out.push(BaseCell { nt, qual }) {
                truncated = true;
                break;
            }
        }
        if truncated {
            warn_truncated_once(&out_id);
        }
    }

    fn record(&mut self, read_id: &str, classification: Classification) {
        self.counters.record(&classification);
        self.logger.log(read_id, &classification);
    }

    /// Records a non-`Ok` classification and, if a reject sink is
    /// registered, hands it the pair's raw mates.
    fn reject(&mut self, read_id: &str, classification: Classification, pair: &crate::io::source::RawPair) {
        if let Some(sink) = self.reject_sink.as_mut() {
            sink(read_id, &classification, &pair.forward, &pair.reverse);
        }
        self.record(read_id, classification);
    }

    /// Advances to the next successfully assembled pair, logging and
    /// skipping over any number of rejected pairs along the way. Returns
    /// `None` at clean end of input or after a source IO error (retrievable
    /// via [`Self::take_error`]).
    pub fn next(&mut self) -> Option<&AssembledResult> {
        loop {
            let pair = match self.source.next_pair() {
                Ok(Some(pair)) => pair,
                Ok(None) => return None,
                Err(e) => {
                    self.last_error = Some(e);
                    return None;
                }
            };

            self.load_mate(&pair.forward, &mut self.fwd);
            self.load_mate(&pair.reverse, &mut self.rev);
            let read_id = self.fwd.id.clone();

            if let Err(tag) = self.modules.precheck(&self.fwd, &self.rev) {
                self.reject(&read_id, Classification::Module(tag.to_string()), &pair);
                continue;
            }

            let (log_threshold, min_overlap, forward_mode, reverse_mode, disallow_degenerates) = {
                let cfg = self.config.lock().expect("assembler config mutex poisoned");
                (cfg.log_threshold, cfg.min_overlap, cfg.forward, cfg.reverse, cfg.disallow_degenerates)
            };

            self.rev.reverse_complement_into(&mut self.rev_rc);

            let outcome = overlap::find_best(&self.fwd, &self.rev_rc, &mut self.kmer_index, min_overlap, log_threshold);

            let overlap_len = match outcome {
                OverlapOutcome::NoAlignment => {
                    self.reject(&read_id, Classification::NoAlignment, &pair);
                    continue;
                }
                OverlapOutcome::LowQuality { .. } => {
                    self.reject(&read_id, Classification::LowQuality, &pair);
                    continue;
                }
                OverlapOutcome::Found { overlap, .. } => overlap,
            };

            consensus::build(&self.fwd, &self.rev_rc, overlap_len, &mut self.result);

            if disallow_degenerates && self.result.degenerate {
                self.reject(&read_id, Classification::Degenerate, &pair);
                continue;
            }

            if !primer::apply_forward(&forward_mode, &mut self.result.bases) {
                self.reject(&read_id, Classification::NoForwardPrimer, &pair);
                continue;
            }

            if !primer::apply_reverse(&reverse_mode, &mut self.result.bases) {
                self.reject(&read_id, Classification::NoReversePrimer, &pair);
                continue;
            }

            if let Err(tag) = self.modules.check(&self.result) {
                self.reject(&read_id, Classification::Module(tag.to_string()), &pair);
                continue;
            }

            self.record(&read_id, Classification::Ok);
            return Some(&self.result);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::io::logger::NullLogger;
    use crate::io::source::RawPair;

    struct FixedSource {
        pairs: Vec<RawPair>,
        idx: usize,
    }

    impl ReadPairSource for FixedSource {
        fn next_pair(&mut self) -> std::io::Result<Option<RawPair>> {
            if self.idx >= self.pairs.len() {
                return Ok(None);
            }
            let pair = self.pairs[self.idx].clone();
            self.idx += 1;
            Ok(Some(pair))
        }
    }

    fn raw(id: &str, seq: &str, qual_char: char) -> RawRead {
        RawRead { id: id.to_string(), seq: seq.as_bytes().to_vec(), qual: vec![qual_char as u8; seq.len()] }
    }

    #[test]
    fn threshold_round_trips_within_epsilon() {
        let mut cfg = Config::default();
        cfg.set_threshold(0.42);
        assert!((cfg.threshold() - 0.42).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_threshold_is_silently_ignored() {
        let mut cfg = Config::default();
        let before = cfg.threshold();
        cfg.set_threshold(1.5);
        assert!((cfg.threshold() - before).abs() < 1e-12);
    }

    #[test]
    fn forward_primer_and_forward_trim_are_mutually_exclusive() {
        let mut cfg = Config::default();
        cfg.set_forward_trim(5);
        assert!(matches!(cfg.forward, EndMode::Trim(5)));
        cfg.set_forward_primer(primer::PrimerBuffer::from_ascii(b"ACGT"));
        assert!(matches!(cfg.forward, EndMode::Primer(_)));
    }

    #[test]
    fn exact_overlap_pair_assembles_successfully() {
        // 'I' == Phred33 quality 40.
        let forward = raw("pair1", "TTTTTTTTTTACGTACGTAC", 'I');
        let reverse = raw("pair1", "GTACGTACGTAAAAAAAAAA", 'I');
        let source = FixedSource { pairs: vec![RawPair { forward, reverse }], idx: 0 };
        let mut asm = Assembler::new(source, NullLogger, QualityEncoding::Phred33);
        {
            let mut cfg = asm.config.lock().unwrap();
            cfg.set_minimum_overlap(2);
        }
        let result = asm.next();
        assert!(result.is_some(), "expected a successful assembly");
        assert_eq!(asm.counters().ok, 1);
        assert_eq!(asm.counters().count, 1);
    }

    #[test]
    fn disjoint_pair_is_classified_no_alignment() {
        let forward = raw("pair2", "AAAAAAAAAAAAAAAAAAAA", 'I');
        let reverse = raw("pair2", "CCCCCCCCCCCCCCCCCCCC", 'I');
        let source = FixedSource { pairs: vec![RawPair { forward, reverse }], idx: 0 };
        let mut asm = Assembler::new(source, NullLogger, QualityEncoding::Phred33);
        let result = asm.next();
        assert!(result.is_none());
        assert_eq!(asm.counters().no_alignment, 1);
    }

    #[test]
    fn low_quality_overlap_is_rejected_even_when_a_candidate_is_found() {
        // Shares an exact 8-mer seed ("ACGTACGT") at the boundary, so a
        // candidate offset of 16 is proposed, but the other half of that
        // overlap disagrees at high quality, driving the per-base score
        // well under the default threshold.
        let forward = raw("low_q", "TTTTTTTTAAAAAAAAACGTACGT", 'I');
        let reverse = raw("low_q", "CCCCCCCCACGTACGTGGGGGGGG", 'I');
        let source = FixedSource { pairs: vec![RawPair { forward, reverse }], idx: 0 };
        let mut asm = Assembler::new(source, NullLogger, QualityEncoding::Phred33);
        {
            let mut cfg = asm.config.lock().unwrap();
            cfg.set_minimum_overlap(2);
        }
        let result = asm.next();
        assert!(result.is_none());
        assert_eq!(asm.counters().low_quality, 1);
    }

    #[test]
    fn degenerate_consensus_is_rejected_when_disallowed() {
        // The overlap's seeded region matches exactly, but both mates carry
        // an 'N' at the same overlap position, forcing a degenerate (N)
        // consensus base there.
        let forward = raw("degen", "TTTTTTTTACGTACGTNA", 'I');
        let reverse = raw("degen", "CCCCCCCCTNACGTACGT", 'I');
        let source = FixedSource { pairs: vec![RawPair { forward, reverse }], idx: 0 };
        let mut asm = Assembler::new(source, NullLogger, QualityEncoding::Phred33);
        {
            let mut cfg = asm.config.lock().unwrap();
            cfg.set_disallow_degenerates(true);
        }
        let result = asm.next();
        assert!(result.is_none());
        assert_eq!(asm.counters().degenerate, 1);
    }

    #[test]
    fn missing_forward_primer_is_classified_no_forward_primer() {
        let forward = raw("pair1", "TTTTTTTTTTACGTACGTAC", 'I');
        let reverse = raw("pair1", "GTACGTACGTAAAAAAAAAA", 'I');
        let source = FixedSource { pairs: vec![RawPair { forward, reverse }], idx: 0 };
        let mut asm = Assembler::new(source, NullLogger, QualityEncoding::Phred33);
        {
            let mut cfg = asm.config.lock().unwrap();
            cfg.set_minimum_overlap(2);
            cfg.set_forward_primer(primer::PrimerBuffer::from_ascii(b"GGGGGGGG"));
        }
        let result = asm.next();
        assert!(result.is_none());
        assert_eq!(asm.counters().no_forward_primer, 1);
    }

    #[test]
    fn missing_reverse_primer_is_classified_no_reverse_primer() {
        let forward = raw("pair1", "TTTTTTTTTTACGTACGTAC", 'I');
        let reverse = raw("pair1", "GTACGTACGTAAAAAAAAAA", 'I');
        let source = FixedSource { pairs: vec![RawPair { forward, reverse }], idx: 0 };
        let mut asm = Assembler::new(source, NullLogger, QualityEncoding::Phred33);
        {
            let mut cfg = asm.config.lock().unwrap();
            cfg.set_minimum_overlap(2);
            cfg.set_reverse_primer(primer::PrimerBuffer::from_ascii(b"GGGGGGGG"));
        }
        let result = asm.next();
        assert!(result.is_none());
        assert_eq!(asm.counters().no_reverse_primer, 1);
    }

    #[test]
    fn counters_count_equals_sum_of_terminal_buckets_after_a_run() {
        let pairs = vec![
            RawPair { forward: raw("a", "AAAAAAAAAAAAAAAAAAAA", 'I'), reverse: raw("a", "CCCCCCCCCCCCCCCCCCCC", 'I') },
            RawPair {
                forward: raw("b", "TTTTTTTTTTACGTACGTAC", 'I'),
                reverse: raw("b", "GTACGTACGTAAAAAAAAAA", 'I'),
            },
        ];
        let source = FixedSource { pairs, idx: 0 };
        let mut asm = Assembler::new(source, NullLogger, QualityEncoding::Phred33);
        {
            let mut cfg = asm.config.lock().unwrap();
            cfg.set_minimum_overlap(2);
        }
        while asm.next().is_some() {}
        let c = asm.counters();
        let sum = c.ok + c.no_alignment + c.low_quality + c.degenerate + c.no_forward_primer + c.no_reverse_primer;
        assert_eq!(c.count, sum);
        assert_eq!(c.count, 2);
    }
}
