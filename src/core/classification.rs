//! The terminal classification of a processed pair, and the run-wide
//! counters keyed by it.

use std::collections::HashMap;

/// Every way a pair can end up. `Module` carries the short tag the failing
/// filter module reported (e.g. `"SHORT"`), so the logger and stats report
/// can attribute rejections per-module without the core knowing every
/// module that might ever exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Ok,
    NoAlignment,
    LowQuality,
    Degenerate,
    NoForwardPrimer,
    NoReversePrimer,
    Module(String),
}

impl Classification {
    pub fn code(&self) -> &str {
        match self {
            Classification::Ok => "OK",
            Classification::NoAlignment => "NOALGN",
            Classification::LowQuality => "LOWQ",
            Classification::Degenerate => "DEGEN",
            Classification::NoForwardPrimer => "NOFP",
            Classification::NoReversePrimer => "NORP",
            Classification::Module(tag) => tag,
        }
    }
}

/// Per-run terminal-state tallies. `count` must always equal the sum of
/// every other field (see the `core::assembler` unit test that checks this
/// invariant end-to-end).
#[derive(Debug, Clone, Default)]
pub struct Counters {
    pub count: u64,
    pub ok: u64,
    pub no_alignment: u64,
    pub low_quality: u64,
    pub degenerate: u64,
    pub no_forward_primer: u64,
    pub no_reverse_primer: u64,
    pub modules: HashMap<String, u64>,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, classification: &Classification) {
        self.count += 1;
        match classification {
            Classification::Ok => self.ok += 1,
            Classification::NoAlignment => self.no_alignment += 1,
            Classification::LowQuality => self.low_quality += 1,
            Classification::Degenerate => self.degenerate += 1,
            Classification::NoForwardPrimer => self.no_forward_primer += 1,
            Classification::NoReversePrimer => self.no_reverse_primer += 1,
            Classification::Module(tag) => *self.modules.entry(tag.clone()).or_insert(0) += 1,
        }
    }

    #[cfg(test)]
    fn sum_of_terminals(&self) -> u64 {
        self.ok
            + self.no_alignment
            + self.low_quality
            + self.degenerate
            + self.no_forward_primer
            + self.no_reverse_primer
            + self.modules.values().sum::<u64>()
    }
}
