//! Per-pair classification logging. The teacher's processes never reach for
//! a logging crate, just tagged `eprintln!`, so neither do we.

use crate::core::classification::Classification;

static MODULE: &str = module_path!();

/// Anything that can record a pair's terminal classification as it happens.
/// Implementations must not fail the assembly run; a logger that can't
/// write its destination should degrade to silence rather than panic.
pub trait Logger: Send + Sync {
    fn log(&self, read_id: &str, classification: &Classification);
}

/// Writes one tab-separated line per pair to stderr: `id\tCODE`.
pub struct StderrLogger {
    pub verbose: bool,
}

impl Logger for StderrLogger {
    fn log(&self, read_id: &str, classification: &Classification) {
        if self.verbose || !matches!(classification, Classification::Ok) {
            eprintln!("[{MODULE}] {read_id}\t{}", classification.code());
        }
    }
}

/// Discards every classification. Used when `--log` is not requested.
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _read_id: &str, _classification: &Classification) {}
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn null_logger_never_panics_on_any_classification() {
        let logger = NullLogger;
        logger.log("x", &Classification::Ok);
        logger.log("x", &Classification::Module("SHORT".into()));
    }
}
