//! Ordered chain of pluggable filter modules applied before and after
//! overlap assembly.

use crate::core::consensus::AssembledResult;
use crate::core::read::Read;
use std::sync::Arc;

/// A single filter stage. Most modules only need [`Module::check`]; a raw
/// read pair precheck is available for modules that can reject before the
/// (more expensive) overlap assembly even runs.
pub trait Module: Send + Sync {
    fn name(&self) -> &'static str;

    /// Called once per pair, before assembly. Returning `Err` short-circuits
    /// the pair with the module's tag.
    fn precheck(&self, _forward: &Read, _reverse: &Read) -> Result<(), &'static str> {
        Ok(())
    }

    /// Called once per pair, after a consensus was successfully assembled.
    fn check(&self, _result: &AssembledResult) -> Result<(), &'static str> {
        Ok(())
    }
}

/// An ordered, shareable chain of [`Module`]s. Order matters: modules run
/// in registration order and the first rejection wins.
#[derive(Clone, Default)]
pub struct ModulePipeline {
    modules: Vec<Arc<dyn Module>>,
}

impl ModulePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, module: Arc<dyn Module>) {
        self.modules.push(module);
    }

    pub fn precheck(&self, forward: &Read, reverse: &Read) -> Result<(), &'static str> {
        for module in &self.modules {
            module.precheck(forward, reverse)?;
        }
        Ok(())
    }

    pub fn check(&self, result: &AssembledResult) -> Result<(), &'static str> {
        for module in &self.modules {
            module.check(result)?;
        }
        Ok(())
    }
}

/// Rejects consensus reads shorter than a minimum length.
pub struct MinLengthModule {
    pub min_len: usize,
}

impl Module for MinLengthModule {
    fn name(&self) -> &'static str {
        "min_length"
    }

    fn check(&self, result: &AssembledResult) -> Result<(), &'static str> {
        if result.bases.len() < self.min_len { Err("SHORT") } else { Ok(()) }
    }
}

/// Rejects consensus reads whose overall quality falls below a minimum.
pub struct MinQualityModule {
    pub min_overall_quality: f64,
}

impl Module for MinQualityModule {
    fn name(&self) -> &'static str {
        "min_quality"
    }

    fn check(&self, result: &AssembledResult) -> Result<(), &'static str> {
        if result.overall_quality() < self.min_overall_quality { Err("LOWOVQ") } else { Ok(()) }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::nucleotide::A;
    use crate::core::quality::Quality;
    use crate::core::read::BaseCell;

    fn result_of_len(n: usize) -> AssembledResult {
        let mut r = AssembledResult::new();
        r.bases = vec![BaseCell { nt: A, qual: Quality::new(30) }; n];
        r
    }

    #[test]
    fn min_length_module_rejects_short_results() {
        let m = MinLengthModule { min_len: 10 };
        assert!(m.check(&result_of_len(5)).is_err());
        assert!(m.check(&result_of_len(10)).is_ok());
    }

    #[test]
    fn pipeline_short_circuits_on_first_failing_module() {
        let mut pipeline = ModulePipeline::new();
        pipeline.add(Arc::new(MinLengthModule { min_len: 20 }));
        pipeline.add(Arc::new(MinQualityModule { min_overall_quality: 0.5 }));
        let err = pipeline.check(&result_of_len(5)).unwrap_err();
        assert_eq!(err, "SHORT");
    }

    #[test]
    fn pipeline_passes_when_every_module_accepts() {
        let mut pipeline = ModulePipeline::new();
        pipeline.add(Arc::new(MinLengthModule { min_len: 1 }));
        let mut result = result_of_len(5);
        result.overall_log_p = 0.0; // exp(0) == 1.0
        assert!(pipeline.check(&result).is_ok());
    }
}
