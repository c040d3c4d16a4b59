//! The `assemble` subcommand: opens one or more forward/reverse FASTQ
//! shards, runs each through its own [`Assembler`], and merges the results.
//!
//! Shards are independent by construction (distinct files, distinct
//! assembler instances), so they fan out across a `rayon` thread pool; each
//! shard accumulates its output in memory and the shards are stitched back
//! together in input order afterward, keeping run-to-run output
//! deterministic regardless of which shard finishes first.

use crate::args::assemble::AssembleArgs;
use crate::core::assembler::Assembler;
use crate::core::classification::Counters;
use crate::core::module_pipeline::{MinLengthModule, MinQualityModule};
use crate::core::primer::PrimerBuffer;
use crate::core::quality::QualityEncoding;
use crate::io::logger::StderrLogger;
use crate::io::source::{InterleavedPairSource, ReadPairSource, TwoFilePairSource};
use crate::io::writer::{self, write_fasta, write_fastq, write_unaligned_pair};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

static MODULE: &str = module_path!();

struct ShardInput {
    forward: PathBuf,
    reverse: Option<PathBuf>,
}

struct ShardOutput {
    assembled: Vec<u8>,
    unaligned: Vec<u8>,
    counters: Counters,
}

fn build_shards(args: &AssembleArgs) -> std::io::Result<Vec<ShardInput>> {
    if !args.reverse.is_empty() && args.reverse.len() != args.forward.len() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} forward file(s) but {} reverse file(s): counts must match", args.forward.len(), args.reverse.len()),
        ));
    }
    Ok(args
        .forward
        .iter()
        .enumerate()
        .map(|(i, f)| ShardInput { forward: f.clone(), reverse: args.reverse.get(i).cloned() })
        .collect())
}

fn parse_primer(seq: &str) -> PrimerBuffer {
    PrimerBuffer::from_ascii(seq.as_bytes())
}

fn run_shard(shard: &ShardInput, args: &AssembleArgs) -> std::io::Result<ShardOutput> {
    let encoding = if args.phred64 { QualityEncoding::Phred64 } else { QualityEncoding::Phred33 };

    let source = match &shard.reverse {
        Some(reverse_path) => either::Either::Left(TwoFilePairSource::open(&shard.forward, reverse_path)?),
        None => either::Either::Right(InterleavedPairSource::open(&shard.forward)?),
    };
    run_with_source(source, args, encoding)
}

fn run_with_source<S: ReadPairSource>(source: S, args: &AssembleArgs, encoding: QualityEncoding) -> std::io::Result<ShardOutput> {
    let mut assembled = Vec::new();
    let mut unaligned = Vec::new();

    let logger = StderrLogger { verbose: args.verbose };
    let mut assembler = Assembler::new(source, logger, encoding);

    {
        let config = assembler.config_handle();
        let mut cfg = config.lock().expect("assembler config mutex poisoned");
        cfg.set_threshold(args.threshold);
        cfg.set_error_estimation(args.error_estimation);
        cfg.set_minimum_overlap(args.min_overlap);
        cfg.set_disallow_degenerates(args.disallow_degenerates);

        match (&args.forward_primer, args.forward_trim) {
            (Some(p), _) => cfg.set_forward_primer(parse_primer(p)),
            (None, Some(n)) => cfg.set_forward_trim(n),
            (None, None) => {}
        }
        match (&args.reverse_primer, args.reverse_trim) {
            (Some(p), _) => cfg.set_reverse_primer(parse_primer(p)),
            (None, Some(n)) => cfg.set_reverse_trim(n),
            (None, None) => {}
        }
    }

    if args.min_length > 0 {
        assembler.add_module(Arc::new(MinLengthModule { min_len: args.min_length }));
    }
    if let Some(min_q) = args.min_overall_quality {
        assembler.add_module(Arc::new(MinQualityModule { min_overall_quality: min_q }));
    }

    if args.unaligned_output.is_some() {
        assembler.set_reject_sink(Box::new(|_read_id, _classification, forward, reverse| {
            let _ = write_unaligned_pair(
                &mut unaligned,
                &forward.id,
                &forward.seq,
                &forward.qual,
                &reverse.id,
                &reverse.seq,
                &reverse.qual,
            );
        }));
    }

    while let Some(result) = assembler.next() {
        if args.fastq_output { write_fastq(&mut assembled, result)?; } else { write_fasta(&mut assembled, result)?; }
    }

    if let Some(e) = assembler.take_error() {
        eprintln!("[{MODULE}] WARNING shard ended early due to an IO error: {e}");
    }

    let counters = assembler.counters().clone();
    drop(assembler);
    Ok(ShardOutput { assembled, unaligned, counters })
}

/// Runs the full `assemble` subcommand end to end: builds shards, fans them
/// out, merges output in shard order, and writes the stats report.
pub fn assemble_process(args: &AssembleArgs) -> std::io::Result<()> {
    let shards = build_shards(args)?;

    #[cfg(not(feature = "dev_no_rayon"))]
    let shard_results: Vec<std::io::Result<ShardOutput>> = {
        use rayon::prelude::*;
        let num_threads = args.threads.unwrap_or_else(|| num_cpus::get().min(shards.len().max(1)));
        let pool = rayon::ThreadPoolBuilder::new().num_threads(num_threads).build().map_err(std::io::Error::other)?;
        pool.install(|| shards.par_iter().map(|shard| run_shard(shard, args)).collect())
    };

    #[cfg(feature = "dev_no_rayon")]
    let shard_results: Vec<std::io::Result<ShardOutput>> = shards.iter().map(|shard| run_shard(shard, args)).collect();

    let mut assembled_writer = writer::open_output(args.output.as_ref())?;
    let mut unaligned_writer = match &args.unaligned_output {
        Some(p) => Some(writer::open_output(Some(p))?),
        None => None,
    };
    let mut total = Counters::new();

    for result in shard_results {
        let shard = result?;
        assembled_writer.write_all(&shard.assembled)?;
        if let Some(w) = unaligned_writer.as_mut() {
            w.write_all(&shard.unaligned)?;
        }
        total.count += shard.counters.count;
        total.ok += shard.counters.ok;
        total.no_alignment += shard.counters.no_alignment;
        total.low_quality += shard.counters.low_quality;
        total.degenerate += shard.counters.degenerate;
        total.no_forward_primer += shard.counters.no_forward_primer;
        total.no_reverse_primer += shard.counters.no_reverse_primer;
        for (tag, n) in shard.counters.modules {
            *total.modules.entry(tag).or_insert(0) += n;
        }
    }

    assembled_writer.flush()?;
    if let Some(w) = unaligned_writer.as_mut() {
        w.flush()?;
    }

    let mut log_writer = writer::open_output(args.log_file.as_ref())?;
    writer::write_stats_report(&mut log_writer, &total, args.threshold, args.min_overlap)?;
    log_writer.flush()?;

    eprintln!(
        "[{MODULE}] {} pairs processed, {} assembled ({:.1}%)",
        total.count,
        total.ok,
        if total.count > 0 { 100.0 * total.ok as f64 / total.count as f64 } else { 0.0 }
    );

    Ok(())
}
