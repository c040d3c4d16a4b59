use clap::{Args, ValueHint};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct AssembleArgs {
    /// One or more forward (R1) FASTQ files, each a separate shard. May be
    /// gzip-compressed (`.gz`). Shards are assembled in parallel.
    #[arg(required = true, num_args = 1.., value_hint = ValueHint::FilePath)]
    pub forward: Vec<PathBuf>,

    /// Reverse (R2) FASTQ files, one per forward shard and in the same
    /// order. Omit entirely to treat every forward file as an interleaved
    /// file containing both mates.
    #[arg(short = 'R', long, num_args = 1.., value_hint = ValueHint::FilePath)]
    pub reverse: Vec<PathBuf>,

    /// Where to write assembled consensus sequences. Defaults to stdout.
    /// A `.gz` extension writes gzip-compressed output.
    #[arg(short = 'o', long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Write assembled output as FASTQ (with recalibrated qualities)
    /// instead of FASTA.
    #[arg(short = 'q', long)]
    pub fastq_output: bool,

    /// Write unassembled/rejected pairs, as interleaved FASTQ, to this file.
    #[arg(short = 'u', long, value_hint = ValueHint::FilePath)]
    pub unaligned_output: Option<PathBuf>,

    /// Write the end-of-run tab-separated stats report here instead of stderr.
    #[arg(short = 'L', long, value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Log every pair's classification, not just rejections.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Minimum per-base overlap probability required to accept an assembly,
    /// in `(0, 1)`.
    #[arg(short = 't', long, default_value_t = crate::core::assembler::DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Expected per-base error rate used to score the overlap, in `(0, 1)`.
    #[arg(short = 'e', long, default_value_t = crate::core::assembler::DEFAULT_ERROR_ESTIMATION)]
    pub error_estimation: f64,

    /// Minimum overlap length to consider, in `(1, MAX_LEN)`.
    #[arg(short = 'O', long, default_value_t = crate::core::assembler::DEFAULT_MIN_OVERLAP)]
    pub min_overlap: usize,

    /// Reject assemblies whose consensus contains an ambiguous (IUPAC
    /// degenerate or `N`) base anywhere in the overlap region.
    #[arg(short = 'N', long)]
    pub disallow_degenerates: bool,

    /// Forward-end IUPAC primer to locate and clip. Mutually exclusive with
    /// `--forward-trim`; if both are given, the primer takes priority and
    /// the trim is ignored.
    #[arg(short = 'p', long)]
    pub forward_primer: Option<String>,

    /// Reverse-end IUPAC primer to locate and clip. Mutually exclusive with
    /// `--reverse-trim`; if both are given, the primer takes priority and
    /// the trim is ignored.
    #[arg(short = 'r', long)]
    pub reverse_primer: Option<String>,

    /// Unconditionally trim this many bases from the assembled 5' end.
    /// Ignored if `--forward-primer` is also given.
    #[arg(long)]
    pub forward_trim: Option<usize>,

    /// Unconditionally trim this many bases from the assembled 3' end.
    /// Ignored if `--reverse-primer` is also given.
    #[arg(long)]
    pub reverse_trim: Option<usize>,

    /// Reject assemblies shorter than this many bases.
    #[arg(short = 'l', long, default_value_t = 0)]
    pub min_length: usize,

    /// Reject assemblies whose overall quality (exp of summed
    /// log-probabilities) falls below this value.
    #[arg(short = 'Q', long)]
    pub min_overall_quality: Option<f64>,

    /// Input quality scores use the legacy Phred+64 (Solexa/early Illumina)
    /// offset instead of Phred+33.
    #[arg(long)]
    pub phred64: bool,

    /// Number of worker threads to fan a multi-shard run across. Defaults
    /// to the number of logical CPUs.
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,
}
