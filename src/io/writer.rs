//! Writing assembled consensus reads and the end-of-run stats report.

use crate::core::classification::Counters;
use crate::core::consensus::AssembledResult;
use crate::io::WriteFileZipStdout;
use indoc::writedoc;
use std::io::Write;

/// Writes one assembled consensus as FASTA: `>id\nSEQUENCE\n`.
pub fn write_fasta(writer: &mut impl Write, result: &AssembledResult) -> std::io::Result<()> {
    writeln!(writer, ">{}", result.id)?;
    for cell in &result.bases {
        write!(writer, "{}", cell.nt.to_ascii() as char)?;
    }
    writeln!(writer)
}

/// Writes one assembled consensus as FASTQ, re-encoding recalibrated
/// qualities as Phred+33.
pub fn write_fastq(writer: &mut impl Write, result: &AssembledResult) -> std::io::Result<()> {
    writeln!(writer, "@{}", result.id)?;
    for cell in &result.bases {
        write!(writer, "{}", cell.nt.to_ascii() as char)?;
    }
    writeln!(writer, "\n+")?;
    for cell in &result.bases {
        write!(writer, "{}", (33 + cell.qual.value()) as char)?;
    }
    writeln!(writer)
}

/// Writes a rejected pair to an "unaligned" sidecar as interleaved FASTQ,
/// preserving both original mates for inspection.
pub fn write_unaligned_pair(
    writer: &mut impl Write, forward_id: &str, forward_seq: &[u8], forward_qual: &[u8], reverse_id: &str,
    reverse_seq: &[u8], reverse_qual: &[u8],
) -> std::io::Result<()> {
    writeln!(writer, "@{forward_id}")?;
    writer.write_all(forward_seq)?;
    writeln!(writer, "\n+")?;
    writer.write_all(forward_qual)?;
    writeln!(writer)?;

    writeln!(writer, "@{reverse_id}")?;
    writer.write_all(reverse_seq)?;
    writeln!(writer, "\n+")?;
    writer.write_all(reverse_qual)?;
    writeln!(writer)
}

/// Writes the tab-separated end-of-run stats report.
pub fn write_stats_report(
    writer: &mut impl Write, counters: &Counters, threshold: f64, min_overlap: usize,
) -> std::io::Result<()> {
    writedoc!(
        writer,
        "
        PAIRS_TOTAL\t{total}
        PAIRS_ASSEMBLED\t{ok}
        PAIRS_NO_ALIGNMENT\t{no_alignment}
        PAIRS_LOW_QUALITY\t{low_quality}
        PAIRS_DEGENERATE\t{degenerate}
        PAIRS_NO_FORWARD_PRIMER\t{no_forward_primer}
        PAIRS_NO_REVERSE_PRIMER\t{no_reverse_primer}
        QUALITY_THRESHOLD\t{threshold}
        MIN_OVERLAP\t{min_overlap}
        ",
        total = counters.count,
        ok = counters.ok,
        no_alignment = counters.no_alignment,
        low_quality = counters.low_quality,
        degenerate = counters.degenerate,
        no_forward_primer = counters.no_forward_primer,
        no_reverse_primer = counters.no_reverse_primer,
    )?;
    for (tag, count) in &counters.modules {
        writeln!(writer, "MODULE_{tag}\t{count}")?;
    }
    Ok(())
}

pub fn open_output(path: Option<impl AsRef<std::path::Path>>) -> std::io::Result<WriteFileZipStdout> {
    WriteFileZipStdout::create(path)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::nucleotide::A;
    use crate::core::quality::Quality;
    use crate::core::read::BaseCell;

    #[test]
    fn fasta_output_has_header_and_sequence_lines() {
        let mut result = AssembledResult::new();
        result.id.push_str("p1");
        result.bases = vec![BaseCell { nt: A, qual: Quality::new(30) }; 4];
        let mut buf = Vec::new();
        write_fasta(&mut buf, &result).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, ">p1\nAAAA\n");
    }

    #[test]
    fn stats_report_contains_every_counter_field() {
        let mut counters = Counters::new();
        counters.record(&crate::core::classification::Classification::Ok);
        let mut buf = Vec::new();
        write_stats_report(&mut buf, &counters, 0.6, 10).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("PAIRS_TOTAL\t1"));
        assert!(text.contains("PAIRS_ASSEMBLED\t1"));
    }
}
