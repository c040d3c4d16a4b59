//! Paired FASTQ reading: parses two interleaved 4-line-per-record files (or
//! a single interleaved one) into raw (header, sequence, quality) pairs.

use crate::io::{OpenFastqError, ReadFileZip};
use crate::utils::check_paired_headers;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One mate of a pair, still in raw ASCII form (undecoded).
#[derive(Debug, Clone, Default)]
pub struct RawRead {
    pub id: String,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

/// A forward/reverse pair with validated, matching molecular IDs.
#[derive(Debug, Clone, Default)]
pub struct RawPair {
    pub forward: RawRead,
    pub reverse: RawRead,
}

/// Anything that can hand back one validated read pair at a time.
pub trait ReadPairSource {
    /// Returns the next pair, `None` at clean end of input, or an IO error
    /// (malformed FASTQ, a read error, or mismatched mate IDs) that ends
    /// iteration.
    fn next_pair(&mut self) -> std::io::Result<Option<RawPair>>;
}

impl<L: ReadPairSource, R: ReadPairSource> ReadPairSource for either::Either<L, R> {
    fn next_pair(&mut self) -> std::io::Result<Option<RawPair>> {
        match self {
            either::Either::Left(l) => l.next_pair(),
            either::Either::Right(r) => r.next_pair(),
        }
    }
}

/// Reads one FASTQ record from a buffered reader. Returns `Ok(None)` at a
/// clean EOF (no partial record started).
fn read_record(reader: &mut impl BufRead) -> std::io::Result<Option<RawRead>> {
    let mut header_line = String::new();
    if reader.read_line(&mut header_line)? == 0 {
        return Ok(None);
    }
    let header = header_line.trim_end_matches(['\n', '\r']);
    if !header.starts_with('@') {
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, format!("expected '@' header, got: {header}")));
    }
    let id = header[1..].to_string();

    let mut seq_line = String::new();
    reader.read_line(&mut seq_line)?;
    let seq = seq_line.trim_end_matches(['\n', '\r']).as_bytes().to_vec();

    let mut plus_line = String::new();
    reader.read_line(&mut plus_line)?;
    if !plus_line.trim_end_matches(['\n', '\r']).starts_with('+') {
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "expected '+' separator line"));
    }

    let mut qual_line = String::new();
    reader.read_line(&mut qual_line)?;
    let qual = qual_line.trim_end_matches(['\n', '\r']).as_bytes().to_vec();

    if qual.len() != seq.len() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("sequence/quality length mismatch for read '{id}'"),
        ));
    }

    Ok(Some(RawRead { id, seq, qual }))
}

/// Reads forward and reverse mates from two separate files.
pub struct TwoFilePairSource {
    forward: BufReader<ReadFileZip>,
    reverse: BufReader<ReadFileZip>,
}

impl TwoFilePairSource {
    pub fn open(forward_path: impl AsRef<Path>, reverse_path: impl AsRef<Path>) -> Result<Self, OpenFastqError> {
        let forward = ReadFileZip::open(&forward_path).map_err(OpenFastqError::Forward)?;
        let reverse = ReadFileZip::open(&reverse_path).map_err(OpenFastqError::Reverse)?;
        Ok(TwoFilePairSource { forward: BufReader::new(forward), reverse: BufReader::new(reverse) })
    }
}

impl ReadPairSource for TwoFilePairSource {
    fn next_pair(&mut self) -> std::io::Result<Option<RawPair>> {
        let forward = read_record(&mut self.forward)?;
        let reverse = read_record(&mut self.reverse)?;
        match (forward, reverse) {
            (None, None) => Ok(None),
            (Some(_), None) | (None, Some(_)) => {
                Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "forward and reverse files have different record counts"))
            }
            (Some(forward), Some(reverse)) => {
                check_paired_headers(&forward.id, &reverse.id)?;
                Ok(Some(RawPair { forward, reverse }))
            }
        }
    }
}

/// Reads forward/reverse mates interleaved two records at a time from a
/// single file.
pub struct InterleavedPairSource {
    reader: BufReader<ReadFileZip>,
}

impl InterleavedPairSource {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(InterleavedPairSource { reader: BufReader::new(ReadFileZip::open(path)?) })
    }
}

impl ReadPairSource for InterleavedPairSource {
    fn next_pair(&mut self) -> std::io::Result<Option<RawPair>> {
        let forward = match read_record(&mut self.reader)? {
            Some(r) => r,
            None => return Ok(None),
        };
        let reverse = read_record(&mut self.reader)?.ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "interleaved file has an odd number of records")
        })?;
        check_paired_headers(&forward.id, &reverse.id)?;
        Ok(Some(RawPair { forward, reverse }))
    }
}
