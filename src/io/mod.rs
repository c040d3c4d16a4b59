//! Ambient IO: gzip-transparent file opening, paired FASTQ reading,
//! classification logging, and consensus/report writing.

pub mod logger;
pub mod source;
pub mod writer;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufWriter, Read, Stdout, Write, stdout};
use std::path::Path;

#[inline]
pub fn is_gz(path: impl AsRef<Path>) -> bool {
    path.as_ref().extension().is_some_and(|ext| ext == "gz")
}

/// A reader for either a plain file or a gzip-compressed one, chosen
/// transparently from the file extension at open time.
pub enum ReadFileZip {
    File(File),
    Zipped(MultiGzDecoder<File>),
}

impl ReadFileZip {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::open(&path)?;
        if is_gz(&path) { Ok(Self::Zipped(MultiGzDecoder::new(file))) } else { Ok(Self::File(file)) }
    }
}

impl Read for ReadFileZip {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            ReadFileZip::File(f) => f.read(buf),
            ReadFileZip::Zipped(z) => z.read(buf),
        }
    }
}

/// A writer for either a plain file, a gzip-compressed file, or stdout,
/// chosen transparently from the output path (or its absence).
pub enum WriteFileZipStdout {
    File(BufWriter<File>),
    Zipped(GzEncoder<BufWriter<File>>),
    Stdout(BufWriter<Stdout>),
}

impl WriteFileZipStdout {
    pub fn create(path: Option<impl AsRef<Path>>) -> std::io::Result<Self> {
        match path {
            Some(p) => {
                let file = File::create(&p)?;
                let buf = BufWriter::new(file);
                if is_gz(&p) { Ok(Self::Zipped(GzEncoder::new(buf, Compression::default()))) } else { Ok(Self::File(buf)) }
            }
            None => Ok(Self::Stdout(BufWriter::new(stdout()))),
        }
    }
}

impl Write for WriteFileZipStdout {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            WriteFileZipStdout::File(w) => w.write(buf),
            WriteFileZipStdout::Zipped(w) => w.write(buf),
            WriteFileZipStdout::Stdout(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            WriteFileZipStdout::File(w) => w.flush(),
            WriteFileZipStdout::Zipped(w) => w.flush(),
            WriteFileZipStdout::Stdout(w) => w.flush(),
        }
    }
}

/// Distinguishes which of a pair of opened files failed, so the caller can
/// report a useful path in the error message.
#[derive(Debug)]
pub enum OpenFastqError {
    Forward(std::io::Error),
    Reverse(std::io::Error),
}

impl std::fmt::Display for OpenFastqError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            OpenFastqError::Forward(e) => write!(f, "forward file: {e}"),
            OpenFastqError::Reverse(e) => write!(f, "reverse file: {e}"),
        }
    }
}

impl std::error::Error for OpenFastqError {}

impl From<OpenFastqError> for std::io::Error {
    fn from(e: OpenFastqError) -> Self {
        std::io::Error::other(e.to_string())
    }
}
