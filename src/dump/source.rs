//! Dump byte sources: plain or bzip2-compressed MediaWiki XML

use crate::error::MinerError;
use bzip2::read::MultiBzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Read buffer for dump files (1MB)
const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Compression applied to a dump file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpCompression {
    /// `*.xml`
    Plain,
    /// `*.xml.bz2` (single or multistream)
    Bzip2,
}

impl DumpCompression {
    /// Detect compression from the file name
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();

        if name.ends_with(".xml.bz2") {
            Some(DumpCompression::Bzip2)
        } else if name.ends_with(".xml") {
            Some(DumpCompression::Plain)
        } else {
            None
        }
    }
}

/// Reader abstraction for the supported compression formats
enum DumpReader {
    /// Bzip2 compressed; Wikimedia ships multistream archives
    Bzip2(BufReader<MultiBzDecoder<Box<dyn Read + Send>>>),
    /// Uncompressed XML
    Plain(BufReader<Box<dyn Read + Send>>),
}

impl DumpReader {
    fn read_line(&mut self, buf: &mut Vec<u8>) -> std::io::Result<usize> {
        buf.clear();
        match self {
            DumpReader::Bzip2(reader) => reader.read_until(b'\n', buf),
            DumpReader::Plain(reader) => reader.read_until(b'\n', buf),
        }
    }
}

/// A MediaWiki dump opened for a single front-to-back read.
///
/// Dropping the source closes the underlying file or stream.
pub struct DumpSource {
    name: String,
    reader: DumpReader,
    bytes_read: u64,
}

impl DumpSource {
    /// Open a dump file. `-` reads plain XML from standard input.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MinerError> {
        let path = path.as_ref();

        if path.as_os_str() == "-" {
            return Ok(Self::from_reader("<stdin>", std::io::stdin(), DumpCompression::Plain));
        }

        let compression = DumpCompression::detect(path).ok_or_else(|| {
            MinerError::InvalidFormat(format!(
                "dump file must end in '.xml' or '.xml.bz2' (got '{}')",
                path.display()
            ))
        })?;

        let file = File::open(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::from_reader(name, file, compression))
    }

    /// Wrap an arbitrary byte stream
    pub fn from_reader<R>(name: impl Into<String>, reader: R, compression: DumpCompression) -> Self
    where
        R: Read + Send + 'static,
    {
        let inner: Box<dyn Read + Send> = Box::new(reader);
        let reader = match compression {
            DumpCompression::Bzip2 => DumpReader::Bzip2(BufReader::with_capacity(
                READ_BUFFER_SIZE,
                MultiBzDecoder::new(inner),
            )),
            DumpCompression::Plain => {
                DumpReader::Plain(BufReader::with_capacity(READ_BUFFER_SIZE, inner))
            }
        };

        Self {
            name: name.into(),
            reader,
            bytes_read: 0,
        }
    }

    /// Read one raw line (including its terminator) into `buf`.
    /// Returns 0 at end of input.
    pub fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<usize, MinerError> {
        let n = self.reader.read_line(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }

    /// Decompressed bytes consumed so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Name for display
    pub fn source_name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for DumpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DumpSource")
            .field("name", &self.name)
            .field("bytes_read", &self.bytes_read)
            .finish()
    }
}
