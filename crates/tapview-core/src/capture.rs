//! Capture export reader
//!
//! Reads a `tshark -T ek` export line by line. EK output interleaves index
//! metadata lines with packet records; only lines starting with
//! [`PACKET_RECORD_PREFIX`] are packet records; everything else is skipped.

use crate::error::DecodeResult;
use crate::packet::PacketTree;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, trace};

/// Prefix identifying packet record lines
pub const PACKET_RECORD_PREFIX: &str = "{\"timestamp\":";

/// Required input file suffix
pub const INPUT_SUFFIX: &str = ".json";

/// Capture file errors
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Wrong format of input file. JSON is expected: {0}")]
    WrongFormat(PathBuf),

    #[error("Failed to read capture file: {0}")]
    Io(#[from] io::Error),
}

pub type CaptureResult<T> = Result<T, CaptureError>;

/// Reject input files whose name does not end in `.json`
pub fn validate_input_path(path: &Path) -> CaptureResult<()> {
    if path.to_string_lossy().ends_with(INPUT_SUFFIX) {
        Ok(())
    } else {
        Err(CaptureError::WrongFormat(path.to_path_buf()))
    }
}

/// One packet record line
#[derive(Debug, Clone)]
pub struct CaptureLine {
    /// 1-based line number in the input
    pub number: u64,

    /// Raw line without the line terminator. Not checked for UTF-8 yet.
    pub bytes: Vec<u8>,
}

impl CaptureLine {
    /// Parse the record. Invalid UTF-8 is reported as a JSON error.
    pub fn parse(&self) -> DecodeResult<PacketTree> {
        PacketTree::from_slice(&self.bytes)
    }
}

/// Iterator over the packet record lines of a capture export
pub struct CaptureReader<R> {
    reader: R,
    buf: Vec<u8>,
    lines_read: u64,
    skipped: u64,
}

impl CaptureReader<BufReader<File>> {
    /// Validate the file name and open it for reading. The handle is released
    /// when the reader is dropped.
    pub fn open(path: &Path) -> CaptureResult<Self> {
        validate_input_path(path)?;
        let file = File::open(path)?;
        info!("Reading capture export from: {}", path.display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> CaptureReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            lines_read: 0,
            skipped: 0,
        }
    }

    /// Lines consumed so far, packet records or not
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Lines that were not packet records
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl<R: BufRead> Iterator for CaptureReader<R> {
    type Item = CaptureResult<CaptureLine>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.lines_read += 1;

            if self.buf.starts_with(PACKET_RECORD_PREFIX.as_bytes()) {
                let mut bytes = std::mem::take(&mut self.buf);
                if bytes.last() == Some(&b'\n') {
                    bytes.pop();
                }
                if bytes.last() == Some(&b'\r') {
                    bytes.pop();
                }
                return Some(Ok(CaptureLine {
                    number: self.lines_read,
                    bytes,
                }));
            }

            trace!("Skipping non-packet line {}", self.lines_read);
            self.skipped += 1;
        }
    }
}
