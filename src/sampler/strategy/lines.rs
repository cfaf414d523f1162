use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use crate::sampler::record::{Malformed, MatchRecord, looks_like_header, parse_line};

/// Line-by-line reader over one match file that skips a leading header row.
///
/// Reads stop at the byte limit given at open time, so lines appended by a
/// running search after the scan started are not chased.
pub(super) struct MatchLines<R> {
    reader: R,
    buf: String,
    first_line: bool,
    position: u64,
}

impl MatchLines<BufReader<io::Take<File>>> {
    pub(super) fn open(path: &Path, limit: u64) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file.take(limit))))
    }
}

impl<R: BufRead> MatchLines<R> {
    pub(super) fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            first_line: true,
            position: 0,
        }
    }

    /// Next data line, parsed. `Ok(None)` at end of input.
    ///
    /// Invalid UTF-8 surfaces as an `InvalidData` error for the whole file.
    pub(super) fn next_record(&mut self) -> io::Result<Option<Result<MatchRecord, Malformed>>> {
        loop {
            self.buf.clear();
            let read = self.reader.read_line(&mut self.buf)?;
            if read == 0 {
                return Ok(None);
            }
            self.position += read as u64;
            if std::mem::take(&mut self.first_line) && looks_like_header(&self.buf) {
                continue;
            }
            return Ok(Some(parse_line(&self.buf)));
        }
    }

    /// Bytes consumed so far, header included.
    pub(super) fn position(&self) -> u64 {
        self.position
    }
}
