use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};

use rand::Rng;

use super::{FileScanError, MatchFile, ScanContext, for_each_file, full};
use crate::sampler::progress::ScanInterrupt;
use crate::sampler::record::{looks_like_header, parse_line};

/// Lower bound on probes per file, regardless of the configured bound.
pub const MIN_PROBES_PER_FILE: usize = 4;

/// Number of random offsets probed in each file for a given per-file bound.
pub fn probes_per_file(bound: usize) -> usize {
    (bound / 10).max(MIN_PROBES_PER_FILE)
}

pub(super) fn run<R: Rng>(
    ctx: &mut ScanContext<'_, R>,
    files: &[MatchFile],
    bound: usize,
) -> Result<(), ScanInterrupt> {
    let probes = probes_per_file(bound);
    for_each_file(ctx, files, |ctx, file| {
        if file.size == 0 || file.size < ctx.options.probe_full_scan_threshold {
            return full::scan_file(ctx, file);
        }
        let mut candidates = Vec::new();
        let result = probe_file(ctx, file, probes, &mut candidates);
        for seed in candidates {
            ctx.offer(seed);
        }
        result
    })
}

fn probe_file<R: Rng>(
    ctx: &mut ScanContext<'_, R>,
    file: &MatchFile,
    probes: usize,
    candidates: &mut Vec<String>,
) -> Result<(), FileScanError> {
    let mut reader = BufReader::new(File::open(&file.path)?);
    let mut buf = Vec::new();
    for probe in 0..probes {
        let offset = ctx.rng.random_range(0..file.size);
        if let Some(line) = line_after(&mut reader, file.size, offset, &mut buf)? {
            let parsed = parse_line(&String::from_utf8_lossy(line));
            if let Some(seed) = ctx.qualifying_seed(file, parsed) {
                candidates.push(seed);
            }
        }
        let in_file = file.size.saturating_mul(probe as u64 + 1) / probes as u64;
        ctx.after_evaluation(in_file, None)?;
    }
    Ok(())
}

/// The first complete line after `offset`, wrapping to the first data line
/// when the offset falls inside the last line. `None` only when the wrap
/// finds nothing to read.
fn line_after<'b, S: Read + Seek>(
    reader: &mut BufReader<S>,
    limit: u64,
    offset: u64,
    buf: &'b mut Vec<u8>,
) -> io::Result<Option<&'b [u8]>> {
    reader.seek(SeekFrom::Start(offset))?;
    buf.clear();
    let skipped = read_bounded(reader, limit - offset, buf)?;
    let position = offset + skipped;

    buf.clear();
    if position < limit {
        read_bounded(reader, limit - position, buf)?;
    } else {
        reader.seek(SeekFrom::Start(0))?;
        let first = read_bounded(reader, limit, buf)?;
        if looks_like_header(&String::from_utf8_lossy(buf.as_slice())) {
            buf.clear();
            read_bounded(reader, limit - first, buf)?;
        }
    }
    if buf.is_empty() {
        return Ok(None);
    }
    Ok(Some(buf.as_slice()))
}

/// Read through the next newline without crossing `remaining` bytes.
fn read_bounded<S: Read>(
    reader: &mut BufReader<S>,
    remaining: u64,
    buf: &mut Vec<u8>,
) -> io::Result<u64> {
    let read = reader.by_ref().take(remaining).read_until(b'\n', buf)?;
    Ok(read as u64)
}
