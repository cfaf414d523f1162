use rand::Rng;

use super::lines::MatchLines;
use super::{FileScanError, MatchFile, ScanContext, for_each_file};
use crate::sampler::progress::ScanInterrupt;

pub(super) fn run<R: Rng>(
    ctx: &mut ScanContext<'_, R>,
    files: &[MatchFile],
) -> Result<(), ScanInterrupt> {
    for_each_file(ctx, files, scan_file)
}

/// Offer every qualifying line of one file to the global reservoir.
pub(super) fn scan_file<R: Rng>(
    ctx: &mut ScanContext<'_, R>,
    file: &MatchFile,
) -> Result<(), FileScanError> {
    let mut lines = MatchLines::open(&file.path, file.size)?;
    while let Some(parsed) = lines.next_record()? {
        if let Some(seed) = ctx.qualifying_seed(file, parsed) {
            ctx.offer(seed);
        }
        ctx.after_evaluation(lines.position(), None)?;
    }
    Ok(())
}
