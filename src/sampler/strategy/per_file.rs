use rand::Rng;

use super::lines::MatchLines;
use super::{FileScanError, MatchFile, ScanContext, for_each_file};
use crate::sampler::progress::ScanInterrupt;
use crate::sampler::reservoir::Reservoir;

pub(super) fn run<R: Rng>(
    ctx: &mut ScanContext<'_, R>,
    files: &[MatchFile],
    bound: usize,
) -> Result<(), ScanInterrupt> {
    for_each_file(ctx, files, |ctx, file| {
        // Lines read before an interrupt or a decode error stay in the sample.
        let mut local = Reservoir::new(bound);
        let result = scan_file(ctx, file, &mut local);
        ctx.merge(local);
        result
    })
}

fn scan_file<R: Rng>(
    ctx: &mut ScanContext<'_, R>,
    file: &MatchFile,
    local: &mut Reservoir,
) -> Result<(), FileScanError> {
    let mut lines = MatchLines::open(&file.path, file.size)?;
    while let Some(parsed) = lines.next_record()? {
        if let Some(seed) = ctx.qualifying_seed(file, parsed) {
            local.observe_with(seed, &mut ctx.rng);
        }
        ctx.after_evaluation(lines.position(), Some(&*local))?;
    }
    Ok(())
}
