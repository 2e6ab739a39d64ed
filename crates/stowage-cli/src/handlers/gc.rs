//! Garbage collection command handler.

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext) -> Result<(), CliError> {
    let report = ctx.content.gc().await?;
    println!(
        "retained {} blobs, removed {} ({} bytes), cleared {} staging files in {}",
        report.retained,
        report.removed,
        report.reclaimed_bytes,
        report.staging_removed,
        ctx.cache_dir.display()
    );
    Ok(())
}
