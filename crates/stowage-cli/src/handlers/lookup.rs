//! Lookup command handler.

use stowage_core::Digest;

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn run(ctx: &CliContext, locator: &str) -> Result<Digest, CliError> {
    ctx.content
        .lookup(locator)
        .await?
        .ok_or_else(|| CliError::NotFound(locator.to_string()))
}

/// Print the digest the locator is cached under; a miss is an error.
pub async fn execute(ctx: &CliContext, locator: &str) -> Result<(), CliError> {
    let digest = run(ctx, locator).await?;
    println!("{digest}");
    Ok(())
}
