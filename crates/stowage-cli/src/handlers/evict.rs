//! Evict command handler.

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Remove the locator's content. Evicting an uncached locator succeeds.
pub async fn execute(ctx: &CliContext, locator: &str) -> Result<(), CliError> {
    if ctx.content.evict(locator).await? {
        println!("evicted {locator}");
    } else {
        println!("{locator} was not cached");
    }
    Ok(())
}
