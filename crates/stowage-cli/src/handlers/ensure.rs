//! Ensure command handler.

use stowage_core::{ContentRequest, Credentials, EnsureOutcome};

use crate::bootstrap::CliContext;
use crate::commands::CredentialsType;
use crate::error::CliError;

/// Cache the locator's content and return the outcome.
pub async fn run(
    ctx: &CliContext,
    locator: &str,
    credentials: Option<&str>,
    credentials_type: Option<CredentialsType>,
) -> Result<EnsureOutcome, CliError> {
    let kind = credentials_type.map(CredentialsType::as_wire);
    let credentials = Credentials::from_wire(credentials, kind)?;
    let request = ContentRequest::new(locator).with_credentials(credentials);
    Ok(ctx.content.ensure(&request).await?)
}

/// Execute the ensure command, printing the root digest.
pub async fn execute(
    ctx: &CliContext,
    locator: &str,
    credentials: Option<&str>,
    credentials_type: Option<CredentialsType>,
) -> Result<(), CliError> {
    let outcome = run(ctx, locator, credentials, credentials_type).await?;
    if outcome.cached {
        tracing::info!(locator, "already cached");
    } else {
        tracing::info!(
            locator,
            items = outcome.items,
            stored = outcome.stored,
            "downloaded"
        );
    }
    println!("{}", outcome.digest);
    Ok(())
}
