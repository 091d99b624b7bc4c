//! `import` and `validate` command handlers.

use mobsync_core::AppConfig;
use mobsync_db::{MemoryOfferStore, OfferStore, PgOfferStore};
use mobsync_sync::{OfferSynchronizer, SyncRequest, SyncResult};
use mobsync_upstream::{MobgranClient, OfferSource, UpstreamSettings};

/// Imports the offer behind `link` and prints the result as JSON.
///
/// With `dry_run` the document is fetched and written to an in-memory store
/// only, so the database is never contacted and the printed result describes
/// what a real import would create.
///
/// # Errors
///
/// Returns an error if the client or pool cannot be built, or if the
/// synchronization fails. The JSON result is printed in both cases.
pub(crate) async fn run_import(
    config: &AppConfig,
    link: &str,
    replace: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let client = MobgranClient::new(&UpstreamSettings::from_app_config(config))?;
    let request = SyncRequest::new(link, replace);

    let result = if dry_run {
        tracing::info!("dry run: writing to an in-memory store");
        synchronize(client, MemoryOfferStore::new(), config, &request).await
    } else {
        let pool = mobsync_db::connect_pool_from_config(config).await?;
        synchronize(client, PgOfferStore::new(pool), config, &request).await
    };

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.succeeded {
        anyhow::bail!("import failed: {}", result.message);
    }
    Ok(())
}

async fn synchronize<S, D>(
    source: S,
    store: D,
    config: &AppConfig,
    request: &SyncRequest,
) -> SyncResult
where
    S: OfferSource,
    D: OfferStore,
{
    let synchronizer = OfferSynchronizer::new(source, store, config.provider_domain.clone());
    SyncResult::from(&synchronizer.synchronize(request).await)
}

/// Prints the canonical identifier of `link`.
///
/// # Errors
///
/// Returns the link error when the link is blank, off-domain, or carries no
/// identifier.
pub(crate) fn run_validate(link: &str, domain: &str) -> anyhow::Result<()> {
    let id = mobsync_core::validate_link(link, domain)?;
    println!("{id}");
    Ok(())
}
