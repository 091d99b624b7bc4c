//! Create / replace / already-exists orchestration.
//!
//! ## Sequence
//!
//! 1. Validate the link and derive the canonical identifier. No I/O happens
//!    before this succeeds.
//! 2. Take the in-process lock for the identifier. It is held until the
//!    synchronization returns.
//! 3. Look the identifier up. If it is stored and replacement was not
//!    requested, return `AlreadyExists` without contacting the provider.
//! 4. Fetch the document.
//! 5. In one transaction: take the cross-process advisory lock, repeat the
//!    lookup (another instance may have won the race), then insert or
//!    update the offer, delete old children on replace, and insert the new
//!    children parents-first.
//!
//! A failure at any write drops the transaction, so a synchronization either
//! lands completely or leaves the previous state untouched.

use mobsync_core::{validate_link, CanonicalId, UpstreamOffer};
use mobsync_db::{DbError, OfferStore, OfferTransaction};
use mobsync_upstream::{OfferDocument, OfferSource};
use uuid::Uuid;

use crate::error::SyncError;
use crate::locks::IdentifierLocks;
use crate::result::{SyncOutcome, SyncReport, SyncRequest};

pub struct OfferSynchronizer<S, D> {
    source: S,
    store: D,
    locks: IdentifierLocks,
    domain_marker: String,
}

impl<S, D> OfferSynchronizer<S, D>
where
    S: OfferSource,
    D: OfferStore,
{
    pub fn new(source: S, store: D, domain_marker: impl Into<String>) -> Self {
        Self {
            source,
            store,
            locks: IdentifierLocks::new(),
            domain_marker: domain_marker.into(),
        }
    }

    #[must_use]
    pub fn domain_marker(&self) -> &str {
        &self.domain_marker
    }

    /// Mirrors the offer behind `request.link` into the store.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] whose [`stage`](SyncError::stage) names the
    /// step that failed. Nothing is written when an error is returned.
    pub async fn synchronize(&self, request: &SyncRequest) -> Result<SyncOutcome, SyncError> {
        let result = self.run(request).await;
        match &result {
            Ok(outcome) => tracing::info!(
                canonical_id = %outcome.canonical_id(),
                offer_id = %outcome.offer_id(),
                outcome = ?outcome.outcome(),
                cavaletes = outcome.report().map(|r| r.cavaletes),
                items = outcome.report().map(|r| r.items),
                "offer synchronization finished"
            ),
            Err(e) => tracing::warn!(
                stage = %e.stage(),
                kind = %e.kind(),
                error = %e,
                "offer synchronization failed"
            ),
        }
        result
    }

    async fn run(&self, request: &SyncRequest) -> Result<SyncOutcome, SyncError> {
        let canonical_id = validate_link(&request.link, &self.domain_marker)?;
        let _guard = self.locks.lock(&canonical_id).await;

        let existing = self
            .store
            .find_offer_id(&canonical_id)
            .await
            .map_err(SyncError::ExistenceCheck)?;

        if let Some(offer_id) = existing {
            if !request.replace_if_existing {
                return Ok(SyncOutcome::AlreadyExists {
                    offer_id,
                    canonical_id,
                });
            }
        }

        let document = self.source.fetch_offer(&canonical_id).await?;

        self.persist(canonical_id, &document, request.replace_if_existing)
            .await
            .map_err(SyncError::Persistence)
    }

    async fn persist(
        &self,
        canonical_id: CanonicalId,
        document: &OfferDocument,
        replace_if_existing: bool,
    ) -> Result<SyncOutcome, DbError> {
        let mut tx = self.store.begin().await?;
        tx.lock_identifier(&canonical_id).await?;

        let outcome = match tx.find_offer_id(&canonical_id).await? {
            None => {
                let offer_id = tx
                    .insert_offer(&canonical_id, &document.offer, &document.raw)
                    .await?;
                let (cavaletes, items) =
                    insert_children(tx.as_mut(), offer_id, &document.offer).await?;
                SyncOutcome::Created(SyncReport {
                    offer_id,
                    canonical_id,
                    cavaletes,
                    items,
                    removed_cavaletes: 0,
                })
            }
            Some(offer_id) if replace_if_existing => {
                tx.update_offer(offer_id, &document.offer, &document.raw)
                    .await?;
                let removed_cavaletes = tx.delete_children(offer_id).await?;
                let (cavaletes, items) =
                    insert_children(tx.as_mut(), offer_id, &document.offer).await?;
                SyncOutcome::Replaced(SyncReport {
                    offer_id,
                    canonical_id,
                    cavaletes,
                    items,
                    removed_cavaletes,
                })
            }
            // Stored by another instance after the first lookup.
            Some(offer_id) => {
                return Ok(SyncOutcome::AlreadyExists {
                    offer_id,
                    canonical_id,
                })
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }
}

/// Inserts every cavalete of `offer` followed by its items.
/// Returns `(cavaletes, items)` inserted.
async fn insert_children(
    tx: &mut dyn OfferTransaction,
    offer_id: Uuid,
    offer: &UpstreamOffer,
) -> Result<(usize, usize), DbError> {
    let mut items = 0;
    for cavalete in &offer.cavaletes {
        let cavalete_id = tx.insert_cavalete(offer_id, cavalete).await?;
        for item in &cavalete.itens {
            tx.insert_item(cavalete_id, item).await?;
            items += 1;
        }
    }
    Ok((offer.cavaletes.len(), items))
}
