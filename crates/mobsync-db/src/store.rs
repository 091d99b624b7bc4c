//! Storage seam for offer synchronization.
//!
//! The synchronizer only sequences primitives; it never talks SQL. Every
//! primitive maps to one statement (two for [`OfferTransaction::delete_children`])
//! and performs no validation beyond the schema constraints: unique
//! `canonical_id` per offer, unique `(code, block)` per cavalete within an
//! offer, and foreign keys from cavalete to offer and item to cavalete.

use async_trait::async_trait;
use mobsync_core::{CanonicalId, UpstreamCavalete, UpstreamItem, UpstreamOffer};
use serde::Serialize;
use uuid::Uuid;

use crate::DbError;

/// Number of children stored under one offer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChildCounts {
    pub cavaletes: i64,
    pub items: i64,
}

#[async_trait]
pub trait OfferStore: Send + Sync {
    /// Looks up the internal id of the offer stored under `canonical_id`.
    async fn find_offer_id(&self, canonical_id: &CanonicalId) -> Result<Option<Uuid>, DbError>;

    /// Counts the cavaletes and items currently stored under `offer_id`.
    async fn count_children(&self, offer_id: Uuid) -> Result<ChildCounts, DbError>;

    /// Opens a transaction. Nothing it writes is visible until
    /// [`OfferTransaction::commit`].
    async fn begin(&self) -> Result<Box<dyn OfferTransaction>, DbError>;
}

#[async_trait]
impl<T: OfferStore + ?Sized> OfferStore for std::sync::Arc<T> {
    async fn find_offer_id(&self, canonical_id: &CanonicalId) -> Result<Option<Uuid>, DbError> {
        (**self).find_offer_id(canonical_id).await
    }

    async fn count_children(&self, offer_id: Uuid) -> Result<ChildCounts, DbError> {
        (**self).count_children(offer_id).await
    }

    async fn begin(&self) -> Result<Box<dyn OfferTransaction>, DbError> {
        (**self).begin().await
    }
}

/// An open write transaction.
///
/// Dropping the transaction without calling [`commit`](Self::commit) rolls
/// back every write made through it.
#[async_trait]
pub trait OfferTransaction: Send {
    /// Blocks until no other transaction holds the lock for `canonical_id`.
    /// Released at commit or rollback.
    async fn lock_identifier(&mut self, canonical_id: &CanonicalId) -> Result<(), DbError>;

    async fn find_offer_id(&mut self, canonical_id: &CanonicalId)
        -> Result<Option<Uuid>, DbError>;

    /// Inserts a new offer row and returns its generated id.
    async fn insert_offer(
        &mut self,
        canonical_id: &CanonicalId,
        offer: &UpstreamOffer,
        raw_document: &serde_json::Value,
    ) -> Result<Uuid, DbError>;

    /// Overwrites the mutable offer fields and bumps `updated_at`.
    ///
    /// Returns [`DbError::NotFound`] if `offer_id` does not exist.
    async fn update_offer(
        &mut self,
        offer_id: Uuid,
        offer: &UpstreamOffer,
        raw_document: &serde_json::Value,
    ) -> Result<(), DbError>;

    /// Deletes every item of the offer's cavaletes, then the cavaletes.
    /// Returns how many cavaletes were removed.
    async fn delete_children(&mut self, offer_id: Uuid) -> Result<u64, DbError>;

    async fn insert_cavalete(
        &mut self,
        offer_id: Uuid,
        cavalete: &UpstreamCavalete,
    ) -> Result<Uuid, DbError>;

    async fn insert_item(&mut self, cavalete_id: Uuid, item: &UpstreamItem)
        -> Result<Uuid, DbError>;

    async fn commit(self: Box<Self>) -> Result<(), DbError>;
}

/// The principal-image descriptor as stored, or `None` when it is missing or blank.
pub(crate) fn principal_image_json(cavalete: &UpstreamCavalete) -> Option<serde_json::Value> {
    cavalete
        .principal_image()
        .and_then(|img| serde_json::to_value(img).ok())
}

/// `item_count` column value for a cavalete.
pub(crate) fn item_count(cavalete: &UpstreamCavalete) -> i32 {
    i32::try_from(cavalete.itens.len()).unwrap_or(i32::MAX)
}
