use async_trait::async_trait;
use mobsync_core::CanonicalId;

use crate::{MobgranClient, OfferDocument, UpstreamError};

/// Anything that can produce the current provider document for an identifier.
#[async_trait]
pub trait OfferSource: Send + Sync {
    async fn fetch_offer(&self, id: &CanonicalId) -> Result<OfferDocument, UpstreamError>;
}

#[async_trait]
impl OfferSource for MobgranClient {
    async fn fetch_offer(&self, id: &CanonicalId) -> Result<OfferDocument, UpstreamError> {
        MobgranClient::fetch_offer(self, id).await
    }
}

#[async_trait]
impl<T: OfferSource + ?Sized> OfferSource for std::sync::Arc<T> {
    async fn fetch_offer(&self, id: &CanonicalId) -> Result<OfferDocument, UpstreamError> {
        (**self).fetch_offer(id).await
    }
}
