use mobsync_core::UpstreamOffer;

/// A fetched offer document.
///
/// `offer` is the typed projection used for columns; `raw` is the body exactly
/// as the provider sent it, stored for audit and replay.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferDocument {
    pub offer: UpstreamOffer,
    pub raw: serde_json::Value,
}

impl OfferDocument {
    /// Builds a document whose verbatim JSON is the serialized projection.
    ///
    /// Used when no provider body exists, e.g. in tests and fixtures.
    #[must_use]
    pub fn from_offer(offer: UpstreamOffer) -> Self {
        let raw = serde_json::to_value(&offer).unwrap_or(serde_json::Value::Null);
        Self { offer, raw }
    }
}

/// Keys whose presence makes a body a document rather than an empty reply.
const DOCUMENT_KEYS: [&str; 3] = ["situacao", "nomeEmpresa", "cavaletes"];

pub(crate) fn is_document(body: &serde_json::Value) -> bool {
    body.as_object()
        .is_some_and(|obj| DOCUMENT_KEYS.iter().any(|k| obj.contains_key(*k)))
}
