//! HTTP client for the Mobgran `link-produto` document endpoint.
//!
//! One GET per identifier, no retries. The provider publishes no rate-limit
//! contract, and a failed fetch is usually permanent (unknown or expired
//! link), so a failure is returned to the caller as-is.

use std::time::Duration;

use mobsync_core::{AppConfig, CanonicalId, UpstreamOffer};
use reqwest::{header, Client, Response, StatusCode, Url};

use crate::error::UpstreamError;
use crate::types::{is_document, OfferDocument};

/// Upper bound on how much of a rejected response body is kept.
const MAX_ERROR_BODY_BYTES: usize = 2048;

/// Largest document body read before giving up.
const DEFAULT_MAX_DOCUMENT_BYTES: usize = 16 * 1024 * 1024;

const ACCEPT: &str = "application/json, text/plain, */*";
const ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en;q=0.8";

/// Endpoint and header settings for [`MobgranClient`].
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub origin: String,
    pub referer: String,
}

impl UpstreamSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.upstream_base_url.clone(),
            timeout_secs: config.upstream_timeout_secs,
            user_agent: config.upstream_user_agent.clone(),
            origin: config.upstream_origin.clone(),
            referer: config.upstream_referer.clone(),
        }
    }
}

/// Client for the Mobgran document API.
///
/// The provider rejects requests that do not look like they come from its own
/// web app, so every request carries a browser `User-Agent` plus `Origin` and
/// `Referer` pointing at the Mobgran site.
pub struct MobgranClient {
    client: Client,
    base_url: Url,
    origin: String,
    referer: String,
    max_body_bytes: usize,
}

impl MobgranClient {
    /// Creates a client from endpoint settings.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`UpstreamError::InvalidBaseUrl`] if
    /// `settings.base_url` does not parse.
    pub fn new(settings: &UpstreamSettings) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&settings.user_agent)
            .build()?;

        // Exactly one trailing slash so `Url::join` appends the identifier
        // instead of replacing the last path segment.
        let normalised = format!("{}/", settings.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| UpstreamError::InvalidBaseUrl {
            base_url: settings.base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            origin: settings.origin.clone(),
            referer: settings.referer.clone(),
            max_body_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        })
    }

    /// Caps how many bytes of a document body are read (16 MiB by default).
    #[must_use]
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Creates a client with default headers pointed at `base_url`
    /// (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`MobgranClient::new`].
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, UpstreamError> {
        Self::new(&UpstreamSettings {
            base_url: base_url.to_owned(),
            timeout_secs,
            user_agent: mobsync_core::config::DEFAULT_UPSTREAM_USER_AGENT.to_owned(),
            origin: mobsync_core::config::DEFAULT_UPSTREAM_ORIGIN.to_owned(),
            referer: mobsync_core::config::DEFAULT_UPSTREAM_REFERER.to_owned(),
        })
    }

    /// Fetches the current document for `id`.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::Http`] on network failure or timeout.
    /// - [`UpstreamError::Rejected`] on any status other than `200 OK`.
    /// - [`UpstreamError::Deserialize`] if the body is not JSON or does not
    ///   match the document shape.
    /// - [`UpstreamError::EmptyDocument`] if the body carries no document fields.
    /// - [`UpstreamError::BodyTooLarge`] if the body exceeds the configured cap.
    pub async fn fetch_offer(&self, id: &CanonicalId) -> Result<OfferDocument, UpstreamError> {
        let url = self.document_url(id)?;
        tracing::info!(canonical_id = %id, url = %url, "fetching offer document");

        let mut response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, ACCEPT)
            .header(header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .header(header::ORIGIN, &self.origin)
            .header(header::REFERER, &self.referer)
            .send()
            .await
            .inspect_err(|e| {
                tracing::warn!(canonical_id = %id, error = %e, "offer document request failed");
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            // One byte past the cap is enough for `truncate_body` to mark the cut.
            let (bytes, _) = read_limited(&mut response, MAX_ERROR_BODY_BYTES + 1)
                .await
                .unwrap_or_default();
            let body = truncate_body(&String::from_utf8_lossy(&bytes));
            tracing::warn!(
                canonical_id = %id,
                status = status.as_u16(),
                body = %body,
                "provider rejected offer document request"
            );
            return Err(UpstreamError::Rejected {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        let too_large = || UpstreamError::BodyTooLarge {
            url: url.to_string(),
            limit: self.max_body_bytes,
        };
        if response
            .content_length()
            .is_some_and(|len| len > u64::try_from(self.max_body_bytes).unwrap_or(u64::MAX))
        {
            tracing::warn!(canonical_id = %id, "offer document exceeds size cap");
            return Err(too_large());
        }
        let (body, exceeded) = read_limited(&mut response, self.max_body_bytes).await?;
        if exceeded {
            tracing::warn!(canonical_id = %id, "offer document exceeds size cap");
            return Err(too_large());
        }

        let raw: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| UpstreamError::Deserialize {
                context: format!("offer document {id}"),
                source: e,
            })?;

        if !is_document(&raw) {
            return Err(UpstreamError::EmptyDocument {
                url: url.to_string(),
            });
        }

        let offer: UpstreamOffer =
            serde_json::from_value(raw.clone()).map_err(|e| UpstreamError::Deserialize {
                context: format!("offer document {id}"),
                source: e,
            })?;

        tracing::info!(
            canonical_id = %id,
            situacao = %offer.situacao,
            nome_empresa = %offer.nome_empresa,
            cavaletes = offer.cavaletes.len(),
            "offer document fetched"
        );

        Ok(OfferDocument { offer, raw })
    }

    fn document_url(&self, id: &CanonicalId) -> Result<Url, UpstreamError> {
        self.base_url
            .join(id.as_str())
            .map_err(|e| UpstreamError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Reads the body chunk by chunk, stopping once `limit` bytes are buffered.
/// The flag is `true` when the body was longer than `limit`.
async fn read_limited(
    response: &mut Response,
    limit: usize,
) -> Result<(Vec<u8>, bool), reqwest::Error> {
    let mut buf = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - buf.len();
        if chunk.len() > room {
            buf.extend_from_slice(&chunk[..room]);
            return Ok((buf, true));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok((buf, false))
}

/// Truncates `body` to at most [`MAX_ERROR_BODY_BYTES`] on a char boundary.
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_BYTES {
        return body.to_owned();
    }
    let mut end = MAX_ERROR_BODY_BYTES;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
