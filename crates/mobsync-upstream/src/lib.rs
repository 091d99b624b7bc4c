//! Client for the Mobgran offer document endpoint.

pub mod client;
pub mod error;
pub mod source;
pub mod types;

pub use client::{MobgranClient, UpstreamSettings};
pub use error::UpstreamError;
pub use source::OfferSource;
pub use types::OfferDocument;
