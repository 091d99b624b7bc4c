//! Offer synchronization: fetch a provider document and mirror it into the
//! store as one atomic create or replace.

pub mod engine;
pub mod error;
pub mod locks;
pub mod result;

pub use engine::OfferSynchronizer;
pub use error::{ErrorKind, Stage, SyncError};
pub use locks::IdentifierLocks;
pub use result::{Outcome, SyncOutcome, SyncReport, SyncRequest, SyncResult};
