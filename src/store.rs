//! Persistence helpers: JSON files, repository root discovery and the
//! model snapshot log.
mod json;
pub use json::*;

mod snapshot;
pub use snapshot::*;

mod store_error;
pub use store_error::StoreError;
