//! Temp file store.
//!
//! Holds in-flight and recently completed download artifacts plus their
//! sidecar metadata files. Files are owned by the store from the moment the
//! extraction process writes them until the reaper or the sweep deletes them.

mod error;
mod temp_store;

pub use error::StoreError;
pub use temp_store::{StoreEntry, TempStore, SIDECAR_SUFFIX};
