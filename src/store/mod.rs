//! File-backed persistence.
//!
//! Two stores, both plain JSON on disk: one transcript file per model
//! and a single profile table file. Writers take the store's lock
//! around their read-modify-write; reads go straight to disk.

mod error;
mod history;
mod profile;

pub use error::{StoreError, StoreResult};
pub use history::HistoryStore;
pub use profile::{ProfileStore, ProfileTable};
