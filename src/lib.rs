//! Rolecall backend library.
//!
//! A thin HTTP backend that proxies chat requests to a local model
//! runtime, persists per-model chat transcripts on disk, and maintains
//! a profile registry for the locally available models.

pub mod api;
pub mod profiles;
pub mod runtime;
pub mod store;
