//! Intent classification adapter.
//!
//! The remote conversation-analysis provider is reached through the
//! [`IntentClassifier`] trait. `CluClassifier` performs the actual HTTP call;
//! `response` normalizes the provider's two equivalent payload encodings into
//! one canonical [`bibliobot_core::ClassificationResult`]. Decoding never
//! fails — structurally malformed payloads collapse to the default result,
//! which routes to the unrecognized-intent path downstream.

pub mod client;
pub mod response;

pub use client::{ClassifyError, CluClassifier, IntentClassifier};
pub use response::decode_classification;
