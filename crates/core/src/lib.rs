//! Domain types and configuration for bibliobot.
//!
//! Everything in this crate is I/O-free: the business-rules document, the
//! classification result model, the intent routing constants, and the layered
//! application configuration. Remote collaborators (document store, NLU
//! provider, bot channel) live in their own crates and depend on these types.

pub mod config;
pub mod intent;
pub mod rules;

pub use intent::{ClassificationResult, Intent, CONFIDENCE_THRESHOLD};
pub use rules::{BusinessRules, RULES_DOCUMENT_ID};
