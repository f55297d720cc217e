//! The brain of bibliobot: intent routing and configuration-backed replies.
//!
//! Per incoming message the pipeline is strictly sequential:
//!
//! ```text
//! channel activity → rules fetch → classification → route → render → reply
//! ```
//!
//! - `router` — the confidence-threshold gate and the closed intent→handler
//!   table. Pure; unit-tested against the routing contract.
//! - `responders` — the templated reply texts, rendered from the
//!   business-rules document. Missing fields render the `ND` placeholder.
//! - `turn` — [`LibraryBot`], the turn handler wired into the channel
//!   adapter. All remote collaborators are injected as trait objects, so the
//!   whole pipeline runs against in-memory fakes in tests.

pub mod responders;
pub mod router;
pub mod turn;

pub use router::{route, Route, UnrecognizedReason};
pub use turn::LibraryBot;
