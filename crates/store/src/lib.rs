//! Document-store access for bibliobot.
//!
//! The remote store is an opaque collaborator reached through the narrow
//! [`DocumentStore`] trait: point read by id and idempotent upsert, nothing
//! else. `CosmosRestStore` talks to a Cosmos-compatible REST endpoint with
//! master-key authorization; `rules::RulesRepository` layers the
//! read-through-with-seed behavior on top of any store implementation.

pub mod auth;
pub mod client;
pub mod rules;

pub use client::{CosmosRestStore, DocumentStore, InMemoryDocumentStore, StoreError};
pub use rules::{RulesRepository, RulesSource};
