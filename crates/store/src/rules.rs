//! Read-through access to the business-rules document.
//!
//! One round trip per incoming message: read the document by its well-known
//! id; on a miss (or any provider failure on the read) write the canonical
//! seed document with an idempotent upsert and return it. Only when the seed
//! write itself fails does the caller see an error, which it must translate
//! into a user-visible apology and an aborted turn. No retries anywhere.

use async_trait::async_trait;
use bibliobot_core::rules::{BusinessRules, RULES_DOCUMENT_ID};
use tracing::{info, warn};

use crate::client::{DocumentStore, StoreError};

#[async_trait]
pub trait RulesSource: Send + Sync {
    async fn get_business_rules(&self) -> Result<BusinessRules, StoreError>;
}

pub struct RulesRepository<S> {
    store: S,
}

impl<S> RulesRepository<S>
where
    S: DocumentStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn seed(&self, cause: &StoreError) -> Result<BusinessRules, StoreError> {
        warn!(
            event_name = "store.rules_read_failed",
            document_id = RULES_DOCUMENT_ID,
            error = %cause,
            "rules document missing or unreadable; seeding canonical document"
        );

        let seed = BusinessRules::seed();
        let document = serde_json::to_value(&seed)
            .map_err(|error| StoreError::Decode(error.to_string()))?;

        match self.store.upsert_document(&document).await {
            Ok(()) => {
                info!(
                    event_name = "store.rules_seeded",
                    document_id = RULES_DOCUMENT_ID,
                    "canonical rules document written"
                );
                Ok(seed)
            }
            Err(error) => Err(StoreError::RulesUnavailable(error.to_string())),
        }
    }
}

#[async_trait]
impl<S> RulesSource for RulesRepository<S>
where
    S: DocumentStore,
{
    async fn get_business_rules(&self) -> Result<BusinessRules, StoreError> {
        match self.store.read_document(RULES_DOCUMENT_ID).await {
            Ok(document) => serde_json::from_value(document)
                .map_err(|error| StoreError::Decode(error.to_string())),
            Err(error) => self.seed(&error).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use bibliobot_core::rules::{BusinessRules, RULES_DOCUMENT_ID};
    use serde_json::{json, Value};
    use tokio::sync::Mutex;

    use super::{RulesRepository, RulesSource};
    use crate::client::{DocumentStore, InMemoryDocumentStore, StoreError};

    #[derive(Default)]
    struct ScriptedStore {
        state: Mutex<ScriptedState>,
    }

    #[derive(Default)]
    struct ScriptedState {
        reads: VecDeque<Result<Value, StoreError>>,
        upserts: VecDeque<Result<(), StoreError>>,
        read_calls: usize,
        upsert_calls: usize,
        last_upserted: Option<Value>,
    }

    impl ScriptedStore {
        fn with_script(
            reads: Vec<Result<Value, StoreError>>,
            upserts: Vec<Result<(), StoreError>>,
        ) -> Self {
            Self {
                state: Mutex::new(ScriptedState {
                    reads: reads.into(),
                    upserts: upserts.into(),
                    ..ScriptedState::default()
                }),
            }
        }

        async fn upsert_calls(&self) -> usize {
            self.state.lock().await.upsert_calls
        }

        async fn last_upserted(&self) -> Option<Value> {
            self.state.lock().await.last_upserted.clone()
        }
    }

    #[async_trait]
    impl DocumentStore for ScriptedStore {
        async fn read_document(&self, id: &str) -> Result<Value, StoreError> {
            let mut state = self.state.lock().await;
            state.read_calls += 1;
            state.reads.pop_front().unwrap_or_else(|| Err(StoreError::NotFound(id.to_string())))
        }

        async fn upsert_document(&self, document: &Value) -> Result<(), StoreError> {
            let mut state = self.state.lock().await;
            state.upsert_calls += 1;
            state.last_upserted = Some(document.clone());
            state.upserts.pop_front().unwrap_or(Ok(()))
        }
    }

    #[tokio::test]
    async fn read_hit_returns_stored_document_without_writing() {
        let stored = json!({
            "id": "library_config",
            "horarios": {"dias_uteis": "10:00 às 18:00"}
        });
        let store = ScriptedStore::with_script(vec![Ok(stored)], vec![]);
        let repository = RulesRepository::new(&store);

        let rules = repository.get_business_rules().await.expect("rules");
        assert_eq!(rules.horarios.dias_uteis.as_deref(), Some("10:00 às 18:00"));
        assert_eq!(store.upsert_calls().await, 0);
    }

    #[tokio::test]
    async fn read_miss_seeds_canonical_document() {
        let store = InMemoryDocumentStore::new();
        let repository = RulesRepository::new(&store);

        let rules = repository.get_business_rules().await.expect("seeded rules");
        assert_eq!(rules, BusinessRules::seed());

        // The seed must now be persisted under the well-known id.
        let persisted = store.read_document(RULES_DOCUMENT_ID).await.expect("persisted");
        assert_eq!(persisted["id"], RULES_DOCUMENT_ID);
        assert_eq!(persisted["horarios"]["dias_uteis"], "08:00 às 22:00");
    }

    #[tokio::test]
    async fn seeding_is_idempotent_across_repeated_misses() {
        let store = ScriptedStore::with_script(
            vec![
                Err(StoreError::NotFound(RULES_DOCUMENT_ID.to_string())),
                Err(StoreError::NotFound(RULES_DOCUMENT_ID.to_string())),
            ],
            vec![Ok(()), Ok(())],
        );
        let repository = RulesRepository::new(&store);

        let first = repository.get_business_rules().await.expect("first seed");
        let first_write = store.last_upserted().await;
        let second = repository.get_business_rules().await.expect("second seed");
        let second_write = store.last_upserted().await;

        assert_eq!(first, second);
        assert_eq!(first_write, second_write);
        assert_eq!(store.upsert_calls().await, 2);
    }

    #[tokio::test]
    async fn provider_error_on_read_also_triggers_seeding() {
        let store = ScriptedStore::with_script(
            vec![Err(StoreError::Provider { status: 503, message: "throttled".to_string() })],
            vec![Ok(())],
        );
        let repository = RulesRepository::new(&store);

        let rules = repository.get_business_rules().await.expect("seeded on provider error");
        assert_eq!(rules, BusinessRules::seed());
        assert_eq!(store.upsert_calls().await, 1);
    }

    #[tokio::test]
    async fn failed_seed_write_surfaces_rules_unavailable() {
        let store = ScriptedStore::with_script(
            vec![Err(StoreError::Transport("connection refused".to_string()))],
            vec![Err(StoreError::Transport("connection refused".to_string()))],
        );
        let repository = RulesRepository::new(&store);

        let error = repository.get_business_rules().await.expect_err("seed failure");
        assert!(matches!(error, StoreError::RulesUnavailable(_)));
    }

    #[tokio::test]
    async fn malformed_stored_document_is_a_decode_error() {
        let store =
            ScriptedStore::with_script(vec![Ok(json!({"id": "library_config", "horarios": "oops"}))], vec![]);
        let repository = RulesRepository::new(&store);

        let error = repository.get_business_rules().await.expect_err("decode failure");
        assert!(matches!(error, StoreError::Decode(_)));
    }
}
