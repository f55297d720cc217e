use bibliobot_core::config::{AppConfig, LoadOptions};
use bibliobot_core::{BusinessRules, RULES_DOCUMENT_ID};
use bibliobot_store::{CosmosRestStore, DocumentStore};

use crate::commands::CommandResult;

/// Writes the canonical rules document with an idempotent upsert. Running it
/// against an already-seeded container resets the document to the canonical
/// content.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let store = CosmosRestStore::from_config(&config.store)
            .map_err(|error| ("store_client", error.to_string(), 3u8))?;

        let document = serde_json::to_value(BusinessRules::seed())
            .map_err(|error| ("serialization", error.to_string(), 3u8))?;

        store
            .upsert_document(&document)
            .await
            .map_err(|error| ("store_upsert", error.to_string(), 4u8))?;

        Ok::<(), (&'static str, String, u8)>(())
    });

    match result {
        Ok(()) => CommandResult::success(
            "seed",
            format!(
                "canonical rules document `{RULES_DOCUMENT_ID}` upserted to {}/{}",
                config.store.database_id, config.store.container_id
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
