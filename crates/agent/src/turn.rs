//! The library bot's turn handler.

use std::sync::Arc;

use async_trait::async_trait;
use bibliobot_channel::{TurnContext, TurnHandler};
use bibliobot_core::Intent;
use bibliobot_nlu::IntentClassifier;
use bibliobot_store::RulesSource;
use tracing::{debug, info, warn};

use crate::responders;
use crate::router::{route, Route};

/// One instance per process. Both collaborators are remote services behind
/// traits; the handler owns no conversational state, so a single value is
/// shared across all concurrent turns.
pub struct LibraryBot {
    rules: Arc<dyn RulesSource>,
    classifier: Arc<dyn IntentClassifier>,
}

impl LibraryBot {
    pub fn new(rules: Arc<dyn RulesSource>, classifier: Arc<dyn IntentClassifier>) -> Self {
        Self { rules, classifier }
    }
}

#[async_trait]
impl TurnHandler for LibraryBot {
    async fn on_message(&self, ctx: &TurnContext<'_>, text: &str) -> anyhow::Result<()> {
        // Silent no-op on empty text: no remote calls, no reply.
        if text.is_empty() {
            debug!(
                event_name = "turn.empty_message_skipped",
                correlation_id = %ctx.correlation_id(),
                "empty message text, skipping turn"
            );
            return Ok(());
        }

        let rules = match self.rules.get_business_rules().await {
            Ok(rules) => rules,
            Err(error) => {
                warn!(
                    event_name = "turn.rules_unavailable",
                    correlation_id = %ctx.correlation_id(),
                    error = %error,
                    "business rules could not be loaded; aborting turn"
                );
                ctx.send_text(responders::RULES_UNAVAILABLE_REPLY).await?;
                return Ok(());
            }
        };

        let classification = match self.classifier.classify(text).await {
            Ok(classification) => classification,
            Err(error) => {
                warn!(
                    event_name = "turn.classification_failed",
                    correlation_id = %ctx.correlation_id(),
                    category = error.category(),
                    error = %error,
                    "classification call failed"
                );
                ctx.send_text(&responders::technical_error_reply(&error)).await?;
                return Ok(());
            }
        };

        let reply = match route(&classification) {
            Route::Intent(intent) => {
                info!(
                    event_name = "turn.intent_routed",
                    correlation_id = %ctx.correlation_id(),
                    intent = intent.label(),
                    confidence = classification.confidence,
                    "routing classified intent"
                );
                match intent {
                    Intent::ConsultarHorario => responders::schedule_reply(&rules),
                    Intent::RenovarEmprestimo => responders::renewal_reply(&rules),
                    Intent::ReservarLivro => responders::reservation_reply(&rules),
                }
            }
            Route::Unrecognized(reason) => {
                info!(
                    event_name = "turn.intent_unrecognized",
                    correlation_id = %ctx.correlation_id(),
                    user_text = text,
                    reason = %reason.describe(),
                    "message did not resolve to a handled intent"
                );
                responders::unrecognized_reply(text)
            }
        };

        ctx.send_text(&reply).await?;
        Ok(())
    }

    async fn on_conversation_update(&self, ctx: &TurnContext<'_>) -> anyhow::Result<()> {
        let activity = ctx.activity();
        let Some(recipient) = &activity.recipient else {
            return Ok(());
        };
        for member in &activity.members_added {
            if member.id != recipient.id {
                ctx.send_text(responders::WELCOME_REPLY).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use bibliobot_channel::{
        Activity, ActivityType, ChannelAccount, ChannelAdapter, ConversationAccount,
        RecordingReplySender,
    };
    use bibliobot_core::{BusinessRules, ClassificationResult};
    use bibliobot_nlu::{ClassifyError, IntentClassifier};
    use bibliobot_store::{RulesSource, StoreError};

    use super::LibraryBot;

    struct FakeRules {
        result: Result<BusinessRules, StoreError>,
        calls: AtomicUsize,
    }

    impl FakeRules {
        fn seeded() -> Self {
            Self { result: Ok(BusinessRules::seed()), calls: AtomicUsize::new(0) }
        }

        fn failing() -> Self {
            Self {
                result: Err(StoreError::RulesUnavailable("upsert rejected".to_string())),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RulesSource for FakeRules {
        async fn get_business_rules(&self) -> Result<BusinessRules, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    struct FakeClassifier {
        result: Result<ClassificationResult, ClassifyError>,
        calls: AtomicUsize,
    }

    impl FakeClassifier {
        fn returning(label: &str, confidence: f64) -> Self {
            Self {
                result: Ok(ClassificationResult::new(label, confidence)),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(error: ClassifyError) -> Self {
            Self { result: Err(error), calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl IntentClassifier for FakeClassifier {
        async fn classify(&self, _text: &str) -> Result<ClassificationResult, ClassifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    struct Harness {
        rules: Arc<FakeRules>,
        classifier: Arc<FakeClassifier>,
        sender: Arc<RecordingReplySender>,
        adapter: ChannelAdapter,
    }

    fn harness(rules: FakeRules, classifier: FakeClassifier) -> Harness {
        let rules = Arc::new(rules);
        let classifier = Arc::new(classifier);
        let sender = Arc::new(RecordingReplySender::new());
        let bot = Arc::new(LibraryBot::new(rules.clone(), classifier.clone()));
        let adapter = ChannelAdapter::new(sender.clone(), bot);
        Harness { rules, classifier, sender, adapter }
    }

    fn message(text: &str) -> Activity {
        Activity {
            activity_type: ActivityType::Message,
            id: Some("act-42".to_string()),
            text: Some(text.to_string()),
            from: Some(ChannelAccount { id: "user-1".to_string(), name: None }),
            recipient: Some(ChannelAccount { id: "bot-1".to_string(), name: None }),
            conversation: Some(ConversationAccount { id: "conv-1".to_string() }),
            service_url: Some("https://channel.example.net".to_string()),
            ..Activity::default()
        }
    }

    #[tokio::test]
    async fn schedule_intent_replies_with_opening_hours() {
        let h = harness(FakeRules::seeded(), FakeClassifier::returning("Consultar_Horario", 0.92));

        h.adapter.process_activity(&message("qual o horário?"), None).await;

        let texts = h.sender.sent_texts().await;
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("✅ **Horários de Funcionamento:**"));
        assert!(texts[0].contains("08:00 às 22:00"));
    }

    #[tokio::test]
    async fn renewal_and_reservation_intents_reach_their_responders() {
        let h = harness(FakeRules::seeded(), FakeClassifier::returning("Renovar_Emprestimo", 0.88));
        h.adapter.process_activity(&message("como renovar?"), None).await;
        assert!(h.sender.sent_texts().await[0].starts_with("📚 **Renovação de Livros**"));

        let h = harness(FakeRules::seeded(), FakeClassifier::returning("Reservar_Livro", 0.88));
        h.adapter.process_activity(&message("quero reservar"), None).await;
        assert!(h.sender.sent_texts().await[0].starts_with("📖 **Reserva de Livros**"));
    }

    #[tokio::test]
    async fn empty_text_makes_no_remote_calls_and_sends_no_reply() {
        let h = harness(FakeRules::seeded(), FakeClassifier::returning("Consultar_Horario", 0.99));

        h.adapter.process_activity(&message(""), None).await;

        assert_eq!(h.rules.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.classifier.calls.load(Ordering::SeqCst), 0);
        assert!(h.sender.sent().await.is_empty());
    }

    #[tokio::test]
    async fn rules_failure_sends_apology_and_skips_classification() {
        let h = harness(FakeRules::failing(), FakeClassifier::returning("Consultar_Horario", 0.99));

        h.adapter.process_activity(&message("qual o horário?"), None).await;

        assert_eq!(
            h.sender.sent_texts().await,
            vec!["Desculpe, não consegui carregar as regras de negócio da biblioteca."]
        );
        assert_eq!(h.classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn classification_failure_sends_technical_error_with_category_only() {
        let h = harness(
            FakeRules::seeded(),
            FakeClassifier::failing(ClassifyError::Transport("connection reset".to_string())),
        );

        h.adapter.process_activity(&message("qual o horário?"), None).await;

        let texts = h.sender.sent_texts().await;
        assert_eq!(texts, vec!["Ocorreu um erro técnico: Transport"]);
        assert!(!texts[0].contains("connection reset"));
    }

    #[tokio::test]
    async fn low_confidence_replies_with_help_even_for_known_label() {
        let h = harness(FakeRules::seeded(), FakeClassifier::returning("Reservar_Livro", 0.55));

        h.adapter.process_activity(&message("hmm talvez um livro"), None).await;

        assert_eq!(
            h.sender.sent_texts().await,
            vec![
                "Desculpe, não entendi 'hmm talvez um livro'.\nTente perguntar: 'Qual o horário?', 'Como renovar?' ou 'Quero reservar'."
            ]
        );
    }

    #[tokio::test]
    async fn confident_unmapped_label_replies_with_help() {
        let h = harness(FakeRules::seeded(), FakeClassifier::returning("Devolver_Livro", 0.97));

        h.adapter.process_activity(&message("quero devolver"), None).await;

        let texts = h.sender.sent_texts().await;
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("Desculpe, não entendi 'quero devolver'."));
    }

    #[tokio::test]
    async fn conversation_update_greets_only_non_bot_members() {
        let h = harness(FakeRules::seeded(), FakeClassifier::returning("Consultar_Horario", 0.9));

        let activity = Activity {
            activity_type: ActivityType::ConversationUpdate,
            members_added: vec![
                ChannelAccount { id: "bot-1".to_string(), name: None },
                ChannelAccount { id: "user-1".to_string(), name: None },
            ],
            ..message("")
        };
        h.adapter.process_activity(&activity, None).await;

        assert_eq!(h.sender.sent_texts().await, vec!["Olá! Sou o Chatbot da Biblioteca."]);
        assert_eq!(h.rules.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reply_delivery_failure_degrades_to_critical_error() {
        let h = harness(FakeRules::seeded(), FakeClassifier::returning("Consultar_Horario", 0.9));

        h.sender.fail_next_send().await;
        h.adapter.process_activity(&message("qual o horário?"), None).await;

        // The schedule reply failed to send; the adapter's turn-error hook
        // then delivered the generic critical-error reply.
        assert_eq!(h.sender.sent_texts().await, vec!["Erro crítico no bot."]);
    }
}
