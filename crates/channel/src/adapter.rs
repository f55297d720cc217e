use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::activity::{Activity, ActivityType};
use crate::connector::{ChannelError, ReplySender};

/// Per-turn view handed to the turn handler: the inbound activity plus the
/// reply primitive, scoped by a correlation id.
pub struct TurnContext<'a> {
    activity: &'a Activity,
    sender: &'a dyn ReplySender,
    correlation_id: &'a str,
}

impl<'a> TurnContext<'a> {
    pub fn activity(&self) -> &Activity {
        self.activity
    }

    pub fn correlation_id(&self) -> &str {
        self.correlation_id
    }

    /// Sends a plain-text reply into the originating conversation.
    pub async fn send_text(&self, text: &str) -> Result<(), ChannelError> {
        let reply = self.activity.reply_text(text);
        self.sender.send_activity(&reply).await
    }
}

/// One implementation per bot: receives classified turn events from the
/// adapter. Handlers are expected to resolve their own failure modes into
/// replies; anything they leak is caught by the adapter's turn-error hook.
#[async_trait]
pub trait TurnHandler: Send + Sync {
    async fn on_message(&self, ctx: &TurnContext<'_>, text: &str) -> anyhow::Result<()>;

    async fn on_conversation_update(&self, _ctx: &TurnContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Routes inbound activities to the turn handler and degrades leaked errors
/// into a generic critical-error reply instead of crashing the transport.
pub struct ChannelAdapter {
    sender: Arc<dyn ReplySender>,
    handler: Arc<dyn TurnHandler>,
}

const CRITICAL_ERROR_REPLY: &str = "Erro crítico no bot.";

impl ChannelAdapter {
    pub fn new(sender: Arc<dyn ReplySender>, handler: Arc<dyn TurnHandler>) -> Self {
        Self { sender, handler }
    }

    /// Processes one inbound activity end to end. Always returns; turn
    /// failures surface to the user as replies, not to the transport layer.
    /// The inbound Authorization header is accepted but not validated here:
    /// emulator traffic carries none, and channel-service token validation
    /// sits outside this adapter.
    pub async fn process_activity(&self, activity: &Activity, _auth_header: Option<&str>) {
        let correlation_id = activity
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let ctx = TurnContext {
            activity,
            sender: self.sender.as_ref(),
            correlation_id: &correlation_id,
        };

        info!(
            event_name = "ingress.activity_received",
            activity_type = ?activity.activity_type,
            correlation_id = %correlation_id,
            "received channel activity"
        );

        let outcome = match activity.activity_type {
            ActivityType::Message => {
                let text = activity.text.as_deref().unwrap_or("");
                self.handler.on_message(&ctx, text).await
            }
            ActivityType::ConversationUpdate => self.handler.on_conversation_update(&ctx).await,
            ActivityType::Unsupported => {
                debug!(
                    event_name = "ingress.activity_ignored",
                    correlation_id = %correlation_id,
                    "unsupported activity type ignored"
                );
                Ok(())
            }
        };

        if let Err(error) = outcome {
            warn!(
                event_name = "turn.unhandled_error",
                correlation_id = %correlation_id,
                error = %error,
                "turn handler leaked an error; sending critical-error reply"
            );
            if let Err(send_error) = ctx.send_text(CRITICAL_ERROR_REPLY).await {
                warn!(
                    event_name = "turn.error_reply_failed",
                    correlation_id = %correlation_id,
                    error = %send_error,
                    "critical-error reply could not be delivered"
                );
            }
        }
    }
}
