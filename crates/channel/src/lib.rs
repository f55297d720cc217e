//! Bot-channel transport for bibliobot.
//!
//! - `activity` — the minimal wire schema for channel activities (messages
//!   and conversation updates), serde camelCase.
//! - `connector` — outbound reply delivery: the [`ReplySender`] seam, an HTTP
//!   connector posting replies back to the originating service URL, and a
//!   recording sender for tests.
//! - `adapter` — inbound dispatch: routes one activity to a [`TurnHandler`]
//!   and guarantees a best-effort critical-error reply if a handler leaks an
//!   error.

pub mod activity;
pub mod adapter;
pub mod connector;

pub use activity::{Activity, ActivityType, ChannelAccount, ConversationAccount};
pub use adapter::{ChannelAdapter, TurnContext, TurnHandler};
pub use connector::{ChannelError, HttpConnector, RecordingReplySender, ReplySender};
