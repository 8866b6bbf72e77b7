//! # TroLySo Agent
//! Turns one inbound chat message into one delivered, grounded reply.
//!
//! ## Pieces
//! - **ConversationGate**: at most one message per user in flight, later
//!   messages wait their turn
//! - **Assistant**: retrieval → history → backend → split → deliver → persist,
//!   with a fixed apology on failure
//! - **reply**: splitting long replies at line and word boundaries
//! - **prompt**: the reference-material block prepended to user messages

pub mod gate;
pub mod orchestrator;
pub mod policy;
pub mod prompt;
pub mod reply;

pub use gate::ConversationGate;
pub use orchestrator::{Assistant, AssistantSettings, Outcome};
