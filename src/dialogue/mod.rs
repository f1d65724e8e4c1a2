//! Guided conversation: state machine, response protocol and turn loop.

pub mod manager;
pub mod prompts;
pub mod protocol;
pub mod state;

pub use manager::{DialogueManager, TurnOutcome};
pub use protocol::{AssistantAction, parse_action, parse_action_strict};
pub use state::{ConversationState, DialoguePhase, RejectReason};
