//! Conversation state machine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::ChatMessage;
use crate::plan::GeneratedPlan;

use super::prompts::GREETING;

/// Where the dialogue is.
///
/// AwaitingInput → Processing → AwaitingInput loops once per turn;
/// Processing → PlanReady ends the conversation. Reset returns to
/// AwaitingInput from anywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialoguePhase {
    #[default]
    AwaitingInput,
    Processing,
    PlanReady,
}

impl DialoguePhase {
    pub fn can_transition_to(&self, target: DialoguePhase) -> bool {
        use DialoguePhase::*;
        matches!(
            (self, target),
            (AwaitingInput, Processing) | (Processing, AwaitingInput) | (Processing, PlanReady)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PlanReady)
    }
}

impl std::fmt::Display for DialoguePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingInput => "awaiting_input",
            Self::Processing => "processing",
            Self::PlanReady => "plan_ready",
        };
        write!(f, "{s}")
    }
}

/// Why a submission was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyInput,
    /// A turn is already being processed.
    Busy,
    NotConfigured,
    /// The plan has been generated; start over to continue.
    PlanReady,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::EmptyInput => "input is empty",
            Self::Busy => "a reply is still being generated",
            Self::NotConfigured => "no API key configured",
            Self::PlanReady => "the birth plan is already generated",
        };
        write!(f, "{s}")
    }
}

/// Everything one session owns.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub session_id: Uuid,
    pub phase: DialoguePhase,
    /// Append-only within a session, seeded with the greeting.
    pub messages: Vec<ChatMessage>,
    /// Set exactly when `phase` is `PlanReady`.
    pub plan: Option<Arc<GeneratedPlan>>,
    /// Bumped on reset so in-flight turns can tell they are stale.
    pub(crate) epoch: u64,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            phase: DialoguePhase::default(),
            messages: vec![ChatMessage::assistant(GREETING)],
            plan: None,
            epoch: 0,
        }
    }
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard everything and start a fresh session.
    pub fn reset(&mut self) {
        let epoch = self.epoch.wrapping_add(1);
        *self = Self {
            epoch,
            ..Self::default()
        };
    }

    /// Whether a new turn may start now.
    pub fn check_accepts(&self) -> Result<(), RejectReason> {
        if self.phase.is_terminal() {
            return Err(RejectReason::PlanReady);
        }
        if !self.phase.can_transition_to(DialoguePhase::Processing) {
            return Err(RejectReason::Busy);
        }
        Ok(())
    }

    /// Move to `target`, refusing transitions the state machine doesn't have.
    pub fn transition(&mut self, target: DialoguePhase) -> Result<(), String> {
        if !self.phase.can_transition_to(target) {
            return Err(format!("Cannot transition from {} to {}", self.phase, target));
        }
        self.phase = target;
        Ok(())
    }
}
