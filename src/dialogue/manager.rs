//! DialogueManager: drives the turn loop, owns conversation state and
//! triggers plan synthesis.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::{CallProfile, GenerationConfig};
use crate::error::FailureClass;
use crate::llm::{ChatMessage, GenerationClient};
use crate::plan::{GeneratedPlan, PlanSynthesizer};

use super::prompts::{DIALOGUE_POLICY, failure_notice, notice_for};
use super::protocol::{AssistantAction, parse_action};
use super::state::{ConversationState, DialoguePhase, RejectReason};

/// What a call to [`DialogueManager::submit`] did.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// Nothing changed and nothing was sent.
    Rejected(RejectReason),
    /// The assistant answered with `Continue` or `Redirect`.
    Replied(AssistantAction),
    /// The plan was generated; the conversation is finished.
    PlanReady {
        message: String,
        plan: Arc<GeneratedPlan>,
    },
    /// Generation failed; `notice` was appended in place of a reply.
    Failed { class: FailureClass, notice: String },
    /// The conversation was reset while the turn was in flight; its result
    /// was dropped.
    Superseded,
}

/// Coordinates one conversation: state, generation and synthesis.
///
/// All methods take `&self`. State sits behind a lock that is never held
/// while waiting on the network, so readers can observe `Processing`
/// while a turn is in flight.
///
/// At most one generation call runs at a time. `in_flight` outlives a
/// reset, so a turn superseded by a reset still blocks new input until its
/// call returns.
pub struct DialogueManager {
    state: Arc<RwLock<ConversationState>>,
    in_flight: Arc<AtomicBool>,
    client: RwLock<Option<GenerationClient>>,
    turn: CallProfile,
    synthesis: CallProfile,
}

impl DialogueManager {
    /// A manager with no generation client; input is rejected until
    /// [`configure`](Self::configure) is called.
    pub fn new(generation: &GenerationConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(ConversationState::new())),
            in_flight: Arc::new(AtomicBool::new(false)),
            client: RwLock::new(None),
            turn: generation.turn,
            synthesis: generation.synthesis,
        }
    }

    pub fn with_client(client: GenerationClient, generation: &GenerationConfig) -> Self {
        Self {
            client: RwLock::new(Some(client)),
            ..Self::new(generation)
        }
    }

    /// Install or replace the generation client (new key or model).
    ///
    /// Applies to the next turn; a turn already in flight finishes with the
    /// client it started with.
    pub async fn configure(&self, client: GenerationClient) {
        info!(model = client.model_name(), "Generation client configured");
        *self.client.write().await = Some(client);
    }

    pub async fn is_configured(&self) -> bool {
        self.client.read().await.is_some()
    }

    /// Model of the installed client, if any.
    pub async fn model(&self) -> Option<String> {
        self.client
            .read()
            .await
            .as_ref()
            .map(|client| client.model_name().to_string())
    }

    /// Submit one user message and run the turn to completion.
    pub async fn submit(&self, input: &str) -> TurnOutcome {
        if input.trim().is_empty() {
            return TurnOutcome::Rejected(RejectReason::EmptyInput);
        }
        let Some(client) = self.client.read().await.clone() else {
            return TurnOutcome::Rejected(RejectReason::NotConfigured);
        };

        let (epoch, session_id, history) = {
            let mut state = self.state.write().await;
            if let Err(reason) = state.check_accepts() {
                debug!(phase = %state.phase, %reason, "Input rejected");
                return TurnOutcome::Rejected(reason);
            }
            if self.in_flight.load(Ordering::Acquire) {
                debug!("Previous turn still generating, input rejected");
                return TurnOutcome::Rejected(RejectReason::Busy);
            }
            if let Err(e) = state.transition(DialoguePhase::Processing) {
                warn!(error = %e, "Input rejected");
                return TurnOutcome::Rejected(RejectReason::Busy);
            }
            state.messages.push(ChatMessage::user(input));
            self.in_flight.store(true, Ordering::Release);
            (state.epoch, state.session_id, state.messages.clone())
        };

        let guard = TurnGuard::new(self.state.clone(), self.in_flight.clone(), epoch);
        let outcome = self
            .run_turn(&client, epoch, history)
            .instrument(info_span!("turn", session = %session_id))
            .await;
        guard.disarm();
        outcome
    }

    async fn run_turn(
        &self,
        client: &GenerationClient,
        epoch: u64,
        mut history: Vec<ChatMessage>,
    ) -> TurnOutcome {
        let raw = match client.invoke(DIALOGUE_POLICY, &history, &self.turn).await {
            Ok(raw) => raw,
            Err(e) => {
                let class = e.failure_class();
                warn!(error = %e, %class, "Turn generation failed");
                let notice = notice_for(&e);
                let appended = notice.clone();
                return self
                    .commit(
                        epoch,
                        DialoguePhase::AwaitingInput,
                        TurnOutcome::Failed { class, notice },
                        move |state| state.messages.push(ChatMessage::assistant(appended)),
                    )
                    .await;
            }
        };

        let action = parse_action(&raw);
        info!(action = action.kind(), "Assistant replied");

        match action {
            AssistantAction::GeneratePlan(message) => {
                if self.is_stale(epoch).await {
                    return TurnOutcome::Superseded;
                }
                history.push(ChatMessage::assistant(message.clone()));
                let plan = PlanSynthesizer::new(client.clone(), self.synthesis)
                    .synthesize(&history)
                    .await;
                info!(default = plan.is_default(), "Birth plan ready");

                let (appended, stored) = (message.clone(), plan.clone());
                self.commit(
                    epoch,
                    DialoguePhase::PlanReady,
                    TurnOutcome::PlanReady { message, plan },
                    move |state| {
                        state.messages.push(ChatMessage::assistant(appended));
                        state.plan = Some(stored);
                    },
                )
                .await
            }
            reply => {
                let appended = reply.message().to_string();
                self.commit(
                    epoch,
                    DialoguePhase::AwaitingInput,
                    TurnOutcome::Replied(reply),
                    move |state| state.messages.push(ChatMessage::assistant(appended)),
                )
                .await
            }
        }
    }

    /// Apply a turn's result in one step, unless the conversation moved on.
    ///
    /// Releases the in-flight marker under the state lock either way.
    async fn commit<F>(
        &self,
        epoch: u64,
        target: DialoguePhase,
        outcome: TurnOutcome,
        apply: F,
    ) -> TurnOutcome
    where
        F: FnOnce(&mut ConversationState),
    {
        let mut state = self.state.write().await;
        self.in_flight.store(false, Ordering::Release);
        if state.epoch != epoch {
            debug!("Conversation was reset during the turn, discarding result");
            return TurnOutcome::Superseded;
        }
        if let Err(e) = state.transition(target) {
            warn!(error = %e, "Turn result discarded");
            return TurnOutcome::Superseded;
        }
        apply(&mut *state);
        outcome
    }

    async fn is_stale(&self, epoch: u64) -> bool {
        self.state.read().await.epoch != epoch
    }

    /// Start over: one greeting, no plan, fresh session id.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        let previous = state.phase;
        state.reset();
        info!(previous_phase = %previous, session = %state.session_id, "Conversation reset");
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.read().await.messages.clone()
    }

    pub async fn phase(&self) -> DialoguePhase {
        self.state.read().await.phase
    }

    pub async fn plan(&self) -> Option<Arc<GeneratedPlan>> {
        self.state.read().await.plan.clone()
    }

    pub async fn session_id(&self) -> Uuid {
        self.state.read().await.session_id
    }

    /// A consistent copy of the whole state.
    pub async fn state_snapshot(&self) -> ConversationState {
        self.state.read().await.clone()
    }
}

/// Recovers the conversation if a turn is dropped before it commits.
///
/// The turn is treated as a generic failure: the user message stays and a
/// notice is appended. The in-flight marker is released on every drop,
/// disarmed or not.
struct TurnGuard {
    state: Arc<RwLock<ConversationState>>,
    in_flight: Arc<AtomicBool>,
    epoch: u64,
    armed: bool,
}

impl TurnGuard {
    fn new(state: Arc<RwLock<ConversationState>>, in_flight: Arc<AtomicBool>, epoch: u64) -> Self {
        Self {
            state,
            in_flight,
            epoch,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        if !self.armed {
            self.in_flight.store(false, Ordering::Release);
            return;
        }
        let epoch = self.epoch;
        match self.state.try_write() {
            Ok(mut state) => abandon_turn(&mut *state, epoch),
            Err(_) => match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let state = self.state.clone();
                    handle.spawn(async move {
                        abandon_turn(&mut *state.write().await, epoch);
                    });
                }
                Err(_) => warn!("Turn dropped outside a runtime, state left processing"),
            },
        }
        self.in_flight.store(false, Ordering::Release);
    }
}

fn abandon_turn(state: &mut ConversationState, epoch: u64) {
    if state.epoch != epoch || state.transition(DialoguePhase::AwaitingInput).is_err() {
        return;
    }
    warn!(session = %state.session_id, "Turn cancelled before completion");
    state
        .messages
        .push(ChatMessage::assistant(failure_notice(FailureClass::Generic)));
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use tokio::sync::Notify;

    use super::*;
    use crate::dialogue::prompts::GREETING;
    use crate::error::LlmError;
    use crate::llm::testing::{Scripted, ScriptedLlm};
    use crate::llm::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role};
    use crate::plan::BirthPlan;

    fn manager(script: Vec<Scripted>) -> (DialogueManager, Arc<ScriptedLlm>) {
        let llm = Arc::new(ScriptedLlm::new(script));
        let client = GenerationClient::new(llm.clone(), Duration::from_secs(5));
        (
            DialogueManager::with_client(client, &GenerationConfig::default()),
            llm,
        )
    }

    async fn wait_for_processing(manager: &DialogueManager) {
        while manager.phase().await != DialoguePhase::Processing {
            tokio::task::yield_now().await;
        }
    }

    /// Answers only once released.
    struct GatedLlm {
        gate: Notify,
        reply: String,
    }

    #[async_trait]
    impl LlmProvider for GatedLlm {
        fn model_name(&self) -> &str {
            "gated"
        }

        fn cost_per_token(&self) -> (Decimal, Decimal) {
            (Decimal::ZERO, Decimal::ZERO)
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.gate.notified().await;
            Ok(CompletionResponse {
                content: self.reply.clone(),
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: FinishReason::Stop,
                response_id: None,
            })
        }
    }

    #[tokio::test]
    async fn continue_appends_one_pair() {
        let (manager, llm) = manager(vec![Scripted::action("CONTINUE", "When is your due date?")]);
        let outcome = manager.submit("We're Sam and Alex").await;
        assert!(matches!(outcome, TurnOutcome::Replied(AssistantAction::Continue(_))));

        let messages = manager.messages().await;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], ChatMessage::user("We're Sam and Alex"));
        assert_eq!(messages[2], ChatMessage::assistant("When is your due date?"));
        assert_eq!(manager.phase().await, DialoguePhase::AwaitingInput);

        let sent = &llm.requests()[0];
        assert_eq!(sent.messages[0], ChatMessage::system(DIALOGUE_POLICY));
        assert_eq!(sent.messages[1], ChatMessage::assistant(GREETING));
        assert_eq!(sent.messages.len(), 3);
        assert_eq!(sent.temperature, Some(0.7));
    }

    #[tokio::test]
    async fn redirect_is_handled_like_continue() {
        let (manager, _) = manager(vec![Scripted::action(
            "REDIRECT",
            "Let's focus on your birth plan. Who will be with you?",
        )]);
        let outcome = manager.submit("What's the weather?").await;
        assert!(matches!(outcome, TurnOutcome::Replied(AssistantAction::Redirect(_))));
        assert_eq!(manager.messages().await.len(), 3);
        assert_eq!(manager.phase().await, DialoguePhase::AwaitingInput);
    }

    #[tokio::test]
    async fn malformed_reply_is_shown_verbatim() {
        let (manager, _) = manager(vec![Scripted::text("Sure! When are you due?")]);
        manager.submit("Hi").await;
        let messages = manager.messages().await;
        assert_eq!(messages[2].content, "Sure! When are you due?");
    }

    #[tokio::test]
    async fn rejected_input_changes_nothing() {
        let (manager, llm) = manager(vec![]);
        for input in ["", "   ", "\n\t"] {
            assert!(matches!(
                manager.submit(input).await,
                TurnOutcome::Rejected(RejectReason::EmptyInput)
            ));
        }
        assert_eq!(manager.messages().await.len(), 1);
        assert_eq!(llm.call_count(), 0);

        let unconfigured = DialogueManager::new(&GenerationConfig::default());
        assert!(!unconfigured.is_configured().await);
        assert!(matches!(
            unconfigured.submit("hello").await,
            TurnOutcome::Rejected(RejectReason::NotConfigured)
        ));
        assert_eq!(unconfigured.messages().await.len(), 1);
    }

    #[tokio::test]
    async fn configure_enables_input() {
        let manager = DialogueManager::new(&GenerationConfig::default());
        assert_eq!(manager.model().await, None);
        let llm = Arc::new(ScriptedLlm::new([Scripted::action("CONTINUE", "Due date?")]));
        manager
            .configure(GenerationClient::new(llm.clone(), Duration::from_secs(5)))
            .await;
        assert!(manager.is_configured().await);
        assert_eq!(manager.model().await.as_deref(), Some("scripted"));
        assert!(matches!(manager.submit("Sam").await, TurnOutcome::Replied(_)));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn generate_plan_commits_message_and_plan_together() {
        let (manager, llm) = manager(vec![
            Scripted::action("GENERATE_PLAN", "Great! I'll generate your personalized birth plan now."),
            Scripted::text(r#"{"personalInfo": {"parentNames": "Sam and Alex"}}"#),
        ]);
        let outcome = manager.submit("I'm ready").await;
        let TurnOutcome::PlanReady { message, plan } = outcome else {
            panic!("expected plan, got {outcome:?}");
        };
        assert!(message.starts_with("Great!"));
        assert_eq!(plan.plan.personal_info.parent_names, "Sam and Alex");
        assert_eq!(
            plan.plan.feeding_plan,
            BirthPlan::default().feeding_plan,
            "unmentioned sections come from defaults"
        );

        let snapshot = manager.state_snapshot().await;
        assert_eq!(snapshot.phase, DialoguePhase::PlanReady);
        assert_eq!(snapshot.messages.len(), 3);
        assert_eq!(snapshot.messages[2].content, message);
        assert!(Arc::ptr_eq(snapshot.plan.as_ref().unwrap(), &plan));

        let synthesis = &llm.requests()[1];
        assert_eq!(synthesis.temperature, Some(0.3));
        assert!(synthesis.messages[1].content.contains("I'm ready"));
        assert!(synthesis.messages[1].content.contains("Great!"));

        assert!(matches!(
            manager.submit("One more thing").await,
            TurnOutcome::Rejected(RejectReason::PlanReady)
        ));
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn synthesis_failure_still_finishes_with_default_plan() {
        let (manager, _) = manager(vec![
            Scripted::action("GENERATE_PLAN", "Generating now."),
            Scripted::Auth,
        ]);
        let outcome = manager.submit("generate the plan").await;
        assert!(matches!(outcome, TurnOutcome::PlanReady { ref plan, .. } if plan.is_default()));
        assert_eq!(manager.phase().await, DialoguePhase::PlanReady);
    }

    #[tokio::test]
    async fn failures_append_one_notice_per_class() {
        let cases = [
            (Scripted::Auth, FailureClass::Auth),
            (Scripted::RateLimit, FailureClass::RateLimit),
            (Scripted::Quota, FailureClass::Quota),
            (Scripted::Network, FailureClass::Generic),
        ];
        for (scripted, expected) in cases {
            let (manager, _) = manager(vec![scripted]);
            let outcome = manager.submit("Hello").await;
            let TurnOutcome::Failed { class, notice } = outcome else {
                panic!("expected failure, got {outcome:?}");
            };
            assert_eq!(class, expected);

            let messages = manager.messages().await;
            assert_eq!(messages.len(), 3);
            assert_eq!(messages[1], ChatMessage::user("Hello"));
            assert_eq!(messages[2], ChatMessage::assistant(notice));
            assert_eq!(manager.phase().await, DialoguePhase::AwaitingInput);
        }
    }

    #[tokio::test]
    async fn input_while_processing_is_rejected() {
        let (manager, llm) = manager(vec![Scripted::Hang]);
        let manager = Arc::new(manager);
        let pending = tokio::spawn({
            let manager = manager.clone();
            async move { manager.submit("first").await }
        });

        wait_for_processing(&manager).await;
        assert!(matches!(
            manager.submit("second").await,
            TurnOutcome::Rejected(RejectReason::Busy)
        ));
        assert_eq!(llm.call_count(), 1);
        assert_eq!(manager.messages().await.len(), 2);
        pending.abort();
    }

    #[tokio::test]
    async fn dropped_turn_recovers_as_generic_failure() {
        let (manager, _) = manager(vec![Scripted::Hang, Scripted::action("CONTINUE", "Welcome back.")]);
        let timed_out = tokio::time::timeout(Duration::from_millis(20), manager.submit("hello")).await;
        assert!(timed_out.is_err());

        let messages = manager.messages().await;
        assert_eq!(messages.len(), 3);
        assert_eq!(
            messages[2],
            ChatMessage::assistant(failure_notice(FailureClass::Generic))
        );
        assert_eq!(manager.phase().await, DialoguePhase::AwaitingInput);
        assert!(matches!(manager.submit("hello").await, TurnOutcome::Replied(_)));
    }

    #[tokio::test]
    async fn reset_discards_in_flight_result() {
        let llm = Arc::new(GatedLlm {
            gate: Notify::new(),
            reply: r#"{"action":"CONTINUE","message":"stale"}"#.to_string(),
        });
        let client = GenerationClient::new(llm.clone(), Duration::from_secs(5));
        let manager = Arc::new(DialogueManager::with_client(
            client,
            &GenerationConfig::default(),
        ));
        let first_session = manager.session_id().await;

        let pending = tokio::spawn({
            let manager = manager.clone();
            async move { manager.submit("hello").await }
        });
        wait_for_processing(&manager).await;

        manager.reset().await;
        llm.gate.notify_one();
        let outcome = pending.await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Superseded));

        let snapshot = manager.state_snapshot().await;
        assert_eq!(snapshot.messages, vec![ChatMessage::assistant(GREETING)]);
        assert_eq!(snapshot.phase, DialoguePhase::AwaitingInput);
        assert_ne!(snapshot.session_id, first_session);
    }

    #[tokio::test]
    async fn reset_keeps_input_blocked_until_the_running_call_returns() {
        let llm = Arc::new(GatedLlm {
            gate: Notify::new(),
            reply: r#"{"action":"CONTINUE","message":"When are you due?"}"#.to_string(),
        });
        let client = GenerationClient::new(llm.clone(), Duration::from_secs(5));
        let manager = Arc::new(DialogueManager::with_client(
            client,
            &GenerationConfig::default(),
        ));

        let pending = tokio::spawn({
            let manager = manager.clone();
            async move { manager.submit("one").await }
        });
        wait_for_processing(&manager).await;
        manager.reset().await;
        assert_eq!(manager.phase().await, DialoguePhase::AwaitingInput);

        assert!(matches!(
            manager.submit("two").await,
            TurnOutcome::Rejected(RejectReason::Busy)
        ));
        assert_eq!(manager.messages().await, vec![ChatMessage::assistant(GREETING)]);

        llm.gate.notify_one();
        assert!(matches!(pending.await.unwrap(), TurnOutcome::Superseded));

        llm.gate.notify_one();
        assert!(matches!(manager.submit("two").await, TurnOutcome::Replied(_)));
        let messages = manager.messages().await;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], ChatMessage::user("two"));
    }

    #[tokio::test]
    async fn rate_limit_notice_names_the_wait() {
        let (manager, _) = manager(vec![Scripted::RateLimit]);
        let TurnOutcome::Failed { notice, .. } = manager.submit("Hello").await else {
            panic!("expected failure");
        };
        assert!(notice.contains("wait about 1 second "), "{notice}");
    }

    #[test]
    fn abandoning_outside_processing_changes_nothing() {
        let mut state = ConversationState::new();
        abandon_turn(&mut state, 0);
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.phase, DialoguePhase::AwaitingInput);

        state.transition(DialoguePhase::Processing).unwrap();
        state.transition(DialoguePhase::PlanReady).unwrap();
        abandon_turn(&mut state, 0);
        assert_eq!(state.phase, DialoguePhase::PlanReady);
        assert_eq!(state.messages.len(), 1);
    }

    #[tokio::test]
    async fn reset_after_plan_clears_everything() {
        let (manager, _) = manager(vec![
            Scripted::action("GENERATE_PLAN", "Generating now."),
            Scripted::text("not a plan"),
        ]);
        manager.submit("I'm ready").await;
        assert!(manager.plan().await.is_some());

        manager.reset().await;
        let messages = manager.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Assistant);
        assert!(manager.plan().await.is_none());
        assert_eq!(manager.phase().await, DialoguePhase::AwaitingInput);
    }
}
