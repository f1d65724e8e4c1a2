//! Dialogue policy instruction, greeting and failure notices.

use std::time::Duration;

use crate::error::{FailureClass, LlmError};

/// First assistant message of every session.
pub const GREETING: &str = "Hello! I'm here to help you create a comprehensive birth plan for \
your upcoming delivery. This plan will help communicate all your preferences to your healthcare \
team. Let's start with some basic information - what are your names?";

/// System instruction sent as the first message of every turn.
pub const DIALOGUE_POLICY: &str = r#"You are a warm, supportive birth plan assistant helping expecting parents prepare for their delivery. You should guide them through creating a comprehensive birth plan by asking relevant questions about their preferences.

CRITICAL RULES:
1. Ask ONLY ONE question at a time - never multiple questions in the same response
2. Be thorough - ask follow-up questions to get complete details
3. Keep responses conversational, warm, and supportive
4. ONLY discuss topics related to pregnancy, labor, delivery, birth plans, and newborn care
5. If the user asks about anything unrelated, politely redirect them back to birth plan topics
6. Record the parents' preferences; never recommend medical decisions

Topics to cover comprehensively:
- Personal information (emergency contacts, medical history, allergies)
- Support team and communication preferences
- Labor environment preferences
- Pain management options (be thorough about different methods)
- Labor interventions (monitoring, IV, movement, eating/drinking)
- Labor augmentation (Pitocin, breaking water, internal monitoring)
- Delivery preferences (positions, who catches baby, episiotomy, assisted delivery)
- Cord and placenta (delayed clamping timing, who cuts, banking, placenta plans)
- Immediate postpartum (skin-to-skin duration, first feeding timing, baby exams location)
- Newborn procedures (Vitamin K, eye ointment, Hep B, screening, bath timing, circumcision)
- Emergency plans (C-section preferences, NICU preferences, partner's role)
- Feeding plans (method, support needs, pacifier use, supplementation)
- Special requests, cultural/religious needs, photography rules
- Additional notes that don't fit elsewhere

When the user seems ready to generate their birth plan (they say things like "I'm ready", "let's create it", "generate the plan"), respond with exactly this format:
{"action": "GENERATE_PLAN", "message": "Great! I'll generate your personalized birth plan now."}

For normal conversation, respond with:
{"action": "CONTINUE", "message": "Your conversational response with ONE question"}

If they ask about non-birth topics, respond with:
{"action": "REDIRECT", "message": "I'm specifically designed to help you create a birth plan. Let's focus on your preferences for labor, delivery, and newborn care. [Then ask ONE relevant birth plan question]"}

ALWAYS respond with a valid JSON object containing exactly the "action" and "message" fields."#;

const FAILURE_PREFIX: &str = "I apologize, but I encountered an error. ";

/// The assistant message appended when a turn's generation call fails.
pub fn failure_notice(class: FailureClass) -> String {
    let guidance = match class {
        FailureClass::Auth => {
            "Your API key seems to be invalid. Please check your API key in settings."
        }
        FailureClass::RateLimit => {
            "Rate limit exceeded. Please wait a moment before trying again."
        }
        FailureClass::Quota => {
            "Your OpenAI account has insufficient quota. Please check your billing settings."
        }
        FailureClass::Generic => "Please try again or check your internet connection.",
    };
    format!("{FAILURE_PREFIX}{guidance}")
}

/// Notice for a specific error, with the provider's wait hint when it
/// sent one.
pub fn notice_for(error: &LlmError) -> String {
    match error {
        LlmError::RateLimited {
            retry_after: Some(delay),
            ..
        } => {
            let secs = wait_seconds(*delay);
            let unit = if secs == 1 { "second" } else { "seconds" };
            format!(
                "{FAILURE_PREFIX}Rate limit exceeded. Please wait about {secs} {unit} before trying again."
            )
        }
        other => failure_notice(other.failure_class()),
    }
}

fn wait_seconds(delay: Duration) -> u64 {
    let secs = delay.as_secs() + u64::from(delay.subsec_nanos() > 0);
    secs.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_covers_protocol_and_topics() {
        for action in ["CONTINUE", "REDIRECT", "GENERATE_PLAN"] {
            assert!(DIALOGUE_POLICY.contains(&format!("\"action\": \"{action}\"")));
        }
        assert!(DIALOGUE_POLICY.contains("ONLY ONE question"));
        assert!(DIALOGUE_POLICY.contains("I'm ready"));
        let topics = DIALOGUE_POLICY
            .lines()
            .skip_while(|l| !l.starts_with("Topics to cover"))
            .filter(|l| l.starts_with("- "))
            .count();
        assert!(topics >= 13, "only {topics} topics");
    }

    #[test]
    fn notices_share_prefix_and_differ_by_class() {
        let classes = [
            FailureClass::Auth,
            FailureClass::RateLimit,
            FailureClass::Quota,
            FailureClass::Generic,
        ];
        let notices: Vec<String> = classes.iter().map(|c| failure_notice(*c)).collect();
        for notice in &notices {
            assert!(notice.starts_with(FAILURE_PREFIX));
        }
        assert!(notices[0].contains("API key"));
        assert!(notices[1].contains("Rate limit"));
        assert!(notices[2].contains("quota"));
        let mut unique = notices.clone();
        unique.dedup();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn rate_limit_notice_carries_the_wait() {
        let limited = |retry_after| LlmError::RateLimited {
            provider: "openai".into(),
            retry_after,
        };

        let notice = notice_for(&limited(Some(Duration::from_secs(20))));
        assert!(notice.starts_with(FAILURE_PREFIX));
        assert!(notice.contains("wait about 20 seconds"), "{notice}");

        let notice = notice_for(&limited(Some(Duration::from_millis(250))));
        assert!(notice.contains("wait about 1 second "), "{notice}");

        let notice = notice_for(&limited(Some(Duration::from_millis(1500))));
        assert!(notice.contains("wait about 2 seconds"), "{notice}");

        assert_eq!(
            notice_for(&limited(None)),
            failure_notice(FailureClass::RateLimit)
        );
    }

    #[test]
    fn other_errors_use_the_class_notice() {
        let err = LlmError::AuthFailed {
            provider: "openai".into(),
        };
        assert_eq!(notice_for(&err), failure_notice(FailureClass::Auth));
    }
}
