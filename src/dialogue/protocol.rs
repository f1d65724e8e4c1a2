//! Response protocol: model replies are JSON action objects.
//!
//! The model does not always follow formatting instructions, so anything
//! that fails strict decoding becomes a plain `Continue` carrying the raw
//! text. The dialogue loop never fails on a malformed reply.

use serde::Deserialize;
use tracing::warn;

use crate::error::ProtocolDecodeError;

/// What the assistant wants to do with its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantAction {
    /// Ordinary turn, one question asked.
    Continue(String),
    /// The user went off-topic and was steered back. Handled like `Continue`.
    Redirect(String),
    /// The parents are ready; synthesize the plan.
    GeneratePlan(String),
}

impl AssistantAction {
    pub fn message(&self) -> &str {
        match self {
            Self::Continue(m) | Self::Redirect(m) | Self::GeneratePlan(m) => m,
        }
    }

    /// Wire name of the action.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Continue(_) => "CONTINUE",
            Self::Redirect(_) => "REDIRECT",
            Self::GeneratePlan(_) => "GENERATE_PLAN",
        }
    }
}

#[derive(Deserialize)]
enum ActionKind {
    #[serde(rename = "CONTINUE")]
    Continue,
    #[serde(rename = "REDIRECT")]
    Redirect,
    #[serde(rename = "GENERATE_PLAN")]
    GeneratePlan,
}

#[derive(Deserialize)]
struct Envelope {
    action: ActionKind,
    message: String,
}

/// Decode a reply strictly: a JSON object with string `action` and
/// `message`, where `action` is one of the three wire names exactly.
pub fn parse_action_strict(raw: &str) -> Result<AssistantAction, ProtocolDecodeError> {
    let envelope: Envelope = serde_json::from_str(raw)?;
    Ok(match envelope.action {
        ActionKind::Continue => AssistantAction::Continue(envelope.message),
        ActionKind::Redirect => AssistantAction::Redirect(envelope.message),
        ActionKind::GeneratePlan => AssistantAction::GeneratePlan(envelope.message),
    })
}

/// Decode a reply, falling back to `Continue(raw)` on any decode error.
pub fn parse_action(raw: &str) -> AssistantAction {
    match parse_action_strict(raw) {
        Ok(action) => action,
        Err(e) => {
            warn!(error = %e, "Reply is not an action object, treating it as CONTINUE");
            AssistantAction::Continue(raw.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_continue() {
        assert_eq!(
            parse_action(r#"{"action":"CONTINUE","message":"How are you?"}"#),
            AssistantAction::Continue("How are you?".into())
        );
    }

    #[test]
    fn parses_redirect_and_generate() {
        assert_eq!(
            parse_action(r#"{"action": "REDIRECT", "message": "Let's get back to your plan."}"#),
            AssistantAction::Redirect("Let's get back to your plan.".into())
        );
        let action = parse_action(
            r#"{"action":"GENERATE_PLAN","message":"Great! I'll generate your personalized birth plan now."}"#,
        );
        assert_eq!(action.kind(), "GENERATE_PLAN");
        assert!(action.message().starts_with("Great!"));
    }

    #[test]
    fn non_json_falls_back_verbatim() {
        assert_eq!(
            parse_action("not json"),
            AssistantAction::Continue("not json".into())
        );
    }

    #[test]
    fn unknown_action_falls_back_verbatim() {
        let raw = r#"{"action":"BOGUS","message":"x"}"#;
        assert!(parse_action_strict(raw).is_err());
        assert_eq!(parse_action(raw), AssistantAction::Continue(raw.into()));
    }

    #[test]
    fn action_match_is_case_sensitive() {
        let raw = r#"{"action":"continue","message":"hi"}"#;
        assert_eq!(parse_action(raw), AssistantAction::Continue(raw.into()));
    }

    #[test]
    fn missing_or_non_string_fields_fall_back() {
        for raw in [
            r#"{"action":"CONTINUE"}"#,
            r#"{"message":"hi"}"#,
            r#"{"action":"CONTINUE","message":42}"#,
            r#"["CONTINUE","hi"]"#,
            "",
        ] {
            assert!(parse_action_strict(raw).is_err(), "{raw:?} should not decode");
            assert_eq!(parse_action(raw), AssistantAction::Continue(raw.into()));
        }
    }

    #[test]
    fn trailing_prose_is_not_an_action() {
        let raw = r#"{"action":"CONTINUE","message":"hi"} Hope that helps!"#;
        assert_eq!(parse_action(raw), AssistantAction::Continue(raw.into()));
    }
}
