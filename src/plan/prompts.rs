//! Synthesis instruction and transcript serialization.

use crate::llm::{ChatMessage, Role};

use super::defaults::TO_BE_DISCUSSED;
use super::schema::schema_template;

/// Build the system instruction for plan synthesis.
///
/// Embeds the full schema template so the model sees every key and what
/// belongs in it.
pub fn synthesis_instruction() -> String {
    let template = serde_json::to_string_pretty(&schema_template())
        .unwrap_or_else(|_| schema_template().to_string());

    format!(
        "Based on the following conversation, generate a comprehensive, well-formatted birth plan document.\n\n\
         Generate a complete birth plan in the following JSON format:\n\
         {template}\n\n\
         Fill in the plan based on what was discussed. For any topics not explicitly covered, \
         use reasonable defaults that prioritize safety and patient choice, or indicate \
         \"{TO_BE_DISCUSSED}\".\n\n\
         IMPORTANT: Respond ONLY with the JSON object. Do not include any other text, \
         markdown formatting, or backticks."
    )
}

/// The single user message carrying the transcript.
///
/// System messages are dropped; the synthesis instruction replaces them.
pub fn transcript_message(history: &[ChatMessage]) -> ChatMessage {
    let turns: Vec<&ChatMessage> = history.iter().filter(|m| m.role != Role::System).collect();
    let serialized = serde_json::to_string(&turns).unwrap_or_else(|_| {
        turns
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    });
    ChatMessage::user(format!("Here is the conversation history:\n{serialized}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_embeds_schema_and_placeholder() {
        let prompt = synthesis_instruction();
        assert!(prompt.contains("\"personalInfo\""));
        assert!(prompt.contains("\"culturalReligious\""));
        assert!(prompt.contains("Directed vs spontaneous pushing"));
        assert!(prompt.contains("\"additionalNotes\""));
        assert!(prompt.contains(TO_BE_DISCUSSED));
        assert!(prompt.contains("Respond ONLY with the JSON object"));
    }

    #[test]
    fn transcript_keeps_order_and_roles() {
        let history = vec![
            ChatMessage::assistant("What are your names?"),
            ChatMessage::user("Sam and Alex"),
            ChatMessage::system("internal"),
        ];
        let message = transcript_message(&history);
        assert_eq!(message.role, Role::User);
        let json = message
            .content
            .strip_prefix("Here is the conversation history:\n")
            .unwrap();
        let parsed: Vec<ChatMessage> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, history[..2].to_vec());
    }

    #[test]
    fn empty_transcript_is_an_empty_list() {
        let message = transcript_message(&[]);
        assert!(message.content.ends_with("[]"));
    }
}
