//! Prompt assembly for HR answers

use crate::types::{ChatMessage, Role};

/// Number of most recent conversation turns carried into the prompt
pub const HISTORY_TURNS: usize = 4;

const SYSTEM_INSTRUCTION: &str = "You are an HR Copilot AI assistant helping employees with HR-related questions. \
You provide accurate, helpful, and friendly responses based on company policies \
and employee data. Always maintain a professional yet warm tone.\n";

const RESPONSE_INSTRUCTIONS: &str = r#"Instructions:
1. Answer the question based on the provided information
2. Be specific and cite relevant policy details when applicable
3. If employee data is provided, personalize the response
4. Use a friendly, professional HR tone
5. If you don't have enough information, say so clearly
6. Format your response with bullet points or sections for readability
7. Do NOT include source citations in your response (they will be added automatically)

Your Response:"#;

/// Prompt builder for HR queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Assemble the generator prompt.
    ///
    /// Order: system instruction, recent history (oldest first), employee
    /// block, policy block, the question, response instructions. Empty
    /// context blocks are left out.
    pub fn assemble(
        employee_context: Option<&str>,
        policy_context: Option<&str>,
        history: &[ChatMessage],
        query: &str,
    ) -> String {
        let mut parts: Vec<String> = vec![SYSTEM_INSTRUCTION.to_string()];

        if !history.is_empty() {
            parts.push("Previous conversation:".to_string());
            let recent = &history[history.len().saturating_sub(HISTORY_TURNS)..];
            for message in recent {
                let speaker = match message.role {
                    Role::User => "User",
                    Role::Assistant => "Assistant",
                };
                parts.push(format!("{}: {}", speaker, message.content));
            }
            parts.push(String::new());
        }

        if let Some(context) = employee_context.filter(|c| !c.is_empty()) {
            parts.push("Employee Information:".to_string());
            parts.push(context.to_string());
            parts.push(String::new());
        }

        if let Some(context) = policy_context.filter(|c| !c.is_empty()) {
            parts.push("Relevant Policy Information:".to_string());
            parts.push(context.to_string());
            parts.push(String::new());
        }

        parts.push(format!("User Question: {}\n", query));
        parts.push(RESPONSE_INSTRUCTIONS.to_string());

        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(haystack: &str, needle: &str) -> usize {
        haystack
            .find(needle)
            .unwrap_or_else(|| panic!("missing {:?}", needle))
    }

    #[test]
    fn test_section_order() {
        let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        let prompt = PromptBuilder::assemble(
            Some("Leave Balance for Nia"),
            Some("[Source 1: leave.txt]\nrules"),
            &history,
            "how many casual leaves?",
        );

        let order = [
            "You are an HR Copilot",
            "Previous conversation:\nUser: hi\nAssistant: hello\n",
            "Employee Information:\nLeave Balance for Nia\n",
            "Relevant Policy Information:\n[Source 1: leave.txt]",
            "User Question: how many casual leaves?\n",
            "7. Do NOT include source citations",
        ];
        let positions: Vec<usize> = order.iter().map(|n| position(&prompt, n)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(prompt.ends_with("Your Response:"));
    }

    #[test]
    fn test_only_last_four_turns() {
        let history: Vec<ChatMessage> = (1..=6).map(|i| ChatMessage::user(format!("turn {}", i))).collect();
        let prompt = PromptBuilder::assemble(None, None, &history, "q");

        assert!(!prompt.contains("turn 2"));
        assert!(prompt.contains("User: turn 3\nUser: turn 4\nUser: turn 5\nUser: turn 6"));
    }

    #[test]
    fn test_absent_sections_omitted() {
        let prompt = PromptBuilder::assemble(None, Some(""), &[], "q");

        assert!(!prompt.contains("Previous conversation:"));
        assert!(!prompt.contains("Employee Information:"));
        assert!(!prompt.contains("Relevant Policy Information:"));
        assert!(prompt.starts_with(SYSTEM_INSTRUCTION));
    }
}
