use pulseops_core::assistant::FaqAssistant;
use pulseops_core::domain::session::DashboardRole;
use serde_json::json;

use crate::commands::CommandResult;

/// Answers a dashboard question offline with the role's FAQ table.
pub fn run(role: &str, question: &str) -> CommandResult {
    let role = match role.parse::<DashboardRole>() {
        Ok(role) => role,
        Err(message) => return CommandResult::failure("ask", "invalid_role", message, 2),
    };
    let assistant = FaqAssistant::for_role(role);

    if question.trim().is_empty() {
        return CommandResult::success_with_data(
            "ask",
            assistant.welcome(),
            Some(json!({
                "role": role,
                "suggestions": assistant.suggested_questions(),
                "featured": assistant.featured_questions(),
            })),
        );
    }

    let answer = assistant.answer(question);
    let suggestions = assistant.suggest(question);

    CommandResult::success_with_data(
        "ask",
        answer.text.clone(),
        Some(json!({
            "role": role,
            "kind": answer.kind,
            "answer": answer.text,
            "suggestions": suggestions,
        })),
    )
}
