use crate::dates::DUE_AT_PATTERN;

/// Placeholder replaced with ground-truth date lines.
pub const DATES_PLACEHOLDER: &str = "{dates}";

/// Sentinel the extraction prompt asks for when a message is not a reminder.
pub const NO_REMINDER: &str = "NO_REMINDER";

/// Sentinel the routing prompt accepts when no action applies.
pub const NO_ACTION: &str = "none";

/// Prompt templates for the three oracle calls.
#[derive(Debug, Clone)]
pub struct Prompts {
    /// Reminder extraction. Contains [`DATES_PLACEHOLDER`].
    pub extraction: String,
    /// Action decision. Contains [`DATES_PLACEHOLDER`].
    pub routing: String,
    /// Conversational fallback persona.
    pub conversation: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            extraction: format!(
                "You extract reminders from WhatsApp messages.\n\
                 {DATES_PLACEHOLDER}\n\
                 Use ONLY the dates above to resolve words like \"today\" or \"tomorrow\"; never compute dates yourself.\n\
                 If the message asks to be reminded of something at a date and time, answer with ONLY this JSON object:\n\
                 {{\"task\": \"<what to remember, without the date or time>\", \"due_at\": \"{DUE_AT_PATTERN}\"}}\n\
                 due_at uses 24-hour time. If no time is given, use 09:00.\n\
                 If the message is not a reminder request, answer with exactly: {NO_REMINDER}\n\
                 No explanations, no markdown."
            ),
            routing: format!(
                "You decide which action a WhatsApp message asks for.\n\
                 {DATES_PLACEHOLDER}\n\
                 Answer with exactly one JSON object from this list and no other text:\n\
                 {{\"action\": \"save_note\", \"content\": \"<the note text>\"}}\n\
                 {{\"action\": \"list_notes\"}}\n\
                 {{\"action\": \"list_reminders\"}}\n\
                 {{\"action\": \"update_reminder\", \"id\": \"<reminder id>\", \"new_due_at\": \"{DUE_AT_PATTERN}\"}}\n\
                 {{\"action\": \"delete_reminder\", \"id\": \"<reminder id>\"}}\n\
                 {{\"action\": \"{NO_ACTION}\"}}\n\
                 Use \"{NO_ACTION}\" for greetings, questions, and anything else."
            ),
            conversation: "You are a friendly personal assistant chatting on WhatsApp.\n\
                           You can save notes, list notes, set reminders, and list reminders.\n\
                           Answer briefly, in the same language the user writes in, in plain text."
                .to_string(),
        }
    }
}

impl Prompts {
    /// Extraction prompt with the date lines filled in.
    pub fn extraction_with(&self, dates: &str) -> String {
        self.extraction.replace(DATES_PLACEHOLDER, dates)
    }

    /// Routing prompt with the date lines filled in.
    pub fn routing_with(&self, dates: &str) -> String {
        self.routing.replace(DATES_PLACEHOLDER, dates)
    }
}
