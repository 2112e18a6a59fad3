//! Reply text rendering and the TwiML response envelope.

use aide_core::{
    dates::format_due_at,
    model::{Note, Reminder},
};

/// Content type of every webhook response.
pub const ENVELOPE_CONTENT_TYPE: &str = "application/xml";

/// Reply used whenever the pipeline fails in a way the user cannot fix.
pub const GENERIC_ERROR: &str =
    "⚠️ Something went wrong while handling your message. Please try again.";

/// Reply used when the conversational fallback itself fails.
pub const FALLBACK_APOLOGY: &str =
    "🤔 Sorry, I couldn't come up with an answer right now. Please try again in a moment.";

pub const UPDATE_UNSUPPORTED: &str = "🚧 Updating reminders is not supported yet.";
pub const DELETE_UNSUPPORTED: &str = "🚧 Deleting reminders is not supported yet.";

pub fn note_saved(content: &str) -> String {
    format!("✅ Note saved: {content}")
}

pub fn reminder_saved(reminder: &Reminder) -> String {
    format!(
        "⏰ Reminder saved: {} on {}",
        reminder.task,
        format_due_at(reminder.due_at)
    )
}

/// Text pushed to the owner when a reminder falls due.
pub fn reminder_notification(task: &str) -> String {
    format!("🔔 Reminder: {task}")
}

pub fn notes_list(notes: &[Note]) -> String {
    if notes.is_empty() {
        return "📭 You have no saved notes.".to_string();
    }
    let mut out = String::from("📝 Saved notes:");
    for note in notes {
        out.push_str("\n- ");
        out.push_str(&note.content);
    }
    out
}

pub fn reminders_list(reminders: &[Reminder]) -> String {
    if reminders.is_empty() {
        return "📭 You have no reminders.".to_string();
    }
    let mut out = String::from("⏰ Your reminders:");
    for r in reminders {
        out.push_str(&format!(
            "\n- [{}] {} at {}",
            r.short_id(),
            r.task,
            format_due_at(r.due_at)
        ));
        if r.delivered {
            out.push_str(" (sent)");
        }
    }
    out
}

pub fn help() -> String {
    "👋 I'm your personal assistant. Just write naturally:\n\
     - \"Remind me to call mom tomorrow at 10am\"\n\
     - \"Note: buy milk\"\n\
     - \"Show my notes\" or \"What are my reminders?\"\n\n\
     Commands:\n\
     /notes: list saved notes\n\
     /reminders: list your reminders\n\
     /help: show this message\n\n\
     Atajos: \"Apunta <nota>\", \"Listar notas\", \"Listar recordatorios\", \"Ayuda\""
        .to_string()
}

/// Escape text for inclusion in XML character data.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap a reply in the TwiML messaging response.
pub fn render_envelope(reply: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        escape_markup(reply)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reminder(task: &str, delivered: bool) -> Reminder {
        Reminder {
            id: "0123456789abcdef".into(),
            task: task.into(),
            due_at: NaiveDate::from_ymd_opt(2025, 3, 10)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            owner: "whatsapp:+15550001111".into(),
            delivered,
        }
    }

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape_markup(r#"Tom & Jerry <3 "quotes" 'single'"#),
            "Tom &amp; Jerry &lt;3 &quot;quotes&quot; &apos;single&apos;"
        );
        assert_eq!(escape_markup("mañana 🔔"), "mañana 🔔");
    }

    #[test]
    fn test_render_envelope() {
        assert_eq!(
            render_envelope("a < b"),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>a &lt; b</Message></Response>"
        );
    }

    #[test]
    fn test_notes_list() {
        assert_eq!(notes_list(&[]), "📭 You have no saved notes.");
        let notes = vec![
            Note {
                id: "1".into(),
                owner: "a".into(),
                content: "buy milk".into(),
                created_at: "2025-03-09 10:00:00".into(),
            },
            Note {
                id: "2".into(),
                owner: "b".into(),
                content: "call the plumber".into(),
                created_at: "2025-03-09 10:01:00".into(),
            },
        ];
        assert_eq!(
            notes_list(&notes),
            "📝 Saved notes:\n- buy milk\n- call the plumber"
        );
    }

    #[test]
    fn test_reminders_list() {
        assert_eq!(reminders_list(&[]), "📭 You have no reminders.");
        let listed = reminders_list(&[reminder("call mom", false), reminder("pay rent", true)]);
        assert_eq!(
            listed,
            "⏰ Your reminders:\n\
             - [01234567] call mom at 2025-03-10 10:00\n\
             - [01234567] pay rent at 2025-03-10 10:00 (sent)"
        );
    }

    #[test]
    fn test_reminder_saved_and_notification() {
        assert_eq!(
            reminder_saved(&reminder("call mom", false)),
            "⏰ Reminder saved: call mom on 2025-03-10 10:00"
        );
        assert_eq!(reminder_notification("call mom"), "🔔 Reminder: call mom");
        assert_eq!(note_saved("buy milk"), "✅ Note saved: buy milk");
    }

    #[test]
    fn test_help_lists_commands() {
        let text = help();
        assert!(text.contains("/notes"));
        assert!(text.contains("/reminders"));
        assert!(text.contains("/help"));
        assert!(text.contains("Apunta <nota>"));
    }
}
