//! Built-in commands: instant replies, no oracle call.
//!
//! Besides the slash commands, the quick phrases of the Spanish service are
//! accepted: `Apunta <nota>`, `Listar notas`, `Listar recordatorios`, `Ayuda`.

/// Known built-in commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Notes,
    Reminders,
    /// `Apunta <content>`: save a note verbatim.
    SaveNote(String),
}

impl Command {
    /// Parse a command from message text. Returns `None` for unknown `/` prefixes
    /// (which flow through the normal pipeline).
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let first = text.split_whitespace().next()?;
        let phrase = text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        match first.to_lowercase().as_str() {
            "/help" => return Some(Self::Help),
            "/notes" => return Some(Self::Notes),
            "/reminders" => return Some(Self::Reminders),
            "apunta" | "apunta:" => {
                let content = text[first.len()..].trim_start_matches(':').trim();
                return (!content.is_empty()).then(|| Self::SaveNote(content.to_string()));
            }
            _ => {}
        }

        match phrase.as_str() {
            "ayuda" => Some(Self::Help),
            "listar notas" => Some(Self::Notes),
            "listar recordatorios" => Some(Self::Reminders),
            _ => None,
        }
    }

    /// Label recorded in the audit log.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Help => "command_help",
            Self::Notes => "command_notes",
            Self::Reminders => "command_reminders",
            Self::SaveNote(_) => "command_save_note",
        }
    }
}
