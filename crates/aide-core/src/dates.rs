//! Date normalization for reminder extraction.
//!
//! Models are unreliable at calendar arithmetic, so relative expressions are
//! resolved here against a reference `now` and handed to the oracle as ground
//! truth. The oracle's answer is then parsed with exactly one format,
//! [`DUE_AT_FORMAT`]; no fallbacks.

use chrono::{Days, NaiveDate, NaiveDateTime, Timelike};

/// The only accepted timestamp format for reminder due times.
pub const DUE_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Human-readable form of [`DUE_AT_FORMAT`], used in prompts.
pub const DUE_AT_PATTERN: &str = "YYYY-MM-DD HH:MM";

/// A relative day expression the normalizer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeDay {
    Today,
    Tomorrow,
    DayAfterTomorrow,
}

/// Known spellings, longest first so "day after tomorrow" wins over "tomorrow".
const TERMS: &[(&str, RelativeDay)] = &[
    ("the day after tomorrow", RelativeDay::DayAfterTomorrow),
    ("day after tomorrow", RelativeDay::DayAfterTomorrow),
    ("pasado mañana", RelativeDay::DayAfterTomorrow),
    ("pasado manana", RelativeDay::DayAfterTomorrow),
    ("tomorrow", RelativeDay::Tomorrow),
    ("mañana", RelativeDay::Tomorrow),
    ("manana", RelativeDay::Tomorrow),
    ("today", RelativeDay::Today),
    ("hoy", RelativeDay::Today),
];

/// Words that turn a following "mañana" into "morning" ("por la mañana").
const MORNING_PRECEDERS: &[&str] = &["la", "por", "en", "de"];

impl RelativeDay {
    /// Parse a single relative term (case-insensitive, surrounding whitespace ignored).
    pub fn parse(term: &str) -> Option<Self> {
        let term = term.trim().to_lowercase();
        TERMS
            .iter()
            .find(|(spelling, _)| *spelling == term)
            .map(|(_, day)| *day)
    }

    /// Days to add to the reference date.
    pub fn offset_days(self) -> u64 {
        match self {
            Self::Today => 0,
            Self::Tomorrow => 1,
            Self::DayAfterTomorrow => 2,
        }
    }

    /// Resolve against a reference date.
    pub fn resolve(self, reference: NaiveDate) -> Option<NaiveDate> {
        reference.checked_add_days(Days::new(self.offset_days()))
    }
}

/// A relative term found in a message, with its resolved date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTerm {
    pub term: &'static str,
    pub date: NaiveDate,
}

/// Resolve `relative_term` against `reference_now`.
///
/// Returns `None` for anything unrecognized; callers pass such text to the
/// oracle untouched.
pub fn normalize(reference_now: NaiveDateTime, relative_term: &str) -> Option<NaiveDate> {
    RelativeDay::parse(relative_term)?.resolve(reference_now.date())
}

/// Find every known relative term in `message` and resolve it.
///
/// Matches whole words only. Once a longer phrase matches, its text is masked
/// so the shorter terms it contains ("tomorrow" inside "day after tomorrow")
/// are not reported again. "mañana" after "la", "por", "en" or "de" means
/// morning and is left for the oracle.
pub fn resolve_terms(reference_now: NaiveDateTime, message: &str) -> Vec<ResolvedTerm> {
    let mut haystack = message.to_lowercase();
    let mut found: Vec<ResolvedTerm> = Vec::new();

    for (term, day) in TERMS {
        while let Some(pos) = find_word(&haystack, term) {
            let morning = matches!(*term, "mañana" | "manana")
                && haystack[..pos]
                    .split(|c: char| !c.is_alphanumeric())
                    .rfind(|w| !w.is_empty())
                    .is_some_and(|w| MORNING_PRECEDERS.contains(&w));
            if !morning && !found.iter().any(|f| f.term == *term) {
                if let Some(date) = day.resolve(reference_now.date()) {
                    found.push(ResolvedTerm { term, date });
                }
            }
            haystack.replace_range(pos..pos + term.len(), &" ".repeat(term.len()));
        }
    }

    found
}

/// Ground-truth date lines injected into every oracle prompt.
pub fn ground_truth(reference_now: NaiveDateTime) -> String {
    let today = reference_now.date();
    let mut lines = vec![format!(
        "Current date and time: {} ({}).",
        format_due_at(reference_now),
        today.format("%A")
    )];
    for (label, day) in [
        ("Today", RelativeDay::Today),
        ("Tomorrow", RelativeDay::Tomorrow),
        ("The day after tomorrow", RelativeDay::DayAfterTomorrow),
    ] {
        if let Some(date) = day.resolve(today) {
            lines.push(format!(
                "{label} is {} ({}).",
                date.format("%Y-%m-%d"),
                date.format("%A")
            ));
        }
    }
    lines.join("\n")
}

/// [`ground_truth`] plus the explicit meaning of each relative term in `message`.
pub fn ground_truth_for(reference_now: NaiveDateTime, message: &str) -> String {
    let mut out = ground_truth(reference_now);
    for resolved in resolve_terms(reference_now, message) {
        out.push_str(&format!(
            "\nIn this message, \"{}\" means {}.",
            resolved.term,
            resolved.date.format("%Y-%m-%d")
        ));
    }
    out
}

/// Parse a due time with [`DUE_AT_FORMAT`]. Anything else is `None`.
pub fn parse_due_at(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DUE_AT_FORMAT).ok()
}

/// Format a due time with [`DUE_AT_FORMAT`].
pub fn format_due_at(at: NaiveDateTime) -> String {
    at.format(DUE_AT_FORMAT).to_string()
}

/// Drop seconds and sub-second precision.
pub fn truncate_to_minute(at: NaiveDateTime) -> NaiveDateTime {
    at.date()
        .and_hms_opt(at.hour(), at.minute(), 0)
        .unwrap_or(at)
}

fn find_word(haystack: &str, term: &str) -> Option<usize> {
    haystack.match_indices(term).map(|(pos, _)| pos).find(|&pos| {
        let before = haystack[..pos].chars().next_back();
        let after = haystack[pos + term.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
