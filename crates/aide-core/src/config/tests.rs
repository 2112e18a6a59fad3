use super::*;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults_when_environment_empty() {
    let cfg = Config::from_lookup(|_| None).unwrap();
    assert_eq!(cfg.memory.db_url, "sqlite:~/.aide/data/assistant.db");
    assert_eq!(cfg.provider.base_url, "https://api.openai.com/v1");
    assert_eq!(cfg.provider.model, "gpt-4o");
    assert_eq!(cfg.provider.timeout_secs, 20);
    assert_eq!(cfg.channel.from, "whatsapp:+14155238886");
    assert_eq!(cfg.api.port, 3000);
    assert_eq!(cfg.scheduler.poll_interval_secs, 60);
    assert_eq!(cfg.scheduler.delivery_match, DeliveryMatch::Exact);
    assert!(cfg.log_dir.is_none());
}

#[test]
fn test_values_from_environment() {
    let cfg = Config::from_lookup(lookup_from(&[
        ("DATABASE_URL", "sqlite:/tmp/aide.db"),
        ("OPENAI_API_KEY", "sk-test"),
        ("OPENAI_MODEL", "gpt-4o-mini"),
        ("AIDE_ORACLE_TIMEOUT_SECS", "5"),
        ("TWILIO_SID", "AC123"),
        ("TWILIO_TOKEN", "secret"),
        ("AIDE_PORT", "8080"),
        ("AIDE_POLL_SECS", "30"),
        ("AIDE_DISPATCH_MATCH", "catch-up"),
    ]))
    .unwrap();
    assert_eq!(cfg.memory.db_url, "sqlite:/tmp/aide.db");
    assert_eq!(cfg.provider.api_key, "sk-test");
    assert_eq!(cfg.provider.model, "gpt-4o-mini");
    assert_eq!(cfg.provider.timeout_secs, 5);
    assert_eq!(cfg.channel.account_sid, "AC123");
    assert_eq!(cfg.api.port, 8080);
    assert_eq!(cfg.scheduler.poll_interval_secs, 30);
    assert_eq!(cfg.scheduler.delivery_match, DeliveryMatch::CatchUp);
    assert!(cfg.require_provider().is_ok());
    assert!(cfg.require_channel().is_ok());
}

#[test]
fn test_empty_values_count_as_unset() {
    let cfg = Config::from_lookup(lookup_from(&[("OPENAI_MODEL", "  "), ("AIDE_PORT", "")]))
        .unwrap();
    assert_eq!(cfg.provider.model, "gpt-4o");
    assert_eq!(cfg.api.port, 3000);
}

#[test]
fn test_invalid_numbers_are_config_errors() {
    let err = Config::from_lookup(lookup_from(&[("AIDE_PORT", "eighty")])).unwrap_err();
    assert!(matches!(err, AideError::Config(_)));
    assert!(err.to_string().contains("AIDE_PORT"));

    let err = Config::from_lookup(lookup_from(&[("AIDE_POLL_SECS", "0")])).unwrap_err();
    assert!(err.to_string().contains("greater than zero"));
}

#[test]
fn test_invalid_delivery_match() {
    let err = Config::from_lookup(lookup_from(&[("AIDE_DISPATCH_MATCH", "whenever")]))
        .unwrap_err();
    assert!(err.to_string().contains("AIDE_DISPATCH_MATCH"));
}

#[test]
fn test_missing_credentials() {
    let cfg = Config::from_lookup(|_| None).unwrap();
    assert!(cfg.require_provider().is_err());
    let err = cfg.require_channel().unwrap_err().to_string();
    assert!(err.contains("TWILIO_SID"));
    assert!(err.contains("TWILIO_TOKEN"));
}

#[test]
fn test_shellexpand_home() {
    let home = std::env::var("HOME").unwrap_or_default();
    if !home.is_empty() {
        assert_eq!(shellexpand("~/x/y.db"), format!("{home}/x/y.db"));
    }
    assert_eq!(shellexpand("/abs/path.db"), "/abs/path.db");
}

#[test]
fn test_prompts_fill_dates() {
    let prompts = Prompts::default();
    let extraction = prompts.extraction_with("Today is 2025-03-09 (Sunday).");
    assert!(extraction.contains("Today is 2025-03-09"));
    assert!(extraction.contains(NO_REMINDER));
    assert!(extraction.contains("YYYY-MM-DD HH:MM"));
    assert!(!extraction.contains(DATES_PLACEHOLDER));

    let routing = prompts.routing_with("Today is 2025-03-09 (Sunday).");
    for action in [
        "save_note",
        "list_notes",
        "list_reminders",
        "update_reminder",
        "delete_reminder",
        "\"none\"",
    ] {
        assert!(routing.contains(action), "routing prompt should list {action}");
    }
    assert!(!routing.contains(DATES_PLACEHOLDER));
}
