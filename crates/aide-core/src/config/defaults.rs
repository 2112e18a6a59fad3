//! Default values for configuration fields not present in the environment.

pub fn default_db_url() -> String {
    "sqlite:~/.aide/data/assistant.db".to_string()
}

pub fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

pub fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

pub fn default_timeout_secs() -> u64 {
    20
}

pub fn default_twilio_base_url() -> String {
    "https://api.twilio.com".to_string()
}

pub fn default_twilio_from() -> String {
    "whatsapp:+14155238886".to_string()
}

pub fn default_api_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_api_port() -> u16 {
    3000
}

pub fn default_poll_interval() -> u64 {
    60
}
