//! Fixed copy shown by the chat widget

/// Id of the greeting message that always opens the transcript
pub const GREETING_ID: &str = "greeting";

/// Shown when the backend answered without a usable `response` field
pub const EMPTY_REPLY_FALLBACK: &str = "Sorry, I couldn't process that.";

/// Shown when the backend could not be reached or answered with garbage
pub const CONNECTIVITY_FALLBACK: &str = "I'm having trouble connecting right now. Please make sure the backend server is running and try again.";

pub const DEFAULT_OWNER_NAME: &str = "Soumaditya";

pub fn default_greeting(owner: &str) -> String {
    format!(
        "Hey there! 👋 I'm {}'s AI assistant. Ask me anything about his skills, projects, experience, or background!",
        owner
    )
}

pub fn default_suggested_questions(owner: &str) -> Vec<String> {
    vec![
        format!("What projects has {} built?", owner),
        "What are his technical skills?".to_string(),
        "Tell me about his experience".to_string(),
    ]
}

/// Input placeholder for the composer line
pub fn input_placeholder(owner: &str) -> String {
    format!("Ask about {}...", owner)
}
