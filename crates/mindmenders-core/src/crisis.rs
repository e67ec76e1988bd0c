//! Keyword heuristics for self-harm language in chat input.
//!
//! Matching is a lowercase substring test, so short keywords such as "die"
//! also hit words like "diet".

/// Phrases that raise the crisis support notice
pub const CRISIS_KEYWORDS: [&str; 6] = [
    "suicide",
    "kill myself",
    "self-harm",
    "end it all",
    "die",
    "cutting",
];

pub const CRISIS_NOTICE_TITLE: &str = "Support is here for you";

pub const CRISIS_NOTICE_BODY: &str = "You matter. Please consider reaching out to a professional. You can call or text 988 in the USA, or contact your local emergency services immediately.";

/// Returns true when `text` contains any crisis keyword, ignoring case
pub fn detect_crisis(text: &str) -> bool {
    let lowered = text.to_lowercase();
    CRISIS_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}
