//! Question classification ahead of any model call.
//!
//! Defense in depth: the generation backend performs its own safety pass,
//! but these patterns run first, cost nothing, and catch the traffic a
//! public kiosk actually sees. Inappropriate outranks controversial when
//! both match.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Safety classification of a visitor question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClassification {
    /// Safe to process.
    Safe,
    /// Redirect to an in-person conversation.
    Controversial,
    /// Block outright.
    Inappropriate,
}

/// Topics that deserve a conversation rather than a kiosk answer.
static CONTROVERSIAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Historical and doctrinal flashpoints
        r"(?i)polygamy|plural.?marriage|multiple.?wives",
        r"(?i)mountain.?meadows",
        r"(?i)book.?of.?abraham.*papyrus|papyri",
        r"(?i)seer.?stone|hat.*translation",
        r"(?i)first.?vision.*versions?",
        r"(?i)blacks?.*priesthood|priesthood.*ban",
        r"(?i)masonic|freemasonry",
        // Political topics
        r"(?i)democrat|republican|trump|biden|politic",
        r"(?i)abortion|pro.?life|pro.?choice",
        r"(?i)gun.?control|second.?amendment",
        r"(?i)immigration.?policy|border.?wall",
        r"(?i)climate.?change.?hoax|global.?warming.?fake",
        // LGBTQ+ topics, better served by the missionaries in person
        r"(?i)gay.?marriage|same.?sex|homosexual|lgbtq|transgender",
        // Hostile framing
        r"(?i)cult|brainwash|false.?prophet",
        r"(?i)cesletter|ces.?letter|mormonthink",
        r"(?i)exmormon|ex.?mormon|left.?the.?church",
        // Financial
        r"(?i)church.?wealth|100.?billion|tithing.?fraud",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

/// Content blocked outright.
static INAPPROPRIATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)fuck|shit|damn|ass|bitch|bastard",
        r"(?i)porn|xxx|nude|naked|sex",
        r"(?i)kill|murder|violence|attack",
        r"(?i)hack|exploit|jailbreak|bypass",
        r"(?i)drug|cocaine|heroin|meth",
        // Violence and harm
        r"(?i)\b(harm|hurt|injure|wound|maim)\b",
        r"(?i)\b(how\s+to|ways?\s+to)\s+(harm|hurt|kill|attack|injure)",
        r"(?i)\b(weapon|bomb|gun|knife|poison)\b",
        // Self-harm
        r"(?i)\b(suicide|self[- ]?harm|cut\s+myself|end\s+my\s+life)\b",
        // Illegal activity
        r"(?i)\b(how\s+to\s+(steal|hack|break\s+into|get\s+drugs))\b",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("invalid safety pattern")
}

/// Classifies a question. Inappropriate is checked first so a question that
/// trips both lists is blocked rather than redirected.
pub fn classify_content(input: &str) -> ContentClassification {
    if INAPPROPRIATE_PATTERNS.iter().any(|re| re.is_match(input)) {
        return ContentClassification::Inappropriate;
    }
    if CONTROVERSIAL_PATTERNS.iter().any(|re| re.is_match(input)) {
        return ContentClassification::Controversial;
    }
    ContentClassification::Safe
}

// ═══════════════════════════════════════════════════════════
// Redirects
// ═══════════════════════════════════════════════════════════

/// Message and replacement prompts shown instead of an answer.
#[derive(Debug, Clone, Serialize)]
pub struct RedirectResponse {
    pub message: String,
    pub suggested_questions: Vec<String>,
}

/// Questions the kiosk offers as alternatives.
pub const SUGGESTED_QUESTIONS: &[&str] = &[
    "Does God really exist?",
    "What is the purpose of life?",
    "Where can I find peace and joy?",
    "Why do bad things happen to good people?",
    "What happens after I die?",
    "How can families be together forever?",
    "Who is Jesus Christ?",
    "What is faith?",
];

/// Builds the redirect for a non-safe classification.
pub fn redirect_response(classification: ContentClassification) -> RedirectResponse {
    let message = if classification == ContentClassification::Inappropriate {
        "I'd love to help you with questions about the gospel and teachings of Jesus Christ. \
         Let me suggest some meaningful topics we could explore together."
            .to_string()
    } else {
        "That's an interesting question that deserves a thoughtful conversation. \
         The missionaries here at the conference center would love to explore it with you in greater depth. \
         Please reach out to them to discuss this topic further."
            .to_string()
    };

    RedirectResponse {
        message,
        suggested_questions: SUGGESTED_QUESTIONS.iter().map(|q| q.to_string()).collect(),
    }
}
