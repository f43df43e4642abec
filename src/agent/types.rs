//! Shared data shapes for the agent pipeline.
//!
//! Every field carries a serde default so a backend that omits a key yields
//! an empty value instead of a parse failure; downstream merging collapses
//! repeat arrivals by each record's identity fields.

use serde::{Deserialize, Serialize};

use super::AgentError;

// ═══════════════════════════════════════════════════════════
// Agent names
// ═══════════════════════════════════════════════════════════

/// Result-stream name for the presidents fan-out and its orchestration stage.
pub const PRESIDENTS_AGENT: &str = "presidents_agent";
/// Result-stream name for every leaders search task.
pub const LEADERS_AGENT: &str = "leaders_agent";
/// Result-stream names for the three scripture search tasks.
pub const SCRIPTURES_BIBLE: &str = "scriptures_bible";
pub const SCRIPTURES_BOM: &str = "scriptures_bom";
pub const SCRIPTURES_OTHER: &str = "scriptures_other";
/// Result-stream name for the closing summary pass.
pub const SUMMARY_AGENT: &str = "summary_agent";
/// Name attached to orchestration-stage failures on the result stream.
pub const ORCHESTRATOR_AGENT: &str = "orchestrator";

// ═══════════════════════════════════════════════════════════
// Structured payloads
// ═══════════════════════════════════════════════════════════

/// One conference-talk quote selected by a search agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredQuote {
    #[serde(default)]
    pub speaker: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub conference: String,
    #[serde(default)]
    pub quote: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub headshot: String,
}

/// One scripture passage, optionally paired with a talk that cites it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredScripture {
    #[serde(default)]
    pub volume: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_talk: Option<RelatedTalkQuote>,
}

/// Talk excerpt attached to a scripture passage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedTalkQuote {
    #[serde(default)]
    pub speaker: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub quote: String,
}

/// Quote list as emitted by the presidents and leaders format calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuotesPayload {
    #[serde(default)]
    pub quotes: Vec<StructuredQuote>,
}

/// Scripture list as emitted by one scripture format call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScripturesPayload {
    #[serde(default)]
    pub scriptures: Vec<StructuredScripture>,
}

/// Closing summary: a handful of takeaway sentences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryPayload {
    #[serde(default)]
    pub summary: Vec<String>,
}

// ═══════════════════════════════════════════════════════════
// Orchestration responses
// ═══════════════════════════════════════════════════════════

/// Stage-one verdict: safety gate plus presidents search keywords.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresidentsOrchestration {
    #[serde(default)]
    pub safe: bool,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub keywords: PresidentsKeywords,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresidentsKeywords {
    #[serde(default)]
    pub presidents_oaks: String,
    #[serde(default)]
    pub presidents_general: String,
}

/// Keyword assignments for the six leaders search tasks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadersOrchestration {
    #[serde(default)]
    pub keywords: LeadersKeywords,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadersKeywords {
    #[serde(default)]
    pub leaders_first_presidency: String,
    #[serde(default)]
    pub leaders_q12: String,
    #[serde(default)]
    pub leaders_other: String,
}

/// Keyword assignments for the three scripture search tasks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScripturesOrchestration {
    #[serde(default)]
    pub keywords: ScripturesKeywords,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScripturesKeywords {
    #[serde(default)]
    pub scriptures_bible: String,
    #[serde(default)]
    pub scriptures_bom: String,
    #[serde(default)]
    pub scriptures_other: String,
}

// ═══════════════════════════════════════════════════════════
// Result stream
// ═══════════════════════════════════════════════════════════

/// One unit on a run's result stream: an agent name plus either the raw
/// model output or the error that ended that agent.
#[derive(Debug)]
pub struct AgentResult {
    pub agent: &'static str,
    pub content: String,
    pub error: Option<AgentError>,
}

impl AgentResult {
    pub fn ok(agent: &'static str, content: String) -> Self {
        Self {
            agent,
            content,
            error: None,
        }
    }

    pub fn failed(agent: &'static str, error: AgentError) -> Self {
        Self {
            agent,
            content: String::new(),
            error: Some(error),
        }
    }
}
