//! Search task topology.
//!
//! Each task is one retrieval call plus one format call, named so the
//! consumer can route its output to a page section. The tables here are the
//! single place the fan-out shape lives; the orchestrator only walks them.
//!
//! Key properties:
//! - Presidents tasks pin their speaker via the tool (slug or dedicated
//!   tool), not via prompt hope.
//! - Two leader tasks share each keyword so one stubborn model call cannot
//!   blank a whole subsection.
//! - Scripture queries append volume hints to steer the shared search index
//!   toward the right canon.

use serde_json::{json, Value};

use super::prompts::*;
use super::types::{
    LeadersKeywords, PresidentsKeywords, ScripturesKeywords, LEADERS_AGENT, PRESIDENTS_AGENT,
    SCRIPTURES_BIBLE, SCRIPTURES_BOM, SCRIPTURES_OTHER,
};

/// One named search-and-format unit.
pub struct SearchTask {
    pub name: &'static str,
    /// Section routing name on the result stream.
    pub agent: &'static str,
    pub keywords: String,
    pub tool: &'static str,
    pub args: Value,
    pub format_prompt: &'static str,
    pub schema: &'static Value,
    pub thinking_level: &'static str,
    /// Attempts for the format call. Only the general presidents task
    /// retries; its tool shares results across two selectors, which makes
    /// recitation stops more likely.
    pub max_attempts: u32,
}

pub fn presidents_tasks(keywords: &PresidentsKeywords) -> Vec<SearchTask> {
    vec![
        SearchTask {
            name: "presidents_oaks",
            agent: PRESIDENTS_AGENT,
            keywords: keywords.presidents_oaks.clone(),
            tool: "search_talks_by_speaker",
            args: json!({"speaker_slug": "dallin-oaks", "limit": 3}),
            format_prompt: PRESIDENTS_OAKS_PROMPT,
            schema: &QUOTES_SCHEMA,
            thinking_level: "low",
            max_attempts: 1,
        },
        SearchTask {
            name: "presidents_nelson",
            agent: PRESIDENTS_AGENT,
            keywords: keywords.presidents_general.clone(),
            tool: "search_talks_by_speaker",
            args: json!({"speaker_slug": "russell-nelson", "limit": 3}),
            format_prompt: PRESIDENTS_NELSON_PROMPT,
            schema: &QUOTES_SCHEMA,
            thinking_level: "low",
            max_attempts: 1,
        },
        SearchTask {
            name: "presidents_general",
            agent: PRESIDENTS_AGENT,
            keywords: keywords.presidents_general.clone(),
            tool: "get_presidents_talks",
            args: json!({"query": keywords.presidents_general, "limit": 3}),
            format_prompt: PRESIDENTS_GENERAL_PROMPT,
            schema: &QUOTES_SCHEMA,
            thinking_level: "low",
            max_attempts: 3,
        },
    ]
}

pub fn leaders_tasks(keywords: &LeadersKeywords) -> Vec<SearchTask> {
    let first_presidency = &keywords.leaders_first_presidency;
    let q12 = &keywords.leaders_q12;
    let other = &keywords.leaders_other;
    vec![
        SearchTask {
            name: "leaders_eyring",
            agent: LEADERS_AGENT,
            keywords: first_presidency.clone(),
            tool: "get_leaders_talks",
            args: json!({"query": first_presidency, "limit": 3}),
            format_prompt: LEADERS_EYRING_PROMPT,
            schema: &QUOTES_SCHEMA,
            thinking_level: "low",
            max_attempts: 1,
        },
        SearchTask {
            name: "leaders_christofferson",
            agent: LEADERS_AGENT,
            keywords: first_presidency.clone(),
            tool: "get_leaders_talks",
            args: json!({"query": first_presidency, "limit": 3}),
            format_prompt: LEADERS_CHRISTOFFERSON_PROMPT,
            schema: &QUOTES_SCHEMA,
            thinking_level: "low",
            max_attempts: 1,
        },
        SearchTask {
            name: "leaders_q12_a",
            agent: LEADERS_AGENT,
            keywords: q12.clone(),
            tool: "get_leaders_talks",
            args: json!({"query": q12, "limit": 3}),
            format_prompt: LEADERS_Q12_PROMPT_A,
            schema: &QUOTES_SCHEMA,
            thinking_level: "low",
            max_attempts: 1,
        },
        SearchTask {
            name: "leaders_q12_b",
            agent: LEADERS_AGENT,
            keywords: q12.clone(),
            tool: "get_leaders_talks",
            args: json!({"query": q12, "limit": 3}),
            format_prompt: LEADERS_Q12_PROMPT_B,
            schema: &QUOTES_SCHEMA,
            thinking_level: "low",
            max_attempts: 1,
        },
        SearchTask {
            name: "leaders_other_a",
            agent: LEADERS_AGENT,
            keywords: other.clone(),
            tool: "search_talks",
            args: json!({"query": other, "limit": 3}),
            format_prompt: LEADERS_OTHER_PROMPT_A,
            schema: &QUOTES_SCHEMA,
            thinking_level: "low",
            max_attempts: 1,
        },
        SearchTask {
            name: "leaders_other_b",
            agent: LEADERS_AGENT,
            keywords: other.clone(),
            tool: "search_talks",
            args: json!({"query": other, "limit": 3}),
            format_prompt: LEADERS_OTHER_PROMPT_B,
            schema: &QUOTES_SCHEMA,
            thinking_level: "low",
            max_attempts: 1,
        },
    ]
}

pub fn scriptures_tasks(keywords: &ScripturesKeywords) -> Vec<SearchTask> {
    let bible_query = format!(
        "{} Bible Old Testament New Testament",
        keywords.scriptures_bible
    );
    let bom_query = format!("{} Book of Mormon", keywords.scriptures_bom);
    let other_query = format!(
        "{} Doctrine and Covenants Pearl of Great Price",
        keywords.scriptures_other
    );
    vec![
        SearchTask {
            name: "scriptures_bible",
            agent: SCRIPTURES_BIBLE,
            keywords: bible_query.clone(),
            tool: "search_scriptures",
            args: json!({"query": bible_query, "limit": 12}),
            format_prompt: SCRIPTURES_BIBLE_PROMPT,
            schema: &SCRIPTURES_CATEGORY_SCHEMA,
            thinking_level: "minimal",
            max_attempts: 1,
        },
        SearchTask {
            name: "scriptures_bom",
            agent: SCRIPTURES_BOM,
            keywords: bom_query.clone(),
            tool: "search_scriptures",
            args: json!({"query": bom_query, "limit": 12}),
            format_prompt: SCRIPTURES_BOM_PROMPT,
            schema: &SCRIPTURES_CATEGORY_SCHEMA,
            thinking_level: "minimal",
            max_attempts: 1,
        },
        SearchTask {
            name: "scriptures_other",
            agent: SCRIPTURES_OTHER,
            keywords: other_query.clone(),
            tool: "search_scriptures",
            args: json!({"query": other_query, "limit": 12}),
            format_prompt: SCRIPTURES_OTHER_PROMPT,
            schema: &SCRIPTURES_CATEGORY_SCHEMA,
            thinking_level: "minimal",
            max_attempts: 1,
        },
    ]
}
