//! Result-stream consumption.
//!
//! The orchestrator streams [`AgentResult`]s in completion order; this
//! module folds them into per-section state and decides what the SSE
//! handler sends. Each absorbed result yields zero or more section events,
//! already rendered to HTML.
//!
//! Key properties:
//! - records are scrubbed before dedup-keying, so noisy duplicates collapse
//! - a section is re-sent in full only when a merge added at least one new
//!   record; duplicate-only arrivals stream nothing
//! - scripture arrivals re-render the whole scriptures section with all
//!   three categories, whichever category just grew
//! - agent failures surface as `server-error` events, except the summary,
//!   which fails silently because the answer sections already streamed

use crate::agent::types::{
    AgentResult, QuotesPayload, ScripturesPayload, StructuredQuote, StructuredScripture,
    SummaryPayload, LEADERS_AGENT, PRESIDENTS_AGENT, SCRIPTURES_BIBLE, SCRIPTURES_BOM,
    SCRIPTURES_OTHER, SUMMARY_AGENT,
};
use crate::headshots::{is_valid_headshot_url, lookup_headshot};
use crate::render::{self, SpeakerCard};

use super::{
    extract_first_object, merge_unique_quotes, merge_unique_scriptures, sanitize_quote,
    sanitize_scripture, sort_presidents_quotes,
};

/// One SSE event ready to send: the event name and its HTML data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionEvent {
    pub name: &'static str,
    pub html: String,
}

impl SectionEvent {
    fn section(name: &'static str, html: String) -> Self {
        Self { name, html }
    }

    fn error(message: String) -> Self {
        Self {
            name: "server-error",
            html: render::error_notice(&message),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// SectionTracker — per-stream accumulation
// ═══════════════════════════════════════════════════════════

/// Accumulates section state for one question stream.
pub struct SectionTracker {
    assets_base_url: String,
    presidents: Vec<StructuredQuote>,
    leaders: Vec<StructuredQuote>,
    bible: Vec<StructuredScripture>,
    book_of_mormon: Vec<StructuredScripture>,
    other: Vec<StructuredScripture>,
}

impl SectionTracker {
    pub fn new(assets_base_url: &str) -> Self {
        Self {
            assets_base_url: assets_base_url.to_string(),
            presidents: Vec::new(),
            leaders: Vec::new(),
            bible: Vec::new(),
            book_of_mormon: Vec::new(),
            other: Vec::new(),
        }
    }

    /// Fold one agent result into section state and return the events it
    /// produces, in send order.
    pub fn absorb(&mut self, result: &AgentResult) -> Vec<SectionEvent> {
        if let Some(error) = &result.error {
            if result.agent == SUMMARY_AGENT {
                tracing::warn!(error = %error, "summary generation failed");
                return Vec::new();
            }
            tracing::warn!(agent = result.agent, error = %error, "agent failed");
            return vec![SectionEvent::error(format!(
                "Agent {} failed: {}",
                result.agent, error
            ))];
        }

        if result.content.is_empty() {
            tracing::debug!(agent = result.agent, "agent returned empty content");
            return Vec::new();
        }

        match result.agent {
            PRESIDENTS_AGENT => self.absorb_presidents(&result.content),
            LEADERS_AGENT => self.absorb_leaders(&result.content),
            SCRIPTURES_BIBLE | SCRIPTURES_BOM | SCRIPTURES_OTHER => {
                self.absorb_scriptures(result.agent, &result.content)
            }
            SUMMARY_AGENT => self.absorb_summary(&result.content),
            other => {
                tracing::debug!(agent = other, "ignoring content from unknown agent");
                Vec::new()
            }
        }
    }

    fn absorb_presidents(&mut self, content: &str) -> Vec<SectionEvent> {
        let Some(quotes) = parse_quotes(content) else {
            return vec![SectionEvent::error(
                "Presidents section returned malformed JSON".to_string(),
            )];
        };
        let cleaned: Vec<StructuredQuote> = quotes.into_iter().map(sanitize_quote).collect();
        if merge_unique_quotes(&mut self.presidents, cleaned) == 0 {
            return Vec::new();
        }
        let mut ordered = self.presidents.clone();
        sort_presidents_quotes(&mut ordered);
        let cards = self.speaker_cards(&ordered);
        vec![SectionEvent::section(
            "presidents",
            render::presidents_section(&cards),
        )]
    }

    fn absorb_leaders(&mut self, content: &str) -> Vec<SectionEvent> {
        let Some(quotes) = parse_quotes(content) else {
            return vec![SectionEvent::error(
                "Leaders section returned malformed JSON".to_string(),
            )];
        };
        let cleaned: Vec<StructuredQuote> = quotes.into_iter().map(sanitize_quote).collect();
        if merge_unique_quotes(&mut self.leaders, cleaned) == 0 {
            return Vec::new();
        }
        let cards = self.speaker_cards(&self.leaders);
        vec![SectionEvent::section(
            "leaders",
            render::leaders_section(&cards),
        )]
    }

    fn absorb_scriptures(&mut self, agent: &str, content: &str) -> Vec<SectionEvent> {
        let Some(scriptures) = parse_scriptures(content) else {
            return vec![SectionEvent::error(
                "Scripture section returned malformed JSON".to_string(),
            )];
        };
        let cleaned: Vec<StructuredScripture> =
            scriptures.into_iter().map(sanitize_scripture).collect();
        let category = match agent {
            SCRIPTURES_BIBLE => &mut self.bible,
            SCRIPTURES_BOM => &mut self.book_of_mormon,
            _ => &mut self.other,
        };
        if merge_unique_scriptures(category, cleaned) == 0 {
            return Vec::new();
        }
        vec![SectionEvent::section(
            "scriptures",
            render::scriptures_section(&self.bible, &self.book_of_mormon, &self.other),
        )]
    }

    fn absorb_summary(&mut self, content: &str) -> Vec<SectionEvent> {
        let Some(paragraphs) = parse_summary(content) else {
            tracing::warn!("summary payload did not parse, section skipped");
            return Vec::new();
        };
        if paragraphs.is_empty() {
            return Vec::new();
        }
        vec![SectionEvent::section(
            "summary",
            render::summary_section(&paragraphs),
        )]
    }

    /// Resolve headshots and shape quotes for the card renderer. The curated
    /// table wins; a model-supplied URL is used only when it points at the
    /// trusted asset host.
    fn speaker_cards(&self, quotes: &[StructuredQuote]) -> Vec<SpeakerCard> {
        let allowed_prefix = format!("{}/headshots/", self.assets_base_url);
        quotes
            .iter()
            .map(|quote| {
                let headshot = lookup_headshot(&self.assets_base_url, &quote.speaker)
                    .or_else(|| {
                        is_valid_headshot_url(&quote.headshot, &allowed_prefix)
                            .then(|| quote.headshot.clone())
                    })
                    .unwrap_or_default();
                SpeakerCard {
                    name: quote.speaker.clone(),
                    talk_title: quote.title.clone(),
                    conference: quote.conference.clone(),
                    quote: quote.quote.clone(),
                    headshot,
                }
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════
// Payload parsing
// ═══════════════════════════════════════════════════════════

fn parse_quotes(content: &str) -> Option<Vec<StructuredQuote>> {
    let raw = extract_first_object(content)?;
    match serde_json::from_str::<QuotesPayload>(raw) {
        Ok(payload) => Some(payload.quotes),
        Err(error) => {
            tracing::debug!(%error, "quotes payload did not parse");
            None
        }
    }
}

fn parse_scriptures(content: &str) -> Option<Vec<StructuredScripture>> {
    let raw = extract_first_object(content)?;
    match serde_json::from_str::<ScripturesPayload>(raw) {
        Ok(payload) => Some(payload.scriptures),
        Err(error) => {
            tracing::debug!(%error, "scriptures payload did not parse");
            None
        }
    }
}

fn parse_summary(content: &str) -> Option<Vec<String>> {
    let raw = extract_first_object(content)?;
    match serde_json::from_str::<SummaryPayload>(raw) {
        Ok(payload) => Some(payload.summary),
        Err(error) => {
            tracing::debug!(%error, "summary payload did not parse");
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentError;

    const ASSETS: &str = "https://storage.example.com/kiosk-assets";

    fn tracker() -> SectionTracker {
        SectionTracker::new(ASSETS)
    }

    fn quotes_content(speaker: &str, title: &str) -> String {
        format!(
            r#"{{"quotes":[{{"speaker":"{speaker}","title":"{title}","conference":"October 2023","quote":"A memorable teaching from {speaker}.","headshot":""}}]}}"#
        )
    }

    fn scriptures_content(reference: &str) -> String {
        format!(
            r#"{{"scriptures":[{{"volume":"Book of Mormon","reference":"{reference}","text":"The verse at {reference}."}}]}}"#
        )
    }

    // ── Failure handling ──

    #[test]
    fn agent_failure_becomes_server_error_event() {
        let mut tracker = tracker();
        let events = tracker.absorb(&AgentResult::failed(
            PRESIDENTS_AGENT,
            AgentError::Format("empty or recitation output".to_string()),
        ));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "server-error");
        assert!(events[0]
            .html
            .contains("Agent presidents_agent failed: format failed: empty or recitation output"));
    }

    #[test]
    fn summary_failure_streams_nothing() {
        let mut tracker = tracker();
        let events = tracker.absorb(&AgentResult::failed(
            SUMMARY_AGENT,
            AgentError::Format("timed out".to_string()),
        ));
        assert!(events.is_empty());
    }

    #[test]
    fn empty_content_streams_nothing() {
        let mut tracker = tracker();
        let events = tracker.absorb(&AgentResult::ok(LEADERS_AGENT, String::new()));
        assert!(events.is_empty());
    }

    #[test]
    fn malformed_presidents_payload_reports_malformed_json() {
        let mut tracker = tracker();
        let events = tracker.absorb(&AgentResult::ok(
            PRESIDENTS_AGENT,
            "no json here".to_string(),
        ));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "server-error");
        assert!(events[0]
            .html
            .contains("Presidents section returned malformed JSON"));
    }

    #[test]
    fn malformed_scripture_payload_reports_malformed_json() {
        let mut tracker = tracker();
        let events = tracker.absorb(&AgentResult::ok(
            SCRIPTURES_BOM,
            r#"{"scriptures": "not an array"}"#.to_string(),
        ));
        assert_eq!(events.len(), 1);
        assert!(events[0]
            .html
            .contains("Scripture section returned malformed JSON"));
    }

    #[test]
    fn unknown_agent_content_is_ignored() {
        let mut tracker = tracker();
        let events = tracker.absorb(&AgentResult::ok("mystery_agent", "{}".to_string()));
        assert!(events.is_empty());
    }

    // ── Section accumulation ──

    #[test]
    fn first_presidents_result_renders_the_section() {
        let mut tracker = tracker();
        let events = tracker.absorb(&AgentResult::ok(
            PRESIDENTS_AGENT,
            quotes_content("Russell M. Nelson", "Think Celestial!"),
        ));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "presidents");
        assert!(events[0].html.contains("Russell M. Nelson"));
        assert!(events[0].html.contains("Think Celestial!"));
    }

    #[test]
    fn duplicate_arrival_does_not_re_emit() {
        let mut tracker = tracker();
        let content = quotes_content("Russell M. Nelson", "Think Celestial!");
        let first = tracker.absorb(&AgentResult::ok(PRESIDENTS_AGENT, content.clone()));
        assert_eq!(first.len(), 1);
        let second = tracker.absorb(&AgentResult::ok(PRESIDENTS_AGENT, content));
        assert!(second.is_empty());
    }

    #[test]
    fn noisy_duplicate_collapses_with_clean_copy() {
        let mut tracker = tracker();
        tracker.absorb(&AgentResult::ok(
            PRESIDENTS_AGENT,
            r#"{"quotes":[{"speaker":"Russell M. Nelson","title":"Peacemakers Needed","conference":"April 2023","quote":"Contention drives away the Spirit."}]}"#.to_string(),
        ));
        let noisy = tracker.absorb(&AgentResult::ok(
            PRESIDENTS_AGENT,
            r#"{"quotes":[{"speaker":"Speaker: Russell M. Nelson","title":"Title: Peacemakers Needed","conference":"Conference: April 2023","quote":"Quote: Contention drives away the Spirit."}]}"#.to_string(),
        ));
        assert!(noisy.is_empty());
    }

    #[test]
    fn later_arrival_re_renders_the_grown_section() {
        let mut tracker = tracker();
        tracker.absorb(&AgentResult::ok(
            PRESIDENTS_AGENT,
            quotes_content("Russell M. Nelson", "Think Celestial!"),
        ));
        let events = tracker.absorb(&AgentResult::ok(
            PRESIDENTS_AGENT,
            quotes_content("Dallin H. Oaks", "Truth and the Plan"),
        ));
        assert_eq!(events.len(), 1);
        assert!(events[0].html.contains("Russell M. Nelson"));
        assert!(events[0].html.contains("Dallin H. Oaks"));
    }

    #[test]
    fn presidents_section_renders_oaks_first() {
        let mut tracker = tracker();
        tracker.absorb(&AgentResult::ok(
            PRESIDENTS_AGENT,
            quotes_content("Russell M. Nelson", "Think Celestial!"),
        ));
        let events = tracker.absorb(&AgentResult::ok(
            PRESIDENTS_AGENT,
            quotes_content("Dallin H. Oaks", "Truth and the Plan"),
        ));
        let html = &events[0].html;
        let oaks = html.find("Dallin H. Oaks").expect("oaks rendered");
        let nelson = html.find("Russell M. Nelson").expect("nelson rendered");
        assert!(oaks < nelson);
    }

    #[test]
    fn scripture_arrivals_render_all_three_categories() {
        let mut tracker = tracker();
        tracker.absorb(&AgentResult::ok(
            SCRIPTURES_BIBLE,
            r#"{"scriptures":[{"volume":"New Testament","reference":"Hebrews 11:1","text":"Faith is the substance of things hoped for."}]}"#.to_string(),
        ));
        let events = tracker.absorb(&AgentResult::ok(
            SCRIPTURES_BOM,
            scriptures_content("Alma 32:21"),
        ));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "scriptures");
        assert!(events[0].html.contains("Hebrews 11:1"));
        assert!(events[0].html.contains("Alma 32:21"));
    }

    #[test]
    fn summary_renders_paragraphs() {
        let mut tracker = tracker();
        let events = tracker.absorb(&AgentResult::ok(
            SUMMARY_AGENT,
            r#"{"summary":["The prophets teach faith in Jesus Christ.","The scriptures bear the same witness."]}"#
                .to_string(),
        ));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "summary");
        assert!(events[0].html.contains("The prophets teach faith"));
    }

    #[test]
    fn malformed_summary_is_skipped_quietly() {
        let mut tracker = tracker();
        let events = tracker.absorb(&AgentResult::ok(
            SUMMARY_AGENT,
            "nothing structured".to_string(),
        ));
        assert!(events.is_empty());
    }

    // ── Headshot resolution ──

    #[test]
    fn known_speaker_gets_table_headshot() {
        let mut tracker = tracker();
        let events = tracker.absorb(&AgentResult::ok(
            PRESIDENTS_AGENT,
            quotes_content("Russell M. Nelson", "Think Celestial!"),
        ));
        assert!(events[0]
            .html
            .contains(&format!("{ASSETS}/headshots/russell-nelson-square.webp")));
    }

    #[test]
    fn unknown_speaker_keeps_model_headshot_only_from_trusted_host() {
        let mut tracker = tracker();
        let trusted = format!("{ASSETS}/headshots/guest-speaker-square.webp");
        let events = tracker.absorb(&AgentResult::ok(
            LEADERS_AGENT,
            format!(
                r#"{{"quotes":[{{"speaker":"Guest Speaker","title":"A Talk","conference":"October 2023","quote":"A guest thought worth keeping.","headshot":"{trusted}"}}]}}"#
            ),
        ));
        assert!(events[0].html.contains(&trusted));

        let untrusted = tracker.absorb(&AgentResult::ok(
            LEADERS_AGENT,
            r#"{"quotes":[{"speaker":"Another Guest","title":"Another Talk","conference":"October 2023","quote":"Another guest thought.","headshot":"https://evil.example.com/x.webp"}]}"#
                .to_string(),
        ));
        assert!(!untrusted[0].html.contains("evil.example.com"));
    }
}
