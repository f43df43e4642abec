//! Cross-agent record merging.
//!
//! Three presidents tasks, six leaders tasks, and three scripture tasks all
//! search overlapping corpora, so the same record routinely arrives more
//! than once. Sections accumulate across arrivals, keeping the first copy of
//! each record and preserving arrival order for everything new.

use std::collections::HashSet;

use crate::agent::types::{StructuredQuote, StructuredScripture};

/// Append records from `incoming` that are not already in `existing`,
/// preserving order within both lists. Returns how many records were added,
/// which is zero when the arrival was entirely duplicates.
pub fn merge_unique_quotes(
    existing: &mut Vec<StructuredQuote>,
    incoming: Vec<StructuredQuote>,
) -> usize {
    let mut seen: HashSet<String> = existing.iter().map(quote_key).collect();
    let mut added = 0;
    for quote in incoming {
        if seen.insert(quote_key(&quote)) {
            existing.push(quote);
            added += 1;
        }
    }
    added
}

/// Scripture counterpart of [`merge_unique_quotes`].
pub fn merge_unique_scriptures(
    existing: &mut Vec<StructuredScripture>,
    incoming: Vec<StructuredScripture>,
) -> usize {
    let mut seen: HashSet<String> = existing.iter().map(scripture_key).collect();
    let mut added = 0;
    for scripture in incoming {
        if seen.insert(scripture_key(&scripture)) {
            existing.push(scripture);
            added += 1;
        }
    }
    added
}

/// Stable-sort quotes so President Oaks leads the presidents section.
/// Everything else keeps its arrival order.
pub fn sort_presidents_quotes(quotes: &mut [StructuredQuote]) {
    quotes.sort_by_key(|q| if is_oaks_speaker(&q.speaker) { 0u8 } else { 1 });
}

fn quote_key(quote: &StructuredQuote) -> String {
    format!(
        "{}|{}|{}|{}",
        quote.speaker, quote.title, quote.conference, quote.quote
    )
}

fn scripture_key(scripture: &StructuredScripture) -> String {
    format!(
        "{}|{}|{}",
        scripture.volume, scripture.reference, scripture.text
    )
}

fn is_oaks_speaker(name: &str) -> bool {
    let name = name.trim().to_lowercase();
    !name.is_empty() && name.contains("oaks")
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
