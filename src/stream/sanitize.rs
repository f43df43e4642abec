//! Structured-output field scrubbing.
//!
//! Even with a JSON schema attached, the generation model sometimes bleeds
//! one field into another: a quote that carries the whole serialized object,
//! a title with `", "conference": "October 2021` glued to its tail, or
//! values prefixed with their display label (`Speaker: Russell M. Nelson`).
//! These scrubbers recover the intended value with plain string heuristics.
//!
//! Key properties:
//! - runs before records are dedup-keyed or rendered, so a clean and a
//!   noisy copy of the same quote collapse to one entry
//! - embedded `"key":"value"` pairs win over the field's own content, in
//!   both plain and double-escaped (`\\"key\\":\\"`) form
//! - a record that is already clean passes through unchanged

use crate::agent::types::{RelatedTalkQuote, StructuredQuote, StructuredScripture};

// ═══════════════════════════════════════════════════════════
// Record scrubbers
// ═══════════════════════════════════════════════════════════

/// Scrub one talk quote record.
///
/// Embedded JSON pairs are searched across the concatenation of all five
/// fields, so a value that landed in the wrong field is still recovered.
pub fn sanitize_quote(mut quote: StructuredQuote) -> StructuredQuote {
    let raw = [
        quote.speaker.as_str(),
        quote.title.as_str(),
        quote.conference.as_str(),
        quote.quote.as_str(),
        quote.headshot.as_str(),
    ]
    .join(" ");

    if let Some(value) = extract_embedded_json_value(&raw, "speaker") {
        quote.speaker = value;
    }
    if let Some(value) = extract_embedded_json_value(&raw, "title") {
        quote.title = value;
    }
    if let Some(value) = extract_embedded_json_value(&raw, "conference") {
        quote.conference = value;
    }
    if let Some(value) = extract_embedded_json_value(&raw, "quote") {
        quote.quote = value;
    }
    if let Some(value) = extract_embedded_json_value(&raw, "headshot") {
        quote.headshot = value;
    }

    quote.title = trim_at_json_key(&quote.title, &["conference", "quote", "headshot"]);
    quote.conference = trim_at_json_key(&quote.conference, &["quote", "headshot", "title"]);
    quote.headshot = trim_at_json_key(&quote.headshot, &["conference", "quote", "title"]);

    quote.speaker = sanitize_label_prefix(&quote.speaker, "Speaker:");
    quote.title = sanitize_between_labels(
        &quote.title,
        "Title:",
        &["Conference:", "Quote:", "Headshot:"],
    );
    quote.conference =
        sanitize_between_labels(&quote.conference, "Conference:", &["Quote:", "Headshot:"]);
    quote.quote = sanitize_quote_text(&quote.quote);
    quote.headshot = sanitize_label_prefix(&quote.headshot, "Headshot:");
    quote
}

/// Scrub one scripture record. Same heuristics as [`sanitize_quote`], keyed
/// on the scripture field names. The related talk pull-quote only gets the
/// label passes; it is not part of the record's dedup identity.
pub fn sanitize_scripture(mut scripture: StructuredScripture) -> StructuredScripture {
    let raw = [
        scripture.volume.as_str(),
        scripture.reference.as_str(),
        scripture.text.as_str(),
    ]
    .join(" ");

    if let Some(value) = extract_embedded_json_value(&raw, "volume") {
        scripture.volume = value;
    }
    if let Some(value) = extract_embedded_json_value(&raw, "reference") {
        scripture.reference = value;
    }
    if let Some(value) = extract_embedded_json_value(&raw, "text") {
        scripture.text = value;
    }

    scripture.volume = trim_at_json_key(&scripture.volume, &["reference", "text"]);
    scripture.reference = trim_at_json_key(&scripture.reference, &["text", "volume"]);

    scripture.volume = sanitize_label_prefix(&scripture.volume, "Volume:");
    scripture.reference = sanitize_between_labels(&scripture.reference, "Reference:", &["Text:"]);
    scripture.text = sanitize_scripture_text(&scripture.text);

    if let Some(talk) = scripture.related_talk.take() {
        scripture.related_talk = Some(RelatedTalkQuote {
            speaker: sanitize_label_prefix(&talk.speaker, "Speaker:"),
            title: sanitize_label_prefix(&talk.title, "Title:"),
            quote: sanitize_quote_text(&talk.quote),
        });
    }
    scripture
}

// ═══════════════════════════════════════════════════════════
// Field heuristics
// ═══════════════════════════════════════════════════════════

fn sanitize_quote_text(text: &str) -> String {
    let cleaned = text.trim();
    if let Some(extracted) = extract_embedded_json_value(cleaned, "quote") {
        return extracted;
    }
    let mut cleaned = cleaned;
    if let Some(idx) = cleaned.rfind("Quote:") {
        cleaned = &cleaned[idx + "Quote:".len()..];
    }
    if let Some(idx) = cleaned.find("Headshot:") {
        cleaned = &cleaned[..idx];
    }
    cleaned.trim().to_string()
}

fn sanitize_scripture_text(text: &str) -> String {
    let cleaned = text.trim();
    if let Some(extracted) = extract_embedded_json_value(cleaned, "text") {
        return extracted;
    }
    let mut cleaned = cleaned;
    if let Some(idx) = cleaned.rfind("Text:") {
        cleaned = &cleaned[idx + "Text:".len()..];
    }
    cleaned.trim().to_string()
}

fn sanitize_label_prefix(text: &str, label: &str) -> String {
    let cleaned = text.trim();
    match cleaned.strip_prefix(label) {
        Some(rest) => rest.trim().to_string(),
        None => cleaned.to_string(),
    }
}

/// Keep the text after the last occurrence of `primary`, then cut it at the
/// first occurrence of each stop label in turn.
fn sanitize_between_labels(text: &str, primary: &str, stops: &[&str]) -> String {
    let mut cleaned = text.trim();
    if let Some(idx) = cleaned.rfind(primary) {
        cleaned = &cleaned[idx + primary.len()..];
    }
    for stop in stops {
        if let Some(idx) = cleaned.find(stop) {
            cleaned = &cleaned[..idx];
        }
    }
    cleaned.trim().to_string()
}

/// Pull the value of an embedded `"key":"value"` pair out of `text`.
///
/// Tries the plain forms first, then the double-escaped forms produced when
/// a serialized object is serialized again. The last occurrence wins, since
/// bled content trails the field's own text. Escaped values are unescaped
/// before returning.
fn extract_embedded_json_value(text: &str, key: &str) -> Option<String> {
    let patterns = [
        (format!("\"{key}\":\""), false),
        (format!("\"{key}\": \""), false),
        (format!(r#"\\"{key}\\":\\""#), true),
        (format!(r#"\\"{key}\\": \\""#), true),
    ];

    for (start, escaped) in &patterns {
        let Some(idx) = text.rfind(start.as_str()) else {
            continue;
        };
        let rest = &text[idx + start.len()..];

        if *escaped {
            let Some(end) = rest.find(r#"\\""#) else {
                continue;
            };
            let value = rest[..end].replace(r"\\n", "\n").replace(r#"\\""#, "\"");
            return Some(value.trim().to_string());
        }

        // Plain form ends at the first quote not preceded by a backslash.
        let bytes = rest.as_bytes();
        for i in 0..bytes.len() {
            if bytes[i] == b'"' {
                if i > 0 && bytes[i - 1] == b'\\' {
                    continue;
                }
                return Some(rest[..i].trim().to_string());
            }
        }
    }
    None
}

/// Truncate `text` at the first sign of a following JSON key bleeding in,
/// in any of the plain or escaped spellings, then drop one trailing quote.
fn trim_at_json_key(text: &str, keys: &[&str]) -> String {
    let mut cleaned = text.trim().to_string();
    for key in keys {
        let patterns = [
            format!("\", \"{key}\""),
            format!("\", \"{key}\":"),
            format!("\"{key}\":"),
            format!(r#"", \"{key}\""#),
            format!(r#"", \"{key}\":"#),
        ];
        for pattern in &patterns {
            if let Some(idx) = cleaned.find(pattern.as_str()) {
                cleaned.truncate(idx);
                break;
            }
        }
    }
    let cleaned = cleaned.strip_suffix('"').unwrap_or(&cleaned);
    cleaned.trim().to_string()
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(
        speaker: &str,
        title: &str,
        conference: &str,
        text: &str,
        headshot: &str,
    ) -> StructuredQuote {
        StructuredQuote {
            speaker: speaker.to_string(),
            title: title.to_string(),
            conference: conference.to_string(),
            quote: text.to_string(),
            headshot: headshot.to_string(),
        }
    }

    // ── Clean passthrough ──

    #[test]
    fn clean_quote_passes_through_unchanged() {
        let input = quote(
            "Russell M. Nelson",
            "Think Celestial!",
            "October 2023",
            "As you think celestial, you will find yourself avoiding anything that \
             robs you of your agency.",
            "",
        );
        assert_eq!(sanitize_quote(input.clone()), input);
    }

    #[test]
    fn clean_scripture_passes_through_unchanged() {
        let input = StructuredScripture {
            volume: "Book of Mormon".to_string(),
            reference: "Alma 32:21".to_string(),
            text: "Faith is not to have a perfect knowledge of things.".to_string(),
            related_talk: None,
        };
        assert_eq!(sanitize_scripture(input.clone()), input);
    }

    // ── Label noise ──

    #[test]
    fn label_prefixes_are_stripped() {
        let cleaned = sanitize_quote(quote(
            "Speaker: Russell M. Nelson",
            "Title: Peacemakers Needed",
            "Conference: April 2023",
            "Quote: Contention drives away the Spirit.",
            "Headshot: https://cdn.example.com/headshots/russell-nelson-square.webp",
        ));
        assert_eq!(cleaned.speaker, "Russell M. Nelson");
        assert_eq!(cleaned.title, "Peacemakers Needed");
        assert_eq!(cleaned.conference, "April 2023");
        assert_eq!(cleaned.quote, "Contention drives away the Spirit.");
        assert_eq!(
            cleaned.headshot,
            "https://cdn.example.com/headshots/russell-nelson-square.webp"
        );
    }

    #[test]
    fn run_on_labels_in_one_field_are_split_apart() {
        let cleaned = sanitize_quote(quote(
            "Henry B. Eyring",
            "Title: He Goes Before Us Conference: April 2020 Quote: ignored here",
            "Conference: April 2020 Quote: still ignored",
            "Quote: The Lord prepares the way. Headshot: trailing noise",
            "",
        ));
        assert_eq!(cleaned.title, "He Goes Before Us");
        assert_eq!(cleaned.conference, "April 2020");
        assert_eq!(cleaned.quote, "The Lord prepares the way.");
    }

    #[test]
    fn quote_text_keeps_segment_after_last_quote_label() {
        let cleaned = sanitize_quote(quote(
            "Dallin H. Oaks",
            "Truth and the Plan",
            "October 2018",
            "Quote: draft one Quote: Our Father's plan is about truth.",
            "",
        ));
        assert_eq!(cleaned.quote, "Our Father's plan is about truth.");
    }

    // ── Embedded JSON bleed ──

    #[test]
    fn whole_object_in_quote_field_repopulates_every_field() {
        let bled = r#"{"speaker":"Dallin H. Oaks","title":"Trust in the Lord","conference":"October 2019","quote":"We trust in the Lord and lean not unto our own understanding.","headshot":""}"#;
        let cleaned = sanitize_quote(quote("", "", "", bled, ""));
        assert_eq!(cleaned.speaker, "Dallin H. Oaks");
        assert_eq!(cleaned.title, "Trust in the Lord");
        assert_eq!(cleaned.conference, "October 2019");
        assert_eq!(
            cleaned.quote,
            "We trust in the Lord and lean not unto our own understanding."
        );
        assert_eq!(cleaned.headshot, "");
    }

    #[test]
    fn spaced_key_form_is_recognized() {
        let cleaned = sanitize_quote(quote(
            "Gerrit W. Gong",
            r#"Happy and Forever", "conference": "October 2022"#,
            "October 2022",
            "Covenant belonging blesses us.",
            "",
        ));
        assert_eq!(cleaned.conference, "October 2022");
        assert_eq!(cleaned.title, "Happy and Forever");
    }

    #[test]
    fn double_escaped_pairs_are_extracted() {
        let bled = r#"\\"speaker\\":\\"Jeffrey R. Holland\\", \\"quote\\":\\"Come and see, come and help, come and stay.\\""#;
        let cleaned = sanitize_quote(quote("", "", "", bled, ""));
        assert_eq!(cleaned.speaker, "Jeffrey R. Holland");
        assert_eq!(cleaned.quote, "Come and see, come and help, come and stay.");
    }

    #[test]
    fn escaped_newlines_become_real_newlines() {
        let bled = r#"\\"quote\\":\\"Line one.\\nLine two.\\""#;
        let cleaned = sanitize_quote(quote("Quentin L. Cook", "", "", bled, ""));
        assert_eq!(cleaned.quote, "Line one.\nLine two.");
    }

    #[test]
    fn last_embedded_occurrence_wins() {
        let bled = r#"{"quote":"early draft"} {"quote":"final text"}"#;
        let cleaned = sanitize_quote(quote("", "", "", bled, ""));
        assert_eq!(cleaned.quote, "final text");
    }

    // ── Trailing key bleed ──

    #[test]
    fn title_is_cut_where_next_key_bleeds_in() {
        let cleaned = sanitize_quote(quote(
            "Henry B. Eyring",
            r#"The Love of God", "conference": "October 2021"#,
            "October 2021",
            "A plain quote with no markup.",
            "",
        ));
        assert_eq!(cleaned.title, "The Love of God");
        assert_eq!(cleaned.conference, "October 2021");
    }

    #[test]
    fn escaped_key_bleed_is_also_cut() {
        let cleaned = sanitize_quote(quote(
            "David A. Bednar",
            r#"In the Path of Their Duty", \"conference\": more noise"#,
            "October 2023",
            "A plain quote.",
            "",
        ));
        assert_eq!(cleaned.title, "In the Path of Their Duty");
    }

    // ── Scriptures ──

    #[test]
    fn scripture_labels_are_stripped() {
        let cleaned = sanitize_scripture(StructuredScripture {
            volume: "Volume: New Testament".to_string(),
            reference: "Reference: Hebrews 11:1 Text: bleed".to_string(),
            text: "Text: Now faith is the substance of things hoped for.".to_string(),
            related_talk: None,
        });
        assert_eq!(cleaned.volume, "New Testament");
        assert_eq!(cleaned.reference, "Hebrews 11:1");
        assert_eq!(cleaned.text, "Now faith is the substance of things hoped for.");
    }

    #[test]
    fn scripture_embedded_pairs_repopulate_fields() {
        let bled = r#"{"volume":"Doctrine and Covenants","reference":"D&C 6:36","text":"Look unto me in every thought; doubt not, fear not."}"#;
        let cleaned = sanitize_scripture(StructuredScripture {
            volume: String::new(),
            reference: String::new(),
            text: bled.to_string(),
            related_talk: None,
        });
        assert_eq!(cleaned.volume, "Doctrine and Covenants");
        assert_eq!(cleaned.reference, "D&C 6:36");
        assert_eq!(
            cleaned.text,
            "Look unto me in every thought; doubt not, fear not."
        );
    }

    #[test]
    fn related_talk_labels_are_stripped() {
        let cleaned = sanitize_scripture(StructuredScripture {
            volume: "Book of Mormon".to_string(),
            reference: "2 Nephi 2:25".to_string(),
            text: "Men are, that they might have joy.".to_string(),
            related_talk: Some(RelatedTalkQuote {
                speaker: "Speaker: Russell M. Nelson".to_string(),
                title: "Title: Joy and Spiritual Survival".to_string(),
                quote: "Quote: Joy is a principle of power.".to_string(),
            }),
        });
        let talk = cleaned.related_talk.expect("related talk kept");
        assert_eq!(talk.speaker, "Russell M. Nelson");
        assert_eq!(talk.title, "Joy and Spiritual Survival");
        assert_eq!(talk.quote, "Joy is a principle of power.");
    }

    // ── Dedup interaction ──

    #[test]
    fn noisy_and_clean_copies_sanitize_to_the_same_record() {
        let clean = quote(
            "Russell M. Nelson",
            "Peacemakers Needed",
            "April 2023",
            "Contention drives away the Spirit.",
            "",
        );
        let noisy = quote(
            "Speaker: Russell M. Nelson",
            "Title: Peacemakers Needed",
            "Conference: April 2023",
            "Quote: Contention drives away the Spirit.",
            "",
        );
        assert_eq!(sanitize_quote(noisy), sanitize_quote(clean));
    }
}
