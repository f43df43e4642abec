//! First-object JSON extraction.
//!
//! Generation output regularly wraps its JSON payload in markdown fences,
//! leading prose, or trailing commentary, and occasionally concatenates two
//! objects back to back. Downstream parsing only ever wants the first
//! complete object, so this scanner finds it by brace depth instead of
//! trusting the whole response to be valid JSON.

/// Extract the first complete JSON object from `content`.
///
/// Scans from the first `{`, tracking brace depth and string state so that
/// braces inside string values never close the object and escaped quotes
/// never end a string. Returns `None` when no balanced object exists.
pub fn extract_first_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    // JSON structural characters are ASCII, so a byte walk is safe even for
    // multi-byte content between them.
    for (i, &byte) in content.as_bytes().iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_from_markdown_fence() {
        let content = "```json\n{\"quotes\":[]}\n```";
        assert_eq!(extract_first_object(content), Some("{\"quotes\":[]}"));
    }

    #[test]
    fn extracts_first_of_concatenated_objects() {
        let content = r#"{"a":1} {"b":2}"#;
        assert_eq!(extract_first_object(content), Some(r#"{"a":1}"#));
    }

    #[test]
    fn ignores_leading_and_trailing_prose() {
        let content = r#"Here is the answer: {"a":{"b":1}} hope that helps"#;
        assert_eq!(extract_first_object(content), Some(r#"{"a":{"b":1}}"#));
    }

    #[test]
    fn braces_inside_strings_do_not_close_the_object() {
        let content = r#"{"quote":"faith { and } hope"}"#;
        assert_eq!(extract_first_object(content), Some(content));
    }

    #[test]
    fn escaped_quotes_stay_inside_the_string() {
        let content = r#"{"quote":"she said \"go\" and left"}"#;
        assert_eq!(extract_first_object(content), Some(content));
    }

    #[test]
    fn nested_objects_balance() {
        let content = r#"{"outer":{"inner":{"deep":true}}}"#;
        assert_eq!(extract_first_object(content), Some(content));
    }

    #[test]
    fn no_object_returns_none() {
        assert_eq!(extract_first_object("not json at all"), None);
        assert_eq!(extract_first_object(""), None);
    }

    #[test]
    fn unterminated_object_returns_none() {
        assert_eq!(extract_first_object(r#"{"a": [1, 2"#), None);
    }

    #[test]
    fn multibyte_text_between_structure_is_handled() {
        let content = r#"réponse: {"quote":"la foi déplace les montagnes"}"#;
        assert_eq!(
            extract_first_object(content),
            Some(r#"{"quote":"la foi déplace les montagnes"}"#)
        );
    }
}
