//! HTML rendering for the kiosk front end.
//!
//! Every streamed section is a self-contained HTML fragment that the
//! browser swaps into a named slot, so fragments carry no page chrome.
//! All interpolated content is escaped here, including model output that
//! already went through the stream scrubbers.

use crate::agent::types::StructuredScripture;

/// One speaker card in the presidents or leaders section, with the
/// headshot already resolved to a full URL (or empty for no image).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerCard {
    pub name: String,
    pub talk_title: String,
    pub conference: String,
    pub quote: String,
    pub headshot: String,
}

// ═══════════════════════════════════════════════════════════
// Streamed sections
// ═══════════════════════════════════════════════════════════

pub fn presidents_section(speakers: &[SpeakerCard]) -> String {
    speaker_section("presidents", "Presidents of the Church", speakers)
}

pub fn leaders_section(speakers: &[SpeakerCard]) -> String {
    speaker_section("leaders", "Apostles and Church Leaders", speakers)
}

fn speaker_section(id: &str, heading: &str, speakers: &[SpeakerCard]) -> String {
    let mut html = String::with_capacity(1024);
    html.push_str(&format!(r#"<section id="{id}-section" class="mb-8">"#));
    html.push_str(&format!(
        r#"<h2 class="mb-4 text-2xl font-semibold">{}</h2>"#,
        escape_html(heading)
    ));
    html.push_str(r#"<div class="grid gap-4 md:grid-cols-3">"#);
    for card in speakers {
        html.push_str(&speaker_card(card));
    }
    html.push_str("</div></section>");
    html
}

fn speaker_card(card: &SpeakerCard) -> String {
    let mut html = String::with_capacity(512);
    html.push_str(r#"<article class="rounded-lg border border-gray-200 bg-white p-4 shadow-sm">"#);
    if !card.headshot.is_empty() {
        html.push_str(&format!(
            r#"<img class="mb-3 h-16 w-16 rounded-full object-cover" src="{}" alt="{}">"#,
            escape_html(&card.headshot),
            escape_html(&card.name)
        ));
    }
    html.push_str(&format!(
        r#"<h3 class="font-semibold">{}</h3>"#,
        escape_html(&card.name)
    ));
    html.push_str(&format!(
        r#"<p class="text-sm text-gray-600">{}</p>"#,
        escape_html(&card.talk_title)
    ));
    html.push_str(&format!(
        r#"<p class="text-xs text-gray-400">{}</p>"#,
        escape_html(&card.conference)
    ));
    html.push_str(&format!(
        r#"<blockquote class="mt-3 border-l-4 border-gray-200 pl-3 text-gray-700">{}</blockquote>"#,
        escape_html(&card.quote)
    ));
    html.push_str("</article>");
    html
}

/// Render the scriptures section with all three categories. Empty
/// categories are skipped rather than rendered as empty headings.
pub fn scriptures_section(
    bible: &[StructuredScripture],
    book_of_mormon: &[StructuredScripture],
    other: &[StructuredScripture],
) -> String {
    let mut html = String::with_capacity(1024);
    html.push_str(r#"<section id="scriptures-section" class="mb-8">"#);
    html.push_str(r#"<h2 class="mb-4 text-2xl font-semibold">Scriptures</h2>"#);
    scripture_category(&mut html, "Bible", bible);
    scripture_category(&mut html, "Book of Mormon", book_of_mormon);
    scripture_category(
        &mut html,
        "Doctrine and Covenants and Pearl of Great Price",
        other,
    );
    html.push_str("</section>");
    html
}

fn scripture_category(html: &mut String, heading: &str, scriptures: &[StructuredScripture]) {
    if scriptures.is_empty() {
        return;
    }
    html.push_str(r#"<div class="mb-6">"#);
    html.push_str(&format!(
        r#"<h3 class="mb-2 text-lg font-medium">{}</h3>"#,
        escape_html(heading)
    ));
    html.push_str(r#"<div class="grid gap-4 md:grid-cols-2">"#);
    for scripture in scriptures {
        html.push_str(&scripture_card(scripture));
    }
    html.push_str("</div></div>");
}

fn scripture_card(scripture: &StructuredScripture) -> String {
    let mut html = String::with_capacity(512);
    html.push_str(r#"<article class="rounded-lg border border-gray-200 bg-white p-4 shadow-sm">"#);
    html.push_str(&format!(
        r#"<p class="text-sm font-semibold">{}</p>"#,
        escape_html(&scripture.reference)
    ));
    html.push_str(&format!(
        r#"<p class="text-xs text-gray-400">{}</p>"#,
        escape_html(&scripture.volume)
    ));
    html.push_str(&format!(
        r#"<blockquote class="mt-2 text-gray-700">{}</blockquote>"#,
        escape_html(&scripture.text)
    ));
    if let Some(talk) = &scripture.related_talk {
        html.push_str(r#"<div class="mt-3 border-t border-gray-100 pt-2">"#);
        html.push_str(&format!(
            r#"<p class="text-xs text-gray-400">From &quot;{}&quot; by {}</p>"#,
            escape_html(&talk.title),
            escape_html(&talk.speaker)
        ));
        html.push_str(&format!(
            r#"<p class="text-sm text-gray-600">{}</p>"#,
            escape_html(&talk.quote)
        ));
        html.push_str("</div>");
    }
    html.push_str("</article>");
    html
}

pub fn summary_section(paragraphs: &[String]) -> String {
    let mut html = String::with_capacity(512);
    html.push_str(r#"<section id="summary-section" class="mb-8">"#);
    html.push_str(r#"<h2 class="mb-4 text-2xl font-semibold">Summary</h2>"#);
    for paragraph in paragraphs {
        html.push_str(&format!(
            r#"<p class="mb-3 text-gray-700">{}</p>"#,
            escape_html(paragraph)
        ));
    }
    html.push_str("</section>");
    html
}

/// The inline error notice streamed on the `server-error` event.
pub fn error_notice(message: &str) -> String {
    format!(
        r#"<div class="text-red-600">Error: {}</div>"#,
        escape_html(message)
    )
}

// ═══════════════════════════════════════════════════════════
// Question handling fragments
// ═══════════════════════════════════════════════════════════

/// Notice shown instead of a stream when a question is turned away, with
/// tappable replacement questions for the kiosk.
pub fn redirect_notice(message: &str, suggested_questions: &[String]) -> String {
    let mut html = String::with_capacity(1024);
    html.push_str(r#"<div class="rounded-lg border border-amber-200 bg-amber-50 p-6">"#);
    html.push_str(&format!(
        r#"<p class="mb-4 text-gray-800">{}</p>"#,
        escape_html(message)
    ));
    html.push_str(
        r#"<p class="mb-2 text-sm font-medium text-gray-600">Here are some questions I can help with:</p>"#,
    );
    html.push_str(r#"<ul class="space-y-2">"#);
    for question in suggested_questions {
        let escaped = escape_html(question);
        html.push_str(&format!(
            r#"<li><button type="button" class="suggested-question text-left text-blue-700 hover:underline" data-question="{escaped}">{escaped}</button></li>"#,
        ));
    }
    html.push_str("</ul></div>");
    html
}

/// The fragment returned by `POST /ask` for a safe question. It carries the
/// slots each SSE event swaps into and a script that opens the stream; the
/// browser URL-encodes the question itself when building the stream URL.
pub fn stream_container(session_id: &str, question: &str) -> String {
    let escaped_question = escape_html(question);
    let escaped_session = escape_html(session_id);
    format!(
        r#"<div id="answer-stream" data-question="{escaped_question}" data-session="{escaped_session}">
<p class="text-sm text-gray-500">Searching conference talks and scriptures for:</p>
<p class="mb-6 text-lg font-medium">{escaped_question}</p>
<div id="presidents-slot"></div>
<div id="leaders-slot"></div>
<div id="scriptures-slot"></div>
<div id="summary-slot"></div>
<div id="errors-slot" class="space-y-2"></div>
</div>
<script>
(function () {{
  var root = document.getElementById('answer-stream');
  var source = new EventSource('/api/stream?q=' + encodeURIComponent(root.dataset.question)
    + '&session=' + encodeURIComponent(root.dataset.session));
  ['presidents', 'leaders', 'scriptures', 'summary'].forEach(function (name) {{
    source.addEventListener(name, function (event) {{
      document.getElementById(name + '-slot').innerHTML = event.data;
    }});
  }});
  source.addEventListener('server-error', function (event) {{
    var holder = document.createElement('div');
    holder.innerHTML = event.data;
    document.getElementById('errors-slot').appendChild(holder);
  }});
  source.addEventListener('done', function () {{ source.close(); }});
  source.onerror = function () {{ source.close(); }};
}})();
</script>"#
    )
}

/// The kiosk landing page.
pub fn home_page() -> String {
    r##"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>What Would You Ask a Prophet?</title>
<script src="https://cdn.tailwindcss.com"></script>
<script src="https://unpkg.com/htmx.org@1.9.12"></script>
</head>
<body class="bg-gray-50 text-gray-900">
<main class="mx-auto max-w-5xl px-4 py-10">
<h1 class="text-3xl font-bold">What Would You Ask a Prophet?</h1>
<p class="mt-2 max-w-2xl text-gray-600">Prophets receive revelation from God and share His will for our day. They testify of Jesus Christ, warn of spiritual dangers, and make timeless truths relevant now.</p>
<form id="ask-form" class="mt-6 flex gap-2" hx-post="/ask" hx-target="#answer" hx-swap="innerHTML">
<input type="text" name="question" required autocomplete="off" placeholder="Ask your question" class="w-full rounded-lg border border-gray-300 px-4 py-3">
<button type="submit" class="rounded-lg bg-blue-700 px-6 py-3 font-medium text-white">Ask</button>
</form>
<div id="answer" class="mt-8"></div>
</main>
<script>
document.addEventListener('click', function (event) {
  var button = event.target.closest('.suggested-question');
  if (!button) return;
  var form = document.getElementById('ask-form');
  form.elements.question.value = button.dataset.question;
  htmx.trigger(form, 'submit');
});
</script>
</body>
</html>"##
        .to_string()
}

/// Escape text for interpolation into HTML content or attribute values.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
