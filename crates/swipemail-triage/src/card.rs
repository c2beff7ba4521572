//! Card text
//!
//! Display fallbacks and body cleanup for the draft on top of the queue.

use swipemail_protocol::DraftRecord;

/// Longest body shown on a card, in characters.
pub const BODY_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub draft_id: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl From<&DraftRecord> for CardView {
    fn from(draft: &DraftRecord) -> Self {
        Self {
            draft_id: draft.id.clone(),
            to: non_empty(&draft.to).unwrap_or("No recipient").to_string(),
            subject: non_empty(&draft.subject)
                .unwrap_or("(No subject)")
                .to_string(),
            body: format_body(
                non_empty(&draft.body)
                    .or_else(|| non_empty(&draft.snippet))
                    .unwrap_or("No content"),
            ),
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Strip markup and cap the text at [`BODY_PREVIEW_CHARS`], adding `...`
/// when cut.
pub fn format_body(body: &str) -> String {
    let stripped = strip_tags(body);
    if stripped.chars().count() > BODY_PREVIEW_CHARS {
        let mut cut: String = stripped.chars().take(BODY_PREVIEW_CHARS).collect();
        cut.push_str("...");
        cut
    } else {
        stripped
    }
}

/// Remove every `<...>` run. An unclosed `<` is kept as text.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        out.push_str(&rest[..open]);
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out
}
