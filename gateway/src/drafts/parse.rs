//! Flatten a full Gmail draft into a [`DraftRecord`].

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use swipemail_protocol::DraftRecord;
use tracing::debug;

use crate::google::types::{Draft, Header, MessagePart};

/// Gmail sends base64url; tolerate padding either way.
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub fn parse_draft(draft: &Draft) -> DraftRecord {
    let message = draft.message.as_ref();
    let payload = message.and_then(|m| m.payload.as_ref());
    let headers: &[Header] = payload.map(|p| p.headers.as_slice()).unwrap_or(&[]);

    DraftRecord {
        id: draft.id.clone(),
        message_id: message.and_then(|m| m.id.clone()),
        to: header_value(headers, "To"),
        from: header_value(headers, "From"),
        subject: header_value(headers, "Subject"),
        body: payload.map(extract_body).unwrap_or_default(),
        snippet: message.and_then(|m| m.snippet.clone()).unwrap_or_default(),
        date: header_value(headers, "Date"),
    }
}

/// First header named `name` (case-insensitive), or `""`.
pub fn header_value(headers: &[Header], name: &str) -> String {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.clone())
        .unwrap_or_default()
}

/// Body text by precedence: the payload's own data, then the first
/// `text/plain` part, then the first `text/html` part.
pub fn extract_body(payload: &MessagePart) -> String {
    if let Some(text) = decode_part(payload) {
        return text;
    }

    find_part(&payload.parts, "text/plain")
        .or_else(|| find_part(&payload.parts, "text/html"))
        .unwrap_or_default()
}

/// Depth-first search for the first decodable part of `mime_type`.
fn find_part(parts: &[MessagePart], mime_type: &str) -> Option<String> {
    for part in parts {
        let matches = part
            .mime_type
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case(mime_type));
        if matches {
            if let Some(text) = decode_part(part) {
                return Some(text);
            }
        }
        if let Some(text) = find_part(&part.parts, mime_type) {
            return Some(text);
        }
    }
    None
}

fn decode_part(part: &MessagePart) -> Option<String> {
    let data = part.body.as_ref()?.data.as_deref()?;
    if data.is_empty() {
        return None;
    }
    decode_body_data(data)
}

/// Decode Gmail body data. Standard-alphabet input and stray whitespace are
/// accepted; invalid UTF-8 is replaced rather than rejected.
pub fn decode_body_data(data: &str) -> Option<String> {
    let normalized: String = data
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    match BODY_ENGINE.decode(normalized.as_bytes()) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            debug!("Skipping undecodable body data: {}", e);
            None
        }
    }
}
