use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::mail::gmail::{Header, MessagePart};

/// The API omits padding on some parts and keeps it on others.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes base64url text. Bad UTF-8 is replaced; bad base64 gives "".
pub fn decode_base64url(data: &str) -> String {
    match URL_SAFE_LENIENT.decode(data.trim()) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            log::debug!("undecodable body data: {e}");
            String::new()
        }
    }
}

/// Plain-text body of a message payload.
///
/// Multipart payloads are searched depth-first for the first `text/plain`
/// part with data. A payload without `parts` uses its own body whatever its
/// type. Returns "" when nothing matches.
pub fn extract_plain_text(payload: &MessagePart) -> String {
    match &payload.parts {
        Some(parts) => find_plain_text(parts).unwrap_or_default(),
        None => part_data(payload).map(decode_base64url).unwrap_or_default(),
    }
}

fn find_plain_text(parts: &[MessagePart]) -> Option<String> {
    for part in parts {
        if part.mime_type.eq_ignore_ascii_case("text/plain")
            && let Some(data) = part_data(part)
        {
            return Some(decode_base64url(data));
        }
        if let Some(children) = &part.parts
            && let Some(text) = find_plain_text(children)
        {
            return Some(text);
        }
    }
    None
}

fn part_data(part: &MessagePart) -> Option<&str> {
    part.body.as_ref()?.data.as_deref()
}

pub fn header_value<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::gmail::PartBody;

    fn b64(text: &str) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(text)
    }

    fn leaf(mime: &str, text: &str) -> MessagePart {
        MessagePart {
            mime_type: mime.into(),
            body: Some(PartBody {
                data: Some(b64(text)),
            }),
            ..Default::default()
        }
    }

    fn multipart(parts: Vec<MessagePart>) -> MessagePart {
        MessagePart {
            mime_type: "multipart/mixed".into(),
            parts: Some(parts),
            ..Default::default()
        }
    }

    #[test]
    fn single_part_uses_top_level_body() {
        assert_eq!(extract_plain_text(&leaf("text/html", "<p>hi</p>")), "<p>hi</p>");
    }

    #[test]
    fn first_plain_part_wins_depth_first() {
        let payload = multipart(vec![
            leaf("text/html", "<b>html</b>"),
            multipart(vec![leaf("image/png", "png"), leaf("text/plain", "nested")]),
            leaf("text/plain", "later"),
        ]);
        assert_eq!(extract_plain_text(&payload), "nested");
    }

    #[test]
    fn no_plain_part_is_empty() {
        let payload = multipart(vec![leaf("text/html", "<b>x</b>")]);
        assert_eq!(extract_plain_text(&payload), "");
        assert_eq!(extract_plain_text(&multipart(vec![])), "");
        assert_eq!(extract_plain_text(&MessagePart::default()), "");
    }

    #[test]
    fn decoding_never_fails() {
        assert_eq!(decode_base64url("aGk="), "hi");
        assert_eq!(decode_base64url("aGk"), "hi");
        assert_eq!(decode_base64url("!!not base64!!"), "");
        let bad_utf8 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode([b'o', 0xff, b'k']);
        assert_eq!(decode_base64url(&bad_utf8), "o\u{fffd}k");
    }

    #[test]
    fn url_safe_alphabet() {
        // "??>" encodes to "Pz8-" in the URL-safe alphabet
        assert_eq!(decode_base64url("Pz8-"), "??>");
    }

    #[test]
    fn headers_match_case_insensitively() {
        let headers = vec![Header {
            name: "subject".into(),
            value: "Hello".into(),
        }];
        assert_eq!(header_value(&headers, "Subject"), Some("Hello"));
        assert_eq!(header_value(&headers, "From"), None);
    }
}
