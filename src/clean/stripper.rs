use super::Cleaner;

/// Characters that end a line in exported mail bodies.
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Splits on every line boundary, treating `\r\n` as one.
fn split_lines(body: &str) -> impl Iterator<Item = &str> {
    let mut rest = body;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        match rest.find(LINE_BREAKS) {
            Some(i) => {
                let line = &rest[..i];
                let tail = &rest[i..];
                let width = if tail.starts_with("\r\n") {
                    2
                } else {
                    tail.chars().next().map_or(1, char::len_utf8)
                };
                rest = &tail[width..];
                Some(line)
            }
            None => Some(std::mem::take(&mut rest)),
        }
    })
}

impl Cleaner {
    /// Keeps the lines written before the first quoted-reply marker.
    ///
    /// Blank lines and lines matching a metadata pattern are dropped; the
    /// rest are kept verbatim and joined with `\n`. A marker on the first
    /// line yields an empty string.
    pub fn strip_quoted(&self, body: &str) -> String {
        let mut kept = Vec::new();
        for line in split_lines(body) {
            if self.markers.iter().any(|re| re.is_match(line)) {
                break;
            }
            if line.trim().is_empty() || self.metadata.iter().any(|re| re.is_match(line)) {
                continue;
            }
            kept.push(line);
        }
        kept.join("\n")
    }

    /// [`strip_quoted`](Self::strip_quoted) followed by the scrub patterns,
    /// if the rule set has any.
    pub fn clean_body(&self, body: &str) -> String {
        let stripped = self.strip_quoted(body);
        if self.scrub.is_empty() {
            stripped
        } else {
            self.scrub_text(&stripped)
        }
    }
}
