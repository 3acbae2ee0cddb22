use once_cell::sync::Lazy;
use regex::Regex;

use super::{Cleaner, WHITESPACE_RE};

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+|www\.\S+").unwrap());

/// Mis-decoded and typographic apostrophes seen in exported mail.
const APOSTROPHES: [&str; 2] = ["â€™", "\u{2019}"];

impl Cleaner {
    /// Character-level cleanup of a subject or body, independent of lines.
    ///
    /// Removals can expose new matches (a scrubbed address leaving a month
    /// next to a year), so the pass is repeated until the text is stable.
    /// Every pass only deletes or shortens, so this terminates.
    pub fn normalize(&self, text: &str) -> String {
        let mut current = self.normalize_once(text);
        loop {
            let next = self.normalize_once(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn normalize_once(&self, text: &str) -> String {
        let mut out = text.replace("\r\n\r\n", "\n");
        if self.collapse_whitespace {
            out = WHITESPACE_RE.replace_all(&out, " ").into_owned();
        }
        out = URL_RE.replace_all(&out, "").into_owned();
        for apostrophe in APOSTROPHES {
            out = out.replace(apostrophe, "'");
        }
        out = self.disallowed.replace_all(&out, "").into_owned();
        if !self.scrub.is_empty() {
            out = self.scrub_text(&out);
        }
        out.trim().to_string()
    }
}
