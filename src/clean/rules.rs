use serde::{Deserialize, Serialize};

/// Built-in rule sets. Each one reproduces one of the historical cleaners;
/// they disagree on what counts as quoted content, so the choice is left to
/// the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RulePreset {
    /// Fetch-time cleaner: stops at any reply or header line.
    Fetch,
    /// Word-window cleaner: also drops standalone date lines.
    Incremental,
    /// Sentence cleaner: drops address/reply lines and scrubs dates and times.
    Sentence,
}

/// Patterns and character policy for one cleaning variant.
///
/// `marker_patterns` end the scan of a body at the first matching line.
/// `metadata_patterns` drop single lines before that point. `scrub_patterns`
/// are removed from the joined body and from normalized text wherever they
/// match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub marker_patterns: Vec<String>,
    #[serde(default)]
    pub metadata_patterns: Vec<String>,
    #[serde(default)]
    pub scrub_patterns: Vec<String>,
    pub punctuation_allowlist: String,
    #[serde(default = "default_collapse")]
    pub collapse_whitespace: bool,
}

fn default_collapse() -> bool {
    true
}

const FORWARD_SEPARATOR: &str = r"^---- Original Message ----";
const QUOTE_PREFIX: &str = r"^>+ ";
const REPLY_WITH_TIME: &str = r"^On .* at .* wrote:$";
const REPLY_PLAIN: &str = r"^On .* wrote:$";

const WEEKDAY_DATE_LINE: &str =
    r"^(Mon|Tue|Wed|Thu|Fri|Sat|Sun),?\s+\w+\s+\d{1,2},\s+\d{4}(.*at.*)?";

const NARROW_PUNCTUATION: &str = ",.;:?!";
const FULL_PUNCTUATION: &str = ",.;:?!'\"-";

impl RuleSet {
    pub fn preset(preset: RulePreset) -> Self {
        match preset {
            RulePreset::Fetch => Self {
                marker_patterns: strings(&[
                    REPLY_WITH_TIME,
                    r"^.* wrote:$",
                    QUOTE_PREFIX,
                    FORWARD_SEPARATOR,
                    r"^From: .*@.*",
                    r"^Sent: .*",
                    r"^To: .*@.*",
                    r"^Cc: .*@.*",
                    r"^Date: .*",
                ]),
                metadata_patterns: Vec::new(),
                scrub_patterns: Vec::new(),
                punctuation_allowlist: NARROW_PUNCTUATION.to_string(),
                collapse_whitespace: true,
            },
            RulePreset::Incremental => Self {
                marker_patterns: strings(&[
                    REPLY_WITH_TIME,
                    REPLY_PLAIN,
                    QUOTE_PREFIX,
                    FORWARD_SEPARATOR,
                ]),
                metadata_patterns: strings(&[
                    WEEKDAY_DATE_LINE,
                    r"^\d{1,2}/\d{1,2}/\d{2,4}(.*at.*)?",
                    r"^\d{1,2}-\d{1,2}-\d{2,4}(.*at.*)?",
                ]),
                scrub_patterns: Vec::new(),
                punctuation_allowlist: FULL_PUNCTUATION.to_string(),
                collapse_whitespace: true,
            },
            RulePreset::Sentence => Self {
                marker_patterns: strings(&[
                    REPLY_WITH_TIME,
                    REPLY_PLAIN,
                    QUOTE_PREFIX,
                    FORWARD_SEPARATOR,
                ]),
                metadata_patterns: strings(&[r"<.*?>", r"On .* at .* wrote:", r"On .* wrote:"]),
                scrub_patterns: strings(&[
                    r"\b(Mon|Tue|Wed|Thu|Fri|Sat|Sun),?\s+\w+\s+\d{1,2},\s+\d{4}\b",
                    r"\b\d{1,2}/\d{1,2}/\d{2,4}\b",
                    r"\b\d{1,2}-\d{1,2}-\d{2,4}\b",
                    r"\b\d{1,2}:\d{2}\s*(AM|PM|am|pm)?\b",
                    r"\b\w+\s+\d{1,2}-\d{1,2}\b",
                    r"\b\w+\s+\d{1,2},?\s+\d{4}\b",
                    r"<.*?>",
                    r"On .* at .* wrote:",
                    r"On .* wrote:",
                ]),
                punctuation_allowlist: FULL_PUNCTUATION.to_string(),
                collapse_whitespace: true,
            },
        }
    }
}

fn strings(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}
