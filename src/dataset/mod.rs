//! Turns cleaned emails into `(input, output)` training pairs.

pub mod pairs;
pub mod text;

use crate::clean::{Cleaner, RulePreset};
use crate::domain::email::{RawEmail, TrainingPair};

pub use pairs::WHOLE_RESPONSE_PLACEHOLDER;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One pair per email with a placeholder response.
    WholeResponse,
    /// Next `max_words` words at every token position.
    Incremental { max_words: usize },
    /// Remainder of the sentence at every split point.
    Sentence,
}

impl Strategy {
    /// Rule preset matching the cleaner this strategy was built with.
    pub fn default_rules(&self) -> RulePreset {
        match self {
            Strategy::WholeResponse => RulePreset::Fetch,
            Strategy::Incremental { .. } => RulePreset::Incremental,
            Strategy::Sentence => RulePreset::Sentence,
        }
    }

    pub fn default_output(&self) -> &'static str {
        match self {
            Strategy::Sentence => "fine_tune_sentence_completion.json",
            _ => "fine_tune_dataset.json",
        }
    }

    pub fn pairs(&self, subject: &str, body: &str) -> Vec<TrainingPair> {
        match *self {
            Strategy::WholeResponse => pairs::whole_response_pairs(subject, body),
            Strategy::Incremental { max_words } => pairs::incremental_pairs(subject, body, max_words),
            Strategy::Sentence => pairs::sentence_pairs(subject, body),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DatasetOptions {
    pub strategy: Strategy,
    /// Bodies with this many tokens or fewer are skipped.
    pub min_tokens: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormatReport {
    pub emails_seen: usize,
    pub emails_used: usize,
    pub skipped_empty: usize,
    pub skipped_short: usize,
    pub pairs: usize,
}

pub fn format_dataset(
    records: &[RawEmail],
    opts: &DatasetOptions,
    cleaner: &Cleaner,
) -> (Vec<TrainingPair>, FormatReport) {
    let mut report = FormatReport {
        emails_seen: records.len(),
        ..Default::default()
    };
    let mut out = Vec::new();

    for raw in records {
        if raw.subject.trim().is_empty() || raw.body.trim().is_empty() {
            report.skipped_empty += 1;
            continue;
        }
        let email = cleaner.clean_email(raw);
        if text::token_count(&email.body) <= opts.min_tokens {
            log::debug!("skipping short email in thread {}", email.thread_id);
            report.skipped_short += 1;
            continue;
        }
        let pairs = opts.strategy.pairs(&email.subject, &email.body);
        report.emails_used += 1;
        report.pairs += pairs.len();
        out.extend(pairs);
    }

    log::info!(
        "formatted {} pairs from {}/{} emails ({} empty, {} too short)",
        report.pairs,
        report.emails_used,
        report.emails_seen,
        report.skipped_empty,
        report.skipped_short
    );
    (out, report)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn email(thread_id: &str, subject: &str, body: &str) -> RawEmail {
        RawEmail {
            thread_id: thread_id.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn quality_gate_drops_short_bodies() {
        let records = vec![
            email("short", "Hi", &words(25)),
            email("long", "Hi", &words(26)),
        ];
        let opts = DatasetOptions {
            strategy: Strategy::Incremental { max_words: 5 },
            min_tokens: 25,
        };
        let cleaner = Cleaner::from_preset(RulePreset::Incremental).unwrap();
        let (pairs, report) = format_dataset(&records, &opts, &cleaner);

        assert_eq!(pairs.len(), 26);
        assert_eq!(
            report,
            FormatReport {
                emails_seen: 2,
                emails_used: 1,
                skipped_empty: 0,
                skipped_short: 1,
                pairs: 26,
            }
        );
    }

    #[test]
    fn quoted_history_does_not_count_towards_the_gate() {
        let body = format!("{}\n> {}", words(3), words(40));
        let records = vec![email("t", "Hi", &body)];
        let opts = DatasetOptions {
            strategy: Strategy::Sentence,
            min_tokens: 25,
        };
        let cleaner = Cleaner::from_preset(RulePreset::Sentence).unwrap();
        let (pairs, report) = format_dataset(&records, &opts, &cleaner);
        assert!(pairs.is_empty());
        assert_eq!(report.skipped_short, 1);
    }

    #[test]
    fn empty_subject_or_body_is_skipped() {
        let records = vec![email("a", "  ", &words(30)), email("b", "Hi", "\n")];
        let opts = DatasetOptions {
            strategy: Strategy::WholeResponse,
            min_tokens: 0,
        };
        let cleaner = Cleaner::from_preset(RulePreset::Fetch).unwrap();
        let (pairs, report) = format_dataset(&records, &opts, &cleaner);
        assert!(pairs.is_empty());
        assert_eq!(report.skipped_empty, 2);
    }

    #[test]
    fn whole_response_on_quoted_reply() {
        let records = vec![email(
            "t",
            "Re: Lunch",
            "Hi Bob,\nOn Mon, Jan 1, 2024 at 3:00 PM John wrote:\n> old text\nThanks",
        )];
        let opts = DatasetOptions {
            strategy: Strategy::WholeResponse,
            min_tokens: 0,
        };
        let cleaner = Cleaner::from_preset(RulePreset::Fetch).unwrap();
        let (pairs, _) = format_dataset(&records, &opts, &cleaner);
        assert_eq!(
            pairs,
            vec![TrainingPair {
                input: "[SUBJECT] Re: Lunch\n[TEXT SO FAR] Hi Bob,".into(),
                output: WHOLE_RESPONSE_PLACEHOLDER.into(),
            }]
        );
    }

    #[test]
    fn formatting_replays_identically() {
        let records = vec![
            email("a", "Plans", &format!("{}. {}! done", words(12), words(20))),
            email("b", "More", &words(40)),
        ];
        let cleaner = Cleaner::from_preset(RulePreset::Sentence).unwrap();
        for strategy in [
            Strategy::WholeResponse,
            Strategy::Incremental { max_words: 5 },
            Strategy::Sentence,
        ] {
            let opts = DatasetOptions {
                strategy,
                min_tokens: 25,
            };
            let first = format_dataset(&records, &opts, &cleaner).0;
            let second = format_dataset(&records, &opts, &cleaner).0;
            assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
        }
    }
}
