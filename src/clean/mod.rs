//! Email body and subject cleaning.
//!
//! A [`Cleaner`] is compiled once from a [`RuleSet`] and then applied to
//! every record: [`Cleaner::clean_body`] cuts quoted history and metadata
//! lines, [`Cleaner::normalize`] does character-level cleanup.

pub mod normalizer;
pub mod rules;
pub mod stripper;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::email::{CleanedEmail, RawEmail};
pub use rules::{RulePreset, RuleSet};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub struct Cleaner {
    markers: Vec<Regex>,
    metadata: Vec<Regex>,
    scrub: Vec<Regex>,
    disallowed: Regex,
    collapse_whitespace: bool,
}

impl Cleaner {
    pub fn new(rules: &RuleSet) -> Result<Self> {
        let disallowed = format!(r"[^\w\s{}]", regex::escape(&rules.punctuation_allowlist));
        Ok(Self {
            markers: compile_all(&rules.marker_patterns)?,
            metadata: compile_all(&rules.metadata_patterns)?,
            scrub: compile_all(&rules.scrub_patterns)?,
            disallowed: Regex::new(&disallowed).with_context(|| {
                format!(
                    "invalid punctuation allowlist {:?}",
                    rules.punctuation_allowlist
                )
            })?,
            collapse_whitespace: rules.collapse_whitespace,
        })
    }

    pub fn from_preset(preset: RulePreset) -> Result<Self> {
        Self::new(&RuleSet::preset(preset))
    }

    /// Normalizes the subject and strips the body of a fetched record.
    pub fn clean_email(&self, raw: &RawEmail) -> CleanedEmail {
        CleanedEmail {
            thread_id: raw.thread_id.clone(),
            subject: self.normalize(raw.subject.trim()),
            body: self.clean_body(raw.body.trim()),
        }
    }

    fn scrub_text(&self, text: &str) -> String {
        let mut out = text.to_string();
        for re in &self.scrub {
            out = re.replace_all(&out, "").into_owned();
        }
        collapse_whitespace(&out)
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("invalid cleaning pattern {p:?}")))
        .collect()
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}
