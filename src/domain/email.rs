use serde::{Deserialize, Serialize};

/// One harvested email: the first message the user sent in a thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEmail {
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// Same shape as [`RawEmail`], with the subject normalized and the body
/// stripped of quoted history and metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedEmail {
    pub thread_id: String,
    pub subject: String,
    pub body: String,
}

/// A supervised example for next-text prediction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingPair {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub output: String,
}

impl TrainingPair {
    pub fn new(subject: &str, prefix: &str, output: impl Into<String>) -> Self {
        Self {
            input: crate::inference::build_prompt(subject, prefix),
            output: output.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_email_missing_fields_default_to_empty() {
        let e: RawEmail = serde_json::from_str(r#"{"subject": "Hi"}"#).unwrap();
        assert_eq!(e.subject, "Hi");
        assert!(e.thread_id.is_empty());
        assert!(e.body.is_empty());
    }

    #[test]
    fn pair_input_uses_prompt_template() {
        let p = TrainingPair::new("Lunch", "See you", "at noon");
        assert_eq!(p.input, "[SUBJECT] Lunch\n[TEXT SO FAR] See you");
        assert_eq!(p.output, "at noon");
    }
}
