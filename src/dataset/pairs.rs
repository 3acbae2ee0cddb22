use crate::dataset::text::{looks_like_date, split_sentences, tokenize};
use crate::domain::email::TrainingPair;

/// Output of whole-response pairs. These records are a scaffold and need a
/// hand-written response before training.
pub const WHOLE_RESPONSE_PLACEHOLDER: &str = "Write your ideal response here";

pub fn whole_response_pairs(subject: &str, body: &str) -> Vec<TrainingPair> {
    vec![TrainingPair::new(subject, body, WHOLE_RESPONSE_PLACEHOLDER)]
}

/// One pair per token position: the words before it as prefix, the next
/// `max_words` words as output. Windows starting with a date are skipped.
pub fn incremental_pairs(subject: &str, body: &str, max_words: usize) -> Vec<TrainingPair> {
    let tokens = tokenize(body);
    let max_words = max_words.max(1);
    let mut pairs = Vec::with_capacity(tokens.len());
    let mut prefix = String::new();

    for (i, token) in tokens.iter().enumerate() {
        let end = (i + max_words).min(tokens.len());
        let window = tokens[i..end].join(" ");
        if !looks_like_date(&window) {
            pairs.push(TrainingPair::new(subject, &prefix, window));
        }
        if !prefix.is_empty() {
            prefix.push(' ');
        }
        prefix.push_str(token);
    }
    pairs
}

/// Every split point of every sentence: `n` tokens give `n - 1` pairs.
pub fn sentence_pairs(subject: &str, body: &str) -> Vec<TrainingPair> {
    let mut pairs = Vec::new();
    for sentence in split_sentences(body) {
        let tokens = tokenize(sentence);
        for i in 1..tokens.len() {
            pairs.push(TrainingPair::new(
                subject,
                &tokens[..i].join(" "),
                tokens[i..].join(" "),
            ));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::inference::build_prompt;

    fn prefix_of(pair: &TrainingPair) -> &str {
        pair.input
            .split_once("[TEXT SO FAR]")
            .map(|(_, rest)| rest.trim())
            .unwrap_or_default()
    }

    #[test]
    fn incremental_word_window_example() {
        let pairs = incremental_pairs("S", "word1 word2 word3", 2);
        let got: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| (prefix_of(p), p.output.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("", "word1 word2"),
                ("word1", "word2 word3"),
                ("word1 word2", "word3"),
            ]
        );
        assert_eq!(pairs[0].input, "[SUBJECT] S\n[TEXT SO FAR]");
    }

    #[test]
    fn incremental_outputs_walk_the_tokens() {
        let body = "Thanks for the quick turnaround on the draft, I will send notes by Friday.";
        let tokens = tokenize(body);

        let pairs = incremental_pairs("Draft", body, 5);
        assert_eq!(pairs.len(), tokens.len());
        let firsts: Vec<&str> = pairs
            .iter()
            .map(|p| p.output.split(' ').next().unwrap())
            .collect();
        assert_eq!(firsts, tokens);

        let singles = incremental_pairs("Draft", body, 1);
        let joined: Vec<&str> = singles.iter().map(|p| p.output.as_str()).collect();
        assert_eq!(joined.join(" "), tokens.join(" "));
    }

    #[test]
    fn incremental_skips_date_windows_without_shifting_prefixes() {
        let pairs = incremental_pairs("S", "due 2/28/2023 ok", 2);
        let got: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| (prefix_of(p), p.output.as_str()))
            .collect();
        assert_eq!(got, vec![("", "due 2/28/2023"), ("due 2/28/2023", "ok")]);
    }

    #[test]
    fn sentence_pairs_cover_every_split_point() {
        let body = "Can we move lunch? I am stuck in a review. Thanks";
        let pairs = sentence_pairs("Re: Lunch", body);
        // sentences of 4, 6 and 1 tokens
        assert_eq!(pairs.len(), 3 + 5);
        assert_eq!(pairs[0].input, build_prompt("Re: Lunch", "Can"));
        assert_eq!(pairs[0].output, "we move lunch?");

        for pair in &pairs {
            let n = tokenize(prefix_of(pair)).len() + tokenize(&pair.output).len();
            assert!(n == 4 || n == 6, "unexpected sentence length {n}");
            assert!(!prefix_of(pair).is_empty() && !pair.output.is_empty());
        }
    }

    #[test]
    fn whole_response_marks_record_for_editing() {
        let pairs = whole_response_pairs("Re: Lunch", "Hi Bob,");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].input, "[SUBJECT] Re: Lunch\n[TEXT SO FAR] Hi Bob,");
        assert_eq!(pairs[0].output, WHOLE_RESPONSE_PLACEHOLDER);
    }

    #[test]
    fn generation_is_deterministic() {
        let body = "First point: shipping. Second point: hiring! Last one? None.";
        assert_eq!(sentence_pairs("S", body), sentence_pairs("S", body));
        assert_eq!(incremental_pairs("S", body, 3), incremental_pairs("S", body, 3));
    }
}
