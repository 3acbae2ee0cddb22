use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCE_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?;:]\s+").unwrap());

static DATE_WINDOW_RES: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"^\d{1,2}[/-]\d{1,2}[/-]\d{2,4}(.*at.*)?").unwrap(),
        Regex::new(r"^(Mon|Tue|Wed|Thu|Fri|Sat|Sun),?\s+\w+\s+\d{1,2},\s+\d{4}(.*at.*)?").unwrap(),
    ]
});

pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

pub fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Splits after `.`, `!`, `?`, `;` or `:` when followed by whitespace.
/// Pieces are trimmed and empty ones dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END_RE.find_iter(text) {
        // the terminator is one ASCII byte and stays with its sentence
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    sentences.push(&text[start..]);
    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// True when a word window starts with a bare date or timestamp.
pub fn looks_like_date(window: &str) -> bool {
    DATE_WINDOW_RES.iter().any(|re| re.is_match(window))
}
