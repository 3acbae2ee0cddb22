use anyhow::{Context, Result, bail};
use chardetng::EncodingDetector;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::path::Path;

/// Reads a whole JSON array file. A corrupt file fails the caller.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let s = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parsing {}", path.display()))
}

/// Overwrites `path` with `records`, 4-space indented, non-ASCII kept as is.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut ser)?;
    fs::write(path, buf).with_context(|| format!("writing {}", path.display()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub records: usize,
    /// Records with at least one empty string field.
    pub with_empty_fields: usize,
}

/// Checks that a dataset file is UTF-8 and an array of objects.
pub fn inspect_file(path: &Path) -> Result<Inspection> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let text = match std::str::from_utf8(&bytes) {
        Ok(t) => t,
        Err(e) => bail!(
            "{} is not valid UTF-8 (first bad byte at offset {}); detected encoding: {}",
            path.display(),
            e.valid_up_to(),
            guess_encoding(&bytes)
        ),
    };
    let records: Vec<serde_json::Map<String, Value>> =
        serde_json::from_str(text).with_context(|| format!("parsing {}", path.display()))?;

    let with_empty_fields = records
        .iter()
        .filter(|r| r.values().any(|v| v.as_str().is_some_and(str::is_empty)))
        .count();
    Ok(Inspection {
        records: records.len(),
        with_empty_fields,
    })
}

fn guess_encoding(bytes: &[u8]) -> &'static str {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, false).name()
}
