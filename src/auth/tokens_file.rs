use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::config_dir;

/// Non-secret token metadata kept in `<config dir>/mail_autocomplete/tokens.json`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensFile {
    pub access_token: Option<String>,
    pub expires_at_epoch: Option<i64>, // epoch seconds
}

impl TokensFile {
    /// The cached access token, if it has not expired at `now_epoch`.
    pub fn fresh_access_token(&self, now_epoch: i64) -> Option<&str> {
        match (&self.access_token, self.expires_at_epoch) {
            (Some(token), Some(exp)) if now_epoch < exp => Some(token),
            _ => None,
        }
    }
}

pub fn tokens_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("tokens.json"))
}

pub fn save_tokens(path: &Path, tokens: &TokensFile) -> Result<()> {
    let s = serde_json::to_string_pretty(tokens)?;
    fs::write(path, s).with_context(|| format!("writing {}", path.display()))
}

/// Loads the tokens file if present.
pub fn load_tokens(path: &Path) -> Result<Option<TokensFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(path)?;
    let tf = serde_json::from_str(&s).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(tf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_fresh_until_expiry() {
        let tf = TokensFile {
            access_token: Some("ya29.x".into()),
            expires_at_epoch: Some(1_000),
        };
        assert_eq!(tf.fresh_access_token(999), Some("ya29.x"));
        assert_eq!(tf.fresh_access_token(1_000), None);
        assert_eq!(TokensFile::default().fresh_access_token(0), None);
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        assert!(load_tokens(&path).unwrap().is_none());

        let tf = TokensFile {
            access_token: Some("abc".into()),
            expires_at_epoch: Some(42),
        };
        save_tokens(&path, &tf).unwrap();
        assert_eq!(load_tokens(&path).unwrap(), Some(tf));
    }
}
