use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::clean::RuleSet;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub client_id: String,
    pub user_email: Option<String>,
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    /// Custom cleaning rules; when unset each command uses its preset.
    pub cleaning: Option<RuleSet>,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct FetchConfig {
    pub max_pages: u32,
    pub page_size: u32,
    pub query: String,
    pub skip_subject_containing: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            page_size: 100,
            query: "label:sent".to_string(),
            skip_subject_containing: Some("Fwd".to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DatasetConfig {
    pub min_tokens: usize,
    pub max_words: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            min_tokens: 25,
            max_words: 5,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct InferenceConfig {
    /// Text-generation endpoint of the model runtime.
    pub endpoint: String,
    pub max_length: u32,
    pub num_beams: u32,
    pub timeout_secs: u64,
    pub api_token: Option<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080/generate".to_string(),
            max_length: 50,
            num_beams: 5,
            timeout_secs: 60,
            api_token: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DemoConfig {
    /// How often the suggestion worker checks for new input.
    pub refresh_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { refresh_ms: 1000 }
    }
}

pub fn config_dir() -> Result<PathBuf> {
    let p = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("mail_autocomplete");
    fs::create_dir_all(&p)?;
    Ok(p)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

fn template() -> Config {
    Config {
        client_id: "YOUR_CLIENT_ID.apps.googleusercontent.com".to_string(),
        user_email: Some("you@example.com".to_string()),
        redirect_uri: Some("http://127.0.0.1:8090/callback".to_string()),
        ..Config::default()
    }
}

/// Reads the config at `path`, or `None` if the file does not exist.
pub fn read_config(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let cfg = toml::from_str(&s).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(cfg))
}

/// Loads the config, writing a template and failing if there is none yet.
/// Commands that talk to Gmail need the OAuth fields filled in.
pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if let Some(cfg) = read_config(&path)? {
        return Ok(cfg);
    }
    fs::write(&path, toml::to_string_pretty(&template())?)?;
    Err(anyhow::anyhow!(
        "Created template config at {}; edit it and run again",
        path.display()
    ))
}

/// Loads the config if present, defaults otherwise.
pub fn load_config_or_default() -> Result<Config> {
    Ok(read_config(&config_path()?)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::RulePreset;

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_config(&dir.path().join("config.toml")).unwrap().is_none());
    }

    #[test]
    fn partial_tables_keep_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
client_id = "abc"
user_email = "me@example.com"

[dataset]
min_tokens = 10

[inference]
endpoint = "http://gpu-box:9000/generate"
"#,
        )
        .unwrap();

        let cfg = read_config(&path).unwrap().unwrap();
        assert_eq!(cfg.client_id, "abc");
        assert_eq!(cfg.dataset.min_tokens, 10);
        assert_eq!(cfg.dataset.max_words, 5);
        assert_eq!(cfg.inference.endpoint, "http://gpu-box:9000/generate");
        assert_eq!(cfg.inference.num_beams, 5);
        assert_eq!(cfg.fetch.query, "label:sent");
        assert_eq!(cfg.server.bind, "127.0.0.1:5000");
        assert!(cfg.cleaning.is_none());
    }

    #[test]
    fn template_round_trips_with_custom_rules() {
        let mut cfg = template();
        cfg.cleaning = Some(RuleSet::preset(RulePreset::Sentence));
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.client_id, cfg.client_id);
        assert_eq!(back.cleaning, cfg.cleaning);
        assert_eq!(back.demo.refresh_ms, 1000);
    }

    #[test]
    fn broken_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "client_id = [").unwrap();
        let err = read_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
    }
}
