use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::InferenceConfig;
use crate::inference::Completer;

/// Client for a text2text generation endpoint (`{"inputs", "parameters"}`
/// in, `[{"generated_text"}]` out).
pub struct HttpCompleter {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_token: Option<String>,
    parameters: GenerationParameters,
}

#[derive(Debug, Clone, Serialize)]
struct GenerationParameters {
    max_length: u32,
    num_beams: u32,
    early_stopping: bool,
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParameters,
}

#[derive(Debug, Deserialize)]
struct Generated {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerationResponse {
    Batch(Vec<Generated>),
    Single(Generated),
}

impl HttpCompleter {
    /// Builds the client once; the handle is then shared by reference.
    pub fn connect(cfg: &InferenceConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building inference HTTP client")?;
        let api_token = cfg
            .api_token
            .clone()
            .or_else(|| std::env::var("INFERENCE_API_TOKEN").ok());

        log::info!("using model endpoint {}", cfg.endpoint);
        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
            api_token,
            parameters: GenerationParameters {
                max_length: cfg.max_length,
                num_beams: cfg.num_beams,
                early_stopping: true,
            },
        })
    }
}

impl Completer for HttpCompleter {
    fn complete(&self, prompt: &str) -> Result<String> {
        let mut req = self.http.post(&self.endpoint).json(&GenerationRequest {
            inputs: prompt,
            parameters: &self.parameters,
        });
        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .with_context(|| format!("calling {}", self.endpoint))?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            bail!("model endpoint returned {status}: {body}");
        }
        parse_generation(&body)
    }
}

fn parse_generation(body: &str) -> Result<String> {
    let parsed: GenerationResponse =
        serde_json::from_str(body).context("unexpected generation response")?;
    match parsed {
        GenerationResponse::Single(g) => Ok(g.generated_text),
        GenerationResponse::Batch(batch) => batch
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or_else(|| anyhow!("model endpoint returned no generations")),
    }
}
