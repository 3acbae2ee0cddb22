use anyhow::{Result, anyhow};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::oauth::{self, Tokens};
use crate::auth::tokens_file::{self, TokensFile};
use crate::auth::{GMAIL_READONLY_SCOPE, token_store};
use crate::config::Config;

/// Assumed lifetime when the provider does not report one.
const DEFAULT_TOKEN_TTL_SECS: i64 = 3500;

#[derive(Clone)]
pub struct TokenManager {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub user_email: String,
    cache_path: PathBuf,
}

impl TokenManager {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let client_id = cfg.client_id.clone();
        let user_email = cfg
            .user_email
            .clone()
            .ok_or_else(|| anyhow!("user_email not set in config"))?;
        let redirect_uri = cfg
            .redirect_uri
            .clone()
            .unwrap_or_else(|| "http://127.0.0.1:8090/callback".to_string());

        let client_secret = token_store::load_client_secret(&client_id)?
            .or_else(|| std::env::var("OAUTH_CLIENT_SECRET").ok());

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri,
            user_email,
            cache_path: tokens_file::tokens_path()?,
        })
    }

    /// Returns a valid access token: cached if unexpired, otherwise
    /// refreshed, otherwise from an interactive login.
    pub fn get_access_token(&self) -> Result<String> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;

        if let Some(cached) = tokens_file::load_tokens(&self.cache_path)?
            && let Some(token) = cached.fresh_access_token(now)
        {
            return Ok(token.to_string());
        }

        let tokens = match token_store::load_refresh_token(&self.user_email)? {
            Some(rt) => {
                match oauth::refresh_access_token(&self.client_id, self.client_secret.as_deref(), &rt) {
                    Ok(t) => t,
                    Err(e) => {
                        log::warn!("refresh failed ({e}); falling back to browser login");
                        self.interactive_login()?
                    }
                }
            }
            None => self.interactive_login()?,
        };

        if let Some(rt) = &tokens.refresh_token
            && let Err(e) = token_store::save_refresh_token(&self.user_email, rt)
        {
            log::warn!("couldn't save refresh token to keyring: {e}");
        }

        let expires_in = tokens.expires_in.map(|s| s as i64).unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        tokens_file::save_tokens(
            &self.cache_path,
            &TokensFile {
                access_token: Some(tokens.access_token.clone()),
                expires_at_epoch: Some(now + expires_in),
            },
        )?;
        Ok(tokens.access_token)
    }

    fn interactive_login(&self) -> Result<Tokens> {
        println!("No usable token for {}; starting browser login...", self.user_email);
        oauth::perform_pkce_flow(
            &self.client_id,
            self.client_secret.as_deref(),
            &self.redirect_uri,
            GMAIL_READONLY_SCOPE,
        )
    }
}
