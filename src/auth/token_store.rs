use anyhow::{Result, anyhow};
use keyring::{Entry, Error as KeyringError};

const SERVICE: &str = "mail_autocomplete";

fn save_secret(key: &str, secret: &str) -> Result<()> {
    Entry::new(SERVICE, key)?
        .set_password(secret)
        .map_err(|e| anyhow!(e.to_string()))
}

fn load_secret(key: &str) -> Result<Option<String>> {
    match Entry::new(SERVICE, key)?.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(e) => Err(anyhow!(e.to_string())),
    }
}

/// Refresh tokens are keyed by the account's email address.
pub fn save_refresh_token(user_email: &str, refresh_token: &str) -> Result<()> {
    save_secret(user_email, refresh_token)
}

pub fn load_refresh_token(user_email: &str) -> Result<Option<String>> {
    load_secret(user_email)
}

/// Client secrets are keyed by OAuth client id.
pub fn save_client_secret(client_id: &str, client_secret: &str) -> Result<()> {
    save_secret(client_id, client_secret)
}

pub fn load_client_secret(client_id: &str) -> Result<Option<String>> {
    load_secret(client_id)
}
