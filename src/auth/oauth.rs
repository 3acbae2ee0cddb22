use anyhow::{Result, anyhow};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::reqwest::http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tiny_http::{Response, Server};
use url::Url;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// Tokens returned by the oauth flow (in-memory)
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

impl From<BasicTokenResponse> for Tokens {
    fn from(token: BasicTokenResponse) -> Self {
        Self {
            access_token: token.access_token().secret().to_string(),
            refresh_token: token.refresh_token().map(|r| r.secret().to_string()),
            expires_in: token.expires_in().map(|d| d.as_secs()),
        }
    }
}

fn google_client(client_id: &str, client_secret: Option<&str>) -> Result<BasicClient> {
    Ok(BasicClient::new(
        ClientId::new(client_id.to_string()),
        client_secret.map(|s| ClientSecret::new(s.to_string())),
        AuthUrl::new(GOOGLE_AUTH_URL.to_string())?,
        Some(TokenUrl::new(GOOGLE_TOKEN_URL.to_string())?),
    ))
}

pub fn refresh_access_token(
    client_id: &str,
    client_secret: Option<&str>,
    refresh_token: &str,
) -> Result<Tokens> {
    let token = google_client(client_id, client_secret)?
        .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
        .request(http_client)?;
    Ok(token.into())
}

/// Authorization Code + PKCE: opens the browser and catches the redirect on
/// the loopback address named by `redirect_uri`.
pub fn perform_pkce_flow(
    client_id: &str,
    client_secret: Option<&str>,
    redirect_uri: &str,
    scope: &str,
) -> Result<Tokens> {
    let redirect = Url::parse(redirect_uri)
        .map_err(|e| anyhow!("Invalid redirect_uri '{redirect_uri}': {e}"))?;
    let bind_addr = loopback_addr(&redirect)?;

    // listen before the browser can redirect
    let server = Server::http(bind_addr)
        .map_err(|e| anyhow!("Failed to bind OAuth callback server on {bind_addr}: {e:?}"))?;

    let client = google_client(client_id, client_secret)?
        .set_redirect_uri(RedirectUrl::new(redirect_uri.to_string())?);
    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
    let (auth_url, _csrf) = client
        .authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new(scope.to_string()))
        .set_pkce_challenge(pkce_challenge)
        .url();

    println!("Open this URL in your browser:\n{auth_url}");
    if let Err(e) = open::that(auth_url.as_str()) {
        log::warn!("could not open browser automatically: {e}");
    }

    let code = wait_for_code(&server, &redirect)?;
    let token = client
        .exchange_code(AuthorizationCode::new(code))
        .set_pkce_verifier(pkce_verifier)
        .request(http_client)
        .map_err(|e| anyhow!("Token exchange failed: {e:?}"))?;
    Ok(token.into())
}

/// Bind address for the redirect catcher; only loopback or literal IPs.
fn loopback_addr(redirect: &Url) -> Result<SocketAddr> {
    let host = redirect
        .host_str()
        .ok_or_else(|| anyhow!("redirect_uri missing host: {redirect}"))?;
    let port = redirect
        .port_or_known_default()
        .ok_or_else(|| anyhow!("redirect_uri missing/unknown port: {redirect}"))?;
    let ip: IpAddr = match host {
        "localhost" | "127.0.0.1" => IpAddr::V4(Ipv4Addr::LOCALHOST),
        other => other.parse().map_err(|_| {
            anyhow!("redirect_uri host must be localhost/127.0.0.1 or an IP: {other}")
        })?,
    };
    Ok(SocketAddr::new(ip, port))
}

/// Pulls `code` out of a callback request path like `/callback?code=..`.
fn code_from_callback(redirect: &Url, request_path: &str) -> Option<String> {
    let full = redirect.join(request_path).ok()?;
    full.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
}

fn wait_for_code(server: &Server, redirect: &Url) -> Result<String> {
    let deadline = Instant::now() + CALLBACK_TIMEOUT;
    while Instant::now() < deadline {
        let Ok(Some(request)) = server.recv_timeout(Duration::from_millis(500)) else {
            continue;
        };
        match code_from_callback(redirect, request.url()) {
            Some(code) => {
                let _ = request.respond(Response::from_string(
                    "Authorization received. You can close this tab.",
                ));
                return Ok(code);
            }
            None => {
                let _ = request.respond(Response::from_string(
                    "No code found in redirect. You can close this tab.",
                ));
            }
        }
    }
    Err(anyhow!("No code received within timeout"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_hosts_bind_to_localhost() {
        let url = Url::parse("http://localhost:8090/callback").unwrap();
        assert_eq!(loopback_addr(&url).unwrap(), "127.0.0.1:8090".parse().unwrap());
        let url = Url::parse("http://10.0.0.2/cb").unwrap();
        assert_eq!(loopback_addr(&url).unwrap(), "10.0.0.2:80".parse().unwrap());
    }

    #[test]
    fn named_hosts_are_rejected() {
        let url = Url::parse("http://example.com:8090/callback").unwrap();
        assert!(loopback_addr(&url).is_err());
    }

    #[test]
    fn code_is_read_from_query() {
        let redirect = Url::parse("http://127.0.0.1:8090/callback").unwrap();
        assert_eq!(
            code_from_callback(&redirect, "/callback?state=x&code=4%2F0Ab").as_deref(),
            Some("4/0Ab")
        );
        assert_eq!(code_from_callback(&redirect, "/favicon.ico"), None);
    }
}
