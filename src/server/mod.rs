//! `POST /autocomplete` over a blocking tiny_http loop.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tiny_http::{Header, Method, Response, Server};

use crate::inference::{self, Completer};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AutocompleteRequest {
    subject: Option<String>,
    text_so_far: Option<String>,
}

#[derive(Debug, Serialize)]
struct AutocompleteResponse {
    suggestion: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Status and JSON body of a handled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
        Self { status, body }
    }

    fn error(status: u16, msg: impl Into<String>) -> Self {
        Self::json(status, &ErrorResponse { error: msg.into() })
    }
}

/// Routes one request. Kept free of socket types so it can be tested directly.
pub fn handle(method: &Method, url: &str, body: &[u8], completer: &dyn Completer) -> Reply {
    let path = url.split('?').next().unwrap_or_default();
    if path != "/autocomplete" {
        return Reply::error(404, format!("no route for {path}"));
    }

    match method {
        Method::Options => Reply {
            status: 204,
            body: String::new(),
        },
        Method::Post => autocomplete(body, completer),
        other => Reply::error(405, format!("method {other} not allowed")),
    }
}

fn autocomplete(body: &[u8], completer: &dyn Completer) -> Reply {
    let req: AutocompleteRequest = if body.iter().all(u8::is_ascii_whitespace) {
        AutocompleteRequest::default()
    } else {
        // a literal `null` body reads like no body at all
        match serde_json::from_slice::<Option<AutocompleteRequest>>(body) {
            Ok(r) => r.unwrap_or_default(),
            Err(e) => return Reply::error(400, format!("invalid JSON body: {e}")),
        }
    };

    let subject = req.subject.unwrap_or_default();
    let text_so_far = req.text_so_far.unwrap_or_default();
    match inference::suggest(completer, &subject, &text_so_far) {
        Ok(suggestion) => Reply::json(200, &AutocompleteResponse { suggestion }),
        Err(e) => {
            log::error!("completion failed: {e:#}");
            Reply::error(500, format!("{e:#}"))
        }
    }
}

fn header(raw: &str) -> Option<Header> {
    raw.parse::<Header>().ok()
}

fn to_response(reply: Reply) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut response = Response::from_string(reply.body).with_status_code(reply.status);
    let headers = [
        "Content-Type: application/json",
        "Access-Control-Allow-Origin: *",
        "Access-Control-Allow-Methods: POST, OPTIONS",
        "Access-Control-Allow-Headers: Content-Type",
    ];
    for h in headers.iter().filter_map(|h| header(h)) {
        response.add_header(h);
    }
    response
}

/// Serves until Ctrl-C.
pub fn serve(bind: &str, completer: &dyn Completer) -> Result<()> {
    let server = Server::http(bind).map_err(|e| anyhow!("Failed to bind {bind}: {e}"))?;
    log::info!("listening on http://{bind}/autocomplete");

    let running = Arc::new(AtomicBool::new(true));
    let r2 = running.clone();
    ctrlc::set_handler(move || {
        r2.store(false, Ordering::SeqCst);
    })?;

    while running.load(Ordering::SeqCst) {
        let mut request = match server.recv_timeout(Duration::from_millis(250)) {
            Ok(Some(r)) => r,
            Ok(None) => continue,
            Err(e) => {
                log::warn!("accept failed: {e}");
                continue;
            }
        };

        let mut body = Vec::new();
        let reply = match request.as_reader().read_to_end(&mut body) {
            Ok(_) => handle(request.method(), request.url(), &body, completer),
            Err(e) => Reply::error(400, format!("could not read body: {e}")),
        };
        log::debug!("{} {} -> {}", request.method(), request.url(), reply.status);
        if let Err(e) = request.respond(to_response(reply)) {
            log::warn!("failed to send response: {e}");
        }
    }

    log::info!("server stopped");
    Ok(())
}
