use anyhow::{Result, bail};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::auth::token_manager::TokenManager;
use crate::mail::source::MailSource;

const GMAIL_API: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageList {
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub payload: Option<MessagePart>,
}

/// One node of the MIME tree as the API returns it.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: Option<PartBody>,
    /// `None` when the key is absent, which is not the same as no children.
    #[serde(default)]
    pub parts: Option<Vec<MessagePart>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PartBody {
    /// base64url, usually unpadded
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

pub struct GmailClient {
    http: reqwest::blocking::Client,
    tokens: TokenManager,
    query: String,
    page_size: u32,
}

impl GmailClient {
    pub fn new(tokens: TokenManager, query: impl Into<String>, page_size: u32) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            tokens,
            query: query.into(),
            page_size,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let access = self.tokens.get_access_token()?;
        let resp = self
            .http
            .get(url)
            .bearer_auth(access)
            .query(query)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            bail!("Gmail API {status} for {url}: {body}");
        }
        Ok(resp.json()?)
    }
}

impl MailSource for GmailClient {
    fn list_page(&self, page_token: Option<&str>) -> Result<MessageList> {
        let page_size = self.page_size.to_string();
        let mut query = vec![("q", self.query.as_str()), ("maxResults", page_size.as_str())];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        self.get_json(&format!("{GMAIL_API}/messages"), &query)
    }

    fn get_message(&self, id: &str) -> Result<Message> {
        self.get_json(&format!("{GMAIL_API}/messages/{id}"), &[("format", "full")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_list_deserialization() {
        let json = r#"{
            "messages": [
                {"id": "m1", "threadId": "t1"},
                {"id": "m2", "threadId": "t2"}
            ],
            "nextPageToken": "tok",
            "resultSizeEstimate": 2
        }"#;
        let list: MessageList = serde_json::from_str(json).unwrap();
        assert_eq!(list.messages.len(), 2);
        assert_eq!(list.messages[1].thread_id, "t2");
        assert_eq!(list.next_page_token.as_deref(), Some("tok"));

        let empty: MessageList = serde_json::from_str(r#"{"resultSizeEstimate": 0}"#).unwrap();
        assert!(empty.messages.is_empty());
        assert!(empty.next_page_token.is_none());
    }

    #[test]
    fn message_payload_tree() {
        let json = r#"{
            "id": "m1",
            "threadId": "t1",
            "payload": {
                "mimeType": "multipart/alternative",
                "headers": [{"name": "Subject", "value": "Hello"}],
                "body": {"size": 0},
                "parts": [
                    {"mimeType": "text/plain", "body": {"size": 5, "data": "aGVsbG8"}}
                ]
            }
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        let payload = msg.payload.unwrap();
        assert_eq!(payload.headers[0].value, "Hello");
        let parts = payload.parts.unwrap();
        assert_eq!(parts[0].mime_type, "text/plain");
        assert!(parts[0].parts.is_none());
    }
}
