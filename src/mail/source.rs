use anyhow::Result;

use crate::mail::gmail::{Message, MessageList};

/// Paginated access to a mailbox.
pub trait MailSource {
    fn list_page(&self, page_token: Option<&str>) -> Result<MessageList>;
    fn get_message(&self, id: &str) -> Result<Message>;
}
