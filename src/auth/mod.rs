pub mod oauth;
pub mod token_manager;
pub mod token_store;
pub mod tokens_file;

/// Read access to messages is all the fetcher needs.
pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";
