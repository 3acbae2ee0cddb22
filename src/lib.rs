pub mod auth;
pub mod clean;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod inference;
pub mod mail;
pub mod server;
pub mod store;
pub mod terminal;
