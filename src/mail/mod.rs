pub mod decoders;
pub mod fetcher;
pub mod gmail;
pub mod source;
