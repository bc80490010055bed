//! HTTP transport utilities shared by the gateway client crates.

// Include the client module
pub mod client;
