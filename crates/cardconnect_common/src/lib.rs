// Declare modules within this crate
pub mod http; // HTTP transport utilities
pub mod logging; // Logging utilities

// Re-export HTTP utilities for easier access
pub use http::client::{create_client, ClientOptions, DEFAULT_TIMEOUT_SECS};

// Re-export logging utilities for easier access
pub use logging::{init, init_with_level, log_result};
