//! Client for the CardConnect CardPointe REST gateway.
//!
//! ```no_run
//! use cardconnect_cardpointe::{AuthorizationRequest, CardPointe};
//!
//! # async fn run() -> cardconnect_cardpointe::Result<()> {
//! let mut client = CardPointe::new(
//!     "496160873888",
//!     "testing",
//!     "testing123",
//!     "https://fts-uat.cardconnect.com/",
//! )?;
//!
//! let request = AuthorizationRequest::new()
//!     .account("4242424242424242")
//!     .amount("5.00")
//!     .expiry("1230")
//!     .capture("Y");
//!
//! let auth = client.authorize(&request).await?;
//! assert!(auth.is_captured());
//! # Ok(())
//! # }
//! ```
pub mod client;
pub mod coerce;
#[cfg(test)]
mod coerce_proptest;
pub mod error;
pub mod request;
pub mod response;

pub use client::{CardPointe, RequestOptions, RequestSnapshot};
pub use error::{CardPointeError, Result};
pub use request::{validate_input, AuthorizationRequest};
pub use response::{
    Authorization, AuthorizationResponse, CaptureResponse, InquireResponse, RefundResponse,
    Response, SettlementResponse, SettlementTransaction, VoidResponse,
};
