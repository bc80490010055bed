//! Test fixtures for CardPointe client tests
//!
//! Factory functions for clients pointed at a mock gateway and for the
//! bodies the gateway answers with.
#![allow(dead_code)]

use cardconnect_cardpointe::{AuthorizationRequest, CardPointe};
use cardconnect_config::CardPointeConfig;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

pub const MERCHANT_ID: &str = "496160873888";
pub const USERNAME: &str = "testing";
pub const PASSWORD: &str = "testing123";
pub const RETREF: &str = "343005123105";

/// Base path every resource lives under
pub const REST_PATH: &str = "/cardconnect/rest/";

/// Creates a client pointed at the given mock server URI
pub fn create_test_client(server_uri: &str) -> CardPointe {
    CardPointe::new(MERCHANT_ID, USERNAME, PASSWORD, server_uri)
        .expect("Failed to build test client")
}

/// Creates a CardPointe config for the given endpoint
pub fn create_test_config(endpoint: &str) -> CardPointeConfig {
    CardPointeConfig {
        merchant_id: MERCHANT_ID.to_string(),
        username: USERNAME.to_string(),
        password: Some(PASSWORD.to_string()),
        endpoint: endpoint.to_string(),
        currency: "USD".to_string(),
        accept_invalid_certs: false,
        timeout_secs: Some(5),
    }
}

/// Resource path under the REST base, e.g. `rest_path("auth")`
pub fn rest_path(resource: &str) -> String {
    format!("{}{}", REST_PATH, resource)
}

/// Card expiry (`MMYY`) one year from now
pub fn future_expiry() -> String {
    (Utc::now() + Duration::days(365)).format("%m%y").to_string()
}

/// Visa test card for the given amount, expiring in the future
pub fn create_visa_auth_request(amount: &str) -> AuthorizationRequest {
    AuthorizationRequest::new()
        .account("4242424242424242")
        .amount(amount)
        .expiry(future_expiry())
}

/// A card-not-present authorization for $5.00
pub fn create_test_auth_request() -> AuthorizationRequest {
    AuthorizationRequest::new()
        .account("4788250000121443")
        .amount("500")
        .expiry("1218")
        .name("Test User")
        .postal("19406")
        .ecomind("E")
}

/// Gateway answer to an approved authorization
pub fn approved_auth_body() -> Value {
    json!({
        "respstat": "A",
        "retref": RETREF,
        "account": "9418594164541111",
        "token": "9418594164541111",
        "amount": "500",
        "merchid": MERCHANT_ID,
        "respcode": "00",
        "resptext": "Approval",
        "respproc": "FNOR",
        "avsresp": "Y",
        "cvvresp": "M",
        "authcode": "046221",
        "commcard": "N"
    })
}

/// Gateway answer to a declined authorization
pub fn declined_auth_body() -> Value {
    json!({
        "respstat": "C",
        "retref": "343006123106",
        "amount": "0",
        "merchid": MERCHANT_ID,
        "respcode": "05",
        "resptext": "Do not honor",
        "respproc": "FNOR"
    })
}

/// Gateway answer to a capture of [`RETREF`]
pub fn capture_body() -> Value {
    json!({
        "respstat": "A",
        "retref": RETREF,
        "account": "9418594164541111",
        "token": "9418594164541111",
        "amount": "500",
        "merchid": MERCHANT_ID,
        "respcode": "00",
        "resptext": "Approval",
        "setlstat": "Queued for Capture",
        "batchid": "1900941444",
        "authcode": "046221"
    })
}

/// One accepted settlement batch with two transactions
pub fn settlement_body() -> Value {
    json!([{
        "respproc": "FNOR",
        "hostbatch": "1900941444",
        "refundtotal": "0.00",
        "batchid": "1900941444",
        "chargetotal": "10.00",
        "hoststat": "GB",
        "merchid": MERCHANT_ID,
        "txns": [
            { "setlamount": "5.00", "setlstat": "Y", "salesdoc": "1", "retref": RETREF },
            { "setlamount": "5.00", "setlstat": "N", "salesdoc": "2", "retref": "343007123107" }
        ]
    }])
}

/// Stored profile with one account
pub fn profile_body() -> Value {
    json!([{
        "profileid": "16392957454935798591",
        "acctid": "1",
        "respstat": "A",
        "account": "9418594164541111",
        "respcode": "09",
        "resptext": "Profile found",
        "respproc": "PPS",
        "defaultacct": "Y",
        "expiry": "1218"
    }])
}
