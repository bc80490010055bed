//! Typed wrappers over decoded CardPointe responses.
//!
//! [`Response`] owns the decoded JSON object. The endpoint-specific types are
//! newtypes dereferencing to it, each adding accessors for the fields the
//! gateway documents for that endpoint. Unknown fields stay reachable through
//! [`Response::get`].

use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::ops::Deref;

use crate::coerce::convert_numbers;

/// `respstat` value for an approved transaction.
pub const RESPSTAT_APPROVED: &str = "A";

/// A decoded gateway response with numeric strings already converted.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Response {
    fields: Map<String, Value>,
}

impl Response {
    /// Wraps a decoded JSON object, converting numeric-looking top-level strings.
    pub fn new(mut fields: Map<String, Value>) -> Self {
        convert_numbers(&mut fields);
        Self { fields }
    }

    /// Wraps a decoded JSON value, failing if it is not an object.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let fields: Map<String, Value> = serde_json::from_value(value)?;
        Ok(Self::new(fields))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// Reads a number as `f64`; integer fields are widened.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_number(&self, key: &str) -> Option<&Number> {
        match self.get(key) {
            Some(Value::Number(n)) => Some(n),
            _ => None,
        }
    }

    /// Reads a field as text whether the gateway sent it as a string or it
    /// was coerced into a number (identifiers such as `retref`).
    ///
    /// Coercion drops leading zeros, so `"00"` reads back as `"0"`.
    pub fn get_text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Gateway yes/no flag: `"Y"`, `"y"` or boolean `true`.
    pub fn get_flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "Y" || s == "y",
            _ => false,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// `A` approved, `B` retry, `C` declined.
    pub fn respstat(&self) -> Option<&str> {
        self.get_str("respstat")
    }

    /// True when the gateway approved the request (`respstat == "A"`).
    pub fn success(&self) -> bool {
        self.respstat() == Some(RESPSTAT_APPROVED)
    }

    pub fn respcode(&self) -> Option<String> {
        self.get_text("respcode")
    }

    pub fn resptext(&self) -> Option<&str> {
        self.get_str("resptext")
    }

    pub fn respproc(&self) -> Option<&str> {
        self.get_str("respproc")
    }

    /// Gateway reference of the transaction.
    pub fn retref(&self) -> Option<String> {
        self.get_text("retref")
    }

    pub fn merchid(&self) -> Option<String> {
        self.get_text("merchid")
    }

    pub fn amount(&self) -> Option<&Number> {
        self.get_number("amount")
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.fields)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.fields)
    }
}

impl From<Map<String, Value>> for Response {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

macro_rules! gateway_response {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Default, Serialize)]
        #[serde(transparent)]
        pub struct $name(Response);

        impl $name {
            pub fn new(fields: Map<String, Value>) -> Self {
                Self(Response::new(fields))
            }

            pub fn into_inner(self) -> Response {
                self.0
            }
        }

        impl Deref for $name {
            type Target = Response;

            fn deref(&self) -> &Response {
                &self.0
            }
        }

        impl From<Response> for $name {
            fn from(response: Response) -> Self {
                Self(response)
            }
        }
    };
}

gateway_response!(
    /// Result of an authorization that was not captured.
    AuthorizationResponse
);
gateway_response!(
    /// Result of a capture, or of an authorization sent with `capture: Y`.
    CaptureResponse
);
gateway_response!(VoidResponse);
gateway_response!(RefundResponse);
gateway_response!(InquireResponse);
gateway_response!(
    /// One batch returned by `settlestat`.
    SettlementResponse
);
gateway_response!(
    /// One transaction inside a settlement batch.
    SettlementTransaction
);

impl AuthorizationResponse {
    pub fn authcode(&self) -> Option<String> {
        self.get_text("authcode")
    }

    pub fn token(&self) -> Option<String> {
        self.get_text("token")
    }

    pub fn account(&self) -> Option<String> {
        self.get_text("account")
    }

    pub fn avsresp(&self) -> Option<&str> {
        self.get_str("avsresp")
    }

    pub fn cvvresp(&self) -> Option<&str> {
        self.get_str("cvvresp")
    }

    pub fn commcard(&self) -> bool {
        self.get_flag("commcard")
    }

    /// Set when the request asked for a profile to be created.
    pub fn profileid(&self) -> Option<String> {
        self.get_text("profileid")
    }

    pub fn acctid(&self) -> Option<String> {
        self.get_text("acctid")
    }
}

impl CaptureResponse {
    pub fn authcode(&self) -> Option<String> {
        self.get_text("authcode")
    }

    pub fn token(&self) -> Option<String> {
        self.get_text("token")
    }

    pub fn account(&self) -> Option<String> {
        self.get_text("account")
    }

    pub fn setlstat(&self) -> Option<&str> {
        self.get_str("setlstat")
    }

    pub fn batchid(&self) -> Option<String> {
        self.get_text("batchid")
    }

    pub fn profileid(&self) -> Option<String> {
        self.get_text("profileid")
    }

    pub fn acctid(&self) -> Option<String> {
        self.get_text("acctid")
    }
}

impl VoidResponse {
    /// `REVERS` for an approved void.
    pub fn authcode(&self) -> Option<String> {
        self.get_text("authcode")
    }

    pub fn currency(&self) -> Option<&str> {
        self.get_str("currency")
    }
}

impl RefundResponse {
    pub fn currency(&self) -> Option<&str> {
        self.get_str("currency")
    }
}

impl InquireResponse {
    pub fn setlstat(&self) -> Option<&str> {
        self.get_str("setlstat")
    }

    pub fn authcode(&self) -> Option<String> {
        self.get_text("authcode")
    }

    pub fn authdate(&self) -> Option<String> {
        self.get_text("authdate")
    }

    pub fn capturedate(&self) -> Option<String> {
        self.get_text("capturedate")
    }

    pub fn voidable(&self) -> bool {
        self.get_flag("voidable")
    }

    pub fn refundable(&self) -> bool {
        self.get_flag("refundable")
    }
}

impl SettlementResponse {
    pub fn batchid(&self) -> Option<String> {
        self.get_text("batchid")
    }

    pub fn hostbatch(&self) -> Option<String> {
        self.get_text("hostbatch")
    }

    /// Host status of the batch, `GB` when accepted.
    pub fn hoststat(&self) -> Option<&str> {
        self.get_str("hoststat")
    }

    pub fn chargetotal(&self) -> Option<f64> {
        self.get_f64("chargetotal")
    }

    pub fn refundtotal(&self) -> Option<f64> {
        self.get_f64("refundtotal")
    }

    /// Transactions of the batch, each converted like a top-level response.
    /// Entries that are not JSON objects are skipped.
    pub fn txns(&self) -> Vec<SettlementTransaction> {
        match self.get("txns") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .map(SettlementTransaction::new)
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl SettlementTransaction {
    pub fn setlamount(&self) -> Option<&Number> {
        self.get_number("setlamount")
    }

    /// `Y` accepted, `N` rejected.
    pub fn setlstat(&self) -> Option<&str> {
        self.get_str("setlstat")
    }

    pub fn salesdoc(&self) -> Option<String> {
        self.get_text("salesdoc")
    }
}

/// Outcome of [`crate::CardPointe::authorize`], tagged by the request's
/// capture flag.
#[derive(Debug, Clone, PartialEq)]
pub enum Authorization {
    /// Authorized only; capture it later with the returned `retref`.
    Authorized(AuthorizationResponse),
    /// Authorized and captured in the same call.
    Captured(CaptureResponse),
}

impl Authorization {
    pub fn is_captured(&self) -> bool {
        matches!(self, Authorization::Captured(_))
    }

    pub fn response(&self) -> &Response {
        match self {
            Authorization::Authorized(res) => &res.0,
            Authorization::Captured(res) => &res.0,
        }
    }

    pub fn into_authorized(self) -> Option<AuthorizationResponse> {
        match self {
            Authorization::Authorized(res) => Some(res),
            Authorization::Captured(_) => None,
        }
    }

    pub fn into_captured(self) -> Option<CaptureResponse> {
        match self {
            Authorization::Captured(res) => Some(res),
            Authorization::Authorized(_) => None,
        }
    }
}

impl Deref for Authorization {
    type Target = Response;

    fn deref(&self) -> &Response {
        self.response()
    }
}
