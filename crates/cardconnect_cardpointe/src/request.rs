use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CardPointeError, Result};

/// Payload of an `auth` call.
///
/// A flat bag of gateway fields. The named setters cover the documented
/// fields; anything else goes through [`AuthorizationRequest::set`]. Nothing
/// is validated unless the caller runs [`AuthorizationRequest::validate_required`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorizationRequest {
    fields: Map<String, Value>,
}

impl AuthorizationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Sets any gateway field, replacing a previous value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    fn set_text(self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, Value::String(value.into()))
    }

    /// Card number or token.
    pub fn account(self, account: impl Into<String>) -> Self {
        self.set_text("account", account)
    }

    /// Either a number or a decimal string such as `"5.00"`.
    pub fn amount(self, amount: impl Into<Value>) -> Self {
        self.set("amount", amount)
    }

    /// Card expiry, `MMYY`.
    pub fn expiry(self, expiry: impl Into<String>) -> Self {
        self.set_text("expiry", expiry)
    }

    /// `true`, `"Y"` or `"y"` authorizes and captures in one call.
    pub fn capture(self, capture: impl Into<Value>) -> Self {
        self.set("capture", capture)
    }

    /// `"Y"` to create a profile, or `"{profileid}/{acctid}"` to charge a stored one.
    pub fn profile(self, profile: impl Into<String>) -> Self {
        self.set_text("profile", profile)
    }

    pub fn cvv2(self, cvv2: impl Into<String>) -> Self {
        self.set_text("cvv2", cvv2)
    }

    pub fn name(self, name: impl Into<String>) -> Self {
        self.set_text("name", name)
    }

    pub fn address(self, address: impl Into<String>) -> Self {
        self.set_text("address", address)
    }

    pub fn city(self, city: impl Into<String>) -> Self {
        self.set_text("city", city)
    }

    pub fn region(self, region: impl Into<String>) -> Self {
        self.set_text("region", region)
    }

    pub fn country(self, country: impl Into<String>) -> Self {
        self.set_text("country", country)
    }

    pub fn postal(self, postal: impl Into<String>) -> Self {
        self.set_text("postal", postal)
    }

    pub fn email(self, email: impl Into<String>) -> Self {
        self.set_text("email", email)
    }

    pub fn orderid(self, orderid: impl Into<String>) -> Self {
        self.set_text("orderid", orderid)
    }

    /// `E` e-commerce, `R` recurring, `T` telephone.
    pub fn ecomind(self, ecomind: impl Into<String>) -> Self {
        self.set_text("ecomind", ecomind)
    }

    /// Overrides the client's currency for this authorization.
    pub fn currency(self, currency: impl Into<String>) -> Self {
        self.set_text("currency", currency)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// True only for a capture field of boolean `true`, `"Y"` or `"y"`.
    pub fn is_capture(&self) -> bool {
        match self.get("capture") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(flag)) => flag == "Y" || flag == "y",
            _ => false,
        }
    }

    /// Checks that every field in `required` is present.
    pub fn validate_required(&self, required: &[&str]) -> Result<()> {
        validate_input(required, &self.fields)
    }
}

impl From<Map<String, Value>> for AuthorizationRequest {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_fields(fields)
    }
}

/// Fails with [`CardPointeError::Validation`] on the first field of
/// `required` missing from `input`.
pub fn validate_input(required: &[&str], input: &Map<String, Value>) -> Result<()> {
    match required.iter().find(|field| !input.contains_key(**field)) {
        Some(field) => Err(CardPointeError::Validation {
            field: field.to_string(),
            input: input.clone(),
        }),
        None => Ok(()),
    }
}
