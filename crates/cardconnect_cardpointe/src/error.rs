use serde_json::{Map, Value};
use thiserror::Error;

/// CardPointe-specific error types.
#[derive(Error, Debug)]
pub enum CardPointeError {
    /// Error occurred while sending the request or reading the response
    #[error("CardPointe API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway answered with a non-success HTTP status
    #[error("CardPointe API returned an error: Status={status_code}, Body='{body}'")]
    Api { status_code: u16, body: String },

    /// The response body was not the JSON the endpoint returns
    #[error("Failed to parse CardPointe API response: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required request field is missing
    #[error("Invalid request, the '{field}' field is required.")]
    Validation {
        field: String,
        input: Map<String, Value>,
    },

    /// Missing or incomplete CardPointe configuration
    #[error("CardPointe configuration missing or incomplete: {0}")]
    Config(String),
}

impl CardPointeError {
    /// HTTP status returned by the gateway, if the error carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CardPointeError::Api { status_code, .. } => Some(*status_code),
            CardPointeError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the gateway rejected the request with a 4xx status.
    pub fn is_client_error(&self) -> bool {
        matches!(self.status_code(), Some(code) if (400..500).contains(&code))
    }
}

pub type Result<T> = std::result::Result<T, CardPointeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_classification() {
        let unauthorized = CardPointeError::Api {
            status_code: 401,
            body: "Unauthorized".to_string(),
        };
        assert_eq!(unauthorized.status_code(), Some(401));
        assert!(unauthorized.is_client_error());

        let unavailable = CardPointeError::Api {
            status_code: 503,
            body: String::new(),
        };
        assert!(!unavailable.is_client_error());

        let config = CardPointeError::Config("password".to_string());
        assert_eq!(config.status_code(), None);
        assert!(!config.is_client_error());
    }

    #[test]
    fn test_validation_error_message() {
        let err = CardPointeError::Validation {
            field: "amount".to_string(),
            input: Map::new(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid request, the 'amount' field is required."
        );
    }
}
