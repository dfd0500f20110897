use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The store answered with a non-success status.
    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode store response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid store configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// Store-side error code, when the store supplied one.
    pub fn code(&self) -> Option<&str> {
        match self {
            StoreError::Rejected { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Build a rejection from a failed response body.
    pub(crate) fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorPayload>(body) {
            Ok(payload) => StoreError::Rejected {
                status,
                message: payload
                    .message
                    .unwrap_or_else(|| format!("store responded with status {status}")),
                code: payload.code,
            },
            Err(_) => StoreError::Rejected {
                status,
                message: if body.trim().is_empty() {
                    format!("store responded with status {status}")
                } else {
                    body.trim().to_string()
                },
                code: None,
            },
        }
    }
}

/// PostgREST error document.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: Option<String>,
    code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgrest_error_body_is_passed_through() {
        let err = StoreError::from_body(
            400,
            r#"{"code":"23502","details":null,"hint":null,"message":"null value in column \"title\""}"#,
        );
        assert_eq!(err.to_string(), "null value in column \"title\"");
        assert_eq!(err.code(), Some("23502"));
    }

    #[test]
    fn non_json_body_becomes_message() {
        let err = StoreError::from_body(502, "Bad Gateway");
        assert_eq!(err.to_string(), "Bad Gateway");
        assert_eq!(err.code(), None);

        let err = StoreError::from_body(503, "");
        assert_eq!(err.to_string(), "store responded with status 503");
    }
}
