//! Typed errors for provider calls
//!
//! Callers branch on [`LlmError::kind`] instead of matching message text.

use thiserror::Error;

/// Coarse classification surfaced to the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Network trouble, rate limiting or a server-side failure
    Transient,
    /// Missing, invalid or expired credentials
    Auth,
    Other,
}

/// Provider operation errors
///
/// - `Unauthorized` (401) - key missing or rejected
/// - `RateLimited` (429) - quota exceeded
/// - `BadRequest` (400) - malformed request
/// - `ServiceError` (5xx) - server-side issue
/// - `Network` - connection/timeout
/// - `MalformedResponse` - the reply body could not be decoded
/// - `Other` - catch-all
///
/// None of these are retried automatically; the user asks for a retry explicitly.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl LlmError {
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            LlmError::Unauthorized(_) => ProviderErrorKind::Auth,
            LlmError::RateLimited(_) | LlmError::ServiceError(_) | LlmError::Network(_) => {
                ProviderErrorKind::Transient
            }
            LlmError::BadRequest(_) | LlmError::MalformedResponse(_) | LlmError::Other(_) => {
                ProviderErrorKind::Other
            }
        }
    }

    /// Sentence read to the user when a call fails
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ProviderErrorKind::Transient => {
                "Il servizio non risponde in questo momento. Riprova tra poco."
            }
            ProviderErrorKind::Auth => {
                "Non riesco ad accedere al servizio. Controlla la chiave di accesso."
            }
            ProviderErrorKind::Other => "Si è verificato un errore nella richiesta.",
        }
    }

    /// Convert HTTP status code and error text into typed LlmError
    pub fn from_http_status(status: reqwest::StatusCode, error_text: String) -> Self {
        match status.as_u16() {
            401 | 403 => LlmError::Unauthorized(error_text),
            429 => LlmError::RateLimited(error_text),
            400 => LlmError::BadRequest(error_text),
            500..=599 => LlmError::ServiceError(error_text),
            _ => LlmError::Other(anyhow::anyhow!("HTTP {}: {}", status, error_text)),
        }
    }

    /// Convert network/connection errors into typed LlmError
    pub fn from_network_error(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Network(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            LlmError::Network(format!("Connection failed: {}", e))
        } else if let Some(status) = e.status() {
            let error_text = e.to_string();
            Self::from_http_status(status, error_text)
        } else if e.is_decode() {
            LlmError::MalformedResponse(e.to_string())
        } else {
            LlmError::Other(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_is_auth() {
        let err = LlmError::Unauthorized("invalid x-api-key".to_string());
        assert_eq!(err.kind(), ProviderErrorKind::Auth);
    }

    #[test]
    fn test_transient_variants() {
        for err in [
            LlmError::RateLimited("slow down".into()),
            LlmError::ServiceError("overloaded".into()),
            LlmError::Network("timeout".into()),
        ] {
            assert_eq!(err.kind(), ProviderErrorKind::Transient, "{err}");
        }
    }

    #[test]
    fn test_malformed_response_is_other() {
        let err = LlmError::MalformedResponse("missing content".into());
        assert_eq!(err.kind(), ProviderErrorKind::Other);
    }

    #[test]
    fn test_from_http_status() {
        let err = LlmError::from_http_status(
            reqwest::StatusCode::UNAUTHORIZED,
            "Invalid token".to_string(),
        );
        assert!(matches!(err, LlmError::Unauthorized(_)));

        let err = LlmError::from_http_status(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded".to_string(),
        );
        assert!(matches!(err, LlmError::RateLimited(_)));

        let err = LlmError::from_http_status(
            reqwest::StatusCode::BAD_REQUEST,
            "Invalid model".to_string(),
        );
        assert!(matches!(err, LlmError::BadRequest(_)));

        let err = LlmError::from_http_status(
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
            "Overloaded".to_string(),
        );
        assert!(matches!(err, LlmError::ServiceError(_)));

        let err = LlmError::from_http_status(reqwest::StatusCode::IM_A_TEAPOT, "?".to_string());
        assert!(matches!(err, LlmError::Other(_)));
    }

    #[test]
    fn test_user_message_differs_by_kind() {
        let auth = LlmError::Unauthorized(String::new());
        let net = LlmError::Network(String::new());
        assert_ne!(auth.user_message(), net.user_message());
    }
}
