use http::StatusCode;
use setto_types::amount::AmountParseError;

/// Errors that can occur while driving a payment or talking to the Setto API.
///
/// The payment flow itself never returns these to the caller: [`crate::Setto::open_payment`]
/// folds them into a `FAILED` [`setto_types::payment::PaymentResult`]. They surface
/// directly only from [`crate::Setto::get_payment_status`] and configuration checks.
#[derive(Debug, thiserror::Error)]
pub enum SettoError {
    #[error("Setto SDK is not initialized")]
    NotInitialized,
    #[error("Invalid payment amount: {0}")]
    InvalidAmount(#[from] AmountParseError),
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        context: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("HTTP error: {context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Invalid header value for {context}: {source}")]
    InvalidHeaderValue {
        context: &'static str,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
    #[error("Malformed response: {context}: {reason}")]
    MalformedResponse {
        context: &'static str,
        reason: &'static str,
    },
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        context: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("Failed to read response body as text: {context}: {source}")]
    ResponseBodyRead {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Token exchange task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SettoError {
    /// Transport failures and unexpected statuses.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            SettoError::Http { .. }
                | SettoError::HttpStatus { .. }
                | SettoError::ResponseBodyRead { .. }
                | SettoError::Task(_)
        )
    }

    /// A 200 response whose body did not carry the expected fields.
    pub fn is_malformed_response(&self) -> bool {
        matches!(
            self,
            SettoError::JsonDeserialization { .. } | SettoError::MalformedResponse { .. }
        )
    }
}
