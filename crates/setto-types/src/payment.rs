//! Payment requests, results, and server-side payment information.
//!
//! A [`PaymentRequest`] is created by the caller for every payment attempt.
//! The attempt ends with exactly one [`PaymentResult`], built either from the
//! wallet's callback URI or from a cold-start [`ForwardedPayload`](crate::forwarded::ForwardedPayload).
//!
//! Results drive UX state only. They are never proof of settlement; use the
//! status endpoint ([`PaymentInfo`]) or your own backend for that.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single payment attempt as requested by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Decimal amount as entered by the caller, e.g. `"10.50"`.
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Per-request identity-provider token; takes precedence over the configured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idp_token: Option<String>,
}

impl PaymentRequest {
    pub fn new<S: Into<String>>(amount: S) -> Self {
        Self {
            amount: amount.into(),
            order_id: None,
            idp_token: None,
        }
    }

    pub fn with_order_id<S: Into<String>>(mut self, order_id: S) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_idp_token<S: Into<String>>(mut self, idp_token: S) -> Self {
        self.idp_token = Some(idp_token.into());
        self
    }
}

/// Terminal outcome of a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    /// Maps a raw status string to a status.
    ///
    /// `"success"` and `"failed"` map to their variants. Anything else, including a
    /// missing value, is [`PaymentStatus::Cancelled`].
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("success") => PaymentStatus::Success,
            Some(s) if s.eq_ignore_ascii_case("failed") => PaymentStatus::Failed,
            _ => PaymentStatus::Cancelled,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement details the wallet may attach to a callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
}

impl SettlementDetails {
    pub fn is_empty(&self) -> bool {
        self == &SettlementDetails::default()
    }
}

/// The outcome of one payment attempt, delivered to the completion handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub status: PaymentStatus,
    /// On-chain transaction hash, when the wallet reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "SettlementDetails::is_empty")]
    pub settlement: SettlementDetails,
}

impl PaymentResult {
    pub fn new(status: PaymentStatus) -> Self {
        Self {
            status,
            tx_hash: None,
            payment_id: None,
            error: None,
            settlement: SettlementDetails::default(),
        }
    }

    pub fn failed<S: Into<String>>(message: S) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::new(PaymentStatus::Failed)
        }
    }

    pub fn cancelled() -> Self {
        Self::new(PaymentStatus::Cancelled)
    }

    pub fn is_success(&self) -> bool {
        self.status == PaymentStatus::Success
    }
}

/// Payment state as reported by `GET api/external/payment/{payment_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub payment_id: String,
    /// Server-side status, e.g. `"pending"` or `"completed"`.
    pub status: String,
    pub amount: String,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

/// Turns an empty or whitespace-only value into `None`.
pub fn non_empty<S: AsRef<str>>(value: Option<S>) -> Option<String> {
    value
        .map(|v| v.as_ref().trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_is_total() {
        assert_eq!(PaymentStatus::from_raw(Some("success")), PaymentStatus::Success);
        assert_eq!(PaymentStatus::from_raw(Some("SUCCESS")), PaymentStatus::Success);
        assert_eq!(PaymentStatus::from_raw(Some("failed")), PaymentStatus::Failed);
        assert_eq!(PaymentStatus::from_raw(Some("cancelled")), PaymentStatus::Cancelled);
        assert_eq!(PaymentStatus::from_raw(Some("pending")), PaymentStatus::Cancelled);
        assert_eq!(PaymentStatus::from_raw(Some("")), PaymentStatus::Cancelled);
        assert_eq!(PaymentStatus::from_raw(None), PaymentStatus::Cancelled);
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [PaymentStatus::Success, PaymentStatus::Failed, PaymentStatus::Cancelled] {
            assert_eq!(PaymentStatus::from_raw(Some(status.as_str())), status);
        }
    }

    #[test]
    fn test_failed_result_carries_message() {
        let result = PaymentResult::failed("boom");
        assert_eq!(result.status, PaymentStatus::Failed);
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert!(result.tx_hash.is_none());
        assert!(result.settlement.is_empty());
    }

    #[test]
    fn test_payment_info_requires_status() {
        let body = r#"{"payment_id":"P1","amount":"10","currency":"USDC","created_at":"2026-01-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<PaymentInfo>(body).is_err());
    }

    #[test]
    fn test_payment_info_optional_fields() {
        let body = r#"{"payment_id":"P1","status":"completed","amount":"10","currency":"USDC","created_at":"2026-01-01T00:00:00Z","tx_hash":"0xabc"}"#;
        let info: PaymentInfo = serde_json::from_str(body).unwrap();
        assert_eq!(info.status, "completed");
        assert_eq!(info.tx_hash.as_deref(), Some("0xabc"));
        assert!(info.completed_at.is_none());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some(" x ")), Some("x".to_string()));
        assert_eq!(non_empty::<&str>(None), None);
    }
}
