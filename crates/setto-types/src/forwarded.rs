//! Payload used to deliver a payment result across a cold start.
//!
//! When a callback arrives and no completion handler is waiting (the host process
//! was restarted while the wallet page was open), the SDK re-packages the result
//! into a [`ForwardedPayload`] and relaunches the host's entry point with it.
//! The entry point then recovers the result with [`ForwardedPayload::extract_result`].
//!
//! The payload is a flat string map under a fixed `setto_payment_` key namespace, so
//! it fits any string-keyed extras bag a platform launcher offers. It serializes as
//! a plain JSON object.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::payment::{PaymentResult, PaymentStatus, SettlementDetails, non_empty};

pub mod keys {
    pub const STATUS: &str = "setto_payment_status";
    pub const TX_ID: &str = "setto_payment_txId";
    pub const PAYMENT_ID: &str = "setto_payment_paymentId";
    pub const ERROR: &str = "setto_payment_error";
    pub const FROM_ADDRESS: &str = "setto_payment_fromAddress";
    pub const TO_ADDRESS: &str = "setto_payment_toAddress";
    pub const AMOUNT: &str = "setto_payment_amount";
    pub const CHAIN_ID: &str = "setto_payment_chainId";
    pub const TOKEN_SYMBOL: &str = "setto_payment_tokenSymbol";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForwardedPayload(BTreeMap<String, String>);

impl ForwardedPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes every present field of `result` under its namespaced key.
    pub fn from_result(result: &PaymentResult) -> Self {
        let mut payload = Self::new();
        payload.insert(keys::STATUS, result.status.as_str());
        let SettlementDetails {
            from_address,
            to_address,
            amount,
            chain_id,
            token_symbol,
        } = &result.settlement;
        let optional = [
            (keys::TX_ID, &result.tx_hash),
            (keys::PAYMENT_ID, &result.payment_id),
            (keys::ERROR, &result.error),
            (keys::FROM_ADDRESS, from_address),
            (keys::TO_ADDRESS, to_address),
            (keys::AMOUNT, amount),
            (keys::CHAIN_ID, chain_id),
            (keys::TOKEN_SYMBOL, token_symbol),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                payload.insert(key, value);
            }
        }
        payload
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether this payload carries a Setto payment result at all.
    pub fn is_setto_payload(&self) -> bool {
        self.0.contains_key(keys::STATUS)
    }

    /// Recovers the payment result.
    ///
    /// Returns `None` when the status key is absent: that is "no payload", which is
    /// different from a payload that says the payment was cancelled.
    pub fn extract_result(&self) -> Option<PaymentResult> {
        let status = self.get(keys::STATUS)?;
        Some(PaymentResult {
            status: PaymentStatus::from_raw(Some(status)),
            tx_hash: non_empty(self.get(keys::TX_ID)),
            payment_id: non_empty(self.get(keys::PAYMENT_ID)),
            error: non_empty(self.get(keys::ERROR)),
            settlement: SettlementDetails {
                from_address: non_empty(self.get(keys::FROM_ADDRESS)),
                to_address: non_empty(self.get(keys::TO_ADDRESS)),
                amount: non_empty(self.get(keys::AMOUNT)),
                chain_id: non_empty(self.get(keys::CHAIN_ID)),
                token_symbol: non_empty(self.get(keys::TOKEN_SYMBOL)),
            },
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ForwardedPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
