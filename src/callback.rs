//! Callback correlation: matching inbound wallet results to the caller waiting for them.
//!
//! A payment attempt moves through `Idle → AwaitingExternalResult → Resolved`:
//!
//! 1. When the wallet page is opened, the caller's [`CompletionHandler`] is stored in the
//!    engine's [`PendingSlot`]. This happens strictly before the browser launch.
//! 2. The wallet redirects to `{scheme}://callback?status=..&payment_id=..&tx_hash=..`.
//!    The host hands that URI to [`CallbackEngine::dispatch`].
//! 3. If a handler is pending it is taken out of the slot and invoked exactly once
//!    ([`CallbackDisposition::Resolved`]).
//! 4. If nothing is pending (the host process was restarted in between), the result is
//!    re-packaged as a [`ForwardedPayload`] and handed to the host's [`EntryPoint`]
//!    ([`CallbackDisposition::Forwarded`]). With no entry point available the result is
//!    returned to the caller as [`CallbackDisposition::Undeliverable`] instead of being dropped.
//!
//! URIs that do not match the expected scheme and host are reported as
//! [`CallbackDisposition::NotHandled`] and leave the slot untouched.

use setto_types::config::SettoConfig;
use setto_types::forwarded::ForwardedPayload;
use setto_types::payment::{PaymentResult, PaymentStatus, SettlementDetails, non_empty};
use std::fmt;
use std::sync::{Arc, RwLock};
use url::Url;

use crate::launcher::EntryPoint;
use crate::pending::{CompletionHandler, PendingSlot};

/// Host component of every Setto callback URI.
pub const CALLBACK_HOST: &str = "callback";

/// Stand-in scheme used to parse the part of a callback URI after `://`.
const PARSE_SCHEME: &str = "setto-callback";

/// What happened to an inbound callback URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackDisposition {
    /// A pending completion handler was invoked with the result.
    Resolved,
    /// No handler was pending; the result went to the host's entry point.
    Forwarded,
    /// No handler was pending and no entry point is registered.
    Undeliverable(PaymentResult),
    /// The URI is not a Setto callback; route it elsewhere.
    NotHandled,
}

impl CallbackDisposition {
    pub fn is_handled(&self) -> bool {
        !matches!(self, CallbackDisposition::NotHandled)
    }
}

/// Parses a wallet callback URI into a [`PaymentResult`].
///
/// The scheme must equal `expected_scheme` (compared case-insensitively). Without an
/// expected scheme, as on a cold start before the SDK is initialized, any scheme starting
/// with `setto-` is accepted. The host must be `callback`. Missing or empty query
/// parameters become absent fields; a missing `status` means cancelled.
pub fn parse_callback_uri(uri: &str, expected_scheme: Option<&str>) -> Option<PaymentResult> {
    // Merchant ids may contain characters a URL scheme cannot, so the scheme is matched as
    // plain text and only the remainder goes through the URL parser.
    let (scheme, rest) = uri.trim().split_once("://")?;
    let scheme_matches = match expected_scheme {
        Some(expected) => scheme.eq_ignore_ascii_case(expected),
        None => scheme
            .to_ascii_lowercase()
            .starts_with(SettoConfig::SCHEME_PREFIX),
    };
    if !scheme_matches {
        return None;
    }
    let url = Url::parse(&format!("{PARSE_SCHEME}://{rest}")).ok()?;
    let host_matches = url
        .host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case(CALLBACK_HOST));
    if !host_matches {
        return None;
    }

    let param = |name: &str| {
        non_empty(
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value),
        )
    };
    let status = param("status");
    Some(PaymentResult {
        status: PaymentStatus::from_raw(status.as_deref()),
        tx_hash: param("tx_hash"),
        payment_id: param("payment_id"),
        error: param("error"),
        settlement: SettlementDetails {
            from_address: param("from_address"),
            to_address: param("to_address"),
            amount: param("amount"),
            chain_id: param("chain_id"),
            token_symbol: param("token_symbol"),
        },
    })
}

/// Recovers a result from a cold-start payload. Pure; never touches the pending slot.
pub fn extract_result_from_forwarded_payload(payload: &ForwardedPayload) -> Option<PaymentResult> {
    payload.extract_result()
}

/// Owns the pending completion slot and routes inbound results.
pub struct CallbackEngine {
    pending: PendingSlot,
    default_entry_point: Option<Arc<dyn EntryPoint>>,
    entry_point_override: RwLock<Option<Arc<dyn EntryPoint>>>,
}

impl CallbackEngine {
    pub fn new() -> Self {
        Self {
            pending: PendingSlot::new(),
            default_entry_point: None,
            entry_point_override: RwLock::new(None),
        }
    }

    /// Sets the entry point used when no override is registered.
    pub fn with_default_entry_point(mut self, entry_point: Arc<dyn EntryPoint>) -> Self {
        self.default_entry_point = Some(entry_point);
        self
    }

    /// Overrides (or with `None`, clears the override of) the cold-start entry point.
    pub fn set_entry_point(&self, entry_point: Option<Arc<dyn EntryPoint>>) {
        *self
            .entry_point_override
            .write()
            .unwrap_or_else(|e| e.into_inner()) = entry_point;
    }

    pub fn pending(&self) -> &PendingSlot {
        &self.pending
    }

    /// Registers the handler for the attempt about to open the wallet.
    ///
    /// A handler that is still pending is displaced and will never be invoked.
    pub fn register(&self, handler: CompletionHandler) {
        if self.pending.register(handler) {
            tracing::warn!(
                "A payment was already awaiting its result; its completion handler was discarded"
            );
        }
    }

    /// Routes an inbound callback URI. `config` supplies the expected scheme when the
    /// SDK is initialized.
    pub fn dispatch(&self, uri: &str, config: Option<&SettoConfig>) -> CallbackDisposition {
        let expected_scheme = config.map(SettoConfig::callback_scheme);
        let Some(result) = parse_callback_uri(uri, expected_scheme.as_deref()) else {
            tracing::debug!(
                expected_scheme = ?expected_scheme,
                "Inbound URI is not a Setto callback"
            );
            return CallbackDisposition::NotHandled;
        };
        self.deliver(result)
    }

    /// Delivers an already-parsed result: to the pending handler if there is one,
    /// otherwise across the cold-start boundary.
    pub fn deliver(&self, result: PaymentResult) -> CallbackDisposition {
        if let Some(handler) = self.pending.take() {
            tracing::info!(
                status = %result.status,
                payment_id = ?result.payment_id,
                "Resolving pending payment"
            );
            handler.complete(result);
            return CallbackDisposition::Resolved;
        }

        match self.entry_point() {
            Some(entry_point) => {
                tracing::info!(
                    status = %result.status,
                    payment_id = ?result.payment_id,
                    "No pending payment, forwarding result to entry point"
                );
                entry_point.launch(ForwardedPayload::from_result(&result));
                CallbackDisposition::Forwarded
            }
            None => {
                tracing::warn!(
                    status = %result.status,
                    payment_id = ?result.payment_id,
                    "No pending payment and no entry point registered, result is undeliverable"
                );
                CallbackDisposition::Undeliverable(result)
            }
        }
    }

    fn entry_point(&self) -> Option<Arc<dyn EntryPoint>> {
        let overridden = self
            .entry_point_override
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        overridden.or_else(|| self.default_entry_point.clone())
    }
}

impl Default for CallbackEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallbackEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackEngine")
            .field("pending", &self.pending)
            .field("default_entry_point", &self.default_entry_point.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use setto_types::config::Environment;
    use setto_types::forwarded::keys;
    use std::sync::Mutex;

    fn config() -> SettoConfig {
        SettoConfig::new("shop42", Environment::Dev)
    }

    fn recording_handler() -> (CompletionHandler, Arc<Mutex<Vec<PaymentResult>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler = CompletionHandler::new(move |result| sink.lock().unwrap().push(result));
        (handler, seen)
    }

    fn recording_entry_point() -> (Arc<dyn EntryPoint>, Arc<Mutex<Vec<ForwardedPayload>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let entry_point: Arc<dyn EntryPoint> =
            Arc::new(move |payload: ForwardedPayload| sink.lock().unwrap().push(payload));
        (entry_point, seen)
    }

    #[test]
    fn test_parse_success_callback() {
        let result = parse_callback_uri(
            "setto-shop42://callback?status=success&payment_id=P1&tx_hash=H1",
            Some("setto-shop42"),
        )
        .unwrap();
        assert_eq!(result.status, PaymentStatus::Success);
        assert_eq!(result.payment_id.as_deref(), Some("P1"));
        assert_eq!(result.tx_hash.as_deref(), Some("H1"));
        assert!(result.error.is_none());
        assert!(result.settlement.is_empty());
    }

    #[test]
    fn test_parse_settlement_fields() {
        let result = parse_callback_uri(
            "myapp://callback?status=success&from_address=0xA&to_address=0xB&amount=10.5&chain_id=8453&token_symbol=USDC",
            Some("myapp"),
        )
        .unwrap();
        assert_eq!(result.settlement.from_address.as_deref(), Some("0xA"));
        assert_eq!(result.settlement.to_address.as_deref(), Some("0xB"));
        assert_eq!(result.settlement.amount.as_deref(), Some("10.5"));
        assert_eq!(result.settlement.chain_id.as_deref(), Some("8453"));
        assert_eq!(result.settlement.token_symbol.as_deref(), Some("USDC"));
    }

    #[test]
    fn test_parse_degrades_gracefully() {
        let result = parse_callback_uri("setto-shop42://callback", Some("setto-shop42")).unwrap();
        assert_eq!(result, PaymentResult::cancelled());

        let result = parse_callback_uri(
            "setto-shop42://callback?status=failed&error=Insufficient%20funds&tx_hash=",
            Some("setto-shop42"),
        )
        .unwrap();
        assert_eq!(result.status, PaymentStatus::Failed);
        assert_eq!(result.error.as_deref(), Some("Insufficient funds"));
        assert!(result.tx_hash.is_none());
    }

    #[test]
    fn test_parse_rejects_foreign_uris() {
        let expected = Some("setto-shop42");
        assert!(parse_callback_uri("https://callback?status=success", expected).is_none());
        assert!(parse_callback_uri("setto-other://callback?status=success", expected).is_none());
        assert!(parse_callback_uri("setto-shop42://checkout?status=success", expected).is_none());
        assert!(parse_callback_uri("setto-shop42:callback", expected).is_none());
        assert!(parse_callback_uri("not a uri", expected).is_none());
    }

    #[test]
    fn test_parse_scheme_with_underscore() {
        let result = parse_callback_uri(
            "setto-shop_42://callback?status=success&payment_id=P1",
            Some("setto-shop_42"),
        )
        .unwrap();
        assert_eq!(result.status, PaymentStatus::Success);
        assert_eq!(result.payment_id.as_deref(), Some("P1"));

        let expected = Some("setto-shop_42");
        assert!(parse_callback_uri("Setto-Shop_42://CALLBACK?status=failed", expected).is_some());
        assert!(parse_callback_uri("setto-shop_42://callback?status=success", None).is_some());
        assert!(parse_callback_uri("setto-shop_43://callback?status=success", expected).is_none());
    }

    #[test]
    fn test_live_delivery_with_underscore_merchant() {
        let engine = CallbackEngine::new();
        let (handler, seen) = recording_handler();
        engine.register(handler);
        let config = SettoConfig::new("shop_42", Environment::Dev);

        let disposition = engine.dispatch(
            "setto-shop_42://callback?status=success&payment_id=P1",
            Some(&config),
        );

        assert_eq!(disposition, CallbackDisposition::Resolved);
        assert!(!engine.pending().is_occupied());
        assert_eq!(seen.lock().unwrap()[0].payment_id.as_deref(), Some("P1"));
    }

    #[test]
    fn test_parse_without_config_accepts_setto_prefix() {
        assert!(parse_callback_uri("setto-anyone://callback?status=success", None).is_some());
        assert!(parse_callback_uri("myapp://callback?status=success", None).is_none());
    }

    #[test]
    fn test_live_delivery_resolves_and_clears_slot() {
        let engine = CallbackEngine::new();
        let (handler, seen) = recording_handler();
        engine.register(handler);

        let disposition = engine.dispatch(
            "setto-shop42://callback?status=success&payment_id=P1&tx_hash=H1",
            Some(&config()),
        );

        assert_eq!(disposition, CallbackDisposition::Resolved);
        assert!(!engine.pending().is_occupied());
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].payment_id.as_deref(), Some("P1"));
    }

    #[test]
    fn test_unrecognized_uri_leaves_slot_untouched() {
        let engine = CallbackEngine::new();
        let (handler, seen) = recording_handler();
        engine.register(handler);

        let disposition = engine.dispatch("otherapp://callback?status=success", Some(&config()));

        assert_eq!(disposition, CallbackDisposition::NotHandled);
        assert!(!disposition.is_handled());
        assert!(engine.pending().is_occupied());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_second_registration_orphans_first() {
        let engine = CallbackEngine::new();
        let (first, first_seen) = recording_handler();
        let (second, second_seen) = recording_handler();
        engine.register(first);
        engine.register(second);

        engine.dispatch("setto-shop42://callback?status=failed", Some(&config()));

        assert!(first_seen.lock().unwrap().is_empty());
        assert_eq!(second_seen.lock().unwrap().len(), 1);
        assert_eq!(second_seen.lock().unwrap()[0].status, PaymentStatus::Failed);
    }

    #[test]
    fn test_second_callback_after_resolution_is_forwarded() {
        let (entry_point, forwarded) = recording_entry_point();
        let engine = CallbackEngine::new().with_default_entry_point(entry_point);
        let (handler, seen) = recording_handler();
        engine.register(handler);

        let uri = "setto-shop42://callback?status=success&payment_id=P1";
        assert_eq!(engine.dispatch(uri, Some(&config())), CallbackDisposition::Resolved);
        assert_eq!(engine.dispatch(uri, Some(&config())), CallbackDisposition::Forwarded);

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(forwarded.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_cold_start_forwards_payload() {
        let (entry_point, forwarded) = recording_entry_point();
        let engine = CallbackEngine::new().with_default_entry_point(entry_point);

        let disposition = engine.dispatch(
            "setto-shop42://callback?status=success&payment_id=P1&tx_hash=H1",
            None,
        );

        assert_eq!(disposition, CallbackDisposition::Forwarded);
        let forwarded = forwarded.lock().unwrap();
        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded[0].get(keys::STATUS), Some("success"));
        assert_eq!(forwarded[0].get(keys::PAYMENT_ID), Some("P1"));
        assert_eq!(forwarded[0].get(keys::TX_ID), Some("H1"));

        let result = extract_result_from_forwarded_payload(&forwarded[0]).unwrap();
        assert_eq!(result.status, PaymentStatus::Success);
        assert_eq!(result.tx_hash.as_deref(), Some("H1"));
    }

    #[test]
    fn test_override_entry_point_wins() {
        let (default_ep, default_seen) = recording_entry_point();
        let (override_ep, override_seen) = recording_entry_point();
        let engine = CallbackEngine::new().with_default_entry_point(default_ep);
        engine.set_entry_point(Some(override_ep));

        engine.deliver(PaymentResult::cancelled());
        assert!(default_seen.lock().unwrap().is_empty());
        assert_eq!(override_seen.lock().unwrap().len(), 1);

        engine.set_entry_point(None);
        engine.deliver(PaymentResult::cancelled());
        assert_eq!(default_seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_no_entry_point_is_undeliverable() {
        let engine = CallbackEngine::new();
        let disposition = engine.dispatch(
            "setto-shop42://callback?status=success&payment_id=P1",
            Some(&config()),
        );
        match &disposition {
            CallbackDisposition::Undeliverable(result) => {
                assert_eq!(result.payment_id.as_deref(), Some("P1"));
            }
            other => panic!("unexpected disposition: {other:?}"),
        }
        assert!(disposition.is_handled());
    }
}
