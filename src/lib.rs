//! Rust client for [Setto](https://settopay.com) hosted wallet payments.
//!
//! The SDK hands a payment off to the hosted Setto wallet page in an external browser
//! and later resumes the host application with the outcome, delivered as a
//! [`PaymentResult`](setto_types::payment::PaymentResult).
//!
//! # Flow
//!
//! 1. The host calls [`Setto::initialize`] once with a [`SettoConfig`](setto_types::config::SettoConfig).
//! 2. [`Setto::open_payment`] builds the wallet URL, exchanging an identity-provider token
//!    for a single-use payment token first when one is configured, registers the
//!    completion handler, and asks the [`BrowserLauncher`](launcher::BrowserLauncher)
//!    to open the URL.
//! 3. The wallet redirects to the host's custom-scheme callback. The host passes the URI
//!    to [`Setto::handle_inbound_callback`], which resolves the pending handler.
//! 4. If the host process was restarted meanwhile, the result is forwarded to the host's
//!    [`EntryPoint`](launcher::EntryPoint) as a
//!    [`ForwardedPayload`](setto_types::forwarded::ForwardedPayload) and recovered with
//!    [`Setto::extract_result_from_forwarded_payload`].
//!
//! Results exist to drive UX. They are not proof of settlement; confirm payments with
//! [`Setto::get_payment_status`] or on your backend.
//!
//! # Modules
//!
//! - [`callback`]: Callback URI parsing and the correlation engine.
//! - [`client`]: The [`Setto`] facade.
//! - [`config_store`]: Holder for the process-lifetime configuration.
//! - [`error`]: The [`SettoError`] type.
//! - [`launcher`]: Browser and entry-point seams implemented by the host.
//! - [`pending`]: The single-slot completion mailbox.
//! - [`token_exchange`]: Token exchange, status queries, and wallet URL construction.
//!
//! # Concurrency
//!
//! One payment attempt at a time. Opening a second payment while one is pending
//! discards the first attempt's completion handler without invoking it.

pub mod callback;
pub mod client;
pub mod config_store;
pub mod error;
pub mod launcher;
pub mod pending;
pub mod token_exchange;

pub use callback::CallbackDisposition;
pub use client::{Setto, SettoBuilder};
pub use error::SettoError;
