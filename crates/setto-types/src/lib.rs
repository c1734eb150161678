#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for Setto wallet payments.
//!
//! This crate provides the data model shared by the Setto SDK and the host
//! applications embedding it. It carries no I/O: everything here is plain data,
//! parsing, and serialization.
//!
//! # Overview
//!
//! A payment is handed off to the hosted Setto wallet page in an external browser.
//! When the wallet is done it redirects to a custom-scheme callback URI, which the
//! host application feeds back into the SDK. If the host process was killed in the
//! meantime, the parsed result crosses the restart as a [`forwarded::ForwardedPayload`].
//!
//! # Modules
//!
//! - [`amount`] - Decimal payment amounts parsed from human-readable strings
//! - [`config`] - SDK configuration, environments, and environment variable resolution
//! - [`forwarded`] - The string-keyed payload used to deliver results across a cold start
//! - [`payment`] - Payment requests, results, statuses, and server-side payment info

pub mod amount;
pub mod config;
pub mod forwarded;
pub mod payment;
