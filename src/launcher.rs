//! Host-side collaborators the SDK drives but does not implement.
//!
//! The SDK never presents UI itself. It asks a [`BrowserLauncher`] to show the wallet
//! page and, on a cold start, asks an [`EntryPoint`] to relaunch the host application
//! with a [`ForwardedPayload`]. Both are fire-and-forget.
//!
//! Plain closures implement both traits:
//!
//! ```rust
//! use setto_sdk::launcher::{BrowserLauncher, EntryPoint};
//! use setto_types::forwarded::ForwardedPayload;
//! use url::Url;
//!
//! let browser = |url: &Url| println!("open {url}");
//! let entry_point = |payload: ForwardedPayload| println!("{payload:?}");
//! # fn assert_traits(_: impl BrowserLauncher, _: impl EntryPoint) {}
//! # assert_traits(browser, entry_point);
//! ```

use setto_types::forwarded::ForwardedPayload;
use url::Url;

/// Opens a URL in an external, trusted rendering context (system browser or custom tab).
///
/// Success or failure of the launch is not observed.
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &Url);
}

impl<F> BrowserLauncher for F
where
    F: Fn(&Url) + Send + Sync,
{
    fn open(&self, url: &Url) {
        self(url)
    }
}

/// The host application's designated entry point for results that arrive while no
/// completion handler is waiting.
///
/// Implementations relaunch the host as a fresh task, discarding any existing
/// back stack, and hand it `payload`. The host then calls
/// [`crate::Setto::extract_result_from_forwarded_payload`].
pub trait EntryPoint: Send + Sync {
    fn launch(&self, payload: ForwardedPayload);
}

impl<F> EntryPoint for F
where
    F: Fn(ForwardedPayload) + Send + Sync,
{
    fn launch(&self, payload: ForwardedPayload) {
        self(payload)
    }
}
