//! Single-slot mailbox for the completion handler awaiting the next result.

use setto_types::payment::PaymentResult;
use std::fmt;
use std::sync::Mutex;
use tokio::sync::oneshot;

/// A completion callback for one payment attempt. Invoked at most once.
pub struct CompletionHandler(Box<dyn FnOnce(PaymentResult) + Send + 'static>);

impl CompletionHandler {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(PaymentResult) + Send + 'static,
    {
        Self(Box::new(f))
    }

    /// Completes through a channel. If the handler is dropped uninvoked (the attempt
    /// was displaced by a newer one), the receiver observes a closed channel.
    pub fn from_sender(sender: oneshot::Sender<PaymentResult>) -> Self {
        Self::new(move |result| {
            // The receiver may have given up waiting; nothing to do then.
            let _ = sender.send(result);
        })
    }

    pub fn complete(self, result: PaymentResult) {
        (self.0)(result)
    }
}

impl fmt::Debug for CompletionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CompletionHandler")
    }
}

/// Holds at most one [`CompletionHandler`].
///
/// Registering while occupied drops the previous handler without invoking it;
/// callers are expected to run one payment attempt at a time.
#[derive(Debug, Default)]
pub struct PendingSlot {
    slot: Mutex<Option<CompletionHandler>>,
}

impl PendingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `handler`. Returns `true` if an earlier handler was displaced.
    pub fn register(&self, handler: CompletionHandler) -> bool {
        let displaced = self
            .slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(handler);
        displaced.is_some()
    }

    /// Removes and returns the pending handler, leaving the slot empty.
    pub fn take(&self) -> Option<CompletionHandler> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    pub fn is_occupied(&self) -> bool {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}
