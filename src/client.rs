//! The [`Setto`] facade: the public operations a host application calls.

use reqwest::Client;
use setto_types::amount::Amount;
use setto_types::config::SettoConfig;
use setto_types::forwarded::ForwardedPayload;
use setto_types::payment::{PaymentInfo, PaymentRequest, PaymentResult};
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::callback::{self, CallbackDisposition, CallbackEngine};
use crate::config_store::ConfigStore;
use crate::error::SettoError;
use crate::launcher::{BrowserLauncher, EntryPoint};
use crate::pending::CompletionHandler;
use crate::token_exchange::{LaunchUrl, TokenExchangeClient};

/// Message carried by the `FAILED` result when the wallet URL could not be prepared.
pub const LAUNCH_FAILURE_MESSAGE: &str = "Failed to obtain payment token";

/// Entry point to the SDK. Keep one per process.
///
/// ## Example
///
/// ```rust,no_run
/// use setto_sdk::Setto;
/// use setto_types::config::{Environment, SettoConfig};
/// use setto_types::payment::PaymentRequest;
/// use url::Url;
///
/// # async fn run() {
/// let setto = Setto::builder(|url: &Url| println!("open {url}")).build();
/// setto.initialize(SettoConfig::new("shop42", Environment::Prod));
///
/// setto
///     .open_payment(PaymentRequest::new("10.00"), |result| {
///         println!("payment finished: {}", result.status);
///     })
///     .await;
///
/// // Later, from the host's deep-link handler:
/// let handled = setto.handle_inbound_callback("setto-shop42://callback?status=success");
/// # }
/// ```
pub struct Setto {
    config: ConfigStore,
    engine: Arc<CallbackEngine>,
    exchange: TokenExchangeClient,
    browser: Arc<dyn BrowserLauncher>,
}

/// Builder for [`Setto`].
pub struct SettoBuilder {
    browser: Arc<dyn BrowserLauncher>,
    entry_point: Option<Arc<dyn EntryPoint>>,
    http_client: Option<Client>,
}

impl SettoBuilder {
    /// Registers the default entry point for results that arrive after a cold start.
    pub fn entry_point<E: EntryPoint + 'static>(mut self, entry_point: E) -> Self {
        self.entry_point = Some(Arc::new(entry_point));
        self
    }

    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Setto {
        let engine = match self.entry_point {
            Some(entry_point) => CallbackEngine::new().with_default_entry_point(entry_point),
            None => CallbackEngine::new(),
        };
        let exchange = match self.http_client {
            Some(client) => TokenExchangeClient::with_client(client),
            None => TokenExchangeClient::new(),
        };
        Setto {
            config: ConfigStore::new(),
            engine: Arc::new(engine),
            exchange,
            browser: self.browser,
        }
    }
}

impl Setto {
    pub fn builder<B: BrowserLauncher + 'static>(browser: B) -> SettoBuilder {
        SettoBuilder {
            browser: Arc::new(browser),
            entry_point: None,
            http_client: None,
        }
    }

    /// Stores `config`, replacing any earlier configuration entirely.
    pub fn initialize(&self, config: SettoConfig) {
        tracing::info!(
            environment = %config.environment,
            merchant_id = %config.merchant_id(),
            debug = config.debug,
            "Setto SDK initialized"
        );
        self.config.initialize(config);
    }

    pub fn is_initialized(&self) -> bool {
        self.config.is_initialized()
    }

    /// The correlation engine, for hosts that route callbacks from elsewhere.
    pub fn engine(&self) -> &Arc<CallbackEngine> {
        &self.engine
    }

    /// Overrides the cold-start entry point registered on the builder.
    pub fn set_entry_point(&self, entry_point: Option<Arc<dyn EntryPoint>>) {
        self.engine.set_entry_point(entry_point);
    }

    /// Hands a payment off to the hosted wallet.
    ///
    /// `on_complete` is invoked exactly once with the outcome, unless a later call to
    /// `open_payment` displaces it before a result arrives. Failures before the wallet
    /// opens (SDK not initialized, invalid amount, token exchange failure) are delivered
    /// as a `FAILED` result and the browser is not launched.
    ///
    /// The token exchange runs on a spawned task; this future resumes on the caller's
    /// task before the handler is registered and the browser is launched.
    pub async fn open_payment<F>(&self, request: PaymentRequest, on_complete: F)
    where
        F: FnOnce(PaymentResult) + Send + 'static,
    {
        self.open_with_handler(request, CompletionHandler::new(on_complete))
            .await
    }

    /// Like [`Setto::open_payment`], completing through a channel instead of a callback.
    ///
    /// The receiver errors if the attempt is displaced by a newer one.
    pub async fn open_payment_channel(
        &self,
        request: PaymentRequest,
    ) -> oneshot::Receiver<PaymentResult> {
        let (sender, receiver) = oneshot::channel();
        self.open_with_handler(request, CompletionHandler::from_sender(sender))
            .await;
        receiver
    }

    async fn open_with_handler(&self, request: PaymentRequest, handler: CompletionHandler) {
        let config = match self.config.current() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("open_payment called before initialize");
                handler.complete(PaymentResult::failed(err.to_string()));
                return;
            }
        };
        let amount = match Amount::parse(&request.amount) {
            Ok(amount) => amount,
            Err(err) => {
                let err = SettoError::from(err);
                tracing::warn!(amount = %request.amount, error = %err, "Rejected payment request");
                handler.complete(PaymentResult::failed(err.to_string()));
                return;
            }
        };

        let launch = match self.launch_url(config.clone(), request, amount).await {
            Ok(launch) => launch,
            Err(err) => {
                tracing::warn!(error = %err, "Could not prepare wallet URL");
                handler.complete(PaymentResult::failed(LAUNCH_FAILURE_MESSAGE));
                return;
            }
        };

        if config.debug {
            tracing::info!(url = %launch.redacted(), tokenized = launch.is_tokenized(), "Opening wallet");
        } else {
            tracing::debug!(tokenized = launch.is_tokenized(), "Opening wallet");
        }
        self.engine.register(handler);
        self.browser.open(launch.url());
    }

    /// Resolves the wallet URL on a worker task and hands the outcome back.
    async fn launch_url(
        &self,
        config: Arc<SettoConfig>,
        request: PaymentRequest,
        amount: Amount,
    ) -> Result<LaunchUrl, SettoError> {
        let exchange = self.exchange.clone();
        let task =
            tokio::spawn(async move { exchange.launch_url(&config, &request, &amount).await });
        task.await?
    }

    /// Queries the server-side state of a payment.
    pub async fn get_payment_status(&self, payment_id: &str) -> Result<PaymentInfo, SettoError> {
        let config = self.config.current()?;
        self.exchange
            .payment_status(&config.api_base(), config.merchant_id(), payment_id)
            .await
    }

    /// Feeds a deep link into the SDK. Returns `false` if it is not a Setto callback,
    /// so the host can route it elsewhere.
    pub fn handle_inbound_callback(&self, uri: &str) -> bool {
        self.dispatch_callback(uri).is_handled()
    }

    /// Like [`Setto::handle_inbound_callback`], reporting what happened to the result.
    pub fn dispatch_callback(&self, uri: &str) -> CallbackDisposition {
        let config = self.config.current().ok();
        if config.as_ref().is_some_and(|c| c.debug) {
            tracing::info!(uri, "Inbound callback");
        }
        self.engine.dispatch(uri, config.as_deref())
    }

    /// Recovers a result from the payload the entry point was launched with.
    pub fn extract_result_from_forwarded_payload(
        &self,
        payload: &ForwardedPayload,
    ) -> Option<PaymentResult> {
        callback::extract_result_from_forwarded_payload(payload)
    }
}

impl fmt::Debug for Setto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setto")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
