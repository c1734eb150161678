//! Pre-flight token exchange and wallet launch URL construction.
//!
//! Before the hosted wallet is opened, the SDK decides how the payment is handed over:
//!
//! - **Tokenized**: if the configuration or the request carries an identity-provider
//!   token, `POST api/external/payment/token` trades it for a single-use payment token.
//!   The wallet is then opened at `pay/wallet#pt={token}`. The token rides in the URL
//!   fragment, which browsers never send to servers, so it does not end up in access logs.
//! - **Direct**: otherwise the payment parameters are put on the query string of
//!   `pay/wallet` and no network call is made.
//!
//! The [`TokenExchangeClient`] also serves `GET api/external/payment/{payment_id}` for
//! status queries.
//!
//! ## Error Handling
//!
//! Failures map to [`SettoError`] variants capturing
//! - URL construction
//! - HTTP transport failures
//! - JSON deserialization errors and missing fields
//! - Unexpected HTTP status responses
//!
//! Requests are single-shot: there are no retries and no timeout.

use http::{HeaderMap, HeaderValue, StatusCode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use setto_types::amount::Amount;
use setto_types::config::SettoConfig;
use setto_types::payment::{PaymentInfo, PaymentRequest};
use std::fmt::Display;
use tracing::{Span, instrument};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

use crate::error::SettoError;

pub const MERCHANT_ID_HEADER: &str = "X-Merchant-ID";

/// Body of `POST api/external/payment/token`.
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest<'a> {
    pub merchant_id: &'a str,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idp_token: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    payment_token: String,
}

/// How a payment attempt reaches the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchPlan<'a> {
    /// Parameters go on the query string; no network call.
    Direct,
    /// Exchange this identity-provider token for a payment token first.
    Exchange { idp_token: &'a str },
}

impl<'a> LaunchPlan<'a> {
    /// A request-level identity-provider token wins over the configured one.
    pub fn for_request(config: &'a SettoConfig, request: &'a PaymentRequest) -> Self {
        let idp_token = request
            .idp_token
            .as_deref()
            .or(config.idp_token())
            .filter(|t| !t.is_empty());
        match idp_token {
            Some(idp_token) => LaunchPlan::Exchange { idp_token },
            None => LaunchPlan::Direct,
        }
    }
}

/// The URL the browser is pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchUrl {
    Direct(Url),
    Tokenized(Url),
}

impl LaunchUrl {
    pub fn url(&self) -> &Url {
        match self {
            LaunchUrl::Direct(url) | LaunchUrl::Tokenized(url) => url,
        }
    }

    pub fn is_tokenized(&self) -> bool {
        matches!(self, LaunchUrl::Tokenized(_))
    }

    /// Log-safe rendering: the fragment, which holds the payment token, is stripped.
    pub fn redacted(&self) -> String {
        let mut url = self.url().clone();
        if url.fragment().is_some() {
            url.set_fragment(Some("pt=<redacted>"));
        }
        url.to_string()
    }
}

/// Everything except RFC 3986 unreserved characters, matching `encodeURIComponent`.
const TOKEN_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Builds `{base}pay/wallet#pt={token}` with the token percent-encoded.
pub fn wallet_url_with_token(base: &Url, payment_token: &str) -> Result<Url, SettoError> {
    let mut url = wallet_url(base)?;
    let encoded = utf8_percent_encode(payment_token, TOKEN_ENCODE_SET).to_string();
    url.set_fragment(Some(&format!("pt={encoded}")));
    Ok(url)
}

/// Builds `{base}pay/wallet?merchant_id=..&amount=..[&order_id=..]`.
pub fn wallet_url_with_query(
    base: &Url,
    merchant_id: &str,
    amount: &Amount,
    order_id: Option<&str>,
) -> Result<Url, SettoError> {
    let mut url = wallet_url(base)?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("merchant_id", merchant_id);
        query.append_pair("amount", &amount.to_string());
        if let Some(order_id) = order_id {
            query.append_pair("order_id", order_id);
        }
    }
    Ok(url)
}

fn wallet_url(base: &Url) -> Result<Url, SettoError> {
    base.join("./pay/wallet")
        .map_err(|e| SettoError::UrlParse {
            context: "Failed to construct ./pay/wallet URL",
            source: e,
        })
}

/// HTTP client for the Setto external payment API.
#[derive(Clone, Debug, Default)]
pub struct TokenExchangeClient {
    client: Client,
}

impl TokenExchangeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured [`reqwest::Client`] (proxies, TLS roots, user agent).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Resolves the launch URL for `request`, performing the token exchange if needed.
    #[instrument(
        name = "setto.launch_url",
        skip_all,
        fields(merchant_id = %config.merchant_id(), otel.status_code = tracing::field::Empty),
        err
    )]
    pub async fn launch_url(
        &self,
        config: &SettoConfig,
        request: &PaymentRequest,
        amount: &Amount,
    ) -> Result<LaunchUrl, SettoError> {
        let base = config.api_base();
        match LaunchPlan::for_request(config, request) {
            LaunchPlan::Direct => {
                tracing::debug!("No identity-provider token, building direct wallet URL");
                let url = wallet_url_with_query(
                    &base,
                    config.merchant_id(),
                    amount,
                    request.order_id.as_deref(),
                )?;
                Ok(LaunchUrl::Direct(url))
            }
            LaunchPlan::Exchange { idp_token } => {
                let body = TokenRequest {
                    merchant_id: config.merchant_id(),
                    amount: amount.to_string(),
                    order_id: request.order_id.as_deref(),
                    idp_token: Some(idp_token),
                };
                let payment_token = self.exchange_token(&base, &body).await?;
                let url = wallet_url_with_token(&base, &payment_token)?;
                Ok(LaunchUrl::Tokenized(url))
            }
        }
    }

    /// Sends `POST api/external/payment/token` and returns the payment token.
    pub async fn exchange_token(
        &self,
        base: &Url,
        body: &TokenRequest<'_>,
    ) -> Result<String, SettoError> {
        const CONTEXT: &str = "POST /api/external/payment/token";
        let url = base
            .join("./api/external/payment/token")
            .map_err(|e| SettoError::UrlParse {
                context: "Failed to construct ./api/external/payment/token URL",
                source: e,
            })?;
        let response: TokenResponse = self
            .post_json(&url, CONTEXT, &HeaderMap::new(), body)
            .await?;
        if response.payment_token.is_empty() {
            tracing::warn!(context = CONTEXT, "Token exchange returned an empty payment_token");
            return Err(SettoError::MalformedResponse {
                context: CONTEXT,
                reason: "empty payment_token",
            });
        }
        Ok(response.payment_token)
    }

    /// Sends `GET api/external/payment/{payment_id}` on behalf of `merchant_id`.
    #[instrument(
        name = "setto.payment_status",
        skip(self, base),
        fields(otel.status_code = tracing::field::Empty),
        err
    )]
    pub async fn payment_status(
        &self,
        base: &Url,
        merchant_id: &str,
        payment_id: &str,
    ) -> Result<PaymentInfo, SettoError> {
        let mut url = base
            .join("./api/external/payment/")
            .map_err(|e| SettoError::UrlParse {
                context: "Failed to construct ./api/external/payment/ URL",
                source: e,
            })?;
        url.path_segments_mut()
            .map_err(|_| SettoError::UrlParse {
                context: "Base URL cannot carry a payment id",
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            })?
            .pop_if_empty()
            .push(payment_id);

        let mut headers = HeaderMap::new();
        let merchant =
            HeaderValue::from_str(merchant_id).map_err(|e| SettoError::InvalidHeaderValue {
                context: MERCHANT_ID_HEADER,
                source: e,
            })?;
        headers.insert(MERCHANT_ID_HEADER, merchant);

        self.get_json(&url, "GET /api/external/payment/{id}", &headers)
            .await
    }

    /// Generic POST helper that handles JSON serialization and error mapping.
    ///
    /// `context` is a human-readable identifier used in tracing and error messages.
    async fn post_json<T, R>(
        &self,
        url: &Url,
        context: &'static str,
        headers: &HeaderMap,
        payload: &T,
    ) -> Result<R, SettoError>
    where
        T: Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let req = self
            .client
            .post(url.clone())
            .headers(headers.clone())
            .json(payload);
        let http_response = req
            .send()
            .await
            .map_err(|e| SettoError::Http { context, source: e })?;
        let result = Self::read_json(http_response, context).await;
        record_result_on_span(&result);
        result
    }

    /// Generic GET helper that handles error mapping.
    async fn get_json<R>(
        &self,
        url: &Url,
        context: &'static str,
        headers: &HeaderMap,
    ) -> Result<R, SettoError>
    where
        R: serde::de::DeserializeOwned,
    {
        let req = self.client.get(url.clone()).headers(headers.clone());
        let http_response = req
            .send()
            .await
            .map_err(|e| SettoError::Http { context, source: e })?;
        let result = Self::read_json(http_response, context).await;
        record_result_on_span(&result);
        result
    }

    /// Anything but `200 OK` is a failure; the body is kept for diagnostics.
    async fn read_json<R>(
        http_response: reqwest::Response,
        context: &'static str,
    ) -> Result<R, SettoError>
    where
        R: serde::de::DeserializeOwned,
    {
        if http_response.status() == StatusCode::OK {
            http_response
                .json::<R>()
                .await
                .map_err(|e| SettoError::JsonDeserialization { context, source: e })
        } else {
            let status = http_response.status();
            let body = http_response
                .text()
                .await
                .map_err(|e| SettoError::ResponseBodyRead { context, source: e })?;
            Err(SettoError::HttpStatus {
                context,
                status,
                body,
            })
        }
    }
}

/// Records the outcome of a request on the current span.
fn record_result_on_span<R, E: Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            tracing::warn!(error = %err, "Request to Setto API failed");
        }
    }
}
