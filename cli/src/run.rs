use clap::Parser;
use dotenvy::dotenv;
use setto_sdk::{CallbackDisposition, Setto};
use setto_types::config::SettoConfig;
use setto_types::forwarded::ForwardedPayload;
use setto_types::payment::{PaymentRequest, PaymentResult};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use url::Url;

use crate::config::{self, CliArgs, Command};
use crate::sig_down::SigDown;
use crate::telemetry;

/// Runs one `setto-cli` invocation.
///
/// - Loads `.env` variables.
/// - Installs the stderr log subscriber.
/// - Loads the configuration file and dispatches the subcommand.
pub async fn run() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    telemetry::init();

    let args = CliArgs::parse();
    match args.command {
        Command::Pay {
            amount,
            order_id,
            idp_token,
        } => {
            let config = config::load(&args.config)?;
            let mut request = PaymentRequest::new(amount);
            request.order_id = order_id;
            request.idp_token = idp_token;
            pay(config, request).await
        }
        Command::Callback { uri } => {
            // A cold-started host may receive the deep link before it is configured.
            let config = config::load(&args.config)
                .inspect_err(|e| tracing::warn!("Continuing without configuration: {e}"))
                .ok();
            callback(config, &uri)
        }
        Command::Status { payment_id } => {
            let config = config::load(&args.config)?;
            status(config, &payment_id).await
        }
    }
}

fn print_to_terminal(url: &Url) {
    println!("Open this URL to pay:\n{url}");
}

fn print_result(result: &PaymentResult) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

async fn pay(config: SettoConfig, request: PaymentRequest) -> Result<(), Box<dyn Error>> {
    let setto = Setto::builder(print_to_terminal).build();
    let scheme = config.callback_scheme();
    setto.initialize(config);

    let sig_down = SigDown::try_new()?;
    let interrupted = sig_down.cancellation_token();
    let mut receiver = setto.open_payment_channel(request).await;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!("Paste the {scheme}://callback URI the wallet redirects to:");

    let outcome = loop {
        tokio::select! {
            biased;
            result = &mut receiver => break Some(result?),
            _ = interrupted.cancelled() => break None,
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Err("stdin closed before the payment resolved".into());
                };
                let uri = line.trim();
                if uri.is_empty() {
                    continue;
                }
                if !setto.handle_inbound_callback(uri) {
                    tracing::warn!(uri, "Ignoring URI that is not a callback for this merchant");
                }
            }
        }
    };
    sig_down.shutdown().await;

    match outcome {
        Some(result) => print_result(&result),
        None => Err("Interrupted before the payment resolved".into()),
    }
}

fn callback(config: Option<SettoConfig>, uri: &str) -> Result<(), Box<dyn Error>> {
    let relaunched: Arc<Mutex<Option<ForwardedPayload>>> = Arc::default();
    let inbox = relaunched.clone();
    let setto = Setto::builder(print_to_terminal)
        .entry_point(move |payload: ForwardedPayload| {
            *inbox.lock().unwrap_or_else(|e| e.into_inner()) = Some(payload);
        })
        .build();
    if let Some(config) = config {
        setto.initialize(config);
    }

    match setto.dispatch_callback(uri) {
        CallbackDisposition::NotHandled => Err(format!("Not a Setto callback: {uri}").into()),
        CallbackDisposition::Undeliverable(result) => print_result(&result),
        CallbackDisposition::Resolved | CallbackDisposition::Forwarded => {
            let payload = relaunched
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .take()
                .ok_or("Entry point was not launched")?;
            let result = setto
                .extract_result_from_forwarded_payload(&payload)
                .ok_or("Forwarded payload carries no payment result")?;
            print_result(&result)
        }
    }
}

async fn status(config: SettoConfig, payment_id: &str) -> Result<(), Box<dyn Error>> {
    let setto = Setto::builder(print_to_terminal).build();
    setto.initialize(config);
    let info = setto.get_payment_status(payment_id).await?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
