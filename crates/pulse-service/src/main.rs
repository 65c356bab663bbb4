//! Pulse smoke runner - drives the realtime layer against an in-memory connection.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use pulse_config::{init_logging, init_logging_to_file, Config, Paths};
use pulse_connection::{AckBehavior, MemoryConnection};
use pulse_listener::RecordingSink;
use pulse_router::Role;
use pulse_service::RealtimeService;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

/// Pulse realtime smoke runner.
#[derive(Parser)]
#[command(name = "pulse-smoke")]
#[command(about = "Send one reliable message through a scripted connection and report the outcome")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). Defaults to the config file value
    #[arg(short, long)]
    log_level: Option<String>,

    /// Base directory for config and logs. Defaults to ~/.pulse
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Write JSONL logs under the base directory as well as stderr
    #[arg(long)]
    log_to_file: bool,

    /// Role to route the message as
    #[arg(long, default_value = "client")]
    role: Role,

    /// Acknowledgments to reject before accepting
    #[arg(long, default_value_t = 0)]
    failures: u32,

    /// Override the configured attempt bound
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Override the configured backoff unit in milliseconds
    #[arg(long)]
    backoff_ms: Option<u64>,

    /// Start disconnected and reconnect after this many milliseconds
    #[arg(long, default_value_t = 0)]
    offline_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let mut config = Config::load(&paths).context("failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.outbox.max_attempts = max_attempts.max(1);
    }
    if let Some(backoff_ms) = cli.backoff_ms {
        config.outbox.base_backoff_ms = backoff_ms;
    }

    if cli.log_to_file {
        paths
            .ensure_dirs()
            .context("failed to create log directory")?;
        init_logging_to_file(&config.log_level, &paths.log_file());
    } else {
        init_logging(&config.log_level);
    }

    let conn = Arc::new(scripted_connection(cli.failures));
    if cli.offline_ms > 0 {
        conn.set_connected(false);
    }

    let service = RealtimeService::new(conn.clone(), &config);
    let sink = Arc::new(RecordingSink::new());
    service.start(sink.clone())?;
    service.router().set_role(cli.role);

    let (id, receipt) = service.router().send_message_reliable(json!({
        "recipientId": "smoke-recipient",
        "content": "pulse smoke test",
    }))?;
    info!(id = %id, role = %cli.role, "Queued smoke message");

    if cli.offline_ms > 0 {
        tokio::time::sleep(Duration::from_millis(cli.offline_ms)).await;
        conn.set_connected(true);
        service.connection_restored();
    }

    let outcome = receipt.await;

    conn.push(
        "new-direct-message",
        json!({
            "id": "smoke-reply",
            "senderId": "smoke-recipient",
            "content": "received",
        }),
    );

    let status = service.emitter().get_queue_status();
    println!("{}", serde_json::to_string_pretty(&status)?);
    info!(
        emits = conn.total_emits(),
        inbound = sink.len(),
        "Smoke run finished"
    );

    let summary = service.shutdown();
    info!(?summary, "Service shut down");

    match outcome {
        Ok(response) => {
            let sent: SentMessage = response
                .data_as()
                .context("unexpected send-message acknowledgment")?;
            println!(
                "delivered {} after {} emit(s)",
                sent.message_id,
                conn.total_emits()
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Smoke message was not delivered");
            bail!("smoke message not delivered: {e}")
        }
    }
}

/// Data carried by a successful send-message acknowledgment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SentMessage {
    message_id: String,
}

/// Connection that rejects the first `failures` acknowledgments.
fn scripted_connection(failures: u32) -> MemoryConnection {
    let conn = MemoryConnection::new();
    let mut remaining = failures;
    conn.set_responder(move |_, _| {
        if remaining > 0 {
            remaining -= 1;
            AckBehavior::rejected("simulated failure")
        } else {
            AckBehavior::success(json!({"messageId": "smoke-1"}))
        }
    });
    conn
}
