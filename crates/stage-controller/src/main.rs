//! Stage Controller
//!
//! Drives one call session from a JSON-lines event stream.
//!
//! # I/O
//!
//! - stdin: one `StageEvent` per line (`{"event":"user_clicked",...}`)
//! - stdout: one `StageCommand` per line, in dispatch order, followed by a
//!   final `StageSnapshot` once stdin closes
//! - stderr: logs
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Initialize tracing
//! 3. Initialize Prometheus metrics recorder
//! 4. Spawn the session actor with console collaborators
//! 5. Route stdin events until EOF
//! 6. Print the final snapshot and shut down

#![warn(clippy::pedantic)]

use stage_controller::actors::SessionActor;
use stage_controller::config::Config;
use stage_controller::console::{ConsoleDelivery, ConsoleRenderer, ConsoleSink};
use stage_controller::observability::init_metrics_recorder;
use stage_controller::stage::{StageCoordinator, StageEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long to wait for the actor to stop after cancellation.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration decides the log format, so it loads first
    let config = Config::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    // Initialize tracing. stdout carries commands, logs go to stderr.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stage_controller=debug,stage=debug".into());
    let (json_layer, text_layer) = if config.log_json {
        (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            ),
            None,
        )
    } else {
        (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    info!("Starting Stage Controller");
    info!(
        session_id = %config.session_id,
        local_participant_id = %config.local_participant_id,
        channel_last_n = ?config.channel_last_n,
        mailbox_capacity = config.mailbox_capacity,
        filmstrip_only = config.filmstrip_only,
        display_switch_delay_ms = config.display_switch_delay.as_millis(),
        "Configuration loaded successfully"
    );

    // Initialize Prometheus metrics recorder
    // This must happen before any metrics are recorded
    let prometheus_handle = init_metrics_recorder().map_err(|e| {
        error!(error = %e, "Failed to install Prometheus metrics recorder");
        e
    })?;
    info!("Prometheus metrics recorder initialized");

    // Console collaborators share one output sink
    let (sink, mut lines) = ConsoleSink::new();
    let printer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = lines.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err()
                || stdout.write_all(b"\n").await.is_err()
            {
                break;
            }
        }
        let _ = stdout.flush().await;
    });

    let coordinator = StageCoordinator::from_config(&config);
    let cancel_token = CancellationToken::new();
    let (handle, actor_task) = SessionActor::spawn(
        config.session_id.clone(),
        coordinator,
        Arc::new(ConsoleDelivery::new(sink.clone())),
        Arc::new(ConsoleRenderer::new(
            sink.clone(),
            config.display_switch_delay,
        )),
        config.mailbox_capacity,
        cancel_token.child_token(),
    );
    info!("Session actor started");

    // Route stdin events until EOF
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut line_number: u64 = 0;
    while let Some(line) = input.next_line().await? {
        line_number += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event: StageEvent = match serde_json::from_str(trimmed) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = line_number, error = %e, "Skipping unparseable event");
                continue;
            }
        };

        if let Err(e) = handle.dispatch(event).await {
            warn!(line = line_number, error = %e, "Event rejected");
        }
    }
    info!(events = line_number, "Input closed");

    // Let in-flight display switches settle before the final snapshot
    if !config.display_switch_delay.is_zero() {
        tokio::time::sleep(config.display_switch_delay).await;
    }

    let snapshot = handle.get_snapshot().await?;
    sink.emit_raw(serde_json::to_string(&snapshot)?)?;

    cancel_token.cancel();
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, actor_task).await {
        Ok(Ok(())) => info!("Session actor stopped"),
        Ok(Err(e)) => error!(error = %e, "Session actor task failed"),
        Err(_) => warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Session actor did not stop in time"
        ),
    }

    // Close the sink so the printer drains and exits
    drop(handle);
    drop(sink);
    let _ = printer.await;

    debug!(metrics = %prometheus_handle.render(), "Final metrics");
    info!("Stage Controller shutdown complete");

    Ok(())
}
