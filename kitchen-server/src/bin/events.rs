//! Kitchen Events - list recently received webhook events.
//!
//! Prints one JSON object per line, newest first:
//!
//! ```text
//! kitchen-events --source custom --limit 5
//! ```

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kitchen::{EventStore, PgEventStore, WebhookEvent};

#[derive(Debug, Parser)]
#[command(name = "kitchen-events", about = "List recently received webhook events")]
struct Args {
    /// Postgres connection URL
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Only list events from this source
    #[arg(long, default_value = "")]
    source: String,

    /// Maximum number of events to print
    #[arg(long, default_value_t = 20)]
    limit: u32,
}

/// Printable view of a stored event.
#[derive(Serialize)]
struct EventLine<'a> {
    id: i64,
    source: &'a str,
    event_type: &'a str,
    received_at: DateTime<Utc>,
    request_id: &'a str,
    signature: &'a str,
    headers: &'a HashMap<String, String>,
    payload_encoding: &'static str,
    payload: String,
}

impl<'a> From<&'a WebhookEvent> for EventLine<'a> {
    fn from(event: &'a WebhookEvent) -> Self {
        let (payload_encoding, payload) = match std::str::from_utf8(&event.payload) {
            Ok(text) => ("utf8", text.to_string()),
            Err(_) => ("hex", hex::encode(&event.payload)),
        };

        Self {
            id: event.id,
            source: &event.source,
            event_type: &event.event_type,
            received_at: event.received_at,
            request_id: &event.request_id,
            signature: &event.signature,
            headers: &event.headers,
            payload_encoding,
            payload,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let store = PgEventStore::connect(&args.database_url, 1)
        .await
        .context("Failed to connect to database")?;

    let events = store
        .list(&args.source, args.limit)
        .await
        .context("Failed to list events")?;

    info!(count = events.len(), source = %args.source, "events_listed");

    for event in &events {
        let line = serde_json::to_string(&EventLine::from(event)).context("Failed to encode event")?;
        println!("{line}");
    }

    Ok(())
}
