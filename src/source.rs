//! Inbound event adapter.
//!
//! Events arrive one per line: either a fedmsg JSON envelope carrying a
//! `topic` field, or a bare topic string. Each recognised topic bumps its
//! category counter; everything else is dropped without complaint.

use crate::aggregator::CounterTable;
use crate::taxonomy::Taxonomy;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::borrow::Cow;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tracing::debug;

/// The only envelope field the bridge reads.
#[derive(Debug, Deserialize)]
struct Envelope {
    topic: String,
}

/// Outcome counts for one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub counted: u64,
    pub dropped: u64,
}

/// Extract the topic from one input line.
pub fn topic_of(line: &str) -> Option<Cow<'_, str>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if line.starts_with('{') {
        match serde_json::from_str::<Envelope>(line) {
            Ok(envelope) => Some(Cow::Owned(envelope.topic)),
            Err(e) => {
                debug!("Skipping unparsable envelope: {}", e);
                None
            }
        }
    } else {
        Some(Cow::Borrowed(line))
    }
}

/// Route a single topic to its counter. Returns whether it was counted.
pub fn route(topic: &str, taxonomy: &Taxonomy, table: &CounterTable) -> bool {
    match taxonomy.category_of(topic) {
        Some(category) => table.increment(category),
        None => {
            debug!(topic, "Dropping event with no known category");
            false
        }
    }
}

/// Read events until end of input or shutdown, counting each one.
pub async fn ingest<R>(
    reader: R,
    taxonomy: &Taxonomy,
    table: &CounterTable,
    mut shutdown: watch::Receiver<bool>,
) -> Result<IngestStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = IngestStats::default();

    loop {
        let line = tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
            line = lines.next_line() => line.context("Failed to read inbound events")?,
        };

        let Some(line) = line else {
            break;
        };

        let counted = topic_of(&line)
            .map(|topic| route(&topic, taxonomy, table))
            .unwrap_or(false);
        if counted {
            stats.counted += 1;
        } else {
            stats.dropped += 1;
        }
    }

    Ok(stats)
}
