//! Wiring between the event stream, the counter table and the sink.
//!
//! Ingestion runs on the caller's task and only ever touches the counter
//! table. The scheduler runs on its own task and owns the sink; it drains
//! the table, releases the lock, then formats and writes the line.

use crate::aggregator::{CounterTable, Snapshot};
use crate::config::Config;
use crate::error::BridgeError;
use crate::formatter::format_putval;
use crate::scheduler;
use crate::sink::MetricsSink;
use crate::source::{self, IngestStats};
use crate::taxonomy::Taxonomy;
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufRead;
use tokio::sync::watch;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// What a finished run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ingest: IngestStats,
    pub ticks: u64,
}

/// A configured bridge, ready to run.
#[derive(Debug)]
pub struct Bridge {
    table: Arc<CounterTable>,
    taxonomy: Taxonomy,
    host: String,
    interval_secs: u64,
}

impl Bridge {
    /// Validate `config` and build the counter table from its category set.
    pub fn new(config: &Config) -> Result<Self, BridgeError> {
        config.validate()?;

        let taxonomy = Taxonomy::new(&config.taxonomy);
        let table = Arc::new(CounterTable::new(taxonomy.categories().iter().cloned()));
        let host = config
            .collectd
            .host
            .clone()
            .unwrap_or_else(local_hostname);

        Ok(Self {
            table,
            taxonomy,
            host,
            interval_secs: config.collectd.interval,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Drain the table and render the report line for `timestamp_secs`.
    pub fn render(&self, timestamp_secs: i64) -> (Snapshot, String) {
        let snapshot = self.table.drain_and_reset();
        let line = format_putval(
            &self.host,
            self.interval_secs,
            timestamp_secs,
            &snapshot.values(),
        );
        (snapshot, line)
    }

    /// One scheduled flush: drain, format and emit.
    ///
    /// The counter lock is released before the sink is touched. An emit that
    /// fails, or does not finish within one interval, loses that interval's
    /// counts; they are already reset.
    pub async fn flush(&self, sink: &mut dyn MetricsSink) -> Result<Snapshot, BridgeError> {
        let (snapshot, line) = self.render(Utc::now().timestamp());
        debug!(total = snapshot.total(), "Flushing counters");

        let deadline = self.interval();
        tokio::time::timeout(deadline, sink.emit(&line))
            .await
            .map_err(|_| BridgeError::SinkTimeout(deadline))??;
        Ok(snapshot)
    }

    /// Count events from `reader` and report on schedule until `shutdown`.
    ///
    /// End of input stops ingestion only; reporting continues until shutdown.
    pub async fn run<R, S>(
        self,
        reader: R,
        sink: S,
        shutdown: watch::Receiver<bool>,
    ) -> Result<RunSummary>
    where
        R: AsyncBufRead + Unpin,
        S: MetricsSink + 'static,
    {
        let bridge = Arc::new(self);

        info!(
            host = %bridge.host,
            interval_secs = bridge.interval_secs,
            categories = bridge.table.category_count(),
            "Starting collectd bridge"
        );
        debug!("Categories: {}", bridge.table.categories().join(","));

        let ticker = {
            let bridge = Arc::clone(&bridge);
            let shutdown = shutdown.clone();
            let sink = Arc::new(Mutex::new(sink));
            tokio::spawn(async move {
                let period = bridge.interval();
                scheduler::run(period, shutdown, move || {
                    let bridge = Arc::clone(&bridge);
                    let sink = Arc::clone(&sink);
                    async move {
                        let mut sink = sink.lock().await;
                        if let Err(e) = bridge.flush(&mut *sink).await {
                            error!("Dropping interval report: {}", e);
                        }
                    }
                })
                .await
            })
        };

        let ingested = source::ingest(reader, &bridge.taxonomy, &bridge.table, shutdown).await;
        let ingest = match ingested {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Event input failed: {:#}", e);
                IngestStats::default()
            }
        };
        info!(
            counted = ingest.counted,
            dropped = ingest.dropped,
            "Event input closed"
        );

        let ticks = ticker.await.context("Scheduler task failed")?;
        Ok(RunSummary { ingest, ticks })
    }
}

/// The kernel's hostname, as `gethostname(2)` reports it.
fn local_hostname() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}
