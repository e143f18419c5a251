//! Fixed-cadence flush scheduling.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Call `on_tick` once per `period` until `shutdown` flips to `true`.
///
/// The first tick fires one full period after start. When `on_tick` overruns
/// the period, one catch-up tick fires as soon as it returns and the cadence
/// restarts from there; missed ticks are never queued. Shutdown is only
/// observed between ticks, so an in-flight `on_tick` always completes.
///
/// Returns the number of ticks fired.
pub async fn run<F, Fut>(
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut on_tick: F,
) -> u64
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut fired = 0u64;
    if *shutdown.borrow() {
        return fired;
    }

    loop {
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                fired += 1;
                debug!(tick = fired, "Scheduler tick");
                on_tick().await;
            }
        }
    }

    info!(ticks = fired, "Scheduler stopped");
    fired
}
