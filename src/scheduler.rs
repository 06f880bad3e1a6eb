// src/scheduler.rs
use chrono::Utc;
use metrics::gauge;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::Schedule;
use crate::cycle::run_cycle;
use crate::feed::FeedSource;
use crate::ledger::Ledger;
use crate::publisher::StatusPublisher;

/// Drive cycles forever: once immediately at startup, then per the schedule.
///
/// The cycle future is awaited inline, so two cycles can never overlap and
/// the ledger keeps its single writer. A hung network call delays the next
/// tick; it never stacks a second cycle on top.
pub async fn run(
    schedule: Schedule,
    feed: &dyn FeedSource,
    publisher: &dyn StatusPublisher,
    ledger: &mut Ledger,
) {
    match schedule {
        Schedule::Every(period) => {
            let mut ticker = interval(period);
            // A slow cycle delays the next tick instead of bursting to catch up.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // The first tick completes immediately: the startup cycle.
                ticker.tick().await;
                tick(feed, publisher, ledger).await;
            }
        }
        Schedule::DailyAt { hour, minute } => {
            tick(feed, publisher, ledger).await;
            loop {
                tokio::time::sleep(until_next(hour, minute)).await;
                tick(feed, publisher, ledger).await;
            }
        }
    }
}

async fn tick(feed: &dyn FeedSource, publisher: &dyn StatusPublisher, ledger: &mut Ledger) {
    let outcome = run_cycle(feed, publisher, ledger).await;
    gauge!("cycle_last_run_ts").set(Utc::now().timestamp().max(0) as f64);
    tracing::info!(
        target: "cycle",
        outcome = ?outcome,
        posted = ledger.len(),
        "poll tick done"
    );
}

/// Wall-clock duration until the next daily occurrence of hour:minute UTC.
fn until_next(hour: u32, minute: u32) -> std::time::Duration {
    const DAY: std::time::Duration = std::time::Duration::from_secs(24 * 3600);

    let now = Utc::now().naive_utc();
    let at = match now.date().and_hms_opt(hour, minute, 0) {
        Some(t) => t,
        None => return DAY, // config validation keeps this unreachable
    };
    let next = if at > now { at } else { at + chrono::Duration::days(1) };
    (next - now).to_std().unwrap_or(DAY)
}
