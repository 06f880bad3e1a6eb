// src/cycle.rs
use metrics::{counter, describe_counter, describe_gauge};
use once_cell::sync::OnceCell;

use crate::feed::FeedSource;
use crate::image::first_image_src;
use crate::ledger::{identity_key, Ledger};
use crate::publisher::StatusPublisher;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("cycle_runs_total", "Poll cycles started.");
        describe_counter!("cycle_noop_total", "Cycles that found nothing new to post.");
        describe_counter!("feed_errors_total", "Feed fetch/parse failures.");
        describe_counter!(
            "media_upload_failures_total",
            "Image uploads that fell back to text-only."
        );
        describe_counter!(
            "publish_success_total",
            "Statuses accepted by the posting API."
        );
        describe_counter!(
            "publish_failures_total",
            "Status posts rejected or unreachable."
        );
        describe_counter!(
            "ledger_write_failures_total",
            "Posted-file writes that failed after a publish."
        );
        describe_gauge!("cycle_last_run_ts", "Unix ts when the last cycle ran.");
    });
}

/// Terminal state of a single poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Feed empty or unreachable; nothing to do until the next tick.
    NoEntry,
    /// Newest entry is already in the ledger.
    AlreadyPosted,
    /// Publish failed; the ledger is untouched so the entry retries next tick.
    PublishFailed,
    /// Posted and recorded.
    Published,
}

/// Run one fetch → dedupe → enrich → publish → commit pass.
///
/// The exclusive `&mut Ledger` borrow is the single-writer guarantee: no
/// other mutator can exist while a cycle is in flight. Every failure is
/// converted to an outcome here; nothing escapes to kill the scheduler.
pub async fn run_cycle(
    feed: &dyn FeedSource,
    publisher: &dyn StatusPublisher,
    ledger: &mut Ledger,
) -> CycleOutcome {
    ensure_metrics_described();
    counter!("cycle_runs_total").increment(1);

    let entry = match feed.fetch_latest().await {
        Ok(Some(entry)) => entry,
        Ok(None) => {
            tracing::info!(source = feed.name(), "feed returned no entries");
            counter!("cycle_noop_total").increment(1);
            return CycleOutcome::NoEntry;
        }
        Err(e) => {
            tracing::warn!(error = ?e, source = feed.name(), "feed fetch failed");
            counter!("feed_errors_total").increment(1);
            counter!("cycle_noop_total").increment(1);
            return CycleOutcome::NoEntry;
        }
    };

    let key = identity_key(&entry.guid, &entry.link);
    if ledger.contains(&key) {
        tracing::info!(title = %entry.title, "no update, newest entry already posted");
        counter!("cycle_noop_total").increment(1);
        return CycleOutcome::AlreadyPosted;
    }

    tracing::info!(title = %entry.title, link = %entry.link, "new entry, publishing");

    let media_id = match first_image_src(&entry.description) {
        Some(image_url) => {
            let id = publisher.upload_media(&image_url).await;
            if id.is_none() {
                counter!("media_upload_failures_total").increment(1);
            }
            id
        }
        None => None,
    };

    if let Err(e) = publisher
        .post_status(&entry.title, &entry.link, media_id.as_deref())
        .await
    {
        tracing::warn!(error = ?e, title = %entry.title, "publish failed, will retry next tick");
        counter!("publish_failures_total").increment(1);
        return CycleOutcome::PublishFailed;
    }
    counter!("publish_success_total").increment(1);

    // The post is already out; a failed write only risks a duplicate after
    // a restart, never a rollback.
    if let Err(e) = ledger.record(key).await {
        tracing::warn!(error = ?e, "posted-file write failed after publish");
        counter!("ledger_write_failures_total").increment(1);
    }

    CycleOutcome::Published
}
