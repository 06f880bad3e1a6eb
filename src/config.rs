// src/config.rs
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};

/// Feed the stock deployments watch when FEED_URL is not set.
pub const DEFAULT_FEED_URL: &str = "https://blog.google/waze/rss/";

const DEFAULT_INTERVAL_SECS: u64 = 300;
const DEFAULT_POSTED_CAP: usize = 100;
const DEFAULT_POSTED_FILE: &str = "state/posted.json";
const DEFAULT_VISIBILITY: &str = "unlisted";

/// When cycles run, after the immediate startup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Every(Duration),
    /// Once per day at the given UTC wall-clock time.
    DailyAt { hour: u32, minute: u32 },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Mastodon host, e.g. "mastodon.example".
    pub instance: String,
    pub access_token: String,
    /// Full aggregation API URL returning the feed as JSON.
    pub feed_endpoint: String,
    pub schedule: Schedule,
    pub ledger_cap: usize,
    pub ledger_path: PathBuf,
    /// Visibility for automated posts; "unlisted" keeps them off public timelines.
    pub visibility: String,
    /// Liveness/metrics server port; disabled when unset.
    pub liveness_port: Option<u16>,
}

impl Config {
    /// Read configuration from the environment. Call after `dotenvy::dotenv()`.
    ///
    /// Missing credentials are fatal here, before anything gets scheduled.
    pub fn from_env() -> Result<Self> {
        let instance = match non_empty_var("MASTODON_INSTANCE") {
            Some(v) => v,
            None => bail!("MASTODON_INSTANCE is not set"),
        };
        let access_token = match non_empty_var("ACCESS_TOKEN") {
            Some(v) => v,
            None => bail!("ACCESS_TOKEN is not set"),
        };

        let feed_endpoint = non_empty_var("FEED_ENDPOINT").unwrap_or_else(|| {
            let feed_url =
                non_empty_var("FEED_URL").unwrap_or_else(|| DEFAULT_FEED_URL.to_string());
            crate::feed::aggregation_endpoint(&feed_url)
        });

        // POST_AT=HH:MM switches to the daily schedule; otherwise a fixed period.
        let schedule = match non_empty_var("POST_AT").as_deref().and_then(parse_hh_mm) {
            Some((hour, minute)) => Schedule::DailyAt { hour, minute },
            None => {
                let secs: u64 = std::env::var("CHECK_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_INTERVAL_SECS);
                Schedule::Every(Duration::from_secs(secs.max(1)))
            }
        };

        let ledger_cap: usize = std::env::var("POSTED_CAP")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_POSTED_CAP);
        let ledger_path = non_empty_var("POSTED_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_POSTED_FILE));

        let visibility =
            non_empty_var("POST_VISIBILITY").unwrap_or_else(|| DEFAULT_VISIBILITY.to_string());

        let liveness_port = std::env::var("PORT").ok().and_then(|v| v.parse().ok());

        Ok(Self {
            instance,
            access_token,
            feed_endpoint,
            schedule,
            ledger_cap,
            ledger_path,
            visibility,
            liveness_port,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_hh_mm(s: &str) -> Option<(u32, u32)> {
    let (h, m) = s.split_once(':')?;
    let hour: u32 = h.trim().parse().ok()?;
    let minute: u32 = m.trim().parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}
