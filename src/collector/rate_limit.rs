//! Sliding-window rate limiting over the shared query ledger
//!
//! Every issued query appends its timestamp to the tail of the ledger. Once
//! the ledger holds `quota` entries, a new query is allowed only after the
//! head entry has aged out of the window; stale entries are dropped lazily,
//! one per check.

use crate::config::RateLimitConfig;
use crate::storage::{SharedState, StoreResult, LEDGER_KEY};
use crate::ConfigError;
use chrono::{DateTime, Duration, Utc};

/// Gate allowing at most `quota` queries per rolling `window`
#[derive(Debug, Clone)]
pub struct RateLimiter {
    quota: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(quota: u32, window: Duration) -> Self {
        Self {
            quota: u64::from(quota),
            window,
        }
    }

    /// Builds a limiter from `[rate-limit]`
    ///
    /// A window too long to represent is a configuration error.
    pub fn from_config(config: &RateLimitConfig) -> Result<Self, ConfigError> {
        let window = i64::try_from(config.window_minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "window-minutes out of range: {}",
                    config.window_minutes
                ))
            })?;
        Ok(Self::new(config.quota, window))
    }

    pub fn quota(&self) -> u64 {
        self.quota
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Checks whether a query may be issued now
    pub fn may_query(&self, store: &mut dyn SharedState) -> StoreResult<bool> {
        self.may_query_at(store, Utc::now())
    }

    /// Checks whether a query may be issued at `now`
    ///
    /// Below quota this only reads the ledger length. At quota it pops the
    /// head entry: an entry still inside the window is pushed back unchanged
    /// and the check fails; an older one stays discarded, freeing one slot.
    pub fn may_query_at(
        &self,
        store: &mut dyn SharedState,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        if store.list_len(LEDGER_KEY)? < self.quota {
            return Ok(true);
        }

        let Some(head) = store.list_pop_head(LEDGER_KEY)? else {
            return Ok(true);
        };

        let window_start = now - self.window;
        match parse_timestamp(&head) {
            Some(issued_at) if issued_at > window_start => {
                store.list_push_head(LEDGER_KEY, &head)?;
                Ok(false)
            }
            Some(_) => Ok(true),
            None => {
                tracing::warn!("Dropping malformed ledger entry {:?}", head);
                Ok(true)
            }
        }
    }

    /// Records a query issued at `at` at the tail of the ledger
    pub fn record_query(
        &self,
        store: &mut dyn SharedState,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        store.list_push_tail(LEDGER_KEY, &format_timestamp(at))
    }
}

/// Encodes an instant as fractional Unix seconds
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    format!("{}.{:06}", at.timestamp(), at.timestamp_subsec_micros())
}

/// Decodes fractional Unix seconds
///
/// The fraction is read digit by digit so that microsecond timestamps survive
/// exactly; a float would lose the last digit at current epoch magnitudes.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let (secs, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    let secs: i64 = secs.parse().ok()?;

    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let nanos: u32 = format!("{:0<9}", &fraction[..fraction.len().min(9)])
        .parse()
        .ok()?;

    DateTime::from_timestamp(secs, nanos)
}
