//! Collection coordinator - the main polling loop
//!
//! One sequential worker drives every query:
//! 1. Ask the rate limiter whether a query may go out
//! 2. Pick the lowest-scored term
//! 3. Build the query from the term's cursor and run it
//! 4. Derive and persist the next cursor, then the new score
//! 5. Append the fetched items to the results list
//!
//! The loop alternates between two states. While `Active` it queries back to
//! back; a denied limiter check moves it to `Throttled`, where it sleeps a
//! fixed backoff between checks until a slot frees up.

use crate::collector::catalog::{ConfigCatalog, TermCatalog};
use crate::collector::query::QueryBuilder;
use crate::collector::rate_limit::RateLimiter;
use crate::collector::scheduler::TermScheduler;
use crate::collector::search::{HttpSearchClient, SearchClient};
use crate::collector::sink::append_results;
use crate::config::Config;
use crate::state::{derive_cursor, FetchOutcome, ItemId, TermCursor};
use crate::storage::{load_cursor, save_cursor, SharedState, SqliteStore};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

/// Operating state of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Active,
    Throttled,
}

/// Everything worth knowing about one fetch cycle
#[derive(Debug, Clone, PartialEq)]
pub struct FetchLog {
    pub term: String,
    pub query: String,
    pub scenario: &'static str,
    pub before: TermCursor,
    pub after: TermCursor,
    pub score: u64,
    pub item_count: usize,
    pub executed_at: DateTime<Utc>,
}

impl FetchLog {
    fn emit(&self) {
        tracing::info!(
            term = %self.term,
            scenario = self.scenario,
            items = self.item_count,
            score = self.score,
            query = %self.query,
            before.newest_id = ?self.before.newest_id,
            before.oldest_id = ?self.before.oldest_id,
            before.last_success = ?self.before.last_success,
            before.success = ?self.before.success,
            after.newest_id = ?self.after.newest_id,
            after.oldest_id = ?self.after.oldest_id,
            after.last_success = ?self.after.last_success,
            after.success = ?self.after.success,
            executed_at = %self.executed_at.to_rfc3339(),
            "Fetch cycle complete"
        );
    }
}

/// Outcome of a single loop iteration
#[derive(Debug)]
pub enum Tick {
    /// A query was issued and its results persisted
    Collected(FetchLog),
    /// The limiter denied the query
    Throttled,
    /// The iteration was abandoned; nothing past the failure point was written
    Failed(HarvestError),
}

/// In-process counters for progress reporting
#[derive(Debug, Clone, Default)]
pub struct CollectionStats {
    pub queries: u64,
    pub items_stored: u64,
    pub throttled_checks: u64,
    pub throttled_secs: u64,
    pub failed_iterations: u64,
    pub scenarios: BTreeMap<&'static str, u64>,
}

/// Main collector structure
pub struct Coordinator<S, C> {
    store: S,
    client: C,
    scheduler: TermScheduler,
    rate_limiter: RateLimiter,
    query_builder: QueryBuilder,
    state: LoopState,
    stats: CollectionStats,
    throttle_backoff: Duration,
    error_backoff: Duration,
    progress_interval: u64,
    started: Instant,
}

impl Coordinator<SqliteStore, HttpSearchClient> {
    /// Creates a coordinator over the configured SQLite store and HTTP client
    pub fn new(config: &Config) -> Result<Self, HarvestError> {
        let store = SqliteStore::new(Path::new(&config.storage.database_path))?;
        let client = HttpSearchClient::new(&config.search)?;
        let catalog = ConfigCatalog::from_config(&config.catalog);
        Self::with_parts(config, store, client, Box::new(catalog))
    }
}

impl<S: SharedState, C: SearchClient> Coordinator<S, C> {
    /// Creates a coordinator from explicit collaborators
    pub fn with_parts(
        config: &Config,
        store: S,
        client: C,
        catalog: Box<dyn TermCatalog>,
    ) -> Result<Self, HarvestError> {
        Ok(Self {
            store,
            client,
            scheduler: TermScheduler::new(catalog),
            rate_limiter: RateLimiter::from_config(&config.rate_limit)?,
            query_builder: QueryBuilder::from_config(&config.search),
            state: LoopState::Active,
            stats: CollectionStats::default(),
            throttle_backoff: Duration::from_secs(config.rate_limit.throttle_backoff_secs),
            error_backoff: Duration::from_secs(config.collector.error_backoff_secs),
            progress_interval: config.collector.progress_interval.max(1),
            started: Instant::now(),
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> &CollectionStats {
        &self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs the collection loop until the process is stopped
    ///
    /// Every failure, including seeding the candidate set at startup, is
    /// logged and retried after a backoff.
    pub async fn run(&mut self) -> Result<(), HarvestError> {
        tracing::info!(
            "Starting collection (quota {} per {} minutes)",
            self.rate_limiter.quota(),
            self.rate_limiter.window().num_minutes()
        );

        // Seeding is retried lazily by the scheduler on the first tick
        match self.scheduler.ensure_candidates(&mut self.store) {
            Ok(seeded) => tracing::info!("{} terms seeded", seeded),
            Err(e) => tracing::warn!("Failed to seed candidate terms: {}", e),
        }

        loop {
            match self.tick().await {
                Tick::Collected(_) => {
                    if self.stats.queries % self.progress_interval == 0 {
                        self.log_progress();
                    }
                }
                Tick::Throttled => {
                    self.stats.throttled_secs += self.throttle_backoff.as_secs();
                    tokio::time::sleep(self.throttle_backoff).await;
                }
                Tick::Failed(_) => {
                    tokio::time::sleep(self.error_backoff).await;
                }
            }
        }
    }

    /// Performs one loop iteration without sleeping
    pub async fn tick(&mut self) -> Tick {
        match self.rate_limiter.may_query(&mut self.store) {
            Ok(true) => {
                if self.state == LoopState::Throttled {
                    tracing::info!("Query slot available, resuming collection");
                    self.state = LoopState::Active;
                }
            }
            Ok(false) => {
                if self.state == LoopState::Active {
                    tracing::info!("Rate limit reached, throttling");
                    self.state = LoopState::Throttled;
                }
                self.stats.throttled_checks += 1;
                return Tick::Throttled;
            }
            Err(e) => {
                tracing::error!("Rate limit check failed: {}", e);
                self.stats.failed_iterations += 1;
                return Tick::Failed(e.into());
            }
        }

        match self.collect_once().await {
            Ok(log) => {
                log.emit();
                self.stats.queries += 1;
                self.stats.items_stored += log.item_count as u64;
                *self.stats.scenarios.entry(log.scenario).or_default() += 1;
                Tick::Collected(log)
            }
            Err(e) => {
                tracing::error!("Collection cycle failed: {}", e);
                self.stats.failed_iterations += 1;
                Tick::Failed(e)
            }
        }
    }

    /// Queries one term and persists the outcome
    async fn collect_once(&mut self) -> Result<FetchLog, HarvestError> {
        let term = self.scheduler.next_term(&mut self.store)?;
        let before = load_cursor(&self.store, &term)?;
        let query = self.query_builder.build(&term, &before);

        // The ledger entry goes in before the request: a request that fails
        // after reaching the service still spends quota.
        let executed_at = Utc::now();
        self.rate_limiter
            .record_query(&mut self.store, executed_at)?;

        let items = self.client.search(&query).await?;
        let ids: Vec<ItemId> = items.iter().map(|item| item.id).collect();

        let transition = derive_cursor(&before, &FetchOutcome::from_ids(&ids));
        save_cursor(&mut self.store, &term, &transition.cursor)?;
        self.scheduler
            .reschedule(&mut self.store, &term, transition.score)?;
        let item_count = append_results(&mut self.store, &term, &items)?;

        Ok(FetchLog {
            term,
            query,
            scenario: transition.scenario.name(),
            before,
            after: transition.cursor,
            score: transition.score,
            item_count,
            executed_at,
        })
    }

    fn log_progress(&self) {
        let minutes = self.started.elapsed().as_secs_f64() / 60.0;
        let rate = if minutes > 0.0 {
            self.stats.queries as f64 / minutes
        } else {
            0.0
        };
        tracing::info!(
            "Progress: {} queries, {} items stored, {} failed, {}s throttled, {:.2} queries/min, scenarios {:?}",
            self.stats.queries,
            self.stats.items_stored,
            self.stats.failed_iterations,
            self.stats.throttled_secs,
            rate,
            self.stats.scenarios
        );
    }
}

/// Runs collection with the configured store, client and catalog
///
/// # Example
///
/// ```no_run
/// use search_harvest::config::load_config;
/// use search_harvest::collector::run_collection;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// run_collection(&config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_collection(config: &Config) -> Result<(), HarvestError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
