use crate::config::{RetryPolicy, WatcherConfig, SLOW_CYCLE_THRESHOLD_MS};
use crate::error::FetchError;
use crate::models::ChainSnapshot;
use crate::nse_client::DataSource;
use crate::persistence::PersistenceSink;
use crate::presentation::PresentationSink;
use crate::selector::select_strikes;
use crate::strategy::{decide_option_strategy, Recommendation};
use crate::utility::timing::Timer;
use anyhow::Result;
use chrono::{DateTime, Local};
use std::cell::Cell;
use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;
use tracing::{debug, error, info, warn};

/// Wall clock and sleeping, swappable in tests
pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

// -----------------------------------------------
// STATE CARRIED BETWEEN CYCLES
// -----------------------------------------------
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollState {
    pub expiry_date: Option<String>,
}

impl PollState {
    /// Expiry to filter on this cycle.
    ///
    /// The cached expiry survives while the snapshot still lists it (or lists
    /// nothing at all). Otherwise the first listed expiry replaces it.
    pub fn resolve_expiry(&mut self, snapshot: &ChainSnapshot) -> Option<String> {
        let listed = snapshot.expiry_dates();

        if let Some(cached) = &self.expiry_date {
            if listed.is_empty() || listed.contains(cached) {
                return Some(cached.clone());
            }
        }

        let next = listed.first()?.clone();
        match &self.expiry_date {
            Some(old) => info!(old = %old, new = %next, "Expiry {} no longer listed, switching to {}", old, next),
            None => debug!(expiry = %next, "Using expiry {}", next),
        }
        self.expiry_date = Some(next.clone());
        Some(next)
    }
}

/// Fetch one snapshot, retrying read timeouts only.
///
/// Returns `None` ("no data") once retries are exhausted or on any other error.
pub async fn fetch_with_retries<S: DataSource>(
    source: &S,
    symbol: &str,
    policy: &RetryPolicy,
) -> Option<ChainSnapshot> {
    let counter = Cell::new(0usize);
    let attempts = &counter;
    let strategy = FixedInterval::new(policy.delay).take(policy.max_retries);

    let result = RetryIf::spawn(
        strategy,
        move || {
            attempts.set(attempts.get() + 1);
            source.fetch_snapshot(symbol)
        },
        move |e: &FetchError| {
            if e.is_timeout() {
                warn!(attempt = attempts.get(), "Timeout occurred (attempt {})", attempts.get());
            }
            e.is_timeout()
        },
    )
    .await;

    match result {
        Ok(snapshot) => Some(snapshot),
        Err(e) if e.is_timeout() => {
            error!(attempts = attempts.get(), "Failed after {} retries: {}", policy.max_retries, e);
            None
        }
        Err(e) => {
            match e.status() {
                Some(status) => error!(status = status.as_u16(), "HTTP error: {}", e),
                None => error!("Fetch failed: {}", e),
            }
            None
        }
    }
}

/// What a single cycle ended with
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Fetch failed or gave up
    NoData,
    /// Snapshot listed no expiry and none was cached
    NoExpiry,
    /// Nothing within the window for this expiry
    Empty { expiry_date: String },
    Completed {
        expiry_date: String,
        strikes: usize,
        recommendation: Option<Recommendation>,
    },
}

/// Counters returned by [`Poller::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub completed: u64,
    pub no_data: u64,
    pub failed: u64,
}

// -----------------------------------------------
// POLLING DRIVER
// -----------------------------------------------
pub struct Poller<S: DataSource, C: Clock> {
    source: S,
    clock: C,
    symbol: String,
    window: usize,
    retry: RetryPolicy,
    poll_interval: Duration,
    presenter: Box<dyn PresentationSink>,
    persistence: Vec<Box<dyn PersistenceSink>>,
    state: PollState,
}

impl<S: DataSource, C: Clock> Poller<S, C> {
    pub fn new(source: S, clock: C, cfg: &WatcherConfig, presenter: Box<dyn PresentationSink>) -> Self {
        Self {
            source,
            clock,
            symbol: cfg.symbol.clone(),
            window: cfg.strike_window,
            retry: cfg.retry,
            poll_interval: cfg.poll_interval,
            presenter,
            persistence: Vec::new(),
            state: PollState::default(),
        }
    }

    /// Add a sink; every sink receives each non-empty filtered set
    pub fn with_persistence(mut self, sink: Box<dyn PersistenceSink>) -> Self {
        self.persistence.push(sink);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// fetch → filter → persist → present → score
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let Some(snapshot) = fetch_with_retries(&self.source, &self.symbol, &self.retry).await else {
            warn!(symbol = %self.symbol, "No data received this cycle");
            return Ok(CycleOutcome::NoData);
        };

        let Some(expiry_date) = self.state.resolve_expiry(&snapshot) else {
            warn!(symbol = %self.symbol, "Snapshot lists no expiry dates");
            return Ok(CycleOutcome::NoExpiry);
        };
        info!(expiry = %expiry_date, "Using expiry date: {}", expiry_date);

        let filtered = select_strikes(&snapshot, &expiry_date, self.window);
        if filtered.is_empty() {
            info!(expiry = %expiry_date, "Nothing to show for this cycle");
            return Ok(CycleOutcome::Empty { expiry_date });
        }

        // A failing sink must not hide the table
        let now = self.clock.now();
        for sink in self.persistence.iter_mut() {
            if let Err(e) = sink.append(&filtered, now) {
                error!(expiry = %expiry_date, "Persistence failed: {:#}", e);
            }
        }

        self.presenter.render(&filtered)?;
        let recommendation = decide_option_strategy(&filtered);
        self.presenter.render_recommendation(recommendation.as_ref())?;

        Ok(CycleOutcome::Completed {
            expiry_date,
            strikes: filtered.len(),
            recommendation,
        })
    }

    /// Run cycles until `max_cycles` is reached (forever when `None`).
    /// A failed cycle is logged and the loop carries on.
    pub async fn run(&mut self, max_cycles: Option<u64>) -> RunSummary {
        let mut summary = RunSummary::default();

        loop {
            summary.cycles += 1;
            info!(cycle = summary.cycles, "==== {} ====", self.clock.now().format("%Y-%m-%d %H:%M:%S"));

            let timer = Timer::start_with_threshold("cycle", SLOW_CYCLE_THRESHOLD_MS);
            match self.run_cycle().await {
                Ok(CycleOutcome::NoData) => summary.no_data += 1,
                Ok(CycleOutcome::Completed { .. }) => summary.completed += 1,
                Ok(outcome) => debug!(?outcome, "Cycle finished without output"),
                Err(e) => {
                    summary.failed += 1;
                    error!(cycle = summary.cycles, "Cycle failed: {:#}", e);
                }
            }
            timer.stop();

            if max_cycles.is_some_and(|limit| summary.cycles >= limit) {
                break;
            }

            debug!(secs = self.poll_interval.as_secs(), "Sleeping until next cycle");
            self.clock.sleep(self.poll_interval).await;
        }

        summary
    }
}
