use std::path::PathBuf;
use std::time::Duration;

// -----------------------------------------------
// NSE API ENDPOINTS
// -----------------------------------------------
pub const NSE_BASE_URL: &str = "https://www.nseindia.com";

pub fn nse_option_chain_indices_url(symbol: &str) -> String {
    format!(
        "{}/api/option-chain-indices?symbol={}",
        NSE_BASE_URL,
        urlencoding::encode(symbol)
    )
}

// -----------------------------------------------
// HTTP CLIENT CONFIG
// -----------------------------------------------
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                               AppleWebKit/537.36 (KHTML, like Gecko) \
                               Chrome/131.0.0.0 Safari/537.36";

pub const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.8",
    "en-IN,en;q=0.9",
];

pub const HEADER_REFERER: &str = "https://www.nseindia.com/";
pub const HEADER_X_REQUESTED_WITH: &str = "XMLHttpRequest";
pub const HEADER_ACCEPT_HTML: &str = "text/html";
pub const HEADER_ACCEPT_JSON: &str = "application/json";

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 20;

// -----------------------------------------------
// SESSION WARMUP
// -----------------------------------------------
pub const WARMUP_DELAY_MS: u64 = 200;

// -----------------------------------------------
// RETRY CONFIG (read timeouts only)
// -----------------------------------------------
pub const DEFAULT_RETRY_COUNT: usize = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;

// -----------------------------------------------
// WATCHER DEFAULTS
// -----------------------------------------------
pub const DEFAULT_SYMBOL: &str = "NIFTY";
pub const DEFAULT_STRIKE_WINDOW: usize = 10;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 120;
pub const DEFAULT_LOG_DIR: &str = "./logs";

/// Cycles slower than this are logged at warn level
pub const SLOW_CYCLE_THRESHOLD_MS: u128 = 10_000;

// -----------------------------------------------
// RUNTIME CONFIGURATION
// -----------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Poll forever (or until `max_cycles`)
    Watch,
    /// Run a single cycle and exit
    Once,
}

impl RunMode {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "watch" => Some(RunMode::Watch),
            "once" => Some(RunMode::Once),
            _ => None,
        }
    }
}

/// Fixed-delay retry policy applied to read timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_RETRY_COUNT,
            delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

/// Everything the watcher reads from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct WatcherConfig {
    pub mode: RunMode,
    pub symbol: String,
    pub strike_window: usize,
    pub poll_interval: Duration,
    pub max_cycles: Option<u64>,
    pub retry: RetryPolicy,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub csv_path: Option<PathBuf>,
    pub xlsx_path: Option<PathBuf>,
    pub log_dir: PathBuf,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Watch,
            symbol: DEFAULT_SYMBOL.to_string(),
            strike_window: DEFAULT_STRIKE_WINDOW,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_cycles: None,
            retry: RetryPolicy::default(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            csv_path: None,
            xlsx_path: None,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl WatcherConfig {
    /// Create configuration from `NSE_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mode = non_empty("NSE_MODE")
            .and_then(|v| RunMode::parse(&v))
            .unwrap_or(defaults.mode);

        let symbol = non_empty("NSE_SYMBOL")
            .map(|s| s.to_ascii_uppercase())
            .unwrap_or(defaults.symbol);

        let strike_window = non_empty("NSE_STRIKE_WINDOW")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.strike_window);

        let poll_interval = non_empty("NSE_POLL_INTERVAL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval);

        let max_cycles = non_empty("NSE_MAX_CYCLES")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&n| n > 0);

        let retry = RetryPolicy {
            max_retries: non_empty("NSE_RETRY_COUNT")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults.retry.max_retries),
            delay: non_empty("NSE_RETRY_DELAY_MS")
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry.delay),
        };

        let connect_timeout = non_empty("NSE_CONNECT_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.connect_timeout);

        let read_timeout = non_empty("NSE_READ_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.read_timeout);

        let csv_path = non_empty("NSE_CSV_PATH").map(PathBuf::from);
        let xlsx_path = non_empty("NSE_XLSX_PATH").map(PathBuf::from);

        let log_dir = non_empty("NSE_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.log_dir);

        Self {
            mode,
            symbol,
            strike_window,
            poll_interval,
            max_cycles,
            retry,
            connect_timeout,
            read_timeout,
            csv_path,
            xlsx_path,
            log_dir,
        }
    }

    /// Cycle bound implied by mode and `NSE_MAX_CYCLES`
    pub fn cycle_limit(&self) -> Option<u64> {
        match self.mode {
            RunMode::Once => Some(1),
            RunMode::Watch => self.max_cycles,
        }
    }
}
