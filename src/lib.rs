pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod nse_client;
pub mod persistence;
pub mod poller;
pub mod presentation;
pub mod selector;
pub mod strategy;
pub mod utility;

// Re-exports for convenience
pub use config::{RetryPolicy, RunMode, WatcherConfig};
pub use error::FetchError;
pub use models::{ChainSnapshot, ContractQuote, Records, StrikeRecord};
pub use nse_client::{DataSource, NSEClient};
pub use persistence::{CsvSink, PersistenceSink, XlsxSink};
pub use poller::{Clock, CycleOutcome, PollState, Poller, RunSummary, SystemClock};
pub use presentation::{ConsolePresenter, PresentationSink};
pub use selector::select_strikes;
pub use strategy::{decide_option_strategy, OptionSide, PriceBand, Recommendation};
