use anyhow::Result;
use colored::Colorize;
use nse_chain_watcher::logging::init_logging;
use nse_chain_watcher::{
    ConsolePresenter, CsvSink, NSEClient, Poller, RunMode, SystemClock, WatcherConfig, XlsxSink,
};
use tracing::{info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cfg = WatcherConfig::from_env();
    init_logging(&cfg.log_dir)?;

    println!("{}", "=".repeat(60).blue());
    println!("{}", format!("{} Option Chain Watcher", cfg.symbol).green().bold());
    println!("{}", "=".repeat(60).blue());
    println!();

    info!(
        symbol = %cfg.symbol,
        mode = ?cfg.mode,
        window = cfg.strike_window,
        interval_secs = cfg.poll_interval.as_secs(),
        "Starting watcher"
    );

    let client = NSEClient::from_config(&cfg)?;
    let presenter = Box::new(ConsolePresenter::stdout(&cfg.symbol));
    let mut poller = Poller::new(client, SystemClock, &cfg, presenter);

    if let Some(path) = &cfg.csv_path {
        info!(path = %path.display(), "Persisting filtered strikes to CSV");
        poller = poller.with_persistence(Box::new(CsvSink::new(path)));
    }
    if let Some(path) = &cfg.xlsx_path {
        info!(path = %path.display(), "Writing filtered strikes to spreadsheet");
        poller = poller.with_persistence(Box::new(XlsxSink::new(path)));
    }

    let limit = cfg.cycle_limit();
    if cfg.mode == RunMode::Watch && limit.is_none() {
        println!("{} Press Ctrl+C to stop", "ℹ".blue());
    }

    tokio::select! {
        summary = poller.run(limit) => {
            info!(
                cycles = summary.cycles,
                completed = summary.completed,
                no_data = summary.no_data,
                failed = summary.failed,
                "Watcher finished"
            );
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, shutting down");
        }
    }

    Ok(())
}
