//! Car news notifier binary entrypoint.
//! Loads configuration from the environment, runs one poll/notify pass and
//! exits. Scheduling (cron, CI timers) is left to the caller.

use std::process::ExitCode;

use car_news_notifier::{run_from_config, telemetry, NotifierConfig};

const EXIT_DISPATCH_FAILED: u8 = 1;
const EXIT_CONFIG: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env locally; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let cfg = match NotifierConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "configuration error");
            println!("❌ configuration error: {e:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    tracing::info!(
        platform = %cfg.platform,
        format = %cfg.format,
        feeds = cfg.feed_urls.len(),
        max_posts = cfg.max_posts_per_run,
        "starting run"
    );

    match run_from_config(&cfg).await {
        Ok(summary) if summary.is_success() => {
            println!("✅ {summary}");
            ExitCode::SUCCESS
        }
        Ok(summary) => {
            println!("❌ {summary}");
            ExitCode::from(EXIT_DISPATCH_FAILED)
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "run failed");
            println!("❌ run failed: {e:#}");
            ExitCode::from(EXIT_DISPATCH_FAILED)
        }
    }
}
