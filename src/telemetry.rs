// src/telemetry.rs
use metrics::describe_counter;
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "car_news_notifier=info,warn";

/// One-time metrics registration so series carry descriptions once a
/// recorder is installed by whoever embeds the library.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "notifier_items_fetched_total",
            "Entries parsed from all feeds."
        );
        describe_counter!(
            "notifier_feed_errors_total",
            "Feeds that were unreachable or unparsable."
        );
        describe_counter!(
            "notifier_candidates_total",
            "Unsent entries that matched a brand or the priority tag."
        );
        describe_counter!(
            "notifier_dispatch_requests_total",
            "Requests sent to the chat platform."
        );
        describe_counter!(
            "notifier_dispatch_failures_total",
            "Requests rejected by the chat platform or failed in transport."
        );
        describe_counter!(
            "notifier_ids_committed_total",
            "Identifiers newly written to the sent-id store."
        );
    });
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter;
/// `NOTIFIER_LOG_JSON=1` switches to JSON lines.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var("NOTIFIER_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact().with_target(false)).init();
    }
}
