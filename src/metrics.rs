use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    // Pre-register counters so they appear even before the first increment.
    counter!("live_frames_dropped_total").absolute(0);
    counter!("snapshot_loads_total").absolute(0);
    counter!("snapshot_failures_total").absolute(0);
    counter!("channel_disconnects_total").absolute(0);
    for kind in ["contract", "buy", "sell", "buy_failed", "log"] {
        counter!("live_events_total", "kind" => kind).absolute(0);
    }

    gauge!("dashboard_profit_usd").set(0.0);
    gauge!("dashboard_active_contracts").set(0.0);
    gauge!("wallet_balance").set(0.0);

    // Histogram is lazily created on first record; force creation.
    histogram!("snapshot_latency_seconds").record(0.0);

    Ok(handle)
}
