use volley_core::{RunResult, METRIC_PREFIX};

/// Publishes the measurement window of a finished run as four gauges.
pub(crate) fn record(name: &str, result: &RunResult) {
    let base = format!("{METRIC_PREFIX}{name}");
    let window = &result.measurement;

    metrics::gauge!(format!("{base}_mid_count")).set(window.count as f64);
    metrics::gauge!(format!("{base}_mid_dur_ms")).set(window.duration_ms() as f64);
    metrics::gauge!(format!("{base}_throughput_inv")).set(window.throughput_inverse());
    metrics::gauge!(format!("{base}_throughput")).set(window.throughput());
}
