use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{HistogramOpts, HistogramTimer, HistogramVec, IntCounterVec, Opts, Registry};
use service_core::error::AppError;
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static ORDERS_CREATED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PAYMENT_CONFIRMATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static DB_QUERY_DURATION: OnceLock<HistogramVec> = OnceLock::new();

fn metric_error(err: prometheus::Error) -> AppError {
    AppError::InternalError(anyhow::anyhow!("Failed to register metric: {}", err))
}

/// Install the global recorder and register the domain counters. Call once at startup.
pub fn init_metrics() -> Result<(), AppError> {
    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        AppError::InternalError(anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))
    })?;

    if METRICS_HANDLE.set(handle).is_err() {
        return Err(AppError::InternalError(anyhow::anyhow!(
            "Metrics already initialized"
        )));
    }

    let registry = Registry::new();

    let orders_counter = IntCounterVec::new(
        Opts::new(
            "orders_created_total",
            "Orders created by order type and initial payment status",
        ),
        &["order_type", "payment_status"],
    )
    .map_err(metric_error)?;

    // source: webhook, poll, proof, admin
    let confirmations_counter = IntCounterVec::new(
        Opts::new(
            "payment_confirmations_total",
            "Payment confirmations by source and outcome",
        ),
        &["source", "outcome"],
    )
    .map_err(metric_error)?;

    let db_histogram = HistogramVec::new(
        HistogramOpts::new(
            "order_db_query_duration_seconds",
            "Database query duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        &["operation"],
    )
    .map_err(metric_error)?;

    registry
        .register(Box::new(orders_counter.clone()))
        .map_err(metric_error)?;
    registry
        .register(Box::new(confirmations_counter.clone()))
        .map_err(metric_error)?;
    registry
        .register(Box::new(db_histogram.clone()))
        .map_err(metric_error)?;

    // The handle guard above makes these first-time sets.
    let _ = PROMETHEUS_REGISTRY.set(registry);
    let _ = ORDERS_CREATED_TOTAL.set(orders_counter);
    let _ = PAYMENT_CONFIRMATIONS_TOTAL.set(confirmations_counter);
    let _ = DB_QUERY_DURATION.set(db_histogram);

    Ok(())
}

pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

pub fn record_order_created(order_type: &str, payment_status: &str) {
    if let Some(counter) = ORDERS_CREATED_TOTAL.get() {
        counter.with_label_values(&[order_type, payment_status]).inc();
    }
}

pub fn record_payment_confirmation(source: &str, outcome: &str) {
    if let Some(counter) = PAYMENT_CONFIRMATIONS_TOTAL.get() {
        counter.with_label_values(&[source, outcome]).inc();
    }
}

/// Timer that observes on drop; `None` until metrics are initialized.
pub fn db_timer(operation: &str) -> Option<HistogramTimer> {
    DB_QUERY_DURATION
        .get()
        .map(|histogram| histogram.with_label_values(&[operation]).start_timer())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorders_are_noops_before_init() {
        record_order_created("ONLINE", "BELUM_BAYAR");
        record_payment_confirmation("webhook", "completed");
        assert!(db_timer("get_order").is_none());
        assert!(get_metrics().starts_with("# Metrics recorder not initialized"));
    }
}
