use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = {
        let registry = Registry::new();
        register_metrics(&registry).expect("metrics can be registered");
        registry
    };

    // Submission metrics
    pub static ref SUBMISSIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("intake_submissions_total", "Total form submissions"),
        &["form", "status"]
    ).expect("metric can be created");

    // Scoring metrics
    pub static ref RISK_OUTCOMES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("intake_risk_outcomes_total", "Risk profiles assigned"),
        &["outcome"]
    ).expect("metric can be created");

    pub static ref RISK_SCORE: Histogram = Histogram::with_opts(
        HistogramOpts::new("intake_risk_score", "Distribution of questionnaire scores")
            .buckets(vec![15.0, 30.0, 44.0, 54.0, 70.0, 80.0, 100.0])
    ).expect("metric can be created");

    // Signature metrics
    pub static ref SIGNATURE_BYTES: Histogram = Histogram::with_opts(
        HistogramOpts::new("intake_signature_bytes", "Size of stored signature images")
            .buckets(vec![1_024.0, 8_192.0, 32_768.0, 131_072.0, 524_288.0, 2_097_152.0])
    ).expect("metric can be created");
}

/// Register all metrics with the given registry
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(SUBMISSIONS_TOTAL.clone()))?;
    registry.register(Box::new(RISK_OUTCOMES_TOTAL.clone()))?;
    registry.register(Box::new(RISK_SCORE.clone()))?;
    registry.register(Box::new(SIGNATURE_BYTES.clone()))?;
    Ok(())
}

pub fn record_submission(form: &str, status: &str) {
    SUBMISSIONS_TOTAL.with_label_values(&[form, status]).inc();
}

pub fn record_score(total_score: f64, outcome: &str) {
    RISK_SCORE.observe(total_score);
    RISK_OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Generate metrics output in Prometheus text format
pub fn metrics_handler() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
