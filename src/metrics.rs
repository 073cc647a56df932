use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const SITES_SCORED: &str = "dam_sites_scored_total";
pub const MODEL_PREDICTIONS: &str = "dam_model_predictions_total";
pub const PREDICTION_FALLBACKS: &str = "dam_prediction_fallbacks_total";
pub const BUNDLE_LOAD_FAILURES: &str = "dam_bundle_load_failures_total";
pub const BATCH_ROW_MS: &str = "dam_batch_row_ms";

/// One-time metrics registration (so series carry descriptions on export).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(SITES_SCORED, "Sites scored, labelled by mode (rules|predict).");
        describe_counter!(
            MODEL_PREDICTIONS,
            "Dimension scores produced by a model bundle."
        );
        describe_counter!(
            PREDICTION_FALLBACKS,
            "Dimension scores that fell back to the rule tables."
        );
        describe_counter!(
            BUNDLE_LOAD_FAILURES,
            "Model bundles that failed to load or validate."
        );
        describe_histogram!(BATCH_ROW_MS, "Per-row scoring time in milliseconds.");
    });
}

/// Prometheus recorder used by the binary to dump metrics after a batch.
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    pub fn install() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Exposition text.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
