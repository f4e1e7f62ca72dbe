// Metrics module - Prometheus metrics for the origin tier
//
// Provides:
// - Origin response counters by status code
// - Stage duration histograms (download, pipeline, upload)
// - Variant persistence failure counter (alerting hook for a degraded store)

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Stage of an origin invocation that is timed separately
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Fetching the source object
    Download,
    /// Decode, resize and encode
    Pipeline,
    /// Writing the variant back to storage
    Upload,
}

impl Stage {
    pub fn as_label(&self) -> &'static str {
        match self {
            Stage::Download => "download",
            Stage::Pipeline => "pipeline",
            Stage::Upload => "upload",
        }
    }
}

/// Global metrics registry for the service
pub struct Metrics {
    /// Origin responses by status code
    pub responses: IntCounterVec,

    /// Stage durations (in seconds)
    pub stage_duration: HistogramVec,

    /// Variant writes that failed and were swallowed
    pub persist_failures: IntCounter,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

impl Metrics {
    /// Initialize and return the global metrics instance
    ///
    /// Registration happens once; later calls return the same instance.
    pub fn global() -> &'static Self {
        METRICS.get_or_init(|| {
            let responses = register_int_counter_vec!(
                "hikari_origin_responses_total",
                "Origin responses by HTTP status code",
                &["status"]
            )
            .expect("Failed to register origin_responses_total metric");

            let stage_duration = register_histogram_vec!(
                "hikari_origin_stage_duration_seconds",
                "Duration of origin stages in seconds",
                &["stage"], // download, pipeline, upload
                vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
            )
            .expect("Failed to register origin_stage_duration_seconds metric");

            let persist_failures = register_int_counter!(
                "hikari_variant_persist_failures_total",
                "Transformed variants that could not be written to the variant store"
            )
            .expect("Failed to register variant_persist_failures_total metric");

            Metrics {
                responses,
                stage_duration,
                persist_failures,
            }
        })
    }

    /// Count one origin response
    pub fn record_response(&self, status: u16) {
        self.responses
            .with_label_values(&[&status.to_string()])
            .inc();
    }

    /// Start timing a stage
    ///
    /// # Example
    /// ```ignore
    /// let timer = Metrics::global().start_stage(Stage::Download);
    /// // ... fetch ...
    /// let elapsed = timer.observe();
    /// ```
    pub fn start_stage(&self, stage: Stage) -> StageTimer {
        StageTimer {
            histogram: self.stage_duration.with_label_values(&[stage.as_label()]),
            start: Instant::now(),
            observed: false,
        }
    }

    /// Render every registered metric in the Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            tracing::warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// RAII timer for stage histograms
///
/// Records the elapsed time when observed or dropped, whichever comes first.
pub struct StageTimer {
    histogram: Histogram,
    start: Instant,
    observed: bool,
}

impl StageTimer {
    /// Record the duration now and return it
    pub fn observe(mut self) -> Duration {
        let elapsed = self.start.elapsed();
        self.histogram.observe(elapsed.as_secs_f64());
        self.observed = true;
        elapsed
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        if !self.observed {
            self.histogram.observe(self.start.elapsed().as_secs_f64());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_returns_same_instance() {
        let a = Metrics::global() as *const Metrics;
        let b = Metrics::global() as *const Metrics;
        assert_eq!(a, b);
    }

    #[test]
    fn test_record_response_increments_status_label() {
        let metrics = Metrics::global();
        let before = metrics.responses.with_label_values(&["418"]).get();
        metrics.record_response(418);
        assert_eq!(metrics.responses.with_label_values(&["418"]).get(), before + 1);
    }

    #[test]
    fn test_stage_timer_observes_once() {
        let metrics = Metrics::global();
        let histogram = metrics.stage_duration.with_label_values(&["upload"]);
        let before = histogram.get_sample_count();

        let timer = metrics.start_stage(Stage::Upload);
        timer.observe();

        assert!(histogram.get_sample_count() > before);
    }

    #[test]
    fn test_export_contains_registered_metrics() {
        let metrics = Metrics::global();
        metrics.persist_failures.inc();
        let text = metrics.export_prometheus();
        assert!(text.contains("hikari_variant_persist_failures_total"));
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(Stage::Download.as_label(), "download");
        assert_eq!(Stage::Pipeline.as_label(), "pipeline");
        assert_eq!(Stage::Upload.as_label(), "upload");
    }
}
