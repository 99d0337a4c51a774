/// Prometheusメトリクス定義。
use prometheus::{
    Counter, Histogram, Registry, histogram_opts, register_counter_with_registry,
    register_histogram_with_registry,
};

/// メトリクスコレクター。
#[derive(Debug, Clone)]
pub struct Metrics {
    pub generate_requests: Counter,
    pub generate_failures: Counter,
    pub pipeline_duration: Histogram,
}

impl Metrics {
    /// 指定レジストリに全メトリクスを登録する。
    ///
    /// # Errors
    /// 同名メトリクスの二重登録時はエラーを返す。
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let generate_requests = register_counter_with_registry!(
            "radar_generate_requests_total",
            "Number of /generate invocations",
            registry
        )?;
        let generate_failures = register_counter_with_registry!(
            "radar_generate_failures_total",
            "Number of /generate invocations that ended in an error",
            registry
        )?;
        let pipeline_duration = register_histogram_with_registry!(
            histogram_opts!(
                "radar_pipeline_duration_seconds",
                "Wall-clock duration of one generate-train-render cycle",
                vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
            ),
            registry
        )?;

        Ok(Self {
            generate_requests,
            generate_failures,
            pipeline_duration,
        })
    }
}
