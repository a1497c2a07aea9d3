//! Service Metrics
//!
//! Prometheus counters and histograms for both RPCs, kept in a registry
//! owned by the service.

use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, IntCounter, Opts, Registry,
    TextEncoder,
};

/// Service metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    registry: Registry,
    /// Request latency histogram
    pub request_latency: HistogramVec,
    /// Request count
    pub request_count: CounterVec,
    /// Pixels delivered on area streams
    pub pixels_streamed: IntCounter,
    /// Area streams currently producing
    pub active_streams: Gauge,
}

impl ServiceMetrics {
    /// Creates new service metrics in a fresh registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let request_latency = HistogramVec::new(
            HistogramOpts::new("request_latency_seconds", "Request latency in seconds")
                .namespace("satellite")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["method", "status"],
        )?;
        registry.register(Box::new(request_latency.clone()))?;

        let request_count = CounterVec::new(
            Opts::new("requests_total", "Total requests").namespace("satellite"),
            &["method", "status"],
        )?;
        registry.register(Box::new(request_count.clone()))?;

        let pixels_streamed = IntCounter::with_opts(
            Opts::new("pixels_streamed_total", "Pixels sent on area streams")
                .namespace("satellite"),
        )?;
        registry.register(Box::new(pixels_streamed.clone()))?;

        let active_streams = Gauge::with_opts(
            Opts::new("active_streams", "Area streams currently producing")
                .namespace("satellite"),
        )?;
        registry.register(Box::new(active_streams.clone()))?;

        Ok(Self {
            registry,
            request_latency,
            request_count,
            pixels_streamed,
            active_streams,
        })
    }

    /// Records a finished request
    pub fn record_request(&self, method: &str, status: &str, latency_secs: f64) {
        self.request_latency
            .with_label_values(&[method, status])
            .observe(latency_secs);
        self.request_count
            .with_label_values(&[method, status])
            .inc();
    }

    /// Counts one delivered pixel
    pub fn record_pixel(&self) {
        self.pixels_streamed.inc();
    }

    /// Marks an area stream as started
    pub fn stream_started(&self) {
        self.active_streams.inc();
    }

    /// Marks an area stream as finished
    pub fn stream_finished(&self) {
        self.active_streams.dec();
    }

    /// Renders every metric in the Prometheus text format
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for ServiceMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceMetrics")
            .field("pixels_streamed", &self.pixels_streamed.get())
            .field("active_streams", &self.active_streams.get())
            .finish_non_exhaustive()
    }
}
