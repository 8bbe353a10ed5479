use opentelemetry::{
    global,
    metrics::{Counter, Histogram, MeterProvider},
    KeyValue,
};
use prometheus::Registry;

pub struct Metrics {
    relay_requests: Counter<u64>,
    relay_duration: Histogram<u64>,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        // TODO: deprecated crate to be replaced with an OLTP exporter
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()
            .unwrap();

        let provider = opentelemetry_sdk::metrics::SdkMeterProvider::builder()
            .with_reader(exporter)
            .build();

        let meter = provider.meter("dogspot_gateway");
        global::set_meter_provider(provider);

        let relay_requests = meter
            .u64_counter("relay_requests_total")
            .with_description("Total number of relayed requests")
            .build();

        // Latency here is dominated by the upstream round trip, so the
        // buckets stretch to the request timeout rather than clustering
        // around local handler times.
        let relay_duration = meter
            .u64_histogram("relay_duration_ms")
            .with_boundaries(vec![
                50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0,
            ])
            .with_description("Duration of relayed requests in milliseconds")
            .build();

        Metrics {
            relay_requests,
            relay_duration,
            registry,
        }
    }

    pub fn record_request(&self, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.relay_requests.add(1, &attributes);
    }

    pub fn record_relay_duration(&self, duration_ms: u64, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.relay_duration.record(duration_ms, &attributes);
    }
}
