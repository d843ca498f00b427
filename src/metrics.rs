use prometheus::{Encoder, GaugeVec, TextEncoder};
use smawebconnect_rs::model::MetricSample;
use smawebconnect_rs::{catalog, Error, MetricsQueue};
use std::collections::HashMap;

lazy_static! {
    /// One gauge per metric definition. Counter fields are exported as gauges too, since
    /// the inverter reports absolute totals.
    static ref SAMPLE_GAUGES: HashMap<String, GaugeVec> = catalog::metric_definitions()
        .metrics
        .into_iter()
        .map(|definition| {
            let gauge = register_gauge_vec!(
                opts!(
                    format!("sma_{}", definition.name),
                    format!(
                        "{} ({}, {})",
                        definition.description,
                        definition.kind.as_str(),
                        definition.unit
                    ),
                ),
                &["device"],
            )
            .unwrap();
            (definition.name, gauge)
        })
        .collect();
    static ref SAMPLE_TIMESTAMP_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "sma_sample_timestamp_seconds",
            "unix time of the last sample read from the device",
        ),
        &["device"],
    )
    .unwrap();
}

/// Feed one sample to the Prometheus gauges. Metrics missing from the sample keep their
/// previous value.
fn process_sample(sample: &MetricSample) {
    for (name, value) in &sample.values {
        match SAMPLE_GAUGES.get(name) {
            Some(gauge) => gauge.with_label_values(&[&sample.device]).set(*value),
            None => log::warn!("No gauge registered for metric {}", name),
        }
    }

    SAMPLE_TIMESTAMP_GAUGE
        .with_label_values(&[&sample.device])
        .set(sample.timestamp);
}

/// Drain every buffered sample into the Prometheus registry. Returns the number of samples.
pub fn collect(queue: &MetricsQueue) -> usize {
    let mut count = 0;
    for sample in queue.drain_all() {
        process_sample(&sample);
        count += 1;
    }
    count
}

/// Read metrics from Prometheus exporter registry.
pub fn read() -> Result<String, Error> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder
        .encode(&metric_families, &mut buffer)
        .or(Err(Error::FormatError))?;
    String::from_utf8(buffer).or(Err(Error::FormatError))
}
