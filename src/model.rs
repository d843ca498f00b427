use serde::Serialize;
use std::collections::BTreeMap;

/// Metric type every sample and definition is filed under.
pub const METRIC_TYPE: &str = "sma";

/// Name of the synthetic availability metric.
pub const ONLINE: &str = "online";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceEndpoint {
    pub base_url: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

/// Static description of one tracked inverter channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDescriptor {
    pub device_key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub unit: &'static str,
    pub kind: MetricKind,
    pub factor: f64,
}

/// One scaled reading; `None` when the device reported null.
pub type RawFieldValue = Option<f64>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
    pub unit: String,
}

/// Shape of all metrics of one type, as registered by a consumer before it starts
/// draining samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDefinitions {
    #[serde(rename = "type")]
    pub metric_type: String,
    pub tags: Vec<String>,
    pub metrics: Vec<MetricDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    #[serde(rename = "type")]
    pub metric_type: String,
    /// Serial number reported by the inverter.
    pub device: String,
    pub timestamp: f64,
    pub values: BTreeMap<String, f64>,
}

impl MetricSample {
    pub fn online(&self) -> bool {
        self.values.get(ONLINE).map_or(false, |v| *v > 0.0)
    }
}
