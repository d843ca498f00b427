use crate::model::{
    FieldDescriptor, MetricDefinition, MetricDefinitions,
    MetricKind::{Counter, Gauge},
    METRIC_TYPE, ONLINE,
};
use std::collections::HashMap;

/// Grid frequency; the inverter counts as offline while it is not reported.
pub const FREQUENCY: &str = "frequency";

macro_rules! field {
    ($key:expr, $name:expr, $description:expr, $unit:expr, $kind:expr, $factor:expr) => {
        FieldDescriptor {
            device_key: $key,
            name: $name,
            description: $description,
            unit: $unit,
            kind: $kind,
            factor: $factor,
        }
    };
}

pub static FIELDS: [FieldDescriptor; 20] = [
    field!("6100_40263F00", "grid_power", "Grid power", "W", Gauge, 1.0),
    field!("6100_00465700", FREQUENCY, "Frequency", "Hz", Gauge, 100.0),
    field!("6100_00464800", "voltage_l1", "Voltage L1", "V", Gauge, 100.0),
    field!("6100_00464900", "voltage_l2", "Voltage L2", "V", Gauge, 100.0),
    field!("6100_00464A00", "voltage_l3", "Voltage L3", "V", Gauge, 100.0),
    field!("6100_40465300", "current_l1", "Current L1", "A", Gauge, 1000.0),
    field!("6100_40465400", "current_l2", "Current L2", "A", Gauge, 1000.0),
    field!("6100_40465500", "current_l3", "Current L3", "A", Gauge, 1000.0),
    field!("6100_0046C200", "pv_power", "PV power", "W", Gauge, 1.0),
    field!(
        "6380_40451F00",
        "pv_voltage",
        "PV voltage (average of all PV channels)",
        "V",
        Gauge,
        100.0
    ),
    field!(
        "6380_40452100",
        "pv_current",
        "PV current (average of all PV channels)",
        "A",
        Gauge,
        1000.0
    ),
    field!("6400_0046C300", "pv_gen_meter", "PV generation meter", "Wh", Counter, 1.0),
    field!("6400_00260100", "total_yield", "Total yield", "Wh", Counter, 1.0),
    field!("6400_00262200", "daily_yield", "Daily yield", "Wh", Counter, 1.0),
    field!("6100_40463600", "grid_power_supplied", "Grid power supplied", "W", Gauge, 1.0),
    field!("6100_40463700", "grid_power_absorbed", "Grid power absorbed", "W", Gauge, 1.0),
    field!("6400_00462400", "grid_total_yield", "Grid total yield", "Wh", Counter, 1.0),
    field!("6400_00462500", "grid_total_absorbed", "Grid total absorbed", "Wh", Counter, 1.0),
    field!("6100_00543100", "current_consumption", "Current consumption", "W", Gauge, 1.0),
    field!("6400_00543A00", "total_consumption", "Total consumption", "Wh", Counter, 1.0),
];

lazy_static! {
    static ref BY_DEVICE_KEY: HashMap<&'static str, &'static FieldDescriptor> =
        FIELDS.iter().map(|f| (f.device_key, f)).collect();
}

pub fn lookup(device_key: &str) -> Option<&'static FieldDescriptor> {
    BY_DEVICE_KEY.get(device_key).copied()
}

/// Device keys requested from the inverter on every poll.
pub fn device_keys() -> Vec<&'static str> {
    FIELDS.iter().map(|f| f.device_key).collect()
}

/// Definitions of every metric a sample can carry, `online` first.
pub fn metric_definitions() -> MetricDefinitions {
    let online = MetricDefinition {
        name: ONLINE.to_string(),
        description: "Indicates if the SMA device is operating".to_string(),
        kind: Gauge,
        unit: "Boolean".to_string(),
    };

    let metrics = std::iter::once(online)
        .chain(FIELDS.iter().map(|f| MetricDefinition {
            name: f.name.to_string(),
            description: f.description.to_string(),
            kind: f.kind,
            unit: f.unit.to_string(),
        }))
        .collect();

    MetricDefinitions {
        metric_type: METRIC_TYPE.to_string(),
        tags: vec!["device".to_string()],
        metrics,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keys_and_names_are_unique() {
        let keys: HashSet<_> = FIELDS.iter().map(|f| f.device_key).collect();
        let names: HashSet<_> = FIELDS.iter().map(|f| f.name).collect();
        assert_eq!(FIELDS.len(), keys.len());
        assert_eq!(FIELDS.len(), names.len());
        assert!(!names.contains(ONLINE));
    }

    #[test]
    fn lookup_frequency() {
        let field = lookup("6100_00465700").unwrap();
        assert_eq!(FREQUENCY, field.name);
        assert_eq!(100.0, field.factor);
        assert!(lookup("6180_08214800").is_none());
    }

    #[test]
    fn definitions_include_online() {
        let definitions = metric_definitions();
        assert_eq!("sma", definitions.metric_type);
        assert_eq!(vec!["device".to_string()], definitions.tags);
        assert_eq!(FIELDS.len() + 1, definitions.metrics.len());
        assert_eq!(ONLINE, definitions.metrics[0].name);
        assert_eq!("Boolean", definitions.metrics[0].unit);
    }
}
