use crate::model::MetricSample;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Unbounded buffer of samples between the pollers and the metrics consumer.
///
/// Samples are pushed to the front and drained from the back, so a drain yields them
/// in arrival order. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MetricsQueue {
    samples: Arc<Mutex<VecDeque<MetricSample>>>,
}

impl MetricsQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, sample: MetricSample) {
        match self.samples.lock() {
            Ok(mut samples) => samples.push_front(sample),
            Err(e) => log::error!("Got unexpected error while enqueueing metrics: {}", e),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.lock().map_or(0, |samples| samples.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lazily remove and yield the samples buffered at the time of the call, oldest first.
    /// Samples enqueued while draining are left for the next call.
    pub fn drain_all(&self) -> Drain<'_> {
        Drain {
            queue: self,
            remaining: self.len(),
        }
    }
}

pub struct Drain<'a> {
    queue: &'a MetricsQueue,
    remaining: usize,
}

impl Iterator for Drain<'_> {
    type Item = MetricSample;

    fn next(&mut self) -> Option<MetricSample> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        match self.queue.samples.lock() {
            Ok(mut samples) => samples.pop_back(),
            Err(e) => {
                log::error!("Got unexpected error while draining metrics: {}", e);
                self.remaining = 0;
                None
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::BTreeMap;

    fn sample(device: &str, timestamp: f64) -> MetricSample {
        MetricSample {
            metric_type: "sma".to_string(),
            device: device.to_string(),
            timestamp,
            values: BTreeMap::new(),
        }
    }

    #[test]
    fn drain_in_arrival_order() {
        let queue = MetricsQueue::new();
        queue.enqueue(sample("SN", 1.0));
        queue.enqueue(sample("SN", 2.0));
        queue.enqueue(sample("SN", 3.0));

        let drained: Vec<f64> = queue.drain_all().map(|s| s.timestamp).collect();
        assert_eq!(vec![1.0, 2.0, 3.0], drained);
        assert!(queue.is_empty());
        assert_eq!(0, queue.drain_all().count());
    }

    #[test]
    fn drain_empty() {
        assert_eq!(0, MetricsQueue::new().drain_all().count());
    }

    #[test]
    fn drain_only_takes_what_was_buffered() {
        let queue = MetricsQueue::new();
        queue.enqueue(sample("SN", 1.0));
        queue.enqueue(sample("SN", 2.0));

        let mut drain = queue.drain_all();
        assert_eq!(Some(1.0), drain.next().map(|s| s.timestamp));
        queue.enqueue(sample("SN", 3.0));
        assert_eq!(Some(2.0), drain.next().map(|s| s.timestamp));
        assert_eq!(None, drain.next());

        let rest: Vec<f64> = queue.drain_all().map(|s| s.timestamp).collect();
        assert_eq!(vec![3.0], rest);
    }

    #[test]
    fn clones_share_buffer() {
        let producer = MetricsQueue::new();
        let consumer = producer.clone();

        let handle = std::thread::spawn(move || {
            for i in 0..100_u32 {
                producer.enqueue(sample("SN", f64::from(i)));
            }
        });
        handle.join().unwrap();

        let drained: Vec<f64> = consumer.drain_all().map(|s| s.timestamp).collect();
        assert_eq!((0..100_u32).map(f64::from).collect::<Vec<_>>(), drained);
    }
}
