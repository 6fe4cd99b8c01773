//! Summary metric
//!
//! The store has no summary type, so this is a small collector of its own
//! exposing `<name>_sum` and `<name>_count` with label values fixed at
//! construction.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use prometheus::core::{Collector, Desc};
use prometheus::proto::{self, MetricFamily, MetricType};

use crate::errors::Result;
use crate::labels::Labels;

#[derive(Debug, Default, Clone, Copy)]
struct SummaryState {
    count: u64,
    sum: f64,
}

#[derive(Debug)]
struct SummaryCore {
    desc: Desc,
    state: Mutex<SummaryState>,
}

/// A count/sum summary. Clones share the same state.
#[derive(Debug, Clone)]
pub struct Summary {
    core: Arc<SummaryCore>,
}

impl Summary {
    pub fn new(name: &str, help: &str, labels: &Labels) -> Result<Self> {
        let const_labels: HashMap<String, String> = labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let desc = Desc::new(name.to_string(), help.to_string(), Vec::new(), const_labels)?;

        Ok(Self {
            core: Arc::new(SummaryCore {
                desc,
                state: Mutex::new(SummaryState::default()),
            }),
        })
    }

    pub fn observe(&self, value: f64) {
        let mut state = self.core.state.lock();
        state.count += 1;
        state.sum += value;
    }

    pub fn get_sample_count(&self) -> u64 {
        self.core.state.lock().count
    }

    pub fn get_sample_sum(&self) -> f64 {
        self.core.state.lock().sum
    }
}

impl Collector for Summary {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.core.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let state = *self.core.state.lock();

        let mut summary = proto::Summary::default();
        summary.set_sample_count(state.count);
        summary.set_sample_sum(state.sum);

        let mut metric = proto::Metric::default();
        metric.set_label(self.core.desc.const_label_pairs.clone());
        metric.set_summary(summary);

        let mut family = MetricFamily::default();
        family.set_name(self.core.desc.fq_name.clone());
        family.set_help(self.core.desc.help.clone());
        family.set_field_type(MetricType::SUMMARY);
        family.set_metric(vec![metric]);
        vec![family]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Encoder, TextEncoder};

    #[test]
    fn test_observe_accumulates() {
        let summary = Summary::new("latency_seconds", "Latency", &Labels::new()).unwrap();
        summary.observe(0.5);
        summary.observe(1.5);
        assert_eq!(summary.get_sample_count(), 2);
        assert_eq!(summary.get_sample_sum(), 2.0);
    }

    #[test]
    fn test_clones_share_state() {
        let summary = Summary::new("shared_seconds", "Shared", &Labels::new()).unwrap();
        let other = summary.clone();
        other.observe(3.0);
        assert_eq!(summary.get_sample_count(), 1);
    }

    #[test]
    fn test_text_exposition() {
        let labels = crate::labels! { "job" => "api" };
        let summary = Summary::new("request_seconds", "Request time", &labels).unwrap();
        summary.observe(2.0);

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&summary.collect(), &mut buffer)
            .unwrap();
        let output = String::from_utf8(buffer).unwrap();

        assert!(output.contains("# TYPE request_seconds summary"));
        assert!(output.contains("request_seconds_sum{job=\"api\"} 2"));
        assert!(output.contains("request_seconds_count{job=\"api\"} 1"));
    }

    #[test]
    fn test_invalid_name_rejected() {
        assert!(Summary::new("bad name", "help", &Labels::new()).is_err());
    }
}
