//! Enum (state set) metric
//!
//! Exposed as a gauge family with one extra label named after the metric:
//! the current state reads 1, every other declared state reads 0. The
//! family is built from the current state at collection time, so a
//! snapshot always shows exactly one active state.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use prometheus::core::{Collector, Desc};
use prometheus::proto::{self, LabelPair, MetricFamily, MetricType};

use crate::errors::{ExporterError, Result};
use crate::labels::Labels;

struct EnumCore {
    name: String,
    states: Vec<String>,
    desc: Desc,
    current: Mutex<usize>,
}

/// Handle to a declared enum metric. Clones share the same state.
#[derive(Clone)]
pub struct EnumHandle {
    core: Arc<EnumCore>,
}

impl EnumHandle {
    /// Build the enum, starting in the first declared state.
    pub(crate) fn new(
        name: &str,
        help: &str,
        states: Option<Vec<String>>,
        labels: &Labels,
    ) -> Result<Self> {
        let states = validate_states(name, states)?;
        if labels.contains_key(name) {
            return Err(ExporterError::invalid_configuration(format!(
                "enum '{}' cannot use its own name as a label",
                name
            )));
        }

        let const_labels: HashMap<String, String> = labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let desc = Desc::new(
            name.to_string(),
            help.to_string(),
            vec![name.to_string()],
            const_labels,
        )?;

        Ok(Self {
            core: Arc::new(EnumCore {
                name: name.to_string(),
                states,
                desc,
                current: Mutex::new(0),
            }),
        })
    }

    /// Switch to `state`.
    ///
    /// Fails with `InvalidState` if `state` was not declared; the current
    /// state is left unchanged in that case.
    pub fn set_state(&self, state: &str) -> Result<()> {
        let index = self
            .core
            .states
            .iter()
            .position(|s| s == state)
            .ok_or_else(|| {
                ExporterError::invalid_state(format!(
                    "'{}' is not a declared state of enum '{}' (states: {})",
                    state,
                    self.core.name,
                    self.core.states.join(", ")
                ))
            })?;

        *self.core.current.lock() = index;
        Ok(())
    }

    /// Current state
    pub fn state(&self) -> &str {
        let index = *self.core.current.lock();
        &self.core.states[index]
    }

    pub fn states(&self) -> &[String] {
        &self.core.states
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }
}

impl Collector for EnumHandle {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.core.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let active = *self.core.current.lock();

        let metrics = self
            .core
            .states
            .iter()
            .enumerate()
            .map(|(i, state)| {
                let mut state_label = LabelPair::default();
                state_label.set_name(self.core.name.clone());
                state_label.set_value(state.clone());

                let mut labels = self.core.desc.const_label_pairs.clone();
                labels.push(state_label);
                labels.sort_by(|a, b| a.name().cmp(b.name()));

                let mut gauge = proto::Gauge::default();
                gauge.set_value(if i == active { 1.0 } else { 0.0 });

                let mut metric = proto::Metric::from_gauge(gauge);
                metric.set_label(labels);
                metric
            })
            .collect();

        let mut family = MetricFamily::default();
        family.set_name(self.core.desc.fq_name.clone());
        family.set_help(self.core.desc.help.clone());
        family.set_field_type(MetricType::GAUGE);
        family.set_metric(metrics);
        vec![family]
    }
}

impl std::fmt::Debug for EnumHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnumHandle")
            .field("name", &self.core.name)
            .field("states", &self.core.states)
            .field("state", &self.state())
            .finish()
    }
}

fn validate_states(name: &str, states: Option<Vec<String>>) -> Result<Vec<String>> {
    let states = states.ok_or_else(|| {
        ExporterError::invalid_configuration(format!("enum '{}' requires a list of states", name))
    })?;
    if states.is_empty() {
        return Err(ExporterError::invalid_configuration(format!(
            "enum '{}' requires at least one state",
            name
        )));
    }
    for (i, state) in states.iter().enumerate() {
        if states[..i].contains(state) {
            return Err(ExporterError::invalid_configuration(format!(
                "enum '{}' declares state '{}' more than once",
                name, state
            )));
        }
    }
    Ok(states)
}
