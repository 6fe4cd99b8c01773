//! Label sets and the default-label merge.

use std::collections::{BTreeMap, BTreeSet};

/// Label key/value pairs, ordered by key.
///
/// Ordering by key keeps the label-name list handed to the metric store
/// stable, so the same declaration always yields the same store layout.
pub type Labels = BTreeMap<String, String>;

/// Merge per-metric labels with the exporter's default labels.
///
/// The per-metric labels are copied first and the defaults are written over
/// them, so a default label replaces a per-metric label with the same key.
pub fn merge_labels(defaults: &Labels, labels: Option<&Labels>) -> Labels {
    let mut merged = labels.cloned().unwrap_or_default();
    merged.extend(defaults.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Label keys of a label set
pub fn label_keys(labels: &Labels) -> BTreeSet<String> {
    labels.keys().cloned().collect()
}
