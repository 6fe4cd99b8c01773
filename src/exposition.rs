//! Exposition formats
//!
//! Prometheus text 0.0.4 comes straight from `prometheus::TextEncoder`.
//! OpenMetrics 1.0.0 is derived from that output line by line.

use std::collections::HashSet;

use prometheus::proto::MetricFamily;
use prometheus::{Encoder, TextEncoder};

use crate::errors::{ExporterError, Result};

const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";
const OPENMETRICS_MEDIA_TYPE: &str = "application/openmetrics-text";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpositionFormat {
    #[default]
    Text,
    OpenMetrics,
}

impl ExpositionFormat {
    /// Pick a format from an HTTP `Accept` value.
    ///
    /// OpenMetrics is chosen when any media range names it; everything
    /// else, including no header, gets the text format.
    pub fn negotiate(accept: Option<&str>) -> Self {
        let wants_openmetrics = accept
            .map(|value| {
                value.split(',').any(|range| {
                    let media_type = range.split(';').next().unwrap_or_default().trim();
                    media_type.eq_ignore_ascii_case(OPENMETRICS_MEDIA_TYPE)
                })
            })
            .unwrap_or(false);

        if wants_openmetrics {
            ExpositionFormat::OpenMetrics
        } else {
            ExpositionFormat::Text
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExpositionFormat::Text => TEXT_CONTENT_TYPE,
            ExpositionFormat::OpenMetrics => OPENMETRICS_CONTENT_TYPE,
        }
    }

    pub fn encode(&self, families: &[MetricFamily]) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(families, &mut buffer)
            .map_err(|e| ExporterError::encoding(format!("failed to encode metrics: {}", e)))?;
        let text = String::from_utf8(buffer)?;

        Ok(match self {
            ExpositionFormat::Text => text,
            ExpositionFormat::OpenMetrics => to_openmetrics(&text)?,
        })
    }
}

/// An encoded registry snapshot
#[derive(Debug, Clone)]
pub struct Snapshot {
    format: ExpositionFormat,
    body: String,
}

impl Snapshot {
    pub fn new(format: ExpositionFormat, body: String) -> Self {
        Self { format, body }
    }

    pub fn format(&self) -> ExpositionFormat {
        self.format
    }

    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    pub fn as_str(&self) -> &str {
        &self.body
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.body.as_bytes()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body.into_bytes()
    }
}

// Counter families lose the `_total` suffix in their descriptors and their
// samples gain it. `untyped` becomes `unknown`. HELP lines are held back
// until the TYPE line tells us whether the family is a counter, and quotes
// in them are escaped. A family whose name is already taken, by another
// family or by a counter's samples, fails the encoding.
fn to_openmetrics(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len() + 8);
    let mut pending_help: Option<(&str, &str)> = None;
    let mut counter_family: Option<String> = None;
    let mut taken: HashSet<String> = HashSet::new();

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("# HELP ") {
            let (name, help) = rest.split_once(' ').unwrap_or((rest, ""));
            pending_help = Some((name, help));
            continue;
        }

        if let Some(rest) = line.strip_prefix("# TYPE ") {
            let (name, kind) = rest.split_once(' ').unwrap_or((rest, "unknown"));
            let (family, kind) = match kind {
                "counter" => (name.strip_suffix("_total").unwrap_or(name), kind),
                "untyped" => (name, "unknown"),
                _ => (name, kind),
            };

            let mut names = vec![family.to_string()];
            if kind == "counter" {
                names.push(format!("{}_total", family));
            }
            if let Some(clash) = names.iter().find(|n| taken.contains(n.as_str())) {
                return Err(ExporterError::encoding(format!(
                    "metric family '{}' clashes with '{}' in OpenMetrics",
                    name, clash
                )));
            }
            taken.extend(names);
            counter_family = (kind == "counter").then(|| family.to_string());

            if let Some((help_name, help)) = pending_help.take() {
                if help_name == name {
                    push_line(
                        &mut out,
                        &format!("# HELP {} {}", family, help.replace('"', "\\\"")),
                    );
                }
            }
            push_line(&mut out, &format!("# TYPE {} {}", family, kind));
            continue;
        }

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match &counter_family {
            Some(family) => push_line(&mut out, &counter_sample(line, family)),
            None => push_line(&mut out, line),
        }
    }

    out.push_str("# EOF\n");
    Ok(out)
}

fn counter_sample(line: &str, family: &str) -> String {
    let split = line.find(['{', ' ']).unwrap_or(line.len());
    let (name, rest) = line.split_at(split);
    if name == family {
        format!("{}_total{}", name, rest)
    } else {
        line.to_string()
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}
