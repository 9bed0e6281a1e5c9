//! Prometheus text exposition format.
//!
//! Renders the samples of one scrape into the text format understood by
//! a Prometheus server or compatible agent.

use crate::sample::{Descriptor, MetricSample};

/// Content type of the rendered output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render scrape samples into Prometheus text format.
///
/// Every metric family gets its HELP and TYPE lines even when it has no
/// samples. Within a family, samples are sorted by label so the output is
/// stable across scrapes.
pub fn render_prometheus(samples: &[MetricSample]) -> String {
    let mut out = String::new();

    for descriptor in Descriptor::ALL {
        let name = descriptor.name();
        out.push_str(&format!("# HELP {name} {}.\n", descriptor.help()));
        out.push_str(&format!("# TYPE {name} {}\n", descriptor.kind().as_str()));

        let mut family: Vec<&MetricSample> = samples
            .iter()
            .filter(|s| s.descriptor == descriptor)
            .collect();
        family.sort_by(|a, b| a.labels.cmp(&b.labels));

        for sample in family {
            out.push_str(name);
            if !sample.labels.is_empty() {
                out.push('{');
                for (i, (key, value)) in sample.labels.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&format!("{key}=\"{}\"", escape_label_value(value)));
                }
                out.push('}');
            }
            out.push_str(&format!(" {}\n", format_value(sample.value)));
        }
    }

    out
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let inf = if value > 0.0 { "+Inf" } else { "-Inf" };
        inf.to_string()
    } else {
        value.to_string()
    }
}
