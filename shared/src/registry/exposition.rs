//! Text exposition format.
//!
//! Renders a [`RegistrySnapshot`] in the line-based pull-scrape format:
//! `# HELP` and `# TYPE` headers per family, then one sample line per series
//! (`_bucket`, `_sum` and `_count` lines for histograms).

use super::snapshot::{FamilySnapshot, RegistrySnapshot, SampleValue};
use std::fmt::Write;

/// Content type of [`render`] output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Renders every family that has at least one series.
#[must_use]
pub fn render(snapshot: &RegistrySnapshot) -> String {
    let mut out = String::new();
    for family in snapshot.families.iter().filter(|f| !f.series.is_empty()) {
        write_family(&mut out, family);
    }
    out
}

fn write_family(out: &mut String, family: &FamilySnapshot) {
    let name = &family.name;
    // Writing into a String cannot fail.
    let _ = writeln!(out, "# HELP {name} {}", escape_help(&family.help));
    let _ = writeln!(out, "# TYPE {name} {}", family.kind);

    for series in &family.series {
        let labels = label_pairs(&family.label_keys, &series.label_values);
        match &series.value {
            SampleValue::Counter(v) | SampleValue::Gauge(v) => {
                let _ = writeln!(out, "{name}{} {}", braces(&labels), format_value(*v));
            }
            SampleValue::Histogram(h) => {
                for (bound, count) in &h.buckets {
                    let le = with_le(&labels, &format_value(*bound));
                    let _ = writeln!(out, "{name}_bucket{{{le}}} {count}");
                }
                let le = with_le(&labels, "+Inf");
                let _ = writeln!(out, "{name}_bucket{{{le}}} {}", h.count);
                let _ = writeln!(out, "{name}_sum{} {}", braces(&labels), format_value(h.sum));
                let _ = writeln!(out, "{name}_count{} {}", braces(&labels), h.count);
            }
        }
    }
}

fn label_pairs(keys: &[String], values: &[String]) -> String {
    keys.iter()
        .zip(values)
        .map(|(k, v)| format!("{k}=\"{}\"", escape_label_value(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn braces(labels: &str) -> String {
    if labels.is_empty() {
        String::new()
    } else {
        format!("{{{labels}}}")
    }
}

fn with_le(labels: &str, bound: &str) -> String {
    if labels.is_empty() {
        format!("le=\"{bound}\"")
    } else {
        format!("{labels},le=\"{bound}\"")
    }
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() && v > 0.0 {
        "+Inf".to_string()
    } else if v.is_infinite() {
        "-Inf".to_string()
    } else {
        v.to_string()
    }
}

fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}
