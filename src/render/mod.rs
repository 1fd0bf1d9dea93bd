// Renderer/consumer collaborators
// Terminal and JSON-lines sinks for updated series snapshots

use crate::history::{series, HistorySnapshot};
use crate::poller::MetricFailure;
use colored::*;
use serde_json::json;

/// Consumer of poll updates and per-metric failure diagnostics
///
/// Called once per group per tick with the full updated snapshot, so
/// repeated calls with the same snapshot must produce the same output.
/// Implementations must not block for long relative to the refresh
/// interval; a slow sink causes tick drift, not loop failure.
pub trait TelemetrySink: Send + Sync {
    fn on_update(&self, group: &str, events: &HistorySnapshot);

    fn on_failure(&self, failure: &MetricFailure);
}

const SPARK_BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render a value series as a unicode sparkline
pub fn sparkline(values: &[f64]) -> String {
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return String::new();
    };
    let max = values.iter().copied().fold(min, f64::max);
    let span = max - min;

    values
        .iter()
        .map(|v| {
            let idx = if span <= f64::EPSILON {
                0
            } else {
                (((v - min) / span) * 7.0).round() as usize
            };
            SPARK_BARS[idx.min(7)]
        })
        .collect()
}

/// Colored terminal renderer: latest value plus trend per metric
pub struct ConsoleRenderer;

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySink for ConsoleRenderer {
    fn on_update(&self, group: &str, events: &HistorySnapshot) {
        let Some(latest) = events.last() else {
            return;
        };

        println!(
            "{} {}  {}",
            "▸".bright_cyan(),
            group.bright_white().bold(),
            format!("({} polls)", events.len()).bright_black()
        );

        if latest.samples.is_empty() {
            println!("    {}", "no data available in the lookback window".bright_black());
            return;
        }

        for sample in &latest.samples {
            let values: Vec<f64> = series(events, &sample.metric)
                .into_iter()
                .map(|(_, v)| v)
                .collect();
            println!(
                "    {:<28} {:>14.4} {:<8} {}  {}",
                sample.metric,
                sample.average,
                sample.unit.yellow(),
                sparkline(&values).green(),
                sample.timestamp.format("%H:%M:%S").to_string().bright_black()
            );
        }
    }

    fn on_failure(&self, failure: &MetricFailure) {
        eprintln!(
            "{} {}/{}: {}",
            "✗".red().bold(),
            failure.group,
            failure.metric,
            failure.error
        );
    }
}

/// JSON-lines renderer for piping into other tools
pub struct JsonRenderer;

impl JsonRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Pure formatting helper, one line per update
    pub fn update_line(group: &str, events: &HistorySnapshot) -> String {
        json!({
            "group": group,
            "polls": events.len(),
            "latest": events.last(),
        })
        .to_string()
    }

    pub fn failure_line(failure: &MetricFailure) -> String {
        json!({
            "group": failure.group,
            "metric": failure.metric,
            "error": failure.error.to_string(),
        })
        .to_string()
    }
}

impl Default for JsonRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySink for JsonRenderer {
    fn on_update(&self, group: &str, events: &HistorySnapshot) {
        println!("{}", Self::update_line(group, events));
    }

    fn on_failure(&self, failure: &MetricFailure) {
        println!("{}", Self::failure_line(failure));
    }
}
