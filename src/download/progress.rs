//! Classification of raw yt-dlp output lines into progress events.
//!
//! Rules are evaluated in order and the first match wins. Classification is
//! stateless: the same line always yields the same event.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::download::events::ProgressEvent;

static PERCENT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("percent regex"));

/// Case-sensitive markers of a diagnostic line.
const DIAGNOSTIC_MARKERS: &[&str] = &["HTTP Error", "Unable to extract", "blocked", "unavailable"];

/// Percent shown for diagnostic passthrough lines.
pub const DIAGNOSTIC_PERCENT: u8 = 15;
/// Lower edge of the transfer band.
pub const TRANSFER_BAND_START: f64 = 20.0;
/// Width of the transfer band (20% to 95%).
pub const TRANSFER_BAND_SCALE: f64 = 0.75;
pub const STARTING_PERCENT: u8 = 25;
pub const FINISHING_PERCENT: u8 = 95;

/// A classification rule: predicate plus event constructor.
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
    pub build: fn(&str) -> ProgressEvent,
}

/// Rules in precedence order.
pub static RULES: &[Rule] = &[
    Rule {
        name: "diagnostic",
        matches: is_diagnostic,
        build: diagnostic_event,
    },
    Rule {
        name: "percentage",
        matches: has_percentage,
        build: percentage_event,
    },
    Rule {
        name: "downloading",
        matches: is_downloading,
        build: |_| ProgressEvent::progress(STARTING_PERCENT, "starting file download…"),
    },
    Rule {
        name: "completed",
        matches: is_completed,
        build: |_| ProgressEvent::progress(FINISHING_PERCENT, "finishing…"),
    },
];

/// Classify one output line. Blank lines and unrecognised lines yield `None`.
pub fn classify(line: &str) -> Option<ProgressEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    RULES.iter().find(|rule| (rule.matches)(line)).map(|rule| (rule.build)(line))
}

/// Maps a tool-reported percentage onto the 20-95 display band.
pub fn display_percent(raw: f64) -> u8 {
    let raw = raw.clamp(0.0, 100.0);
    (TRANSFER_BAND_START + raw * TRANSFER_BAND_SCALE).floor() as u8
}

fn is_diagnostic(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("error") || lower.contains("warning") || DIAGNOSTIC_MARKERS.iter().any(|m| line.contains(m))
}

fn diagnostic_event(line: &str) -> ProgressEvent {
    ProgressEvent::progress(DIAGNOSTIC_PERCENT, format!("debug: {}", line))
}

fn extract_percent(line: &str) -> Option<f64> {
    PERCENT_REGEX
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

fn has_percentage(line: &str) -> bool {
    extract_percent(line).is_some()
}

fn percentage_event(line: &str) -> ProgressEvent {
    let raw = extract_percent(line).unwrap_or_default().clamp(0.0, 100.0);
    ProgressEvent::progress(display_percent(raw), format!("downloading… {:.1}%", raw))
}

fn is_downloading(line: &str) -> bool {
    line.to_lowercase().contains("downloading")
}

fn is_completed(line: &str) -> bool {
    line.contains("100%") || line.to_lowercase().contains("download completed")
}
