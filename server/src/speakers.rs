//! `Speaker N:` labels in scripts.

use once_cell::sync::Lazy;
use regex::Regex;
use speech_core::CATALOG_SIZE;

/// Preset buttons shown above the custom count input.
pub const SPEAKER_PRESETS: [usize; 4] = [1, 2, 3, 4];

static SPEAKER_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Speaker\s+(\d+):").expect("speaker label pattern is valid"));

/// Highest `Speaker N:` label in the script, if any label is present.
///
/// Labels numbered 0 or too large to parse are ignored.
pub fn detect_speaker_count(script: &str) -> Option<usize> {
    SPEAKER_LABEL
        .captures_iter(script)
        .filter_map(|caps| caps[1].parse::<usize>().ok())
        .filter(|&n| n >= 1)
        .max()
}

/// Empty dialogue skeleton for `count` speakers, clamped to the voice catalog.
pub fn speaker_template(count: usize) -> String {
    let count = count.clamp(1, CATALOG_SIZE);
    if count == 1 {
        return "Speaker 1: ".to_string();
    }
    (1..=count)
        .map(|i| format!("Speaker {}: ", i))
        .collect::<Vec<_>>()
        .join("\n\n")
}
