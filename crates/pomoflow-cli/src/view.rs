//! Display formatting for the terminal view.
//!
//! Two rendering modes for remaining time: `H:MM` and `H:MM:SS`.
//! Formatting only; the clock itself deals in seconds.

use pomoflow_core::Phase;

/// `H:MM` rendering of a second count (seconds truncated).
pub fn format_hm(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    format!("{hours}:{minutes:02}")
}

/// `H:MM:SS` rendering of a second count.
pub fn format_hms(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

pub fn phase_icon(phase: Phase) -> &'static str {
    match phase {
        Phase::Work => "🍅",
        Phase::ShortBreak => "☕",
        Phase::LongBreak => "🌴",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hm_truncates_seconds() {
        assert_eq!(format_hm(0), "0:00");
        assert_eq!(format_hm(59), "0:00");
        assert_eq!(format_hm(25 * 60), "0:25");
        assert_eq!(format_hm(5415), "1:30");
    }

    #[test]
    fn hms_shows_all_components() {
        assert_eq!(format_hms(0), "0:00:00");
        assert_eq!(format_hms(59), "0:00:59");
        assert_eq!(format_hms(5415), "1:30:15");
        assert_eq!(format_hms(2 * 3600 + 5), "2:00:05");
    }
}
