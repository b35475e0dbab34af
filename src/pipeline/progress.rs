//! Per-stage progress bars.

use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressStyle};

const STAGE_TEMPLATE: &str =
    "{prefix:>16.cyan.bold} [{bar:40.magenta}] {pos}/{len} {wide_msg} | Elapsed: {elapsed}";

/// Whether progress bars should be drawn at all.
///
/// Bars are only useful on an interactive stderr.
#[must_use]
pub fn progress_enabled(quiet: bool) -> bool {
    !quiet && std::io::stderr().is_terminal()
}

/// Creates the bar for one stage, or a hidden bar when disabled.
pub(crate) fn stage_bar(label: &'static str, unit: &'static str, len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::with_template(STAGE_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_prefix(label);
    bar.set_message(unit);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_bar_hidden_when_disabled() {
        let bar = stage_bar("Downloading", "files", 5, false);
        assert!(bar.is_hidden());
        bar.inc(2);
        assert_eq!(bar.position(), 2);
    }

    #[test]
    fn test_stage_bar_tracks_length() {
        let bar = stage_bar("Collecting jobs", "datasets", 7, true);
        assert_eq!(bar.length(), Some(7));
        bar.finish_and_clear();
    }

    #[test]
    fn test_progress_disabled_in_quiet_mode() {
        assert!(!progress_enabled(true));
    }
}
