//! Console reporting for the batch commands.
//!
//! One [`Reporter`] per run decides whether output is coloured and whether
//! anything but errors is printed, then renders status lines and the
//! progress bar accordingly. Logging goes through `log`; this module only
//! covers what the user watches on stdout.
//!
//! Colour is chosen from the `--color` flag (`always`, `never`, `auto`). In
//! `auto` mode `NO_COLOR` (any value) and `TERM=dumb` turn it off, otherwise
//! `console` decides from the terminal and `CLICOLOR`/`CLICOLOR_FORCE`.

use std::env;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

/// Kind of status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A run is starting.
    Start,
    /// A run finished cleanly.
    Done,
    /// A run finished but something needs a look.
    Warn,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Status::Start => "[RUN]",
            Status::Done => "[OK]",
            Status::Warn => "[WARN]",
        }
    }

    fn style(self) -> Style {
        let style = Style::new().bold().force_styling(true);
        match self {
            Status::Start => style.cyan(),
            Status::Done => style.green(),
            Status::Warn => style.yellow(),
        }
    }
}

/// Prints run status for one command invocation.
#[derive(Debug, Clone)]
pub struct Reporter {
    color: bool,
    quiet: bool,
}

impl Reporter {
    pub fn new(color_flag: &str, quiet: bool) -> Self {
        Self {
            color: color_enabled(color_flag),
            quiet,
        }
    }

    /// Reporter with colour off, for tests and piped output.
    pub fn plain(quiet: bool) -> Self {
        Self {
            color: false,
            quiet,
        }
    }

    /// Renders a status line without printing it.
    pub fn line(&self, status: Status, message: &str) -> String {
        if self.color {
            format!("{} {}", status.style().apply_to(status.label()), message)
        } else {
            format!("{} {}", status.label(), message)
        }
    }

    /// Prints a status line unless the run is quiet.
    pub fn status(&self, status: Status, message: &str) {
        if !self.quiet {
            println!("{}", self.line(status, message));
        }
    }

    /// Progress bar over `total` items. Hidden for quiet runs and when the
    /// caller echoes child output that a bar would garble.
    pub fn progress_bar(&self, total: usize, hidden: bool) -> ProgressBar {
        if self.quiet || hidden {
            return ProgressBar::hidden();
        }
        let template = if self.color {
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}"
        } else {
            "[{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"
        };
        let style = ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        ProgressBar::new(total as u64).with_style(style)
    }
}

fn color_enabled(flag: &str) -> bool {
    match flag.to_lowercase().as_str() {
        "always" => true,
        "never" => false,
        _ => {
            if env::var_os("NO_COLOR").is_some() {
                return false;
            }
            if env::var("TERM").is_ok_and(|term| term == "dumb") {
                return false;
            }
            console::colors_enabled()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_color_flags() {
        assert!(color_enabled("always"));
        assert!(color_enabled("ALWAYS"));
        assert!(!color_enabled("never"));
    }

    #[test]
    fn test_plain_line() {
        let reporter = Reporter::plain(false);
        assert_eq!(
            reporter.line(Status::Done, "Converted 3 package(s)"),
            "[OK] Converted 3 package(s)"
        );
        assert_eq!(reporter.line(Status::Warn, "x"), "[WARN] x");
    }

    #[test]
    fn test_colored_line_wraps_label_only() {
        let reporter = Reporter::new("always", false);
        let line = reporter.line(Status::Start, "Converting 2 package(s)");
        assert!(line.starts_with("\u{1b}["));
        assert!(line.contains("[RUN]"));
        assert!(line.ends_with("\u{1b}[0m Converting 2 package(s)"));
    }

    #[test]
    fn test_quiet_hides_progress() {
        assert!(Reporter::plain(true).progress_bar(10, false).is_hidden());
        assert!(Reporter::plain(false).progress_bar(10, true).is_hidden());
        assert_eq!(Reporter::plain(false).progress_bar(10, false).length(), Some(10));
    }
}
