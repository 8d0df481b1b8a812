//! Terminal output styling for the CLI.
//!
//! Colors follow the `--color` flag first, then the usual environment
//! conventions (`NO_COLOR`, `CLICOLOR`, `CLICOLOR_FORCE`, `TERM=dumb`), then
//! terminal detection. Styled markers fall back to bracketed plain text so
//! piped output stays readable.

use std::env;
use std::str::FromStr;

use console::{Style, style};

/// Value of the `--color` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    Always,
    Never,
    #[default]
    Auto,
}

impl FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            "auto" => Ok(ColorChoice::Auto),
            other => Err(format!("Unknown color choice: {}", other)),
        }
    }
}

/// Kind of status line printed by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Work started or in progress
    Info,
    /// Work finished successfully
    Done,
    /// A file was (re)built
    Added,
    /// A build file was removed
    Removed,
    /// Something failed
    Failed,
}

impl Marker {
    fn plain(self) -> &'static str {
        match self {
            Marker::Info => "[..]",
            Marker::Done => "[OK]",
            Marker::Added => "[->]",
            Marker::Removed => "[<-]",
            Marker::Failed => "[ERR]",
        }
    }

    fn styled(self) -> String {
        let (text, paint): (&str, Style) = match self {
            Marker::Info => ("->", Style::new().cyan()),
            Marker::Done => ("✓", Style::new().green()),
            Marker::Added => ("->", Style::new().green()),
            Marker::Removed => ("<-", Style::new().red()),
            Marker::Failed => ("✗", Style::new().red().bold()),
        };
        paint.force_styling(true).apply_to(text).to_string()
    }
}

/// Output settings resolved once per command.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolve colors from the `--color` flag and the environment.
    ///
    /// An unrecognized flag value behaves like `auto`.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.parse::<ColorChoice>().unwrap_or_default() {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => Self::detect_color_support(),
        };
        console::set_colors_enabled(use_color);
        console::set_colors_enabled_stderr(use_color);
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    /// Marker text for a status line.
    pub fn marker(&self, marker: Marker) -> String {
        if self.use_color {
            marker.styled()
        } else {
            marker.plain().to_string()
        }
    }

    /// Emphasize a heading, e.g. an entry category.
    pub fn heading(&self, text: &str) -> String {
        if self.use_color {
            style(text).bold().force_styling(true).to_string()
        } else {
            text.to_string()
        }
    }

    /// De-emphasize secondary text such as file paths.
    pub fn dim(&self, text: &str) -> String {
        if self.use_color {
            style(text).dim().force_styling(true).to_string()
        } else {
            text.to_string()
        }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_choice_parse() {
        assert_eq!("ALWAYS".parse::<ColorChoice>().unwrap(), ColorChoice::Always);
        assert_eq!("never".parse::<ColorChoice>().unwrap(), ColorChoice::Never);
        assert!("sometimes".parse::<ColorChoice>().is_err());
    }

    #[test]
    fn test_color_flag_overrides_environment() {
        assert!(OutputConfig::from_env_and_flag("always").use_color);
        assert!(!OutputConfig::from_env_and_flag("never").use_color);
    }

    #[test]
    fn test_plain_markers() {
        let out = OutputConfig::without_color();
        assert_eq!(out.marker(Marker::Done), "[OK]");
        assert_eq!(out.marker(Marker::Removed), "[<-]");
        assert_eq!(out.heading("scripts"), "scripts");
    }

    #[test]
    fn test_colored_marker_contains_escape() {
        let out = OutputConfig { use_color: true };
        assert!(out.marker(Marker::Failed).contains('\u{1b}'));
    }
}
