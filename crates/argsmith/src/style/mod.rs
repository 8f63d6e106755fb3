//! Tokenization strategies.
//!
//! An [`ArgStyle`] decides which raw tokens are options, option parameters
//! or bare arguments. Three styles ship with the crate:
//! - [`UnixStyle`]: `-v`, `-abc`, `--name`, `--name=value`
//! - [`GnuStyle`]: Unix plus attached short values (`-ofile`) and a
//!   cumulative parameter bound across occurrences
//! - [`WindowsStyle`]: `/name`, `/name:a,b`, strict ordering

mod posix;
mod windows;

use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::grammar::{ArgumentDef, OptionDef};
use crate::run::OptionRuns;

pub use posix::{GnuStyle, UnixStyle};
pub use windows::WindowsStyle;

/// Required relative order of options and arguments in the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Grouping {
    #[default]
    DoesNotMatter,
    OptionsBeforeArguments,
    OptionsAfterArguments,
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DoesNotMatter => "does-not-matter",
            Self::OptionsBeforeArguments => "options-before-arguments",
            Self::OptionsAfterArguments => "options-after-arguments",
        })
    }
}

impl FromStr for Grouping {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "does-not-matter" | "any" => Ok(Self::DoesNotMatter),
            "options-before-arguments" | "before" => Ok(Self::OptionsBeforeArguments),
            "options-after-arguments" | "after" => Ok(Self::OptionsAfterArguments),
            other => Err(format!("unknown grouping '{other}'")),
        }
    }
}

pub trait ArgStyle: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Effective grouping for a command, given what the caller asked for.
    fn grouping(
        &self,
        requested: Grouping,
        options: &[OptionDef],
        arguments: &[ArgumentDef],
    ) -> Grouping;

    /// Reject option names or shapes this style cannot express.
    fn validate_defined_options(&self, options: &[OptionDef]) -> Result<()>;

    /// Classify `tokens`, recording option occurrences and parameters in
    /// `runs`, and return the bare argument strings in encounter order.
    fn identify_tokens(
        &self,
        tokens: &[String],
        runs: &mut OptionRuns<'_>,
        grouping: Grouping,
    ) -> Result<Vec<String>>;

    fn default_help_option_names(&self) -> &'static [&'static str];

    /// The option name a single token spells, ignoring inline parameters.
    ///
    /// Combined short options have no single name and yield `None`.
    fn option_name<'t>(&self, token: &'t str) -> Option<&'t str>;

    /// Whether the token marks the end of option processing.
    fn is_separator(&self, token: &str) -> bool {
        let _ = token;
        false
    }
}

/// Built-in styles, selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgStyleKind {
    #[default]
    Unix,
    Gnu,
    Windows,
}

impl ArgStyleKind {
    pub fn into_style(self) -> Box<dyn ArgStyle> {
        match self {
            Self::Unix => Box::new(UnixStyle),
            Self::Gnu => Box::new(GnuStyle),
            Self::Windows => Box::new(WindowsStyle),
        }
    }
}

impl fmt::Display for ArgStyleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unix => "unix",
            Self::Gnu => "gnu",
            Self::Windows => "windows",
        })
    }
}

impl FromStr for ArgStyleKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unix" => Ok(Self::Unix),
            "gnu" | "getopt" => Ok(Self::Gnu),
            "windows" | "win" => Ok(Self::Windows),
            other => Err(format!("unknown arg style '{other}'")),
        }
    }
}

/// `-5`, `-0.25` and the like, which are values rather than options unless
/// some option is literally named by a digit.
pub(crate) fn is_negative_number(token: &str, runs: &OptionRuns<'_>) -> bool {
    let Some(rest) = token.strip_prefix('-') else {
        return false;
    };
    if !rest.starts_with(|c: char| c.is_ascii_digit() || c == '.') || rest.parse::<f64>().is_err()
    {
        return false;
    }
    !runs.defs().any(|o| {
        o.names()
            .iter()
            .any(|n| n.as_str().starts_with(|c: char| c.is_ascii_digit()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_strings() {
        for kind in [ArgStyleKind::Unix, ArgStyleKind::Gnu, ArgStyleKind::Windows] {
            assert_eq!(kind.to_string().parse::<ArgStyleKind>(), Ok(kind));
            assert_eq!(kind.into_style().name(), kind.to_string());
        }
        assert!("dos".parse::<ArgStyleKind>().is_err());
        assert_eq!("before".parse(), Ok(Grouping::OptionsBeforeArguments));
    }

    #[test]
    fn negative_numbers_are_values_unless_digit_options_exist() {
        let defs = vec![OptionDef::new("v")];
        let runs = OptionRuns::new(&defs);
        assert!(is_negative_number("-5", &runs));
        assert!(is_negative_number("-0.5", &runs));
        assert!(!is_negative_number("-v", &runs));
        assert!(!is_negative_number("-", &runs));

        let defs = vec![OptionDef::new("1")];
        let runs = OptionRuns::new(&defs);
        assert!(!is_negative_number("-1", &runs));
    }
}
