use crate::error::{Error, ErrorCode, Result};
use crate::grammar::{ArgumentDef, OptionDef};
use crate::run::OptionRuns;

use super::{ArgStyle, Grouping, is_negative_number};

const HELP_NAMES: &[&str] = &["h", "help"];

/// `-v`, `-abc`, `--name`, `-n=value`, `--name=value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixStyle;

/// Unix syntax plus getopt style attached values (`-ofile`, `-vofile`).
///
/// Parameter consumption also honours the bound across all occurrences.
#[derive(Debug, Clone, Copy, Default)]
pub struct GnuStyle;

#[derive(Debug, Clone, Copy)]
struct Rules {
    attached_short_values: bool,
    cumulative: bool,
}

enum Token<'t> {
    Bare,
    Separator,
    Long {
        name: &'t str,
        inline: Option<&'t str>,
    },
    Short {
        names: &'t str,
        inline: Option<&'t str>,
    },
}

fn classify<'t>(token: &'t str, runs: &OptionRuns<'_>) -> Token<'t> {
    if token == "--" {
        return Token::Separator;
    }
    if let Some(body) = token.strip_prefix("--") {
        let (name, inline) = split_inline(body);
        return Token::Long { name, inline };
    }
    if token.len() > 1 && token.starts_with('-') && !is_negative_number(token, runs) {
        let (names, inline) = split_inline(&token[1..]);
        return Token::Short { names, inline };
    }
    Token::Bare
}

fn split_inline(body: &str) -> (&str, Option<&str>) {
    match body.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (body, None),
    }
}

fn unknown(token: &str) -> Error {
    Error::usage(
        ErrorCode::InvalidOptionSpecified,
        format!("unknown option '{token}'"),
    )
}

fn lookup(runs: &OptionRuns<'_>, name: &str, token: &str) -> Result<usize> {
    if name.is_empty() {
        return Err(unknown(token));
    }
    runs.find(name).ok_or_else(|| unknown(token))
}

/// Whether a dash token spells an option this command declares.
fn names_declared_option(token: &Token<'_>, runs: &OptionRuns<'_>) -> bool {
    match token {
        Token::Long { name, .. } => runs.find(name).is_some(),
        Token::Short { names, .. } => names
            .chars()
            .next()
            .is_some_and(|c| runs.find(&names[..c.len_utf8()]).is_some()),
        Token::Bare | Token::Separator => false,
    }
}

fn scan(
    tokens: &[String],
    runs: &mut OptionRuns<'_>,
    grouping: Grouping,
    rules: Rules,
) -> Result<Vec<String>> {
    let mut bare = Vec::new();
    let mut only_arguments = false;
    // Set once an argument is seen under `OptionsBeforeArguments`.
    let mut past_arguments = false;
    // Option that may still take the following tokens as parameters.
    let mut pending: Option<usize> = None;

    for token in tokens {
        if only_arguments {
            bare.push(token.clone());
            continue;
        }
        let class = classify(token, runs);
        if past_arguments {
            match &class {
                Token::Separator => only_arguments = true,
                known if names_declared_option(known, runs) => {
                    return Err(Error::usage(
                        ErrorCode::OptionsBeforeParameters,
                        format!("option '{token}' must come before all arguments"),
                    ));
                }
                _ => bare.push(token.clone()),
            }
            continue;
        }
        match class {
            Token::Separator => {
                only_arguments = true;
                pending = None;
            }
            Token::Bare => {
                if let Some(idx) = pending {
                    if runs.accepts_parameter(idx, rules.cumulative) {
                        tracing::trace!(token = %token, option = runs.def(idx).primary_name(), "parameter");
                        runs.add_parameter(idx, token.as_str());
                        continue;
                    }
                }
                pending = None;
                tracing::trace!(token = %token, "argument");
                bare.push(token.clone());
                if grouping == Grouping::OptionsBeforeArguments {
                    past_arguments = true;
                }
            }
            Token::Long { name, inline } => {
                let idx = lookup(runs, name, token)?;
                tracing::trace!(token = %token, option = runs.def(idx).primary_name(), "option");
                runs.occur(idx);
                pending = match inline {
                    Some(value) => {
                        runs.add_parameter(idx, value);
                        None
                    }
                    None => Some(idx),
                };
            }
            Token::Short { names, inline } => {
                pending = scan_short(token, names, inline, runs, rules)?;
            }
        }
    }
    Ok(bare)
}

/// Expand one `-xyz` token; returns the option left waiting for parameters.
fn scan_short(
    token: &str,
    names: &str,
    inline: Option<&str>,
    runs: &mut OptionRuns<'_>,
    rules: Rules,
) -> Result<Option<usize>> {
    let mut chars = names.char_indices().peekable();
    let single = names.chars().count() == 1;

    if let Some(value) = inline {
        // An empty name (`-=x`) falls through to the unknown option lookup.
        if !single && !names.is_empty() {
            return Err(Error::usage(
                ErrorCode::InvalidOptionParametersSpecified,
                format!("combined short options cannot take a parameter: '{token}'"),
            ));
        }
        let idx = lookup(runs, names, token)?;
        runs.occur(idx);
        runs.add_parameter(idx, value);
        return Ok(None);
    }

    let mut last = None;
    while let Some((at, c)) = chars.next() {
        let name = &names[at..at + c.len_utf8()];
        let idx = runs
            .find(name)
            .ok_or_else(|| unknown(&format!("-{name}")))?;
        tracing::trace!(token = %token, option = runs.def(idx).primary_name(), "short option");
        runs.occur(idx);
        last = Some(idx);

        if rules.attached_short_values && runs.def(idx).usage_rules().takes_parameters() {
            if let Some(&(rest_at, _)) = chars.peek() {
                runs.add_parameter(idx, &names[rest_at..]);
                return Ok(None);
            }
        }
    }
    Ok(last)
}

fn adjust_grouping(
    requested: Grouping,
    options: &[OptionDef],
    arguments: &[ArgumentDef],
) -> Grouping {
    if arguments.is_empty() {
        return requested;
    }
    let usages = options.iter().map(|o| o.usage_rules());
    if usages.clone().any(|u| u.has_unlimited_parameters()) {
        return Grouping::OptionsAfterArguments;
    }
    if requested == Grouping::OptionsBeforeArguments
        && usages.into_iter().any(|u| u.has_variable_parameters())
    {
        return Grouping::DoesNotMatter;
    }
    requested
}

fn validate_names(style: &str, options: &[OptionDef]) -> Result<()> {
    for opt in options {
        for name in opt.names() {
            let text = name.as_str();
            if text.starts_with('-') || text.contains('=') {
                return Err(Error::grammar(format!(
                    "option name '{text}' cannot be used with the {style} style"
                )));
            }
        }
    }
    Ok(())
}

fn posix_option_name(token: &str) -> Option<&str> {
    let body = if let Some(long) = token.strip_prefix("--") {
        long
    } else {
        let short = token.strip_prefix('-')?;
        if short.split('=').next().is_some_and(|n| n.chars().count() != 1) {
            return None;
        }
        short
    };
    let name = split_inline(body).0;
    (!name.is_empty()).then_some(name)
}

impl ArgStyle for UnixStyle {
    fn name(&self) -> &'static str {
        "unix"
    }

    fn grouping(
        &self,
        requested: Grouping,
        options: &[OptionDef],
        arguments: &[ArgumentDef],
    ) -> Grouping {
        adjust_grouping(requested, options, arguments)
    }

    fn validate_defined_options(&self, options: &[OptionDef]) -> Result<()> {
        validate_names(self.name(), options)
    }

    fn identify_tokens(
        &self,
        tokens: &[String],
        runs: &mut OptionRuns<'_>,
        grouping: Grouping,
    ) -> Result<Vec<String>> {
        let rules = Rules {
            attached_short_values: false,
            cumulative: false,
        };
        scan(tokens, runs, grouping, rules)
    }

    fn default_help_option_names(&self) -> &'static [&'static str] {
        HELP_NAMES
    }

    fn option_name<'t>(&self, token: &'t str) -> Option<&'t str> {
        posix_option_name(token)
    }

    fn is_separator(&self, token: &str) -> bool {
        token == "--"
    }
}

impl ArgStyle for GnuStyle {
    fn name(&self) -> &'static str {
        "gnu"
    }

    fn grouping(
        &self,
        requested: Grouping,
        options: &[OptionDef],
        arguments: &[ArgumentDef],
    ) -> Grouping {
        adjust_grouping(requested, options, arguments)
    }

    fn validate_defined_options(&self, options: &[OptionDef]) -> Result<()> {
        validate_names(self.name(), options)
    }

    fn identify_tokens(
        &self,
        tokens: &[String],
        runs: &mut OptionRuns<'_>,
        grouping: Grouping,
    ) -> Result<Vec<String>> {
        let rules = Rules {
            attached_short_values: true,
            cumulative: true,
        };
        scan(tokens, runs, grouping, rules)
    }

    fn default_help_option_names(&self) -> &'static [&'static str] {
        HELP_NAMES
    }

    fn option_name<'t>(&self, token: &'t str) -> Option<&'t str> {
        posix_option_name(token)
    }

    fn is_separator(&self, token: &str) -> bool {
        token == "--"
    }
}
