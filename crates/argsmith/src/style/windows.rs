use crate::error::{Error, ErrorCode, Result};
use crate::grammar::{ArgumentDef, OptionDef};
use crate::run::OptionRuns;

use super::{ArgStyle, Grouping, is_negative_number};

/// `/name`, `-name` or `--name`, with parameters as `/name:a,b`.
///
/// The requested grouping is enforced as tokens are read.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsStyle;

fn strip_prefix(token: &str) -> Option<&str> {
    let body = token
        .strip_prefix('/')
        .or_else(|| token.strip_prefix("--"))
        .or_else(|| token.strip_prefix('-'))?;
    (!body.is_empty()).then_some(body)
}

/// Split `/name:a,b` into the name and its inline parameters.
fn split_spec(token: &str) -> Option<(&str, Option<&str>)> {
    let body = strip_prefix(token)?;
    Some(match body.split_once(':') {
        Some((name, spec)) => (name, Some(spec)),
        None => (body, None),
    })
}

fn inline_parameters<'t>(token: &str, spec: &'t str) -> Result<Vec<&'t str>> {
    let values: Vec<&str> = spec.split(',').collect();
    if values.iter().any(|v| v.is_empty()) {
        return Err(Error::usage(
            ErrorCode::InvalidOptionParameterSpecifier,
            format!("malformed parameter list in '{token}'"),
        ));
    }
    Ok(values)
}

impl ArgStyle for WindowsStyle {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn grouping(
        &self,
        requested: Grouping,
        _options: &[OptionDef],
        _arguments: &[ArgumentDef],
    ) -> Grouping {
        requested
    }

    fn validate_defined_options(&self, options: &[OptionDef]) -> Result<()> {
        for opt in options {
            for name in opt.names() {
                let text = name.as_str();
                if text.starts_with(['/', '-']) || text.contains([':', ',']) {
                    return Err(Error::grammar(format!(
                        "option name '{text}' cannot be used with the windows style"
                    )));
                }
            }
        }
        Ok(())
    }

    fn identify_tokens(
        &self,
        tokens: &[String],
        runs: &mut OptionRuns<'_>,
        grouping: Grouping,
    ) -> Result<Vec<String>> {
        let mut bare = Vec::new();
        let mut pending: Option<usize> = None;
        let mut seen_option = false;

        for token in tokens {
            let spec = if is_negative_number(token, runs) {
                None
            } else {
                split_spec(token)
            };
            let Some((name, inline)) = spec else {
                if let Some(idx) = pending {
                    if runs.accepts_parameter(idx, false) {
                        tracing::trace!(token = %token, option = runs.def(idx).primary_name(), "parameter");
                        runs.add_parameter(idx, token.as_str());
                        continue;
                    }
                }
                pending = None;
                if seen_option && grouping == Grouping::OptionsAfterArguments {
                    return Err(Error::usage(
                        ErrorCode::OptionsAfterParameters,
                        format!("argument '{token}' must come before all options"),
                    ));
                }
                tracing::trace!(token = %token, "argument");
                bare.push(token.clone());
                continue;
            };

            if !bare.is_empty() && grouping == Grouping::OptionsBeforeArguments {
                return Err(Error::usage(
                    ErrorCode::OptionsBeforeParameters,
                    format!("option '{token}' must come before all arguments"),
                ));
            }
            let idx = runs.find(name).ok_or_else(|| {
                Error::usage(
                    ErrorCode::InvalidOptionSpecified,
                    format!("unknown option '{token}'"),
                )
            })?;
            tracing::trace!(token = %token, option = runs.def(idx).primary_name(), "option");
            seen_option = true;
            runs.occur(idx);

            pending = match inline {
                None => Some(idx),
                Some(spec) => {
                    let values = inline_parameters(token, spec)?;
                    let max = runs.def(idx).usage_rules().max_parameters;
                    if u32::try_from(values.len()).unwrap_or(u32::MAX) > max {
                        return Err(Error::usage(
                            ErrorCode::InvalidOptionParametersSpecified,
                            format!(
                                "option '{}' takes at most {max} parameter(s), got {}",
                                runs.def(idx).primary_name(),
                                values.len()
                            ),
                        ));
                    }
                    for value in values {
                        runs.add_parameter(idx, value);
                    }
                    None
                }
            };
        }
        Ok(bare)
    }

    fn default_help_option_names(&self) -> &'static [&'static str] {
        &["?", "h", "help"]
    }

    fn option_name<'t>(&self, token: &'t str) -> Option<&'t str> {
        split_spec(token)
            .map(|(name, _)| name)
            .filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn defs() -> Vec<OptionDef> {
        vec![
            OptionDef::new("v"),
            OptionDef::new("out").used_as_single_parameter(),
            OptionDef::new("define").parameters(1, 3),
        ]
    }

    #[test]
    fn prefixes_and_inline_parameters() {
        let defs = defs();
        let mut runs = OptionRuns::new(&defs);
        let bare = WindowsStyle
            .identify_tokens(
                &argv(&["/v", "-define:a,b", "--out", "x.txt", "in.txt"]),
                &mut runs,
                Grouping::DoesNotMatter,
            )
            .unwrap();
        assert_eq!(bare, vec!["in.txt"]);
        assert_eq!(runs.occurrences(0), 1);
        assert_eq!(runs.runs[1].parameters, vec!["x.txt"]);
        assert_eq!(runs.runs[2].parameters, vec!["a", "b"]);
    }

    #[test]
    fn options_before_arguments_is_enforced() {
        let defs = defs();
        let mut runs = OptionRuns::new(&defs);
        let err = WindowsStyle
            .identify_tokens(
                &argv(&["file.txt", "/v"]),
                &mut runs,
                Grouping::OptionsBeforeArguments,
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::OptionsBeforeParameters);
    }

    #[test]
    fn options_after_arguments_is_enforced() {
        let defs = defs();
        let mut runs = OptionRuns::new(&defs);
        let err = WindowsStyle
            .identify_tokens(
                &argv(&["/v", "file.txt"]),
                &mut runs,
                Grouping::OptionsAfterArguments,
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::OptionsAfterParameters);

        let mut runs = OptionRuns::new(&defs);
        let bare = WindowsStyle
            .identify_tokens(
                &argv(&["file.txt", "/v"]),
                &mut runs,
                Grouping::OptionsAfterArguments,
            )
            .unwrap();
        assert_eq!(bare, vec!["file.txt"]);
    }

    #[test]
    fn malformed_specifiers_fail() {
        let defs = defs();
        for bad in ["/out:", "/define:a,,b"] {
            let mut runs = OptionRuns::new(&defs);
            let err = WindowsStyle
                .identify_tokens(&argv(&[bad]), &mut runs, Grouping::DoesNotMatter)
                .unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidOptionParameterSpecifier, "{bad}");
        }

        let mut runs = OptionRuns::new(&defs);
        let err = WindowsStyle
            .identify_tokens(&argv(&["/out:a,b"]), &mut runs, Grouping::DoesNotMatter)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidOptionParametersSpecified);

        let mut runs = OptionRuns::new(&defs);
        let err = WindowsStyle
            .identify_tokens(&argv(&["/nope"]), &mut runs, Grouping::DoesNotMatter)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidOptionSpecified);
    }

    #[test]
    fn lone_slash_and_negative_numbers_are_arguments() {
        let defs = defs();
        let mut runs = OptionRuns::new(&defs);
        let bare = WindowsStyle
            .identify_tokens(&argv(&["/", "-3"]), &mut runs, Grouping::DoesNotMatter)
            .unwrap();
        assert_eq!(bare, vec!["/", "-3"]);
    }

    #[test]
    fn names_with_reserved_characters_are_rejected() {
        assert!(WindowsStyle.validate_defined_options(&[OptionDef::new("a:b")]).is_err());
        assert!(WindowsStyle.validate_defined_options(&[OptionDef::new("/x")]).is_err());
        assert!(WindowsStyle.validate_defined_options(&defs()).is_ok());
        assert_eq!(WindowsStyle.option_name("/help"), Some("help"));
        assert_eq!(WindowsStyle.option_name("/?"), Some("?"));
        assert_eq!(WindowsStyle.option_name("file"), None);
    }
}
