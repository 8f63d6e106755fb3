//! Parse engine: command descent, tokenization, group resolution and value
//! resolution.

use std::collections::BTreeSet;

use crate::command::Command;
use crate::error::{Error, ErrorCode, Result, ValidationError};
use crate::grammar::{ArgumentDef, DEFAULT_GROUP, UNLIMITED, ValueShape, ValueSpec};
use crate::result::ParseResult;
use crate::run::{ArgumentRun, OptionRun, OptionRuns};
use crate::style::{ArgStyle, Grouping, UnixStyle};
use crate::value::{Scalar, Value};

/// Validator name reported when a converter rejects a string.
pub const TYPE_CONVERTER: &str = "TypeConverter";

/// Validator name reported when a command level check fails.
pub const COMMAND_VALIDATOR: &str = "CommandValidator";

/// Parses token vectors against a command tree.
///
/// The parser owns an immutable grammar; every call to [`Parser::parse`]
/// works on its own run state, so one parser can serve concurrent callers.
#[derive(Debug)]
pub struct Parser {
    root: Command,
    style: Box<dyn ArgStyle>,
    grouping: Grouping,
}

impl Parser {
    /// Parser using [`UnixStyle`].
    pub fn new(root: Command) -> Result<Self> {
        Self::with_boxed_style(root, Box::new(UnixStyle))
    }

    /// Parser using any concrete style, e.g. [`crate::GnuStyle`].
    pub fn with_style(root: Command, style: impl ArgStyle + 'static) -> Result<Self> {
        Self::with_boxed_style(root, Box::new(style))
    }

    /// Checks every command's option names against the style.
    pub fn with_boxed_style(root: Command, style: Box<dyn ArgStyle>) -> Result<Self> {
        for command in root.walk() {
            style.validate_defined_options(command.options())?;
        }
        Ok(Self {
            root,
            style,
            grouping: Grouping::default(),
        })
    }

    /// Requested ordering of options and arguments.
    pub fn grouping(mut self, grouping: Grouping) -> Self {
        self.grouping = grouping;
        self
    }

    /// The command tree this parser was built from.
    pub fn root(&self) -> &Command {
        &self.root
    }

    /// Style used to classify tokens.
    pub fn style(&self) -> &dyn ArgStyle {
        self.style.as_ref()
    }

    /// Grouping as requested; styles may adjust it per command.
    pub fn requested_grouping(&self) -> Grouping {
        self.grouping
    }

    /// Parse one token vector, e.g. `std::env::args().skip(1)`.
    ///
    /// All or nothing: any tokenization, cardinality or validation problem
    /// fails the whole call.
    pub fn parse<I, S>(&self, tokens: I) -> Result<ParseResult<'_>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let (command, path, rest) = self.descend(&tokens);
        tracing::debug!(command = %path.join(" "), tokens = rest.len(), "resolved command");

        let grouping = self
            .style
            .grouping(self.grouping, command.options(), command.arguments());
        tracing::debug!(style = self.style.name(), %grouping, "effective grouping");

        let mut runs = OptionRuns::new(command.options());
        let bare = self.style.identify_tokens(rest, &mut runs, grouping)?;
        let option_runs = runs.into_runs();

        let groups = match_groups(command, &option_runs, bare.len())?;
        tracing::debug!(?groups, arguments = bare.len(), "matched groups");

        let mut option_runs: Vec<OptionRun<'_>> = option_runs
            .into_iter()
            .filter(|run| intersects(run.def.groups(), &groups))
            .collect();
        let mut argument_runs: Vec<ArgumentRun<'_>> = command
            .arguments()
            .iter()
            .filter(|arg| intersects(arg.groups(), &groups))
            .map(ArgumentRun::new)
            .collect();

        for run in &mut option_runs {
            resolve_option(run)?;
        }
        resolve_arguments(&mut argument_runs, bare)?;

        let result = ParseResult::new(command, path, groups, argument_runs, option_runs);
        if let Some(check) = command.custom_validator() {
            if let Some(message) = check(&result) {
                return Err(ValidationError::new(message, COMMAND_VALIDATOR, command.name()).into());
            }
        }
        tracing::debug!(
            arguments = result.arguments().len(),
            options = result.options().count(),
            "parse complete"
        );
        Ok(result)
    }

    /// Parse, then invoke the resolved command's handler.
    ///
    /// Commands without a handler yield 0.
    pub fn run<I, S>(&self, tokens: I) -> Result<i32>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let result = self.parse(tokens)?;
        let status = result.command().handle(&result).unwrap_or(0);
        tracing::debug!(command = %result.command_path().join(" "), status, "handler finished");
        Ok(status)
    }

    /// Whether one of the style's help option names appears before the end of
    /// option processing. Never fails, even on input that would not parse.
    pub fn help_requested<I, S>(&self, tokens: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let help = self.style.default_help_option_names();
        for token in tokens {
            let token = token.as_ref();
            if self.style.is_separator(token) {
                break;
            }
            if let Some(name) = self.style.option_name(token) {
                if help.iter().any(|h| h.eq_ignore_ascii_case(name)) {
                    return true;
                }
            }
        }
        false
    }

    /// Follow leading tokens down the sub-command tree.
    fn descend<'p, 't>(&'p self, tokens: &'t [String]) -> (&'p Command, Vec<&'p str>, &'t [String]) {
        let mut command = &self.root;
        let mut path = vec![command.name()];
        let mut rest = tokens;
        while let Some((first, tail)) = rest.split_first() {
            let Some(child) = command.subcommand(first) else {
                break;
            };
            command = child;
            path.push(child.name());
            rest = tail;
        }
        (command, path, rest)
    }
}

fn intersects(a: &BTreeSet<u32>, b: &BTreeSet<u32>) -> bool {
    a.intersection(b).next().is_some()
}

/// Inclusive range of bare argument counts a group accepts.
fn argument_range(arguments: &[ArgumentDef], group: u32) -> (usize, usize) {
    let members: Vec<&ArgumentDef> = arguments.iter().filter(|a| a.in_group(group)).collect();
    let min = members.iter().filter(|a| !a.is_optional()).count();
    let max = match members.last() {
        None => 0,
        Some(last) if last.max_occurrence_count() == UNLIMITED => usize::MAX,
        Some(last) => {
            let extra = last.max_occurrence_count().saturating_sub(1) as usize;
            members.len().saturating_add(extra)
        }
    };
    (min, max)
}

fn describe_range(min: usize, max: usize) -> String {
    if min == max {
        format!("exactly {min}")
    } else if max == usize::MAX {
        format!("at least {min}")
    } else {
        format!("between {min} and {max}")
    }
}

fn match_groups(command: &Command, options: &[OptionRun<'_>], bare: usize) -> Result<BTreeSet<u32>> {
    let specified: Vec<&OptionRun<'_>> = options.iter().filter(|r| r.is_specified()).collect();

    let candidates: BTreeSet<u32> = match specified.split_first() {
        Some((first, others)) => others.iter().fold(first.def.groups().clone(), |acc, run| {
            acc.intersection(run.def.groups()).copied().collect()
        }),
        None => {
            let mut groups: BTreeSet<u32> = command
                .arguments()
                .iter()
                .flat_map(|a| a.groups().iter().copied())
                .collect();
            if groups.is_empty() {
                groups = options
                    .iter()
                    .flat_map(|r| r.def.groups().iter().copied())
                    .collect();
            }
            if groups.is_empty() {
                groups.insert(DEFAULT_GROUP);
            }
            groups
        }
    };

    if candidates.is_empty() {
        let names: Vec<&str> = specified.iter().map(|r| r.def.primary_name()).collect();
        return Err(Error::usage(
            ErrorCode::Generic,
            format!("options {} cannot be used together", names.join(", ")),
        ));
    }

    let matched: BTreeSet<u32> = candidates
        .iter()
        .copied()
        .filter(|&group| {
            let (min, max) = argument_range(command.arguments(), group);
            (min..=max).contains(&bare)
        })
        .collect();
    if !matched.is_empty() {
        return Ok(matched);
    }

    if command.is_all_optional() {
        if candidates.contains(&DEFAULT_GROUP) {
            return Ok(BTreeSet::from([DEFAULT_GROUP]));
        }
        return Ok(candidates);
    }

    let message = match candidates.iter().next() {
        Some(&group) if candidates.len() == 1 => {
            let (min, max) = argument_range(command.arguments(), group);
            format!(
                "expected {} argument(s), got {bare}",
                describe_range(min, max)
            )
        }
        _ => "the specified arguments and options do not go together".to_string(),
    };
    Err(Error::usage(ErrorCode::Generic, message))
}

fn convert(spec: &ValueSpec, raw: &str) -> Result<Scalar> {
    spec.convert(raw)
        .map_err(|message| ValidationError::new(message, TYPE_CONVERTER, raw).into())
}

fn resolve_option(run: &mut OptionRun<'_>) -> Result<()> {
    let def = run.def;
    let usage = def.usage_rules();
    let name = def.primary_name();

    if !run.is_specified() {
        run.value = def.value.default_value();
        if run.value.is_none() && usage.is_required() {
            return Err(Error::usage(
                ErrorCode::RequiredOptionAbsent,
                format!("option '{name}' is required"),
            ));
        }
        return Ok(());
    }

    if run.occurrences < usage.min_occurrences {
        return Err(Error::usage(
            ErrorCode::TooFewOptions,
            format!(
                "option '{name}' must be given at least {} time(s), got {}",
                usage.min_occurrences, run.occurrences
            ),
        ));
    }
    if run.occurrences > usage.max_occurrences {
        return Err(Error::usage(
            ErrorCode::TooManyOptions,
            format!(
                "option '{name}' may be given at most {} time(s), got {}",
                usage.max_occurrences, run.occurrences
            ),
        ));
    }
    if run.per_occurrence.iter().any(|&n| n < usage.min_parameters) {
        return Err(Error::usage(
            ErrorCode::RequiredParametersAbsent,
            format!(
                "option '{name}' requires at least {} parameter(s)",
                usage.min_parameters
            ),
        ));
    }
    if !usage.takes_parameters() && !run.parameters.is_empty() {
        return Err(Error::usage(
            ErrorCode::InvalidParametersSpecified,
            format!("option '{name}' does not take parameters"),
        ));
    }

    for (idx, raw) in run.parameters.iter().enumerate() {
        for validator in def.validators_for(idx) {
            validator.validate(raw)?;
        }
    }

    run.value = Some(match def.shape() {
        ValueShape::Flag => Value::Flag(true),
        ValueShape::Count => Value::Count(run.occurrences),
        ValueShape::Object => match run.parameters.first() {
            Some(raw) => Value::Single(convert(&def.value, raw)?),
            // Optional parameter left out: fall back to the default, else a set flag.
            None => def.value.default_value().unwrap_or(Value::Flag(true)),
        },
        ValueShape::List => Value::List(
            run.parameters
                .iter()
                .map(|raw| convert(&def.value, raw))
                .collect::<Result<Vec<_>>>()?,
        ),
    });
    Ok(())
}

/// Collapse the converted strings of a non-repeatable argument.
fn single_value(name: &str, mut converted: Vec<Scalar>) -> Result<Value> {
    let count = converted.len();
    match converted.pop() {
        Some(scalar) if count == 1 => Ok(Value::Single(scalar)),
        _ => Err(Error::Internal(format!(
            "argument '{name}' resolved {count} values where one was expected"
        ))),
    }
}

fn resolve_arguments(runs: &mut [ArgumentRun<'_>], bare: Vec<String>) -> Result<()> {
    let required = runs.iter().filter(|r| !r.def.is_optional()).count();
    if bare.len() < required {
        return Err(Error::usage(
            ErrorCode::InvalidNumberOfArguments,
            format!(
                "expected at least {required} argument(s), got {}",
                bare.len()
            ),
        ));
    }

    let last = runs.len().saturating_sub(1);
    let mut strings = bare.into_iter();
    for (idx, run) in runs.iter_mut().enumerate() {
        let def = run.def;
        let repeatable = idx == last && def.is_repeatable();
        let take = if repeatable {
            usize::try_from(def.max_occurrence_count()).unwrap_or(usize::MAX)
        } else {
            1
        };
        run.raw = strings.by_ref().take(take).collect();

        if run.raw.is_empty() {
            // Defaults bypass validators.
            run.value = def.value.default_value();
            continue;
        }
        for raw in &run.raw {
            for validator in def.validators() {
                validator.validate(raw)?;
            }
        }
        let converted = run
            .raw
            .iter()
            .map(|raw| convert(&def.value, raw))
            .collect::<Result<Vec<_>>>()?;
        run.value = Some(if repeatable {
            Value::List(converted)
        } else {
            single_value(def.name(), converted)?
        });
    }

    let leftover: Vec<String> = strings.collect();
    if !leftover.is_empty() {
        return Err(Error::usage(
            ErrorCode::InvalidNumberOfArguments,
            format!("unexpected argument(s): {}", leftover.join(" ")),
        ));
    }
    Ok(())
}
