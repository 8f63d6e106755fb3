//! The immutable outcome of a successful parse.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::command::Command;
use crate::error::ValueError;
use crate::grammar::{ArgumentDef, OptionDef};
use crate::run::{ArgumentRun, OptionRun};
use crate::value::{FromValue, Value};

/// A surviving argument with its raw strings and resolved value.
#[derive(Debug, Clone)]
pub struct ArgumentValue<'a> {
    def: &'a ArgumentDef,
    raw: Vec<String>,
    value: Option<Value>,
}

impl<'a> ArgumentValue<'a> {
    pub fn def(&self) -> &'a ArgumentDef {
        self.def
    }

    pub fn name(&self) -> &'a str {
        self.def.name()
    }

    /// Strings taken from the command line, before formatting.
    pub fn raw(&self) -> &[String] {
        &self.raw
    }

    /// `None` when nothing was supplied and no default exists.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn is_assigned(&self) -> bool {
        self.value.is_some()
    }
}

/// A surviving option with its occurrence count, raw parameters and value.
#[derive(Debug, Clone)]
pub struct OptionValue<'a> {
    def: &'a OptionDef,
    occurrences: u32,
    parameters: Vec<String>,
    value: Option<Value>,
}

impl<'a> OptionValue<'a> {
    pub fn def(&self) -> &'a OptionDef {
        self.def
    }

    pub fn name(&self) -> &'a str {
        self.def.primary_name()
    }

    pub fn occurrences(&self) -> u32 {
        self.occurrences
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn is_assigned(&self) -> bool {
        self.value.is_some()
    }
}

/// Resolved arguments and options of the command a parse ended in.
///
/// Only entities belonging to the matched groups are present. Borrows the
/// grammar it was parsed against.
#[derive(Debug, Clone)]
pub struct ParseResult<'a> {
    command: &'a Command,
    path: Vec<&'a str>,
    groups: BTreeSet<u32>,
    arguments: Vec<ArgumentValue<'a>>,
    options: Vec<OptionValue<'a>>,
}

impl<'a> ParseResult<'a> {
    pub(crate) fn new(
        command: &'a Command,
        path: Vec<&'a str>,
        groups: BTreeSet<u32>,
        arguments: Vec<ArgumentRun<'a>>,
        options: Vec<OptionRun<'a>>,
    ) -> Self {
        Self {
            command,
            path,
            groups,
            arguments: arguments
                .into_iter()
                .map(|run| ArgumentValue {
                    def: run.def,
                    raw: run.raw,
                    value: run.value,
                })
                .collect(),
            options: options
                .into_iter()
                .map(|run| OptionValue {
                    def: run.def,
                    occurrences: run.occurrences,
                    parameters: run.parameters,
                    value: run.value,
                })
                .collect(),
        }
    }

    pub fn command(&self) -> &'a Command {
        self.command
    }

    /// Command names from the root down to [`Self::command`].
    pub fn command_path(&self) -> &[&'a str] {
        &self.path
    }

    pub fn matched_groups(&self) -> &BTreeSet<u32> {
        &self.groups
    }

    pub fn arguments(&self) -> &[ArgumentValue<'a>] {
        &self.arguments
    }

    /// Surviving options, assigned or not.
    pub fn option_values(&self) -> &[OptionValue<'a>] {
        &self.options
    }

    /// Assigned options keyed by primary name, in declaration order.
    pub fn options(&self) -> impl Iterator<Item = (&'a str, &Value)> + '_ {
        self.options
            .iter()
            .filter_map(|o| o.value.as_ref().map(|v| (o.name(), v)))
    }

    fn find_option(&self, name: &str) -> Result<Option<&OptionValue<'a>>, ValueError> {
        if let Some(found) = self.options.iter().find(|o| o.def.matches(name)) {
            return Ok(Some(found));
        }
        // Declared but trimmed away by group resolution.
        match self.command.option(name) {
            Some(_) => Ok(None),
            None => Err(ValueError::UnknownName(name.to_string())),
        }
    }

    /// Typed value of an option; `Ok(None)` when it is not assigned.
    pub fn option<T: FromValue>(&self, name: &str) -> Result<Option<T>, ValueError> {
        match self.find_option(name)?.and_then(|o| o.value.as_ref()) {
            Some(value) => T::read(name, value).map(Some),
            None => Ok(None),
        }
    }

    /// Like [`Self::option`], folding unknown names and mismatches into `None`.
    pub fn try_get_option<T: FromValue>(&self, name: &str) -> Option<T> {
        self.option(name).ok().flatten()
    }

    /// Whether a flag-like option is set, by occurrence or by default.
    pub fn flag(&self, name: &str) -> bool {
        self.try_get_option::<bool>(name).unwrap_or(false)
    }

    /// Times the option was given; 0 for unknown or trimmed names.
    pub fn occurrences(&self, name: &str) -> u32 {
        match self.find_option(name) {
            Ok(Some(o)) => o.occurrences,
            _ => 0,
        }
    }

    pub fn is_assigned(&self, name: &str) -> bool {
        if let Ok(Some(o)) = self.find_option(name) {
            return o.is_assigned();
        }
        self.arguments
            .iter()
            .any(|a| a.name() == name && a.is_assigned())
    }

    /// Parameters as typed, across all occurrences.
    pub fn raw_option(&self, name: &str) -> Option<&[String]> {
        self.find_option(name)
            .ok()
            .flatten()
            .map(|o| o.parameters.as_slice())
    }

    /// Typed value of the argument at `index` among the surviving arguments.
    pub fn argument<T: FromValue>(&self, index: usize) -> Result<Option<T>, ValueError> {
        let arg = self
            .arguments
            .get(index)
            .ok_or(ValueError::UnknownPosition(index))?;
        match &arg.value {
            Some(value) => T::read(arg.name(), value).map(Some),
            None => Ok(None),
        }
    }

    pub fn argument_named<T: FromValue>(&self, name: &str) -> Result<Option<T>, ValueError> {
        if let Some(arg) = self.arguments.iter().find(|a| a.name() == name) {
            return match &arg.value {
                Some(value) => T::read(name, value).map(Some),
                None => Ok(None),
            };
        }
        match self.command.argument(name) {
            Some(_) => Ok(None),
            None => Err(ValueError::UnknownName(name.to_string())),
        }
    }

    /// Like [`Self::argument`], folding bad positions and mismatches into `None`.
    pub fn try_get_argument<T: FromValue>(&self, index: usize) -> Option<T> {
        self.argument(index).ok().flatten()
    }

    pub fn try_get_argument_named<T: FromValue>(&self, name: &str) -> Option<T> {
        self.argument_named(name).ok().flatten()
    }

    pub fn raw_argument(&self, index: usize) -> Option<&[String]> {
        self.arguments.get(index).map(|a| a.raw.as_slice())
    }

    /// Serializable snapshot of this result.
    pub fn to_report(&self) -> ParseReport {
        ParseReport {
            command: self.path.iter().map(|s| s.to_string()).collect(),
            groups: self.groups.iter().copied().collect(),
            arguments: self
                .arguments
                .iter()
                .filter_map(|a| a.value.clone().map(|v| (a.name().to_string(), v)))
                .collect(),
            options: self
                .options
                .iter()
                .filter(|o| o.is_assigned() || o.occurrences > 0)
                .map(|o| {
                    let report = OptionReport {
                        occurrences: o.occurrences,
                        value: o.value.clone(),
                    };
                    (o.name().to_string(), report)
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParseReport {
    pub command: Vec<String>,
    pub groups: Vec<u32>,
    pub arguments: IndexMap<String, Value>,
    pub options: IndexMap<String, OptionReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OptionReport {
    pub occurrences: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}
