//! Per-parse mutable state paired with the immutable grammar.
//!
//! A fresh set of runs is created for every parse call and dropped once the
//! [`crate::ParseResult`] is assembled.

use crate::grammar::{ArgumentDef, OptionDef};
use crate::value::Value;

#[derive(Debug)]
pub(crate) struct OptionRun<'g> {
    pub(crate) def: &'g OptionDef,
    pub(crate) occurrences: u32,
    pub(crate) parameters: Vec<String>,
    /// Parameter count of each occurrence, in order.
    pub(crate) per_occurrence: Vec<u32>,
    pub(crate) value: Option<Value>,
}

impl<'g> OptionRun<'g> {
    fn new(def: &'g OptionDef) -> Self {
        Self {
            def,
            occurrences: 0,
            parameters: Vec::new(),
            per_occurrence: Vec::new(),
            value: None,
        }
    }

    pub(crate) fn is_specified(&self) -> bool {
        self.occurrences > 0
    }
}

/// Option runs of one parse call, as seen by an [`crate::ArgStyle`].
#[derive(Debug)]
pub struct OptionRuns<'g> {
    pub(crate) runs: Vec<OptionRun<'g>>,
}

impl<'g> OptionRuns<'g> {
    pub(crate) fn new(defs: &'g [OptionDef]) -> Self {
        Self {
            runs: defs.iter().map(OptionRun::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Index of the option answering to `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.runs.iter().position(|r| r.def.matches(name))
    }

    /// Definition behind the run at `idx`.
    pub fn def(&self, idx: usize) -> &'g OptionDef {
        self.runs[idx].def
    }

    pub fn defs(&self) -> impl Iterator<Item = &'g OptionDef> + '_ {
        self.runs.iter().map(|r| r.def)
    }

    /// Record one more occurrence of the option.
    pub fn occur(&mut self, idx: usize) {
        let run = &mut self.runs[idx];
        run.occurrences = run.occurrences.saturating_add(1);
        run.per_occurrence.push(0);
    }

    /// Attach a parameter to the latest occurrence.
    pub fn add_parameter(&mut self, idx: usize, value: impl Into<String>) {
        let run = &mut self.runs[idx];
        run.parameters.push(value.into());
        match run.per_occurrence.last_mut() {
            Some(n) => *n += 1,
            None => run.per_occurrence.push(1),
        }
    }

    pub fn occurrences(&self, idx: usize) -> u32 {
        self.runs[idx].occurrences
    }

    pub fn total_parameters(&self, idx: usize) -> usize {
        self.runs[idx].parameters.len()
    }

    pub fn current_parameters(&self, idx: usize) -> u32 {
        self.runs[idx].per_occurrence.last().copied().unwrap_or(0)
    }

    /// Whether the latest occurrence may take another parameter.
    ///
    /// With `cumulative` the bound across all occurrences is enforced too.
    /// Options that take no parameters never accept one.
    pub fn accepts_parameter(&self, idx: usize, cumulative: bool) -> bool {
        let usage = self.runs[idx].def.usage_rules();
        if !usage.takes_parameters() {
            return false;
        }
        if self.current_parameters(idx) >= usage.max_parameters {
            return false;
        }
        if cumulative {
            let total = u32::try_from(self.total_parameters(idx)).unwrap_or(u32::MAX);
            if total >= usage.max_total_parameters() {
                return false;
            }
        }
        true
    }

    pub(crate) fn into_runs(self) -> Vec<OptionRun<'g>> {
        self.runs
    }
}

#[derive(Debug)]
pub(crate) struct ArgumentRun<'g> {
    pub(crate) def: &'g ArgumentDef,
    pub(crate) raw: Vec<String>,
    pub(crate) value: Option<Value>,
}

impl<'g> ArgumentRun<'g> {
    pub(crate) fn new(def: &'g ArgumentDef) -> Self {
        Self {
            def,
            raw: Vec::new(),
            value: None,
        }
    }
}
