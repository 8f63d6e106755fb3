//! Declared shape of arguments and options.
//!
//! These types are plain data with small invariant-checking setters. They hold
//! no parse state, so a single grammar can be parsed any number of times.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::validate::{SharedValidator, Validator};
use crate::value::{Converter, DefaultSupplier, Formatter, Scalar, ScalarType, Value, ValueKind};

/// Sentinel for "no upper bound" in occurrence and parameter counts.
pub const UNLIMITED: u32 = u32::MAX;

/// Group every argument and option belongs to unless told otherwise.
pub const DEFAULT_GROUP: u32 = 0;

/// A name that matches case-sensitively or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    text: String,
    case_sensitive: bool,
}

impl Name {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            case_sensitive: true,
        }
    }

    pub fn ignore_case(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            case_sensitive: false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn matches(&self, candidate: &str) -> bool {
        if self.case_sensitive {
            self.text == candidate
        } else {
            self.text.to_lowercase() == candidate.to_lowercase()
        }
    }

    /// Whether two names could match the same token.
    pub fn collides_with(&self, other: &Name) -> bool {
        if self.case_sensitive && other.case_sensitive {
            self.text == other.text
        } else {
            self.text.to_lowercase() == other.text.to_lowercase()
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// How an option's occurrences and parameters resolve into a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Flag,
    Count,
    Object,
    List,
}

/// Occurrence and parameter cardinality of an option.
///
/// Parameter bounds apply to each occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub min_occurrences: u32,
    pub max_occurrences: u32,
    pub min_parameters: u32,
    pub max_parameters: u32,
}

impl Usage {
    pub const FLAG: Usage = Usage::new(0, 1, 0, 0);
    pub const COUNT: Usage = Usage::new(0, UNLIMITED, 0, 0);
    pub const SINGLE_PARAMETER: Usage = Usage::new(0, 1, 1, 1);
    pub const UNLIMITED_PARAMETERS: Usage = Usage::new(0, 1, 1, UNLIMITED);
    pub const UNLIMITED_OCCURRENCES_SINGLE_PARAMETER: Usage = Usage::new(0, UNLIMITED, 1, 1);
    pub const UNLIMITED_OCCURRENCES_AND_PARAMETERS: Usage =
        Usage::new(0, UNLIMITED, 1, UNLIMITED);

    pub const fn new(
        min_occurrences: u32,
        max_occurrences: u32,
        min_parameters: u32,
        max_parameters: u32,
    ) -> Self {
        Self {
            min_occurrences,
            max_occurrences,
            min_parameters,
            max_parameters,
        }
    }

    pub fn shape(&self) -> ValueShape {
        if self.max_parameters == 0 {
            if self.max_occurrences == 1 {
                ValueShape::Flag
            } else {
                ValueShape::Count
            }
        } else if self.max_occurrences == 1 && self.max_parameters == 1 {
            ValueShape::Object
        } else {
            ValueShape::List
        }
    }

    pub fn is_required(&self) -> bool {
        self.min_occurrences > 0
    }

    pub fn takes_parameters(&self) -> bool {
        self.max_parameters > 0
    }

    /// Parameter count per occurrence is not fixed.
    pub fn has_variable_parameters(&self) -> bool {
        self.min_parameters != self.max_parameters
    }

    pub fn has_unlimited_parameters(&self) -> bool {
        self.max_parameters == UNLIMITED
    }

    /// Upper bound on parameters across all occurrences.
    pub fn max_total_parameters(&self) -> u32 {
        self.max_occurrences.saturating_mul(self.max_parameters)
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        if self.max_occurrences == 0 {
            return Err("max occurrences must be at least 1".into());
        }
        if self.min_occurrences > self.max_occurrences {
            return Err(format!(
                "min occurrences {} exceeds max occurrences {}",
                self.min_occurrences, self.max_occurrences
            ));
        }
        if self.min_parameters > self.max_parameters {
            return Err(format!(
                "min parameters {} exceeds max parameters {}",
                self.min_parameters, self.max_parameters
            ));
        }
        Ok(())
    }
}

impl Default for Usage {
    fn default() -> Self {
        Self::FLAG
    }
}

/// Which parameters of an option a validator applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamIndex {
    All,
    At(usize),
}

impl ParamIndex {
    pub fn applies_to(self, index: usize) -> bool {
        match self {
            Self::All => true,
            Self::At(i) => i == index,
        }
    }
}

/// Conversion and defaulting shared by arguments and options.
#[derive(Clone, Default)]
pub(crate) struct ValueSpec {
    pub(crate) converter: Option<Converter>,
    pub(crate) formatter: Option<Formatter>,
    pub(crate) default: Option<DefaultSupplier>,
}

impl ValueSpec {
    /// Format then convert one raw string.
    pub(crate) fn convert(&self, raw: &str) -> Result<Scalar, String> {
        let formatted = match &self.formatter {
            Some(f) => f(raw),
            None => raw.to_string(),
        };
        match &self.converter {
            Some(c) => c(&formatted),
            None => Ok(Scalar::Text(formatted)),
        }
    }

    pub(crate) fn default_value(&self) -> Option<Value> {
        self.default.as_ref().map(|d| d())
    }
}

impl fmt::Debug for ValueSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueSpec")
            .field("converter", &self.converter.is_some())
            .field("formatter", &self.formatter.is_some())
            .field("default", &self.default.is_some())
            .finish()
    }
}

macro_rules! value_builders {
    () => {
        /// Convert raw strings with a built-in conversion.
        pub fn typed(mut self, kind: ValueKind) -> Self {
            self.value.converter = Some(Arc::new(move |raw: &str| kind.convert(raw)));
            self
        }

        /// Convert raw strings to `T`, e.g. `type_as::<i64>()`.
        pub fn type_as<T: ScalarType>(self) -> Self {
            self.typed(T::KIND)
        }

        pub fn convert_with(
            mut self,
            converter: impl Fn(&str) -> Result<Scalar, String> + Send + Sync + 'static,
        ) -> Self {
            self.value.converter = Some(Arc::new(converter));
            self
        }

        /// Pre-process raw strings before conversion.
        pub fn format_as(mut self, formatter: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
            self.value.formatter = Some(Arc::new(formatter));
            self
        }

        pub fn defaults_to(mut self, value: impl Into<Value>) -> Self {
            let value = value.into();
            self.value.default = Some(Arc::new(move || value.clone()));
            self
        }

        pub fn defaults_with(mut self, supplier: impl Fn() -> Value + Send + Sync + 'static) -> Self {
            self.value.default = Some(Arc::new(supplier));
            self
        }

        pub fn under_groups(mut self, groups: impl IntoIterator<Item = u32>) -> Self {
            self.groups = groups.into_iter().collect();
            if self.groups.is_empty() {
                self.groups.insert(DEFAULT_GROUP);
            }
            self
        }

        pub fn description(mut self, description: impl Into<String>) -> Self {
            self.description = description.into();
            self
        }

        pub fn groups(&self) -> &BTreeSet<u32> {
            &self.groups
        }

        pub fn in_group(&self, group: u32) -> bool {
            self.groups.contains(&group)
        }

        pub fn has_default(&self) -> bool {
            self.value.default.is_some()
        }

        pub fn description_text(&self) -> &str {
            &self.description
        }
    };
}

fn default_groups() -> BTreeSet<u32> {
    BTreeSet::from([DEFAULT_GROUP])
}

/// A positional argument.
#[derive(Debug, Clone)]
pub struct ArgumentDef {
    name: String,
    optional: bool,
    max_occurrences: u32,
    groups: BTreeSet<u32>,
    description: String,
    validators: Vec<SharedValidator>,
    pub(crate) value: ValueSpec,
}

impl ArgumentDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
            max_occurrences: 1,
            groups: default_groups(),
            description: String::new(),
            validators: Vec::new(),
            value: ValueSpec::default(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.optional = false;
        self
    }

    /// Number of values the argument may collect. Only the last argument of a
    /// command may take more than one.
    pub fn max_occurrences(mut self, max: u32) -> Self {
        self.max_occurrences = max;
        self
    }

    pub fn unlimited(self) -> Self {
        self.max_occurrences(UNLIMITED)
    }

    pub fn validate_with(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn validate_with_shared(mut self, validator: SharedValidator) -> Self {
        self.validators.push(validator);
        self
    }

    value_builders!();

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn max_occurrence_count(&self) -> u32 {
        self.max_occurrences
    }

    pub fn is_repeatable(&self) -> bool {
        self.max_occurrences > 1
    }

    pub fn validators(&self) -> &[SharedValidator] {
        &self.validators
    }
}

/// A named option such as `-v`, `--verbose` or `/v`.
#[derive(Debug, Clone)]
pub struct OptionDef {
    names: Vec<Name>,
    usage: Usage,
    groups: BTreeSet<u32>,
    description: String,
    validators: Vec<(ParamIndex, SharedValidator)>,
    pub(crate) value: ValueSpec,
}

impl OptionDef {
    /// Create an option whose first name is its primary name.
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            names: vec![name.into()],
            usage: Usage::FLAG,
            groups: default_groups(),
            description: String::new(),
            validators: Vec::new(),
            value: ValueSpec::default(),
        }
    }

    pub fn alias(mut self, name: impl Into<Name>) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    pub fn occurrences(mut self, min: u32, max: u32) -> Self {
        self.usage.min_occurrences = min;
        self.usage.max_occurrences = max;
        self
    }

    pub fn parameters(mut self, min: u32, max: u32) -> Self {
        self.usage.min_parameters = min;
        self.usage.max_parameters = max;
        self
    }

    /// Require at least one occurrence.
    pub fn required(mut self) -> Self {
        self.usage.min_occurrences = self.usage.min_occurrences.max(1);
        self
    }

    pub fn used_as_flag(self) -> Self {
        self.usage(Usage::FLAG)
    }

    pub fn used_as_count(self) -> Self {
        self.usage(Usage::COUNT)
    }

    pub fn used_as_single_parameter(self) -> Self {
        self.usage(Usage::SINGLE_PARAMETER)
    }

    pub fn used_as_unlimited_parameters(self) -> Self {
        self.usage(Usage::UNLIMITED_PARAMETERS)
    }

    pub fn used_as_unlimited_occurrences_single_parameter(self) -> Self {
        self.usage(Usage::UNLIMITED_OCCURRENCES_SINGLE_PARAMETER)
    }

    pub fn used_as_unlimited_occurrences_and_parameters(self) -> Self {
        self.usage(Usage::UNLIMITED_OCCURRENCES_AND_PARAMETERS)
    }

    /// Validate every parameter.
    pub fn validate_with(self, validator: impl Validator + 'static) -> Self {
        self.validate_parameter_with(ParamIndex::All, validator)
    }

    pub fn validate_parameter_with(
        mut self,
        index: ParamIndex,
        validator: impl Validator + 'static,
    ) -> Self {
        self.validators.push((index, Arc::new(validator)));
        self
    }

    pub fn validate_parameter_with_shared(
        mut self,
        index: ParamIndex,
        validator: SharedValidator,
    ) -> Self {
        self.validators.push((index, validator));
        self
    }

    value_builders!();

    pub fn primary_name(&self) -> &str {
        self.names[0].as_str()
    }

    pub fn names(&self) -> &[Name] {
        &self.names
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.names.iter().any(|n| n.matches(candidate))
    }

    pub fn usage_rules(&self) -> &Usage {
        &self.usage
    }

    pub fn shape(&self) -> ValueShape {
        self.usage.shape()
    }

    pub fn validators(&self) -> &[(ParamIndex, SharedValidator)] {
        &self.validators
    }

    /// Validators that apply to the parameter at `index`.
    pub fn validators_for(&self, index: usize) -> impl Iterator<Item = &SharedValidator> {
        self.validators
            .iter()
            .filter(move |(at, _)| at.applies_to(index))
            .map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::IntegerValidator;

    #[test]
    fn usage_shapes() {
        assert_eq!(Usage::FLAG.shape(), ValueShape::Flag);
        assert_eq!(Usage::COUNT.shape(), ValueShape::Count);
        assert_eq!(Usage::SINGLE_PARAMETER.shape(), ValueShape::Object);
        assert_eq!(Usage::UNLIMITED_PARAMETERS.shape(), ValueShape::List);
        assert_eq!(
            Usage::UNLIMITED_OCCURRENCES_SINGLE_PARAMETER.shape(),
            ValueShape::List
        );
        assert_eq!(Usage::new(0, 1, 2, 2).shape(), ValueShape::List);
    }

    #[test]
    fn usage_check_rejects_inverted_bounds() {
        assert!(Usage::new(2, 1, 0, 0).check().is_err());
        assert!(Usage::new(0, 1, 3, 1).check().is_err());
        assert!(Usage::new(0, 0, 0, 0).check().is_err());
        assert!(Usage::COUNT.check().is_ok());
        assert_eq!(Usage::COUNT.max_total_parameters(), 0);
        assert_eq!(
            Usage::UNLIMITED_OCCURRENCES_SINGLE_PARAMETER.max_total_parameters(),
            UNLIMITED
        );
    }

    #[test]
    fn names_respect_their_own_case_rule() {
        let opt = OptionDef::new("verbose").alias(Name::ignore_case("V"));
        assert!(opt.matches("verbose"));
        assert!(!opt.matches("VERBOSE"));
        assert!(opt.matches("v"));
        assert!(Name::new("x").collides_with(&Name::ignore_case("X")));
        assert!(!Name::new("x").collides_with(&Name::new("X")));
    }

    #[test]
    fn parameter_validators_by_index() {
        let opt = OptionDef::new("size")
            .parameters(2, 2)
            .validate_parameter_with(ParamIndex::At(1), IntegerValidator::new())
            .validate_with(IntegerValidator::range(0, 100));
        assert_eq!(opt.validators_for(0).count(), 1);
        assert_eq!(opt.validators_for(1).count(), 2);
    }

    #[test]
    fn empty_group_list_falls_back_to_default() {
        let arg = ArgumentDef::new("file").under_groups([]);
        assert!(arg.in_group(DEFAULT_GROUP));
        let arg = ArgumentDef::new("file").under_groups([1, 2]);
        assert!(!arg.in_group(DEFAULT_GROUP));
        assert!(arg.in_group(2));
    }

    #[test]
    fn value_spec_formats_before_converting() {
        let arg = ArgumentDef::new("n")
            .format_as(|s| s.trim_start_matches('#').to_string())
            .type_as::<i64>();
        assert_eq!(arg.value.convert("#12"), Ok(Scalar::Integer(12)));
    }
}
