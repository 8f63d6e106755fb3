//! JSON grammar descriptors for argsmith.
//!
//! A [`GrammarDocument`] describes a command tree as data so it can be kept
//! next to a program, checked by the `argsmith` tool, or generated by other
//! tooling. [`CommandSchema::into_builder`] turns it back into the builder
//! API of the core crate.
//!
//! ```json
//! {
//!   "format-version": 1,
//!   "style": "unix",
//!   "command": {
//!     "name": "make",
//!     "arguments": [{ "name": "file" }],
//!     "options": [{ "name": "verbose", "aliases": ["v"] }]
//!   }
//! }
//! ```

use std::sync::Arc;

use argsmith::validate::{
    BooleanValidator, CompositeValidator, DirectoryValidator, EnumValidator, FileValidator,
    FloatValidator, GuidValidator, IntegerValidator, LengthValidator, RegexValidator,
    UriValidator,
};
use argsmith::{
    ArgStyleKind, ArgumentDef, Command, CommandBuilder, Grouping, Name, OptionDef, ParamIndex,
    Parser, Scalar, SharedValidator, UNLIMITED, Usage, Value, ValueKind, ValueShape,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version written to and accepted in `format-version`.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid grammar document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported format version {0} (expected {})", FORMAT_VERSION)]
    UnsupportedVersion(u32),

    #[error("{0}")]
    UnknownName(String),

    #[error("'{owner}': invalid pattern: {message}")]
    InvalidPattern { owner: String, message: String },

    #[error("'{owner}': invalid default: {message}")]
    InvalidDefault { owner: String, message: String },

    #[error(transparent)]
    Grammar(#[from] argsmith::Error),
}

fn default_format_version() -> u32 {
    FORMAT_VERSION
}

/// Top level JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GrammarDocument {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping: Option<String>,
    pub command: CommandSchema,
}

impl GrammarDocument {
    pub fn new(command: CommandSchema) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            style: None,
            grouping: None,
            command,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let doc: Self = serde_json::from_str(text)?;
        if doc.format_version != FORMAT_VERSION {
            return Err(SchemaError::UnsupportedVersion(doc.format_version));
        }
        Ok(doc)
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Declared style, `unix` when absent.
    pub fn style_kind(&self) -> Result<ArgStyleKind, SchemaError> {
        match &self.style {
            Some(name) => name.parse().map_err(SchemaError::UnknownName),
            None => Ok(ArgStyleKind::default()),
        }
    }

    pub fn grouping(&self) -> Result<Grouping, SchemaError> {
        match &self.grouping {
            Some(name) => name.parse().map_err(SchemaError::UnknownName),
            None => Ok(Grouping::default()),
        }
    }

    pub fn build_command(&self) -> Result<Command, SchemaError> {
        Ok(self.command.clone().into_builder()?.build()?)
    }

    /// Parser with the document's own style and grouping.
    pub fn build_parser(&self) -> Result<Parser, SchemaError> {
        let parser = Parser::with_boxed_style(self.build_command()?, self.style_kind()?.into_style())?;
        Ok(parser.grouping(self.grouping()?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct CommandSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub ignore_case: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ArgumentSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandSchema>,
}

impl CommandSchema {
    pub fn into_builder(self) -> Result<CommandBuilder, SchemaError> {
        let name = |text: String| name_for(text, self.ignore_case);
        let mut builder = Command::builder(name(self.name.clone())).description(self.description);
        for alias in self.aliases {
            builder = builder.alias(name(alias));
        }
        for arg in self.arguments {
            builder = builder.argument(arg.into_def()?);
        }
        for opt in self.options {
            builder = builder.option(opt.into_def()?);
        }
        for sub in self.commands {
            builder = builder.subcommand(sub.into_builder()?);
        }
        Ok(builder)
    }
}

fn name_for(text: String, ignore_case: bool) -> Name {
    if ignore_case {
        Name::ignore_case(text)
    } else {
        Name::new(text)
    }
}

/// `3` or `"unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bound {
    Limit(u32),
    Keyword(Unlimited),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Unlimited {
    Unlimited,
}

impl Bound {
    pub fn get(self) -> u32 {
        match self {
            Self::Limit(n) => n,
            Self::Keyword(Unlimited::Unlimited) => UNLIMITED,
        }
    }
}

fn one() -> Bound {
    Bound::Limit(1)
}

fn zero() -> Bound {
    Bound::Limit(0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArgumentSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default = "one")]
    pub max_occurrences: Bound,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<ValidatorSchema>,
}

impl ArgumentSchema {
    pub fn into_def(self) -> Result<ArgumentDef, SchemaError> {
        let kind = value_kind(self.value_type.as_deref())?;
        let mut def = ArgumentDef::new(self.name.as_str())
            .description(self.description)
            .max_occurrences(self.max_occurrences.get())
            .under_groups(self.groups)
            .typed(kind);
        if self.optional {
            def = def.optional();
        }
        if let Some(json) = &self.default {
            def = def.defaults_to(default_value(&self.name, json, kind, None)?);
        }
        for v in &self.validators {
            def = def.validate_with_shared(v.to_validator(&self.name)?);
        }
        Ok(def)
    }
}

/// A named preset or explicit bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UsageSchema {
    Preset(UsagePreset),
    Explicit(UsageBounds),
}

impl Default for UsageSchema {
    fn default() -> Self {
        Self::Preset(UsagePreset::Flag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsagePreset {
    Flag,
    Count,
    SingleParameter,
    UnlimitedParameters,
    UnlimitedOccurrencesSingleParameter,
    UnlimitedOccurrencesAndParameters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UsageBounds {
    #[serde(default)]
    pub min_occurrences: u32,
    #[serde(default = "one")]
    pub max_occurrences: Bound,
    #[serde(default)]
    pub min_parameters: u32,
    #[serde(default = "zero")]
    pub max_parameters: Bound,
}

impl UsageSchema {
    pub fn to_usage(&self) -> Usage {
        match self {
            Self::Preset(preset) => match preset {
                UsagePreset::Flag => Usage::FLAG,
                UsagePreset::Count => Usage::COUNT,
                UsagePreset::SingleParameter => Usage::SINGLE_PARAMETER,
                UsagePreset::UnlimitedParameters => Usage::UNLIMITED_PARAMETERS,
                UsagePreset::UnlimitedOccurrencesSingleParameter => {
                    Usage::UNLIMITED_OCCURRENCES_SINGLE_PARAMETER
                }
                UsagePreset::UnlimitedOccurrencesAndParameters => {
                    Usage::UNLIMITED_OCCURRENCES_AND_PARAMETERS
                }
            },
            Self::Explicit(b) => Usage::new(
                b.min_occurrences,
                b.max_occurrences.get(),
                b.min_parameters,
                b.max_parameters.get(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct OptionSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub ignore_case: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub usage: UsageSchema,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<ParameterValidatorSchema>,
}

impl OptionSchema {
    pub fn into_def(self) -> Result<OptionDef, SchemaError> {
        let kind = value_kind(self.value_type.as_deref())?;
        let usage = self.usage.to_usage();
        let mut def = OptionDef::new(name_for(self.name.clone(), self.ignore_case))
            .usage(usage)
            .description(self.description)
            .under_groups(self.groups)
            .typed(kind);
        for alias in self.aliases {
            def = def.alias(name_for(alias, self.ignore_case));
        }
        if self.required {
            def = def.required();
        }
        if let Some(json) = &self.default {
            def = def.defaults_to(default_value(&self.name, json, kind, Some(usage.shape()))?);
        }
        for v in &self.validators {
            let index = v.parameter.map_or(ParamIndex::All, ParamIndex::At);
            def = def.validate_parameter_with_shared(index, v.validator.to_validator(&self.name)?);
        }
        Ok(def)
    }
}

/// A validator, optionally limited to one parameter position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterValidatorSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<usize>,
    #[serde(flatten)]
    pub validator: ValidatorSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ValidatorSchema {
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    Float {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Length {
        #[serde(default)]
        min: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
    },
    #[serde(rename_all = "kebab-case")]
    Enum {
        values: Vec<String>,
        #[serde(default)]
        ignore_case: bool,
    },
    Regex {
        pattern: String,
    },
    Boolean,
    #[serde(rename_all = "kebab-case")]
    File {
        #[serde(default)]
        must_exist: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        extensions: Vec<String>,
    },
    #[serde(rename_all = "kebab-case")]
    Directory {
        #[serde(default)]
        must_exist: bool,
    },
    Guid,
    Uri {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        schemes: Vec<String>,
    },
    /// Passes when any inner validator passes.
    Any {
        of: Vec<ValidatorSchema>,
    },
}

impl ValidatorSchema {
    /// `owner` names the argument or option in error messages.
    pub fn to_validator(&self, owner: &str) -> Result<SharedValidator, SchemaError> {
        let validator: SharedValidator = match self {
            Self::Integer { min, max } => {
                let mut v = IntegerValidator::new();
                if let Some(min) = min {
                    v = v.min(*min);
                }
                if let Some(max) = max {
                    v = v.max(*max);
                }
                Arc::new(v)
            }
            Self::Float { min, max } => {
                let mut v = FloatValidator::new();
                if let Some(min) = min {
                    v = v.min(*min);
                }
                if let Some(max) = max {
                    v = v.max(*max);
                }
                Arc::new(v)
            }
            Self::Length { min, max } => Arc::new(LengthValidator::new(*min, max.unwrap_or(usize::MAX))),
            Self::Enum {
                values,
                ignore_case,
            } => {
                let v = EnumValidator::new(values.iter().cloned());
                Arc::new(if *ignore_case { v.ignore_case() } else { v })
            }
            Self::Regex { pattern } => {
                let v = RegexValidator::new(pattern).map_err(|e| SchemaError::InvalidPattern {
                    owner: owner.to_string(),
                    message: e.to_string(),
                })?;
                Arc::new(v)
            }
            Self::Boolean => Arc::new(BooleanValidator::new()),
            Self::File {
                must_exist,
                extensions,
            } => {
                let v = FileValidator::new().extensions(extensions.iter().cloned());
                Arc::new(if *must_exist { v.must_exist() } else { v })
            }
            Self::Directory { must_exist } => {
                let v = DirectoryValidator::new();
                Arc::new(if *must_exist { v.must_exist() } else { v })
            }
            Self::Guid => Arc::new(GuidValidator::new()),
            Self::Uri { schemes } => Arc::new(UriValidator::new().schemes(schemes.iter().cloned())),
            Self::Any { of } => {
                let mut v = CompositeValidator::new();
                for inner in of {
                    v = v.or_shared(inner.to_validator(owner)?);
                }
                Arc::new(v)
            }
        };
        Ok(validator)
    }
}

fn value_kind(name: Option<&str>) -> Result<ValueKind, SchemaError> {
    match name {
        Some(name) => name.parse().map_err(SchemaError::UnknownName),
        None => Ok(ValueKind::Text),
    }
}

fn default_value(
    owner: &str,
    json: &serde_json::Value,
    kind: ValueKind,
    shape: Option<ValueShape>,
) -> Result<Value, SchemaError> {
    match (json, shape) {
        (serde_json::Value::Bool(b), Some(ValueShape::Flag)) => Ok(Value::Flag(*b)),
        (serde_json::Value::Number(n), Some(ValueShape::Count)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Value::Count)
            .ok_or_else(|| SchemaError::InvalidDefault {
                owner: owner.to_string(),
                message: format!("{n} is not a valid count"),
            }),
        (serde_json::Value::Array(items), _) => items
            .iter()
            .map(|item| default_scalar(owner, item, kind))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        (other, _) => default_scalar(owner, other, kind).map(Value::Single),
    }
}

fn default_scalar(owner: &str, json: &serde_json::Value, kind: ValueKind) -> Result<Scalar, SchemaError> {
    let invalid = |message: String| SchemaError::InvalidDefault {
        owner: owner.to_string(),
        message,
    };
    match json {
        serde_json::Value::String(s) => kind.convert(s).map_err(invalid),
        serde_json::Value::Bool(b) => Ok(Scalar::Boolean(*b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Scalar::Integer(i)),
            None => n
                .as_f64()
                .map(Scalar::Float)
                .ok_or_else(|| invalid(format!("{n} is out of range"))),
        },
        other => Err(invalid(format!("unsupported default {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argsmith::ErrorCode;

    const SAMPLE: &str = r#"{
        "format-version": 1,
        "style": "gnu",
        "command": {
            "name": "deploy",
            "description": "Ship a build",
            "arguments": [
                { "name": "target" },
                { "name": "files", "optional": true, "max-occurrences": "unlimited", "value-type": "path" }
            ],
            "options": [
                { "name": "v", "aliases": ["verbose"], "usage": "count" },
                { "name": "retries", "usage": "single-parameter", "value-type": "integer",
                  "default": 3, "validators": [{ "kind": "integer", "min": 0, "max": 10 }] },
                { "name": "env", "usage": { "min-parameters": 1, "max-parameters": 2 },
                  "validators": [{ "kind": "enum", "values": ["dev", "prod"], "parameter": 0 }] }
            ],
            "commands": [
                { "name": "rollback", "aliases": ["rb"], "ignore-case": true }
            ]
        }
    }"#;

    #[test]
    fn sample_document_builds_a_working_parser() {
        let doc = GrammarDocument::from_json(SAMPLE).unwrap();
        assert_eq!(doc.style_kind().unwrap(), ArgStyleKind::Gnu);
        let parser = doc.build_parser().unwrap();
        assert_eq!(parser.style().name(), "gnu");

        let result = parser
            .parse(["-vv", "--env", "prod", "eu", "prod-1", "a.tar", "b.tar"])
            .unwrap();
        assert_eq!(result.occurrences("verbose"), 2);
        assert_eq!(result.option::<i64>("retries"), Ok(Some(3)));
        assert_eq!(
            result.option::<Vec<String>>("env"),
            Ok(Some(vec!["prod".into(), "eu".into()]))
        );
        assert_eq!(result.argument::<String>(0), Ok(Some("prod-1".into())));
        assert_eq!(
            result.argument::<Vec<std::path::PathBuf>>(1).unwrap().map(|v| v.len()),
            Some(2)
        );

        let err = parser.parse(["--env", "qa", "x"]).unwrap_err();
        assert_eq!(err.as_validation().map(|v| v.validator()), Some("EnumValidator"));

        let sub = parser.parse(["RB"]).unwrap();
        assert_eq!(sub.command_path(), &["deploy", "rollback"]);
    }

    #[test]
    fn usage_presets_and_bounds() {
        let usage: UsageSchema = serde_json::from_str(r#""unlimited-parameters""#).unwrap();
        assert_eq!(usage.to_usage(), Usage::UNLIMITED_PARAMETERS);
        let usage: UsageSchema =
            serde_json::from_str(r#"{"max-occurrences": "unlimited", "max-parameters": 1}"#).unwrap();
        assert_eq!(usage.to_usage(), Usage::new(0, UNLIMITED, 0, 1));
        assert_eq!(UsageSchema::default().to_usage(), Usage::FLAG);
    }

    #[test]
    fn documents_round_trip_through_json() {
        let doc = GrammarDocument::from_json(SAMPLE).unwrap();
        let again = GrammarDocument::from_json(&doc.to_json_pretty()).unwrap();
        assert_eq!(doc, again);
    }

    #[test]
    fn bad_documents_are_reported() {
        let err = GrammarDocument::from_json(r#"{"format-version": 2, "command": {"name": "x"}}"#)
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedVersion(2)));

        let err = GrammarDocument::from_json(r#"{"command": {"name": "x", "options": [
            {"name": "o", "validators": [{"kind": "regex", "pattern": "("}]}]}}"#)
        .unwrap()
        .build_command()
        .unwrap_err();
        match err {
            SchemaError::InvalidPattern { owner, .. } => assert_eq!(owner, "o"),
            other => panic!("expected InvalidPattern, got: {other:?}"),
        }

        let err = GrammarDocument::from_json(r#"{"command": {"name": "x", "arguments": [
            {"name": "a", "optional": true}, {"name": "b"}]}}"#)
        .unwrap()
        .build_command()
        .unwrap_err();
        match err {
            SchemaError::Grammar(inner) => {
                assert_eq!(inner.code(), ErrorCode::RequiredArgumentsDefinedAfterOptional)
            }
            other => panic!("expected Grammar, got: {other:?}"),
        }

        let doc = GrammarDocument {
            style: Some("dos".into()),
            ..GrammarDocument::new(CommandSchema::default())
        };
        assert!(doc.style_kind().is_err());
    }

    #[test]
    fn defaults_follow_value_shape() {
        let flag = default_value("f", &serde_json::json!(true), ValueKind::Text, Some(ValueShape::Flag));
        assert_eq!(flag.unwrap(), Value::Flag(true));
        let count = default_value("c", &serde_json::json!(2), ValueKind::Text, Some(ValueShape::Count));
        assert_eq!(count.unwrap(), Value::Count(2));
        let list = default_value("l", &serde_json::json!(["1", "2"]), ValueKind::Integer, None);
        assert_eq!(
            list.unwrap(),
            Value::List(vec![Scalar::Integer(1), Scalar::Integer(2)])
        );
        assert!(default_value("u", &serde_json::json!("x"), ValueKind::Uuid, None).is_err());
    }
}
