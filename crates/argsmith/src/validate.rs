//! String validators.
//!
//! Every validator works in two phases: [`Validator::validate_as_string`]
//! checks the raw string and produces a typed [`Scalar`], then
//! [`Validator::validate_as_actual_type`] runs checks that only make sense on
//! the converted value (a path that must exist, a URI scheme, ...).
//!
//! Messages are templates: `{0}` is replaced by the raw value, `{1}` and `{2}`
//! by validator specific context such as the allowed range.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use url::Url;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::value::{Scalar, parse_bool};

pub trait Validator: Send + Sync + fmt::Debug {
    /// Type name reported in [`ValidationError::validator`].
    fn name(&self) -> &'static str;

    fn validate_as_string(&self, raw: &str) -> Result<Scalar, ValidationError>;

    fn validate_as_actual_type(&self, _value: &Scalar, _raw: &str) -> Result<(), ValidationError> {
        Ok(())
    }

    fn validate(&self, raw: &str) -> Result<(), ValidationError> {
        let value = self.validate_as_string(raw)?;
        self.validate_as_actual_type(&value, raw)
    }
}

pub type SharedValidator = Arc<dyn Validator>;

/// Expand `{0}`, `{1}`, ... in a message template.
///
/// Substituted text is never rescanned, so arguments containing `{1}` stay
/// verbatim. Placeholders without a matching argument are kept as written.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let placeholder = tail.find('}').and_then(|close| {
            let idx: usize = tail[..close].parse().ok()?;
            args.get(idx).map(|arg| (*arg, close))
        });
        match placeholder {
            Some((arg, close)) => {
                out.push_str(arg);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn fail(v: &dyn Validator, template: &str, raw: &str, extra: &[&str]) -> ValidationError {
    let mut args = Vec::with_capacity(extra.len() + 1);
    args.push(raw);
    args.extend_from_slice(extra);
    ValidationError::new(format_message(template, &args), v.name(), raw)
}

fn bound_text<T: fmt::Display>(bound: Option<T>, open: &str) -> String {
    bound.map(|b| b.to_string()).unwrap_or_else(|| open.to_string())
}

macro_rules! with_message {
    () => {
        /// Override the default message template.
        pub fn with_message(mut self, template: impl Into<Cow<'static, str>>) -> Self {
            self.message = template.into();
            self
        }
    };
}

/// Integer within an optional inclusive range.
#[derive(Debug, Clone)]
pub struct IntegerValidator {
    min: Option<i64>,
    max: Option<i64>,
    message: Cow<'static, str>,
}

impl IntegerValidator {
    pub const DEFAULT_MESSAGE: &'static str = "'{0}' must be an integer between {1} and {2}";

    pub fn new() -> Self {
        Self {
            min: None,
            max: None,
            message: Cow::Borrowed(Self::DEFAULT_MESSAGE),
        }
    }

    pub fn range(min: i64, max: i64) -> Self {
        Self::new().min(min).max(max)
    }

    pub fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    with_message!();

    fn reject(&self, raw: &str) -> ValidationError {
        let lo = bound_text(self.min, "-inf");
        let hi = bound_text(self.max, "+inf");
        fail(self, &self.message, raw, &[lo.as_str(), hi.as_str()])
    }
}

impl Default for IntegerValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for IntegerValidator {
    fn name(&self) -> &'static str {
        "IntegerValidator"
    }

    fn validate_as_string(&self, raw: &str) -> Result<Scalar, ValidationError> {
        let n: i64 = raw.trim().parse().map_err(|_| self.reject(raw))?;
        Ok(Scalar::Integer(n))
    }

    fn validate_as_actual_type(&self, value: &Scalar, raw: &str) -> Result<(), ValidationError> {
        let Scalar::Integer(n) = value else {
            return Err(self.reject(raw));
        };
        if self.min.is_some_and(|min| *n < min) || self.max.is_some_and(|max| *n > max) {
            return Err(self.reject(raw));
        }
        Ok(())
    }
}

/// Floating point number within an optional inclusive range.
#[derive(Debug, Clone)]
pub struct FloatValidator {
    min: Option<f64>,
    max: Option<f64>,
    message: Cow<'static, str>,
}

impl FloatValidator {
    pub const DEFAULT_MESSAGE: &'static str = "'{0}' must be a number between {1} and {2}";

    pub fn new() -> Self {
        Self {
            min: None,
            max: None,
            message: Cow::Borrowed(Self::DEFAULT_MESSAGE),
        }
    }

    pub fn range(min: f64, max: f64) -> Self {
        Self::new().min(min).max(max)
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    with_message!();

    fn reject(&self, raw: &str) -> ValidationError {
        let lo = bound_text(self.min, "-inf");
        let hi = bound_text(self.max, "+inf");
        fail(self, &self.message, raw, &[lo.as_str(), hi.as_str()])
    }
}

impl Default for FloatValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for FloatValidator {
    fn name(&self) -> &'static str {
        "FloatValidator"
    }

    fn validate_as_string(&self, raw: &str) -> Result<Scalar, ValidationError> {
        let n: f64 = raw.trim().parse().map_err(|_| self.reject(raw))?;
        if n.is_nan() {
            return Err(self.reject(raw));
        }
        Ok(Scalar::Float(n))
    }

    fn validate_as_actual_type(&self, value: &Scalar, raw: &str) -> Result<(), ValidationError> {
        let Scalar::Float(n) = value else {
            return Err(self.reject(raw));
        };
        if self.min.is_some_and(|min| *n < min) || self.max.is_some_and(|max| *n > max) {
            return Err(self.reject(raw));
        }
        Ok(())
    }
}

/// String length within an inclusive range, counted in characters.
#[derive(Debug, Clone)]
pub struct LengthValidator {
    min: usize,
    max: usize,
    message: Cow<'static, str>,
}

impl LengthValidator {
    pub const DEFAULT_MESSAGE: &'static str =
        "'{0}' must be between {1} and {2} characters long";

    pub fn new(min: usize, max: usize) -> Self {
        Self {
            min,
            max,
            message: Cow::Borrowed(Self::DEFAULT_MESSAGE),
        }
    }

    with_message!();
}

impl Validator for LengthValidator {
    fn name(&self) -> &'static str {
        "LengthValidator"
    }

    fn validate_as_string(&self, raw: &str) -> Result<Scalar, ValidationError> {
        let len = raw.chars().count();
        if len < self.min || len > self.max {
            let (lo, hi) = (self.min.to_string(), self.max.to_string());
            return Err(fail(self, &self.message, raw, &[lo.as_str(), hi.as_str()]));
        }
        Ok(Scalar::Text(raw.to_string()))
    }
}

/// Value must be one of a fixed set.
#[derive(Debug, Clone)]
pub struct EnumValidator {
    values: Vec<String>,
    case_sensitive: bool,
    message: Cow<'static, str>,
}

impl EnumValidator {
    pub const DEFAULT_MESSAGE: &'static str = "'{0}' is not one of: {1}";

    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            case_sensitive: true,
            message: Cow::Borrowed(Self::DEFAULT_MESSAGE),
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    with_message!();
}

impl Validator for EnumValidator {
    fn name(&self) -> &'static str {
        "EnumValidator"
    }

    fn validate_as_string(&self, raw: &str) -> Result<Scalar, ValidationError> {
        let found = self.values.iter().find(|v| {
            if self.case_sensitive {
                v.as_str() == raw
            } else {
                v.eq_ignore_ascii_case(raw)
            }
        });
        match found {
            // Normalize to the declared spelling.
            Some(v) => Ok(Scalar::Text(v.clone())),
            None => Err(fail(self, &self.message, raw, &[self.values.join(", ").as_str()])),
        }
    }
}

/// Value must match a regular expression.
#[derive(Debug, Clone)]
pub struct RegexValidator {
    regex: Regex,
    message: Cow<'static, str>,
}

impl RegexValidator {
    pub const DEFAULT_MESSAGE: &'static str = "'{0}' does not match the pattern {1}";

    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::from_regex(Regex::new(pattern)?))
    }

    pub fn from_regex(regex: Regex) -> Self {
        Self {
            regex,
            message: Cow::Borrowed(Self::DEFAULT_MESSAGE),
        }
    }

    with_message!();
}

impl Validator for RegexValidator {
    fn name(&self) -> &'static str {
        "RegexValidator"
    }

    fn validate_as_string(&self, raw: &str) -> Result<Scalar, ValidationError> {
        if self.regex.is_match(raw) {
            Ok(Scalar::Text(raw.to_string()))
        } else {
            Err(fail(self, &self.message, raw, &[self.regex.as_str()]))
        }
    }
}

/// Accepts `true/false`, `yes/no`, `on/off` and `1/0`.
#[derive(Debug, Clone)]
pub struct BooleanValidator {
    message: Cow<'static, str>,
}

impl BooleanValidator {
    pub const DEFAULT_MESSAGE: &'static str = "'{0}' is not a boolean value";

    pub fn new() -> Self {
        Self {
            message: Cow::Borrowed(Self::DEFAULT_MESSAGE),
        }
    }

    with_message!();
}

impl Default for BooleanValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for BooleanValidator {
    fn name(&self) -> &'static str {
        "BooleanValidator"
    }

    fn validate_as_string(&self, raw: &str) -> Result<Scalar, ValidationError> {
        parse_bool(raw)
            .map(Scalar::Boolean)
            .ok_or_else(|| fail(self, &self.message, raw, &[]))
    }
}

/// A file path, optionally required to exist and carry one of some extensions.
#[derive(Debug, Clone)]
pub struct FileValidator {
    must_exist: bool,
    extensions: Vec<String>,
    message: Cow<'static, str>,
    missing_message: Cow<'static, str>,
}

impl FileValidator {
    pub const DEFAULT_MESSAGE: &'static str = "'{0}' must have one of the extensions: {1}";
    pub const MISSING_MESSAGE: &'static str = "file '{0}' does not exist";

    pub fn new() -> Self {
        Self {
            must_exist: false,
            extensions: Vec::new(),
            message: Cow::Borrowed(Self::DEFAULT_MESSAGE),
            missing_message: Cow::Borrowed(Self::MISSING_MESSAGE),
        }
    }

    pub fn must_exist(mut self) -> Self {
        self.must_exist = true;
        self
    }

    /// Allowed extensions, with or without the leading dot.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    with_message!();

    pub fn with_missing_message(mut self, template: impl Into<Cow<'static, str>>) -> Self {
        self.missing_message = template.into();
        self
    }
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for FileValidator {
    fn name(&self) -> &'static str {
        "FileValidator"
    }

    fn validate_as_string(&self, raw: &str) -> Result<Scalar, ValidationError> {
        if !self.extensions.is_empty() {
            let ext = Path::new(raw)
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase);
            let allowed = ext.is_some_and(|e| self.extensions.iter().any(|a| *a == e));
            if !allowed {
                return Err(fail(self, &self.message, raw, &[self.extensions.join(", ").as_str()]));
            }
        }
        Ok(Scalar::Path(raw.into()))
    }

    fn validate_as_actual_type(&self, value: &Scalar, raw: &str) -> Result<(), ValidationError> {
        if !self.must_exist {
            return Ok(());
        }
        match value {
            Scalar::Path(p) if p.is_file() => Ok(()),
            _ => Err(fail(self, &self.missing_message, raw, &[])),
        }
    }
}

/// A directory path, optionally required to exist.
#[derive(Debug, Clone)]
pub struct DirectoryValidator {
    must_exist: bool,
    message: Cow<'static, str>,
}

impl DirectoryValidator {
    pub const DEFAULT_MESSAGE: &'static str = "directory '{0}' does not exist";

    pub fn new() -> Self {
        Self {
            must_exist: false,
            message: Cow::Borrowed(Self::DEFAULT_MESSAGE),
        }
    }

    pub fn must_exist(mut self) -> Self {
        self.must_exist = true;
        self
    }

    with_message!();
}

impl Default for DirectoryValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for DirectoryValidator {
    fn name(&self) -> &'static str {
        "DirectoryValidator"
    }

    fn validate_as_string(&self, raw: &str) -> Result<Scalar, ValidationError> {
        Ok(Scalar::Path(raw.into()))
    }

    fn validate_as_actual_type(&self, value: &Scalar, raw: &str) -> Result<(), ValidationError> {
        if !self.must_exist {
            return Ok(());
        }
        match value {
            Scalar::Path(p) if p.is_dir() => Ok(()),
            _ => Err(fail(self, &self.message, raw, &[])),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GuidValidator {
    message: Cow<'static, str>,
}

impl GuidValidator {
    pub const DEFAULT_MESSAGE: &'static str = "'{0}' is not a valid GUID";

    pub fn new() -> Self {
        Self {
            message: Cow::Borrowed(Self::DEFAULT_MESSAGE),
        }
    }

    with_message!();
}

impl Default for GuidValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for GuidValidator {
    fn name(&self) -> &'static str {
        "GuidValidator"
    }

    fn validate_as_string(&self, raw: &str) -> Result<Scalar, ValidationError> {
        Uuid::parse_str(raw.trim())
            .map(Scalar::Uuid)
            .map_err(|_| fail(self, &self.message, raw, &[]))
    }
}

/// An absolute URI, optionally restricted to some schemes.
#[derive(Debug, Clone)]
pub struct UriValidator {
    schemes: Vec<String>,
    message: Cow<'static, str>,
    scheme_message: Cow<'static, str>,
}

impl UriValidator {
    pub const DEFAULT_MESSAGE: &'static str = "'{0}' is not a valid URI";
    pub const SCHEME_MESSAGE: &'static str = "'{0}' must use one of the schemes: {1}";

    pub fn new() -> Self {
        Self {
            schemes: Vec::new(),
            message: Cow::Borrowed(Self::DEFAULT_MESSAGE),
            scheme_message: Cow::Borrowed(Self::SCHEME_MESSAGE),
        }
    }

    pub fn schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemes = schemes
            .into_iter()
            .map(|s| s.into().to_ascii_lowercase())
            .collect();
        self
    }

    with_message!();
}

impl Default for UriValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for UriValidator {
    fn name(&self) -> &'static str {
        "UriValidator"
    }

    fn validate_as_string(&self, raw: &str) -> Result<Scalar, ValidationError> {
        Url::parse(raw.trim())
            .map(Scalar::Url)
            .map_err(|_| fail(self, &self.message, raw, &[]))
    }

    fn validate_as_actual_type(&self, value: &Scalar, raw: &str) -> Result<(), ValidationError> {
        if self.schemes.is_empty() {
            return Ok(());
        }
        match value {
            Scalar::Url(u) if self.schemes.iter().any(|s| s == u.scheme()) => Ok(()),
            _ => Err(fail(self, &self.scheme_message, raw, &[self.schemes.join(", ").as_str()])),
        }
    }
}

/// Succeeds when any inner validator succeeds.
#[derive(Debug, Clone)]
pub struct CompositeValidator {
    inner: Vec<SharedValidator>,
    message: Cow<'static, str>,
}

impl CompositeValidator {
    pub const DEFAULT_MESSAGE: &'static str = "'{0}' is not valid";

    pub fn new() -> Self {
        Self {
            inner: Vec::new(),
            message: Cow::Borrowed(Self::DEFAULT_MESSAGE),
        }
    }

    pub fn or(mut self, validator: impl Validator + 'static) -> Self {
        self.inner.push(Arc::new(validator));
        self
    }

    pub fn or_shared(mut self, validator: SharedValidator) -> Self {
        self.inner.push(validator);
        self
    }

    with_message!();
}

impl Default for CompositeValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for CompositeValidator {
    fn name(&self) -> &'static str {
        "CompositeValidator"
    }

    fn validate_as_string(&self, raw: &str) -> Result<Scalar, ValidationError> {
        // Inner failures are swallowed; only the composite message surfaces.
        for v in &self.inner {
            if let Ok(value) = v.validate_as_string(raw) {
                if v.validate_as_actual_type(&value, raw).is_ok() {
                    return Ok(value);
                }
            }
        }
        Err(fail(self, &self.message, raw, &[]))
    }
}

/// Closure based validator.
#[derive(Clone)]
pub struct PredicateValidator {
    predicate: Arc<dyn Fn(&str) -> bool + Send + Sync>,
    message: Cow<'static, str>,
}

impl PredicateValidator {
    pub const DEFAULT_MESSAGE: &'static str = "'{0}' is not valid";

    pub fn new(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Arc::new(predicate),
            message: Cow::Borrowed(Self::DEFAULT_MESSAGE),
        }
    }

    with_message!();
}

impl fmt::Debug for PredicateValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateValidator")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl Validator for PredicateValidator {
    fn name(&self) -> &'static str {
        "PredicateValidator"
    }

    fn validate_as_string(&self, raw: &str) -> Result<Scalar, ValidationError> {
        if (self.predicate)(raw) {
            Ok(Scalar::Text(raw.to_string()))
        } else {
            Err(fail(self, &self.message, raw, &[]))
        }
    }
}
