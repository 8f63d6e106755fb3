//! Error types returned by grammar construction and parsing.

use std::fmt;

use thiserror::Error;

/// Stable error codes.
///
/// Non-negative codes describe user input problems and are safe to surface as
/// a process exit status. Negative codes mark grammar or framework bugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// The specified arguments and options do not fit any usage group.
    Generic = 0,
    InvalidOptionSpecified = 1,
    InvalidOptionParametersSpecified = 2,
    RequiredOptionAbsent = 3,
    OptionsBeforeParameters = 4,
    OptionsAfterParameters = 5,
    TooFewOptions = 6,
    TooManyOptions = 7,
    InvalidOptionParameterSpecifier = 8,
    InvalidNumberOfArguments = 9,
    RequiredParametersAbsent = 10,
    InvalidParametersSpecified = 11,
    ValidationFailure = 12,
    RequiredArgumentsDefinedAfterOptional = -1,
    InvalidGrammar = -2,
    Internal = -3,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Whether the code is part of the documented public set.
    pub fn is_public(self) -> bool {
        self.as_i32() >= 0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A validator rejected a raw string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
    validator: String,
    value: String,
}

impl ValidationError {
    pub fn new(
        message: impl Into<String>,
        validator: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            validator: validator.into(),
            value: value.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Type name of the validator that failed, e.g. `IntegerValidator`.
    pub fn validator(&self) -> &str {
        &self.validator
    }

    /// The raw string that was rejected.
    pub fn value(&self) -> &str {
        &self.value
    }
}

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Tokenization, grouping or cardinality problem in the supplied tokens.
    #[error("{message}")]
    Usage { code: ErrorCode, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The declared grammar itself is malformed.
    #[error("invalid grammar: {message}")]
    Grammar { code: ErrorCode, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn usage(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Usage {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn grammar(message: impl Into<String>) -> Self {
        Self::Grammar {
            code: ErrorCode::InvalidGrammar,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Usage { code, .. } | Self::Grammar { code, .. } => *code,
            Self::Validation(_) => ErrorCode::ValidationFailure,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Exit status for a CLI front-end: the public code, or 1 for bug-class errors.
    pub fn exit_code(&self) -> i32 {
        let code = self.code();
        if code.is_public() && code != ErrorCode::Generic {
            code.as_i32()
        } else {
            1
        }
    }

    /// The validation details, when this is a validation failure.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(v) => Some(v),
            _ => None,
        }
    }
}

/// Typed retrieval of a resolved value failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("no argument or option named '{0}'")]
    UnknownName(String),
    #[error("no argument at position {0}")]
    UnknownPosition(usize),
    #[error("'{name}' holds {found}, which cannot be read as {expected}")]
    Mismatch {
        name: String,
        found: &'static str,
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorCode::Generic.as_i32(), 0);
        assert_eq!(ErrorCode::InvalidOptionSpecified.as_i32(), 1);
        assert_eq!(ErrorCode::ValidationFailure.as_i32(), 12);
        assert!(!ErrorCode::RequiredArgumentsDefinedAfterOptional.is_public());
    }

    #[test]
    fn exit_code_hides_internal_codes() {
        let err = Error::Internal("boom".into());
        assert_eq!(err.exit_code(), 1);
        let err = Error::usage(ErrorCode::TooManyOptions, "too many");
        assert_eq!(err.exit_code(), 7);
        let err: Error = ValidationError::new("bad", "IntegerValidator", "x").into();
        assert_eq!(err.code(), ErrorCode::ValidationFailure);
        assert_eq!(err.as_validation().map(|v| v.value()), Some("x"));
    }
}
