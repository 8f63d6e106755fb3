//! Resolved values and string conversion.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::error::ValueError;

/// A single converted value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Path(PathBuf),
    Uuid(Uuid),
    Url(Url),
}

impl Scalar {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::Path(_) => "path",
            Self::Uuid(_) => "uuid",
            Self::Url(_) => "url",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Url(u) => write!(f, "{u}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<PathBuf> for Scalar {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

impl From<Uuid> for Scalar {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<Url> for Scalar {
    fn from(u: Url) -> Self {
        Self::Url(u)
    }
}

/// Resolved value of an argument or option, tagged with its shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Flag(bool),
    Count(u32),
    Single(Scalar),
    List(Vec<Scalar>),
}

impl Value {
    pub fn shape_name(&self) -> &'static str {
        match self {
            Self::Flag(_) => "flag",
            Self::Count(_) => "count",
            Self::Single(_) => "single value",
            Self::List(_) => "list",
        }
    }

    /// An empty list, the usual default for repeatable options.
    pub fn empty_list() -> Self {
        Self::List(Vec::new())
    }
}

macro_rules! single_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::Single(v.into())
                }
            }
        )*
    };
}

single_from!(&str, String, i64, f64, PathBuf, Uuid, Url, Scalar);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

impl<T: Into<Scalar>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::List(iter.into_iter().map(Into::into).collect())
    }
}

/// Built-in string conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueKind {
    #[default]
    Text,
    Integer,
    Float,
    Boolean,
    Path,
    Uuid,
    Url,
}

impl ValueKind {
    pub fn convert(self, raw: &str) -> Result<Scalar, String> {
        match self {
            Self::Text => Ok(Scalar::Text(raw.to_string())),
            Self::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Scalar::Integer)
                .map_err(|e| format!("'{raw}' is not an integer: {e}")),
            Self::Float => raw
                .trim()
                .parse::<f64>()
                .map(Scalar::Float)
                .map_err(|e| format!("'{raw}' is not a number: {e}")),
            Self::Boolean => parse_bool(raw)
                .map(Scalar::Boolean)
                .ok_or_else(|| format!("'{raw}' is not a boolean")),
            Self::Path => Ok(Scalar::Path(PathBuf::from(raw))),
            Self::Uuid => Uuid::parse_str(raw.trim())
                .map(Scalar::Uuid)
                .map_err(|e| format!("'{raw}' is not a GUID: {e}")),
            Self::Url => Url::parse(raw.trim())
                .map(Scalar::Url)
                .map_err(|e| format!("'{raw}' is not a URI: {e}")),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Path => "path",
            Self::Uuid => "uuid",
            Self::Url => "url",
        })
    }
}

impl std::str::FromStr for ValueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "string" => Ok(Self::Text),
            "integer" | "int" => Ok(Self::Integer),
            "float" | "number" => Ok(Self::Float),
            "boolean" | "bool" => Ok(Self::Boolean),
            "path" | "file" => Ok(Self::Path),
            "uuid" | "guid" => Ok(Self::Uuid),
            "url" | "uri" => Ok(Self::Url),
            other => Err(format!("unknown value type '{other}'")),
        }
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// String to value conversion attached to an argument or option.
pub type Converter = Arc<dyn Fn(&str) -> Result<Scalar, String> + Send + Sync>;

/// String pre-processing applied before conversion.
pub type Formatter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Supplies a value when nothing was specified on the command line.
pub type DefaultSupplier = Arc<dyn Fn() -> Value + Send + Sync>;

/// Rust types with a built-in conversion, for `type_as::<T>()`.
pub trait ScalarType {
    const KIND: ValueKind;
}

impl ScalarType for String {
    const KIND: ValueKind = ValueKind::Text;
}
impl ScalarType for i64 {
    const KIND: ValueKind = ValueKind::Integer;
}
impl ScalarType for i32 {
    const KIND: ValueKind = ValueKind::Integer;
}
impl ScalarType for u32 {
    const KIND: ValueKind = ValueKind::Integer;
}
impl ScalarType for u64 {
    const KIND: ValueKind = ValueKind::Integer;
}
impl ScalarType for usize {
    const KIND: ValueKind = ValueKind::Integer;
}
impl ScalarType for f64 {
    const KIND: ValueKind = ValueKind::Float;
}
impl ScalarType for bool {
    const KIND: ValueKind = ValueKind::Boolean;
}
impl ScalarType for PathBuf {
    const KIND: ValueKind = ValueKind::Path;
}
impl ScalarType for Uuid {
    const KIND: ValueKind = ValueKind::Uuid;
}
impl ScalarType for Url {
    const KIND: ValueKind = ValueKind::Url;
}

/// Typed read access to a [`Value`].
pub trait FromValue: Sized {
    const EXPECTED: &'static str;

    /// `None` means the value has the wrong shape or type.
    fn from_value(value: &Value) -> Option<Self>;

    fn read(name: &str, value: &Value) -> Result<Self, ValueError> {
        Self::from_value(value).ok_or_else(|| ValueError::Mismatch {
            name: name.to_string(),
            found: value.shape_name(),
            expected: Self::EXPECTED,
        })
    }
}

/// Typed read access to a single [`Scalar`].
pub trait FromScalar: Sized {
    fn from_scalar(scalar: &Scalar) -> Option<Self>;
}

impl FromScalar for String {
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        Some(scalar.to_string())
    }
}

impl FromScalar for bool {
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Boolean(b) => Some(*b),
            Scalar::Text(s) => parse_bool(s),
            _ => None,
        }
    }
}

impl FromScalar for f64 {
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Float(n) => Some(*n),
            Scalar::Integer(n) => Some(*n as f64),
            Scalar::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromScalar for PathBuf {
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Path(p) => Some(p.clone()),
            Scalar::Text(s) => Some(PathBuf::from(s)),
            _ => None,
        }
    }
}

impl FromScalar for Uuid {
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Uuid(u) => Some(*u),
            Scalar::Text(s) => Uuid::parse_str(s.trim()).ok(),
            _ => None,
        }
    }
}

impl FromScalar for Url {
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Url(u) => Some(u.clone()),
            Scalar::Text(s) => Url::parse(s.trim()).ok(),
            _ => None,
        }
    }
}

macro_rules! int_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl FromScalar for $ty {
                fn from_scalar(scalar: &Scalar) -> Option<Self> {
                    match scalar {
                        Scalar::Integer(n) => <$ty>::try_from(*n).ok(),
                        Scalar::Text(s) => s.trim().parse().ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

int_from_scalar!(i64, i32, u32, u64, usize);

macro_rules! from_value {
    ($($ty:ty => $expected:literal),* $(,)?) => {
        $(
            impl FromValue for $ty {
                const EXPECTED: &'static str = $expected;

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::Single(s) => <$ty>::from_scalar(s),
                        _ => None,
                    }
                }
            }

            impl FromValue for Vec<$ty> {
                const EXPECTED: &'static str = concat!("a list of ", $expected);

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::List(items) => items.iter().map(<$ty>::from_scalar).collect(),
                        Value::Single(s) => <$ty>::from_scalar(s).map(|v| vec![v]),
                        _ => None,
                    }
                }
            }
        )*
    };
}

from_value!(
    String => "text",
    f64 => "a float",
    PathBuf => "a path",
    Uuid => "a GUID",
    Url => "a URI",
);

impl FromValue for bool {
    const EXPECTED: &'static str = "a boolean";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Flag(b) => Some(*b),
            Value::Count(n) => Some(*n > 0),
            Value::Single(s) => bool::from_scalar(s),
            Value::List(_) => None,
        }
    }
}

impl FromValue for Vec<bool> {
    const EXPECTED: &'static str = "a list of booleans";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(bool::from_scalar).collect(),
            _ => None,
        }
    }
}

macro_rules! int_from_value {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                const EXPECTED: &'static str = "an integer";

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::Count(n) => <$ty>::try_from(*n).ok(),
                        Value::Single(s) => <$ty>::from_scalar(s),
                        _ => None,
                    }
                }
            }

            impl FromValue for Vec<$ty> {
                const EXPECTED: &'static str = "a list of integers";

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::List(items) => items.iter().map(<$ty>::from_scalar).collect(),
                        Value::Single(s) => <$ty>::from_scalar(s).map(|v| vec![v]),
                        _ => None,
                    }
                }
            }
        )*
    };
}

int_from_value!(i64, i32, u32, u64, usize);

impl FromValue for Value {
    const EXPECTED: &'static str = "any value";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_from_names() {
        assert_eq!("int".parse::<ValueKind>(), Ok(ValueKind::Integer));
        assert_eq!("GUID".parse::<ValueKind>(), Ok(ValueKind::Uuid));
        assert_eq!(ValueKind::Url.to_string().parse::<ValueKind>(), Ok(ValueKind::Url));
        assert!("decimal".parse::<ValueKind>().is_err());
    }

    #[test]
    fn kinds_convert_or_explain() {
        assert_eq!(ValueKind::Integer.convert(" 42 "), Ok(Scalar::Integer(42)));
        assert_eq!(ValueKind::Boolean.convert("Yes"), Ok(Scalar::Boolean(true)));
        let err = ValueKind::Integer.convert("forty").unwrap_err();
        assert!(err.contains("not an integer"));
        assert!(ValueKind::Uuid.convert("nope").is_err());
        assert!(matches!(
            ValueKind::Url.convert("https://example.com/x"),
            Ok(Scalar::Url(_))
        ));
    }

    #[test]
    fn typed_reads_follow_shape() {
        assert_eq!(bool::from_value(&Value::Flag(true)), Some(true));
        assert_eq!(u32::from_value(&Value::Count(3)), Some(3));
        assert_eq!(i32::from_value(&Value::Single(Scalar::Integer(-4))), Some(-4));
        assert_eq!(u32::from_value(&Value::Single(Scalar::Integer(-4))), None);
        let list: Value = ["a", "b"].into_iter().collect();
        assert_eq!(
            Vec::<String>::from_value(&list),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(String::from_value(&list), None);
    }

    #[test]
    fn mismatch_names_both_sides() {
        let err = i64::read("count", &Value::List(Vec::new())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'count' holds list, which cannot be read as an integer"
        );
    }
}
