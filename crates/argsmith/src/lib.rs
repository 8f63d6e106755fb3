//! Grammar-driven command line parsing.
//!
//! A program declares its [`Command`] tree up front: positional
//! [`ArgumentDef`]s, named [`OptionDef`]s with occurrence and parameter
//! bounds, numeric groups for mutually exclusive usages, validators and
//! converters. A [`Parser`] then turns token vectors into a [`ParseResult`]
//! using one of the token styles in [`style`].
//!
//! ```
//! use argsmith::{ArgumentDef, Command, OptionDef, Parser};
//!
//! let parser = Parser::new(
//!     Command::builder("build")
//!         .argument(ArgumentDef::new("file"))
//!         .option(OptionDef::new("verbose").alias("v"))
//!         .build()?,
//! )?;
//! let result = parser.parse(["build.txt", "-v"])?;
//! assert_eq!(result.argument::<String>(0)?, Some("build.txt".to_string()));
//! assert!(result.flag("verbose"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod binding;
mod command;
mod engine;
mod error;
mod grammar;
mod result;
mod run;
pub mod style;
pub mod validate;
mod value;

pub use binding::Binder;
pub use command::{Command, CommandBuilder, CommandValidator, Handler};
pub use engine::{COMMAND_VALIDATOR, Parser, TYPE_CONVERTER};
pub use error::{Error, ErrorCode, Result, ValidationError, ValueError};
pub use grammar::{ArgumentDef, DEFAULT_GROUP, Name, OptionDef, ParamIndex, UNLIMITED, Usage, ValueShape};
pub use result::{ArgumentValue, OptionReport, OptionValue, ParseReport, ParseResult};
pub use run::OptionRuns;
pub use style::{ArgStyle, ArgStyleKind, GnuStyle, Grouping, UnixStyle, WindowsStyle};
pub use validate::{SharedValidator, Validator};
pub use value::{FromScalar, FromValue, Scalar, ScalarType, Value, ValueKind};
