//! Writing resolved values into an application's own settings struct.

use std::fmt;

use crate::error::ValueError;
use crate::result::ParseResult;
use crate::value::FromValue;

type Binding<S> = Box<dyn Fn(&ParseResult<'_>, &mut S) -> Result<(), ValueError> + Send + Sync>;

fn binding<S, F>(f: F) -> Binding<S>
where
    F: Fn(&ParseResult<'_>, &mut S) -> Result<(), ValueError> + Send + Sync + 'static,
{
    Box::new(f)
}

/// A list of setters applied to a target of type `S` after a parse.
///
/// ```
/// use argsmith::{Binder, Command, OptionDef, Parser};
///
/// #[derive(Default)]
/// struct Settings {
///     verbose: bool,
///     jobs: i64,
/// }
///
/// let parser = Parser::new(
///     Command::builder("build")
///         .option(OptionDef::new("verbose").alias("v"))
///         .option(OptionDef::new("jobs").used_as_single_parameter().type_as::<i64>())
///         .build()?,
/// )?;
/// let binder = Binder::new()
///     .flag("verbose", |s: &mut Settings, v| s.verbose = v)
///     .option("jobs", |s: &mut Settings, n: i64| s.jobs = n);
///
/// let mut settings = Settings::default();
/// binder.apply(&parser.parse(["-v", "--jobs", "4"])?, &mut settings)?;
/// assert!(settings.verbose);
/// assert_eq!(settings.jobs, 4);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Binder<S> {
    bindings: Vec<Binding<S>>,
}

impl<S: 'static> Binder<S> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Set a field from an option when it is assigned.
    pub fn option<T, F>(mut self, name: impl Into<String>, set: F) -> Self
    where
        T: FromValue + 'static,
        F: Fn(&mut S, T) + Send + Sync + 'static,
    {
        let name = name.into();
        self.bindings.push(binding(move |result, target| {
            if let Some(value) = result.option::<T>(&name)? {
                set(target, value);
            }
            Ok(())
        }));
        self
    }

    /// Set a field to whether a flag is on; always writes.
    pub fn flag<F>(mut self, name: impl Into<String>, set: F) -> Self
    where
        F: Fn(&mut S, bool) + Send + Sync + 'static,
    {
        let name = name.into();
        self.bindings.push(binding(move |result, target| {
            let on = result.option::<bool>(&name)?.unwrap_or(false);
            set(target, on);
            Ok(())
        }));
        self
    }

    /// Set a field from the argument at `index` when it is assigned.
    pub fn argument<T, F>(mut self, index: usize, set: F) -> Self
    where
        T: FromValue + 'static,
        F: Fn(&mut S, T) + Send + Sync + 'static,
    {
        self.bindings.push(binding(move |result, target| {
            if let Some(value) = result.argument::<T>(index)? {
                set(target, value);
            }
            Ok(())
        }));
        self
    }

    pub fn argument_named<T, F>(mut self, name: impl Into<String>, set: F) -> Self
    where
        T: FromValue + 'static,
        F: Fn(&mut S, T) + Send + Sync + 'static,
    {
        let name = name.into();
        self.bindings.push(binding(move |result, target| {
            if let Some(value) = result.argument_named::<T>(&name)? {
                set(target, value);
            }
            Ok(())
        }));
        self
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Run every setter in registration order; stops at the first mismatch.
    pub fn apply(&self, result: &ParseResult<'_>, target: &mut S) -> Result<(), ValueError> {
        for bind in &self.bindings {
            bind(result, target)?;
        }
        Ok(())
    }
}

impl<S: 'static> Default for Binder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for Binder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::command::Command;
    use crate::engine::Parser;
    use crate::grammar::{ArgumentDef, OptionDef};

    #[derive(Debug, Default, PartialEq)]
    struct CopyJob {
        sources: Vec<PathBuf>,
        dest: Option<PathBuf>,
        force: bool,
        retries: u32,
    }

    fn parser() -> Parser {
        Parser::new(
            Command::builder("cp")
                .argument(ArgumentDef::new("dest").type_as::<PathBuf>())
                .argument(ArgumentDef::new("sources").unlimited().type_as::<PathBuf>())
                .option(OptionDef::new("force").alias("f"))
                .option(
                    OptionDef::new("retries")
                        .used_as_single_parameter()
                        .type_as::<u32>()
                        .defaults_to(3i64),
                )
                .build()
                .unwrap(),
        )
        .unwrap()
    }

    fn binder() -> Binder<CopyJob> {
        Binder::new()
            .argument(0, |c: &mut CopyJob, p: PathBuf| c.dest = Some(p))
            .argument_named("sources", |c: &mut CopyJob, p: Vec<PathBuf>| c.sources = p)
            .flag("force", |c: &mut CopyJob, on| c.force = on)
            .option("retries", |c: &mut CopyJob, n: u32| c.retries = n)
    }

    #[test]
    fn binds_arguments_and_options() {
        let parser = parser();
        let result = parser.parse(["out", "a", "b", "-f"]).unwrap();
        let mut target = CopyJob::default();
        binder().apply(&result, &mut target).unwrap();
        assert_eq!(
            target,
            CopyJob {
                sources: vec![PathBuf::from("a"), PathBuf::from("b")],
                dest: Some(PathBuf::from("out")),
                force: true,
                retries: 3,
            }
        );
    }

    #[test]
    fn mismatched_binding_reports_the_name() {
        let parser = parser();
        let result = parser.parse(["out", "a", "-f"]).unwrap();
        let binder = Binder::new().option("force", |_: &mut CopyJob, _: PathBuf| {});
        match binder.apply(&result, &mut CopyJob::default()) {
            Err(ValueError::Mismatch { name, .. }) => assert_eq!(name, "force"),
            other => panic!("expected Mismatch, got: {other:?}"),
        }
        assert_eq!(binder.len(), 1);
    }
}
