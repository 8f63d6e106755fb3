//! Command tree.
//!
//! A [`Command`] is assembled once through [`CommandBuilder`] and is immutable
//! afterwards. All structural checks run in [`CommandBuilder::build`].

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, ErrorCode, Result};
use crate::grammar::{ArgumentDef, Name, OptionDef};
use crate::result::ParseResult;

/// Command level check over the resolved values; `Some(message)` rejects the parse.
pub type CommandValidator = Arc<dyn Fn(&ParseResult<'_>) -> Option<String> + Send + Sync>;

/// Invoked by [`crate::Parser::run`] with the parse result; returns an exit status.
pub type Handler = Arc<dyn Fn(&ParseResult<'_>) -> i32 + Send + Sync>;

pub struct Command {
    names: Vec<Name>,
    description: String,
    arguments: Vec<ArgumentDef>,
    options: Vec<OptionDef>,
    commands: Vec<Command>,
    validator: Option<CommandValidator>,
    handler: Option<Handler>,
}

impl Command {
    pub fn builder(name: impl Into<Name>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        self.names[0].as_str()
    }

    pub fn names(&self) -> &[Name] {
        &self.names
    }

    pub fn matches(&self, token: &str) -> bool {
        self.names.iter().any(|n| n.matches(token))
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn arguments(&self) -> &[ArgumentDef] {
        &self.arguments
    }

    pub fn options(&self) -> &[OptionDef] {
        &self.options
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn subcommand(&self, token: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.matches(token))
    }

    pub fn option(&self, name: &str) -> Option<&OptionDef> {
        self.options.iter().find(|o| o.matches(name))
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentDef> {
        self.arguments.iter().find(|a| a.name() == name)
    }

    /// Nothing in this command has to be specified.
    pub fn is_all_optional(&self) -> bool {
        self.arguments.iter().all(|a| a.is_optional())
            && self.options.iter().all(|o| !o.usage_rules().is_required())
    }

    pub(crate) fn custom_validator(&self) -> Option<&CommandValidator> {
        self.validator.as_ref()
    }

    pub fn handle(&self, result: &ParseResult<'_>) -> Option<i32> {
        self.handler.as_ref().map(|h| h(result))
    }

    /// This command followed by all nested commands, depth first.
    pub fn walk(&self) -> Vec<&Command> {
        let mut out = vec![self];
        for child in &self.commands {
            out.extend(child.walk());
        }
        out
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("names", &self.names)
            .field("arguments", &self.arguments)
            .field("options", &self.options)
            .field("commands", &self.commands)
            .field("validator", &self.validator.is_some())
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// Builder for [`Command`].
pub struct CommandBuilder {
    names: Vec<Name>,
    description: String,
    arguments: Vec<ArgumentDef>,
    options: Vec<OptionDef>,
    commands: Vec<CommandBuilder>,
    validator: Option<CommandValidator>,
    handler: Option<Handler>,
}

impl CommandBuilder {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            names: vec![name.into()],
            description: String::new(),
            arguments: Vec::new(),
            options: Vec::new(),
            commands: Vec::new(),
            validator: None,
            handler: None,
        }
    }

    pub fn alias(mut self, name: impl Into<Name>) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn argument(mut self, argument: ArgumentDef) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn option(mut self, option: OptionDef) -> Self {
        self.options.push(option);
        self
    }

    pub fn subcommand(mut self, command: CommandBuilder) -> Self {
        self.commands.push(command);
        self
    }

    /// Add the sub-commands produced by `factories`.
    pub fn register<I, F>(mut self, factories: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> CommandBuilder,
    {
        self.commands.extend(factories.into_iter().map(|f| f()));
        self
    }

    pub fn validator(
        mut self,
        validator: impl Fn(&ParseResult<'_>) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn handler(
        mut self,
        handler: impl Fn(&ParseResult<'_>) -> i32 + Send + Sync + 'static,
    ) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Result<Command> {
        let label = self.names.first().map(|n| n.to_string()).unwrap_or_default();
        for name in &self.names {
            check_name("command", name.as_str())?;
        }
        check_arguments(&label, &self.arguments)?;
        check_options(&label, &self.options)?;

        let commands = self
            .commands
            .into_iter()
            .map(CommandBuilder::build)
            .collect::<Result<Vec<_>>>()?;
        for (i, a) in commands.iter().enumerate() {
            for b in &commands[i + 1..] {
                let clash = a
                    .names
                    .iter()
                    .any(|x| b.names.iter().any(|y| x.collides_with(y)));
                if clash {
                    return Err(Error::grammar(format!(
                        "command '{label}' has sub-commands '{}' and '{}' with the same name",
                        a.name(),
                        b.name()
                    )));
                }
            }
        }

        Ok(Command {
            names: self.names,
            description: self.description,
            arguments: self.arguments,
            options: self.options,
            commands,
            validator: self.validator,
            handler: self.handler,
        })
    }
}

fn check_name(what: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::grammar(format!("{what} name must not be empty")));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(Error::grammar(format!(
            "{what} name '{name}' must not contain whitespace"
        )));
    }
    Ok(())
}

fn check_arguments(command: &str, arguments: &[ArgumentDef]) -> Result<()> {
    let mut seen_optional: Option<&str> = None;
    for (idx, arg) in arguments.iter().enumerate() {
        check_name("argument", arg.name())?;
        if arguments[..idx].iter().any(|a| a.name() == arg.name()) {
            return Err(Error::grammar(format!(
                "command '{command}' declares argument '{}' twice",
                arg.name()
            )));
        }
        if arg.max_occurrence_count() == 0 {
            return Err(Error::grammar(format!(
                "argument '{}' must allow at least one occurrence",
                arg.name()
            )));
        }
        if arg.is_repeatable() && idx + 1 != arguments.len() {
            return Err(Error::grammar(format!(
                "argument '{}' takes several values but is not the last argument",
                arg.name()
            )));
        }
        if arg.is_optional() {
            seen_optional.get_or_insert(arg.name());
        } else if let Some(optional) = seen_optional {
            return Err(Error::Grammar {
                code: ErrorCode::RequiredArgumentsDefinedAfterOptional,
                message: format!(
                    "required argument '{}' is declared after optional argument '{optional}'",
                    arg.name()
                ),
            });
        }
    }
    Ok(())
}

fn check_options(command: &str, options: &[OptionDef]) -> Result<()> {
    let names: Vec<(&Name, &OptionDef)> = options
        .iter()
        .flat_map(|o| o.names().iter().map(move |n| (n, o)))
        .collect();
    for (idx, (name, opt)) in names.iter().enumerate() {
        check_name("option", name.as_str())?;
        if let Some((_, other)) = names[..idx].iter().find(|(n, _)| n.collides_with(name)) {
            return Err(Error::grammar(format!(
                "command '{command}': option name '{name}' is used by both '{}' and '{}'",
                other.primary_name(),
                opt.primary_name()
            )));
        }
    }
    for opt in options {
        opt.usage_rules()
            .check()
            .map_err(|msg| Error::grammar(format!("option '{}': {msg}", opt.primary_name())))?;
    }
    Ok(())
}
