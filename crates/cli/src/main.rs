mod check;
mod grammar;

use std::path::PathBuf;

use anyhow::Result;
use argsmith::{ArgStyleKind, Grouping};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "argsmith")]
#[command(version, about = "Check command-line grammars and dry-run parses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a grammar document and report problems in it
    Check(CheckArgs),
    /// Parse tokens against a grammar and print the result as JSON
    Parse(ParseArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// Grammar document (JSON)
    #[arg(short, long, value_name = "FILE")]
    grammar: PathBuf,

    /// Override the document's arg style (unix, gnu, windows)
    #[arg(long, value_name = "STYLE")]
    style: Option<ArgStyleKind>,

    /// Print a JSON summary instead of the one-line result
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ParseArgs {
    /// Grammar document (JSON)
    #[arg(short, long, value_name = "FILE")]
    grammar: PathBuf,

    /// Override the document's arg style (unix, gnu, windows)
    #[arg(long, value_name = "STYLE")]
    style: Option<ArgStyleKind>,

    /// Override the document's grouping
    /// (does-not-matter, options-before-arguments, options-after-arguments)
    #[arg(long, value_name = "GROUPING")]
    grouping: Option<Grouping>,

    /// Tokens to parse, given after `--`
    #[arg(last = true, value_name = "TOKENS")]
    tokens: Vec<String>,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => check_command(args),
        Commands::Parse(args) => {
            let status = parse_command(args)?;
            if status != 0 {
                std::process::exit(status);
            }
            Ok(())
        }
    }
}

fn check_command(args: CheckArgs) -> Result<()> {
    tracing::debug!("executing check command");

    let doc = grammar::load(&args.grammar)?;
    let parser = grammar::build_parser(&doc, args.style, None)?;
    let report = check::summarize(&parser);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!(
            "OK: '{}' ({} style): {} command(s), {} argument(s), {} option(s)",
            report.command,
            report.style,
            report.commands.len(),
            report.arguments,
            report.options
        );
    }
    Ok(())
}

/// Returns the process status: 0 on success, the parse error's exit code otherwise.
///
/// A help option in the tokens adds `"help-requested": true` to the output
/// and wins over parse errors.
fn parse_command(args: ParseArgs) -> Result<i32> {
    tracing::debug!("executing parse command");

    let doc = grammar::load(&args.grammar)?;
    let parser = grammar::build_parser(&doc, args.style, args.grouping)?;
    let help = parser.help_requested(&args.tokens);

    match parser.parse(&args.tokens) {
        Ok(result) => {
            let mut report = serde_json::to_value(result.to_report())?;
            if let (true, Some(fields)) = (help, report.as_object_mut()) {
                fields.insert("help-requested".to_string(), true.into());
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(0)
        }
        Err(err) if help => {
            tracing::debug!(error = %err, "parse failed, help requested");
            println!("{}", serde_json::json!({ "help-requested": true }));
            Ok(0)
        }
        Err(err) => {
            eprintln!("error: {err}");
            Ok(err.exit_code())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
