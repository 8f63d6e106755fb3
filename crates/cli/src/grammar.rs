use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use argsmith::{ArgStyleKind, Grouping, Parser};
use argsmith_metadata::GrammarDocument;

pub fn load(path: &Path) -> Result<GrammarDocument> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read grammar: {}", path.display()))?;
    GrammarDocument::from_json(&text)
        .with_context(|| format!("failed to load grammar: {}", path.display()))
}

/// Build the parser, letting command line overrides win over the document.
pub fn build_parser(
    doc: &GrammarDocument,
    style: Option<ArgStyleKind>,
    grouping: Option<Grouping>,
) -> Result<Parser> {
    let style = match style {
        Some(style) => style,
        None => doc.style_kind()?,
    };
    let grouping = match grouping {
        Some(grouping) => grouping,
        None => doc.grouping()?,
    };
    let command = doc.build_command().context("grammar rejected")?;
    let parser = Parser::with_boxed_style(command, style.into_style())
        .with_context(|| format!("grammar is not usable with the {style} style"))?;
    tracing::debug!(%style, %grouping, "parser ready");
    Ok(parser.grouping(grouping))
}
