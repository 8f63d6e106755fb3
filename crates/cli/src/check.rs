use argsmith::Parser;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CheckReport {
    pub command: String,
    pub style: String,
    pub grouping: String,
    /// Every command in the tree as a space separated path.
    pub commands: Vec<String>,
    pub arguments: usize,
    pub options: usize,
    pub help_options: Vec<String>,
}

pub fn summarize(parser: &Parser) -> CheckReport {
    let root = parser.root();
    let mut commands = Vec::new();
    collect_paths(root, String::new(), &mut commands);

    let tree = root.walk();
    CheckReport {
        command: root.name().to_string(),
        style: parser.style().name().to_string(),
        grouping: parser.requested_grouping().to_string(),
        commands,
        arguments: tree.iter().map(|c| c.arguments().len()).sum(),
        options: tree.iter().map(|c| c.options().len()).sum(),
        help_options: parser
            .style()
            .default_help_option_names()
            .iter()
            .map(|n| n.to_string())
            .collect(),
    }
}

fn collect_paths(command: &argsmith::Command, prefix: String, out: &mut Vec<String>) {
    let path = if prefix.is_empty() {
        command.name().to_string()
    } else {
        format!("{prefix} {}", command.name())
    };
    out.push(path.clone());
    for child in command.commands() {
        collect_paths(child, path.clone(), out);
    }
}
