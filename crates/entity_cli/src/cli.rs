use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "entity",
    about = "Create, inspect, rename and delete entity records",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags that override environment configuration.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Keep entities in memory for this invocation only
    #[arg(long, global = true, conflicts_with = "db")]
    pub memory: bool,

    /// SQLite database file (overrides ENTITY_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// trace|debug|info|warn|error (overrides ENTITY_LOG_LEVEL)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files (overrides ENTITY_LOG_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(flatten)]
    Op(Operation),
    /// Run one operation per stdin line against a single store
    Batch,
}

/// The five entity operations.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Create an entity and print its id
    Create {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Show one entity
    Get { id: String },
    /// Rename an entity
    Update {
        id: String,
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Delete an entity
    Delete { id: String },
    /// List all entities
    List,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Get { .. } => "get",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::List => "list",
        }
    }
}

/// One line of `entity batch` input.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_flag = true, disable_version_flag = true)]
pub struct BatchLine {
    #[command(subcommand)]
    pub op: Operation,
}

impl BatchLine {
    /// Parses a line such as `update <id> New   Name`.
    ///
    /// For `create` and `update` everything after the leading tokens is the
    /// name, kept byte for byte, so inner spacing and leading `-` survive.
    pub fn parse_line(line: &str) -> Result<Operation, clap::Error> {
        let (op, rest) = split_token(line.trim_start());
        let mut args = vec![op];

        match op {
            "create" => push_name(&mut args, rest),
            "update" => {
                let (id, name) = split_token(rest);
                if !id.is_empty() {
                    args.push(id);
                }
                push_name(&mut args, name);
            }
            _ => args.extend(rest.split_whitespace()),
        }

        Self::try_parse_from(args).map(|parsed| parsed.op)
    }
}

fn split_token(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim_start()),
        None => (text, ""),
    }
}

fn push_name<'a>(args: &mut Vec<&'a str>, name: &'a str) {
    if !name.is_empty() {
        args.extend(["--", name]);
    }
}

/// Joins multi-word names the way they were typed.
pub fn join_name(words: &[String]) -> String {
    words.join(" ")
}
