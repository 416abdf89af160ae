//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs,
    config::ConfigCommands,
    import::ImportArgs,
    init::InitArgs,
    manage::{DeleteArgs, ListArgs},
    parse::ParseArgs,
    template::TemplateArgs,
};

#[derive(Parser)]
#[command(name = "botadmin")]
#[command(author, version, about = "Chatbot admin console")]
#[command(long_about = "Bulk-import question/answer files into a chatbot backend as intents, responses and stories.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .botadmin/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Backend base URL (overrides config and BOTADMIN_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Chatbot id every request is scoped to (overrides config and BOTADMIN_BOT_ID)
    #[arg(long = "bot", global = true)]
    pub bot: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a botadmin project in a directory
    Init(InitArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Write the import template file
    Template(TemplateArgs),

    /// Parse an import file and show its rows
    Parse(ParseArgs),

    /// Import a question/answer file as intents, responses and stories
    Import(ImportArgs),

    /// List records of one kind on the backend
    List(ListArgs),

    /// Delete one record on the backend
    Delete(DeleteArgs),

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table on a terminal
    #[default]
    Auto,
    /// Human-readable table
    Table,
    /// JSON format (for programming)
    Json,
    /// YAML format
    Yaml,
    /// CSV format (for spreadsheets)
    Csv,
    /// Tab-separated values (for piping)
    Tsv,
}
