//! Shared helper functions for CLI commands

use clap::ValueEnum;
use miette::{IntoDiagnostic, Result};
use std::collections::BTreeSet;
use tracing_subscriber::EnvFilter;

use crate::api::HttpApi;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Config, Project};

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "warn,botadmin=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Truncate a string to `max_chars` characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Replace tabs and newlines so a value stays in one TSV cell
pub fn escape_tsv(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}

/// Parse a 1-based row selection like `1,3-5` into 0-based indices
pub fn parse_row_selection(selection: &str, row_count: usize) -> Result<BTreeSet<usize>, String> {
    let mut indices = BTreeSet::new();

    for part in selection.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((a, b)) => (parse_row_number(a)?, parse_row_number(b)?),
            None => {
                let n = parse_row_number(part)?;
                (n, n)
            }
        };
        if start > end {
            return Err(format!("invalid range '{}'", part));
        }
        if end > row_count {
            return Err(format!(
                "row {} is out of range (file has {} rows)",
                end, row_count
            ));
        }
        indices.extend((start - 1)..end);
    }

    if indices.is_empty() {
        return Err("no rows given".to_string());
    }
    Ok(indices)
}

fn parse_row_number(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("row numbers start at 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{}' is not a row number", s.trim())),
    }
}

/// Project selected by `--project`, or discovered from the working directory
pub fn find_project(global: &GlobalOpts) -> Option<Project> {
    match &global.project {
        Some(path) => Project::discover_from(path).ok(),
        None => Project::discover().ok(),
    }
}

/// Effective configuration, including command-line overrides
pub fn load_config(global: &GlobalOpts) -> Config {
    let project = find_project(global);
    Config::load_for(project.as_ref()).with_overrides(global.api_url.clone(), global.bot.clone())
}

/// `--format`, falling back to the configured `default_format`
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    if global.format != OutputFormat::Auto {
        return global.format;
    }
    config
        .default_format
        .as_deref()
        .and_then(|f| OutputFormat::from_str(f, true).ok())
        .unwrap_or_default()
}

/// Backend client for the configured chatbot
pub fn connect(config: &Config) -> Result<HttpApi> {
    let tenant = config.tenant().into_diagnostic()?;
    let api = HttpApi::from_config(config, tenant).into_diagnostic()?;
    tracing::debug!(api_url = %config.api_url(), bot = %api.tenant(), "backend client ready");
    Ok(api)
}

/// Ask for confirmation on stdin
pub fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::Write::flush(&mut std::io::stdout()).into_diagnostic()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input).into_diagnostic()?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
