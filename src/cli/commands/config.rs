//! `botadmin config` command - Configuration management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::helpers::{find_project, load_config};
use crate::cli::GlobalOpts;
use crate::core::config::DEFAULT_MIN_EXAMPLES;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path(PathArgs),

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,

    /// Show only project-level config
    #[arg(long = "project-only")]
    pub project_only: bool,

    /// Show only global (user) config
    #[arg(long = "global-only")]
    pub global_only: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., bot_id, api_url)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of project config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of project config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Show only project config path
    #[arg(long = "project-only")]
    pub project_only: bool,

    /// Show only global config path
    #[arg(long = "global-only")]
    pub global_only: bool,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, &str)] = &[
    ("api_url", "Base URL of the chatbot backend REST API"),
    ("bot_id", "Chatbot every request is scoped to"),
    ("token", "Bearer token sent with every request"),
    ("min_examples", "Minimum examples per intent before import"),
    ("generate_count", "Paraphrases requested per generation call"),
    ("timeout_secs", "Request timeout in seconds"),
    (
        "default_format",
        "Default output format (table, json, yaml, csv, tsv)",
    ),
];

/// Keys whose values are stored as YAML integers
const NUMERIC_KEYS: &[&str] = &["min_examples", "generate_count", "timeout_secs"];

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args, global),
        ConfigCommands::Unset(args) => run_unset(args, global),
        ConfigCommands::Path(args) => run_path(args, global),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);

    if let Some(key) = &args.key {
        check_key(key)?;
        return match get_config_value(&config, key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    if args.project_only && args.global_only {
        return Err(miette::miette!(
            "Cannot specify both --project-only and --global-only"
        ));
    }

    if args.project_only {
        show_config_file("Project config:", &project_config_path(global)?)?;
    } else if args.global_only {
        show_config_file("Global config:", &global_config_path()?)?;
    } else {
        println!("{}", style("Effective Configuration").bold().underlined());
        println!();

        for (key, _) in VALID_KEYS {
            let value = get_config_value(&config, key);
            let shown = if *key == "token" {
                value.map(|_| "********".to_string())
            } else {
                value
            };
            print_config_value(key, shown.as_deref());
        }
        println!(
            "  {}: {} {}",
            style("api_url (effective)").cyan(),
            style(config.api_url()).yellow(),
            style("(defaults apply to unset keys)").dim()
        );

        println!();
        println!("{}", style("Config Sources (in priority order):").dim());
        println!("  1. Command-line flags (--api-url, --bot)");
        println!("  2. Environment variables (BOTADMIN_API_URL, BOTADMIN_BOT_ID, BOTADMIN_TOKEN)");
        println!("  3. Project config (.botadmin/config.yaml)");
        println!("  4. Global config (~/.config/botadmin/config.yaml)");
    }

    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    check_key(&args.key)?;
    let value = yaml_value(&args.key, &args.value)?;

    let config_path = if args.global {
        global_config_path()?
    } else {
        project_config_path(global)?
    };

    let mut config_map = read_mapping(&config_path)?;
    if let serde_yml::Value::Mapping(map) = &mut config_map {
        map.insert(serde_yml::Value::String(args.key.clone()), value);
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "project" };
    println!(
        "{} Set {} {} {} in {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(&args.value).yellow(),
        scope
    );
    if args.key == "min_examples" {
        warn_lenient_minimum(&args.value);
    }

    Ok(())
}

/// Lowering the minimum is an operator override; say so when it happens
fn warn_lenient_minimum(value: &str) {
    if let Ok(n) = value.trim().parse::<usize>() {
        if n < DEFAULT_MIN_EXAMPLES {
            eprintln!(
                "{} min_examples {} is below the default of {}; intents with fewer examples will be imported",
                style("!").yellow(),
                n,
                DEFAULT_MIN_EXAMPLES
            );
        }
    }
}

fn run_unset(args: UnsetArgs, global: &GlobalOpts) -> Result<()> {
    let config_path = if args.global {
        global_config_path()?
    } else {
        project_config_path(global)?
    };

    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let mut config_map = read_mapping(&config_path)?;
    let removed = match &mut config_map {
        serde_yml::Value::Mapping(map) => map
            .remove(&serde_yml::Value::String(args.key.clone()))
            .is_some(),
        _ => false,
    };

    if !removed {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "project" };
    println!(
        "{} Removed {} from {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        scope
    );

    Ok(())
}

fn run_path(args: PathArgs, global: &GlobalOpts) -> Result<()> {
    if args.project_only && args.global_only {
        return Err(miette::miette!(
            "Cannot specify both --project-only and --global-only"
        ));
    }

    if args.project_only {
        println!("{}", project_config_path(global)?.display());
    } else if args.global_only {
        println!("{}", global_config_path()?.display());
    } else {
        let global_path = global_config_path()?;

        println!("{}", style("Configuration file paths:").bold());
        println!();
        println!("  {} {}", style("Global:").cyan(), global_path.display());
        print_exists(global_path.exists(), 9);

        println!();
        match project_config_path(global) {
            Ok(path) => {
                println!("  {} {}", style("Project:").cyan(), path.display());
                print_exists(path.exists(), 10);
            }
            Err(_) => println!(
                "  {} {}",
                style("Project:").cyan(),
                style("(not in a botadmin project)").dim()
            ),
        }
    }

    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in VALID_KEYS {
        println!("  {:<20} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Use 'botadmin config set <key> <value>' to set a value.").dim()
    );

    Ok(())
}

// Helper functions

fn global_config_path() -> Result<PathBuf> {
    Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))
}

fn project_config_path(global: &GlobalOpts) -> Result<PathBuf> {
    find_project(global)
        .map(|project| project.config_path())
        .ok_or_else(|| miette::miette!("not a botadmin project; run 'botadmin init' first or pass --global"))
}

fn check_key(key: &str) -> Result<()> {
    if VALID_KEYS.iter().any(|(k, _)| *k == key) {
        Ok(())
    } else {
        Err(miette::miette!(
            help = "run 'botadmin config keys' to see valid keys",
            "Unknown config key '{}'",
            key
        ))
    }
}

/// Numeric keys become YAML integers, everything else a string
fn yaml_value(key: &str, value: &str) -> Result<serde_yml::Value> {
    if NUMERIC_KEYS.contains(&key) {
        let n: u64 = value
            .trim()
            .parse()
            .map_err(|_| miette::miette!("'{}' must be a whole number, got '{}'", key, value))?;
        if n == 0 {
            return Err(miette::miette!("'{}' must be at least 1", key));
        }
        Ok(serde_yml::Value::Number(n.into()))
    } else {
        Ok(serde_yml::Value::String(value.to_string()))
    }
}

fn read_mapping(path: &Path) -> Result<serde_yml::Value> {
    if !path.exists() {
        return Ok(serde_yml::Value::Mapping(Default::default()));
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    let parsed: serde_yml::Value =
        serde_yml::from_str(&content).unwrap_or(serde_yml::Value::Mapping(Default::default()));
    // An all-comment file parses as null
    if parsed.is_mapping() {
        Ok(parsed)
    } else {
        Ok(serde_yml::Value::Mapping(Default::default()))
    }
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "api_url" => config.api_url.clone(),
        "bot_id" => config.bot_id.clone(),
        "token" => config.token.clone(),
        "min_examples" => config.min_examples.map(|n| n.to_string()),
        "generate_count" => config.generate_count.map(|n| n.to_string()),
        "timeout_secs" => config.timeout_secs.map(|n| n.to_string()),
        "default_format" => config.default_format.clone(),
        _ => None,
    }
}

fn print_config_value(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("  {}: {}", style(key).cyan(), style(v).yellow());
    } else {
        println!("  {}: {}", style(key).cyan(), style("(not set)").dim());
    }
}

fn print_exists(exists: bool, indent: usize) {
    let marker = if exists {
        style("(exists)").green()
    } else {
        style("(not created)").dim()
    };
    println!("{}{}", " ".repeat(indent), marker);
}

fn show_config_file(title: &str, path: &Path) -> Result<()> {
    println!("{} {}", style(title).bold(), style(path.display()).dim());
    println!();

    if path.exists() {
        let content = fs::read_to_string(path).into_diagnostic()?;
        print!("{}", content);
    } else {
        println!("{}", style("(not created)").dim());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_keys_are_integers() {
        let value = yaml_value("min_examples", "7").unwrap();
        assert_eq!(serde_yml::to_string(&value).unwrap().trim(), "7");
        assert!(yaml_value("timeout_secs", "soon").is_err());
    }

    #[test]
    fn test_zero_rejected_for_numeric_keys() {
        assert!(yaml_value("min_examples", "0").is_err());
        assert!(yaml_value("timeout_secs", "0").is_err());
    }

    #[test]
    fn test_string_keys_stay_strings() {
        let value = yaml_value("bot_id", "123").unwrap();
        assert_eq!(value, serde_yml::Value::String("123".into()));
    }

    #[test]
    fn test_written_config_round_trips() {
        let mut map = serde_yml::Mapping::new();
        map.insert("bot_id".into(), yaml_value("bot_id", "42").unwrap());
        map.insert("min_examples".into(), yaml_value("min_examples", "3").unwrap());
        let yaml = serde_yml::to_string(&serde_yml::Value::Mapping(map)).unwrap();

        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.bot_id.as_deref(), Some("42"));
        assert_eq!(config.min_examples(), 3);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(check_key("author").is_err());
        assert!(check_key("bot_id").is_ok());
    }
}
