//! `botadmin init` command - Initialize a project directory

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::project::{Project, ProjectError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Rewrite the config file even if .botadmin/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    match project {
        Ok(project) => {
            println!(
                "{} Initialized botadmin project at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!(
                "  {} {}",
                style("config:").dim(),
                project.config_path().display()
            );
            println!();
            println!("Next steps:");
            println!(
                "  {} Choose the chatbot to manage",
                style("botadmin config set bot_id <ID>").yellow()
            );
            println!(
                "  {} Write the import template",
                style("botadmin template").yellow()
            );
            println!(
                "  {} Import a filled-in file",
                style("botadmin import <FILE>").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} botadmin project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reset its config",
                style("botadmin init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}
