//! `botadmin list` / `botadmin delete` - Record management on the backend

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::api::{ChatbotApi, EntityKind, ListQuery};
use crate::cli::helpers::{confirm, connect, load_config, output_format};
use crate::cli::table::records_table;
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Record kind
    #[arg(value_enum)]
    pub kind: EntityKind,

    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Records per page
    #[arg(long, short = 'n', default_value_t = 20)]
    pub limit: u32,

    /// Filter by name
    #[arg(long, short = 's')]
    pub search: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Record kind
    #[arg(value_enum)]
    pub kind: EntityKind,

    /// Server id of the record
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let format = output_format(global, &config);
    let api = connect(&config)?;

    let query = ListQuery {
        page: args.page.max(1),
        limit: args.limit.max(1),
        search: args.search.filter(|s| !s.trim().is_empty()),
    };
    let page = api
        .list(args.kind, &query)
        .map_err(|e| miette::miette!("Failed to list {}: {}", args.kind.path(), e.user_message()))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&page.items).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&page.items).into_diagnostic()?);
        }
        _ => {
            print!("{}", records_table(args.kind, &page, format).render(format));
            if matches!(format, OutputFormat::Auto | OutputFormat::Table) && !global.quiet {
                let total = page
                    .total
                    .map(|t| format!(" of {}", t))
                    .unwrap_or_default();
                println!(
                    "{} {}{} (page {})",
                    style(page.items.len()).cyan(),
                    args.kind.path(),
                    total,
                    query.page
                );
            }
        }
    }

    Ok(())
}

pub fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let api = connect(&config)?;

    if !args.yes && !confirm(&format!("Delete {} {}?", args.kind, args.id))? {
        println!("Aborted.");
        return Ok(());
    }

    api.delete(args.kind, &args.id)
        .map_err(|e| miette::miette!("Failed to delete {} {}: {}", args.kind, args.id, e.user_message()))?;

    if !global.quiet {
        println!(
            "{} Deleted {} {}",
            style("✓").green(),
            args.kind,
            style(&args.id).cyan()
        );
    }
    Ok(())
}
