//! `botadmin parse` command - Show the rows an import file yields

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::{load_config, output_format};
use crate::cli::table::rows_table;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::import::parse_file;

#[derive(clap::Args, Debug)]
pub struct ParseArgs {
    /// File to parse (.csv, .tsv, .txt, .xls, .xlsx)
    pub file: PathBuf,
}

pub fn run(args: ParseArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let format = output_format(global, &config);
    let min_examples = config.min_examples();

    let rows = parse_file(&args.file)?;
    tracing::debug!(file = %args.file.display(), rows = rows.len(), "parsed import file");

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&rows).into_diagnostic()?);
        }
        _ => {
            if rows.is_empty() {
                eprintln!(
                    "{} No rows found in {}",
                    style("!").yellow(),
                    args.file.display()
                );
                return Ok(());
            }
            print!("{}", rows_table(&rows, min_examples, format).render(format));

            if matches!(format, OutputFormat::Auto | OutputFormat::Table) && !global.quiet {
                let short = rows.iter().filter(|r| r.example_count() < min_examples).count();
                println!();
                println!("{} row(s) parsed", style(rows.len()).cyan());
                if short > 0 {
                    println!(
                        "{} {} row(s) have fewer than {} examples; use {} to fill them",
                        style("!").yellow(),
                        short,
                        min_examples,
                        style("botadmin import --generate").yellow()
                    );
                }
            }
        }
    }

    Ok(())
}
