//! `botadmin template` command - Write the import template

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::load_config;
use crate::cli::GlobalOpts;
use crate::schema::template::{TemplateGenerator, TemplateOutput};

#[derive(clap::Args, Debug)]
pub struct TemplateArgs {
    /// Directory to write the template into
    #[arg(long, short = 'o', default_value = ".")]
    pub out: PathBuf,
}

pub fn run(args: TemplateArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let generator = TemplateGenerator::new(config.min_examples()).into_diagnostic()?;

    let mut stdout = std::io::stdout();
    let output = generator.generate(&args.out, &mut stdout).into_diagnostic()?;

    match output {
        TemplateOutput::Spreadsheet(path) => {
            if !global.quiet {
                println!(
                    "{} Wrote import template {}",
                    style("✓").green(),
                    style(path.display()).cyan()
                );
            }
        }
        TemplateOutput::Delimited { csv, instructions } => {
            eprintln!(
                "{} Spreadsheet template could not be written; wrote CSV instead",
                style("!").yellow()
            );
            if !global.quiet {
                println!(
                    "{} Wrote import template {}",
                    style("✓").green(),
                    style(csv.display()).cyan()
                );
                println!(
                    "{} Wrote instructions {}",
                    style("✓").green(),
                    style(instructions.display()).cyan()
                );
            }
        }
        TemplateOutput::Stream => {
            eprintln!(
                "{} Template files could not be written to {}; the CSV template was printed above",
                style("!").yellow(),
                args.out.display()
            );
        }
    }

    Ok(())
}
