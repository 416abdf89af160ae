//! `botadmin import` command - Bulk import of question/answer files
//!
//! Each selected row becomes an intent, then a response, then a story linking
//! the two. Rows are sent one at a time; a failing row is reported and the
//! rest of the batch continues.

mod interactive;

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

use crate::api::ChatbotApi;
use crate::cli::helpers::{connect, load_config, output_format, parse_row_selection};
use crate::cli::table::rows_table;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::import::{
    build_payloads, parse_file, ImportAbort, ImportObserver, ImportReport, ImportSession,
    ImportSummary, ParsedRow, Progress, RowStatus,
};

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// File to import (.csv, .tsv, .txt, .xls, .xlsx)
    pub file: PathBuf,

    /// Rows to import, 1-based (e.g. "1,3-5"); default is every row
    #[arg(long, short = 'r')]
    pub rows: Option<String>,

    /// Generate examples for rows below the minimum before importing
    #[arg(long, short = 'g')]
    pub generate: bool,

    /// Examples to request per generated row (default: generate_count from config)
    #[arg(long, short = 'n')]
    pub count: Option<usize>,

    /// Retry failed rows up to this many times
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// Validate and print the definitions without contacting the backend
    #[arg(long, conflicts_with_all = ["generate", "interactive"])]
    pub dry_run: bool,

    /// Write a JSON report of the run to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Review, edit and import rows from an interactive menu
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

/// Prints one line per finished row
///
/// With `to_stderr` set the lines go to stderr, keeping stdout free for
/// machine-readable output.
pub(crate) struct ConsoleObserver {
    quiet: bool,
    to_stderr: bool,
}

impl ConsoleObserver {
    pub(crate) fn new(quiet: bool) -> Self {
        Self {
            quiet,
            to_stderr: false,
        }
    }

    pub(crate) fn to_stderr(mut self) -> Self {
        self.to_stderr = true;
        self
    }

    fn emit(&self, line: String) {
        if self.to_stderr {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

impl ImportObserver for ConsoleObserver {
    fn row_started(&mut self, index: usize, row: &ParsedRow) {
        tracing::debug!(row = index + 1, name = %row.name, "importing row");
    }

    fn row_finished(&mut self, index: usize, row: &ParsedRow, progress: Progress) {
        let counter = style(format!("[{}/{}]", progress.done, progress.total)).dim();
        match row.status {
            RowStatus::Success => {
                if !self.quiet {
                    self.emit(format!(
                        "{} {} row {} {}",
                        style("✓").green(),
                        counter,
                        index + 1,
                        style(&row.name).cyan()
                    ));
                }
            }
            _ => {
                self.emit(format!(
                    "{} {} row {} {}: {}",
                    style("✗").red(),
                    counter,
                    index + 1,
                    style(&row.name).cyan(),
                    row.error.as_deref().unwrap_or_default()
                ));
            }
        }
    }
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let format = output_format(global, &config);

    let rows = parse_file(&args.file)?;
    if rows.is_empty() {
        return Err(miette::miette!(
            help = "fill in the template from 'botadmin template' below its two header rows",
            "No rows found in {}",
            args.file.display()
        ));
    }

    let mut session = ImportSession::new(config.min_examples());
    session.load(rows);
    if let Some(selection) = &args.rows {
        let indices = parse_row_selection(selection, session.len())
            .map_err(|e| miette::miette!("Invalid --rows '{}': {}", selection, e))?;
        session.select_only(indices)?;
    }

    if args.dry_run {
        return dry_run(&mut session, format);
    }

    let api = connect(&config)?;
    let count = args.count.unwrap_or_else(|| config.generate_count());

    if args.interactive {
        return interactive::run(&mut session, &api, count, &args.file, global);
    }

    let json = format == OutputFormat::Json;
    if args.generate {
        generate_short_rows(&mut session, &api, count, global.quiet || json);
    }

    let mut observer = if json {
        ConsoleObserver::new(true).to_stderr()
    } else {
        ConsoleObserver::new(global.quiet)
    };
    let mut summary = match session.import(&api, &mut observer) {
        Ok(summary) => summary,
        Err(abort) => {
            report_abort(&session, &abort, format);
            return Err(abort.into());
        }
    };

    let mut attempt = 0;
    while !summary.all_succeeded() && attempt < args.retries {
        attempt += 1;
        eprintln!(
            "{} Retrying {} failed row(s) (attempt {}/{})",
            style("→").blue(),
            session.failed_rows().len(),
            attempt,
            args.retries
        );
        let retry = session.retry_failed(&api, &mut observer)?;
        summary.absorb_retry(retry);
    }

    let report = ImportReport::from_session(&session, Some(&args.file));
    if let Some(path) = &args.report {
        write_report(&report, path)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
    } else {
        print_summary(&summary, &session, global.quiet);
    }

    if summary.failed > 0 {
        return Err(miette::miette!(
            help = "fix the rows or the backend and re-run with --retries, or use --interactive",
            "{} row(s) failed to import",
            summary.failed
        ));
    }
    Ok(())
}

/// Fill every selected row below the minimum using the example generator
pub(crate) fn generate_short_rows(
    session: &mut ImportSession,
    api: &dyn ChatbotApi,
    count: usize,
    quiet: bool,
) {
    let short: Vec<usize> = session
        .selected()
        .iter()
        .copied()
        .filter(|&i| {
            session
                .row(i)
                .is_some_and(|r| !r.is_imported() && r.example_count() < session.min_examples())
        })
        .collect();

    for index in short {
        match session.generate_examples(index, api, count) {
            Ok(added) => {
                if !quiet {
                    let total = session.row(index).map(|r| r.example_count()).unwrap_or(0);
                    println!(
                        "{} row {}: {} example(s) generated ({} total)",
                        style("→").blue(),
                        index + 1,
                        added,
                        total
                    );
                }
            }
            Err(e) => eprintln!("{} row {}: {}", style("✗").red(), index + 1, e),
        }
    }
}

fn dry_run(session: &mut ImportSession, format: OutputFormat) -> Result<()> {
    let indices = match session.preflight() {
        Ok(indices) => indices,
        Err(abort) => {
            report_abort(session, &abort, format);
            return Err(abort.into());
        }
    };

    for index in &indices {
        let Some(row) = session.row(*index) else {
            continue;
        };
        let payloads = build_payloads(row).into_diagnostic()?;

        println!("{}", style(format!("# row {}: {}", index + 1, row.name)).bold());
        println!("{}", style(format!("# intent {}", payloads.intent.name)).dim());
        print!("{}", payloads.intent.define);
        if let (Some(response), Some(story)) = (&payloads.response, &payloads.story_define) {
            println!("{}", style(format!("# response {}", response.name)).dim());
            print!("{}", response.define);
            println!("{}", style("# story").dim());
            print!("{}", story);
        }
        println!();
    }

    eprintln!(
        "{} {} row(s) ready to import (dry run, nothing sent)",
        style("✓").green(),
        indices.len()
    );
    Ok(())
}

/// Show why pre-flight stopped, with the offending rows
fn report_abort(session: &ImportSession, abort: &ImportAbort, format: OutputFormat) {
    if let ImportAbort::InvalidRows { rows, .. } = abort {
        let invalid: Vec<ParsedRow> = rows
            .iter()
            .filter_map(|&i| session.row(i).cloned())
            .collect();
        let table_format = match format {
            OutputFormat::Json | OutputFormat::Yaml => OutputFormat::Table,
            other => other,
        };
        eprint!(
            "{}",
            rows_table(&invalid, session.min_examples(), table_format).render(table_format)
        );
    }
}

fn write_report(report: &ImportReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).into_diagnostic()?;
    }
    let json = serde_json::to_string_pretty(report).into_diagnostic()?;
    std::fs::write(path, json).into_diagnostic()?;
    tracing::info!(path = %path.display(), "wrote import report");
    Ok(())
}

pub(crate) fn print_summary(summary: &ImportSummary, session: &ImportSession, quiet: bool) {
    if quiet && summary.failed == 0 {
        return;
    }
    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style("Import Summary").bold());
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "  {} {}",
        style("Imported:").green(),
        style(summary.succeeded).cyan()
    );
    if summary.failed > 0 {
        println!(
            "  {}   {}",
            style("Failed:").red(),
            style(summary.failed).cyan()
        );
        for index in session.failed_rows() {
            if let Some(row) = session.row(index) {
                println!(
                    "    row {} {}: {}",
                    index + 1,
                    style(&row.name).cyan(),
                    row.error.as_deref().unwrap_or_default()
                );
            }
        }
    }
}
