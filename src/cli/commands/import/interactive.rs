//! Menu-driven review of an import batch

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect, Select};
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use super::{generate_short_rows, print_summary, report_abort, ConsoleObserver};
use crate::api::ChatbotApi;
use crate::cli::table::rows_table;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::import::{parse_file, ImportSession, ImportSummary, SessionError};

const MAIN_MENU: &[&str] = &[
    "Show rows",
    "Choose rows to import",
    "Edit a row",
    "Generate examples for short rows",
    "Import selected rows",
    "Retry failed rows",
    "Load another file",
    "Clear batch",
    "Quit",
];

const ROW_MENU: &[&str] = &[
    "Show / hide examples",
    "Rename",
    "Edit answer",
    "Add example",
    "Edit example",
    "Delete example",
    "Generate examples",
    "Back",
];

pub fn run(
    session: &mut ImportSession,
    api: &dyn ChatbotApi,
    count: usize,
    file: &Path,
    global: &GlobalOpts,
) -> Result<()> {
    let theme = ColorfulTheme::default();

    println!();
    println!(
        "{} Import session for {}",
        style("◆").cyan(),
        style(file.display()).bold()
    );
    println!("{}", style("─".repeat(50)).dim());
    show_rows(session);

    loop {
        let choice = Select::with_theme(&theme)
            .with_prompt("What next?")
            .items(MAIN_MENU)
            .default(0)
            .interact()
            .into_diagnostic()?;

        match choice {
            0 => show_rows(session),
            1 => choose_rows(session, &theme)?,
            2 => {
                if let Some(index) = pick_row(session, &theme)? {
                    edit_row(session, index, api, count, &theme)?;
                }
            }
            3 => generate_short_rows(session, api, count, global.quiet),
            4 => {
                let mut observer = ConsoleObserver::new(false);
                let outcome = session.import(api, &mut observer);
                finish_run(session, outcome, global);
            }
            5 => {
                let mut observer = ConsoleObserver::new(false);
                let outcome = session.retry_failed(api, &mut observer);
                finish_run(session, outcome, global);
            }
            6 => {
                let path: String = Input::with_theme(&theme)
                    .with_prompt("File to load")
                    .interact_text()
                    .into_diagnostic()?;
                match parse_file(Path::new(path.trim())) {
                    Ok(rows) => {
                        println!("{} Loaded {} row(s)", style("✓").green(), rows.len());
                        session.load(rows);
                        show_rows(session);
                    }
                    Err(e) => eprintln!("{} {}", style("✗").red(), e),
                }
            }
            7 => {
                let sure = Confirm::with_theme(&theme)
                    .with_prompt("Discard every row in this batch?")
                    .default(false)
                    .interact()
                    .into_diagnostic()?;
                if sure {
                    session.clear();
                    println!("{} Batch cleared", style("✓").green());
                }
            }
            _ => break,
        }
    }

    Ok(())
}

fn finish_run(
    session: &ImportSession,
    outcome: std::result::Result<ImportSummary, crate::import::ImportAbort>,
    global: &GlobalOpts,
) {
    match outcome {
        Ok(summary) => print_summary(&summary, session, global.quiet),
        Err(abort) => {
            report_abort(session, &abort, OutputFormat::Table);
            eprintln!("{} {}", style("!").yellow(), abort);
        }
    }
}

fn show_rows(session: &ImportSession) {
    if session.is_empty() {
        println!("{}", style("(no rows)").dim());
        return;
    }

    print!(
        "{}",
        rows_table(session.rows(), session.min_examples(), OutputFormat::Table)
            .render(OutputFormat::Table)
    );
    let selected: Vec<String> = session
        .selected()
        .iter()
        .map(|i| (i + 1).to_string())
        .collect();
    println!(
        "{} {}",
        style("Selected:").dim(),
        if selected.is_empty() {
            "none".to_string()
        } else {
            selected.join(", ")
        }
    );

    for (index, row) in session.rows().iter().enumerate() {
        if !session.is_expanded(index) {
            continue;
        }
        println!();
        println!("{} {}", style(format!("row {}", index + 1)).bold(), style(&row.name).cyan());
        if let Some(message) = &row.validation_error {
            println!("  {} {}", style("!").yellow(), message);
        }
        for (i, example) in row.examples.iter().enumerate() {
            println!("  {:>3}. {}", i + 1, example);
        }
    }
}

fn row_label(session: &ImportSession, index: usize) -> String {
    match session.row(index) {
        Some(row) => format!(
            "{:>3}  {}  ({} examples, {})",
            index + 1,
            row.name,
            row.example_count(),
            row.status
        ),
        None => String::new(),
    }
}

fn pick_row(session: &ImportSession, theme: &ColorfulTheme) -> Result<Option<usize>> {
    if session.is_empty() {
        println!("{}", style("(no rows)").dim());
        return Ok(None);
    }
    let labels: Vec<String> = (0..session.len()).map(|i| row_label(session, i)).collect();
    Select::with_theme(theme)
        .with_prompt("Row")
        .items(&labels)
        .default(0)
        .interact_opt()
        .into_diagnostic()
}

fn choose_rows(session: &mut ImportSession, theme: &ColorfulTheme) -> Result<()> {
    if session.is_empty() {
        println!("{}", style("(no rows)").dim());
        return Ok(());
    }
    let labels: Vec<String> = (0..session.len()).map(|i| row_label(session, i)).collect();
    let defaults: Vec<bool> = (0..session.len()).map(|i| session.is_selected(i)).collect();

    let chosen = MultiSelect::with_theme(theme)
        .with_prompt("Rows to import (space toggles, enter confirms)")
        .items(&labels)
        .defaults(&defaults)
        .interact()
        .into_diagnostic()?;

    session.select_none();
    for index in chosen {
        if let Err(e) = session.select(index) {
            eprintln!("{} {}", style("!").yellow(), e);
        }
    }
    Ok(())
}

fn pick_example(
    session: &ImportSession,
    index: usize,
    theme: &ColorfulTheme,
) -> Result<Option<usize>> {
    let examples = session
        .row(index)
        .map(|r| r.examples.clone())
        .unwrap_or_default();
    if examples.is_empty() {
        return Ok(None);
    }
    Select::with_theme(theme)
        .with_prompt("Example")
        .items(&examples)
        .default(0)
        .interact_opt()
        .into_diagnostic()
}

fn edit_row(
    session: &mut ImportSession,
    index: usize,
    api: &dyn ChatbotApi,
    count: usize,
    theme: &ColorfulTheme,
) -> Result<()> {
    loop {
        println!("{}", row_label(session, index));
        let choice = Select::with_theme(theme)
            .with_prompt("Row action")
            .items(ROW_MENU)
            .default(0)
            .interact()
            .into_diagnostic()?;

        let outcome: std::result::Result<(), SessionError> = match choice {
            0 => {
                let toggled = session.toggle_expanded(index).map(|_| ());
                show_rows(session);
                toggled
            }
            1 => {
                let current = session.row(index).map(|r| r.name.clone()).unwrap_or_default();
                let text: String = Input::with_theme(theme)
                    .with_prompt("Name")
                    .with_initial_text(current)
                    .interact_text()
                    .into_diagnostic()?;
                session.set_name(index, &text).map(|name| {
                    println!("{} Renamed to {}", style("✓").green(), style(name).cyan());
                })
            }
            2 => {
                let current = session
                    .row(index)
                    .and_then(|r| r.response.clone())
                    .unwrap_or_default();
                let text: String = Input::with_theme(theme)
                    .with_prompt("Answer (empty removes it)")
                    .with_initial_text(current)
                    .allow_empty(true)
                    .interact_text()
                    .into_diagnostic()?;
                session.set_response(index, Some(&text))
            }
            3 => {
                let text: String = Input::with_theme(theme)
                    .with_prompt("New example")
                    .interact_text()
                    .into_diagnostic()?;
                session.add_example(index, &text)
            }
            4 => match pick_example(session, index, theme)? {
                Some(example) => {
                    let current = session
                        .row(index)
                        .and_then(|r| r.examples.get(example).cloned())
                        .unwrap_or_default();
                    let text: String = Input::with_theme(theme)
                        .with_prompt("Example")
                        .with_initial_text(current)
                        .interact_text()
                        .into_diagnostic()?;
                    session.edit_example(index, example, &text)
                }
                None => Ok(()),
            },
            5 => match pick_example(session, index, theme)? {
                Some(example) => session.delete_example(index, example).map(|removed| {
                    println!("{} Removed \"{}\"", style("✓").green(), removed);
                }),
                None => Ok(()),
            },
            6 => session.generate_examples(index, api, count).map(|added| {
                println!("{} {} example(s) added", style("✓").green(), added);
            }),
            _ => return Ok(()),
        };

        if let Err(e) = outcome {
            eprintln!("{} {}", style("✗").red(), e);
        }
    }
}
