//! Table formatting for list-style command output
//!
//! JSON and YAML are serialized from the underlying data by each command;
//! this module renders the flat text formats.

use console::style;
use tabled::{builder::Builder, settings::Style};

use crate::api::{EntityKind, Page};
use crate::cli::helpers::{escape_csv, escape_tsv, truncate_str};
use crate::cli::OutputFormat;
use crate::import::{ParsedRow, RowStatus};

/// Widest question/answer cell in terminal tables
const TEXT_WIDTH: usize = 48;

/// Header plus string rows, rendered per output format
#[derive(Debug, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as CSV, TSV or a terminal table
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Csv => self.delimited(",", escape_csv),
            OutputFormat::Tsv => self.delimited("\t", escape_tsv),
            _ => {
                let mut builder = Builder::default();
                builder.push_record(self.headers.iter());
                for row in &self.rows {
                    builder.push_record(row.iter());
                }
                let mut out = builder.build().with(Style::rounded()).to_string();
                out.push('\n');
                out
            }
        }
    }

    fn delimited(&self, sep: &str, escape: fn(&str) -> String) -> String {
        let mut out = String::new();
        for line in std::iter::once(&self.headers).chain(self.rows.iter()) {
            let cells: Vec<String> = line.iter().map(|c| escape(c)).collect();
            out.push_str(&cells.join(sep));
            out.push('\n');
        }
        out
    }
}

fn status_cell(status: RowStatus, terminal: bool) -> String {
    if !terminal {
        return status.to_string();
    }
    match status {
        RowStatus::Pending => style("pending").dim().to_string(),
        RowStatus::Success => style("success").green().to_string(),
        RowStatus::Error => style("error").red().to_string(),
    }
}

/// Rows of an import batch. Terminal tables truncate long text.
pub fn rows_table(rows: &[ParsedRow], min_examples: usize, format: OutputFormat) -> TextTable {
    let terminal = matches!(format, OutputFormat::Auto | OutputFormat::Table);
    let fit = |s: &str| {
        if terminal {
            truncate_str(s, TEXT_WIDTH)
        } else {
            s.to_string()
        }
    };

    let mut table = TextTable::new(["#", "NAME", "QUESTION", "ANSWER", "EXAMPLES", "STATUS", "NOTE"]);
    for (i, row) in rows.iter().enumerate() {
        let count = row.example_count();
        let examples = if terminal && count < min_examples {
            style(format!("{}/{}", count, min_examples)).yellow().to_string()
        } else {
            count.to_string()
        };
        let note = row
            .error
            .as_deref()
            .or(row.validation_error.as_deref())
            .unwrap_or_default();

        table.push(vec![
            (i + 1).to_string(),
            row.name.clone(),
            fit(row.raw_name.as_deref().unwrap_or_default()),
            fit(row.response_text().unwrap_or_default()),
            examples,
            status_cell(row.status, terminal),
            fit(note),
        ]);
    }
    table
}

/// One page of backend records
pub fn records_table(kind: EntityKind, page: &Page, format: OutputFormat) -> TextTable {
    let terminal = matches!(format, OutputFormat::Auto | OutputFormat::Table);
    let mut table = TextTable::new(["ID", "NAME", "DESCRIPTION", "UPDATED"]);
    for record in &page.items {
        let description = record.description.as_deref().unwrap_or_default();
        table.push(vec![
            record.id.clone(),
            record.name.clone(),
            if terminal {
                truncate_str(description, TEXT_WIDTH)
            } else {
                description.to_string()
            },
            record.updated_at.clone().unwrap_or_default(),
        ]);
    }
    tracing::debug!(kind = %kind, shown = table.len(), total = ?page.total, "rendering records");
    table
}
