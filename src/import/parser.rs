//! Tabular import file parsing
//!
//! Two layouts are understood:
//! - Delimited text (`.csv`, `.tsv`, `.txt`): header rows are sniffed by
//!   keyword, fields split on tabs and commas. The question is column 2, or
//!   column 1 when column 2 is empty; the answer is column 3, or column 2.
//! - Spreadsheets (`.xls`, `.xlsx`): first worksheet, the first two rows are
//!   always a title and a header, question/answer sit in columns B and C.
//!
//! Rows come out unvalidated; deduplication and minimum-example checks belong
//! to the import session.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use miette::Diagnostic;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::import::row::ParsedRow;

/// Extensions accepted by [`parse_file`]
pub const SUPPORTED_EXTENSIONS: [&str; 5] = [".csv", ".tsv", ".txt", ".xls", ".xlsx"];

/// Keywords that mark the first line of a delimited file as a header
const HEADER_KEYWORDS: [&str; 7] = [
    "stt", "cau hoi", "câu hỏi", "question", "intent", "example", "ví dụ",
];

/// Keywords that mark the second line as a caption row (checked only after a header)
const CAPTION_KEYWORDS: [&str; 7] = [
    "câu hỏi", "cau hoi", "câu trả lời", "cau tra loi", "question", "answer", "response",
];

/// Spreadsheet rows before the data (title row + caption row)
const SPREADSHEET_HEADER_ROWS: u32 = 2;

/// Spreadsheet columns holding question and answer (B and C)
const QUESTION_COLUMN: u32 = 1;
const ANSWER_COLUMN: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Delimited,
    Spreadsheet,
}

impl FileFormat {
    /// Detect the format from a file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Some(FileFormat::Delimited),
            "xls" | "xlsx" => Some(FileFormat::Spreadsheet),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("unsupported file type: {}", .path.display())]
    #[diagnostic(
        code(botadmin::parse::unsupported),
        help("supported extensions: .csv, .tsv, .txt, .xls, .xlsx")
    )]
    Unsupported { path: PathBuf },

    #[error("cannot read {}: {source}", .path.display())]
    #[diagnostic(code(botadmin::parse::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read the file as a spreadsheet: {0}")]
    #[diagnostic(
        code(botadmin::parse::workbook),
        help("check that the file is a valid .xls/.xlsx workbook, or export it as CSV")
    )]
    Workbook(String),

    #[error("the workbook has no worksheets")]
    #[diagnostic(code(botadmin::parse::no_sheet))]
    NoWorksheet,
}

/// Parse an import file, dispatching on its extension
pub fn parse_file(path: &Path) -> Result<Vec<ParsedRow>, ParseError> {
    let format = FileFormat::from_path(path).ok_or_else(|| ParseError::Unsupported {
        path: path.to_path_buf(),
    })?;

    let bytes = std::fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let rows = match format {
        FileFormat::Delimited => parse_delimited(&String::from_utf8_lossy(&bytes)),
        FileFormat::Spreadsheet => parse_spreadsheet(bytes)?,
    };

    tracing::debug!(path = %path.display(), rows = rows.len(), "parsed import file");
    Ok(rows)
}

/// Parse delimited text into rows
pub fn parse_delimited(text: &str) -> Vec<ParsedRow> {
    let text = text.trim_start_matches('\u{feff}');
    let lines: Vec<&str> = text
        .split('\n')
        .map(|l| l.trim_end_matches(|c: char| c.is_whitespace() || c == '\u{a0}'))
        .collect();

    let mut skip = 0;
    if lines.first().is_some_and(|l| contains_keyword(l, &HEADER_KEYWORDS)) {
        skip = 1;
        if lines.get(1).is_some_and(|l| contains_keyword(l, &CAPTION_KEYWORDS)) {
            skip = 2;
        }
    }

    lines
        .iter()
        .skip(skip)
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let fields = split_line(line);
            let cell = |i: usize| fields.get(i).map(String::as_str).filter(|f| !f.is_empty());
            let question = cell(1).or_else(|| cell(0)).unwrap_or("");
            let answer = cell(2).or_else(|| cell(1)).unwrap_or("");
            row_from_cells(question, answer)
        })
        .collect()
}

fn contains_keyword(line: &str, keywords: &[&str]) -> bool {
    let lower = line.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Split one line on tabs and commas, honouring CSV quoting
fn split_line(line: &str) -> Vec<String> {
    // Both characters separate fields; a tab inside quotes reads back as a comma.
    let line = line.replace('\t', ",");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => record.iter().map(|f| f.trim().to_string()).collect(),
        _ => line.split(',').map(|f| f.trim().to_string()).collect(),
    }
}

/// A row needs a question; an answer on its own has nothing to match against
fn row_from_cells(question: &str, answer: &str) -> Option<ParsedRow> {
    let question = question.trim();
    let answer = answer.trim();
    if question.is_empty() {
        if !answer.is_empty() {
            tracing::warn!(answer, "skipping row with an answer but no question");
        }
        return None;
    }
    Some(ParsedRow::new(question, Some(answer)))
}

/// Parse an `.xls`/`.xlsx` workbook held in memory
pub fn parse_spreadsheet(bytes: Vec<u8>) -> Result<Vec<ParsedRow>, ParseError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ParseError::Workbook(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ParseError::NoWorksheet)?
        .map_err(|e| ParseError::Workbook(e.to_string()))?;

    let Some((last_row, _)) = range.end() else {
        return Ok(Vec::new());
    };

    // Positions are absolute so the fixed header rows are skipped even when the
    // used range starts below them.
    let cell = |row: u32, col: u32| -> String {
        match range.get_value((row, col)) {
            Some(Data::String(s)) => s.trim().to_string(),
            Some(Data::Empty) | None => String::new(),
            Some(other) => other.to_string().trim().to_string(),
        }
    };

    let rows = (SPREADSHEET_HEADER_ROWS..=last_row)
        .filter_map(|row| row_from_cells(&cell(row, QUESTION_COLUMN), &cell(row, ANSWER_COLUMN)))
        .collect();

    Ok(rows)
}
