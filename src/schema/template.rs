//! Import template generation
//!
//! Produces the example file users fill in before a bulk import. The styled
//! spreadsheet is preferred; if it cannot be written, a CSV with the same two
//! header rows plus a separate instructions file is written instead, and if
//! that fails too the CSV is written to the fallback stream (stdout).

use rust_embed::Embed;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tera::Tera;
use thiserror::Error;

use crate::import::parser::SUPPORTED_EXTENSIONS;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

pub const TEMPLATE_XLSX: &str = "intent_import_template.xlsx";
pub const TEMPLATE_CSV: &str = "intent_import_template.csv";
pub const INSTRUCTIONS_TXT: &str = "intent_import_instructions.txt";

pub const TEMPLATE_SHEET: &str = "template";
pub const README_SHEET: &str = "README";

const INSTRUCTIONS_TEMPLATE: &str = "instructions.txt.tera";

/// First header row: row number column, merged title over question/answer
pub const TITLE_ROW: [&str; 3] = ["STT", "VÍ DỤ MẪU", ""];
/// Second header row: column captions
pub const CAPTION_ROW: [&str; 3] = ["", "Câu hỏi", "Câu trả lời"];
/// The single illustrative data row
pub const EXAMPLE_ROW: [&str; 3] = [
    "1",
    "Cháy là gì?",
    "Cháy là phản ứng hóa học có tỏa nhiệt và phát sáng giữa chất cháy và oxy.",
];

const COLUMN_WIDTHS: [f64; 3] = [6.0, 40.0, 100.0];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template rendering error: {0}")]
    RenderError(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the template ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOutput {
    Spreadsheet(PathBuf),
    Delimited { csv: PathBuf, instructions: PathBuf },
    Stream,
}

/// Import template generator using Tera for the instructions text
pub struct TemplateGenerator {
    tera: Tera,
    min_examples: usize,
}

impl TemplateGenerator {
    /// Create a generator with embedded templates
    pub fn new(min_examples: usize) -> Result<Self, TemplateError> {
        let mut tera = Tera::default();

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                if let Ok(template_str) = std::str::from_utf8(&content.data) {
                    tera.add_raw_template(filename, template_str)
                        .map_err(|e| TemplateError::RenderError(e.to_string()))?;
                }
            }
        }

        Ok(Self { tera, min_examples })
    }

    /// Usage instructions shown in the README sheet and the instructions file
    pub fn instructions(&self) -> Result<String, TemplateError> {
        let mut context = tera::Context::new();
        context.insert("min_examples", &self.min_examples);
        context.insert("formats", &SUPPORTED_EXTENSIONS.join(", "));
        context.insert("template_file", TEMPLATE_XLSX);

        if self
            .tera
            .get_template_names()
            .any(|n| n == INSTRUCTIONS_TEMPLATE)
        {
            self.tera
                .render(INSTRUCTIONS_TEMPLATE, &context)
                .map_err(|e| TemplateError::RenderError(e.to_string()))
        } else {
            Ok(self.hardcoded_instructions())
        }
    }

    fn hardcoded_instructions(&self) -> String {
        format!(
            "INTENT IMPORT INSTRUCTIONS\n\n\
             1. Keep the first two header rows unchanged.\n\
             2. Each following row is one question: column B holds the question, column C the answer.\n\
             3. Intent names are derived from the question; duplicate names in one batch are rejected.\n\
             4. Every intent needs at least {} examples before it can be imported.\n\
             5. Supported formats: {}.\n",
            self.min_examples,
            SUPPORTED_EXTENSIONS.join(", ")
        )
    }

    /// Write the styled two-sheet workbook into `dir`
    pub fn write_spreadsheet(&self, dir: &Path) -> Result<PathBuf, TemplateError> {
        let header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_background_color(Color::Yellow)
            .set_border(FormatBorder::Thin);
        let body = Format::new()
            .set_text_wrap()
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin);

        let mut sheet = Worksheet::new();
        sheet.set_name(TEMPLATE_SHEET)?;
        for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
            sheet.set_column_width(col as u16, *width)?;
        }

        // A1:A2 and B1:C1 are merged
        sheet.merge_range(0, 0, 1, 0, TITLE_ROW[0], &header)?;
        sheet.merge_range(0, 1, 0, 2, TITLE_ROW[1], &header)?;
        sheet.write_string_with_format(1, 1, CAPTION_ROW[1], &header)?;
        sheet.write_string_with_format(1, 2, CAPTION_ROW[2], &header)?;

        for (col, value) in EXAMPLE_ROW.iter().enumerate() {
            sheet.write_string_with_format(2, col as u16, *value, &body)?;
        }

        let mut readme = Worksheet::new();
        readme.set_name(README_SHEET)?;
        readme.set_column_width(0, 120)?;
        for (row, line) in self.instructions()?.lines().enumerate() {
            readme.write_string(row as u32, 0, line)?;
        }

        let mut workbook = Workbook::new();
        workbook.push_worksheet(sheet);
        workbook.push_worksheet(readme);

        let path = dir.join(TEMPLATE_XLSX);
        workbook.save(&path)?;
        Ok(path)
    }

    /// The CSV template text (UTF-8 BOM so spreadsheet apps detect the encoding)
    pub fn csv_text(&self) -> Result<String, TemplateError> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());
        writer.write_record(TITLE_ROW)?;
        writer.write_record(CAPTION_ROW)?;
        writer.write_record(EXAMPLE_ROW)?;

        let bytes = writer
            .into_inner()
            .map_err(|e| TemplateError::Io(e.into_error()))?;
        Ok(format!("\u{feff}{}", String::from_utf8_lossy(&bytes)))
    }

    /// Write the CSV template and the instructions file into `dir`
    pub fn write_delimited(&self, dir: &Path) -> Result<(PathBuf, PathBuf), TemplateError> {
        let csv_path = dir.join(TEMPLATE_CSV);
        std::fs::write(&csv_path, self.csv_text()?)?;

        let instructions_path = dir.join(INSTRUCTIONS_TXT);
        std::fs::write(&instructions_path, self.instructions()?)?;

        Ok((csv_path, instructions_path))
    }

    /// Produce the template, falling back from spreadsheet to CSV to `fallback`.
    ///
    /// Only fails when the fallback stream itself cannot be written.
    pub fn generate(
        &self,
        dir: &Path,
        fallback: &mut dyn Write,
    ) -> Result<TemplateOutput, TemplateError> {
        match self.write_spreadsheet(dir) {
            Ok(path) => return Ok(TemplateOutput::Spreadsheet(path)),
            Err(e) => {
                tracing::warn!(error = %e, "spreadsheet template failed, writing CSV instead");
            }
        }

        match self.write_delimited(dir) {
            Ok((csv, instructions)) => return Ok(TemplateOutput::Delimited { csv, instructions }),
            Err(e) => {
                tracing::warn!(error = %e, "CSV template file failed, writing to output stream");
            }
        }

        let text = match self.csv_text() {
            Ok(text) => text,
            Err(_) => format!(
                "{}\n{}\n{}\n",
                TITLE_ROW.join(","),
                CAPTION_ROW.join(","),
                EXAMPLE_ROW.join(",")
            ),
        };
        fallback.write_all(text.trim_start_matches('\u{feff}').as_bytes())?;
        fallback.flush()?;
        Ok(TemplateOutput::Stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::parser::{parse_delimited, parse_file};
    use tempfile::tempdir;

    fn generator() -> TemplateGenerator {
        TemplateGenerator::new(5).unwrap()
    }

    #[test]
    fn test_instructions_mention_minimum() {
        let text = generator().instructions().unwrap();
        assert!(text.contains("5"));
        assert!(text.contains(".xlsx"));
    }

    #[test]
    fn test_spreadsheet_is_preferred() {
        let tmp = tempdir().unwrap();
        let mut sink = Vec::new();
        let output = generator().generate(tmp.path(), &mut sink).unwrap();

        assert_eq!(output, TemplateOutput::Spreadsheet(tmp.path().join(TEMPLATE_XLSX)));
        assert!(tmp.path().join(TEMPLATE_XLSX).is_file());
        assert!(!tmp.path().join(TEMPLATE_CSV).exists());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_spreadsheet_template_parses_to_example_row() {
        let tmp = tempdir().unwrap();
        let path = generator().write_spreadsheet(tmp.path()).unwrap();

        let rows = parse_file(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "chay_la_gi");
        assert_eq!(rows[0].examples, vec![EXAMPLE_ROW[1]]);
    }

    #[test]
    fn test_csv_fallback_when_spreadsheet_fails() {
        let tmp = tempdir().unwrap();
        // A directory where the workbook should go makes the save fail
        std::fs::create_dir(tmp.path().join(TEMPLATE_XLSX)).unwrap();

        let mut sink = Vec::new();
        let output = generator().generate(tmp.path(), &mut sink).unwrap();

        assert_eq!(
            output,
            TemplateOutput::Delimited {
                csv: tmp.path().join(TEMPLATE_CSV),
                instructions: tmp.path().join(INSTRUCTIONS_TXT),
            }
        );
        let csv = std::fs::read_to_string(tmp.path().join(TEMPLATE_CSV)).unwrap();
        assert!(csv.contains("Câu trả lời"));
        assert!(tmp.path().join(INSTRUCTIONS_TXT).is_file());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_stream_fallback_when_directory_unusable() {
        let tmp = tempdir().unwrap();
        let not_a_dir = tmp.path().join("plain-file");
        std::fs::write(&not_a_dir, "x").unwrap();

        let mut sink = Vec::new();
        let output = generator().generate(&not_a_dir, &mut sink).unwrap();

        assert_eq!(output, TemplateOutput::Stream);
        let text = String::from_utf8(sink).unwrap();
        assert!(text.starts_with("STT,"));
        assert!(text.contains("Câu hỏi"));
    }

    #[test]
    fn test_csv_template_headers_are_skipped_by_parser() {
        let text = generator().csv_text().unwrap();
        let rows = parse_delimited(&text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "chay_la_gi");
        assert_eq!(rows[0].response.as_deref(), Some(EXAMPLE_ROW[2]));
    }
}
