//! In-memory import session
//!
//! Holds one batch of parsed rows together with the selection, the rows the
//! user has expanded, and the progress of the last import run. Rows are
//! imported strictly one at a time in index order; a failing row is marked and
//! the loop moves on.

use miette::Diagnostic;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use thiserror::Error;

use crate::api::{ApiError, ChatbotApi, DefinePayload, GenerateRequest, StoryPayload};
use crate::core::config::DEFAULT_MIN_EXAMPLES;
use crate::core::normalize::{normalize_name, response_name};
use crate::import::row::{ParsedRow, RowStatus};
use crate::schema::define::{
    story_name, to_yaml, DefineError, IntentDefine, ResponseDefine, StoryDefine,
};

/// Import progress: rows finished out of rows attempted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

/// Outcome counts of one import run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub progress: Progress,
}

impl ImportSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Fold a retry pass into the totals of the run it follows. Failures and
    /// progress are those of the latest pass.
    pub fn absorb_retry(&mut self, retry: ImportSummary) {
        self.succeeded += retry.succeeded;
        self.failed = retry.failed;
        self.progress = retry.progress;
    }
}

/// Server ids created for one row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedIds {
    pub intent: String,
    pub response: Option<String>,
    pub story: Option<String>,
}

/// Receives per-row notifications while an import runs
pub trait ImportObserver {
    fn row_started(&mut self, _index: usize, _row: &ParsedRow) {}

    fn row_finished(&mut self, index: usize, row: &ParsedRow, progress: Progress);
}

/// Observer that ignores every notification
pub struct NoopObserver;

impl ImportObserver for NoopObserver {
    fn row_finished(&mut self, _index: usize, _row: &ParsedRow, _progress: Progress) {}
}

/// Why an import run stopped before any row was sent
#[derive(Debug, Error, Diagnostic)]
pub enum ImportAbort {
    #[error("no rows selected for import")]
    #[diagnostic(
        code(botadmin::import::nothing_selected),
        help("select at least one row that has not been imported yet")
    )]
    NothingSelected,

    #[error("no failed rows to retry")]
    #[diagnostic(code(botadmin::import::nothing_to_retry))]
    NothingToRetry,

    #[error("{} row(s) are not ready to import (each needs a name and at least {min_examples} examples)", .rows.len())]
    #[diagnostic(
        code(botadmin::import::invalid_rows),
        help("add examples by hand or with --generate, then try again")
    )]
    InvalidRows { rows: Vec<usize>, min_examples: usize },

    #[error("duplicate intent names in selection: {}", .names.join(", "))]
    #[diagnostic(
        code(botadmin::import::duplicate_names),
        help("rename or deselect rows so every intent name is unique")
    )]
    DuplicateNames { names: Vec<String> },
}

/// Errors from editing operations on a row
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum SessionError {
    #[error("row {0} does not exist")]
    #[diagnostic(code(botadmin::session::no_row))]
    NoSuchRow(usize),

    #[error("row {row} has no example {example}")]
    #[diagnostic(code(botadmin::session::no_example))]
    NoSuchExample { row: usize, example: usize },

    #[error("row {0} is already imported and cannot be changed")]
    #[diagnostic(code(botadmin::session::locked))]
    RowLocked(usize),

    #[error("a row must keep at least one example")]
    #[diagnostic(code(botadmin::session::last_example))]
    LastExample,

    #[error("text must not be blank")]
    #[diagnostic(code(botadmin::session::blank))]
    Blank,

    #[error("row {0} has no text to generate examples from")]
    #[diagnostic(code(botadmin::session::no_seed))]
    NoSeed(usize),

    #[error("example generation failed: {0}")]
    #[diagnostic(code(botadmin::session::generate))]
    Generation(String),
}

/// A failure while creating one row's intent, response or story
#[derive(Debug, Error)]
enum RowFailure {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Define(#[from] DefineError),
}

impl RowFailure {
    fn user_message(&self) -> String {
        match self {
            RowFailure::Api(e) => e.user_message(),
            RowFailure::Define(e) => e.to_string(),
        }
    }
}

/// One batch of rows under edit and import
#[derive(Debug, Clone)]
pub struct ImportSession {
    rows: Vec<ParsedRow>,
    selected: BTreeSet<usize>,
    expanded: BTreeSet<usize>,
    progress: Progress,
    min_examples: usize,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_EXAMPLES)
    }
}

impl ImportSession {
    /// An empty session requiring `min_examples` examples per row
    pub fn new(min_examples: usize) -> Self {
        Self {
            rows: Vec::new(),
            selected: BTreeSet::new(),
            expanded: BTreeSet::new(),
            progress: Progress::default(),
            min_examples,
        }
    }

    /// Replace the batch with freshly parsed rows, all selected
    pub fn load(&mut self, rows: Vec<ParsedRow>) {
        self.selected = (0..rows.len()).collect();
        self.expanded.clear();
        self.progress = Progress::default();
        self.rows = rows;
    }

    /// Discard the batch
    pub fn clear(&mut self) {
        self.load(Vec::new());
    }

    pub fn rows(&self) -> &[ParsedRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&ParsedRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn min_examples(&self) -> usize {
        self.min_examples
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn selected(&self) -> &BTreeSet<usize> {
        &self.selected
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.contains(&index)
    }

    pub fn failed_rows(&self) -> Vec<usize> {
        self.indices_with(RowStatus::Error)
    }

    fn indices_with(&self, status: RowStatus) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.status == status)
            .map(|(i, _)| i)
            .collect()
    }

    fn check_row(&self, index: usize) -> Result<(), SessionError> {
        if index >= self.rows.len() {
            return Err(SessionError::NoSuchRow(index));
        }
        Ok(())
    }

    fn editable_row(&mut self, index: usize) -> Result<&mut ParsedRow, SessionError> {
        let row = self
            .rows
            .get_mut(index)
            .ok_or(SessionError::NoSuchRow(index))?;
        if row.is_imported() {
            return Err(SessionError::RowLocked(index));
        }
        Ok(row)
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Select a row. Imported rows cannot be selected.
    pub fn select(&mut self, index: usize) -> Result<(), SessionError> {
        self.check_row(index)?;
        if self.rows[index].is_imported() {
            return Err(SessionError::RowLocked(index));
        }
        self.selected.insert(index);
        Ok(())
    }

    pub fn deselect(&mut self, index: usize) -> Result<(), SessionError> {
        self.check_row(index)?;
        self.selected.remove(&index);
        Ok(())
    }

    /// Flip selection; returns whether the row is now selected
    pub fn toggle_selected(&mut self, index: usize) -> Result<bool, SessionError> {
        if self.is_selected(index) {
            self.deselect(index)?;
            Ok(false)
        } else {
            self.select(index)?;
            Ok(true)
        }
    }

    /// Select every row that has not been imported
    pub fn select_all(&mut self) {
        self.selected = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.is_imported())
            .map(|(i, _)| i)
            .collect();
    }

    pub fn select_none(&mut self) {
        self.selected.clear();
    }

    /// Replace the selection with the given indices
    pub fn select_only<I: IntoIterator<Item = usize>>(&mut self, indices: I) -> Result<(), SessionError> {
        self.selected.clear();
        for index in indices {
            self.select(index)?;
        }
        Ok(())
    }

    /// Flip expansion; returns whether the row is now expanded
    pub fn toggle_expanded(&mut self, index: usize) -> Result<bool, SessionError> {
        self.check_row(index)?;
        if self.expanded.remove(&index) {
            Ok(false)
        } else {
            self.expanded.insert(index);
            Ok(true)
        }
    }

    // ------------------------------------------------------------------
    // Row editing
    // ------------------------------------------------------------------

    /// Rename a row; the text is normalized into an identifier
    pub fn set_name(&mut self, index: usize, text: &str) -> Result<&str, SessionError> {
        let name = normalize_name(text);
        if name.is_empty() {
            return Err(SessionError::Blank);
        }
        let row = self.editable_row(index)?;
        row.name = name;
        Ok(&row.name)
    }

    /// Replace the answer text (`None` or blank removes it)
    pub fn set_response(&mut self, index: usize, text: Option<&str>) -> Result<(), SessionError> {
        let row = self.editable_row(index)?;
        row.response = text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        Ok(())
    }

    pub fn add_example(&mut self, index: usize, text: &str) -> Result<(), SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::Blank);
        }
        let min = self.min_examples;
        let row = self.editable_row(index)?;
        row.examples.push(text.to_string());
        clear_resolved_validation(row, min);
        Ok(())
    }

    pub fn edit_example(&mut self, index: usize, example: usize, text: &str) -> Result<(), SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::Blank);
        }
        let min = self.min_examples;
        let row = self.editable_row(index)?;
        let slot = row
            .examples
            .get_mut(example)
            .ok_or(SessionError::NoSuchExample { row: index, example })?;
        *slot = text.to_string();
        clear_resolved_validation(row, min);
        Ok(())
    }

    /// Remove an example. The last remaining example cannot be removed.
    pub fn delete_example(&mut self, index: usize, example: usize) -> Result<String, SessionError> {
        let row = self.editable_row(index)?;
        if example >= row.examples.len() {
            return Err(SessionError::NoSuchExample { row: index, example });
        }
        if row.examples.len() <= 1 {
            return Err(SessionError::LastExample);
        }
        Ok(row.examples.remove(example))
    }

    /// Ask the backend for `count` paraphrases of a row and merge them in.
    ///
    /// Returns how many new examples were added. On failure the row is left
    /// untouched.
    pub fn generate_examples(
        &mut self,
        index: usize,
        api: &dyn ChatbotApi,
        count: usize,
    ) -> Result<usize, SessionError> {
        let request = {
            let row = self.editable_row(index)?;
            let seed = row.seed_example().ok_or(SessionError::NoSeed(index))?;
            GenerateRequest {
                example: seed.to_string(),
                num: count,
                response: row.response_text().unwrap_or_default().to_string(),
            }
        };

        let generated = api.generate_examples(&request).map_err(|e| {
            tracing::warn!(row = index, error = %e, "example generation failed");
            SessionError::Generation(e.user_message())
        })?;

        let row = self.editable_row(index)?;
        let mut seen: HashSet<String> = row.examples.iter().map(|e| e.trim().to_string()).collect();
        let mut added = 0;
        for example in generated {
            let example = example.trim();
            if example.is_empty() || !seen.insert(example.to_string()) {
                continue;
            }
            row.examples.push(example.to_string());
            added += 1;
        }
        row.validation_error = None;
        self.expanded.insert(index);

        tracing::info!(row = index, added, "merged generated examples");
        Ok(added)
    }

    // ------------------------------------------------------------------
    // Import
    // ------------------------------------------------------------------

    /// Check the selection without touching the network.
    ///
    /// Returns the indices that would be imported. Rows failing validation are
    /// annotated and expanded; rows passing have stale annotations cleared.
    pub fn preflight(&mut self) -> Result<Vec<usize>, ImportAbort> {
        let to_import: Vec<usize> = self
            .selected
            .iter()
            .copied()
            .filter(|&i| self.rows.get(i).is_some_and(|row| !row.is_imported()))
            .collect();

        if to_import.is_empty() {
            return Err(ImportAbort::NothingSelected);
        }

        let min = self.min_examples;
        let mut invalid = Vec::new();
        for &i in &to_import {
            let row = &mut self.rows[i];
            let message = if row.name.is_empty() {
                Some("intent name is empty; the question has no letters or digits".to_string())
            } else if row.example_count() < min {
                Some(format!(
                    "needs at least {} examples (has {})",
                    min,
                    row.example_count()
                ))
            } else {
                None
            };

            match message {
                Some(message) => {
                    row.validation_error = Some(message);
                    invalid.push(i);
                }
                None => row.validation_error = None,
            }
        }

        if !invalid.is_empty() {
            self.expanded.extend(invalid.iter().copied());
            return Err(ImportAbort::InvalidRows {
                rows: invalid,
                min_examples: min,
            });
        }

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for &i in &to_import {
            *counts.entry(self.rows[i].name.as_str()).or_insert(0) += 1;
        }
        let duplicates: Vec<String> = counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(name, _)| name.to_string())
            .collect();
        if !duplicates.is_empty() {
            return Err(ImportAbort::DuplicateNames { names: duplicates });
        }

        Ok(to_import)
    }

    /// Import every selected row that has not succeeded yet
    pub fn import(
        &mut self,
        api: &dyn ChatbotApi,
        observer: &mut dyn ImportObserver,
    ) -> Result<ImportSummary, ImportAbort> {
        let to_import = self.preflight()?;

        self.progress = Progress {
            done: 0,
            total: to_import.len(),
        };
        let mut summary = ImportSummary::default();

        // Walk the full batch so indices stay aligned with the original rows
        for index in 0..self.rows.len() {
            if !self.selected.contains(&index) || self.rows[index].is_imported() {
                continue;
            }

            observer.row_started(index, &self.rows[index]);

            match import_row(api, &self.rows[index]) {
                Ok(ids) => {
                    let row = &mut self.rows[index];
                    row.status = RowStatus::Success;
                    row.error = None;
                    summary.succeeded += 1;
                    tracing::info!(
                        row = index,
                        name = %row.name,
                        intent = %ids.intent,
                        response = ?ids.response,
                        story = ?ids.story,
                        "row imported"
                    );
                }
                Err(failure) => {
                    let row = &mut self.rows[index];
                    row.status = RowStatus::Error;
                    row.error = Some(failure.user_message());
                    summary.failed += 1;
                    tracing::warn!(row = index, name = %row.name, error = %failure, "row failed");
                }
            }

            self.progress.done += 1;
            observer.row_finished(index, &self.rows[index], self.progress);
        }

        summary.progress = self.progress;
        Ok(summary)
    }

    /// Re-run the import for exactly the rows that failed last time
    pub fn retry_failed(
        &mut self,
        api: &dyn ChatbotApi,
        observer: &mut dyn ImportObserver,
    ) -> Result<ImportSummary, ImportAbort> {
        let failed = self.failed_rows();
        if failed.is_empty() {
            return Err(ImportAbort::NothingToRetry);
        }

        for &i in &failed {
            self.rows[i].status = RowStatus::Pending;
        }
        self.selected = failed.into_iter().collect();

        self.import(api, observer)
    }
}

fn clear_resolved_validation(row: &mut ParsedRow, min_examples: usize) {
    if row.validation_error.is_some() && !row.name.is_empty() && row.example_count() >= min_examples {
        row.validation_error = None;
    }
}

/// Definition payloads for one row, in creation order
pub struct RowPayloads {
    pub intent: DefinePayload,
    pub response: Option<DefinePayload>,
    pub story_define: Option<String>,
}

/// Build the intent/response/story definitions for a row
pub fn build_payloads(row: &ParsedRow) -> Result<RowPayloads, DefineError> {
    let examples: Vec<&str> = row.non_empty_examples().collect();
    let intent = DefinePayload {
        name: row.name.clone(),
        description: row.raw_name.clone().unwrap_or_else(|| row.name.clone()),
        define: to_yaml(&IntentDefine::new(&row.name, &examples))?,
    };

    let (response, story_define) = match row.response_text() {
        Some(text) => (
            Some(DefinePayload {
                name: response_name(&row.name),
                description: format!("Response for {}", row.name),
                define: to_yaml(&ResponseDefine::new(&row.name, text))?,
            }),
            Some(to_yaml(&StoryDefine::new(&row.name))?),
        ),
        None => (None, None),
    };

    Ok(RowPayloads {
        intent,
        response,
        story_define,
    })
}

/// Create intent, then response, then the story linking them
fn import_row(api: &dyn ChatbotApi, row: &ParsedRow) -> Result<CreatedIds, RowFailure> {
    let payloads = build_payloads(row)?;

    let intent = api.create_intent(&payloads.intent)?;
    let mut ids = CreatedIds {
        intent: intent.id,
        ..Default::default()
    };

    if let (Some(response_payload), Some(story_define)) = (payloads.response, payloads.story_define) {
        let response = api.create_response(&response_payload)?;

        let story = StoryPayload::linking(
            story_name(&row.name),
            format!("Story for {}", row.name),
            story_define,
            vec![ids.intent.clone()],
            vec![response.id.clone()],
        );
        ids.response = Some(response.id);
        ids.story = Some(api.create_story(&story)?.id);
    }

    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{EntityKind, ListQuery, Page, RemoteRecord};
    use reqwest::StatusCode;
    use std::cell::{Cell, RefCell};

    /// Records every call; fails intent creation for names in `fail_intents`
    #[derive(Default)]
    struct FakeApi {
        calls: RefCell<Vec<String>>,
        fail_intents: RefCell<HashSet<String>>,
        fail_stories: Cell<bool>,
        generated: RefCell<Option<Vec<String>>>,
        next_id: Cell<usize>,
    }

    impl FakeApi {
        fn record(&self, name: &str) -> RemoteRecord {
            let id = self.next_id.get() + 1;
            self.next_id.set(id);
            RemoteRecord {
                id: format!("id{}", id),
                name: name.to_string(),
                description: None,
                updated_at: None,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn count(&self, prefix: &str) -> usize {
            self.calls.borrow().iter().filter(|c| c.starts_with(prefix)).count()
        }
    }

    impl ChatbotApi for FakeApi {
        fn create_intent(&self, payload: &DefinePayload) -> Result<RemoteRecord, ApiError> {
            self.calls.borrow_mut().push(format!("intent:{}", payload.name));
            if self.fail_intents.borrow().contains(&payload.name) {
                return Err(ApiError::Status {
                    status: StatusCode::CONFLICT,
                    message: Some(format!("Intent {} already exists", payload.name)),
                });
            }
            Ok(self.record(&payload.name))
        }

        fn create_response(&self, payload: &DefinePayload) -> Result<RemoteRecord, ApiError> {
            self.calls.borrow_mut().push(format!("response:{}", payload.name));
            Ok(self.record(&payload.name))
        }

        fn create_story(&self, payload: &StoryPayload) -> Result<RemoteRecord, ApiError> {
            self.calls.borrow_mut().push(format!(
                "story:{}:{}:{}",
                payload.name,
                payload.intents.join("|"),
                payload.responses.join("|")
            ));
            if self.fail_stories.get() {
                return Err(ApiError::Status {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: None,
                });
            }
            Ok(self.record(&payload.name))
        }

        fn generate_examples(&self, request: &GenerateRequest) -> Result<Vec<String>, ApiError> {
            self.calls
                .borrow_mut()
                .push(format!("generate:{}:{}", request.example, request.num));
            match self.generated.borrow().clone() {
                Some(examples) => Ok(examples),
                None => Err(ApiError::Decode("generator offline".into())),
            }
        }

        fn list(&self, _kind: EntityKind, _query: &ListQuery) -> Result<Page, ApiError> {
            Ok(Page::default())
        }

        fn delete(&self, _kind: EntityKind, _id: &str) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn ready_row(question: &str, answer: &str) -> ParsedRow {
        let mut row = ParsedRow::new(question, Some(answer));
        for i in 1..5 {
            row.examples.push(format!("{} variant {}", question, i));
        }
        row
    }

    fn session_with(rows: Vec<ParsedRow>) -> ImportSession {
        let mut session = ImportSession::new(5);
        session.load(rows);
        session
    }

    #[derive(Default)]
    struct RecordingObserver {
        finished: Vec<(usize, RowStatus, Progress)>,
    }

    impl ImportObserver for RecordingObserver {
        fn row_finished(&mut self, index: usize, row: &ParsedRow, progress: Progress) {
            self.finished.push((index, row.status, progress));
        }
    }

    #[test]
    fn test_load_selects_all_and_replaces_batch() {
        let mut session = session_with(vec![ready_row("a", "1"), ready_row("b", "2")]);
        assert_eq!(session.selected().len(), 2);

        session.load(vec![ready_row("c", "3")]);
        assert_eq!(session.len(), 1);
        assert_eq!(session.selected().iter().copied().collect::<Vec<_>>(), vec![0]);

        session.clear();
        assert!(session.is_empty());
        assert!(session.selected().is_empty());
    }

    #[test]
    fn test_import_creates_intent_response_story_in_order() {
        let api = FakeApi::default();
        let mut session = session_with(vec![ready_row("Cháy là gì", "Đó là phản ứng")]);

        let summary = session.import(&api, &mut NoopObserver).unwrap();
        assert_eq!(summary.succeeded, 1);
        assert!(summary.all_succeeded());
        assert_eq!(
            api.calls(),
            vec![
                "intent:chay_la_gi",
                "response:utter_chay_la_gi",
                "story:story_chay_la_gi:id1:id2",
            ]
        );
        assert_eq!(session.rows()[0].status, RowStatus::Success);
    }

    #[test]
    fn test_row_without_response_creates_only_intent() {
        let api = FakeApi::default();
        let mut row = ready_row("Xin chào", "");
        row.response = None;
        let mut session = session_with(vec![row]);

        session.import(&api, &mut NoopObserver).unwrap();
        assert_eq!(api.calls(), vec!["intent:xin_chao"]);
        assert_eq!(session.rows()[0].status, RowStatus::Success);
    }

    #[test]
    fn test_too_few_examples_aborts_without_network() {
        let api = FakeApi::default();
        let mut short = ParsedRow::new("Only one", Some("answer"));
        short.examples.push("   ".into());
        let mut session = session_with(vec![ready_row("a", "1"), short]);

        let err = session.import(&api, &mut NoopObserver).unwrap_err();
        match err {
            ImportAbort::InvalidRows { rows, min_examples } => {
                assert_eq!(rows, vec![1]);
                assert_eq!(min_examples, 5);
            }
            other => panic!("unexpected abort: {:?}", other),
        }
        assert!(api.calls().is_empty());
        assert!(session.rows()[1].validation_error.is_some());
        assert!(session.is_expanded(1));
        assert!(session.rows()[0].validation_error.is_none());
        assert_eq!(session.progress(), Progress::default());
    }

    #[test]
    fn test_empty_name_is_invalid() {
        let api = FakeApi::default();
        let mut row = ready_row("???", "x");
        row.name = normalize_name("???");
        let mut session = session_with(vec![row]);

        assert!(matches!(
            session.import(&api, &mut NoopObserver),
            Err(ImportAbort::InvalidRows { .. })
        ));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_row_without_any_example_is_invalid() {
        let api = FakeApi::default();
        let mut session = ImportSession::new(1);
        session.load(vec![ready_row("a", "1"), ParsedRow::new("", Some("Only answer"))]);

        match session.import(&api, &mut NoopObserver).unwrap_err() {
            ImportAbort::InvalidRows { rows, .. } => assert_eq!(rows, vec![1]),
            other => panic!("unexpected abort: {:?}", other),
        }
        assert_eq!(session.rows()[1].example_count(), 0);
        assert!(session.rows()[1].validation_error.is_some());
        assert!(session.is_expanded(1));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_sparse_delimited_rows_reach_preflight_with_a_question() {
        let api = FakeApi::default();
        let mut session = ImportSession::new(1);
        session.load(crate::import::parse_delimited("1,,Only answer\n,,Orphan\n2,Khói,\n"));
        assert_eq!(session.len(), 2);

        let indices = session.preflight().unwrap();
        assert_eq!(indices, vec![0, 1]);
        assert!(session.rows().iter().all(|r| r.example_count() == 1));

        session.import(&api, &mut NoopObserver).unwrap();
        assert_eq!(api.count("intent:"), 2);
    }

    #[test]
    fn test_duplicate_names_abort_without_network() {
        let api = FakeApi::default();
        let mut session = session_with(vec![
            ready_row("Cháy là gì?", "1"),
            ready_row("other", "2"),
            ready_row("cháy là gì", "3"),
        ]);

        let err = session.import(&api, &mut NoopObserver).unwrap_err();
        match err {
            ImportAbort::DuplicateNames { names } => assert_eq!(names, vec!["chay_la_gi"]),
            other => panic!("unexpected abort: {:?}", other),
        }
        assert!(api.calls().is_empty());
        assert!(session.rows().iter().all(|r| r.status == RowStatus::Pending));
    }

    #[test]
    fn test_duplicates_outside_selection_are_ignored() {
        let api = FakeApi::default();
        let mut session = session_with(vec![ready_row("same", "1"), ready_row("same", "2")]);
        session.deselect(1).unwrap();

        let summary = session.import(&api, &mut NoopObserver).unwrap();
        assert_eq!(summary.succeeded, 1);
        assert_eq!(session.rows()[1].status, RowStatus::Pending);
    }

    #[test]
    fn test_nothing_selected() {
        let api = FakeApi::default();
        let mut session = session_with(vec![ready_row("a", "1")]);
        session.select_none();

        assert!(matches!(
            session.import(&api, &mut NoopObserver),
            Err(ImportAbort::NothingSelected)
        ));
    }

    #[test]
    fn test_failed_row_does_not_stop_batch() {
        let api = FakeApi::default();
        api.fail_intents.borrow_mut().insert("row_two".into());
        let mut session = session_with(vec![
            ready_row("Row one", "1"),
            ready_row("Row two", "2"),
            ready_row("Row three", "3"),
        ]);
        let mut observer = RecordingObserver::default();

        let summary = session.import(&api, &mut observer).unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(session.progress(), Progress { done: 3, total: 3 });
        assert_eq!(session.rows()[0].status, RowStatus::Success);
        assert_eq!(session.rows()[1].status, RowStatus::Error);
        assert_eq!(
            session.rows()[1].error.as_deref(),
            Some("Intent row_two already exists")
        );
        assert_eq!(session.rows()[2].status, RowStatus::Success);
        assert_eq!(
            observer.finished.iter().map(|f| f.2.done).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(observer.finished[1].1, RowStatus::Error);
    }

    #[test]
    fn test_retry_failed_only_reimports_failed_rows() {
        let api = FakeApi::default();
        api.fail_intents.borrow_mut().insert("row_two".into());
        let mut session = session_with(vec![
            ready_row("Row one", "1"),
            ready_row("Row two", "2"),
            ready_row("Row three", "3"),
        ]);
        session.import(&api, &mut NoopObserver).unwrap();
        assert_eq!(api.count("intent:"), 3);

        api.fail_intents.borrow_mut().clear();
        let summary = session.retry_failed(&api, &mut NoopObserver).unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(session.progress(), Progress { done: 1, total: 1 });
        assert_eq!(api.count("intent:row_one"), 1);
        assert_eq!(api.count("intent:row_two"), 2);
        assert_eq!(api.count("intent:row_three"), 1);
        assert!(session.rows().iter().all(|r| r.status == RowStatus::Success));
        assert!(session.rows()[1].error.is_none());
    }

    #[test]
    fn test_retry_summary_tracks_latest_pass() {
        let api = FakeApi::default();
        api.fail_intents.borrow_mut().insert("row_two".into());
        api.fail_intents.borrow_mut().insert("row_three".into());
        let mut session = session_with(vec![
            ready_row("Row one", "1"),
            ready_row("Row two", "2"),
            ready_row("Row three", "3"),
        ]);
        let mut summary = session.import(&api, &mut NoopObserver).unwrap();
        assert_eq!(summary.progress, Progress { done: 3, total: 3 });

        api.fail_intents.borrow_mut().remove("row_two");
        let retry = session.retry_failed(&api, &mut NoopObserver).unwrap();
        summary.absorb_retry(retry);

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.progress, Progress { done: 2, total: 2 });
        assert_eq!(summary.progress, session.progress());
    }

    #[test]
    fn test_retry_without_failures() {
        let api = FakeApi::default();
        let mut session = session_with(vec![ready_row("a", "1")]);
        assert!(matches!(
            session.retry_failed(&api, &mut NoopObserver),
            Err(ImportAbort::NothingToRetry)
        ));
    }

    #[test]
    fn test_story_failure_marks_row_failed_after_partial_creation() {
        let api = FakeApi::default();
        api.fail_stories.set(true);
        let mut session = session_with(vec![ready_row("a", "1")]);

        let summary = session.import(&api, &mut NoopObserver).unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(api.count("intent:"), 1);
        assert_eq!(api.count("response:"), 1);
        assert_eq!(session.rows()[0].error.as_deref(), Some("Request failed (HTTP 500)"));
    }

    #[test]
    fn test_imported_row_never_resubmitted_even_if_selected() {
        let api = FakeApi::default();
        let mut session = session_with(vec![ready_row("a", "1"), ready_row("b", "2")]);
        session.import(&api, &mut NoopObserver).unwrap();
        assert_eq!(api.count("intent:"), 2);

        // Both rows are still in the selection
        assert_eq!(session.selected().len(), 2);
        assert!(matches!(
            session.import(&api, &mut NoopObserver),
            Err(ImportAbort::NothingSelected)
        ));
        assert_eq!(api.count("intent:"), 2);
    }

    #[test]
    fn test_imported_row_cannot_be_selected_or_edited() {
        let api = FakeApi::default();
        let mut session = session_with(vec![ready_row("a", "1"), ready_row("b", "2")]);
        session.deselect(1).unwrap();
        session.import(&api, &mut NoopObserver).unwrap();

        session.select_none();
        assert_eq!(session.select(0), Err(SessionError::RowLocked(0)));
        assert_eq!(session.add_example(0, "more"), Err(SessionError::RowLocked(0)));

        session.select_all();
        assert_eq!(session.selected().iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_delete_last_example_rejected() {
        let mut session = session_with(vec![ParsedRow::new("Lonely", Some("x"))]);
        assert_eq!(session.delete_example(0, 0), Err(SessionError::LastExample));
        assert_eq!(session.rows()[0].examples.len(), 1);

        session.add_example(0, "second").unwrap();
        assert_eq!(session.delete_example(0, 0).unwrap(), "Lonely");
        assert_eq!(session.rows()[0].examples, vec!["second"]);
    }

    #[test]
    fn test_edit_and_add_clear_validation_when_resolved() {
        let api = FakeApi::default();
        let mut session = session_with(vec![ParsedRow::new("Short", Some("x"))]);
        assert!(session.import(&api, &mut NoopObserver).is_err());
        assert!(session.rows()[0].validation_error.is_some());

        for i in 0..3 {
            session.add_example(0, &format!("extra {}", i)).unwrap();
        }
        assert!(session.rows()[0].validation_error.is_some());

        session.add_example(0, "extra 3").unwrap();
        assert!(session.rows()[0].validation_error.is_none());

        assert_eq!(session.edit_example(0, 9, "x"), Err(SessionError::NoSuchExample { row: 0, example: 9 }));
        assert_eq!(session.edit_example(0, 0, "  "), Err(SessionError::Blank));
        session.edit_example(0, 0, "Short question").unwrap();
        assert_eq!(session.rows()[0].examples[0], "Short question");
    }

    #[test]
    fn test_set_name_and_response() {
        let mut session = session_with(vec![ParsedRow::new("Old", Some("x"))]);
        assert_eq!(session.set_name(0, "Tên Mới!").unwrap(), "ten_moi");
        assert_eq!(session.set_name(0, "!!!"), Err(SessionError::Blank));

        session.set_response(0, Some("  ")).unwrap();
        assert_eq!(session.rows()[0].response, None);
        session.set_response(0, Some("Câu trả lời")).unwrap();
        assert_eq!(session.rows()[0].response.as_deref(), Some("Câu trả lời"));
    }

    #[test]
    fn test_generate_merges_with_set_semantics() {
        let api = FakeApi::default();
        *api.generated.borrow_mut() = Some(vec![
            "Cháy là gì".into(),
            "Hiện tượng cháy là gì".into(),
            " ".into(),
            "Thế nào là cháy".into(),
            "Hiện tượng cháy là gì".into(),
        ]);
        let mut session = session_with(vec![ParsedRow::new("Cháy là gì", Some("Phản ứng"))]);
        session.rows[0].validation_error = Some("needs at least 5 examples (has 1)".into());

        let added = session.generate_examples(0, &api, 10).unwrap();

        assert_eq!(added, 2);
        assert_eq!(
            session.rows()[0].examples,
            vec!["Cháy là gì", "Hiện tượng cháy là gì", "Thế nào là cháy"]
        );
        assert!(session.rows()[0].validation_error.is_none());
        assert!(session.is_expanded(0));
        assert_eq!(api.calls(), vec!["generate:Cháy là gì:10"]);
    }

    #[test]
    fn test_generate_failure_leaves_row_untouched() {
        let api = FakeApi::default();
        let mut session = session_with(vec![ParsedRow::new("Cháy là gì", Some("Phản ứng"))]);
        session.rows[0].validation_error = Some("needs more".into());
        let before = session.rows()[0].clone();

        let err = session.generate_examples(0, &api, 5).unwrap_err();
        assert!(matches!(err, SessionError::Generation(_)));
        assert_eq!(session.rows()[0], before);
        assert!(!session.is_expanded(0));
    }

    #[test]
    fn test_toggle_selection_and_expansion() {
        let mut session = session_with(vec![ready_row("a", "1")]);
        assert!(!session.toggle_selected(0).unwrap());
        assert!(session.toggle_selected(0).unwrap());
        assert!(session.toggle_expanded(0).unwrap());
        assert!(!session.toggle_expanded(0).unwrap());
        assert_eq!(session.toggle_selected(3), Err(SessionError::NoSuchRow(3)));
    }

    #[test]
    fn test_build_payloads() {
        let row = ready_row("Cháy là gì", "Đó là phản ứng");
        let payloads = build_payloads(&row).unwrap();

        assert_eq!(payloads.intent.name, "chay_la_gi");
        assert_eq!(payloads.intent.description, "Cháy là gì");
        let intent: IntentDefine = serde_yml::from_str(&payloads.intent.define).unwrap();
        assert_eq!(intent.examples().len(), 5);

        let response = payloads.response.unwrap();
        assert_eq!(response.name, "utter_chay_la_gi");
        assert!(payloads.story_define.unwrap().contains("utter_chay_la_gi"));
    }
}
