//! Bulk import of question/answer files into intents, responses and stories

pub mod parser;
pub mod report;
pub mod row;
pub mod session;

pub use parser::{parse_delimited, parse_file, FileFormat, ParseError, SUPPORTED_EXTENSIONS};
pub use report::ImportReport;
pub use row::{ParsedRow, RowStatus};
pub use session::{
    build_payloads, ImportAbort, ImportObserver, ImportSession, ImportSummary, NoopObserver,
    Progress, SessionError,
};
