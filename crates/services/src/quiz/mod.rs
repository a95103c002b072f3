//! Quiz orchestration on top of the pure question engine in `vocab_core::quiz`.

mod history;
mod run;
mod service;

pub use history::{HistoryService, LastResults};
pub use run::{AnswerFeedback, QuizReport, QuizRun};
pub use service::QuizService;

/// Question results shown at the bottom of a finish report.
pub const REPORT_RECENT_RESULTS: usize = 3;
