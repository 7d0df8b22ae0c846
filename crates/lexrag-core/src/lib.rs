//! Configuration, grounded answer composition and retrieval evaluation.

pub mod answer;
pub mod bootstrap;
pub mod config;
pub mod evaluation;

pub use answer::{AnswerComposer, AnswerError, AnswerResponse};
pub use bootstrap::App;
pub use config::Config;
pub use evaluation::{EvaluationReport, QualityGrade};
