pub mod cheatsheet;
pub mod evaluation;
pub mod extract;
pub mod grading;
pub mod prompts;
pub mod quest;
pub mod voice;

use thiserror::Error;

use crate::llm::LlmError;
use extract::ExtractError;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Parse(#[from] ExtractError),
    #[error("unexpected result shape: {0}")]
    Shape(String),
}
