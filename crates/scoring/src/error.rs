use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Scoring received invalid parameters: {0}")]
    InvalidParameters(String),
}
