use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("Simulator received invalid parameters: {0}")]
    InvalidParameters(String),
}
