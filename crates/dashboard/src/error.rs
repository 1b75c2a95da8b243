use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Feed error: {0}")]
    Feed(#[from] api_client::error::ApiError),

    #[error("Scoring error: {0}")]
    Scoring(#[from] scoring::ScoringError),

    #[error("Simulator error: {0}")]
    Simulator(#[from] simulator::SimulatorError),
}
