use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures outside the handler chain. Handlers themselves never fail:
/// they write an error response instead.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("failed to read request body: {0}")]
    Body(#[source] BoxError),
}
