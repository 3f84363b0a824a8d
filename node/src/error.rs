use thiserror::Error;

use avalanche_types::ProofError;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid proof: {0}")]
    InvalidProof(#[from] ProofError),
}
