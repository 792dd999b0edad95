use thiserror::Error;

use crate::GameError;

#[derive(Debug, Error, PartialEq)]
pub enum PayoffError {
    #[error("Invalid gap distribution: {0}")]
    InvalidGap(String),

    #[error("No payoffs accepted after {attempts} attempts, gap parameters are infeasible.")]
    InfeasibleParameters { attempts: usize },

    #[error(transparent)]
    Game(#[from] GameError),
}
