use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GameError {
    #[error("Payoff matrices must have same size: {0:?} != {1:?}")]
    ShapeMismatch((usize, usize), (usize, usize)),

    #[error("Payoff matrices must have at least one row and one column.")]
    EmptyGame,

    #[error("Row {0} of the payoff matrix has a different length.")]
    RaggedMatrix(usize),

    #[error("Too many strategies for support enumeration: {0}")]
    TooManyStrategies(usize),

    #[error("Invalid label {label}: the game has {total} labels.")]
    InvalidLabel { label: usize, total: usize },

    #[error("No equilibrium found via label {label}: pivot budget of {pivots} exhausted.")]
    PivotBudgetExhausted { label: usize, pivots: usize },

    #[error("No equilibrium found via label {label}: variable {var} enters without a bounding row.")]
    UnboundedPivot { label: usize, var: isize },

    #[error("No equilibrium found via label {label}: terminal vertex is not an equilibrium.")]
    NotAnEquilibrium { label: usize },
}
