//! Random Prisoner's Dilemma payoffs and their labeled views.
mod gap;
pub use gap::*;

mod pd_payoffs;
pub use pd_payoffs::*;

mod labels;
pub use labels::*;

mod sampler;
pub use sampler::*;

mod payoff_error;
pub use payoff_error::PayoffError;
