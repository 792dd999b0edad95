//! Nash equilibria of bimatrix games and randomly generated Prisoner's
//! Dilemma payoffs to feed them.
mod game;
pub use game::*;

pub mod payoff;
pub mod store;
