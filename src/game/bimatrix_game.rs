use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use super::GameError;

/// Two-player normal-form game given by one payoff matrix per player.
///
/// The first matrix holds the payoffs of the row player and the second the
/// payoffs of the column player. Both share the same shape, checked on
/// construction, and the game is never mutated afterwards.
#[derive(Debug, Clone)]
pub struct BimatrixGame {
    payoff: (Array2<f64>, Array2<f64>),
}

/// Mixed strategy profile: row player strategy and column player strategy.
#[derive(Debug, Clone)]
pub struct Equilibrium(pub Array1<f64>, pub Array1<f64>);

impl PartialEq for Equilibrium {
    fn eq(&self, other: &Equilibrium) -> bool {
        self.0.abs_diff_eq(&other.0, 1e-6) && self.1.abs_diff_eq(&other.1, 1e-6)
    }
}

/// Plain form of an equilibrium for the JSON and CSV boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumRecord {
    pub row: Vec<f64>,
    pub col: Vec<f64>,
    pub payoff: (f64, f64),
}

impl Equilibrium {
    pub fn to_record(&self, game: &BimatrixGame) -> EquilibriumRecord {
        EquilibriumRecord {
            row: self.0.to_vec(),
            col: self.1.to_vec(),
            payoff: game.strategy_payoff(self),
        }
    }
}

/// Indices of the actions played with probability above `tolerance`.
pub fn support(strategy: &Array1<f64>, tolerance: f64) -> Vec<usize> {
    strategy
        .iter()
        .enumerate()
        .filter(|(_, p)| **p > tolerance)
        .map(|(i, _)| i)
        .collect()
}

impl BimatrixGame {
    pub fn new(p1: Array2<f64>, p2: Array2<f64>) -> Result<Self, GameError> {
        if p1.shape() != p2.shape() {
            return Err(GameError::ShapeMismatch(p1.dim(), p2.dim()));
        }
        if p1.is_empty() {
            return Err(GameError::EmptyGame);
        }
        Ok(BimatrixGame { payoff: (p1, p2) })
    }

    /// Builds a game from row-major nested lists.
    pub fn from_lists(p1: &[Vec<f64>], p2: &[Vec<f64>]) -> Result<Self, GameError> {
        Self::new(Self::matrix_from_lists(p1)?, Self::matrix_from_lists(p2)?)
    }

    fn matrix_from_lists(rows: &[Vec<f64>]) -> Result<Array2<f64>, GameError> {
        let num_cols = rows.first().map_or(0, |r| r.len());
        if let Some(i) = rows.iter().position(|r| r.len() != num_cols) {
            return Err(GameError::RaggedMatrix(i));
        }
        Ok(Array2::from_shape_fn((rows.len(), num_cols), |(i, j)| {
            rows[i][j]
        }))
    }

    pub fn num_strategies(&self) -> (usize, usize) {
        self.payoff.0.dim()
    }

    pub fn num_strategies_player(&self, player: usize) -> usize {
        self.payoff.0.shape()[player]
    }

    pub fn total_strategies(&self) -> usize {
        self.payoff.0.shape()[0] + self.payoff.1.shape()[1]
    }

    /// Payoffs of both players when row action `i` meets column action `j`.
    pub fn payoff(&self, i: usize, j: usize) -> (f64, f64) {
        (self.payoff.0[[i, j]], self.payoff.1[[i, j]])
    }

    pub fn payoff_matrix(&self, player: usize) -> &Array2<f64> {
        if player == 0 {
            &self.payoff.0
        } else {
            &self.payoff.1
        }
    }

    pub fn strategy_payoff(&self, strategy: &Equilibrium) -> (f64, f64) {
        let payoff0 = self.payoff.0.dot(&strategy.1).dot(&strategy.0);
        let payoff1 = self.payoff.1.dot(&strategy.1).dot(&strategy.0);

        (payoff0, payoff1)
    }

    pub fn regret(&self, strategy: &Equilibrium) -> (f64, f64) {
        let strategy_payoff = self.strategy_payoff(strategy);
        let payoff0 = self.payoff.0.dot(&strategy.1);
        let payoff1 = strategy.0.dot(&self.payoff.1);

        let max_payoff0 = payoff0.fold(f64::NEG_INFINITY, |a, b| a.max(*b));
        let max_payoff1 = payoff1.fold(f64::NEG_INFINITY, |a, b| a.max(*b));
        (
            max_payoff0 - strategy_payoff.0,
            max_payoff1 - strategy_payoff.1,
        )
    }

    pub fn is_ne(&self, strategy: &Equilibrium, tolerance: f64) -> bool {
        let r = self.regret(strategy);

        r.0 <= tolerance && r.1 <= tolerance
    }

    /// Same game with every matrix mapped affinely onto `[0, 1]`. A constant
    /// matrix becomes zero. Best responses, and therefore equilibria, do not
    /// change, and absolute tolerances no longer depend on the payoff scale.
    pub fn normalized(&self) -> BimatrixGame {
        let normalize = |m: &Array2<f64>| {
            let min = m.fold(f64::INFINITY, |a, b| a.min(*b));
            let max = m.fold(f64::NEG_INFINITY, |a, b| a.max(*b));
            let range = max - min;
            if range > 0. {
                m.mapv(|x| (x - min) / range)
            } else {
                Array2::zeros(m.raw_dim())
            }
        };
        BimatrixGame {
            payoff: (normalize(&self.payoff.0), normalize(&self.payoff.1)),
        }
    }

    /// Normalized game translated onto `[1, 2]`, so every payoff is positive.
    pub fn shifted_positive(&self) -> BimatrixGame {
        let normalized = self.normalized();
        BimatrixGame {
            payoff: (normalized.payoff.0 + 1., normalized.payoff.1 + 1.),
        }
    }
}
