use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{BimatrixGame, GameError};

/// Prisoner's Dilemma payoffs: reward, sucker, temptation and punishment.
///
/// Sampled values always satisfy `S < P < R < T`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdPayoffs {
    #[serde(rename = "R")]
    pub r: f64,
    #[serde(rename = "S")]
    pub s: f64,
    #[serde(rename = "T")]
    pub t: f64,
    #[serde(rename = "P")]
    pub p: f64,
}

impl PdPayoffs {
    pub fn is_ordered(&self) -> bool {
        self.s < self.p && self.p < self.r && self.r < self.t
    }

    /// `T - R < R - S`: the temptation gap is smaller than the gap between
    /// sucker and reward. Same as `T + S < 2R`.
    pub fn satisfies_gap_constraint(&self) -> bool {
        self.t - self.r < self.r - self.s
    }

    pub fn game(&self) -> Result<BimatrixGame, GameError> {
        let (a, b) = build_pd_lists(self);
        BimatrixGame::from_lists(&a, &b)
    }
}

/// Row player matrix `[[R, S], [T, P]]` and its transpose for the column
/// player, as nested lists.
pub fn build_pd_lists(pay: &PdPayoffs) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    let a = array![[pay.r, pay.s], [pay.t, pay.p]];
    let b = a.t();
    (to_lists(a.view()), to_lists(b))
}

fn to_lists(m: ArrayView2<f64>) -> Vec<Vec<f64>> {
    m.outer_iter().map(|row| row.to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payoffs() -> PdPayoffs {
        PdPayoffs {
            r: 3.,
            s: 0.,
            t: 5.,
            p: 1.,
        }
    }

    #[test]
    fn pd_lists() {
        let (a, b) = build_pd_lists(&payoffs());

        assert_eq!(a, vec![vec![3., 0.], vec![5., 1.]]);
        assert_eq!(b, vec![vec![3., 5.], vec![0., 1.]]);
        for i in 0..2 {
            for j in 0..2 {
                assert_eq!(a[i][j], b[j][i]);
            }
        }
    }

    #[test]
    fn pd_game() {
        let game = payoffs().game().unwrap();

        assert_eq!(game.payoff(0, 0), (3., 3.));
        assert_eq!(game.payoff(0, 1), (0., 5.));
        assert_eq!(game.payoff(1, 0), (5., 0.));
        assert_eq!(game.payoff(1, 1), (1., 1.));
    }

    #[test]
    fn interchange_format() {
        let json = serde_json::to_value(payoffs()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"R": 3.0, "S": 0.0, "T": 5.0, "P": 1.0})
        );
        let back: PdPayoffs = serde_json::from_value(json).unwrap();
        assert_eq!(back, payoffs());
    }

    #[test]
    fn constraints() {
        let pay = payoffs();
        assert!(pay.is_ordered());
        // 5 - 3 < 3 - 0
        assert!(pay.satisfies_gap_constraint());

        let flat = PdPayoffs { t: 3., ..pay };
        assert!(!flat.is_ordered());
    }
}
