use itertools::iproduct;
use log::{debug, info};
use ndarray::prelude::*;

use super::{BimatrixGame, Equilibrium, GameError};

/// Tolerance of [`enumerate_equilibria`] for every equality and inequality
/// test, relative to payoffs normalized onto `[0, 1]`. Smaller values may
/// miss equilibria of nearly degenerate games, larger ones may accept
/// spurious candidates.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Support masks are `u64`; the search is exponential well before that.
const MAX_STRATEGIES: usize = 32;

/// All equilibria of `game` found by checking every pair of supports.
pub fn enumerate_equilibria(game: &BimatrixGame) -> Result<Vec<Equilibrium>, GameError> {
    enumerate_equilibria_with_tolerance(game, DEFAULT_TOLERANCE)
}

/// Support pairs are visited by increasing bitmask, rows outer and columns
/// inner, so the output order is the same on every call.
///
/// Pairs whose indifference equations do not determine a unique solution are
/// skipped. This finds every equilibrium of a non-degenerate game and the
/// isolated ones of a degenerate game.
pub fn enumerate_equilibria_with_tolerance(
    game: &BimatrixGame,
    tolerance: f64,
) -> Result<Vec<Equilibrium>, GameError> {
    let (m, n) = game.num_strategies();
    if m.max(n) > MAX_STRATEGIES {
        return Err(GameError::TooManyStrategies(m.max(n)));
    }
    let normalized = game.normalized();
    let a = normalized.payoff_matrix(0).view();
    let b = normalized.payoff_matrix(1).t();

    let mut equilibria: Vec<Equilibrium> = Vec::new();
    for (row_mask, col_mask) in iproduct!(1..1u64 << m, 1..1u64 << n) {
        let rows = actions(row_mask, m);
        let cols = actions(col_mask, n);
        let Some(eq) = check_supports(a, b, &rows, &cols, tolerance) else {
            continue;
        };
        let duplicated = equilibria.iter().any(|other| {
            other.0.abs_diff_eq(&eq.0, tolerance) && other.1.abs_diff_eq(&eq.1, tolerance)
        });
        if !duplicated {
            debug!("equilibrium on supports {rows:?} x {cols:?}: {} | {}", eq.0, eq.1);
            equilibria.push(eq);
        }
    }
    info!("support enumeration found {} equilibria", equilibria.len());
    Ok(equilibria)
}

fn actions(mask: u64, num_actions: usize) -> Vec<usize> {
    (0..num_actions).filter(|i| mask >> i & 1 == 1).collect()
}

/// Equilibrium supported exactly on `rows` and `cols`, if there is one.
///
/// `a` is indexed `[row, col]` and `b` `[col, row]`, so each matrix is seen
/// from the point of view of its own player.
fn check_supports(
    a: ArrayView2<f64>,
    b: ArrayView2<f64>,
    rows: &[usize],
    cols: &[usize],
    tolerance: f64,
) -> Option<Equilibrium> {
    let (col_strategy, row_value) = indifference(a, rows, cols, tolerance)?;
    let (row_strategy, col_value) = indifference(b, cols, rows, tolerance)?;

    let positive =
        |s: &Array1<f64>, support: &[usize]| support.iter().all(|&i| s[i] > tolerance);
    if !positive(&col_strategy, cols) || !positive(&row_strategy, rows) {
        return None;
    }

    let best = |payoffs: Array1<f64>| payoffs.fold(f64::NEG_INFINITY, |x, y| x.max(*y));
    if best(a.dot(&col_strategy)) > row_value + tolerance
        || best(b.dot(&row_strategy)) > col_value + tolerance
    {
        return None;
    }

    Some(Equilibrium(row_strategy, col_strategy))
}

/// Opponent strategy on `opponent` that makes every action in `own` pay the
/// same, together with that payoff.
///
/// Unknowns are the opponent probabilities and the common payoff `v`:
/// `sum_j payoff[i][j] y_j - v = 0` for each `i` in `own` and `sum_j y_j = 1`.
fn indifference(
    payoff: ArrayView2<f64>,
    own: &[usize],
    opponent: &[usize],
    tolerance: f64,
) -> Option<(Array1<f64>, f64)> {
    let vars = opponent.len() + 1;
    let mut system = Array2::<f64>::zeros((own.len() + 1, vars + 1));
    for (k, &i) in own.iter().enumerate() {
        for (l, &j) in opponent.iter().enumerate() {
            system[[k, l]] = payoff[[i, j]];
        }
        system[[k, vars - 1]] = -1.;
    }
    let last = own.len();
    system.slice_mut(s![last, 0..vars - 1]).fill(1.);
    system[[last, vars]] = 1.;

    let solution = solve_unique(system, tolerance)?;
    let mut strategy = Array1::zeros(payoff.ncols());
    for (l, &j) in opponent.iter().enumerate() {
        strategy[j] = solution[l];
    }
    Some((strategy, solution[vars - 1]))
}

/// Gauss-Jordan elimination with partial pivoting on an augmented matrix.
/// Returns `None` unless the system is consistent with exactly one solution.
fn solve_unique(mut system: Array2<f64>, tolerance: f64) -> Option<Array1<f64>> {
    let (rows, cols) = system.dim();
    let vars = cols - 1;
    let mut rank = 0;
    for c in 0..vars {
        if rank == rows {
            break;
        }
        let p = (rank..rows)
            .max_by(|&x, &y| system[[x, c]].abs().total_cmp(&system[[y, c]].abs()))?;
        if system[[p, c]].abs() <= tolerance {
            // Free variable.
            return None;
        }
        for k in 0..cols {
            system.swap([rank, k], [p, k]);
        }
        let pivot = system[[rank, c]];
        system.row_mut(rank).mapv_inplace(|x| x / pivot);
        let pivot_row = system.row(rank).to_owned();
        for i in (0..rows).filter(|&i| i != rank) {
            let factor = system[[i, c]];
            if factor != 0. {
                system.row_mut(i).scaled_add(-factor, &pivot_row);
            }
        }
        rank += 1;
    }
    if rank < vars || (rank..rows).any(|i| system[[i, vars]].abs() > tolerance) {
        return None;
    }
    Some(system.slice(s![0..vars, vars]).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lemke_howson;
    use ndarray_rand::RandomExt;
    use ndarray_rand::rand_distr::Uniform;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn prisoners_dilemma() -> BimatrixGame {
        BimatrixGame::new(array![[3., 0.], [5., 1.]], array![[3., 5.], [0., 1.]]).unwrap()
    }

    #[test]
    fn solve_unique_system() {
        let system = array![[2., 1., 5.], [1., -1., 1.]];
        let x = solve_unique(system, 1e-9).unwrap();

        approx::assert_abs_diff_eq!(x, array![2., 1.], epsilon = 1e-12);
    }

    #[test]
    fn solve_rejects_singular_and_inconsistent() {
        assert!(solve_unique(array![[1., 1., 1.], [2., 2., 2.]], 1e-9).is_none());
        assert!(solve_unique(array![[1., 1.], [1., 2.]], 1e-9).is_none());
        assert!(solve_unique(array![[1., 1., 1.]], 1e-9).is_none());
    }

    #[test]
    fn dominant_strategy() {
        let equilibria = enumerate_equilibria(&prisoners_dilemma()).unwrap();

        assert_eq!(
            equilibria,
            vec![Equilibrium(array![0., 1.], array![0., 1.])]
        );
    }

    #[test]
    fn tiny_payoffs() {
        let a = array![[3., 0.], [5., 1.]] * 1e-10;
        let b = array![[3., 5.], [0., 1.]] * 1e-10;
        let game = BimatrixGame::new(a, b).unwrap();

        let equilibria = enumerate_equilibria(&game).unwrap();

        assert_eq!(
            equilibria,
            vec![Equilibrium(array![0., 1.], array![0., 1.])]
        );
    }

    #[test]
    fn matching_pennies() {
        let a = array![[1., -1.], [-1., 1.]];
        let b = -&a;
        let game = BimatrixGame::new(a, b).unwrap();

        let equilibria = enumerate_equilibria(&game).unwrap();

        assert_eq!(equilibria.len(), 1);
        approx::assert_abs_diff_eq!(equilibria[0].0, array![0.5, 0.5], epsilon = 1e-9);
        approx::assert_abs_diff_eq!(equilibria[0].1, array![0.5, 0.5], epsilon = 1e-9);
    }

    #[test]
    fn coordination_game() {
        let a = array![[2., 0.], [0., 1.]];
        let game = BimatrixGame::new(a.clone(), a).unwrap();

        let equilibria = enumerate_equilibria(&game).unwrap();

        assert_eq!(
            equilibria,
            vec![
                Equilibrium(array![1., 0.], array![1., 0.]),
                Equilibrium(array![0., 1.], array![0., 1.]),
                Equilibrium(array![1. / 3., 2. / 3.], array![1. / 3., 2. / 3.]),
            ]
        );
    }

    #[test]
    fn three_equilibria() {
        let a = array![[3., 3.], [2., 5.], [0., 6.]];
        let b = array![[3., 2.], [2., 6.], [3., 1.]];
        let game = BimatrixGame::new(a, b).unwrap();

        let equilibria = enumerate_equilibria(&game).unwrap();

        assert_eq!(
            equilibria,
            vec![
                Equilibrium(array![1., 0., 0.], array![1., 0.]),
                Equilibrium(array![0.8, 0.2, 0.], array![2. / 3., 1. / 3.]),
                Equilibrium(array![0., 1. / 3., 2. / 3.], array![1. / 3., 2. / 3.]),
            ]
        );
    }

    #[test]
    fn degenerate_constant_game() {
        let a = array![[1., 1.], [1., 1.]];
        let game = BimatrixGame::new(a.clone(), a).unwrap();

        let equilibria = enumerate_equilibria(&game).unwrap();

        assert_eq!(equilibria.len(), 4);
        assert!(equilibria.iter().all(|eq| game.is_ne(eq, 1e-9)));
    }

    #[test]
    fn single_row() {
        let game = BimatrixGame::new(array![[1., 1.]], array![[1., 0.]]).unwrap();

        let equilibria = enumerate_equilibria(&game).unwrap();

        assert_eq!(equilibria, vec![Equilibrium(array![1.], array![1., 0.])]);
    }

    #[test]
    fn repeated_calls_agree() {
        let a = array![[1., 3., 0.], [0., 0., 2.], [2., 1., 1.]];
        let b = array![[2., 1., 0.], [1., 3., 1.], [0., 0., 3.]];
        let game = BimatrixGame::new(a, b).unwrap();

        let first = enumerate_equilibria(&game).unwrap();
        let second = enumerate_equilibria(&game).unwrap();

        assert_eq!(first.len(), second.len());
        assert!(first.iter().all(|eq| second.contains(eq)));
    }

    #[test]
    fn too_many_strategies() {
        let a = Array2::<f64>::zeros((1, 33));
        let game = BimatrixGame::new(a.clone(), a).unwrap();

        assert_eq!(
            enumerate_equilibria(&game).unwrap_err(),
            GameError::TooManyStrategies(33)
        );
    }

    #[test]
    fn lemke_howson_finds_enumerated_equilibria() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let a = Array::random_using((3, 4), Uniform::new(-5., 5.), &mut rng);
            let b = Array::random_using((3, 4), Uniform::new(-5., 5.), &mut rng);
            let game = BimatrixGame::new(a, b).unwrap();
            let equilibria = enumerate_equilibria(&game).unwrap();

            assert_eq!(equilibria.len() % 2, 1);
            assert!(equilibria.iter().all(|eq| game.is_ne(eq, 1e-7)));
            for label in 0..game.total_strategies() {
                let eq = lemke_howson(&game, label).unwrap();
                assert!(equilibria.contains(&eq));
            }
        }
    }
}
