use std::cmp::Ordering;
use std::ops::Range;

use log::{debug, warn};
use ndarray::Zip;
use ndarray::prelude::*;

use super::{BimatrixGame, Equilibrium, GameError};

/// Maximum number of pivots used by [`lemke_howson`].
pub const DEFAULT_PIVOT_BUDGET: usize = 10_000;

const PIVOT_TOLERANCE: f64 = 1e-12;

/// Dictionary of one best response polytope.
///
/// Variables are numbered so that `v` and `-v` are complementary: `i + 1` is
/// the probability of row action `i`, `m + j + 1` the probability of column
/// action `j`, and the negative numbers are the slacks carrying the same
/// labels. Column `|v|` of `coefficients` holds the coefficient of `v`;
/// column 0 is the constant term.
struct Tableau {
    basis: Vec<isize>,
    coefficients: Array2<f64>,
    slacks: Range<usize>,
}

struct Tableaux(Tableau, Tableau);

impl Tableau {
    /// Lexicographic key of a candidate row: the constant term followed by
    /// the perturbation terms of the slacks, all divided by the entering
    /// coefficient.
    fn ratio_key(&self, row: usize, e_var_col: usize) -> Vec<f64> {
        let coefficients = self.coefficients.row(row);
        let divisor = -coefficients[e_var_col];
        let mut key = Vec::with_capacity(self.slacks.len() + 1);
        key.push(coefficients[0] / divisor);
        for col in self.slacks.clone() {
            let perturbation = if self.basis[row] == -(col as isize) {
                1.
            } else {
                -coefficients[col]
            };
            key.push(perturbation / divisor);
        }
        key
    }
}

fn lexicographic_cmp(a: &[f64], b: &[f64]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        if *x < *y - PIVOT_TOLERANCE {
            return Ordering::Less;
        }
        if *x > *y + PIVOT_TOLERANCE {
            return Ordering::Greater;
        }
    }
    Ordering::Equal
}

impl Tableaux {
    fn new(game: &BimatrixGame) -> Tableaux {
        let num_strategies = game.num_strategies();
        let num_labels = game.total_strategies();
        let mut tableaux = Tableaux(
            Tableau {
                basis: (-(num_strategies.0 as isize)..=-1).rev().collect(),
                coefficients: Array2::<f64>::zeros((num_strategies.0, num_labels + 1)),
                slacks: 1..num_strategies.0 + 1,
            },
            Tableau {
                basis: (-(num_labels as isize)..-(num_strategies.0 as isize))
                    .rev()
                    .collect(),
                coefficients: Array2::<f64>::zeros((num_strategies.1, num_labels + 1)),
                slacks: num_strategies.0 + 1..num_labels + 1,
            },
        );

        tableaux.0.coefficients.column_mut(0).fill(1.);
        tableaux.1.coefficients.column_mut(0).fill(1.);

        Zip::from(&mut tableaux.0.coefficients.slice_mut(s![
            0..num_strategies.0,
            num_strategies.0 + 1..num_labels + 1
        ]))
        .and(game.payoff_matrix(0))
        .for_each(|a, b| *a = -b);

        Zip::from(
            &mut tableaux
                .1
                .coefficients
                .slice_mut(s![0..num_strategies.1, 1..num_strategies.0 + 1]),
        )
        .and(game.payoff_matrix(1).t())
        .for_each(|a, b| *a = -b);

        tableaux
    }

    fn get_tableau(&mut self, var: isize) -> &mut Tableau {
        let rows0 = self.0.basis.len() as isize;
        let rows1 = self.1.basis.len() as isize;
        let total = rows0 + rows1;

        if (0 < var && var <= rows0) || (-total <= var && var < -rows0) {
            return &mut self.1;
        }
        &mut self.0
    }

    /// Brings `e_var` into the basis and returns the variable that leaves it,
    /// or `None` when no row bounds the entering variable.
    fn pivot(&mut self, e_var: isize) -> Option<isize> {
        let t = self.get_tableau(e_var);
        let e_var_col = e_var.unsigned_abs();

        let min_row = (0..t.basis.len())
            .filter(|&i| t.coefficients[[i, e_var_col]] < -PIVOT_TOLERANCE)
            .map(|i| (i, t.ratio_key(i, e_var_col)))
            .min_by(|(_, a), (_, b)| lexicographic_cmp(a, b))
            .map(|(i, _)| i)?;

        let l_var = t.basis[min_row];
        t.basis[min_row] = e_var;
        let l_var_col = l_var.unsigned_abs();
        let e_var_coeff = -t.coefficients[[min_row, e_var_col]];
        t.coefficients[[min_row, l_var_col]] = -1.;
        t.coefficients[[min_row, e_var_col]] = 0.;

        t.coefficients
            .row_mut(min_row)
            .iter_mut()
            .for_each(|b| *b /= e_var_coeff);

        let r = t.coefficients.row(min_row).into_owned();
        for mut row in t.coefficients.rows_mut() {
            let e_var_coeff = row[e_var_col];
            row.scaled_add(e_var_coeff, &r);
            row[e_var_col] = 0.;
        }

        Some(l_var)
    }

    /// Values of the basic probability variables, indexed by label.
    fn vertex(&self, total: usize) -> Array1<f64> {
        let mut sorted = Array1::zeros(total);
        for t in [&self.0, &self.1] {
            for (i, v) in t.basis.iter().enumerate() {
                if *v > 0 {
                    sorted[(*v - 1) as usize] = t.coefficients[[i, 0]].max(0.);
                }
            }
        }
        sorted
    }
}

/// One equilibrium of `game` found by complementary pivoting after dropping
/// `label`, with the default pivot budget.
///
/// Labels `0..m` are the row actions and `m..m + n` the column actions.
pub fn lemke_howson(game: &BimatrixGame, label: usize) -> Result<Equilibrium, GameError> {
    lemke_howson_with_budget(game, label, DEFAULT_PIVOT_BUDGET)
}

pub fn lemke_howson_with_budget(
    game: &BimatrixGame,
    label: usize,
    max_pivots: usize,
) -> Result<Equilibrium, GameError> {
    let total = game.total_strategies();
    if label >= total {
        return Err(GameError::InvalidLabel { label, total });
    }

    let shifted = game.shifted_positive();
    let mut t = Tableaux::new(&shifted);
    let init_e_var = label as isize + 1;
    let mut e_var = init_e_var;
    let mut pivots = 0;
    loop {
        if pivots == max_pivots {
            warn!("Lemke-Howson from label {label} exhausted {max_pivots} pivots");
            return Err(GameError::PivotBudgetExhausted {
                label,
                pivots: max_pivots,
            });
        }
        let l_var = t
            .pivot(e_var)
            .ok_or(GameError::UnboundedPivot { label, var: e_var })?;
        pivots += 1;
        debug!("pivot {pivots}: {e_var} enters, {l_var} leaves");
        if l_var.abs() == init_e_var {
            break;
        }
        e_var = -l_var;
    }

    let sorted = t.vertex(total);
    let m = game.num_strategies_player(0);
    let eq1 = sorted.slice(s![0..m]);
    let eq2 = sorted.slice(s![m..total]);
    let (sum1, sum2) = (eq1.sum(), eq2.sum());
    if sum1 <= 0. || sum2 <= 0. {
        return Err(GameError::NotAnEquilibrium { label });
    }
    let eq = Equilibrium(&eq1 / sum1, &eq2 / sum2);
    if !shifted.is_ne(&eq, 1e-6) {
        warn!("Lemke-Howson from label {label} ended on a vertex that is not an equilibrium");
        return Err(GameError::NotAnEquilibrium { label });
    }
    debug!("Lemke-Howson from label {label} finished after {pivots} pivots");
    Ok(eq)
}
