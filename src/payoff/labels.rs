use std::collections::BTreeMap;
use std::fmt;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use super::PdPayoffs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "C")]
    Cooperate,
    #[serde(rename = "D")]
    Defect,
}

impl Action {
    pub const ALL: [Action; 2] = [Action::Cooperate, Action::Defect];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Cooperate => write!(f, "C"),
            Action::Defect => write!(f, "D"),
        }
    }
}

/// Name of the payoff the row player receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    R,
    S,
    T,
    P,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledOutcome {
    pub role: Role,
    pub payoff: (f64, f64),
}

/// One entry of the labeled table as written to JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledRecord {
    pub row_action: Action,
    pub col_action: Action,
    pub role: Role,
    pub payoff: (f64, f64),
}

pub fn label_pd(pay: &PdPayoffs) -> BTreeMap<(Action, Action), LabeledOutcome> {
    use Action::*;

    let outcome = |role, payoff| LabeledOutcome { role, payoff };
    BTreeMap::from([
        ((Cooperate, Cooperate), outcome(Role::R, (pay.r, pay.r))),
        ((Cooperate, Defect), outcome(Role::S, (pay.s, pay.t))),
        ((Defect, Cooperate), outcome(Role::T, (pay.t, pay.s))),
        ((Defect, Defect), outcome(Role::P, (pay.p, pay.p))),
    ])
}

/// Labeled table as an ordered list, since action pairs are not JSON keys.
pub fn labeled_records(pay: &PdPayoffs) -> Vec<LabeledRecord> {
    label_pd(pay)
        .into_iter()
        .map(|((row_action, col_action), outcome)| LabeledRecord {
            row_action,
            col_action,
            role: outcome.role,
            payoff: outcome.payoff,
        })
        .collect()
}

/// Probabilities of a dilemma strategy keyed by action, or `None` when the
/// strategy does not have exactly two actions.
pub fn action_probabilities(strategy: ArrayView1<f64>) -> Option<BTreeMap<Action, f64>> {
    (strategy.len() == Action::ALL.len())
        .then(|| Action::ALL.into_iter().zip(strategy.iter().copied()).collect())
}
