//! Canonical plants used across tests.

use std::sync::Arc;

use nalgebra::DMatrix;
use sls_core::model::SystemModel;
use sls_core::problem::SlsProblem;

/// `A = [[1, 0], [1, 1]]`, `B2 = I`: node 1 hears node 0, not the reverse.
pub fn two_node_model() -> Arc<SystemModel> {
    let a = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 1.0, 1.0]);
    Arc::new(SystemModel::fully_actuated(a).expect("square A"))
}

/// Bidirectional path of `n` nodes with self-coupling `diag` and
/// neighbour coupling `coupling`; fully actuated.
pub fn chain_model(n: usize, diag: f64, coupling: f64) -> Arc<SystemModel> {
    let a = DMatrix::from_fn(n, n, |i, j| {
        if i == j {
            diag
        } else if i.abs_diff(j) == 1 {
            coupling
        } else {
            0.0
        }
    });
    Arc::new(SystemModel::fully_actuated(a).expect("square A"))
}

/// Ring of `n` nodes where each node drives only its clockwise neighbour,
/// actuated at every other node.
pub fn ring_model(n: usize) -> Arc<SystemModel> {
    let a = DMatrix::from_fn(n, n, |i, j| {
        if i == j {
            0.9
        } else if j == (i + n - 1) % n {
            0.2
        } else {
            0.0
        }
    });
    let nu = n.div_ceil(2);
    let b2 = DMatrix::from_fn(n, nu, |i, k| if i == 2 * k { 1.0 } else { 0.0 });
    Arc::new(SystemModel::new(a, b2).expect("consistent ring"))
}

/// Problem over `model` with the given horizon.
pub fn problem_for(model: &Arc<SystemModel>, horizon: usize) -> SlsProblem {
    SlsProblem::new(Arc::clone(model), horizon).expect("positive horizon")
}
