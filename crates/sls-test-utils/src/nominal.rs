//! Assignments satisfying `Phi_x[t+1] = A Phi_x[t] + B2 Phi_u[t]` exactly.

use nalgebra::DMatrix;
use rand::Rng;
use sls_core::assignment::Assignment;
use sls_core::problem::SlsProblem;

use crate::rng::seeded_rng;

/// Values for every `Phi_x`/`Phi_u` of `problem`: `Phi_x[0] = I`, random
/// `Phi_u[t]` drawn from `seed`, and `Phi_x` propagated by the plant.
pub fn nominal_assignment(problem: &SlsProblem, seed: u64) -> Assignment {
    let mut rng = seeded_rng(seed);
    let model = problem.model();
    let (nx, nu) = (problem.nx(), problem.nu());

    let mut values = Assignment::new();
    let mut x = DMatrix::<f64>::identity(nx, nx);
    for t in 0..problem.horizon() {
        let u = DMatrix::from_fn(nu, nx, |_, _| rng.gen_range(-1.0..1.0));
        values
            .set(&problem.phi_x()[t], x.clone())
            .expect("Phi_x shape");
        values
            .set(&problem.phi_u()[t], u.clone())
            .expect("Phi_u shape");
        x = model.a() * &x + model.b2() * &u;
    }
    values
}
