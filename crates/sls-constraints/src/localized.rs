//! Localized support constraints: zero every impulse-response entry that
//! falls outside the communication/locality support.

use std::sync::Arc;

use sls_core::constraint::Constraint;
use sls_core::convex::ConvexExpr;
use sls_core::error::SlsError;
use sls_core::expr::MatrixVar;
use sls_core::model::SystemModel;
use sls_core::problem::SlsProblem;
use tracing::{debug, info};

use crate::generator::ConstraintGenerator;
use crate::support::{BoolMatrix, LocalityParams, SupportPattern};

/// Support pattern computed for one (model, horizon) pair.
#[derive(Clone, Debug)]
struct CachedSupport {
    model: Arc<SystemModel>,
    horizon: usize,
    pattern: Arc<SupportPattern>,
}

/// Emits `Phi_x[t][i, j] == 0` for `t` in `1..T-1` and `Phi_u[t][i, j] == 0`
/// for every `t`, wherever the entry lies outside the support.
///
/// The endpoints of `Phi_x` are left alone; their boundary values belong to
/// whichever generator fixes them.
#[derive(Clone, Debug, Default)]
pub struct LocalizedSupport {
    params: LocalityParams,
    cache: Option<CachedSupport>,
}

impl LocalizedSupport {
    pub const fn new(params: LocalityParams) -> Self {
        Self {
            params,
            cache: None,
        }
    }

    /// Fresh generator with the same parameters as `prototype`.
    pub const fn from_prototype(prototype: &Self) -> Self {
        Self::new(prototype.params)
    }

    pub const fn params(&self) -> &LocalityParams {
        &self.params
    }

    /// Support pattern for `problem`, reusing the cached one when the model
    /// and horizon are unchanged.
    pub fn support(&mut self, problem: &SlsProblem) -> Arc<SupportPattern> {
        if let Some(cached) = &self.cache {
            if Arc::ptr_eq(&cached.model, problem.model()) && cached.horizon == problem.horizon() {
                debug!(horizon = cached.horizon, "Reusing cached support pattern");
                return Arc::clone(&cached.pattern);
            }
        }

        let pattern = Arc::new(SupportPattern::compute(
            problem.model(),
            problem.horizon(),
            &self.params,
        ));
        debug!(
            horizon = problem.horizon(),
            locality = self.params.locality(),
            act_delay = self.params.act_delay(),
            comm_speed = self.params.comm_speed(),
            "Computed support pattern"
        );
        self.cache = Some(CachedSupport {
            model: Arc::clone(problem.model()),
            horizon: problem.horizon(),
            pattern: Arc::clone(&pattern),
        });
        pattern
    }
}

/// Push `var[i, j] == 0` for every entry outside `mask`, row-major.
fn zero_outside(mask: &BoolMatrix, var: &MatrixVar, out: &mut Vec<Constraint>) -> usize {
    let mut emitted = 0;
    for i in 0..mask.nrows() {
        for j in 0..mask.ncols() {
            if !mask[(i, j)] {
                out.push(Constraint::entry_zero(var.entry(i, j)));
                emitted += 1;
            }
        }
    }
    emitted
}

impl ConstraintGenerator for LocalizedSupport {
    fn apply(
        &mut self,
        problem: &mut SlsProblem,
        objective: ConvexExpr,
        mut constraints: Vec<Constraint>,
    ) -> Result<(ConvexExpr, Vec<Constraint>), SlsError> {
        problem.check_shapes()?;
        let pattern = self.support(problem);
        let horizon = problem.horizon();

        let mut zeroed_x = 0;
        for t in 1..horizon.saturating_sub(1) {
            zeroed_x += zero_outside(pattern.x(t), &problem.phi_x()[t], &mut constraints);
        }
        let mut zeroed_u = 0;
        for t in 0..horizon {
            zeroed_u += zero_outside(pattern.u(t), &problem.phi_u()[t], &mut constraints);
        }

        info!(
            horizon,
            zeroed_x,
            zeroed_u,
            total = constraints.len(),
            "Added localized support constraints"
        );
        Ok((objective, constraints))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "LocalizedSupport"
    }
}
