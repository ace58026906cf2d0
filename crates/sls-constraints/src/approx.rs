//! Approximate localized constraints.
//!
//! Instead of requiring `Phi_x[t+1] = A Phi_x[t] + B2 Phi_u[t]` exactly, the
//! mismatch is captured by an auxiliary variable
//!
//! ```text
//! Delta = [Δ_0, Δ_1, ..., Δ_{T-1}],   Δ_t = Phi_x[t+1] - A Phi_x[t] - B2 Phi_u[t]
//! ```
//!
//! whose induced infinity norm is added to the objective with weight
//! `robustness`. A solved margin `‖Delta‖_∞ < 1` is sufficient evidence that
//! the resulting localized controller stabilizes the plant; it is a soft
//! penalty, not a hard constraint. The last block of `Delta` is left free.

use std::sync::Arc;

use nalgebra::DMatrix;
use sls_core::assignment::Assignment;
use sls_core::constraint::Constraint;
use sls_core::convex::ConvexExpr;
use sls_core::error::{ParameterError, SlsError};
use sls_core::expr::MatrixVar;
use sls_core::problem::SlsProblem;
use tracing::{debug, info};

use crate::generator::ConstraintGenerator;
use crate::localized::LocalizedSupport;
use crate::support::LocalityParams;

/// Localized constraints plus boundary conditions, residual variable and
/// stability-margin penalty.
#[derive(Clone, Debug, Default)]
pub struct ApproxLocalized {
    localized: LocalizedSupport,
    robustness: f64,
    margin: Option<ConvexExpr>,
    delta: Option<MatrixVar>,
}

fn check_robustness(robustness: f64) -> Result<f64, ParameterError> {
    if robustness.is_finite() && robustness >= 0.0 {
        Ok(robustness)
    } else {
        Err(ParameterError::Robustness(robustness))
    }
}

impl ApproxLocalized {
    pub fn new(params: LocalityParams, robustness: f64) -> Result<Self, ParameterError> {
        Ok(Self {
            localized: LocalizedSupport::new(params),
            robustness: check_robustness(robustness)?,
            margin: None,
            delta: None,
        })
    }

    /// Fresh generator with the parameters and robustness of `prototype`.
    pub fn from_prototype(prototype: &Self) -> Self {
        Self {
            localized: LocalizedSupport::from_prototype(&prototype.localized),
            robustness: prototype.robustness,
            margin: None,
            delta: None,
        }
    }

    /// Share the locality configuration of an existing localized generator.
    pub fn from_localized(base: &LocalizedSupport, robustness: f64) -> Result<Self, ParameterError> {
        Self::new(*base.params(), robustness)
    }

    /// Copy of `self`'s configuration with a different robustness weight.
    pub fn with_robustness(&self, robustness: f64) -> Result<Self, ParameterError> {
        Self::new(*self.params(), robustness)
    }

    pub const fn params(&self) -> &LocalityParams {
        self.localized.params()
    }

    pub const fn robustness(&self) -> f64 {
        self.robustness
    }

    /// `‖Delta‖_∞` from the most recent call; `None` before the first one.
    pub const fn stability_margin(&self) -> Option<&ConvexExpr> {
        self.margin.as_ref()
    }

    /// The residual variable `Delta` from the most recent call.
    pub const fn residual_variable(&self) -> Option<&MatrixVar> {
        self.delta.as_ref()
    }

    /// Numeric stability margin under a solved assignment.
    pub fn margin_value(&self, values: &Assignment) -> Result<f64, SlsError> {
        let margin = self.margin.as_ref().ok_or(SlsError::MarginUnavailable)?;
        Ok(margin.evaluate(values)?)
    }

    /// Whether the solved margin is below one.
    pub fn certifies_stability(&self, values: &Assignment) -> Result<bool, SlsError> {
        Ok(self.margin_value(values)? < 1.0)
    }

    /// Store in `values` the `Delta` implied by the `Phi_x`/`Phi_u` values
    /// already present, with the trailing free block set to zero.
    pub fn residual_assignment(
        &self,
        problem: &SlsProblem,
        values: &mut Assignment,
    ) -> Result<(), SlsError> {
        let delta = self.delta.as_ref().ok_or(SlsError::MarginUnavailable)?;
        let model = problem.model();
        let nx = problem.nx();
        let mut value = DMatrix::zeros(nx, nx * problem.horizon());
        for t in 0..problem.horizon().saturating_sub(1) {
            let x_t = problem.phi_x()[t].to_affine().evaluate(values)?;
            let x_next = problem.phi_x()[t + 1].to_affine().evaluate(values)?;
            let u_t = problem.phi_u()[t].to_affine().evaluate(values)?;
            let block = x_next - model.a() * x_t - model.b2() * u_t;
            value.view_mut((0, t * nx), (nx, nx)).copy_from(&block);
        }
        values.set(delta, value)?;
        Ok(())
    }
}

impl ConstraintGenerator for ApproxLocalized {
    fn apply(
        &mut self,
        problem: &mut SlsProblem,
        objective: ConvexExpr,
        constraints: Vec<Constraint>,
    ) -> Result<(ConvexExpr, Vec<Constraint>), SlsError> {
        problem.check_shapes()?;
        let nx = problem.nx();
        let horizon = problem.horizon();

        if !constraints.is_empty() {
            debug!(
                discarded = constraints.len(),
                "Resetting caller constraints for approximate localization"
            );
        }

        let seeded = vec![
            Constraint::fix(&problem.phi_x()[0], &DMatrix::identity(nx, nx))?,
            Constraint::fix(&problem.phi_x()[horizon - 1], &DMatrix::zeros(nx, nx))?,
        ];
        let (objective, mut constraints) = self.localized.apply(problem, objective, seeded)?;

        let delta = problem.new_variable("Delta", nx, nx * horizon);
        let delta_expr = delta.to_affine();
        let model = Arc::clone(problem.model());
        for t in 0..horizon - 1 {
            let next = problem.phi_x()[t + 1].to_affine();
            let ax = problem.phi_x()[t].to_affine().premultiply(model.a())?;
            let bu = problem.phi_u()[t].to_affine().premultiply(model.b2())?;
            let residual = next.try_sub(&ax)?.try_sub(&bu)?;
            constraints.push(Constraint::equality(
                delta_expr.block(0, t * nx, nx, nx)?,
                residual,
            )?);
        }

        let margin = ConvexExpr::induced_inf_norm(delta_expr);
        let objective = objective.plus(margin.clone().scaled(self.robustness)?);

        info!(
            horizon,
            robustness = self.robustness,
            total = constraints.len(),
            "Added approximate localized constraints"
        );
        self.margin = Some(margin);
        self.delta = Some(delta);
        Ok((objective, constraints))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ApproxLocalized"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sls_core::model::SystemModel;

    fn chain_problem(horizon: usize) -> SlsProblem {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 1.0, 1.0]);
        let model = Arc::new(SystemModel::fully_actuated(a).unwrap());
        SlsProblem::new(model, horizon).unwrap()
    }

    fn approx_localized(robustness: f64) -> ApproxLocalized {
        ApproxLocalized::new(LocalityParams::new(0, 1.0, 2).unwrap(), robustness).unwrap()
    }

    #[test]
    fn margin_absent_before_first_call() {
        let generator = approx_localized(1.0);
        assert!(generator.stability_margin().is_none());
        assert!(matches!(
            generator.margin_value(&Assignment::new()),
            Err(SlsError::MarginUnavailable)
        ));
    }

    #[test]
    fn rejects_negative_robustness() {
        let err = ApproxLocalized::new(LocalityParams::default(), -1.0).unwrap_err();
        assert_eq!(err, ParameterError::Robustness(-1.0));
    }

    #[test]
    fn seeds_boundary_and_discards_caller_constraints() {
        let mut problem = chain_problem(3);
        let stale = Constraint::entry_zero(problem.phi_u()[0].entry(1, 1));
        let mut generator = approx_localized(1.0);
        let (_, constraints) = generator
            .apply(&mut problem, ConvexExpr::zero(), vec![stale.clone()])
            .unwrap();

        assert!(!constraints.contains(&stale));
        assert_eq!(
            constraints[0],
            Constraint::fix(&problem.phi_x()[0], &DMatrix::identity(2, 2)).unwrap()
        );
        assert_eq!(
            constraints[1],
            Constraint::fix(&problem.phi_x()[2], &DMatrix::zeros(2, 2)).unwrap()
        );
    }

    #[test]
    fn keeps_locality_constraints_from_nested_call() {
        let mut problem = chain_problem(3);
        let mut generator = approx_localized(1.0);
        let (_, constraints) = generator
            .apply(&mut problem, ConvexExpr::zero(), Vec::new())
            .unwrap();

        let zero_x1 = Constraint::entry_zero(problem.phi_x()[1].entry(0, 1));
        assert!(constraints.contains(&zero_x1));
        // 2 boundary + 4 locality + 2 residual blocks
        assert_eq!(constraints.len(), 8);
    }

    #[test]
    fn delta_spans_full_horizon() {
        let mut problem = chain_problem(4);
        let mut generator = approx_localized(0.0);
        generator
            .apply(&mut problem, ConvexExpr::zero(), Vec::new())
            .unwrap();
        let delta = generator.residual_variable().unwrap();
        assert_eq!(delta.shape(), (2, 8));
        assert!(generator.stability_margin().is_some());
    }

    #[test]
    fn residual_assignment_satisfies_delta_constraints() {
        let mut problem = chain_problem(3);
        let mut generator = approx_localized(1.0);
        let (_, constraints) = generator
            .apply(&mut problem, ConvexExpr::zero(), Vec::new())
            .unwrap();

        let mut values = Assignment::new();
        for (t, v) in problem.phi_x().iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let scale = t as f64 + 1.0;
            values.set(v, DMatrix::from_element(2, 2, scale)).unwrap();
        }
        for v in problem.phi_u() {
            values.set(v, DMatrix::from_element(2, 2, 0.5)).unwrap();
        }
        generator.residual_assignment(&problem, &mut values).unwrap();

        let delta_id = generator.residual_variable().unwrap().id();
        for c in constraints.iter().filter(|c| c.involves(delta_id)) {
            assert!(c.is_satisfied(&values, 1e-12).unwrap());
        }

        // Δ_0 = 2·1 - A·1 - 0.5 = [[0.5, 0.5], [-0.5, -0.5]]; ‖Δ‖_∞ ≥ 1
        let margin = generator.margin_value(&values).unwrap();
        assert!(margin >= 1.0);
        assert!(!generator.certifies_stability(&values).unwrap());
    }

    #[test]
    fn zero_robustness_adds_zero_weighted_margin() {
        let mut problem = chain_problem(3);
        let mut generator = approx_localized(0.0);
        let (objective, _) = generator
            .apply(&mut problem, ConvexExpr::constant(2.0), Vec::new())
            .unwrap();

        let mut values = Assignment::new();
        for v in problem.phi_x().iter().chain(problem.phi_u()) {
            values.set(v, DMatrix::from_element(2, 2, 3.0)).unwrap();
        }
        generator.residual_assignment(&problem, &mut values).unwrap();
        assert_relative_eq!(objective.evaluate(&values).unwrap(), 2.0);
    }

    #[test]
    fn prototype_and_override_builders() {
        let proto = ApproxLocalized::new(LocalityParams::new(2, 0.5, 3).unwrap(), 7.5).unwrap();
        let copy = ApproxLocalized::from_prototype(&proto);
        assert_eq!(copy.params(), proto.params());
        assert_eq!(copy.robustness(), 7.5);

        let heavier = proto.with_robustness(15.0).unwrap();
        assert_eq!(heavier.params(), proto.params());
        assert_eq!(heavier.robustness(), 15.0);

        let base = LocalizedSupport::new(LocalityParams::new(1, 2.0, 4).unwrap());
        let shared = ApproxLocalized::from_localized(&base, 1.0).unwrap();
        assert_eq!(shared.params(), base.params());
    }
}
