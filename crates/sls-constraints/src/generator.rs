//! The shared constraint-generation capability and the closed set of
//! generator kinds an assembler can hold.

use sls_core::config::ConstraintConfig;
use sls_core::constraint::Constraint;
use sls_core::convex::ConvexExpr;
use sls_core::error::SlsError;
use sls_core::problem::SlsProblem;
use tracing::debug;

use crate::approx::ApproxLocalized;
use crate::localized::LocalizedSupport;
use crate::support::LocalityParams;

// ---------------------------------------------------------------------------
// ConstraintGenerator
// ---------------------------------------------------------------------------

/// Something that contributes constraints and objective terms to an SLS
/// problem.
///
/// The objective and the constraint accumulator are threaded through by
/// value; implementations return the (possibly extended) pair. The provided
/// `apply` is the identity.
pub trait ConstraintGenerator {
    /// Add this generator's contribution.
    fn apply(
        &mut self,
        _problem: &mut SlsProblem,
        objective: ConvexExpr,
        constraints: Vec<Constraint>,
    ) -> Result<(ConvexExpr, Vec<Constraint>), SlsError> {
        Ok((objective, constraints))
    }

    /// Human-readable name for this generator.
    fn name(&self) -> &str;
}

/// Generator that leaves the objective and constraints untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BaseConstraint;

impl ConstraintGenerator for BaseConstraint {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "BaseConstraint"
    }
}

// ---------------------------------------------------------------------------
// SlsConstraint
// ---------------------------------------------------------------------------

/// Every constraint kind the assembler can configure.
#[derive(Clone, Debug)]
pub enum SlsConstraint {
    Base(BaseConstraint),
    Localized(LocalizedSupport),
    ApproxLocalized(ApproxLocalized),
}

impl SlsConstraint {
    /// Build a generator from its configuration entry.
    pub fn from_config(config: &ConstraintConfig) -> Result<Self, SlsError> {
        Ok(match *config {
            ConstraintConfig::Base => Self::Base(BaseConstraint),
            ConstraintConfig::Localized {
                act_delay,
                comm_speed,
                locality,
            } => Self::Localized(LocalizedSupport::new(LocalityParams::new(
                act_delay, comm_speed, locality,
            )?)),
            ConstraintConfig::ApproxLocalized {
                robustness,
                act_delay,
                comm_speed,
                locality,
            } => Self::ApproxLocalized(ApproxLocalized::new(
                LocalityParams::new(act_delay, comm_speed, locality)?,
                robustness,
            )?),
        })
    }

    /// Stability margin of an approximate generator that has run.
    pub fn stability_margin(&self) -> Option<&ConvexExpr> {
        match self {
            Self::ApproxLocalized(g) => g.stability_margin(),
            Self::Base(_) | Self::Localized(_) => None,
        }
    }
}

impl From<BaseConstraint> for SlsConstraint {
    fn from(g: BaseConstraint) -> Self {
        Self::Base(g)
    }
}

impl From<LocalizedSupport> for SlsConstraint {
    fn from(g: LocalizedSupport) -> Self {
        Self::Localized(g)
    }
}

impl From<ApproxLocalized> for SlsConstraint {
    fn from(g: ApproxLocalized) -> Self {
        Self::ApproxLocalized(g)
    }
}

impl ConstraintGenerator for SlsConstraint {
    fn apply(
        &mut self,
        problem: &mut SlsProblem,
        objective: ConvexExpr,
        constraints: Vec<Constraint>,
    ) -> Result<(ConvexExpr, Vec<Constraint>), SlsError> {
        match self {
            Self::Base(g) => g.apply(problem, objective, constraints),
            Self::Localized(g) => g.apply(problem, objective, constraints),
            Self::ApproxLocalized(g) => g.apply(problem, objective, constraints),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Base(g) => g.name(),
            Self::Localized(g) => g.name(),
            Self::ApproxLocalized(g) => g.name(),
        }
    }
}

/// Apply each generator in order, threading the objective and constraints.
pub fn apply_all(
    generators: &mut [SlsConstraint],
    problem: &mut SlsProblem,
    objective: ConvexExpr,
    constraints: Vec<Constraint>,
) -> Result<(ConvexExpr, Vec<Constraint>), SlsError> {
    generators
        .iter_mut()
        .try_fold((objective, constraints), |(objective, constraints), g| {
            debug!(generator = g.name(), before = constraints.len(), "Applying generator");
            g.apply(problem, objective, constraints)
        })
}
