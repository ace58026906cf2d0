//! FIR-truncated SLS problem: impulse-response variables over a horizon.

use std::sync::Arc;

use crate::error::{ParameterError, ShapeError, SlsError};
use crate::expr::{MatrixVar, VarId};
use crate::model::SystemModel;

/// Decision variables `Phi_x[0..T]` (Nx×Nx) and `Phi_u[0..T]` (Nu×Nx) for
/// a shared [`SystemModel`].
///
/// Generators read shapes from it, allocate auxiliary variables through
/// [`new_variable`](Self::new_variable) and never touch the model.
#[derive(Clone, Debug)]
pub struct SlsProblem {
    model: Arc<SystemModel>,
    horizon: usize,
    phi_x: Vec<MatrixVar>,
    phi_u: Vec<MatrixVar>,
    next_id: usize,
}

impl SlsProblem {
    /// Allocate `Phi_x` and `Phi_u` for an FIR horizon of `horizon` steps.
    pub fn new(model: Arc<SystemModel>, horizon: usize) -> Result<Self, SlsError> {
        if horizon == 0 {
            return Err(ParameterError::Horizon(horizon).into());
        }
        let (nx, nu) = (model.nx(), model.nu());
        let mut problem = Self {
            model,
            horizon,
            phi_x: Vec::with_capacity(horizon),
            phi_u: Vec::with_capacity(horizon),
            next_id: 0,
        };
        for t in 0..horizon {
            let x = problem.new_variable(format!("Phi_x[{t}]"), nx, nx);
            problem.phi_x.push(x);
        }
        for t in 0..horizon {
            let u = problem.new_variable(format!("Phi_u[{t}]"), nu, nx);
            problem.phi_u.push(u);
        }
        Ok(problem)
    }

    /// Reassemble a problem from previously allocated variables, checking
    /// every shape against `model`.
    pub fn from_parts(
        model: Arc<SystemModel>,
        phi_x: Vec<MatrixVar>,
        phi_u: Vec<MatrixVar>,
    ) -> Result<Self, SlsError> {
        let horizon = phi_x.len();
        if horizon == 0 {
            return Err(ParameterError::Horizon(horizon).into());
        }
        let next_id = phi_x
            .iter()
            .chain(&phi_u)
            .map(|v| v.id().0 + 1)
            .max()
            .unwrap_or(0);
        let problem = Self {
            model,
            horizon,
            phi_x,
            phi_u,
            next_id,
        };
        problem.check_shapes()?;
        Ok(problem)
    }

    /// Split into model and variables.
    pub fn into_parts(self) -> (Arc<SystemModel>, Vec<MatrixVar>, Vec<MatrixVar>) {
        (self.model, self.phi_x, self.phi_u)
    }

    /// Verify that every impulse-response variable matches the model.
    pub fn check_shapes(&self) -> Result<(), ShapeError> {
        let (nx, nu) = (self.nx(), self.nu());
        if self.phi_x.len() != self.horizon {
            return Err(ShapeError::HorizonLength {
                expected: self.horizon,
                got: self.phi_x.len(),
            });
        }
        if self.phi_u.len() != self.horizon {
            return Err(ShapeError::HorizonLength {
                expected: self.horizon,
                got: self.phi_u.len(),
            });
        }
        for (step, v) in self.phi_x.iter().enumerate() {
            if v.shape() != (nx, nx) {
                return Err(ShapeError::PhiX {
                    step,
                    expected_rows: nx,
                    expected_cols: nx,
                    rows: v.rows(),
                    cols: v.cols(),
                });
            }
        }
        for (step, v) in self.phi_u.iter().enumerate() {
            if v.shape() != (nu, nx) {
                return Err(ShapeError::PhiU {
                    step,
                    expected_rows: nu,
                    expected_cols: nx,
                    rows: v.rows(),
                    cols: v.cols(),
                });
            }
        }
        Ok(())
    }

    /// Allocate a fresh auxiliary variable.
    pub fn new_variable(&mut self, name: impl Into<String>, rows: usize, cols: usize) -> MatrixVar {
        let id = VarId(self.next_id);
        self.next_id += 1;
        MatrixVar::new(id, name, rows, cols)
    }

    pub fn model(&self) -> &Arc<SystemModel> {
        &self.model
    }

    pub const fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn nx(&self) -> usize {
        self.model.nx()
    }

    pub fn nu(&self) -> usize {
        self.model.nu()
    }

    pub fn phi_x(&self) -> &[MatrixVar] {
        &self.phi_x
    }

    pub fn phi_u(&self) -> &[MatrixVar] {
        &self.phi_u
    }

    /// Number of variables allocated so far, auxiliaries included.
    pub const fn variable_count(&self) -> usize {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn model(nx: usize, nu: usize) -> Arc<SystemModel> {
        Arc::new(SystemModel::new(DMatrix::identity(nx, nx), DMatrix::zeros(nx, nu)).unwrap())
    }

    #[test]
    fn allocates_impulse_response_variables() {
        let problem = SlsProblem::new(model(3, 2), 4).unwrap();
        assert_eq!(problem.horizon(), 4);
        assert_eq!(problem.phi_x().len(), 4);
        assert_eq!(problem.phi_u().len(), 4);
        assert_eq!(problem.phi_x()[0].shape(), (3, 3));
        assert_eq!(problem.phi_u()[3].shape(), (2, 3));
        assert_eq!(problem.phi_x()[2].name(), "Phi_x[2]");
        assert_eq!(problem.variable_count(), 8);
        assert!(problem.check_shapes().is_ok());
    }

    #[test]
    fn zero_horizon_rejected() {
        let err = SlsProblem::new(model(2, 2), 0).unwrap_err();
        assert!(matches!(
            err,
            SlsError::Parameter(ParameterError::Horizon(0))
        ));
    }

    #[test]
    fn auxiliary_ids_are_fresh() {
        let mut problem = SlsProblem::new(model(2, 1), 3).unwrap();
        let ids: Vec<_> = problem
            .phi_x()
            .iter()
            .chain(problem.phi_u())
            .map(MatrixVar::id)
            .collect();
        let delta = problem.new_variable("Delta", 2, 6);
        assert!(!ids.contains(&delta.id()));
        assert_eq!(delta.shape(), (2, 6));
    }

    #[test]
    fn from_parts_detects_model_mismatch() {
        let problem = SlsProblem::new(model(2, 1), 3).unwrap();
        let (_, phi_x, phi_u) = problem.into_parts();
        let err = SlsProblem::from_parts(model(3, 1), phi_x, phi_u).unwrap_err();
        assert!(matches!(
            err,
            SlsError::Shape(ShapeError::PhiX {
                step: 0,
                expected_rows: 3,
                rows: 2,
                ..
            })
        ));
    }

    #[test]
    fn from_parts_detects_short_input_sequence() {
        let problem = SlsProblem::new(model(2, 1), 3).unwrap();
        let (m, phi_x, mut phi_u) = problem.into_parts();
        phi_u.pop();
        let err = SlsProblem::from_parts(m, phi_x, phi_u).unwrap_err();
        assert!(matches!(
            err,
            SlsError::Shape(ShapeError::HorizonLength { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn from_parts_continues_id_allocation() {
        let problem = SlsProblem::new(model(2, 2), 2).unwrap();
        let (m, phi_x, phi_u) = problem.into_parts();
        let mut rebuilt = SlsProblem::from_parts(m, phi_x, phi_u).unwrap();
        assert_eq!(rebuilt.new_variable("aux", 1, 1).id(), VarId(4));
    }
}
