//! Equality constraints on decision variables.

use nalgebra::DMatrix;

use crate::assignment::Assignment;
use crate::error::{EvalError, ShapeError};
use crate::expr::{AffineExpr, AffineMatrix, Entry, MatrixVar, VarId};

/// An equality assertion on a variable entry or on an affine sub-block.
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    /// `var[row, col] == 0`.
    EntryZero(Entry),
    /// `lhs == rhs`, both of the same shape.
    Equality { lhs: AffineMatrix, rhs: AffineMatrix },
}

impl Constraint {
    pub const fn entry_zero(entry: Entry) -> Self {
        Self::EntryZero(entry)
    }

    /// `lhs == rhs`, failing fast if the shapes differ.
    pub fn equality(lhs: AffineMatrix, rhs: AffineMatrix) -> Result<Self, ShapeError> {
        if lhs.shape() != rhs.shape() {
            return Err(ShapeError::Operands {
                lhs_rows: lhs.nrows(),
                lhs_cols: lhs.ncols(),
                rhs_rows: rhs.nrows(),
                rhs_cols: rhs.ncols(),
            });
        }
        Ok(Self::Equality { lhs, rhs })
    }

    /// `var == value` for a constant matrix.
    pub fn fix(var: &MatrixVar, value: &DMatrix<f64>) -> Result<Self, ShapeError> {
        Self::equality(var.to_affine(), AffineMatrix::from_constant(value))
    }

    /// Number of scalar equalities this constraint stands for.
    pub fn scalar_count(&self) -> usize {
        match self {
            Self::EntryZero(_) => 1,
            Self::Equality { lhs, .. } => lhs.nrows() * lhs.ncols(),
        }
    }

    /// Whether `var` appears in the constraint.
    pub fn involves(&self, var: VarId) -> bool {
        match self {
            Self::EntryZero(e) => e.var == var,
            Self::Equality { lhs, rhs } => lhs
                .iter()
                .chain(rhs.iter())
                .any(|e| e.terms().any(|(entry, _)| entry.var == var)),
        }
    }

    /// `lhs - rhs` as an affine matrix; the constraint holds when it is zero.
    pub fn residual(&self) -> Result<AffineMatrix, ShapeError> {
        match self {
            Self::EntryZero(e) => Ok(AffineMatrix::from_scalar(AffineExpr::entry(*e))),
            Self::Equality { lhs, rhs } => lhs.try_sub(rhs),
        }
    }

    /// Largest absolute residual entry under `values`.
    pub fn max_violation(&self, values: &Assignment) -> Result<f64, EvalError> {
        match self {
            Self::EntryZero(e) => Ok(values.value(*e)?.abs()),
            Self::Equality { lhs, rhs } => {
                let l = lhs.evaluate(values)?;
                let r = rhs.evaluate(values)?;
                Ok((l - r).iter().fold(0.0, |acc, v| acc.max(v.abs())))
            }
        }
    }

    pub fn is_satisfied(&self, values: &Assignment, tol: f64) -> Result<bool, EvalError> {
        Ok(self.max_violation(values)? <= tol)
    }
}
