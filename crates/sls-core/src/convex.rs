//! Convex scalar expressions used as objective values.
//!
//! The tree is closed under the operations that preserve convexity here:
//! affine terms, the induced infinity norm of an affine matrix, sums and
//! non-negative scaling.

use crate::assignment::Assignment;
use crate::error::{EvalError, ParameterError};
use crate::expr::{AffineExpr, AffineMatrix};

/// Convex scalar expression.
#[derive(Clone, Debug, PartialEq)]
pub enum ConvexExpr {
    /// Affine scalar.
    Affine(AffineExpr),
    /// `‖M‖_∞ = max_i Σ_j |M[i, j]|` (maximum absolute row sum).
    InducedInfNorm(AffineMatrix),
    /// Non-negative multiple of a convex expression.
    Scaled(f64, Box<ConvexExpr>),
    /// Sum of convex expressions.
    Sum(Vec<ConvexExpr>),
}

impl Default for ConvexExpr {
    fn default() -> Self {
        Self::zero()
    }
}

impl ConvexExpr {
    pub fn zero() -> Self {
        Self::Affine(AffineExpr::zero())
    }

    pub fn constant(value: f64) -> Self {
        Self::Affine(AffineExpr::constant(value))
    }

    pub fn induced_inf_norm(m: AffineMatrix) -> Self {
        Self::InducedInfNorm(m)
    }

    /// `weight · self`. Negative or non-finite weights would break convexity.
    pub fn scaled(self, weight: f64) -> Result<Self, ParameterError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ParameterError::NegativeWeight(weight));
        }
        Ok(Self::Scaled(weight, Box::new(self)))
    }

    /// `self + other`, flattening nested sums.
    #[must_use]
    pub fn plus(self, other: Self) -> Self {
        match (self, other) {
            (Self::Sum(mut lhs), Self::Sum(rhs)) => {
                lhs.extend(rhs);
                Self::Sum(lhs)
            }
            (Self::Sum(mut lhs), rhs) => {
                lhs.push(rhs);
                Self::Sum(lhs)
            }
            (lhs, rhs) => Self::Sum(vec![lhs, rhs]),
        }
    }

    /// Number of leaf terms (affine pieces and norms).
    pub fn term_count(&self) -> usize {
        match self {
            Self::Affine(_) | Self::InducedInfNorm(_) => 1,
            Self::Scaled(_, inner) => inner.term_count(),
            Self::Sum(terms) => terms.iter().map(Self::term_count).sum(),
        }
    }

    /// Numeric value under `values`.
    pub fn evaluate(&self, values: &Assignment) -> Result<f64, EvalError> {
        match self {
            Self::Affine(e) => e.evaluate(values),
            Self::InducedInfNorm(m) => {
                let v = m.evaluate(values)?;
                Ok(v
                    .row_iter()
                    .map(|row| row.iter().map(|x| x.abs()).sum::<f64>())
                    .fold(0.0, f64::max))
            }
            Self::Scaled(w, inner) => Ok(w * inner.evaluate(values)?),
            Self::Sum(terms) => terms
                .iter()
                .try_fold(0.0, |acc, t| -> Result<f64, EvalError> {
                    Ok(acc + t.evaluate(values)?)
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{MatrixVar, VarId};
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    fn assigned(rows: usize, cols: usize, data: &[f64]) -> (MatrixVar, Assignment) {
        let x = MatrixVar::new(VarId(0), "x", rows, cols);
        let values = Assignment::new()
            .with(&x, DMatrix::from_row_slice(rows, cols, data))
            .unwrap();
        (x, values)
    }

    #[test]
    fn inf_norm_is_max_abs_row_sum() {
        let (x, values) = assigned(2, 3, &[1.0, -2.0, 0.5, -4.0, 0.0, 1.0]);
        let norm = ConvexExpr::induced_inf_norm(x.to_affine());
        assert_relative_eq!(norm.evaluate(&values).unwrap(), 5.0);
    }

    #[test]
    fn inf_norm_of_zero_matrix() {
        let (x, values) = assigned(2, 2, &[0.0; 4]);
        let norm = ConvexExpr::induced_inf_norm(x.to_affine());
        assert_eq!(norm.evaluate(&values).unwrap(), 0.0);
    }

    #[test]
    fn negative_weight_rejected() {
        let err = ConvexExpr::constant(1.0).scaled(-2.0).unwrap_err();
        assert_eq!(err, ParameterError::NegativeWeight(-2.0));
        assert!(ConvexExpr::constant(1.0).scaled(f64::NAN).is_err());
    }

    #[test]
    fn plus_flattens_sums() {
        let e = ConvexExpr::constant(1.0)
            .plus(ConvexExpr::constant(2.0))
            .plus(ConvexExpr::constant(3.0));
        match &e {
            ConvexExpr::Sum(terms) => assert_eq!(terms.len(), 3),
            other => panic!("expected a sum, got {other:?}"),
        }
        assert_eq!(e.term_count(), 3);
        assert_relative_eq!(e.evaluate(&Assignment::new()).unwrap(), 6.0);
    }

    #[test]
    fn scaled_norm_evaluates() {
        let (x, values) = assigned(1, 2, &[3.0, -1.0]);
        let e = ConvexExpr::induced_inf_norm(x.to_affine())
            .scaled(0.5)
            .unwrap();
        assert_relative_eq!(e.evaluate(&values).unwrap(), 2.0);
    }
}
