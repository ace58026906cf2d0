//! Discrete-time LTI plant `x[t+1] = A x[t] + B2 u[t]`.

use nalgebra::DMatrix;

use crate::error::ShapeError;

/// Plant matrices shared read-only by every problem and generator.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemModel {
    a: DMatrix<f64>,
    b2: DMatrix<f64>,
}

impl SystemModel {
    /// Build a model, checking that `A` is square and `B2` has `Nx` rows.
    pub fn new(a: DMatrix<f64>, b2: DMatrix<f64>) -> Result<Self, ShapeError> {
        if a.nrows() != a.ncols() {
            return Err(ShapeError::NonSquareA {
                rows: a.nrows(),
                cols: a.ncols(),
            });
        }
        if b2.nrows() != a.nrows() {
            return Err(ShapeError::B2Rows {
                expected: a.nrows(),
                got: b2.nrows(),
            });
        }
        Ok(Self { a, b2 })
    }

    /// Fully actuated model: `B2 = I(Nx)`.
    pub fn fully_actuated(a: DMatrix<f64>) -> Result<Self, ShapeError> {
        let n = a.nrows();
        Self::new(a, DMatrix::identity(n, n))
    }

    pub const fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    pub const fn b2(&self) -> &DMatrix<f64> {
        &self.b2
    }

    /// State dimension.
    pub fn nx(&self) -> usize {
        self.a.nrows()
    }

    /// Input dimension.
    pub fn nu(&self) -> usize {
        self.b2.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_square_a() {
        let err = SystemModel::new(DMatrix::zeros(2, 3), DMatrix::zeros(2, 1)).unwrap_err();
        assert_eq!(err, ShapeError::NonSquareA { rows: 2, cols: 3 });
    }

    #[test]
    fn rejects_b2_row_mismatch() {
        let err = SystemModel::new(DMatrix::zeros(3, 3), DMatrix::zeros(2, 1)).unwrap_err();
        assert_eq!(err, ShapeError::B2Rows { expected: 3, got: 2 });
    }

    #[test]
    fn dimensions() {
        let model = SystemModel::new(DMatrix::identity(4, 4), DMatrix::zeros(4, 2)).unwrap();
        assert_eq!(model.nx(), 4);
        assert_eq!(model.nu(), 2);

        let full = SystemModel::fully_actuated(DMatrix::identity(3, 3)).unwrap();
        assert_eq!(full.nu(), 3);
        assert_eq!(full.b2(), &DMatrix::<f64>::identity(3, 3));
    }
}
