//! Numeric values for decision variables, e.g. a solver result handed back
//! by the assembler for post-solve checks.

use std::collections::HashMap;

use nalgebra::DMatrix;

use crate::error::EvalError;
use crate::expr::{Entry, MatrixVar, VarId};

/// Map from variable id to its numeric value.
#[derive(Clone, Debug, Default)]
pub struct Assignment {
    values: HashMap<VarId, DMatrix<f64>>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value of `var`, checking that the shapes agree.
    pub fn set(&mut self, var: &MatrixVar, value: DMatrix<f64>) -> Result<(), EvalError> {
        if value.shape() != var.shape() {
            return Err(EvalError::ValueShape {
                var: var.id(),
                expected_rows: var.rows(),
                expected_cols: var.cols(),
                rows: value.nrows(),
                cols: value.ncols(),
            });
        }
        self.values.insert(var.id(), value);
        Ok(())
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, var: &MatrixVar, value: DMatrix<f64>) -> Result<Self, EvalError> {
        self.set(var, value)?;
        Ok(self)
    }

    pub fn get(&self, id: VarId) -> Option<&DMatrix<f64>> {
        self.values.get(&id)
    }

    pub fn contains(&self, id: VarId) -> bool {
        self.values.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a single scalar entry.
    pub fn value(&self, entry: Entry) -> Result<f64, EvalError> {
        let m = self
            .values
            .get(&entry.var)
            .ok_or(EvalError::Unassigned(entry.var))?;
        m.get((entry.row, entry.col))
            .copied()
            .ok_or(EvalError::OutOfRange {
                var: entry.var,
                row: entry.row,
                col: entry.col,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_rejects_wrong_shape() {
        let x = MatrixVar::new(VarId(0), "x", 2, 2);
        let err = Assignment::new()
            .with(&x, DMatrix::zeros(2, 3))
            .unwrap_err();
        assert!(matches!(
            err,
            EvalError::ValueShape {
                expected_cols: 2,
                cols: 3,
                ..
            }
        ));
    }

    #[test]
    fn value_reads_entry() {
        let x = MatrixVar::new(VarId(1), "x", 2, 2);
        let values = Assignment::new()
            .with(&x, DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]))
            .unwrap();
        assert_eq!(values.value(x.entry(1, 0)).unwrap(), 3.0);
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn foreign_entry_is_out_of_range() {
        let values = Assignment::new()
            .with(&MatrixVar::new(VarId(0), "x", 1, 1), DMatrix::zeros(1, 1))
            .unwrap();
        let entry = Entry {
            var: VarId(0),
            row: 2,
            col: 0,
        };
        assert!(matches!(
            values.value(entry),
            Err(EvalError::OutOfRange { row: 2, .. })
        ));
    }
}
