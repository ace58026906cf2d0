//! Matrix decision variables and affine expressions over their entries.
//!
//! This is the small modelling layer the constraint generators build on:
//! variables are matrix-shaped handles allocated by an
//! [`SlsProblem`](crate::problem::SlsProblem), and every constraint or
//! objective term is an affine function of their scalar entries.
//!
//! Terms are stored in a `BTreeMap` keyed by [`Entry`], so two expressions
//! built by the same sequence of operations compare equal and iterate in the
//! same order.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Index, Neg, Sub};

use nalgebra::DMatrix;

use crate::assignment::Assignment;
use crate::error::{EvalError, ShapeError};

/// Stable identifier of a matrix decision variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub usize);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A matrix-shaped decision variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatrixVar {
    id: VarId,
    name: String,
    rows: usize,
    cols: usize,
}

impl MatrixVar {
    pub(crate) fn new(id: VarId, name: impl Into<String>, rows: usize, cols: usize) -> Self {
        Self {
            id,
            name: name.into(),
            rows,
            cols,
        }
    }

    pub const fn id(&self) -> VarId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn rows(&self) -> usize {
        self.rows
    }

    pub const fn cols(&self) -> usize {
        self.cols
    }

    pub const fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Handle to the scalar entry at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the index is outside the variable's shape.
    pub fn entry(&self, row: usize, col: usize) -> Entry {
        assert!(
            row < self.rows && col < self.cols,
            "entry ({row}, {col}) out of range for {} ({}x{})",
            self.name,
            self.rows,
            self.cols
        );
        Entry {
            var: self.id,
            row,
            col,
        }
    }

    /// The variable as a matrix of single-term affine expressions.
    pub fn to_affine(&self) -> AffineMatrix {
        let mut data = Vec::with_capacity(self.rows * self.cols);
        for col in 0..self.cols {
            for row in 0..self.rows {
                data.push(AffineExpr::entry(Entry {
                    var: self.id,
                    row,
                    col,
                }));
            }
        }
        AffineMatrix {
            rows: self.rows,
            cols: self.cols,
            data,
        }
    }
}

/// One scalar entry of a matrix variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entry {
    pub var: VarId,
    pub row: usize,
    pub col: usize,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{},{}]", self.var, self.row, self.col)
    }
}

// ---------------------------------------------------------------------------
// AffineExpr
// ---------------------------------------------------------------------------

/// Sparse affine scalar expression: `constant + Σ coeff · entry`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AffineExpr {
    terms: BTreeMap<Entry, f64>,
    constant: f64,
}

impl AffineExpr {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: BTreeMap::new(),
            constant: value,
        }
    }

    pub fn entry(entry: Entry) -> Self {
        let mut terms = BTreeMap::new();
        terms.insert(entry, 1.0);
        Self {
            terms,
            constant: 0.0,
        }
    }

    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    /// Coefficient of `entry` (zero when absent).
    pub fn coefficient(&self, entry: Entry) -> f64 {
        self.terms.get(&entry).copied().unwrap_or(0.0)
    }

    /// Non-zero terms in deterministic order.
    pub fn terms(&self) -> impl Iterator<Item = (Entry, f64)> + '_ {
        self.terms.iter().map(|(&e, &c)| (e, c))
    }

    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Add `coeff · entry`, dropping the term if it cancels exactly.
    pub fn add_term(&mut self, entry: Entry, coeff: f64) {
        if coeff == 0.0 {
            return;
        }
        let slot = self.terms.entry(entry).or_insert(0.0);
        *slot += coeff;
        if *slot == 0.0 {
            self.terms.remove(&entry);
        }
    }

    /// `self += k · other`.
    pub fn add_scaled(&mut self, other: &Self, k: f64) {
        if k == 0.0 {
            return;
        }
        for (&entry, &coeff) in &other.terms {
            self.add_term(entry, k * coeff);
        }
        self.constant += k * other.constant;
    }

    pub fn scale(&self, k: f64) -> Self {
        let mut out = Self::zero();
        out.add_scaled(self, k);
        out
    }

    /// Numeric value under `values`.
    pub fn evaluate(&self, values: &Assignment) -> Result<f64, EvalError> {
        let mut total = self.constant;
        for (&entry, &coeff) in &self.terms {
            total += coeff * values.value(entry)?;
        }
        Ok(total)
    }
}

impl Add<&AffineExpr> for AffineExpr {
    type Output = Self;

    fn add(mut self, rhs: &AffineExpr) -> Self {
        self.add_scaled(rhs, 1.0);
        self
    }
}

impl Sub<&AffineExpr> for AffineExpr {
    type Output = Self;

    fn sub(mut self, rhs: &AffineExpr) -> Self {
        self.add_scaled(rhs, -1.0);
        self
    }
}

impl Neg for AffineExpr {
    type Output = Self;

    fn neg(self) -> Self {
        self.scale(-1.0)
    }
}

// ---------------------------------------------------------------------------
// AffineMatrix
// ---------------------------------------------------------------------------

/// Column-major matrix of affine expressions.
#[derive(Clone, Debug, PartialEq)]
pub struct AffineMatrix {
    rows: usize,
    cols: usize,
    data: Vec<AffineExpr>,
}

impl AffineMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![AffineExpr::zero(); rows * cols],
        }
    }

    /// 1x1 matrix holding `expr`.
    pub fn from_scalar(expr: AffineExpr) -> Self {
        Self {
            rows: 1,
            cols: 1,
            data: vec![expr],
        }
    }

    pub fn from_constant(m: &DMatrix<f64>) -> Self {
        Self {
            rows: m.nrows(),
            cols: m.ncols(),
            data: m.iter().map(|&v| AffineExpr::constant(v)).collect(),
        }
    }

    pub const fn nrows(&self) -> usize {
        self.rows
    }

    pub const fn ncols(&self) -> usize {
        self.cols
    }

    pub const fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Entries in column-major order.
    pub fn iter(&self) -> impl Iterator<Item = &AffineExpr> {
        self.data.iter()
    }

    fn check_same_shape(&self, other: &Self) -> Result<(), ShapeError> {
        if self.shape() == other.shape() {
            Ok(())
        } else {
            Err(ShapeError::Operands {
                lhs_rows: self.rows,
                lhs_cols: self.cols,
                rhs_rows: other.rows,
                rhs_cols: other.cols,
            })
        }
    }

    fn zip_with(&self, other: &Self, k: f64) -> Result<Self, ShapeError> {
        self.check_same_shape(other)?;
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| {
                let mut out = a.clone();
                out.add_scaled(b, k);
                out
            })
            .collect();
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    pub fn try_add(&self, other: &Self) -> Result<Self, ShapeError> {
        self.zip_with(other, 1.0)
    }

    pub fn try_sub(&self, other: &Self) -> Result<Self, ShapeError> {
        self.zip_with(other, -1.0)
    }

    /// `m · self` for a constant matrix `m`.
    pub fn premultiply(&self, m: &DMatrix<f64>) -> Result<Self, ShapeError> {
        if m.ncols() != self.rows {
            return Err(ShapeError::Operands {
                lhs_rows: m.nrows(),
                lhs_cols: m.ncols(),
                rhs_rows: self.rows,
                rhs_cols: self.cols,
            });
        }
        let mut out = Self::zeros(m.nrows(), self.cols);
        for j in 0..self.cols {
            for i in 0..m.nrows() {
                let slot = &mut out.data[j * m.nrows() + i];
                for k in 0..self.rows {
                    let w = m[(i, k)];
                    if w != 0.0 {
                        slot.add_scaled(&self.data[j * self.rows + k], w);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Copy of the `rows x cols` block whose top-left corner is `(row, col)`.
    pub fn block(&self, row: usize, col: usize, rows: usize, cols: usize) -> Result<Self, ShapeError> {
        if row + rows > self.rows || col + cols > self.cols {
            return Err(ShapeError::BlockOutOfRange {
                row,
                col,
                rows,
                cols,
                total_rows: self.rows,
                total_cols: self.cols,
            });
        }
        let mut data = Vec::with_capacity(rows * cols);
        for j in col..col + cols {
            for i in row..row + rows {
                data.push(self.data[j * self.rows + i].clone());
            }
        }
        Ok(Self { rows, cols, data })
    }

    /// Numeric value under `values`.
    pub fn evaluate(&self, values: &Assignment) -> Result<DMatrix<f64>, EvalError> {
        let evaluated = self
            .data
            .iter()
            .map(|e| e.evaluate(values))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DMatrix::from_vec(self.rows, self.cols, evaluated))
    }
}

impl Index<(usize, usize)> for AffineMatrix {
    type Output = AffineExpr;

    fn index(&self, (row, col): (usize, usize)) -> &AffineExpr {
        assert!(row < self.rows && col < self.cols, "index out of range");
        &self.data[col * self.rows + row]
    }
}
