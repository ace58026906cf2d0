use thiserror::Error;

use crate::expr::VarId;

/// Top-level error type for SLS constraint generation.
#[derive(Debug, Error)]
pub enum SlsError {
    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Stability margin unavailable: generator has not been applied yet")]
    MarginUnavailable,
}

/// Dimension inconsistencies between the system model, the problem
/// variables and derived expressions.
///
/// Copy + structured fields so callers can match on the offending operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("A must be square: got {rows}x{cols}")]
    NonSquareA { rows: usize, cols: usize },

    #[error("B2 row count must match Nx: expected {expected}, got {got}")]
    B2Rows { expected: usize, got: usize },

    #[error("Phi_x[{step}] must be {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    PhiX {
        step: usize,
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Phi_u[{step}] must be {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    PhiU {
        step: usize,
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Expected {expected} impulse-response matrices, got {got}")]
    HorizonLength { expected: usize, got: usize },

    #[error("Operand shapes differ: {lhs_rows}x{lhs_cols} vs {rhs_rows}x{rhs_cols}")]
    Operands {
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
    },

    #[error("Block {rows}x{cols} at ({row}, {col}) exceeds {total_rows}x{total_cols}")]
    BlockOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
        total_rows: usize,
        total_cols: usize,
    },

    #[error("Matrix rows have inconsistent lengths: row {row} has {got}, expected {expected}")]
    RaggedRows { row: usize, expected: usize, got: usize },
}

/// Out-of-range generator or problem parameters.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ParameterError {
    #[error("Locality radius must be >= 1, got {0}")]
    LocalityRadius(u32),

    #[error("Propagation speed must be finite and > 0, got {0}")]
    CommSpeed(f64),

    #[error("Robustness coefficient must be finite and >= 0, got {0}")]
    Robustness(f64),

    #[error("FIR horizon must be >= 1, got {0}")]
    Horizon(usize),

    #[error("Penalty weight must be finite and >= 0, got {0}")]
    NegativeWeight(f64),
}

/// Failures while evaluating expressions against numeric values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("No value assigned to variable {0}")]
    Unassigned(VarId),

    #[error("Value for variable {var} must be {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    ValueShape {
        var: VarId,
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Entry ({row}, {col}) is outside the value assigned to {var}")]
    OutOfRange { var: VarId, row: usize, col: usize },
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid system matrices: {0}")]
    System(#[from] ShapeError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
