// sls-core: System model, SLS problem variables, affine/convex expressions,
// constraints, config and errors for localized SLS constraint generation.

pub mod assignment;
pub mod config;
pub mod constraint;
pub mod convex;
pub mod error;
pub mod expr;
pub mod model;
pub mod problem;

pub mod prelude {
    pub use crate::assignment::Assignment;
    pub use crate::config::{ConstraintConfig, SynthesisConfig, SystemConfig};
    pub use crate::constraint::Constraint;
    pub use crate::convex::ConvexExpr;
    pub use crate::error::{ConfigError, EvalError, ParameterError, ShapeError, SlsError};
    pub use crate::expr::{AffineExpr, AffineMatrix, Entry, MatrixVar, VarId};
    pub use crate::model::SystemModel;
    pub use crate::problem::SlsProblem;
}
