//! Constraint generators for System Level Synthesis with communication and
//! locality limits.
//!
//! Three generator kinds share one capability, [`ConstraintGenerator`]:
//!
//! 1. **Base**: leaves the objective and constraints untouched
//! 2. **Localized**: zeroes impulse-response entries outside the support
//!    allowed by the propagation delay/speed model and the locality radius
//! 3. **Approximate localized**: fixes the `Phi_x` boundary, binds a
//!    residual variable `Delta` to the dynamics mismatch and penalizes its
//!    induced infinity norm (the stability margin) in the objective
//!
//! An assembler keeps an ordered `Vec<SlsConstraint>` and threads the
//! objective and constraint list through it with [`apply_all`].

pub mod approx;
pub mod generator;
pub mod localized;
pub mod support;

pub use approx::ApproxLocalized;
pub use generator::{BaseConstraint, ConstraintGenerator, SlsConstraint, apply_all};
pub use localized::LocalizedSupport;
pub use support::{
    BoolMatrix, LocalityParams, SupportPattern, bool_power, bool_product, comms_adjacency,
    locality_reach,
};
