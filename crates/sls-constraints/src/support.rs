//! Structural support of the impulse-response matrices.
//!
//! Information travels over the communication graph induced by the nonzero
//! pattern of `A`. After an activation delay, each timestep adds
//! `comm_speed` hops of budget; every whole hop widens the set of nodes whose
//! disturbances a controller can have heard about. Intersecting that with
//! the `d`-hop locality neighbourhood gives the per-timestep state support,
//! and pushing it through the nonzero pattern of `B2` gives the input
//! support.
//!
//! Propagation uses the reflexive closure `I ∨ CommsAdjacency`: a node never
//! forgets its own information, so both the information relation (in `t`)
//! and the locality neighbourhood (in `d`) only ever grow. For plants whose
//! `A` has a nonzero diagonal this is the plain adjacency.

use nalgebra::DMatrix;
use sls_core::error::ParameterError;
use sls_core::model::SystemModel;

/// Boolean matrix over node pairs.
pub type BoolMatrix = DMatrix<bool>;

// ---------------------------------------------------------------------------
// LocalityParams
// ---------------------------------------------------------------------------

/// Propagation-delay/speed model and locality radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalityParams {
    act_delay: u32,
    comm_speed: f64,
    locality: u32,
}

impl Default for LocalityParams {
    fn default() -> Self {
        Self {
            act_delay: 0,
            comm_speed: 1.0,
            locality: 1,
        }
    }
}

impl LocalityParams {
    /// Validate and build.
    ///
    /// * `act_delay` - timesteps before any information can move
    /// * `comm_speed` - hops per timestep, finite and > 0
    /// * `locality` - radius `d >= 1`
    pub fn new(act_delay: u32, comm_speed: f64, locality: u32) -> Result<Self, ParameterError> {
        if !comm_speed.is_finite() || comm_speed <= 0.0 {
            return Err(ParameterError::CommSpeed(comm_speed));
        }
        if locality == 0 {
            return Err(ParameterError::LocalityRadius(locality));
        }
        Ok(Self {
            act_delay,
            comm_speed,
            locality,
        })
    }

    pub const fn act_delay(&self) -> u32 {
        self.act_delay
    }

    pub const fn comm_speed(&self) -> f64 {
        self.comm_speed
    }

    pub const fn locality(&self) -> u32 {
        self.locality
    }

    #[must_use]
    pub const fn with_act_delay(mut self, act_delay: u32) -> Self {
        self.act_delay = act_delay;
        self
    }

    pub fn with_comm_speed(self, comm_speed: f64) -> Result<Self, ParameterError> {
        Self::new(self.act_delay, comm_speed, self.locality)
    }

    pub fn with_locality(self, locality: u32) -> Result<Self, ParameterError> {
        Self::new(self.act_delay, self.comm_speed, locality)
    }
}

// ---------------------------------------------------------------------------
// Boolean matrix algebra
// ---------------------------------------------------------------------------

/// One-hop communication graph: `|A[i, j]| > 0`.
pub fn comms_adjacency(a: &DMatrix<f64>) -> BoolMatrix {
    a.map(|v| v.abs() > 0.0)
}

/// Boolean (OR-AND) matrix product.
///
/// # Panics
/// Panics if the inner dimensions differ.
pub fn bool_product(lhs: &BoolMatrix, rhs: &BoolMatrix) -> BoolMatrix {
    assert_eq!(lhs.ncols(), rhs.nrows(), "boolean product dimension mismatch");
    DMatrix::from_fn(lhs.nrows(), rhs.ncols(), |i, j| {
        (0..lhs.ncols()).any(|k| lhs[(i, k)] && rhs[(k, j)])
    })
}

/// `m^exp` under the boolean semiring; `m^0` is the identity.
pub fn bool_power(m: &BoolMatrix, exp: u32) -> BoolMatrix {
    let n = m.nrows();
    let mut out = DMatrix::from_fn(n, n, |i, j| i == j);
    for _ in 0..exp {
        out = bool_product(&out, m);
    }
    out
}

fn reflexive(m: &BoolMatrix) -> BoolMatrix {
    DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| i == j || m[(i, j)])
}

/// Nodes within `locality - 1` hops of each other.
pub fn locality_reach(comms: &BoolMatrix, locality: u32) -> BoolMatrix {
    bool_power(&reflexive(comms), locality.saturating_sub(1))
}

/// Number of `true` entries.
pub fn count_true(m: &BoolMatrix) -> usize {
    m.iter().filter(|&&b| b).count()
}

// ---------------------------------------------------------------------------
// SupportPattern
// ---------------------------------------------------------------------------

/// Per-timestep information relation and state/input supports.
#[derive(Clone, Debug, PartialEq)]
pub struct SupportPattern {
    info: Vec<BoolMatrix>,
    x: Vec<BoolMatrix>,
    u: Vec<BoolMatrix>,
}

impl SupportPattern {
    /// Compute the supports of `Phi_x[t]` and `Phi_u[t]` for `t < horizon`.
    pub fn compute(model: &SystemModel, horizon: usize, params: &LocalityParams) -> Self {
        let nx = model.nx();
        let comms = comms_adjacency(model.a());
        let hop = reflexive(&comms);
        let reach = locality_reach(&comms, params.locality());
        let b2_pattern = comms_adjacency(model.b2());

        let mut info_adj: BoolMatrix = DMatrix::from_fn(nx, nx, |i, j| i == j);
        let mut saturated = false;
        let mut budget = -(f64::from(params.act_delay()) * params.comm_speed());

        let mut info = Vec::with_capacity(horizon);
        let mut x = Vec::with_capacity(horizon);
        let mut u = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            budget += params.comm_speed();
            // Once the relation stops growing the remaining budget is moot.
            while budget >= 1.0 && !saturated {
                budget -= 1.0;
                let next = bool_product(&info_adj, &hop);
                saturated = next == info_adj;
                info_adj = next;
            }

            let support_x = info_adj.zip_map(&reach, |i, r| i && r);
            let support_u = DMatrix::from_fn(model.nu(), nx, |i, j| {
                (0..nx).any(|k| b2_pattern[(k, i)] && support_x[(k, j)])
            });

            info.push(info_adj.clone());
            x.push(support_x);
            u.push(support_u);
        }

        Self { info, x, u }
    }

    pub fn horizon(&self) -> usize {
        self.x.len()
    }

    /// Information relation after timestep `t`.
    pub fn info(&self, t: usize) -> &BoolMatrix {
        &self.info[t]
    }

    /// Permitted nonzeros of `Phi_x[t]`.
    pub fn x(&self, t: usize) -> &BoolMatrix {
        &self.x[t]
    }

    /// Permitted nonzeros of `Phi_u[t]`.
    pub fn u(&self, t: usize) -> &BoolMatrix {
        &self.u[t]
    }

    /// Fraction of permitted entries in `Phi_x[t]`.
    #[allow(clippy::cast_precision_loss)]
    pub fn x_density(&self, t: usize) -> f64 {
        let m = &self.x[t];
        if m.is_empty() {
            return 0.0;
        }
        count_true(m) as f64 / m.len() as f64
    }
}
