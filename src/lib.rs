#![allow(non_snake_case)]

use types::Float;
pub extern crate nalgebra as na;

pub mod admm;
pub mod cone;
pub mod contact;
pub mod delassus;
pub mod diagnostics;
pub mod error;
pub mod interior_point;
pub mod pgs;
pub mod plot;
pub mod simulate;
pub mod solver;
pub mod types;
pub mod util;

// Wasm bindings
pub mod interface;

pub mod helpers;

pub use admm::{solve_contact_admm_ccp, AdmmSettings};
pub use cone::project_friction_cone;
pub use contact::{Contact, ContactProblem};
pub use diagnostics::compute_sig_residual;
pub use error::{ContactError, ContactResult};
pub use pgs::{solve_contact, PgsSettings};
pub use solver::ContactSolver;

pub const GRAVITY: Float = 9.81;

/// ADMM penalty parameter
pub const DEFAULT_RHO: Float = 10.0;
/// Iteration budget of both solvers
pub const DEFAULT_MAX_ITER: usize = 100;
/// PGS early-exit threshold on the largest impulse update of a sweep
pub const DEFAULT_TOL: Float = 1e-10;
