//! Error types for contact problems and solvers.

use thiserror::Error;

use crate::types::Float;

/// Result type alias for contact operations.
pub type ContactResult<T> = Result<T, ContactError>;

/// Errors raised before a solve starts, or by a factorization it depends on.
///
/// Non-convergence is never one of them: solvers always return their best
/// estimate after the iteration budget.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContactError {
    #[error("delassus matrix is {rows}x{cols}, expected {expected}x{expected} for {contacts} contacts")]
    DelassusShape {
        rows: usize,
        cols: usize,
        expected: usize,
        contacts: usize,
    },

    #[error("row-major delassus matrix has {len} entries, expected {expected}")]
    FlatDelassusLength { len: usize, expected: usize },

    #[error("free velocity has length {len}, expected {expected}")]
    FreeVelocityLength { len: usize, expected: usize },

    #[error("friction coefficient {mu} of contact {index} is not a finite non-negative number")]
    InvalidFriction { index: usize, mu: Float },

    #[error("impulse vector has length {len}, expected {expected}")]
    ImpulseLength { len: usize, expected: usize },

    #[error("residual inputs have mismatched lengths: lambda_n {lambda_n}, c_n {c_n}, c_n_star {c_n_star}")]
    ResidualLength {
        lambda_n: usize,
        c_n: usize,
        c_n_star: usize,
    },

    #[error("invalid solver settings: {0}")]
    InvalidSettings(String),

    #[error("regularized delassus matrix G + rho*I is not positive definite")]
    NotPositiveDefinite,

    #[error("jacobian is {rows}x{cols}, mass matrix is {dof}x{dof}")]
    JacobianShape { rows: usize, cols: usize, dof: usize },

    #[error("mass matrix is not positive definite")]
    SingularMassMatrix,

    #[error("interior-point solve did not converge: {0}")]
    InteriorPoint(String),
}

impl ContactError {
    pub fn invalid_settings(details: impl Into<String>) -> Self {
        Self::InvalidSettings(details.into())
    }
}
