use na::{DMatrix, DVector};

use crate::{
    contact::ContactProblem,
    error::{ContactError, ContactResult},
    types::Float,
};

fn check_jacobian(J: &DMatrix<Float>, M: &DMatrix<Float>) -> ContactResult<()> {
    if !M.is_square() || J.ncols() != M.nrows() || J.nrows() % 3 != 0 {
        return Err(ContactError::JacobianShape {
            rows: J.nrows(),
            cols: J.ncols(),
            dof: M.nrows(),
        });
    }
    Ok(())
}

/// Compute the Delassus operator
///     G = J M⁻¹ Jᵀ
/// where J maps generalized velocities to contact-frame velocities, 3 rows
/// per contact, and M is the generalized mass matrix.
pub fn delassus_operator(J: &DMatrix<Float>, M: &DMatrix<Float>) -> ContactResult<DMatrix<Float>> {
    check_jacobian(J, M)?;
    let cholesky = M.clone().cholesky().ok_or(ContactError::SingularMassMatrix)?;
    let Minv_Jt = cholesky.solve(&J.transpose());
    let G = J * Minv_Jt;

    // G is symmetric in exact arithmetic
    Ok((&G + G.transpose()) * 0.5)
}

/// Generalized velocity change M⁻¹ Jᵀ λ produced by contact impulses λ
pub fn velocity_correction(
    J: &DMatrix<Float>,
    M: &DMatrix<Float>,
    lambda: &DVector<Float>,
) -> ContactResult<DVector<Float>> {
    check_jacobian(J, M)?;
    if lambda.len() != J.nrows() {
        return Err(ContactError::FreeVelocityLength {
            len: lambda.len(),
            expected: J.nrows(),
        });
    }
    let cholesky = M.clone().cholesky().ok_or(ContactError::SingularMassMatrix)?;
    Ok(cholesky.solve(&(J.transpose() * lambda)))
}

impl ContactProblem {
    /// Assemble the contact problem of one time step from the contact
    /// Jacobian, the mass matrix and the unconstrained end-of-step velocity.
    pub fn from_dynamics(
        J: &DMatrix<Float>,
        M: &DMatrix<Float>,
        v_free: &DVector<Float>,
        mus: Vec<Float>,
    ) -> ContactResult<Self> {
        let G = delassus_operator(J, M)?;
        if v_free.len() != M.nrows() {
            return Err(ContactError::FreeVelocityLength {
                len: v_free.len(),
                expected: M.nrows(),
            });
        }
        let g = J * v_free;
        ContactProblem::new(G, g, mus)
    }
}
