use itertools::izip;
use na::{DVector, Vector3};

use crate::{
    contact::NORMAL,
    error::{ContactError, ContactResult},
    types::Float,
    util::{contact_vector, tangential},
};

/// True if the block lies in the friction cone
///     ‖λ_T‖ ≤ μ λ_N, λ_N ≥ 0
/// up to tol
pub fn in_friction_cone(lambda: &Vector3<Float>, mu: Float, tol: Float) -> bool {
    let normal = lambda[NORMAL];
    normal >= -tol && tangential(lambda).norm() <= mu * normal + tol
}

/// Euclidean projection of one contact block onto the Coulomb friction cone.
///
/// The cone is rotationally symmetric about the normal, so the projection
/// happens in the half-plane spanned by the tangential norm x and the normal z,
/// onto the boundary ray x = μz.
pub fn project_cone_block(lambda: &Vector3<Float>, mu: Float) -> Vector3<Float> {
    let t = tangential(lambda);
    let x = t.norm();
    let z = lambda[NORMAL];

    if z >= 0. && x <= mu * z {
        return *lambda;
    }

    // scalar projection of (x, z) onto the ray direction (μ, 1)
    let s = (mu * x + z) / (1. + mu * mu);
    if s <= 0. {
        // inside the polar cone
        return Vector3::zeros();
    }

    let x_new = mu * s;
    let t_new = if x > 0. { t * (x_new / x) } else { t * 0. };
    contact_vector(&t_new, s)
}

/// Check that a flat impulse vector holds one 3-block per friction coefficient
pub fn check_impulse_length(lambda: &DVector<Float>, mus: &[Float]) -> ContactResult<()> {
    if lambda.len() != 3 * mus.len() {
        return Err(ContactError::ImpulseLength {
            len: lambda.len(),
            expected: 3 * mus.len(),
        });
    }
    Ok(())
}

/// Project every 3-block of a flat impulse vector onto its friction cone
pub fn project_friction_cone(
    lambda: &DVector<Float>,
    mus: &[Float],
) -> ContactResult<DVector<Float>> {
    check_impulse_length(lambda, mus)?;
    let mut projected = DVector::zeros(lambda.len());
    for (i, mu) in izip!(0..mus.len(), mus.iter()) {
        let block = lambda.fixed_rows::<3>(3 * i).into_owned();
        projected
            .fixed_rows_mut::<3>(3 * i)
            .copy_from(&project_cone_block(&block, *mu));
    }
    Ok(projected)
}
