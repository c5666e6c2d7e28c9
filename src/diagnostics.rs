//! Measures of how far a solver's impulses are from an exact contact solution.
//! They are for comparing solvers and are never used for control flow.

use itertools::izip;
use na::DVector;

use crate::{
    admm::{solve_contact_admm_observed, AdmmSettings},
    cone::check_impulse_length,
    contact::{ContactProblem, NORMAL},
    error::{ContactError, ContactResult},
    pgs::{solve_contact_observed, PgsSettings},
    types::Float,
    util::tangential_norm,
};

/// Infinity norm of the Signorini violations over all contacts:
///     max(0, -λ_N),  max(0, -(c_N - c*_N)),  λ_N (c_N - c*_N)
/// c*_N is the target normal velocity, typically zero.
pub fn compute_sig_residual(
    lambda_n: &[Float],
    c_n: &[Float],
    c_n_star: &[Float],
) -> ContactResult<Float> {
    if lambda_n.len() != c_n.len() || c_n.len() != c_n_star.len() {
        return Err(ContactError::ResidualLength {
            lambda_n: lambda_n.len(),
            c_n: c_n.len(),
            c_n_star: c_n_star.len(),
        });
    }

    let residual = izip!(lambda_n.iter(), c_n.iter(), c_n_star.iter())
        .flat_map(|(lambda, c, c_star)| {
            let gap = c - c_star;
            [(-lambda).max(0.), (-gap).max(0.), lambda * gap]
        })
        .fold(0., |acc: Float, r| acc.max(r.abs()));
    Ok(residual)
}

/// Largest distance outside the friction cones, per the cone inequalities
pub fn cone_violation(lambda: &DVector<Float>, mus: &[Float]) -> ContactResult<Float> {
    check_impulse_length(lambda, mus)?;
    let violation = mus
        .iter()
        .enumerate()
        .map(|(i, mu)| {
            let block = lambda.fixed_rows::<3>(3 * i).into_owned();
            let normal = block[NORMAL];
            (tangential_norm(&block) - mu * normal).max(-normal).max(0.)
        })
        .fold(0., Float::max);
    Ok(violation)
}

/// Signorini residual after every PGS sweep
pub fn pgs_residual_history(
    problem: &ContactProblem,
    settings: &PgsSettings,
) -> ContactResult<Vec<Float>> {
    let mut history = vec![];
    solve_contact_observed(
        &problem.G,
        &problem.g,
        &problem.mus,
        settings,
        |_, lambda| history.push(problem.signorini_residual(lambda)),
    )?;
    Ok(history)
}

/// Signorini residual after every ADMM iteration
pub fn admm_residual_history(
    problem: &ContactProblem,
    settings: &AdmmSettings,
) -> ContactResult<Vec<Float>> {
    let mut history = vec![];
    solve_contact_admm_observed(
        &problem.G,
        &problem.g,
        &problem.mus,
        settings,
        |_, z| history.push(problem.signorini_residual(z)),
    )?;
    Ok(history)
}
