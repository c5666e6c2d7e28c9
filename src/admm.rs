//! ADMM solver of the conic (CCP) relaxation of the contact problem
//!     min ½ λᵀGλ + gᵀλ   s.t. λ ∈ K_μ
//!
//! The relaxation trades exact Signorini complementarity for convexity: a
//! sliding contact can receive a normal impulse while separating at speed
//! μ‖c_T‖. That artifact is part of the model, not an error.

use na::{DMatrix, DVector};

use crate::{
    cone::project_friction_cone,
    contact::{validate_dimensions, ContactProblem},
    error::{ContactError, ContactResult},
    flog,
    types::Float,
    DEFAULT_MAX_ITER, DEFAULT_RHO,
};

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct AdmmSettings {
    pub rho: Float,      // penalty parameter
    pub max_iter: usize, // number of iterations, no early exit
    pub verbose: bool,
}

impl Default for AdmmSettings {
    fn default() -> Self {
        AdmmSettings {
            rho: DEFAULT_RHO,
            max_iter: DEFAULT_MAX_ITER,
            verbose: false,
        }
    }
}

impl AdmmSettings {
    pub fn new(rho: Float, max_iter: usize) -> Self {
        AdmmSettings {
            rho,
            max_iter,
            verbose: false,
        }
    }

    pub fn validate(&self) -> ContactResult<()> {
        if self.max_iter == 0 {
            return Err(ContactError::invalid_settings("max_iter must be at least 1"));
        }
        if !(self.rho > 0. && self.rho.is_finite()) {
            return Err(ContactError::invalid_settings(format!(
                "rho must be a positive number, got {}",
                self.rho
            )));
        }
        Ok(())
    }
}

/// Run ADMM, calling `observer(iteration, z)` after every iteration.
///
/// Returns the split variable z, which lies in the friction cones after every
/// iteration, rather than the primal λ that only reaches them in the limit.
pub fn solve_contact_admm_observed<F>(
    G: &DMatrix<Float>,
    g: &DVector<Float>,
    mus: &[Float],
    settings: &AdmmSettings,
    mut observer: F,
) -> ContactResult<DVector<Float>>
where
    F: FnMut(usize, &DVector<Float>),
{
    validate_dimensions(G, g, mus)?;
    settings.validate()?;

    let n = g.len();
    let mut z = DVector::zeros(n);
    if n == 0 {
        return Ok(z);
    }

    let rho = settings.rho;
    let mut regularized = G.clone();
    for i in 0..n {
        regularized[(i, i)] += rho;
    }
    // (G + ρI) is fixed for the whole solve, factor once
    let cholesky = regularized
        .cholesky()
        .ok_or(ContactError::NotPositiveDefinite)?;

    let mut lambda = DVector::zeros(n);
    let mut u = DVector::zeros(n);
    for iteration in 0..settings.max_iter {
        // λ-update: unconstrained quadratic with proximal term
        lambda = cholesky.solve(&(-g + (&z - &u) * rho));

        // z-update: back onto the cones
        z = project_friction_cone(&(&lambda + &u), mus)?;

        // scaled dual update
        u += &lambda - &z;

        observer(iteration, &z);
    }

    if settings.verbose {
        flog!(
            "ADMM-CCP: {} contacts, {} iterations, primal residual {:.3e}",
            mus.len(),
            settings.max_iter,
            (&lambda - &z).norm()
        );
    }

    Ok(z)
}

/// Solve the CCP relaxation with ADMM. All iterates start from zero.
pub fn solve_contact_admm_ccp(
    G: &DMatrix<Float>,
    g: &DVector<Float>,
    mus: &[Float],
    rho: Float,
    max_iter: usize,
) -> ContactResult<DVector<Float>> {
    solve_contact_admm_observed(G, g, mus, &AdmmSettings::new(rho, max_iter), |_, _| {})
}

pub fn solve_contact_admm(
    problem: &ContactProblem,
    settings: &AdmmSettings,
) -> ContactResult<DVector<Float>> {
    solve_contact_admm_observed(&problem.G, &problem.g, &problem.mus, settings, |_, _| {})
}
