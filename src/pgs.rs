//! Nonlinear projected Gauss-Seidel (PGS) solver of the contact NCP.
//!
//! Each sweep visits the contacts in order and solves the single-contact
//! complementarity problem exactly, holding every other impulse fixed at its
//! newest value. There is no convergence guarantee: a heavy body resting on a
//! light one makes G badly conditioned and the sweeps stall far from the
//! solution. The solver still returns its estimate after `max_iter` sweeps.

use std::f64::consts::TAU;

use na::{DMatrix, DVector, Matrix2, Matrix3, Vector2, Vector3};

use crate::{
    cone::project_cone_block,
    contact::{validate_dimensions, ContactProblem, NORMAL, TANGENT_X, TANGENT_Y},
    error::{ContactError, ContactResult},
    flog,
    types::Float,
    util::{contact_vector, tangential},
    DEFAULT_MAX_ITER, DEFAULT_TOL,
};

/// Below this, a pivot is treated as zero
const PIVOT_EPS: Float = 1e-12;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PgsSettings {
    pub tol: Float,      // early exit when the largest impulse update of a sweep is below tol
    pub max_iter: usize, // number of sweeps
    pub verbose: bool,
}

impl Default for PgsSettings {
    fn default() -> Self {
        PgsSettings {
            tol: DEFAULT_TOL,
            max_iter: DEFAULT_MAX_ITER,
            verbose: false,
        }
    }
}

impl PgsSettings {
    pub fn new(tol: Float, max_iter: usize) -> Self {
        PgsSettings {
            tol,
            max_iter,
            verbose: false,
        }
    }

    pub fn validate(&self) -> ContactResult<()> {
        if self.max_iter == 0 {
            return Err(ContactError::invalid_settings("max_iter must be at least 1"));
        }
        if !(self.tol >= 0.) {
            return Err(ContactError::invalid_settings(format!(
                "tol must be non-negative, got {}",
                self.tol
            )));
        }
        Ok(())
    }
}

/// Angular samples of the first search for the sliding direction
const SLIDING_SAMPLES: usize = 256;
/// Samples of the retry when the first search brackets no admissible root
const SLIDING_SAMPLES_FINE: usize = 4096;

/// Solve the single-contact NCP
///     c = W λ + b,
///     0 ≤ λ_N ⟂ c_N ≥ 0,  ‖λ_T‖ ≤ μ λ_N,  λ_T = -μ λ_N c_T / ‖c_T‖ when sliding
/// by case analysis over separation, sticking and sliding.
///
/// W is the contact's diagonal block of G, b the velocity it would have with
/// zero impulse of its own.
pub fn solve_single_contact(W: &Matrix3<Float>, b: &Vector3<Float>, mu: Float) -> Vector3<Float> {
    // Already separating under the other contacts' impulses
    if b[NORMAL] >= 0. {
        return Vector3::zeros();
    }

    let stick = W.try_inverse().map(|W_inv| -(W_inv * b));
    if let Some(stick) = stick {
        let normal = stick[NORMAL];
        if normal >= 0. && tangential(&stick).norm() <= mu * normal {
            return stick;
        }
    }

    // Frictionless: normal impulse only, tangential velocity is free
    if mu == 0. && W[(NORMAL, NORMAL)] > PIVOT_EPS {
        return contact_vector(&Vector2::zeros(), -b[NORMAL] / W[(NORMAL, NORMAL)]);
    }

    if let Some(slide) = solve_sliding(W, b, mu, SLIDING_SAMPLES)
        .or_else(|| solve_sliding(W, b, mu, SLIDING_SAMPLES_FINE))
    {
        return slide;
    }

    // Degenerate block, fall back to the nearest admissible impulse
    match stick {
        Some(stick) => project_cone_block(&stick, mu),
        None => Vector3::zeros(),
    }
}

/// Sliding case of the single-contact NCP.
///
/// With λ = (μ λ_N e, λ_N) for a unit direction e = (cos θ, sin θ), c_N = 0
/// fixes λ_N = -b_N / D(θ) where D(θ) = W_NN + μ W_NT·e. Scaled by D, the
/// tangential velocity is
///     D c_T = -b_N (μ W_TT e + W_TN) + D b_T
/// and maximum dissipation asks for e × D c_T = 0 with e·c_T < 0 and D > 0.
/// The roots in θ are bracketed on a uniform grid and refined by bisection.
fn solve_sliding(
    W: &Matrix3<Float>,
    b: &Vector3<Float>,
    mu: Float,
    samples: usize,
) -> Option<Vector3<Float>> {
    let W_tt: Matrix2<Float> = W.fixed_view::<2, 2>(TANGENT_X, TANGENT_X).into_owned();
    let W_tn = Vector2::new(W[(TANGENT_X, NORMAL)], W[(TANGENT_Y, NORMAL)]);
    let W_nt = Vector2::new(W[(NORMAL, TANGENT_X)], W[(NORMAL, TANGENT_Y)]);
    let b_t = tangential(b);
    let b_n = b[NORMAL];

    let pivot = |e: &Vector2<Float>| W[(NORMAL, NORMAL)] + mu * W_nt.dot(e);
    let scaled_velocity = |e: &Vector2<Float>| (W_tt * e * mu + W_tn) * (-b_n) + b_t * pivot(e);
    let residual = |theta: Float| {
        let e = direction(theta);
        e.perp(&scaled_velocity(&e))
    };
    let admissible = |theta: Float| {
        let e = direction(theta);
        pivot(&e) > PIVOT_EPS && e.dot(&scaled_velocity(&e)) < 0.
    };

    let spacing = TAU / samples as Float;
    let mut theta_lo = 0.;
    let mut r_lo = residual(theta_lo);
    for k in 1..=samples {
        let theta_hi = k as Float * spacing;
        let r_hi = residual(theta_hi);
        let root = if r_lo == 0. {
            Some(theta_lo)
        } else if r_hi != 0. && (r_lo < 0.) != (r_hi < 0.) {
            Some(bisect(&residual, theta_lo, theta_hi, r_lo))
        } else {
            None
        };

        if let Some(theta) = root.filter(|theta| admissible(*theta)) {
            let e = direction(theta);
            let normal = -b_n / pivot(&e);
            return Some(contact_vector(&(e * (mu * normal)), normal));
        }

        theta_lo = theta_hi;
        r_lo = r_hi;
    }
    None
}

fn direction(theta: Float) -> Vector2<Float> {
    Vector2::new(theta.cos(), theta.sin())
}

/// Root of f in [lo, hi], given f(lo) and a sign change over the interval
fn bisect<F: Fn(Float) -> Float>(f: &F, mut lo: Float, mut hi: Float, mut f_lo: Float) -> Float {
    loop {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            return mid;
        }
        let f_mid = f(mid);
        if f_mid == 0. {
            return mid;
        }
        if (f_lo < 0.) != (f_mid < 0.) {
            hi = mid;
        } else {
            lo = mid;
            f_lo = f_mid;
        }
    }
}

/// Run PGS sweeps, calling `observer(sweep, λ)` after every sweep.
pub fn solve_contact_observed<F>(
    G: &DMatrix<Float>,
    g: &DVector<Float>,
    mus: &[Float],
    settings: &PgsSettings,
    mut observer: F,
) -> ContactResult<DVector<Float>>
where
    F: FnMut(usize, &DVector<Float>),
{
    validate_dimensions(G, g, mus)?;
    settings.validate()?;

    let n_contacts = mus.len();
    let mut lambda = DVector::zeros(3 * n_contacts);
    if n_contacts == 0 {
        return Ok(lambda);
    }

    let diagonal_blocks: Vec<Matrix3<Float>> = (0..n_contacts)
        .map(|i| G.fixed_view::<3, 3>(3 * i, 3 * i).into_owned())
        .collect();

    let mut sweeps = 0;
    let mut max_update = Float::INFINITY;
    for sweep in 0..settings.max_iter {
        max_update = 0.;
        for (i, W) in diagonal_blocks.iter().enumerate() {
            let lambda_i: Vector3<Float> = lambda.fixed_rows::<3>(3 * i).into_owned();

            // velocity under the newest impulses, minus contact i's own share
            let c_i: Vector3<Float> =
                G.fixed_rows::<3>(3 * i) * &lambda + g.fixed_rows::<3>(3 * i);
            let b = c_i - W * lambda_i;

            let lambda_new = solve_single_contact(W, &b, mus[i]);
            max_update = max_update.max((lambda_new - lambda_i).norm());
            lambda.fixed_rows_mut::<3>(3 * i).copy_from(&lambda_new);
        }
        sweeps = sweep + 1;
        observer(sweep, &lambda);

        if max_update < settings.tol {
            break;
        }
    }

    if settings.verbose {
        flog!(
            "PGS: {} contacts, {} sweeps, last update {:.3e}",
            n_contacts,
            sweeps,
            max_update
        );
    }

    Ok(lambda)
}

/// Solve the contact NCP with PGS. λ starts from zero on every call.
pub fn solve_contact(
    G: &DMatrix<Float>,
    g: &DVector<Float>,
    mus: &[Float],
    tol: Float,
    max_iter: usize,
) -> ContactResult<DVector<Float>> {
    solve_contact_observed(G, g, mus, &PgsSettings::new(tol, max_iter), |_, _| {})
}

pub fn solve_contact_pgs(
    problem: &ContactProblem,
    settings: &PgsSettings,
) -> ContactResult<DVector<Float>> {
    solve_contact_observed(&problem.G, &problem.g, &problem.mus, settings, |_, _| {})
}

#[cfg(test)]
mod pgs_tests {
    use na::{dmatrix, dvector, vector};
    use rand::{rng, Rng};

    use crate::{
        assert_close, assert_vec_close,
        diagnostics::cone_violation,
        helpers::{cube_on_ground, resting_contact, sliding_contact, stacked_boxes},
        util::tangential_norm,
        GRAVITY,
    };

    use super::*;

    /// Cosine of the angle between tangential impulse and tangential velocity
    fn friction_cosine(lambda: &Vector3<Float>, c: &Vector3<Float>) -> Float {
        tangential(lambda).normalize().dot(&tangential(c).normalize())
    }

    #[test]
    fn single_contact_separating() {
        let W = Matrix3::identity();
        let b = vector![1.0, 0.0, 0.1];
        assert_eq!(solve_single_contact(&W, &b, 0.5), Vector3::zeros());
    }

    #[test]
    fn single_contact_sticking() {
        // Arrange
        let W = Matrix3::identity() * 2.0;
        let b = vector![0.1, 0.0, -1.0];

        // Act
        let lambda = solve_single_contact(&W, &b, 0.5);

        // Assert
        let c = W * lambda + b;
        assert_vec_close!(c, vector![0., 0., 0.], 1e-12);
        assert!(tangential_norm(&lambda) <= 0.5 * lambda[NORMAL]);
    }

    #[test]
    fn single_contact_sliding_dissipates() {
        // Arrange
        let W = Matrix3::identity();
        let b = vector![3.0, -4.0, -1.0];
        let mu = 0.2;

        // Act
        let lambda = solve_single_contact(&W, &b, mu);

        // Assert
        let c = W * lambda + b;
        assert_close!(lambda[NORMAL], 1.0, 1e-12);
        assert_close!(c[NORMAL], 0.0, 1e-12);
        assert_close!(tangential_norm(&lambda), mu * lambda[NORMAL], 1e-12);

        // friction exactly opposes the sliding velocity
        let t_lambda = tangential(&lambda).normalize();
        let t_c = tangential(&c).normalize();
        assert_close!(t_lambda.dot(&t_c), -1.0, 1e-12);
    }

    #[test]
    fn single_contact_coupled_block() {
        // Arrange
        #[rustfmt::skip]
        let W = Matrix3::new(
            2.0, 0.3, 0.4,
            0.3, 1.5, 0.2,
            0.4, 0.2, 1.0,
        );
        let b = vector![2.0, 1.0, -1.0];
        let mu = 0.3;

        // Act
        let lambda = solve_single_contact(&W, &b, mu);

        // Assert
        let c = W * lambda + b;
        assert!(lambda[NORMAL] > 0.);
        assert_close!(c[NORMAL], 0.0, 1e-12);
        assert_close!(tangential_norm(&lambda), mu * lambda[NORMAL], 1e-12);
        assert_close!(friction_cosine(&lambda, &c), -1.0, 1e-9);
    }

    /// Corner block of a 6-dof cube: tangential part anisotropic and coupled
    /// to the normal through the rotational inertia
    #[test]
    fn single_contact_cube_corner_block() {
        // Arrange
        let dt = 1e-2;
        let problem = cube_on_ground(1.0, 1.0, vector![2.0, 0.5, 0.], 0.3, dt).unwrap();
        let W = problem.block(0, 0);
        let b = vector![2.0, 0.5, -GRAVITY * dt];

        // Act
        let lambda = solve_single_contact(&W, &b, 0.3);

        // Assert
        let c = W * lambda + b;
        assert!(lambda[NORMAL] > 0.);
        assert_close!(c[NORMAL], 0.0, 1e-12);
        assert_close!(tangential_norm(&lambda), 0.3 * lambda[NORMAL], 1e-12);
        assert_close!(friction_cosine(&lambda, &c), -1.0, 1e-9);
    }

    #[test]
    fn single_contact_random_blocks() {
        // Arrange
        let mut rng = rng();

        for _ in 0..500 {
            let A = Matrix3::from_fn(|_, _| rng.random_range(-1.0..1.0));
            let W = A * A.transpose() + Matrix3::identity() * 0.5;
            let b = vector![
                rng.random_range(-2.0..2.0),
                rng.random_range(-2.0..2.0),
                rng.random_range(-1.0..-0.01)
            ];
            let mu = rng.random_range(0.05..1.5);

            // Act
            let lambda = solve_single_contact(&W, &b, mu);

            // Assert
            let c = W * lambda + b;
            assert!(lambda[NORMAL] >= 0.);
            assert!(c[NORMAL] > -1e-9, "c_N = {}", c[NORMAL]);
            assert!((lambda[NORMAL] * c[NORMAL]).abs() < 1e-9);
            assert!(tangential_norm(&lambda) <= mu * lambda[NORMAL] + 1e-12);
            if tangential_norm(&c) > 1e-6 {
                assert_close!(tangential_norm(&lambda), mu * lambda[NORMAL], 1e-9);
                assert_close!(friction_cosine(&lambda, &c), -1.0, 1e-9);
            }
        }
    }

    #[test]
    fn resting_contact_cancels_penetration() {
        // Arrange
        let problem = resting_contact(1.0, 0.5).unwrap();

        // Act
        let lambda = solve_contact(&problem.G, &problem.g, &problem.mus, 1e-10, 100).unwrap();

        // Assert
        assert_vec_close!(lambda, dvector![0., 0., 1.], 1e-9);
    }

    #[test]
    fn frictionless_has_no_tangential_impulse() {
        // Arrange
        let problem = sliding_contact(vector![1.0, 0.5, -1.0], 0.0).unwrap();

        // Act
        let lambda = solve_contact_pgs(&problem, &PgsSettings::default()).unwrap();

        // Assert
        assert_vec_close!(lambda, dvector![0., 0., 1.], 1e-12);
    }

    #[test]
    fn separating_contact_gets_no_impulse() {
        let problem = sliding_contact(vector![1.0, 0.0, 0.1], 0.5).unwrap();
        let lambda = solve_contact_pgs(&problem, &PgsSettings::default()).unwrap();
        assert_vec_close!(lambda, dvector![0., 0., 0.], 1e-15);
    }

    #[test]
    fn output_length_and_empty_problem() {
        // Arrange
        let problem = cube_on_ground(1.0, 1.0, vector![0., 0., 0.], 0.5, 1e-2).unwrap();

        // Act
        let lambda = solve_contact_pgs(&problem, &PgsSettings::default()).unwrap();
        let empty = solve_contact(&DMatrix::zeros(0, 0), &DVector::zeros(0), &[], 1e-8, 10);

        // Assert
        assert_eq!(lambda.len(), 3 * problem.num_contacts());
        assert_eq!(empty, Ok(DVector::zeros(0)));
    }

    #[test]
    fn mismatched_dimensions_fail_before_iterating() {
        let result = solve_contact(&DMatrix::identity(6, 6), &DVector::zeros(6), &[0.5], 1e-8, 10);
        assert!(matches!(result, Err(ContactError::DelassusShape { .. })));

        let result = solve_contact(&DMatrix::identity(3, 3), &DVector::zeros(3), &[0.5], 1e-8, 0);
        assert!(matches!(result, Err(ContactError::InvalidSettings(_))));
    }

    #[test]
    fn cube_resting_on_ground() {
        // Arrange
        let m = 2.0;
        let dt = 1e-2;
        let problem = cube_on_ground(m, 1.0, vector![0., 0., 0.], 0.5, dt).unwrap();

        // Act
        let lambda = solve_contact_pgs(&problem, &PgsSettings::new(0., 500)).unwrap();

        // Assert
        let contacts = problem.contacts(&lambda);
        let total_normal: Float = contacts.iter().map(|c| c.normal_impulse()).sum();
        assert_close!(total_normal, m * GRAVITY * dt, 1e-3 * m * GRAVITY * dt);
        for contact in contacts.iter() {
            assert!(contact.normal_velocity() > -1e-5, "{:?}", contact);
        }
        assert!(cone_violation(&lambda, &problem.mus).unwrap() < 1e-12);
    }

    #[test]
    fn early_exit_on_tolerance() {
        // Arrange
        let problem = resting_contact(1.0, 0.5).unwrap();
        let mut sweeps = 0;

        // Act
        let settings = PgsSettings::new(1e-12, 100);
        solve_contact_observed(&problem.G, &problem.g, &problem.mus, &settings, |_, _| {
            sweeps += 1
        })
        .unwrap();

        // Assert
        // first sweep solves it, second sees no update
        assert_eq!(sweeps, 2);
    }

    /// A heavy box on a light box: the sweeps only shift a tiny amount of
    /// impulse per pass and the stack is far from supported after 100 sweeps.
    #[test]
    fn heavy_on_light_stack_stalls() {
        // Arrange
        let dt = 1e-2;
        let problem = stacked_boxes(1e-3, 1e3, 0.5, dt).unwrap();

        // Act
        let lambda = solve_contact_pgs(&problem, &PgsSettings::new(0., 100)).unwrap();

        // Assert
        let needed = 1e3 * GRAVITY * dt; // top box weight over one step
        assert!(lambda[5] < 1e-3 * needed, "λ_N = {}", lambda[5]);
        assert!(problem.signorini_residual(&lambda) > 0.05);
    }

    #[test]
    fn two_by_two_normal_only() {
        // Arrange
        // two frictionless contacts coupled through one body
        let G = dmatrix![
            1., 0., 0., 0., 0., 0.;
            0., 1., 0., 0., 0., 0.;
            0., 0., 2., 0., 0., 1.;
            0., 0., 0., 1., 0., 0.;
            0., 0., 0., 0., 1., 0.;
            0., 0., 1., 0., 0., 2.
        ];
        let g = dvector![0., 0., -3., 0., 0., -3.];

        // Act
        let lambda = solve_contact(&G, &g, &[0., 0.], 0., 60).unwrap();

        // Assert
        assert_vec_close!(lambda, dvector![0., 0., 1., 0., 0., 1.], 1e-9);
    }
}
