use itertools::izip;
use na::{DMatrix, DVector, Matrix3, Vector3};

use crate::{
    diagnostics::compute_sig_residual,
    error::{ContactError, ContactResult},
    types::Float,
    util::{tangential_norm, tangential},
};

/// Index of the first tangential component within a contact block
pub const TANGENT_X: usize = 0;
/// Index of the second tangential component within a contact block
pub const TANGENT_Y: usize = 1;
/// Index of the normal component within a contact block
pub const NORMAL: usize = 2;

/// State of a single contact after a solve.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Contact {
    pub index: usize,
    pub impulse: Vector3<Float>,  // (λ_Tx, λ_Ty, λ_N)
    pub mu: Float,                // coefficient of friction
    pub velocity: Vector3<Float>, // relative velocity (c_Tx, c_Ty, c_N) under the impulse
}

impl Contact {
    pub fn normal_impulse(&self) -> Float {
        self.impulse[NORMAL]
    }

    pub fn normal_velocity(&self) -> Float {
        self.velocity[NORMAL]
    }

    pub fn tangential_impulse_norm(&self) -> Float {
        tangential_norm(&self.impulse)
    }

    pub fn tangential_velocity_norm(&self) -> Float {
        tangential_norm(&self.velocity)
    }

    /// No normal impulse is transmitted
    pub fn is_separated(&self, tol: Float) -> bool {
        self.normal_impulse() <= tol
    }

    /// Pressed together with no relative motion at the contact point
    pub fn is_sticking(&self, tol: Float) -> bool {
        !self.is_separated(tol) && self.velocity.norm() <= tol
    }

    /// Pressed together and slipping, with friction on the cone boundary
    pub fn is_sliding(&self, tol: Float) -> bool {
        !self.is_separated(tol)
            && self.tangential_velocity_norm() > tol
            && (self.tangential_impulse_norm() - self.mu * self.normal_impulse()).abs() <= tol
    }

    /// Friction work rate λ_T · c_T. Maximum dissipation makes it non-positive.
    pub fn friction_power(&self) -> Float {
        tangential(&self.impulse).dot(&tangential(&self.velocity))
    }
}

/// Check Nc = len(mus) = len(g)/3 = rows(G)/3 = cols(G)/3 and mu ≥ 0.
pub fn validate_dimensions(
    G: &DMatrix<Float>,
    g: &DVector<Float>,
    mus: &[Float],
) -> ContactResult<()> {
    let n_contacts = mus.len();
    let expected = 3 * n_contacts;
    if G.nrows() != expected || G.ncols() != expected {
        return Err(ContactError::DelassusShape {
            rows: G.nrows(),
            cols: G.ncols(),
            expected,
            contacts: n_contacts,
        });
    }
    if g.len() != expected {
        return Err(ContactError::FreeVelocityLength {
            len: g.len(),
            expected,
        });
    }
    if let Some((index, mu)) = mus
        .iter()
        .enumerate()
        .find(|(_, mu)| !(mu.is_finite() && **mu >= 0.0))
    {
        return Err(ContactError::InvalidFriction { index, mu: *mu });
    }
    Ok(())
}

/// Everything a contact solver consumes for one time step: the Delassus
/// matrix G, the free velocity g and the friction coefficients.
#[derive(Clone, PartialEq, Debug)]
pub struct ContactProblem {
    pub G: DMatrix<Float>,
    pub g: DVector<Float>,
    pub mus: Vec<Float>,
}

impl ContactProblem {
    pub fn new(G: DMatrix<Float>, g: DVector<Float>, mus: Vec<Float>) -> ContactResult<Self> {
        validate_dimensions(&G, &g, &mus)?;
        Ok(ContactProblem { G, g, mus })
    }

    pub fn empty() -> Self {
        ContactProblem {
            G: DMatrix::zeros(0, 0),
            g: DVector::zeros(0),
            mus: vec![],
        }
    }

    pub fn num_contacts(&self) -> usize {
        self.mus.len()
    }

    /// The 3x3 block of G coupling contact j's impulse to contact i's velocity
    pub fn block(&self, i: usize, j: usize) -> Matrix3<Float> {
        self.G.fixed_view::<3, 3>(3 * i, 3 * j).into_owned()
    }

    pub fn free_velocity(&self, i: usize) -> Vector3<Float> {
        self.g.fixed_rows::<3>(3 * i).into_owned()
    }

    /// Contact-point velocities under the impulses: c = Gλ + g
    pub fn contact_velocity(&self, lambda: &DVector<Float>) -> DVector<Float> {
        &self.G * lambda + &self.g
    }

    pub fn contacts(&self, lambda: &DVector<Float>) -> Vec<Contact> {
        let c = self.contact_velocity(lambda);
        izip!(0..self.num_contacts(), self.mus.iter())
            .map(|(index, mu)| Contact {
                index,
                impulse: lambda.fixed_rows::<3>(3 * index).into_owned(),
                mu: *mu,
                velocity: c.fixed_rows::<3>(3 * index).into_owned(),
            })
            .collect()
    }

    /// Signorini residual of the impulses with zero target normal velocity
    pub fn signorini_residual(&self, lambda: &DVector<Float>) -> Float {
        let c = self.contact_velocity(lambda);
        let lambda_n = normal_components(lambda);
        let c_n = normal_components(&c);
        let c_n_star = vec![0.; c_n.len()];
        compute_sig_residual(&lambda_n, &c_n, &c_n_star).unwrap_or(Float::INFINITY)
    }
}

/// Normal component of every contact block
pub fn normal_components(v: &DVector<Float>) -> Vec<Float> {
    v.iter().skip(NORMAL).step_by(3).copied().collect()
}

#[cfg(test)]
mod contact_tests {
    use na::{dvector, vector};

    use super::*;

    #[test]
    fn reject_mismatched_dimensions() {
        // Arrange
        let G = DMatrix::identity(6, 6);
        let g = DVector::zeros(6);

        // Act
        let too_few_mus = ContactProblem::new(G.clone(), g.clone(), vec![0.5]);
        let short_g = ContactProblem::new(G.clone(), DVector::zeros(3), vec![0.5, 0.5]);
        let non_square = ContactProblem::new(DMatrix::zeros(6, 3), g.clone(), vec![0.5, 0.5]);

        // Assert
        assert_eq!(
            too_few_mus,
            Err(ContactError::DelassusShape {
                rows: 6,
                cols: 6,
                expected: 3,
                contacts: 1
            })
        );
        assert_eq!(
            short_g,
            Err(ContactError::FreeVelocityLength {
                len: 3,
                expected: 6
            })
        );
        assert!(matches!(
            non_square,
            Err(ContactError::DelassusShape { cols: 3, .. })
        ));
    }

    #[test]
    fn reject_negative_friction() {
        let result = ContactProblem::new(
            DMatrix::identity(6, 6),
            DVector::zeros(6),
            vec![0.5, -0.1],
        );
        assert_eq!(
            result,
            Err(ContactError::InvalidFriction { index: 1, mu: -0.1 })
        );

        let result =
            ContactProblem::new(DMatrix::identity(3, 3), DVector::zeros(3), vec![Float::NAN]);
        assert!(matches!(result, Err(ContactError::InvalidFriction { .. })));
    }

    #[test]
    fn blocks_and_velocities() {
        // Arrange
        let mut G = DMatrix::identity(6, 6);
        G[(2, 5)] = -1.0;
        G[(5, 2)] = -1.0;
        let g = dvector![0., 0., -1., 0.5, 0., 0.];
        let problem = ContactProblem::new(G, g, vec![0.5, 0.5]).unwrap();

        // Act
        let lambda = dvector![0., 0., 2., 0., 0., 1.];
        let contacts = problem.contacts(&lambda);

        // Assert
        assert_eq!(problem.num_contacts(), 2);
        assert_eq!(problem.block(0, 1)[(2, 2)], -1.0);
        assert_eq!(problem.free_velocity(1), vector![0.5, 0., 0.]);
        assert_eq!(contacts[0].velocity, vector![0., 0., 0.]);
        assert_eq!(contacts[1].velocity, vector![0.5, 0., -1.]);
        assert_eq!(normal_components(&lambda), vec![2., 1.]);
    }

    #[test]
    fn classify_contacts() {
        let sticking = Contact {
            index: 0,
            impulse: vector![0.1, 0., 1.],
            mu: 0.5,
            velocity: vector![0., 0., 0.],
        };
        let sliding = Contact {
            index: 1,
            impulse: vector![-0.5, 0., 1.],
            mu: 0.5,
            velocity: vector![2., 0., 0.],
        };
        let separated = Contact {
            index: 2,
            impulse: Vector3::zeros(),
            mu: 0.5,
            velocity: vector![0., 0., 3.],
        };

        let tol = 1e-9;
        assert!(sticking.is_sticking(tol) && !sticking.is_sliding(tol));
        assert!(sliding.is_sliding(tol) && !sliding.is_sticking(tol));
        assert!(sliding.friction_power() < 0.);
        assert!(separated.is_separated(tol));
    }

    #[test]
    fn empty_problem() {
        let problem = ContactProblem::empty();
        assert_eq!(problem.num_contacts(), 0);
        assert_eq!(problem.signorini_residual(&DVector::zeros(0)), 0.);
    }
}
