use na::{vector, DMatrix, DVector, Matrix3, Vector3};

use crate::{contact::ContactProblem, error::ContactResult, types::Float, GRAVITY};

/// Build a single contact with unit Delassus block, approaching the surface
/// at the given normal speed
pub fn resting_contact(speed: Float, mu: Float) -> ContactResult<ContactProblem> {
    sliding_contact(vector![0., 0., -speed], mu)
}

/// Build a single contact with unit Delassus block and free velocity g,
/// given as (c_Tx, c_Ty, c_N)
pub fn sliding_contact(g: Vector3<Float>, mu: Float) -> ContactResult<ContactProblem> {
    ContactProblem::new(
        DMatrix::identity(3, 3),
        DVector::from_column_slice(g.as_slice()),
        vec![mu],
    )
}

/// Build the contact problem of a cube with side l resting on the ground on
/// its 4 bottom corners, with linear velocity v and no rotation, over one
/// step of dt under gravity.
///
/// Generalized velocity is (v, ω) about the center of mass.
pub fn cube_on_ground(
    m: Float,
    l: Float,
    v: Vector3<Float>,
    mu: Float,
    dt: Float,
) -> ContactResult<ContactProblem> {
    let h = l / 2.;
    let corners = [
        vector![h, h, -h],
        vector![-h, h, -h],
        vector![-h, -h, -h],
        vector![h, -h, -h],
    ];

    // corner velocity v + ω × r = v - [r]× ω
    let mut J = DMatrix::<Float>::zeros(3 * corners.len(), 6);
    for (k, r) in corners.iter().enumerate() {
        J.fixed_view_mut::<3, 3>(3 * k, 0)
            .copy_from(&Matrix3::identity());
        J.fixed_view_mut::<3, 3>(3 * k, 3)
            .copy_from(&(-r.cross_matrix()));
    }

    let moment = m * l * l / 6.;
    let masses = DVector::from_vec(vec![m, m, m, moment, moment, moment]);

    let mut v_free = DVector::<Float>::zeros(6);
    v_free
        .fixed_rows_mut::<3>(0)
        .copy_from(&(v + vector![0., 0., -GRAVITY * dt]));

    build_problem(&J, &masses, &v_free, vec![mu; corners.len()])
}

/// Build the contact problem of two point-mass boxes stacked on the ground,
/// both at rest, over one step of dt under gravity.
///
/// Contact 0 is between the ground and the bottom box, contact 1 between the
/// bottom box and the top box. Generalized velocity is (v_bottom, v_top).
pub fn stacked_boxes(
    m_bottom: Float,
    m_top: Float,
    mu: Float,
    dt: Float,
) -> ContactResult<ContactProblem> {
    let J = stack_jacobian(&[0, 1]);
    let masses = stack_masses(m_bottom, m_top);

    let mut v_free = DVector::<Float>::zeros(6);
    v_free[2] = -GRAVITY * dt;
    v_free[5] = -GRAVITY * dt;

    build_problem(&J, &masses, &v_free, vec![mu, mu])
}

/// Contact Jacobian rows of the two-box stack for the given contacts,
/// 0 for ground-bottom and 1 for bottom-top
pub fn stack_jacobian(contacts: &[usize]) -> DMatrix<Float> {
    let mut J = DMatrix::<Float>::zeros(3 * contacts.len(), 6);
    for (row, contact) in contacts.iter().enumerate() {
        let mut block = J.fixed_view_mut::<3, 6>(3 * row, 0);
        match contact {
            0 => block.fixed_view_mut::<3, 3>(0, 0).fill_with_identity(),
            _ => {
                block
                    .fixed_view_mut::<3, 3>(0, 0)
                    .copy_from(&(-Matrix3::<Float>::identity()));
                block.fixed_view_mut::<3, 3>(0, 3).fill_with_identity();
            }
        }
    }
    J
}

/// Diagonal of the two-box stack's mass matrix
pub fn stack_masses(m_bottom: Float, m_top: Float) -> DVector<Float> {
    DVector::from_vec(vec![m_bottom, m_bottom, m_bottom, m_top, m_top, m_top])
}

/// Assemble G = J M⁻¹ Jᵀ and g = J v_free for a diagonal mass matrix,
/// given by its diagonal
pub fn build_problem(
    J: &DMatrix<Float>,
    masses: &DVector<Float>,
    v_free: &DVector<Float>,
    mus: Vec<Float>,
) -> ContactResult<ContactProblem> {
    let Minv = DMatrix::from_diagonal(&masses.map(|m| 1. / m));
    ContactProblem::new(J * Minv * J.transpose(), J * v_free, mus)
}
