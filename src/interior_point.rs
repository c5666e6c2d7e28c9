use clarabel::{
    algebra::CscMatrix,
    solver::{
        DefaultSettings, DefaultSolver, IPSolver, SolverStatus,
        SupportedConeT::{self, NonnegativeConeT, SecondOrderConeT, ZeroConeT},
    },
};
use na::{DMatrix, DVector};

use crate::{
    contact::{ContactProblem, NORMAL, TANGENT_X, TANGENT_Y},
    error::{ContactError, ContactResult},
    types::Float,
    util::dense_to_csc_upper,
};

/// Solve the same conic relaxation as ADMM with clarabel's interior-point
/// method, as a reference for the first-order solvers.
///
/// clarabel takes constraints as s = b - Aλ ∈ K. Per contact,
///     s = (μλ_N, λ_Tx, λ_Ty) ∈ SOC(3)
/// or λ_T = 0 when μ = 0, where the second-order cone has no interior. λ_N ≥ 0
/// is a separate non-negative row for every contact.
pub fn solve_contact_interior_point(problem: &ContactProblem) -> ContactResult<DVector<Float>> {
    let n_contacts = problem.num_contacts();
    let n = 3 * n_contacts;
    if n_contacts == 0 {
        return Ok(DVector::zeros(0));
    }

    let (colptr, rowval, nzval) = dense_to_csc_upper(&problem.G);
    let P = CscMatrix::new(n, n, colptr, rowval, nzval);
    let q: Vec<Float> = problem.g.iter().copied().collect();

    let n_frictionless = problem.mus.iter().filter(|mu| **mu == 0.).count();
    let n_rows = n - n_frictionless + n_contacts;
    let mut A_dense = DMatrix::<Float>::zeros(n_rows, n);
    let mut cones: Vec<SupportedConeT<Float>> = Vec::with_capacity(n_contacts + 1);
    let mut row = 0;
    for (i, mu) in problem.mus.iter().enumerate() {
        let col = 3 * i;
        if *mu > 0. {
            A_dense[(row, col + NORMAL)] = -mu;
            row += 1;
            cones.push(SecondOrderConeT(3));
        } else {
            cones.push(ZeroConeT(2));
        }
        A_dense[(row, col + TANGENT_X)] = -1.;
        A_dense[(row + 1, col + TANGENT_Y)] = -1.;
        row += 2;
    }
    for i in 0..n_contacts {
        A_dense[(row + i, 3 * i + NORMAL)] = -1.;
    }
    cones.push(NonnegativeConeT(n_contacts));

    let A = dense_to_csc(&A_dense);
    let b = vec![0.; n_rows];

    let settings = DefaultSettings {
        verbose: false,
        ..DefaultSettings::default()
    };
    let mut solver = DefaultSolver::new(&P, &q, &A, &b, &cones, settings);
    solver.solve();

    match solver.solution.status {
        SolverStatus::Solved | SolverStatus::AlmostSolved => {
            Ok(DVector::from_vec(solver.solution.x.clone()))
        }
        status => Err(ContactError::InteriorPoint(format!("{:?}", status))),
    }
}

/// Column-compressed copy of a dense matrix, skipping zeros
fn dense_to_csc(m: &DMatrix<Float>) -> CscMatrix<Float> {
    let mut colptr = vec![0];
    let mut rowval = vec![];
    let mut nzval = vec![];
    for column in m.column_iter() {
        for (i, value) in column.iter().enumerate() {
            if *value != 0. {
                rowval.push(i);
                nzval.push(*value);
            }
        }
        colptr.push(rowval.len());
    }
    CscMatrix::new(m.nrows(), m.ncols(), colptr, rowval, nzval)
}

#[cfg(test)]
mod interior_point_tests {
    use na::{dvector, vector};

    use crate::{
        admm::{solve_contact_admm, AdmmSettings},
        assert_vec_close,
        diagnostics::cone_violation,
        helpers::{cube_on_ground, resting_contact, sliding_contact},
    };

    use super::*;

    #[test]
    fn resting_contact_cancels_penetration() {
        let problem = resting_contact(1.0, 0.5).unwrap();
        let lambda = solve_contact_interior_point(&problem).unwrap();
        assert_vec_close!(lambda, dvector![0., 0., 1.], 1e-6);
    }

    #[test]
    fn matches_admm_on_separating_slide() {
        // Arrange
        let problem = sliding_contact(vector![1.0, 0.0, 0.1], 0.5).unwrap();

        // Act
        let reference = solve_contact_interior_point(&problem).unwrap();
        let admm = solve_contact_admm(&problem, &AdmmSettings::new(1.0, 300)).unwrap();

        // Assert
        assert_vec_close!(reference, dvector![-0.16, 0., 0.32], 1e-6);
        assert_vec_close!(admm, reference, 1e-5);
    }

    #[test]
    fn frictionless_stays_non_negative() {
        let problem = sliding_contact(vector![1.0, 0.0, 0.5], 0.0).unwrap();
        let lambda = solve_contact_interior_point(&problem).unwrap();
        assert_vec_close!(lambda, dvector![0., 0., 0.], 1e-6);
    }

    #[test]
    fn sliding_cube_matches_admm() {
        // Arrange
        let problem = cube_on_ground(1.0, 1.0, vector![2.0, 0.5, 0.], 0.3, 1e-2).unwrap();

        // Act
        let reference = solve_contact_interior_point(&problem).unwrap();
        let admm = solve_contact_admm(&problem, &AdmmSettings::new(1.0, 2000)).unwrap();

        // Assert
        assert!(cone_violation(&reference, &problem.mus).unwrap() < 1e-6);
        // the optimum is unique in Gλ even where λ is not
        let c_reference = problem.contact_velocity(&reference);
        let c_admm = problem.contact_velocity(&admm);
        assert_vec_close!(c_admm, c_reference, 1e-5);
    }

    #[test]
    fn empty_problem() {
        let lambda = solve_contact_interior_point(&ContactProblem::empty()).unwrap();
        assert_eq!(lambda.len(), 0);
    }
}
