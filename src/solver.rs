use na::DVector;

use crate::{
    admm::{solve_contact_admm, AdmmSettings},
    contact::ContactProblem,
    error::ContactResult,
    interior_point::solve_contact_interior_point,
    pgs::{solve_contact_pgs, PgsSettings},
    types::Float,
};

/// Contact solver to run on every step, with its settings
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ContactSolver {
    Pgs(PgsSettings),
    AdmmCcp(AdmmSettings),
    InteriorPoint,
}

impl Default for ContactSolver {
    fn default() -> Self {
        ContactSolver::Pgs(PgsSettings::default())
    }
}

impl ContactSolver {
    pub fn solve(&self, problem: &ContactProblem) -> ContactResult<DVector<Float>> {
        match self {
            ContactSolver::Pgs(settings) => solve_contact_pgs(problem, settings),
            ContactSolver::AdmmCcp(settings) => solve_contact_admm(problem, settings),
            ContactSolver::InteriorPoint => solve_contact_interior_point(problem),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContactSolver::Pgs(_) => "PGS",
            ContactSolver::AdmmCcp(_) => "ADMM-CCP",
            ContactSolver::InteriorPoint => "interior point",
        }
    }
}
