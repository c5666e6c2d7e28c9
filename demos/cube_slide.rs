use frictional_contact::{
    admm::AdmmSettings,
    diagnostics::{admm_residual_history, cone_violation, pgs_residual_history},
    helpers::cube_on_ground,
    pgs::PgsSettings,
    plot::plot_residuals,
    solver::ContactSolver,
};
use nalgebra::vector;

/// Cube sliding on the ground on its 4 bottom corners
pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    let m = 3.0;
    let l = 1.0;
    let mu = 0.3;
    let dt = 1e-2;
    let problem = cube_on_ground(m, l, vector![2.0, 0.5, 0.0], mu, dt)?;

    let solvers = [
        ContactSolver::Pgs(PgsSettings::new(1e-12, 500)),
        ContactSolver::AdmmCcp(AdmmSettings::new(1.0, 500)),
        ContactSolver::InteriorPoint,
    ];
    for solver in solvers.iter() {
        let lambda = solver.solve(&problem)?;
        println!(
            "{}: residual {:.3e}, cone violation {:.3e}",
            solver.name(),
            problem.signorini_residual(&lambda),
            cone_violation(&lambda, &problem.mus)?
        );
        for contact in problem.contacts(&lambda) {
            println!(
                "  corner {}: λ_N {:.5}, |λ_T| {:.5}, |c_T| {:.4}, sliding {}",
                contact.index,
                contact.normal_impulse(),
                contact.tangential_impulse_norm(),
                contact.tangential_velocity_norm(),
                contact.is_sliding(1e-6)
            );
        }
    }

    let histories = vec![
        ("PGS", pgs_residual_history(&problem, &PgsSettings::new(0., 200))?),
        ("ADMM", admm_residual_history(&problem, &AdmmSettings::new(1.0, 200))?),
    ];
    plot_residuals(&histories, "cube_slide.png")?;
    Ok(())
}
