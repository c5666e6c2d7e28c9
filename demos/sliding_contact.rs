use frictional_contact::{
    admm::AdmmSettings, helpers::sliding_contact, pgs::PgsSettings, solver::ContactSolver,
};
use nalgebra::vector;

/// A contact sliding while its bodies move apart. The NCP solution carries no
/// impulse, the conic relaxation pushes the bodies apart.
pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    let g = vector![1.0, 0.0, 0.1];
    let solvers = [
        ContactSolver::Pgs(PgsSettings::default()),
        ContactSolver::AdmmCcp(AdmmSettings::new(1.0, 300)),
        ContactSolver::InteriorPoint,
    ];

    for mu in [0.0, 0.2, 0.5, 1.0] {
        let problem = sliding_contact(g, mu)?;
        println!("mu = {}", mu);
        for solver in solvers.iter() {
            let lambda = solver.solve(&problem)?;
            let contact = problem.contacts(&lambda)[0];
            println!(
                "{:>16}: λ = [{:.4}, {:.4}, {:.4}], c_N = {:.4}, friction power {:.4}",
                solver.name(),
                lambda[0],
                lambda[1],
                lambda[2],
                contact.normal_velocity(),
                contact.friction_power()
            );
        }
    }
    Ok(())
}
