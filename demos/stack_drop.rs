use frictional_contact::{
    admm::AdmmSettings,
    pgs::PgsSettings,
    plot::plot_trajectories,
    simulate::{simulate, BoxStack},
    solver::ContactSolver,
    types::Float,
};

/// Heavy box resting on a light box, stepped with each solver
pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    let m_bottom = 1e-3;
    let m_top = 1e3;
    let half_height = 0.5;
    let mu = 0.5;

    let final_time = 1.0;
    let dt = 1e-2;

    let solvers = [
        ContactSolver::Pgs(PgsSettings::new(0., 100)),
        ContactSolver::AdmmCcp(AdmmSettings::default()),
        ContactSolver::AdmmCcp(AdmmSettings::new(1e-3, 100)),
    ];

    let mut series: Vec<(&str, Vec<Float>)> = vec![];
    for (solver, label) in solvers.iter().zip(["PGS", "ADMM rho = 10", "ADMM rho = 1e-3"]) {
        let mut stack = BoxStack::new(m_bottom, m_top, half_height, mu);
        let (qs, _vs) = simulate(&mut stack, final_time, dt, solver)?;
        series.push((label, qs.iter().map(|q| q[5]).collect()));
    }

    plot_trajectories(&series, dt, "top box height", "stack_drop.png")?;
    Ok(())
}
