use frictional_contact::{
    admm::AdmmSettings,
    diagnostics::{admm_residual_history, pgs_residual_history},
    helpers::stacked_boxes,
    pgs::PgsSettings,
    plot::plot_residuals,
    DEFAULT_RHO,
};

/// Heavy box on a light box: PGS stalls while ADMM keeps reducing the
/// Signorini residual
pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    let m_bottom = 1e-3;
    let m_top = 1e3;
    let mu = 0.5;
    let dt = 1e-2;
    let problem = stacked_boxes(m_bottom, m_top, mu, dt)?;

    let max_iter = 100;
    let pgs = pgs_residual_history(&problem, &PgsSettings::new(0., max_iter))?;
    let admm = admm_residual_history(&problem, &AdmmSettings::new(DEFAULT_RHO, max_iter))?;
    let admm_tuned = admm_residual_history(&problem, &AdmmSettings::new(1e-3, max_iter))?;

    let histories = vec![
        ("PGS", pgs),
        ("ADMM rho = 10", admm),
        ("ADMM rho = 1e-3", admm_tuned),
    ];
    for (label, history) in histories.iter() {
        println!("{:>16}: residual {:.3e}", label, history[history.len() - 1]);
    }

    plot_residuals(&histories, "pgs_vs_ccp.png")?;
    Ok(())
}
