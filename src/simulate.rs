use na::{vector, DVector};

use crate::{
    contact::ContactProblem,
    error::ContactResult,
    flog,
    helpers::{build_problem, stack_jacobian, stack_masses},
    solver::ContactSolver,
    types::Float,
    GRAVITY,
};

/// Two boxes stacked on the ground, modeled as point masses that only move
/// by translation. Generalized coordinates are the box centers
///     q = (p_bottom, p_top),  v = (v_bottom, v_top)
pub struct BoxStack {
    pub q: DVector<Float>,
    pub v: DVector<Float>,
    pub masses: DVector<Float>,
    pub half_heights: [Float; 2], // bottom, top
    pub mu: Float,
    pub margin: Float, // contacts within this gap are handed to the solver
}

impl BoxStack {
    /// Both boxes at rest, bottom on the ground and top on the bottom
    pub fn new(m_bottom: Float, m_top: Float, half_height: Float, mu: Float) -> Self {
        let h = half_height;
        BoxStack {
            q: DVector::from_vec(vec![0., 0., h, 0., 0., 3. * h]),
            v: DVector::zeros(6),
            masses: stack_masses(m_bottom, m_top),
            half_heights: [h, h],
            mu,
            margin: 1e-3,
        }
    }

    pub fn update(&mut self, q: &DVector<Float>, v: &DVector<Float>) {
        self.q.copy_from(q);
        self.v.copy_from(v);
    }

    /// Signed gaps of the ground-bottom and bottom-top contacts
    pub fn gaps(&self) -> [Float; 2] {
        let [h_bottom, h_top] = self.half_heights;
        let z_bottom = self.q[2];
        let z_top = self.q[5];
        [z_bottom - h_bottom, z_top - z_bottom - h_bottom - h_top]
    }

    /// Contacts whose gap is within the margin
    pub fn active_contacts(&self) -> Vec<usize> {
        self.gaps()
            .iter()
            .enumerate()
            .filter(|(_, gap)| **gap <= self.margin)
            .map(|(i, _)| i)
            .collect()
    }

    /// Velocity the boxes would have at the end of the step without contact
    pub fn free_velocity(&self, dt: Float) -> DVector<Float> {
        let gravity = vector![0., 0., -GRAVITY * dt];
        let mut v_free = self.v.clone();
        for body in 0..2 {
            let mut v_body = v_free.fixed_rows_mut::<3>(3 * body);
            v_body += gravity;
        }
        v_free
    }

    /// Contact problem of the next step over the active contacts
    pub fn contact_problem(&self, dt: Float) -> ContactResult<(Vec<usize>, ContactProblem)> {
        let active = self.active_contacts();
        let J = stack_jacobian(&active);
        let v_free = self.free_velocity(dt);
        let problem = build_problem(&J, &self.masses, &v_free, vec![self.mu; active.len()])?;
        Ok((active, problem))
    }
}

/// Step the stack forward by dt seconds with one contact solve.
///
/// Velocities are updated first, v = v_free + M⁻¹ Jᵀ λ, then positions with
/// the new velocities (semi-implicit Euler). Returns the impulses of the
/// active contacts.
pub fn step(
    stack: &mut BoxStack,
    dt: Float,
    solver: &ContactSolver,
) -> ContactResult<(Vec<usize>, DVector<Float>)> {
    let (active, problem) = stack.contact_problem(dt)?;
    let lambda = solver.solve(&problem)?;

    let J = stack_jacobian(&active);
    let dv = (J.transpose() * &lambda).component_div(&stack.masses);
    let v = stack.free_velocity(dt) + dv;
    let q = &stack.q + &v * dt;

    stack.update(&q, &v);
    Ok((active, lambda))
}

/// Simulate the stack from 0 to final_time with a time step of dt.
/// Returns the configurations and velocities at each time step.
pub fn simulate(
    stack: &mut BoxStack,
    final_time: Float,
    dt: Float,
    solver: &ContactSolver,
) -> ContactResult<(Vec<DVector<Float>>, Vec<DVector<Float>>)> {
    let mut t = 0.0;
    let mut qs = vec![stack.q.clone()];
    let mut vs = vec![stack.v.clone()];
    while t < final_time {
        step(stack, dt, solver)?;
        qs.push(stack.q.clone());
        vs.push(stack.v.clone());

        t += dt;
    }

    let [ground_gap, stack_gap] = stack.gaps();
    flog!(
        "{}: {} steps, gaps ground {:.3e}, stack {:.3e}",
        solver.name(),
        qs.len() - 1,
        ground_gap,
        stack_gap
    );

    Ok((qs, vs))
}
