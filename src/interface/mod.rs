use na::{DMatrix, DVector};
use wasm_bindgen::prelude::*;
use web_sys::js_sys;

use crate::{
    admm::AdmmSettings,
    contact::ContactProblem,
    diagnostics::compute_sig_residual,
    error::{ContactError, ContactResult},
    pgs::PgsSettings,
    simulate::{step, BoxStack},
    solver::ContactSolver,
    types::Float,
};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Build a contact problem from a row-major Delassus matrix
pub fn problem_from_row_major(G: &[Float], g: &[Float], mus: &[Float]) -> ContactResult<ContactProblem> {
    let n = g.len();
    if G.len() != n * n {
        return Err(ContactError::FlatDelassusLength {
            len: G.len(),
            expected: n * n,
        });
    }
    ContactProblem::new(
        DMatrix::from_row_slice(n, n, G),
        DVector::from_column_slice(g),
        mus.to_vec(),
    )
}

fn to_js_array(v: &DVector<Float>) -> js_sys::Float64Array {
    js_sys::Float64Array::from(v.as_slice())
}

fn to_js_error(e: ContactError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Solve the contact NCP with PGS. G is row-major.
#[wasm_bindgen]
pub fn solveContactPGS(
    G: &[Float],
    g: &[Float],
    mus: &[Float],
    tol: Float,
    max_iter: usize,
) -> Result<js_sys::Float64Array, JsValue> {
    let problem = problem_from_row_major(G, g, mus).map_err(to_js_error)?;
    let lambda = ContactSolver::Pgs(PgsSettings::new(tol, max_iter))
        .solve(&problem)
        .map_err(to_js_error)?;
    Ok(to_js_array(&lambda))
}

/// Solve the CCP relaxation with ADMM. G is row-major.
#[wasm_bindgen]
pub fn solveContactADMM(
    G: &[Float],
    g: &[Float],
    mus: &[Float],
    rho: Float,
    max_iter: usize,
) -> Result<js_sys::Float64Array, JsValue> {
    let problem = problem_from_row_major(G, g, mus).map_err(to_js_error)?;
    let lambda = ContactSolver::AdmmCcp(AdmmSettings::new(rho, max_iter))
        .solve(&problem)
        .map_err(to_js_error)?;
    Ok(to_js_array(&lambda))
}

#[wasm_bindgen]
pub fn signoriniResidual(lambda_n: &[Float], c_n: &[Float], c_n_star: &[Float]) -> Result<Float, JsValue> {
    compute_sig_residual(lambda_n, c_n, c_n_star).map_err(to_js_error)
}

/// WebAssembly interface to a box stack stepped by one of the solvers.
#[wasm_bindgen]
pub struct InterfaceBoxStack {
    stack: BoxStack,
    solver: ContactSolver,
}

#[wasm_bindgen]
impl InterfaceBoxStack {
    /// Step forward and return the box centers (x, y, z) of bottom then top
    #[wasm_bindgen]
    pub fn step(&mut self, dt: Float) -> Result<js_sys::Float64Array, JsValue> {
        step(&mut self.stack, dt, &self.solver).map_err(to_js_error)?;
        Ok(to_js_array(&self.stack.q))
    }

    #[wasm_bindgen]
    pub fn gaps(&self) -> js_sys::Float64Array {
        js_sys::Float64Array::from(&self.stack.gaps()[..])
    }
}

/// Create a box stack resting on the ground, stepped with PGS
#[wasm_bindgen]
pub fn createBoxStackPGS(
    m_bottom: Float,
    m_top: Float,
    half_height: Float,
    mu: Float,
    max_iter: usize,
) -> InterfaceBoxStack {
    InterfaceBoxStack {
        stack: BoxStack::new(m_bottom, m_top, half_height, mu),
        solver: ContactSolver::Pgs(PgsSettings::new(0., max_iter)),
    }
}

/// Create a box stack resting on the ground, stepped with ADMM
#[wasm_bindgen]
pub fn createBoxStackADMM(
    m_bottom: Float,
    m_top: Float,
    half_height: Float,
    mu: Float,
    rho: Float,
    max_iter: usize,
) -> InterfaceBoxStack {
    InterfaceBoxStack {
        stack: BoxStack::new(m_bottom, m_top, half_height, mu),
        solver: ContactSolver::AdmmCcp(AdmmSettings::new(rho, max_iter)),
    }
}
