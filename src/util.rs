use na::{DMatrix, Vector2, Vector3};

use crate::{
    contact::{NORMAL, TANGENT_X, TANGENT_Y},
    types::Float,
};

/// Log a message to the browser console on wasm, to stdout elsewhere.
#[macro_export]
macro_rules! flog {
    ($($arg:tt)*) => {
        $crate::util::log_message(&format!($($arg)*))
    };
}

pub fn log_message(message: &str) {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            web_sys::console::log_1(&message.into());
        } else {
            println!("{}", message);
        }
    }
}

/// Tangential part (x, y) of a contact-frame vector
pub fn tangential(v: &Vector3<Float>) -> Vector2<Float> {
    Vector2::new(v[TANGENT_X], v[TANGENT_Y])
}

pub fn tangential_norm(v: &Vector3<Float>) -> Float {
    tangential(v).norm()
}

/// Build a contact-frame vector from its tangential and normal parts
pub fn contact_vector(t: &Vector2<Float>, n: Float) -> Vector3<Float> {
    let mut v = Vector3::zeros();
    v[TANGENT_X] = t.x;
    v[TANGENT_Y] = t.y;
    v[NORMAL] = n;
    v
}

/// Convert the upper triangle of a dense matrix to the column-compressed
/// layout clarabel expects for its quadratic cost term.
pub fn dense_to_csc_upper(m: &DMatrix<Float>) -> (Vec<usize>, Vec<usize>, Vec<Float>) {
    let mut colptr = Vec::with_capacity(m.ncols() + 1);
    let mut rowval = vec![];
    let mut nzval = vec![];
    colptr.push(0);
    for j in 0..m.ncols() {
        for i in 0..=j.min(m.nrows().saturating_sub(1)) {
            let value = m[(i, j)];
            if value != 0.0 {
                rowval.push(i);
                nzval.push(value);
            }
        }
        colptr.push(rowval.len());
    }
    (colptr, rowval, nzval)
}

#[macro_export]
macro_rules! assert_close {
    ($left:expr, $right:expr, $tolerance:expr) => {
        let left = $left;
        let right = $right;
        let tol = $tolerance;
        let diff = (left - right).abs();
        if diff > tol {
            panic!(
                "assertion failed: {} ~= {} \
                (tolerance: {}, difference: {})",
                left, right, tol, diff
            );
        }
    };
}

#[macro_export]
macro_rules! assert_vec_close {
    ($left:expr, $right:expr, $tolerance:expr) => {
        let left = &$left;
        let right = &$right;
        let tol = $tolerance;
        assert_eq!(left.len(), right.len(), "length mismatch");
        for (a, b) in left.iter().zip(right.iter()) {
            $crate::assert_close!(a, b, tol);
        }
    };
}
