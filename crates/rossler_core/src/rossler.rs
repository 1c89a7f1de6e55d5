//! The Rössler vector field and its analytic stability matrix.
//!
//! ```text
//! dx/dt = -y - z
//! dy/dt = x + A y
//! dz/dt = B + z (x - C)
//! ```

use crate::traits::{coeff, DynamicalSystem, Scalar};
use nalgebra::{Matrix3, Vector3};

pub const A: f64 = 0.2;
pub const B: f64 = 0.2;
pub const C: f64 = 5.7;

/// A point `(x, y, z)` in phase space.
pub type State = Vector3<f64>;

/// Linearized sensitivity; entry `(i, j)` is the derivative of component `i` with respect to `x_j`.
pub type JacobianMatrix = Matrix3<f64>;

/// The Rössler flow as a three-dimensional autonomous system.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rossler;

impl<T: Scalar> DynamicalSystem<T> for Rossler {
    fn dimension(&self) -> usize {
        3
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let (a, b, c) = (coeff::<T>(A), coeff::<T>(B), coeff::<T>(C));
        out[0] = -x[1] - x[2];
        out[1] = x[0] + a * x[1];
        out[2] = b + x[2] * (x[0] - c);
    }
}

/// Evaluates the velocity at `state`. The field is autonomous, `t` only exists for
/// signature compatibility with time-dependent right-hand sides.
pub fn velocity(state: &State, t: f64) -> State {
    let mut out = State::zeros();
    Rossler.apply(t, state.as_slice(), out.as_mut_slice());
    out
}

/// Analytic Jacobian of [`velocity`] at `state`.
pub fn stability_matrix(state: &State) -> JacobianMatrix {
    let (x, z) = (state[0], state[2]);
    Matrix3::new(
        0.0, -1.0, -1.0, //
        1.0, A, 0.0, //
        z, 0.0, x - C,
    )
}

/// The two fixed points of the flow, inner (near the origin) first.
pub fn equilibria() -> [State; 2] {
    let root = (C * C - 4.0 * A * B).sqrt();
    let at = |z: f64| State::new(A * z, -z, z);
    [at((C - root) / (2.0 * A)), at((C + root) / (2.0 * A))]
}

#[cfg(test)]
mod tests {
    use super::{equilibria, stability_matrix, velocity, Rossler, State};
    use crate::traits::DynamicalSystem;

    fn sample_states() -> Vec<State> {
        vec![
            State::new(1.0, 2.0, 3.0),
            State::new(9.269083709793489945, 0.0, 2.581592405683282632),
            State::new(-4.5, 3.25, 0.01),
            State::new(0.0, 0.0, 0.0),
            State::new(12.0, -7.0, 18.5),
        ]
    }

    #[test]
    fn velocity_matches_closed_form() {
        let v = velocity(&State::new(1.0, 2.0, 3.0), 0.0);
        assert!((v[0] + 5.0).abs() < 1e-15);
        assert!((v[1] - 1.4).abs() < 1e-15);
        assert!((v[2] + 13.9).abs() < 1e-12);
    }

    #[test]
    fn velocity_ignores_time() {
        let s = State::new(-1.0, 0.5, 2.0);
        assert_eq!(velocity(&s, 0.0), velocity(&s, 123.456));
    }

    #[test]
    fn stability_matrix_matches_central_differences() {
        let h = 1e-6;
        for s in sample_states() {
            let a = stability_matrix(&s);
            for j in 0..3 {
                let mut plus = s;
                let mut minus = s;
                plus[j] += h;
                minus[j] -= h;
                let column = (velocity(&plus, 0.0) - velocity(&minus, 0.0)) / (2.0 * h);
                for i in 0..3 {
                    assert!(
                        (a[(i, j)] - column[i]).abs() < 1e-7,
                        "entry ({i}, {j}) at {s:?}: analytic {}, numeric {}",
                        a[(i, j)],
                        column[i]
                    );
                }
            }
        }
    }

    #[test]
    fn generic_field_agrees_across_scalars() {
        let s = State::new(0.75, -1.25, 4.0);
        let mut out = [0.0f32; 3];
        Rossler.apply(0.0f32, &[0.75, -1.25, 4.0], &mut out);
        let expected = velocity(&s, 0.0);
        for i in 0..3 {
            assert!((out[i] as f64 - expected[i]).abs() < 1e-5);
        }
        assert_eq!(DynamicalSystem::<f64>::dimension(&Rossler), 3);
    }

    #[test]
    fn equilibria_are_fixed_points() {
        let [inner, outer] = equilibria();
        assert!(inner.norm() < outer.norm());
        for p in [inner, outer] {
            assert!(velocity(&p, 0.0).norm() < 1e-10, "velocity at {p:?}");
        }
        assert!((inner[2] - 0.0351).abs() < 1e-3);
        assert!((outer[2] - 28.465).abs() < 1e-2);
    }
}
