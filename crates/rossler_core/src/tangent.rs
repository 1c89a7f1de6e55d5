//! Variational (tangent-space) extension of the Rössler flow.
//!
//! The state and its Jacobian are integrated together:
//! `dx/dt = f(x)`, `dJ/dt = A(x(t)) J`, where `A` is the stability matrix. The
//! integrator works on a flat 12-component buffer; [`TangentState::pack`] and
//! [`TangentState::unpack`] are the only places that know its layout
//! (state first, then the matrix in row-major order).

use crate::error::{FlowError, Result};
use crate::rossler::{stability_matrix, velocity, JacobianMatrix, State};
use crate::traits::DynamicalSystem;

pub const STATE_DIM: usize = 3;
pub const TANGENT_DIM: usize = STATE_DIM + STATE_DIM * STATE_DIM;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentState {
    pub state: State,
    pub jacobian: JacobianMatrix,
}

impl TangentState {
    pub fn new(state: State, jacobian: JacobianMatrix) -> Self {
        Self { state, jacobian }
    }

    /// Initial condition for a Jacobian integration: an infinitesimal
    /// perturbation at time zero maps to itself.
    pub fn identity_at(state: State) -> Self {
        Self::new(state, JacobianMatrix::identity())
    }

    pub fn pack(&self) -> [f64; TANGENT_DIM] {
        let mut buffer = [0.0; TANGENT_DIM];
        buffer[..STATE_DIM].copy_from_slice(self.state.as_slice());
        for i in 0..STATE_DIM {
            for j in 0..STATE_DIM {
                buffer[STATE_DIM + i * STATE_DIM + j] = self.jacobian[(i, j)];
            }
        }
        buffer
    }

    pub fn unpack(buffer: &[f64]) -> Result<Self> {
        if buffer.len() != TANGENT_DIM {
            return Err(FlowError::invalid(format!(
                "Augmented state must have {} components, got {}.",
                TANGENT_DIM,
                buffer.len()
            )));
        }
        Ok(Self::new(
            State::from_column_slice(&buffer[..STATE_DIM]),
            JacobianMatrix::from_row_slice(&buffer[STATE_DIM..]),
        ))
    }
}

/// Right-hand side of the augmented system, dimension 12.
#[derive(Debug, Clone, Copy, Default)]
pub struct RosslerTangent;

impl DynamicalSystem<f64> for RosslerTangent {
    fn dimension(&self) -> usize {
        TANGENT_DIM
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        // Always the live state slice: A(x) changes along the trajectory.
        let state = State::from_column_slice(&x[..STATE_DIM]);
        let phi = JacobianMatrix::from_row_slice(&x[STATE_DIM..TANGENT_DIM]);

        out[..STATE_DIM].copy_from_slice(velocity(&state, t).as_slice());

        let phi_dot = stability_matrix(&state) * phi;
        for i in 0..STATE_DIM {
            for j in 0..STATE_DIM {
                out[STATE_DIM + i * STATE_DIM + j] = phi_dot[(i, j)];
            }
        }
    }
}

/// Checked form of [`RosslerTangent`] for a single packed buffer.
pub fn augmented_velocity(augmented: &[f64], t: f64) -> Result<[f64; TANGENT_DIM]> {
    if augmented.len() != TANGENT_DIM {
        return Err(FlowError::invalid(format!(
            "Augmented state must have {} components, got {}.",
            TANGENT_DIM,
            augmented.len()
        )));
    }
    let mut out = [0.0; TANGENT_DIM];
    RosslerTangent.apply(t, augmented, &mut out);
    Ok(out)
}
