//! Time-t flow map of the Rössler system and its Jacobian.

use crate::error::{FlowError, Result};
use crate::integrator::{integrate, integrate_to, linspace, IntegratorSettings, Trajectory};
use crate::rossler::{JacobianMatrix, Rossler, State};
use crate::tangent::{RosslerTangent, TangentState};

/// Resolution of the Jacobian integration: no step is longer than
/// `1 / SAMPLES_PER_UNIT_TIME`, and only the end state is kept.
pub const SAMPLES_PER_UNIT_TIME: f64 = 100.0;

/// Lagrangian flow: the state reached from `state` after `deltat`.
pub fn flow(state: &State, deltat: f64) -> Result<State> {
    flow_with(state, deltat, &IntegratorSettings::default())
}

pub fn flow_with(state: &State, deltat: f64, settings: &IntegratorSettings) -> Result<State> {
    if !(deltat >= 0.0 && deltat.is_finite()) {
        return Err(FlowError::invalid(format!(
            "Flow time must be non-negative and finite, got {}.",
            deltat
        )));
    }
    let solution = integrate_to(&Rossler, state.as_slice(), deltat, settings)?;
    final_state(&solution, deltat)
}

/// Jacobian of the time-`t` flow map at `state`, from the variational equations.
pub fn jacobian(state: &State, t: f64) -> Result<JacobianMatrix> {
    jacobian_with(state, t, &IntegratorSettings::default())
}

pub fn jacobian_with(
    state: &State,
    t: f64,
    settings: &IntegratorSettings,
) -> Result<JacobianMatrix> {
    if !(t > 0.0 && t.is_finite()) {
        return Err(FlowError::invalid(format!(
            "Jacobian integration time must be positive and finite, got {}.",
            t
        )));
    }

    let initial = TangentState::identity_at(*state).pack();
    let resolution = 1.0 / SAMPLES_PER_UNIT_TIME;
    let settings = IntegratorSettings {
        max_step: Some(settings.max_step.map_or(resolution, |m| m.min(resolution))),
        ..*settings
    };

    let solution = integrate_to(&RosslerTangent, &initial, t, &settings)?;
    let last = solution
        .final_point()
        .ok_or_else(|| FlowError::failure(t, "integrator returned no samples"))?;
    Ok(TangentState::unpack(last)?.jacobian)
}

/// Samples the orbit through `state` at `samples` evenly spaced times in `[0, t_final]`.
pub fn trajectory(
    state: &State,
    t_final: f64,
    samples: usize,
    settings: &IntegratorSettings,
) -> Result<Trajectory> {
    if !(t_final > 0.0 && t_final.is_finite()) {
        return Err(FlowError::invalid(format!(
            "Final time must be positive and finite, got {}.",
            t_final
        )));
    }
    if samples < 2 {
        return Err(FlowError::invalid("A trajectory needs at least two samples."));
    }
    integrate(&Rossler, state.as_slice(), &linspace(0.0, t_final, samples), settings)
}

fn final_state(solution: &Trajectory, t: f64) -> Result<State> {
    solution
        .final_point()
        .map(State::from_column_slice)
        .ok_or_else(|| FlowError::failure(t, "integrator returned no samples"))
}
