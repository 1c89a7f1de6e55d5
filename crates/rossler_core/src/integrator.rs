//! Initial value problem driver.
//!
//! `integrate` walks a grid of output times and returns one sample per time.
//! [`Method::Dopri5`] hands each interval to the Dormand-Prince 5(4) solver of
//! `ode_solvers`, which owns the step-size control and lands exactly on the
//! interval end. [`Method::Tsit5`] and [`Method::Rk4`] take fixed steps per grid
//! interval with the steppers in [`crate::solvers`].

use crate::error::{FlowError, Result};
use crate::rossler::State;
use crate::solvers::{Tsit5, RK4};
use crate::traits::{DynamicalSystem, Steppable};
use log::{debug, warn};
use ode_solvers::dop_shared::{IntegrationError, OutputType, System};
use ode_solvers::dopri5::Dopri5;
use ode_solvers::DVector;
use serde::{Deserialize, Serialize};

/// Step-size stabilization exponent of the Dormand-Prince controller.
const CONTROLLER_BETA: f64 = 0.04;

/// Accepted steps between two stiffness checks.
const STIFFNESS_CHECK_INTERVAL: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Method {
    /// Adaptive Dormand-Prince 5(4).
    #[default]
    Dopri5,
    /// Fixed-step Tsitouras 5(4), one step per grid interval unless `max_step` splits it.
    Tsit5,
    /// Fixed-step classic Runge-Kutta, one step per grid interval unless `max_step` splits it.
    Rk4,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorSettings {
    pub method: Method,
    pub rtol: f64,
    pub atol: f64,
    /// First trial step. `None` picks one from the initial slope.
    pub initial_step: Option<f64>,
    pub max_step: Option<f64>,
    /// Step budget for the whole integration, rejected steps included.
    pub max_steps: usize,
    pub safety: f64,
    pub min_factor: f64,
    pub max_factor: f64,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            method: Method::Dopri5,
            rtol: 1.49012e-8,
            atol: 1.49012e-8,
            initial_step: None,
            max_step: None,
            max_steps: 1_000_000,
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 10.0,
        }
    }
}

impl IntegratorSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.rtol > 0.0 && self.rtol.is_finite()) {
            return Err(FlowError::invalid("rtol must be positive and finite."));
        }
        if !(self.atol > 0.0 && self.atol.is_finite()) {
            return Err(FlowError::invalid("atol must be positive and finite."));
        }
        if let Some(max_step) = self.max_step {
            if !(max_step > 0.0 && max_step.is_finite()) {
                return Err(FlowError::invalid("max_step must be positive and finite."));
            }
        }
        if let Some(initial_step) = self.initial_step {
            if !(initial_step > 0.0 && initial_step.is_finite()) {
                return Err(FlowError::invalid(
                    "initial_step must be positive and finite.",
                ));
            }
        }
        if self.max_steps == 0 {
            return Err(FlowError::invalid("max_steps must be greater than zero."));
        }
        if !(self.safety > 0.0 && self.safety <= 1.0) {
            return Err(FlowError::invalid("safety must lie in (0, 1]."));
        }
        if !(self.min_factor > 0.0 && self.min_factor < 1.0 && self.max_factor > 1.0) {
            return Err(FlowError::invalid(
                "Step factors must satisfy 0 < min_factor < 1 < max_factor.",
            ));
        }
        Ok(())
    }
}

/// Sampled solution of an initial value problem.
/// `points` holds `times.len()` rows of `dimension` values each, row 0 being the initial condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub dimension: usize,
    pub times: Vec<f64>,
    pub points: Vec<f64>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn point(&self, index: usize) -> Option<&[f64]> {
        let start = index.checked_mul(self.dimension)?;
        let end = start.checked_add(self.dimension)?;
        self.points.get(start..end)
    }

    pub fn final_time(&self) -> Option<f64> {
        self.times.last().copied()
    }

    pub fn final_point(&self) -> Option<&[f64]> {
        self.point(self.len().checked_sub(1)?)
    }

    /// Time series of one coordinate, e.g. `x(t)` for index 0.
    pub fn component(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.dimension {
            return None;
        }
        Some(
            self.points
                .chunks_exact(self.dimension)
                .map(|row| row[index])
                .collect(),
        )
    }

    /// Samples as phase-space states; only defined for three-dimensional trajectories.
    pub fn states(&self) -> Result<Vec<State>> {
        if self.dimension != 3 {
            return Err(FlowError::invalid(format!(
                "Trajectory has dimension {}, expected 3.",
                self.dimension
            )));
        }
        Ok(self
            .points
            .chunks_exact(3)
            .map(State::from_column_slice)
            .collect())
    }
}

/// `count` evenly spaced values from `start` to `end`; the last value is exactly `end`.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            let mut grid: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
            grid[count - 1] = end;
            grid
        }
    }
}

/// Integrates from `times[0]` and records the solution at every entry of `times`.
/// Repeated times repeat the previous sample.
pub fn integrate<S>(
    system: &S,
    initial: &[f64],
    times: &[f64],
    settings: &IntegratorSettings,
) -> Result<Trajectory>
where
    S: DynamicalSystem<f64>,
{
    settings.validate()?;
    let dim = system.dimension();
    if initial.len() != dim {
        return Err(FlowError::invalid(format!(
            "Initial state dimension mismatch. Expected {}, got {}.",
            dim,
            initial.len()
        )));
    }
    if initial.iter().any(|v| !v.is_finite()) {
        return Err(FlowError::invalid("Initial state must be finite."));
    }
    if times.is_empty() {
        return Err(FlowError::invalid("Time grid must contain at least one point."));
    }
    if times.iter().any(|t| !t.is_finite()) {
        return Err(FlowError::invalid("Time grid must be finite."));
    }
    if times.windows(2).any(|w| w[1] < w[0]) {
        return Err(FlowError::invalid("Time grid must be non-decreasing."));
    }

    if let Some(max_step) = settings.max_step {
        let needed = ((times[times.len() - 1] - times[0]) / max_step).ceil();
        if needed > settings.max_steps as f64 {
            return Err(FlowError::failure(
                times[0],
                format!(
                    "span needs at least {} steps of at most {}, budget is {}",
                    needed, max_step, settings.max_steps
                ),
            ));
        }
    }

    let mut points = Vec::with_capacity(times.len().saturating_mul(dim));
    points.extend_from_slice(initial);
    let mut state = initial.to_vec();
    let mut t = times[0];
    let mut budget = StepBudget::new(settings.max_steps);

    match settings.method {
        Method::Dopri5 => {
            for &target in &times[1..] {
                advance_adaptive(system, settings, &mut t, &mut state, target, &mut budget)?;
                points.extend_from_slice(&state);
            }
        }
        Method::Tsit5 => {
            let mut stepper = Tsit5::new(dim);
            for &target in &times[1..] {
                advance_fixed(
                    system,
                    &mut stepper,
                    settings,
                    &mut t,
                    &mut state,
                    target,
                    &mut budget,
                )?;
                points.extend_from_slice(&state);
            }
        }
        Method::Rk4 => {
            let mut stepper = RK4::new(dim);
            for &target in &times[1..] {
                advance_fixed(
                    system,
                    &mut stepper,
                    settings,
                    &mut t,
                    &mut state,
                    target,
                    &mut budget,
                )?;
                points.extend_from_slice(&state);
            }
        }
    }

    debug!(
        "Integrated {} samples over [{}, {}] with {:?}: {} accepted, {} rejected steps.",
        times.len(),
        times[0],
        t,
        settings.method,
        budget.accepted,
        budget.rejected
    );

    Ok(Trajectory {
        dimension: dim,
        times: times.to_vec(),
        points,
    })
}

/// Integrates over `[0, t_final]` and returns the two samples.
pub fn integrate_to<S>(
    system: &S,
    initial: &[f64],
    t_final: f64,
    settings: &IntegratorSettings,
) -> Result<Trajectory>
where
    S: DynamicalSystem<f64>,
{
    integrate(system, initial, &[0.0, t_final], settings)
}

/// Steps spent so far against `max_steps`.
#[derive(Debug)]
struct StepBudget {
    limit: usize,
    accepted: usize,
    rejected: usize,
}

impl StepBudget {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            accepted: 0,
            rejected: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.accepted + self.rejected)
    }

    fn exhausted(&self, t: f64, target: f64) -> FlowError {
        warn!("Step budget of {} exhausted at t = {}.", self.limit, t);
        FlowError::failure(
            t,
            format!("exceeded {} steps before reaching t = {}", self.limit, target),
        )
    }
}

/// Presents a [`DynamicalSystem`] to `ode_solvers`.
struct OdeSystem<'a, S>(&'a S);

impl<S: DynamicalSystem<f64>> System<f64, DVector<f64>> for OdeSystem<'_, S> {
    fn system(&self, t: f64, y: &DVector<f64>, dy: &mut DVector<f64>) {
        self.0.apply(t, y.as_slice(), dy.as_mut_slice());
    }
}

fn advance_adaptive<S: DynamicalSystem<f64>>(
    system: &S,
    settings: &IntegratorSettings,
    t: &mut f64,
    state: &mut [f64],
    target: f64,
    budget: &mut StepBudget,
) -> Result<()> {
    let span = target - *t;
    if span <= 0.0 {
        return Ok(());
    }
    let remaining = budget.remaining();
    if remaining == 0 {
        return Err(budget.exhausted(*t, target));
    }

    let mut solver = Dopri5::from_param(
        OdeSystem(system),
        *t,
        target,
        0.0,
        DVector::from_column_slice(state),
        settings.rtol,
        settings.atol,
        settings.safety,
        CONTROLLER_BETA,
        settings.min_factor,
        settings.max_factor,
        settings.max_step.map_or(span, |max_step| max_step.min(span)),
        settings.initial_step.unwrap_or(0.0),
        u32::try_from(remaining).unwrap_or(u32::MAX),
        STIFFNESS_CHECK_INTERVAL,
        OutputType::Sparse,
    );
    let stats = solver
        .integrate()
        .map_err(|error| adaptive_failure(error, budget, target))?;
    budget.accepted += stats.accepted_steps as usize;
    budget.rejected += stats.rejected_steps as usize;

    let end = solver
        .y_out()
        .last()
        .ok_or_else(|| FlowError::failure(*t, "solver returned no output"))?;
    state.copy_from_slice(end.as_slice());
    *t = target;
    if state.iter().any(|v| !v.is_finite()) {
        warn!("Adaptive integration produced a non-finite state at t = {}.", target);
        return Err(FlowError::failure(target, "state became non-finite"));
    }
    Ok(())
}

fn adaptive_failure(error: IntegrationError, budget: &StepBudget, target: f64) -> FlowError {
    match error {
        IntegrationError::MaxNumStepReached { x, .. } => budget.exhausted(x, target),
        IntegrationError::StepSizeUnderflow { x } => {
            warn!("Step size underflow at t = {}.", x);
            FlowError::failure(x, "step size underflow; tolerances cannot be met")
        }
        IntegrationError::StiffnessDetected { x } => {
            warn!("Stiffness detected at t = {}.", x);
            FlowError::failure(x, "problem became stiff")
        }
    }
}

fn advance_fixed<S, P>(
    system: &S,
    stepper: &mut P,
    settings: &IntegratorSettings,
    t: &mut f64,
    state: &mut [f64],
    target: f64,
    budget: &mut StepBudget,
) -> Result<()>
where
    S: DynamicalSystem<f64>,
    P: Steppable<f64>,
{
    let span = target - *t;
    if span <= 0.0 {
        return Ok(());
    }
    let substeps = match settings.max_step {
        Some(max_step) => (span / max_step).ceil().max(1.0) as usize,
        None => 1,
    };
    if substeps > budget.remaining() {
        return Err(budget.exhausted(*t, target));
    }
    let dt = span / substeps as f64;
    for _ in 0..substeps {
        stepper.step(system, t, state, dt);
    }
    budget.accepted += substeps;
    *t = target;
    if state.iter().any(|v| !v.is_finite()) {
        warn!("Fixed-step integration produced a non-finite state at t = {}.", target);
        return Err(FlowError::failure(target, "state became non-finite"));
    }
    Ok(())
}
