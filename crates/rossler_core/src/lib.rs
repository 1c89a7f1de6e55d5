pub mod error;
pub mod flow;
pub mod integrator;
pub mod rossler;
pub mod solvers;
pub mod stability;
pub mod tangent;
/// The `rossler_core` crate integrates the Rössler flow together with its
/// variational equations, giving trajectories and Jacobians of the time-t flow map.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (ODE right-hand sides), `Steppable` (Solvers).
/// - **Rossler**: the vector field, its analytic stability matrix and the fixed points.
/// - **Tangent**: the augmented state/Jacobian system used for tangent-space propagation.
/// - **Solvers / Integrator**: fixed-step RK4 and Tsit5 steppers, adaptive Dormand-Prince
///   integration over output grids.
/// - **Flow**: the flow map, the flow Jacobian and sampled trajectories.
/// - **Stability**: eigenvalues at equilibria and Floquet multipliers of periodic orbits.
pub mod traits;

pub use error::FlowError;
pub use flow::{flow, jacobian, trajectory};
pub use integrator::{IntegratorSettings, Method, Trajectory};
pub use rossler::{stability_matrix, velocity, JacobianMatrix, State};
