//! Linear stability of equilibria and periodic orbits.

use crate::error::Result;
use crate::flow::jacobian_with;
use crate::integrator::IntegratorSettings;
use crate::rossler::{equilibria, stability_matrix, JacobianMatrix, State};
use num_complex::Complex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquilibriumStability {
    pub state: Vec<f64>,
    /// Row-major.
    pub stability_matrix: Vec<f64>,
    pub eigenvalues: Vec<Complex<f64>>,
}

/// Eigenvalues of a 3x3 matrix, largest modulus first.
pub fn eigenvalues(matrix: &JacobianMatrix) -> Vec<Complex<f64>> {
    let mut values: Vec<Complex<f64>> = matrix.complex_eigenvalues().iter().copied().collect();
    values.sort_by(|a, b| {
        b.norm()
            .partial_cmp(&a.norm())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    values
}

/// Floquet multipliers of the orbit through `state` with the given period.
/// For a true periodic orbit one multiplier equals 1 (the direction along the flow).
pub fn floquet_multipliers(state: &State, period: f64) -> Result<Vec<Complex<f64>>> {
    floquet_multipliers_with(state, period, &IntegratorSettings::default())
}

pub fn floquet_multipliers_with(
    state: &State,
    period: f64,
    settings: &IntegratorSettings,
) -> Result<Vec<Complex<f64>>> {
    let monodromy = jacobian_with(state, period, settings)?;
    Ok(eigenvalues(&monodromy))
}

pub fn equilibrium_stability() -> Vec<EquilibriumStability> {
    equilibria()
        .iter()
        .map(|point| {
            let a = stability_matrix(point);
            EquilibriumStability {
                state: point.iter().copied().collect(),
                stability_matrix: a.transpose().iter().copied().collect(),
                eigenvalues: eigenvalues(&a),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{eigenvalues, equilibrium_stability, floquet_multipliers, floquet_multipliers_with};
    use crate::error::FlowError;
    use crate::integrator::{IntegratorSettings, Method};
    use crate::rossler::{JacobianMatrix, State};

    #[test]
    fn eigenvalues_are_sorted_by_modulus() {
        let m = JacobianMatrix::new(1.0, 0.0, 0.0, 0.0, -3.0, 0.0, 0.0, 0.0, 2.0);
        let values = eigenvalues(&m);
        let re: Vec<f64> = values.iter().map(|v| v.re).collect();
        assert_eq!(values.len(), 3);
        assert!((re[0] + 3.0).abs() < 1e-12);
        assert!((re[1] - 2.0).abs() < 1e-12);
        assert!((re[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rotation_block_gives_conjugate_pair() {
        let m = JacobianMatrix::new(0.0, -2.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.5);
        let values = eigenvalues(&m);
        assert!((values[0].norm() - 2.0).abs() < 1e-12);
        assert!((values[0].im.abs() - 2.0).abs() < 1e-12);
        assert!((values[0].im + values[1].im).abs() < 1e-12);
        assert!((values[2].re - 0.5).abs() < 1e-12);
    }

    #[test]
    fn equilibria_are_saddle_foci() {
        let report = equilibrium_stability();
        assert_eq!(report.len(), 2);
        for entry in &report {
            assert_eq!(entry.state.len(), 3);
            assert_eq!(entry.stability_matrix.len(), 9);
            assert_eq!(entry.stability_matrix[1], -1.0);
            // One real eigenvalue and a complex pair.
            let complex = entry.eigenvalues.iter().filter(|v| v.im.abs() > 1e-9).count();
            assert_eq!(complex, 2);
        }
        // The inner point spirals outward on its unstable plane.
        let inner = &report[0];
        assert!(inner.eigenvalues.iter().any(|v| v.im.abs() > 1e-9 && v.re > 0.0));
        assert!(inner.eigenvalues.iter().any(|v| v.im.abs() < 1e-12 && v.re < -5.0));
    }

    #[test]
    fn period_one_orbit_has_unit_multiplier() {
        let s = State::new(9.269083709793489945, 0.0, 2.581592405683282632);
        let multipliers = floquet_multipliers(&s, 5.881088455554846384).expect("monodromy");
        assert!((multipliers[0].re + 2.40395).abs() < 1e-3, "{multipliers:?}");
        assert!(multipliers[0].im.abs() < 1e-9);
        assert!((multipliers[1] - 1.0).norm() < 1e-4, "{multipliers:?}");
        assert!(multipliers[2].norm() < 1e-6);
    }

    #[test]
    fn floquet_multipliers_follow_the_given_settings() {
        let s = State::new(9.269083709793489945, 0.0, 2.581592405683282632);
        let period = 5.881088455554846384;
        let fixed = IntegratorSettings {
            method: Method::Rk4,
            ..IntegratorSettings::default()
        };
        let adaptive = floquet_multipliers(&s, period).expect("monodromy");
        let stepped = floquet_multipliers_with(&s, period, &fixed).expect("monodromy");
        assert!((stepped[0] - adaptive[0]).norm() < 1e-4, "{stepped:?} vs {adaptive:?}");

        // A budget too small for the period surfaces instead of falling back to defaults.
        let starved = IntegratorSettings {
            max_steps: 10,
            ..IntegratorSettings::default()
        };
        assert!(matches!(
            floquet_multipliers_with(&s, period, &starved),
            Err(FlowError::IntegrationFailure { .. })
        ));
    }

    #[test]
    fn floquet_rejects_non_positive_period() {
        let s = State::new(1.0, 0.0, 0.0);
        assert!(matches!(
            floquet_multipliers(&s, 0.0),
            Err(FlowError::InvalidArgument(_))
        ));
    }
}
