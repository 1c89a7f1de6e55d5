//! WASM bridge for `rossler_core`.
//!
//! Vectors cross the boundary as `Float64Array`s, matrices row-major. Structured
//! results (trajectories, stability reports) are serialized with `serde-wasm-bindgen`.

use js_sys::Float64Array;
use nalgebra::Matrix3;
use rossler_core::flow::{flow_with, jacobian_with, trajectory};
use rossler_core::integrator::{IntegratorSettings, Method};
use rossler_core::stability::{equilibrium_stability, floquet_multipliers_with};
use rossler_core::{stability_matrix, velocity, FlowError, State};
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmRossler {
    settings: IntegratorSettings,
}

#[wasm_bindgen]
impl WasmRossler {
    #[wasm_bindgen(constructor)]
    pub fn new(solver_name: &str, rtol: f64, atol: f64) -> Result<WasmRossler, JsValue> {
        console_error_panic_hook::set_once();
        let settings =
            build_settings(solver_name, rtol, atol).map_err(|e| JsValue::from_str(&e))?;
        Ok(WasmRossler { settings })
    }

    pub fn velocity(&self, state: Vec<f64>, t: f64) -> Result<Float64Array, JsValue> {
        let state = parse_state(&state).map_err(|e| JsValue::from_str(&e))?;
        Ok(Float64Array::from(velocity(&state, t).as_slice()))
    }

    pub fn flow(&self, state: Vec<f64>, deltat: f64) -> Result<Float64Array, JsValue> {
        let state = parse_state(&state).map_err(|e| JsValue::from_str(&e))?;
        let end = flow_with(&state, deltat, &self.settings).map_err(to_js)?;
        Ok(Float64Array::from(end.as_slice()))
    }

    pub fn stability_matrix(&self, state: Vec<f64>) -> Result<Float64Array, JsValue> {
        let state = parse_state(&state).map_err(|e| JsValue::from_str(&e))?;
        Ok(Float64Array::from(row_major(&stability_matrix(&state)).as_slice()))
    }

    pub fn jacobian(&self, state: Vec<f64>, t: f64) -> Result<Float64Array, JsValue> {
        let state = parse_state(&state).map_err(|e| JsValue::from_str(&e))?;
        let matrix = jacobian_with(&state, t, &self.settings).map_err(to_js)?;
        Ok(Float64Array::from(row_major(&matrix).as_slice()))
    }

    pub fn trajectory(
        &self,
        state: Vec<f64>,
        t_final: f64,
        samples: u32,
    ) -> Result<JsValue, JsValue> {
        let state = parse_state(&state).map_err(|e| JsValue::from_str(&e))?;
        let orbit =
            trajectory(&state, t_final, samples as usize, &self.settings).map_err(to_js)?;
        to_value(&orbit).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn floquet_multipliers(&self, state: Vec<f64>, period: f64) -> Result<JsValue, JsValue> {
        let state = parse_state(&state).map_err(|e| JsValue::from_str(&e))?;
        let multipliers =
            floquet_multipliers_with(&state, period, &self.settings).map_err(to_js)?;
        to_value(&multipliers)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn equilibria(&self) -> Result<JsValue, JsValue> {
        to_value(&equilibrium_stability())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

fn to_js(err: FlowError) -> JsValue {
    JsValue::from_str(&format!("{}", err))
}

pub(crate) fn build_settings(
    solver_name: &str,
    rtol: f64,
    atol: f64,
) -> Result<IntegratorSettings, String> {
    let method = match solver_name {
        "dopri5" => Method::Dopri5,
        "tsit5" => Method::Tsit5,
        "rk4" => Method::Rk4,
        _ => return Err("Unknown solver".to_string()),
    };
    let settings = IntegratorSettings {
        method,
        rtol,
        atol,
        ..IntegratorSettings::default()
    };
    settings.validate().map_err(|e| format!("{}", e))?;
    Ok(settings)
}

pub(crate) fn parse_state(values: &[f64]) -> Result<State, String> {
    if values.len() != 3 {
        return Err(format!(
            "State dimension mismatch. Expected 3, got {}.",
            values.len()
        ));
    }
    Ok(State::from_column_slice(values))
}

pub(crate) fn row_major(matrix: &Matrix3<f64>) -> Vec<f64> {
    matrix.transpose().iter().copied().collect()
}
