//! WASM bindings for Xover Core.
//!
//! Inputs and outputs cross the boundary as JSON strings, so a web front end
//! can pass the same parameter objects it would send to a server.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmDesigner } from 'xover_core';
//!
//! await init();
//!
//! const designer = new WasmDesigner('E24');
//! const parts = JSON.parse(designer.calculate_topology('passive_crossover', JSON.stringify({
//!   crossover_freq: 2500, impedance: 8, order: 4, alignment: 'linkwitz-riley', filter_type: 'both',
//! })));
//!
//! const driver = JSON.stringify({ re: 6.0, le: 0.56, fs: 37, qms: 2.79, qes: 0.42 });
//! const correction = JSON.parse(designer.correct_driver(driver));
//! ```

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::components::ESeries;
use crate::correction::full_correction_with;
use crate::driver::{impedance_magnitude, impedance_phase, DriverRecord, ThieleSmall};
use crate::error::XoverError;
use crate::topology::{ParamMap, TopologyCategory, TopologyRegistry};
use crate::DesignConfig;

fn js_error(err: XoverError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| {
        js_error(XoverError::WasmError {
            message: e.to_string(),
        })
    })
}

fn parse_driver(driver_json: &str) -> Result<ThieleSmall, JsValue> {
    let record = DriverRecord::from_json_str(driver_json).map_err(|e| {
        js_error(XoverError::WasmError {
            message: format!("invalid driver JSON: {e}"),
        })
    })?;
    ThieleSmall::try_from(record).map_err(js_error)
}

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// JavaScript-facing design session: a topology registry plus configuration.
#[wasm_bindgen]
pub struct WasmDesigner {
    registry: TopologyRegistry,
    config: DesignConfig,
}

#[wasm_bindgen]
impl WasmDesigner {
    /// Create a designer snapping onto `series` (`"E12"`, `"E24"`, `"E48"`, `"E96"`).
    #[wasm_bindgen(constructor)]
    pub fn new(series: &str) -> Result<WasmDesigner, JsValue> {
        let series: ESeries = series.parse().map_err(js_error)?;
        Ok(WasmDesigner {
            registry: TopologyRegistry::new(),
            config: DesignConfig::new().with_series(series),
        })
    }

    /// Set the Zobel resistor margin used by [`correct_driver`](Self::correct_driver).
    #[wasm_bindgen]
    pub fn set_zobel_margin(&mut self, margin: f64) {
        self.config.zobel_margin = margin;
    }

    /// Compute a topology from a JSON parameter object.
    ///
    /// # Returns
    /// JSON object of `reference -> component`.
    #[wasm_bindgen]
    pub fn calculate_topology(&self, name: &str, params_json: &str) -> Result<String, JsValue> {
        let params: ParamMap = serde_json::from_str(params_json).map_err(|e| {
            js_error(XoverError::WasmError {
                message: format!("invalid parameter JSON: {e}"),
            })
        })?;
        let parts = self.registry.compute(name, &params).map_err(js_error)?;
        to_json(&parts)
    }

    /// Compute a topology and snap every value onto the designer's series.
    #[wasm_bindgen]
    pub fn calculate_snapped(&self, name: &str, params_json: &str) -> Result<String, JsValue> {
        let params: ParamMap = serde_json::from_str(params_json).map_err(|e| {
            js_error(XoverError::WasmError {
                message: format!("invalid parameter JSON: {e}"),
            })
        })?;
        let parts = self.registry.compute(name, &params).map_err(js_error)?;
        let snapped = parts.snap_all(self.config.series).map_err(js_error)?;
        to_json(&snapped)
    }

    /// List topology descriptors, optionally restricted to one category.
    #[wasm_bindgen]
    pub fn list_topologies(&self, category: Option<String>) -> Result<String, JsValue> {
        let category = category
            .map(|c| c.parse::<TopologyCategory>())
            .transpose()
            .map_err(js_error)?;
        to_json(&self.registry.list(category))
    }

    /// Design a Zobel and notch for a driver given as a JSON record.
    #[wasm_bindgen]
    pub fn correct_driver(&self, driver_json: &str) -> Result<String, JsValue> {
        let driver = parse_driver(driver_json)?;
        let correction = full_correction_with(&driver, None, &self.config).map_err(js_error)?;
        to_json(&correction)
    }

    /// Driver impedance over the configured sweep.
    ///
    /// # Returns
    /// JSON object `{ frequencies, magnitude, phase_deg }`.
    #[wasm_bindgen]
    pub fn driver_impedance(&self, driver_json: &str) -> Result<String, JsValue> {
        #[derive(Serialize)]
        struct Curve {
            frequencies: Vec<f64>,
            magnitude: Vec<f64>,
            phase_deg: Vec<f64>,
        }

        let driver = parse_driver(driver_json)?;
        let frequencies = self.config.sweep.frequencies().map_err(js_error)?;
        let magnitude = impedance_magnitude(&driver, &frequencies).map_err(js_error)?;
        let phase_deg = impedance_phase(&driver, &frequencies).map_err(js_error)?;
        to_json(&Curve {
            frequencies,
            magnitude,
            phase_deg,
        })
    }
}

/// Snap a value onto a standard series.
///
/// # Returns
/// `[snapped, error_pct]`
#[wasm_bindgen]
pub fn snap_to_e_series(value: f64, series: &str) -> Result<Vec<f64>, JsValue> {
    let (snapped, error_pct) = crate::snap_to_e_series(value, series).map_err(js_error)?;
    Ok(vec![snapped, error_pct])
}

/// Format a value in engineering notation, e.g. `4.7kΩ`.
#[wasm_bindgen]
pub fn engineering_notation(value: f64, unit: &str) -> String {
    crate::engineering_notation(value, unit)
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
