//! # Xover Core
//!
//! Analog network synthesis for loudspeakers.
//!
//! This library provides:
//! - A lumped electro-mechanical impedance model built from Thiele-Small parameters
//! - Impedance correction synthesis (Zobel and resonance notch networks)
//! - Passive crossover synthesis, 1st to 4th order, Butterworth/Linkwitz-Riley/Bessel
//! - Closed-form attenuator, compensation, and RC/RL/RLC filter networks
//! - Snapping of computed values onto E12/E24/E48/E96 standard values
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`components`] - Component values, standard value series, engineering notation
//! - [`driver`] - Thiele-Small parameters and the driver impedance model
//! - [`correction`] - Zobel and notch synthesis, corrected impedance
//! - [`topology`] - Topology registry and per-topology synthesis
//! - [`analysis`] - Frequency sweeps and ladder network response
//! - [`config`] - Design configuration (TOML)
//!
//! Every computation is a pure function of its inputs. Nothing is cached and
//! there is no global state, so all of it is safe to call from any thread.
//!
//! ## Usage
//!
//! ### Library
//!
//! ```
//! use xover_core::{full_correction, params, ESeries, ThieleSmall, TopologyRegistry};
//!
//! let driver = ThieleSmall::builder(6.0, 37.0, 2.79, 0.42).le(0.56).build()?;
//! let correction = full_correction(&driver, None)?;
//! for part in correction.components().snap_all(ESeries::E24)? {
//!     println!("{}: {}", part.component.reference, part.label);
//! }
//!
//! let registry = TopologyRegistry::new();
//! let crossover = registry.compute(
//!     "passive_crossover",
//!     &params! { "crossover_freq" => 2500.0, "impedance" => 8.0, "order" => 2.0 },
//! )?;
//! assert_eq!(crossover.references(), vec!["L_LP", "C_LP"]);
//! # Ok::<(), xover_core::XoverError>(())
//! ```
//!
//! ### Native CLI
//!
//! ```bash
//! xover design passive_crossover -p crossover_freq=2500 -p impedance=8 -p order=4 --series E12
//! xover correct driver.toml
//! ```
//!
//! ### WASM
//!
//! ```javascript
//! import { WasmDesigner } from 'xover_core';
//!
//! const designer = new WasmDesigner('E24');
//! const parts = JSON.parse(designer.calculate_topology('lpad', JSON.stringify({ impedance: 8, attenuation_db: 3 })));
//! ```

pub mod analysis;
pub mod components;
pub mod config;
pub mod correction;
pub mod driver;
pub mod error;
pub mod topology;

// Re-export main types for convenience
pub use components::{
    engineering_notation, snap_to_e_series, ComponentKind, ComponentSet, ComponentValue, ESeries,
    Placement, SnappedComponent,
};
pub use config::DesignConfig;
pub use correction::{
    corrected_impedance, full_correction, full_correction_with, notch_filter, zobel_network,
    Correction, NotchNetwork, ZobelNetwork,
};
pub use driver::{impedance, DriverRecord, ThieleSmall};
pub use error::{Result, XoverError};
pub use topology::{Topology, TopologyCategory, TopologyKind, TopologyRegistry};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

/// Relative tolerance between a supplied `Qts` and `Qms·Qes/(Qms+Qes)`.
pub const QTS_TOLERANCE: f64 = 0.05;

/// Maximum relative deviation of a notch network's resonance from `fs`.
pub const NOTCH_RESONANCE_TOLERANCE: f64 = 0.01;

/// Amplifier power in watts assumed when a driver has no rating.
pub const DEFAULT_POWER_RATING: f64 = 50.0;
