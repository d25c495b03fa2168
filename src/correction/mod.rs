//! Impedance correction networks.
//!
//! Two networks are connected across the driver terminals:
//!
//! - A **Zobel** (series RC) cancels the rise caused by voice-coil inductance:
//!   `Rz = Re·margin`, `Cz = Le/Re²`.
//! - A **resonance notch** (series RLC) mirrors the motional tank and absorbs
//!   the impedance peak at `fs`:
//!   `R = Re·Qms/Qes`, `L = Qes·Re/(2πfs)`, `C = 1/(2πfs·Qes·Re)`.
//!
//! The corrected impedance combines the driver and both branches as parallel
//! admittances.

mod power;

pub use power::{NotchPower, ZobelPower};

use std::f64::consts::PI;

use num_complex::Complex64;
use serde::Serialize;

use crate::components::{ComponentSet, ComponentValue, Placement};
use crate::config::DesignConfig;
use crate::driver::{impedance, ThieleSmall};
use crate::error::{ensure_positive, Result, XoverError};
use crate::NOTCH_RESONANCE_TOLERANCE;

/// Series RC branch compensating voice-coil inductance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZobelNetwork {
    /// Ω
    pub rz: f64,
    /// F
    pub cz: f64,
}

impl ZobelNetwork {
    /// `Rz + 1/(jωCz)`
    pub fn impedance(&self, omega: f64) -> Complex64 {
        Complex64::new(self.rz, -1.0 / (omega * self.cz))
    }

    pub fn components(&self) -> Result<Vec<ComponentValue>> {
        Ok(vec![
            ComponentValue::resistor("RZ", self.rz, "Zobel resistor", Placement::Branch)?,
            ComponentValue::capacitor("CZ", self.cz, "Zobel capacitor", Placement::Branch)?,
        ])
    }

    pub fn description(&self) -> String {
        format!(
            "Zobel network: {:.1}Ω in series with {:.2}µF, connected across driver terminals",
            self.rz,
            self.cz * 1e6
        )
    }
}

/// Series RLC branch tuned to the driver resonance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NotchNetwork {
    /// Ω
    pub r: f64,
    /// H
    pub l: f64,
    /// F
    pub c: f64,
}

impl NotchNetwork {
    /// `R + jωL + 1/(jωC)`
    pub fn impedance(&self, omega: f64) -> Complex64 {
        Complex64::new(self.r, omega * self.l - 1.0 / (omega * self.c))
    }

    /// LC resonance of the branch, `1/(2π√(LC))`.
    pub fn resonant_frequency(&self) -> f64 {
        1.0 / (2.0 * PI * (self.l * self.c).sqrt())
    }

    pub fn components(&self) -> Result<Vec<ComponentValue>> {
        Ok(vec![
            ComponentValue::resistor("RN", self.r, "Notch damping resistor", Placement::Branch)?,
            ComponentValue::inductor("LN", self.l, "Notch inductor", Placement::Branch)?,
            ComponentValue::capacitor("CN", self.c, "Notch capacitor", Placement::Branch)?,
        ])
    }

    pub fn description(&self) -> String {
        format!(
            "Series RLC notch: {:.1}Ω, {:.2}mH, {:.2}µF, connected across driver terminals",
            self.r,
            self.l * 1e3,
            self.c * 1e6
        )
    }
}

/// Zobel network for a driver with DC resistance `re` (Ω) and inductance `le` (mH).
///
/// `margin` scales `Rz` (1.0 exact, 1.25 conservative). Fails when `le <= 0`:
/// there is no inductance to compensate.
pub fn zobel_network(re: f64, le: f64, margin: f64) -> Result<ZobelNetwork> {
    let re = ensure_positive("re", re)?;
    let margin = ensure_positive("margin", margin)?;
    if !(le.is_finite() && le > 0.0) {
        return Err(XoverError::invalid(
            "le",
            format!("Zobel compensation needs positive voice-coil inductance, got {le} mH"),
        ));
    }

    let le_si = le * 1e-3;
    Ok(ZobelNetwork {
        rz: re * margin,
        cz: le_si / (re * re),
    })
}

/// Resonance notch for a driver with the given `fs`, `Qms`, `Qes`, `Re`.
///
/// The resulting branch resonates at `fs`; a deviation of more than 1% is
/// reported as an error rather than returned.
pub fn notch_filter(fs: f64, qms: f64, qes: f64, re: f64) -> Result<NotchNetwork> {
    let fs = ensure_positive("fs", fs)?;
    let qms = ensure_positive("qms", qms)?;
    let qes = ensure_positive("qes", qes)?;
    let re = ensure_positive("re", re)?;

    let ws = 2.0 * PI * fs;
    let notch = NotchNetwork {
        r: re * qms / qes,
        l: qes * re / ws,
        c: 1.0 / (ws * qes * re),
    };

    let f_check = notch.resonant_frequency();
    if !((f_check - fs).abs() / fs <= NOTCH_RESONANCE_TOLERANCE) {
        return Err(XoverError::invalid(
            "fs",
            format!("notch resonates at {f_check} Hz instead of {fs} Hz"),
        ));
    }
    Ok(notch)
}

/// A complete correction design for one driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correction {
    /// Ω
    pub target_impedance: f64,
    pub zobel: Option<ZobelNetwork>,
    pub zobel_power: Option<ZobelPower>,
    pub notch: NotchNetwork,
    pub notch_power: NotchPower,
    pub components: ComponentSet,
}

impl Correction {
    pub fn components(&self) -> &ComponentSet {
        &self.components
    }
}

/// Design a Zobel (when `Le > 0`) and a resonance notch for `params`.
///
/// `target_impedance` defaults to `Re`.
pub fn full_correction(params: &ThieleSmall, target_impedance: Option<f64>) -> Result<Correction> {
    full_correction_with(params, target_impedance, &DesignConfig::default())
}

/// [`full_correction`] using the Zobel margin and fallback power rating from `config`.
pub fn full_correction_with(
    params: &ThieleSmall,
    target_impedance: Option<f64>,
    config: &DesignConfig,
) -> Result<Correction> {
    let target_impedance = match target_impedance {
        Some(target) => ensure_positive("target_impedance", target)?,
        None => params.re(),
    };
    let power = params
        .power_rating()
        .unwrap_or(config.default_power_rating);
    let zobel_margin = config.zobel_margin;

    let mut components = ComponentSet::new();

    let (zobel, zobel_power) = if params.le() > 0.0 {
        let zobel = zobel_network(params.re(), params.le(), zobel_margin)?;
        components.extend(zobel.components()?);
        (Some(zobel), Some(ZobelPower::estimate(params.re(), power)))
    } else {
        (None, None)
    };

    let notch = notch_filter(params.fs(), params.qms(), params.qes(), params.re())?;
    components.extend(notch.components()?);
    let notch_power = NotchPower::estimate(params.re(), notch.r, power);

    tracing::debug!(
        target_impedance,
        zobel = zobel.is_some(),
        notch_r = notch.r,
        "designed impedance correction"
    );

    Ok(Correction {
        target_impedance,
        zobel,
        zobel_power,
        notch,
        notch_power,
        components,
    })
}

/// Impedance of the driver with `correction` connected across it.
///
/// ```text
/// Y = 1/Z_driver + 1/Z_zobel + 1/Z_notch,   Z = 1/Y
/// ```
pub fn corrected_impedance(
    params: &ThieleSmall,
    correction: &Correction,
    frequencies: &[f64],
) -> Result<Vec<Complex64>> {
    let driver = impedance(params, frequencies)?;
    Ok(frequencies
        .iter()
        .zip(driver)
        .map(|(&f, z_driver)| {
            let omega = 2.0 * PI * f;
            let mut admittance = z_driver.inv();
            if let Some(zobel) = &correction.zobel {
                admittance += zobel.impedance(omega).inv();
            }
            admittance += correction.notch.impedance(omega).inv();
            admittance.inv()
        })
        .collect())
}
