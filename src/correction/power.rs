//! Rough component power and voltage ratings for correction networks.

use serde::Serialize;

/// Minimum wattage suggested for the notch damping resistor.
const MIN_NOTCH_RESISTOR_WATTS: f64 = 5.0;

/// Share of amplifier power assumed to reach the Zobel branch.
const ZOBEL_POWER_SHARE: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZobelPower {
    pub resistor_watts: f64,
    pub capacitor_volts: f64,
}

impl ZobelPower {
    /// Estimate for a driver of DC resistance `re` driven with `power` watts.
    pub fn estimate(re: f64, power: f64) -> Self {
        let resistor_watts = ZOBEL_POWER_SHARE * power;
        Self {
            resistor_watts,
            capacitor_volts: 2.0 * (resistor_watts * re).sqrt(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NotchPower {
    pub resistor_watts: f64,
    pub inductor_amps: f64,
    pub capacitor_volts: f64,
}

impl NotchPower {
    /// Estimate for a notch with damping resistor `rn` on a driver of DC
    /// resistance `re`, driven with `power` watts.
    pub fn estimate(re: f64, rn: f64, power: f64) -> Self {
        Self {
            resistor_watts: (power * re / rn).max(MIN_NOTCH_RESISTOR_WATTS),
            inductor_amps: (power / re).sqrt(),
            capacitor_volts: (power * rn).sqrt(),
        }
    }
}
