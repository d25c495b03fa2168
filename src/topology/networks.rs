//! Closed-form networks: correction branches, attenuators, compensation, and
//! generic 1st/2nd-order filters.

use std::f64::consts::PI;

use serde::Serialize;

use super::crossover::FilterType;
use crate::components::{ComponentSet, ComponentValue, Placement};
use crate::correction::{notch_filter, zobel_network};
use crate::error::{ensure_positive, Result, XoverError};

/// Zobel branch across a driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZobelParams {
    /// Ω
    pub re: f64,
    /// mH
    pub le: f64,
    pub margin: f64,
}

impl ZobelParams {
    pub fn compute(&self) -> Result<ComponentSet> {
        let zobel = zobel_network(self.re, self.le, self.margin)?;
        Ok(ComponentSet::from_iter([
            ComponentValue::resistor("R1", zobel.rz, "Zobel resistor", Placement::Branch)?,
            ComponentValue::capacitor("C1", zobel.cz, "Zobel capacitor", Placement::Branch)?,
        ]))
    }
}

/// Resonance notch across a driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NotchParams {
    pub fs: f64,
    pub qms: f64,
    pub qes: f64,
    pub re: f64,
}

impl NotchParams {
    pub fn compute(&self) -> Result<ComponentSet> {
        let notch = notch_filter(self.fs, self.qms, self.qes, self.re)?;
        Ok(ComponentSet::from_iter([
            ComponentValue::resistor("R1", notch.r, "Notch damping resistor", Placement::Branch)?,
            ComponentValue::inductor("L1", notch.l, "Notch inductor", Placement::Branch)?,
            ComponentValue::capacitor("C1", notch.c, "Notch capacitor", Placement::Branch)?,
        ]))
    }
}

/// L-pad attenuator for level matching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LPadParams {
    /// Load impedance, Ω
    pub impedance: f64,
    pub attenuation_db: f64,
}

impl LPadParams {
    /// `ratio = 10^(dB/20)`, `R1 = Z·(ratio−1)/ratio`, `R2 = Z·ratio/(ratio−1)`.
    ///
    /// Attenuation must be positive; 0 dB has no finite shunt resistor.
    pub fn compute(&self) -> Result<ComponentSet> {
        let z = ensure_positive("impedance", self.impedance)?;
        let db = ensure_positive("attenuation_db", self.attenuation_db)?;
        let ratio = 10f64.powf(db / 20.0);

        let r1 = z * (ratio - 1.0) / ratio;
        let r2 = z * ratio / (ratio - 1.0);

        Ok(ComponentSet::from_iter([
            ComponentValue::resistor("R1", r1, "Series resistor", Placement::Series)?,
            ComponentValue::resistor("R2", r2, "Shunt resistor", Placement::Shunt)?,
        ]))
    }
}

/// Baffle step compensation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BaffleStepParams {
    /// Ω
    pub impedance: f64,
    /// Hz
    pub baffle_step_freq: f64,
}

impl BaffleStepParams {
    pub const DEFAULT_STEP_FREQ: f64 = 400.0;

    pub fn compute(&self) -> Result<ComponentSet> {
        let r = ensure_positive("impedance", self.impedance)?;
        let f_step = ensure_positive("baffle_step_freq", self.baffle_step_freq)?;

        Ok(ComponentSet::from_iter([
            ComponentValue::resistor(
                "R1",
                r,
                "Baffle step compensation resistor",
                Placement::Branch,
            )?,
            ComponentValue::inductor(
                "L1",
                r / (2.0 * PI * f_step),
                "Baffle step compensation inductor",
                Placement::Branch,
            )?,
        ]))
    }
}

/// Resistive voltage divider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DividerParams {
    pub vin: f64,
    pub vout: f64,
    /// Ω
    pub r_total: f64,
}

impl Default for DividerParams {
    fn default() -> Self {
        Self {
            vin: 1.0,
            vout: 0.5,
            r_total: 10_000.0,
        }
    }
}

impl DividerParams {
    pub fn compute(&self) -> Result<ComponentSet> {
        let vin = ensure_positive("vin", self.vin)?;
        let vout = ensure_positive("vout", self.vout)?;
        let r_total = ensure_positive("r_total", self.r_total)?;
        if vout >= vin {
            return Err(XoverError::invalid(
                "vout",
                format!("must be below vin ({vin}), got {vout}"),
            ));
        }

        let r2 = r_total * vout / vin;
        Ok(ComponentSet::from_iter([
            ComponentValue::resistor("R1", r_total - r2, "Top resistor", Placement::Series)?,
            ComponentValue::resistor("R2", r2, "Bottom resistor", Placement::Shunt)?,
        ]))
    }
}

/// 1st-order RC filter, `C = 1/(2π·fc·R)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RcFilterParams {
    pub cutoff_freq: f64,
    pub resistance: f64,
    pub filter_type: FilterType,
}

impl RcFilterParams {
    pub const DEFAULT_RESISTANCE: f64 = 10_000.0;

    pub fn compute(&self) -> Result<ComponentSet> {
        let fc = ensure_positive("cutoff_freq", self.cutoff_freq)?;
        let r = ensure_positive("resistance", self.resistance)?;
        let c = 1.0 / (2.0 * PI * fc * r);

        let (r_place, c_place) = match single_pole(self.filter_type)? {
            FilterType::Lowpass => (Placement::Series, Placement::Shunt),
            _ => (Placement::Shunt, Placement::Series),
        };
        let kind = self.filter_type.name();
        let resistor = ComponentValue::resistor("R1", r, format!("RC {kind} resistor"), r_place)?;
        let capacitor = ComponentValue::capacitor("C1", c, format!("RC {kind} capacitor"), c_place)?;

        Ok(series_first(resistor, capacitor))
    }
}

/// 1st-order RL filter, `L = R/(2π·fc)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RlFilterParams {
    pub cutoff_freq: f64,
    pub resistance: f64,
    pub filter_type: FilterType,
}

impl RlFilterParams {
    pub const DEFAULT_RESISTANCE: f64 = 8.0;

    pub fn compute(&self) -> Result<ComponentSet> {
        let fc = ensure_positive("cutoff_freq", self.cutoff_freq)?;
        let r = ensure_positive("resistance", self.resistance)?;
        let l = r / (2.0 * PI * fc);

        let (r_place, l_place) = match single_pole(self.filter_type)? {
            FilterType::Lowpass => (Placement::Shunt, Placement::Series),
            _ => (Placement::Series, Placement::Shunt),
        };
        let kind = self.filter_type.name();
        let resistor = ComponentValue::resistor("R1", r, format!("RL {kind} resistor"), r_place)?;
        let inductor = ComponentValue::inductor("L1", l, format!("RL {kind} inductor"), l_place)?;

        Ok(series_first(resistor, inductor))
    }
}

/// 2nd-order series RLC filter: `L = R/(2·ωc·Q)`, `C = 1/(ωc²·L)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RlcFilterParams {
    pub cutoff_freq: f64,
    pub resistance: f64,
    pub q_factor: f64,
}

impl RlcFilterParams {
    pub const DEFAULT_RESISTANCE: f64 = 8.0;
    pub const DEFAULT_Q: f64 = 0.7071;

    pub fn compute(&self) -> Result<ComponentSet> {
        let fc = ensure_positive("cutoff_freq", self.cutoff_freq)?;
        let r = ensure_positive("resistance", self.resistance)?;
        let q = ensure_positive("q_factor", self.q_factor)?;

        let wc = 2.0 * PI * fc;
        let l = r / (2.0 * wc * q);
        let c = 1.0 / (wc * wc * l);

        Ok(ComponentSet::from_iter([
            ComponentValue::resistor("R1", r, "Damping resistor", Placement::Series)?,
            ComponentValue::inductor("L1", l, "Filter inductor", Placement::Series)?,
            ComponentValue::capacitor("C1", c, "Filter capacitor", Placement::Shunt)?,
        ]))
    }
}

/// Single-pole filters come in one direction only.
fn single_pole(filter_type: FilterType) -> Result<FilterType> {
    match filter_type {
        FilterType::Both => Err(XoverError::invalid(
            "filter_type",
            "a single-pole filter is either lowpass or highpass",
        )),
        other => Ok(other),
    }
}

/// Order a two-element ladder source-to-load: series element, then shunt.
fn series_first(a: ComponentValue, b: ComponentValue) -> ComponentSet {
    if b.placement == Placement::Series {
        ComponentSet::from_iter([b, a])
    } else {
        ComponentSet::from_iter([a, b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lpad() {
        let parts = LPadParams {
            impedance: 8.0,
            attenuation_db: 6.0,
        }
        .compute()
        .unwrap();
        let ratio = 10f64.powf(0.3);
        assert_relative_eq!(parts.value("R1").unwrap(), 8.0 * (ratio - 1.0) / ratio);
        assert_relative_eq!(parts.value("R2").unwrap(), 8.0 * ratio / (ratio - 1.0));
    }

    #[test]
    fn test_lpad_rejects_zero_db() {
        let err = LPadParams {
            impedance: 8.0,
            attenuation_db: 0.0,
        }
        .compute()
        .unwrap_err();
        assert!(matches!(err, XoverError::InvalidArgument { .. }));
    }

    #[test]
    fn test_baffle_step() {
        let parts = BaffleStepParams {
            impedance: 8.0,
            baffle_step_freq: BaffleStepParams::DEFAULT_STEP_FREQ,
        }
        .compute()
        .unwrap();
        assert_relative_eq!(parts.value("R1").unwrap(), 8.0);
        assert_relative_eq!(parts.value("L1").unwrap(), 8.0 / (2.0 * PI * 400.0));
    }

    #[test]
    fn test_voltage_divider() {
        let parts = DividerParams::default().compute().unwrap();
        assert_relative_eq!(parts.value("R1").unwrap(), 5000.0);
        assert_relative_eq!(parts.value("R2").unwrap(), 5000.0);

        let parts = DividerParams {
            vin: 12.0,
            vout: 3.0,
            r_total: 4000.0,
        }
        .compute()
        .unwrap();
        assert_relative_eq!(parts.value("R2").unwrap(), 1000.0);
        assert_relative_eq!(parts.value("R1").unwrap(), 3000.0);

        assert!(DividerParams {
            vout: 1.0,
            ..DividerParams::default()
        }
        .compute()
        .is_err());
    }

    #[test]
    fn test_rc_filter_placement() {
        let lp = RcFilterParams {
            cutoff_freq: 1000.0,
            resistance: 10_000.0,
            filter_type: FilterType::Lowpass,
        }
        .compute()
        .unwrap();
        assert_eq!(lp.references(), vec!["R1", "C1"]);
        assert_relative_eq!(lp.value("C1").unwrap(), 1.0 / (2.0 * PI * 1e7), max_relative = 1e-12);

        let hp = RcFilterParams {
            filter_type: FilterType::Highpass,
            ..RcFilterParams {
                cutoff_freq: 1000.0,
                resistance: 10_000.0,
                filter_type: FilterType::Lowpass,
            }
        }
        .compute()
        .unwrap();
        assert_eq!(hp.references(), vec!["C1", "R1"]);
        assert_eq!(hp.get("R1").unwrap().placement, Placement::Shunt);
    }

    #[test]
    fn test_rl_filter() {
        let parts = RlFilterParams {
            cutoff_freq: 500.0,
            resistance: RlFilterParams::DEFAULT_RESISTANCE,
            filter_type: FilterType::Lowpass,
        }
        .compute()
        .unwrap();
        assert_eq!(parts.references(), vec!["L1", "R1"]);
        assert_relative_eq!(parts.value("L1").unwrap(), 8.0 / (2.0 * PI * 500.0));

        assert!(RlFilterParams {
            cutoff_freq: 500.0,
            resistance: 8.0,
            filter_type: FilterType::Both,
        }
        .compute()
        .is_err());
    }

    #[test]
    fn test_rlc_filter_resonates_at_cutoff() {
        let parts = RlcFilterParams {
            cutoff_freq: 1000.0,
            resistance: RlcFilterParams::DEFAULT_RESISTANCE,
            q_factor: RlcFilterParams::DEFAULT_Q,
        }
        .compute()
        .unwrap();
        let (l, c) = (parts.value("L1").unwrap(), parts.value("C1").unwrap());
        assert_relative_eq!(1.0 / (2.0 * PI * (l * c).sqrt()), 1000.0, max_relative = 1e-9);
    }

    #[test]
    fn test_correction_wrappers() {
        let zobel = ZobelParams {
            re: 6.0,
            le: 0.56,
            margin: 1.0,
        }
        .compute()
        .unwrap();
        assert_eq!(zobel.references(), vec!["R1", "C1"]);

        let notch = NotchParams {
            fs: 37.0,
            qms: 2.79,
            qes: 0.42,
            re: 6.0,
        }
        .compute()
        .unwrap();
        assert_relative_eq!(notch.value("R1").unwrap(), 39.857, max_relative = 1e-4);
    }
}
