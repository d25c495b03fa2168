//! Loudspeaker driver description.
//!
//! A driver is described by its Thiele-Small parameters. The motional part of
//! its electrical equivalent circuit (a parallel `Res`/`Lces`/`Cmes` tank) can
//! be derived two ways, chosen once when the parameters are built:
//!
//! - [`MotionalSource::DirectMechanical`] from `Bl`, `Mms`, `Cms`, `Rms`
//! - [`MotionalSource::QFactorOnly`] from `Re`, `fs`, `Qms`, `Qes`
//!
//! Units follow datasheet conventions at the API boundary (`Le` in mH, `Mms`
//! in grams, `Cms` in mm/N) and are normalized to SI internally.

mod impedance;
mod record;

pub use impedance::{impedance, impedance_magnitude, impedance_phase, verify_model, ModelCheck};
pub use record::DriverRecord;

pub(crate) use impedance::check_frequencies;

use std::f64::consts::PI;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_positive, Result};
use crate::QTS_TOLERANCE;

/// Mechanical parameter group for the direct derivation path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MechanicalParams {
    /// Force factor (T·m)
    pub bl: f64,
    /// Moving mass (g)
    pub mms: f64,
    /// Suspension compliance (mm/N)
    pub cms: f64,
    /// Mechanical resistance (kg/s)
    pub rms: f64,
}

impl MechanicalParams {
    fn validate(&self) -> Result<()> {
        ensure_positive("bl", self.bl)?;
        ensure_positive("mms", self.mms)?;
        ensure_positive("cms", self.cms)?;
        ensure_positive("rms", self.rms)?;
        Ok(())
    }
}

/// Which parameters the motional branch was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionalSource {
    DirectMechanical(MechanicalParams),
    QFactorOnly { qms: f64, qes: f64 },
}

/// Electrical equivalent of the driver's mechanical system, in SI units.
///
/// ```text
/// Zmot = 1 / (1/Res + jωCmes + 1/(jωLces))
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionalBranch {
    /// Mechanical losses (Ω)
    pub res: f64,
    /// Suspension compliance (H)
    pub lces: f64,
    /// Moving mass (F)
    pub cmes: f64,
}

impl MotionalBranch {
    /// `Cmes = Mms/Bl²`, `Lces = Bl²·Cms`, `Res = Bl²/Rms`.
    pub fn from_mechanical(m: &MechanicalParams) -> Self {
        let bl2 = m.bl * m.bl;
        let mms = m.mms * 1e-3; // g -> kg
        let cms = m.cms * 1e-3; // mm/N -> m/N
        Self {
            res: bl2 / m.rms,
            lces: bl2 * cms,
            cmes: mms / bl2,
        }
    }

    /// `Res = Re·Qms/Qes`, `Lces = Qes·Re/(2πfs)`, `Cmes = 1/(2πfs·Qes·Re)`.
    pub fn from_q_factors(re: f64, fs: f64, qms: f64, qes: f64) -> Self {
        let ws = 2.0 * PI * fs;
        Self {
            res: re * qms / qes,
            lces: qes * re / ws,
            cmes: 1.0 / (ws * qes * re),
        }
    }

    /// Complex impedance of the parallel tank at angular frequency `omega`.
    pub fn impedance(&self, omega: f64) -> Complex64 {
        let admittance = Complex64::new(1.0 / self.res, omega * self.cmes - 1.0 / (omega * self.lces));
        admittance.inv()
    }

    /// Resonance of the tank, `1/(2π√(Lces·Cmes))`.
    pub fn resonance(&self) -> f64 {
        1.0 / (2.0 * PI * (self.lces * self.cmes).sqrt())
    }
}

/// Result of comparing a supplied `Qts` with `Qms·Qes/(Qms+Qes)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QtsCheck {
    pub expected: f64,
    pub given: Option<f64>,
    pub consistent: bool,
}

/// Validated, immutable Thiele-Small parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct ThieleSmall {
    re: f64,
    le: f64,
    fs: f64,
    qms: f64,
    qes: f64,
    qts: Option<f64>,
    power_rating: Option<f64>,
    source: MotionalSource,
    motional: MotionalBranch,
}

impl ThieleSmall {
    /// Start building a parameter set from the four required values.
    pub fn builder(re: f64, fs: f64, qms: f64, qes: f64) -> ThieleSmallBuilder {
        ThieleSmallBuilder {
            re,
            fs,
            qms,
            qes,
            le: 0.0,
            qts: None,
            mechanical: None,
            power_rating: None,
        }
    }

    /// DC resistance (Ω)
    pub fn re(&self) -> f64 {
        self.re
    }

    /// Voice-coil inductance (mH)
    pub fn le(&self) -> f64 {
        self.le
    }

    /// Voice-coil inductance (H)
    pub fn le_si(&self) -> f64 {
        self.le * 1e-3
    }

    /// Resonance frequency (Hz)
    pub fn fs(&self) -> f64 {
        self.fs
    }

    pub fn qms(&self) -> f64 {
        self.qms
    }

    pub fn qes(&self) -> f64 {
        self.qes
    }

    /// Supplied total Q, if any.
    pub fn qts(&self) -> Option<f64> {
        self.qts
    }

    /// Rated program power (W), if known.
    pub fn power_rating(&self) -> Option<f64> {
        self.power_rating
    }

    pub fn source(&self) -> &MotionalSource {
        &self.source
    }

    pub fn mechanical(&self) -> Option<&MechanicalParams> {
        match &self.source {
            MotionalSource::DirectMechanical(m) => Some(m),
            MotionalSource::QFactorOnly { .. } => None,
        }
    }

    pub fn motional(&self) -> &MotionalBranch {
        &self.motional
    }

    /// `Qms·Qes/(Qms+Qes)`
    pub fn qts_expected(&self) -> f64 {
        self.qms * self.qes / (self.qms + self.qes)
    }

    /// Check a supplied `Qts` against the value implied by `Qms` and `Qes`.
    pub fn qts_check(&self) -> QtsCheck {
        let expected = self.qts_expected();
        let consistent = self
            .qts
            .map_or(true, |given| (expected - given).abs() / expected < QTS_TOLERANCE);
        QtsCheck {
            expected,
            given: self.qts,
            consistent,
        }
    }

    /// Peak impedance predicted at `fs` when `Le` is negligible: `Re·(1 + Qms/Qes)`.
    pub fn peak_impedance_expected(&self) -> f64 {
        self.re * (1.0 + self.qms / self.qes)
    }
}

/// Builder for [`ThieleSmall`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct ThieleSmallBuilder {
    re: f64,
    fs: f64,
    qms: f64,
    qes: f64,
    le: f64,
    qts: Option<f64>,
    mechanical: Option<MechanicalParams>,
    power_rating: Option<f64>,
}

impl ThieleSmallBuilder {
    /// Voice-coil inductance in mH (default 0).
    pub fn le(mut self, le_mh: f64) -> Self {
        self.le = le_mh;
        self
    }

    pub fn qts(mut self, qts: f64) -> Self {
        self.qts = Some(qts);
        self
    }

    /// Use the direct mechanical derivation for the motional branch.
    pub fn mechanical(mut self, mechanical: MechanicalParams) -> Self {
        self.mechanical = Some(mechanical);
        self
    }

    pub fn power_rating(mut self, watts: f64) -> Self {
        self.power_rating = Some(watts);
        self
    }

    pub fn build(self) -> Result<ThieleSmall> {
        let re = ensure_positive("re", self.re)?;
        let fs = ensure_positive("fs", self.fs)?;
        let qms = ensure_positive("qms", self.qms)?;
        let qes = ensure_positive("qes", self.qes)?;
        let le = ensure_non_negative("le", self.le)?;
        if let Some(qts) = self.qts {
            ensure_positive("qts", qts)?;
        }
        if let Some(power) = self.power_rating {
            ensure_positive("power_rating", power)?;
        }

        let (source, motional) = match self.mechanical {
            Some(m) => {
                m.validate()?;
                (MotionalSource::DirectMechanical(m), MotionalBranch::from_mechanical(&m))
            }
            None => (
                MotionalSource::QFactorOnly { qms, qes },
                MotionalBranch::from_q_factors(re, fs, qms, qes),
            ),
        };

        let params = ThieleSmall {
            re,
            le,
            fs,
            qms,
            qes,
            qts: self.qts,
            power_rating: self.power_rating,
            source,
            motional,
        };

        let check = params.qts_check();
        if !check.consistent {
            tracing::warn!(
                qts_given = ?check.given,
                qts_expected = check.expected,
                "Qts is inconsistent with Qms and Qes"
            );
        }

        Ok(params)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Reference woofer used throughout the test suite.
    pub(crate) fn reference_driver() -> ThieleSmall {
        ThieleSmall::builder(6.0, 37.0, 2.79, 0.42)
            .le(0.56)
            .qts(0.36)
            .power_rating(60.0)
            .build()
            .unwrap()
    }

    pub(crate) fn reference_driver_mechanical() -> ThieleSmall {
        ThieleSmall::builder(6.0, 37.0, 2.79, 0.42)
            .le(0.56)
            .qts(0.36)
            .mechanical(MechanicalParams {
                bl: 6.9,
                mms: 14.0,
                cms: 1.33,
                rms: 1.18,
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_q_factor_branch() {
        let m = MotionalBranch::from_q_factors(6.0, 37.0, 2.79, 0.42);
        assert_relative_eq!(m.res, 6.0 * 2.79 / 0.42, max_relative = 1e-12);
        assert_relative_eq!(m.resonance(), 37.0, max_relative = 1e-9);
    }

    #[test]
    fn test_mechanical_branch_units() {
        let m = MotionalBranch::from_mechanical(&MechanicalParams {
            bl: 6.9,
            mms: 14.0,
            cms: 1.33,
            rms: 1.18,
        });
        let bl2 = 6.9 * 6.9;
        assert_relative_eq!(m.cmes, 14.0e-3 / bl2, max_relative = 1e-12);
        assert_relative_eq!(m.lces, bl2 * 1.33e-3, max_relative = 1e-12);
        assert_relative_eq!(m.res, bl2 / 1.18, max_relative = 1e-12);
        // Mms/Cms of this driver put its resonance near the datasheet fs
        assert!((m.resonance() - 37.0).abs() / 37.0 < 0.05);
    }

    #[test]
    fn test_source_selection() {
        assert!(reference_driver().mechanical().is_none());
        assert!(matches!(
            reference_driver().source(),
            MotionalSource::QFactorOnly { .. }
        ));
        assert!(reference_driver_mechanical().mechanical().is_some());
    }

    #[test]
    fn test_validation() {
        assert!(ThieleSmall::builder(0.0, 37.0, 2.79, 0.42).build().is_err());
        assert!(ThieleSmall::builder(6.0, -1.0, 2.79, 0.42).build().is_err());
        assert!(ThieleSmall::builder(6.0, 37.0, 2.79, 0.0).build().is_err());
        assert!(ThieleSmall::builder(6.0, 37.0, 2.79, 0.42).le(-0.1).build().is_err());
        assert!(ThieleSmall::builder(6.0, 37.0, 2.79, 0.42)
            .mechanical(MechanicalParams {
                bl: 0.0,
                mms: 14.0,
                cms: 1.33,
                rms: 1.18,
            })
            .build()
            .is_err());
    }

    #[test]
    fn test_qts_check() {
        let driver = reference_driver();
        let check = driver.qts_check();
        assert_relative_eq!(check.expected, 2.79 * 0.42 / (2.79 + 0.42), max_relative = 1e-12);
        assert!(check.consistent);

        // Inconsistent Qts is reported, not rejected
        let off = ThieleSmall::builder(6.0, 37.0, 2.79, 0.42).qts(0.6).build().unwrap();
        assert!(!off.qts_check().consistent);

        let absent = ThieleSmall::builder(6.0, 37.0, 2.79, 0.42).build().unwrap();
        assert!(absent.qts_check().consistent);
    }
}
