//! Electrical impedance of a driver from its Thiele-Small parameters.
//!
//! Lumped equivalent circuit:
//!
//! ```text
//! Z(f) = Re + j·2πf·Le + Zmot(f)
//! ```
//!
//! where `Zmot` is the parallel `Res`/`Lces`/`Cmes` tank of [`MotionalBranch`](super::MotionalBranch).

use std::f64::consts::PI;

use num_complex::Complex64;
use serde::Serialize;

use super::ThieleSmall;
use crate::error::{Result, XoverError};

/// Frequency used as the "DC" probe in [`verify_model`].
const DC_PROBE_HZ: f64 = 0.1;

/// Complex impedance of the driver at every frequency in `frequencies` (Hz).
///
/// Every frequency must be positive and finite.
pub fn impedance(params: &ThieleSmall, frequencies: &[f64]) -> Result<Vec<Complex64>> {
    check_frequencies(frequencies)?;
    let le = params.le_si();
    let motional = params.motional();
    Ok(frequencies
        .iter()
        .map(|&f| {
            let omega = 2.0 * PI * f;
            Complex64::new(params.re(), omega * le) + motional.impedance(omega)
        })
        .collect())
}

/// `|Z(f)|` in Ω.
pub fn impedance_magnitude(params: &ThieleSmall, frequencies: &[f64]) -> Result<Vec<f64>> {
    Ok(impedance(params, frequencies)?.iter().map(|z| z.norm()).collect())
}

/// Phase of `Z(f)` in degrees.
pub fn impedance_phase(params: &ThieleSmall, frequencies: &[f64]) -> Result<Vec<f64>> {
    Ok(impedance(params, frequencies)?
        .iter()
        .map(|z| z.arg().to_degrees())
        .collect())
}

/// Every frequency must be positive, with a finite angular frequency `2πf`.
pub(crate) fn check_frequencies(frequencies: &[f64]) -> Result<()> {
    match frequencies
        .iter()
        .find(|f| !(**f > 0.0 && (2.0 * PI * **f).is_finite()))
    {
        Some(bad) => Err(XoverError::invalid(
            "frequencies",
            format!("every frequency must be positive with finite 2πf, got {bad}"),
        )),
        None => Ok(()),
    }
}

/// Sanity report for a driver's impedance model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelCheck {
    pub qts_expected: f64,
    pub qts_given: Option<f64>,
    pub qts_consistent: bool,
    /// `|Z(fs)|`
    pub peak_impedance: f64,
    /// `Re·(1 + Qms/Qes)`
    pub peak_impedance_expected: f64,
    pub peak_error_pct: f64,
    /// `|Z(0.1 Hz)|`
    pub dc_impedance: f64,
    pub re: f64,
}

/// Check the model against the textbook landmarks: the peak at `fs`, the
/// DC asymptote, and `Qts` consistency.
pub fn verify_model(params: &ThieleSmall) -> Result<ModelCheck> {
    let qts = params.qts_check();
    let z = impedance(params, &[params.fs(), DC_PROBE_HZ])?;
    let peak_impedance = z[0].norm();
    let peak_impedance_expected = params.peak_impedance_expected();

    Ok(ModelCheck {
        qts_expected: qts.expected,
        qts_given: qts.given,
        qts_consistent: qts.consistent,
        peak_impedance,
        peak_impedance_expected,
        peak_error_pct: (peak_impedance - peak_impedance_expected).abs() / peak_impedance_expected
            * 100.0,
        dc_impedance: z[1].norm(),
        re: params.re(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::log_frequencies;
    use crate::driver::tests::{reference_driver, reference_driver_mechanical};
    use approx::assert_relative_eq;

    #[test]
    fn test_peak_at_resonance() {
        let driver = reference_driver_mechanical();
        let freqs = log_frequencies(10.0, 10_000.0, 1000).unwrap();
        let mag = impedance_magnitude(&driver, &freqs).unwrap();
        let (peak_idx, _) = mag
            .iter()
            .enumerate()
            .fold((0, 0.0), |acc, (i, &m)| if m > acc.1 { (i, m) } else { acc });
        let peak_freq = freqs[peak_idx];
        assert!(
            (peak_freq - 37.0).abs() / 37.0 < 0.05,
            "peak at {peak_freq:.1} Hz"
        );
    }

    #[test]
    fn test_peak_magnitude_without_le() {
        let driver = ThieleSmall::builder(6.0, 40.0, 3.0, 0.5).build().unwrap();
        let z = impedance(&driver, &[40.0]).unwrap();
        let expected = 6.0 * (1.0 + 3.0 / 0.5);
        assert_relative_eq!(z[0].norm(), expected, max_relative = 0.01);
    }

    #[test]
    fn test_dc_asymptote() {
        for driver in [reference_driver(), reference_driver_mechanical()] {
            let z = impedance(&driver, &[0.1]).unwrap();
            assert_relative_eq!(z[0].norm(), 6.0, max_relative = 0.05);
        }
    }

    #[test]
    fn test_high_frequency_rise() {
        let mag = impedance_magnitude(&reference_driver(), &[100.0, 1000.0, 10_000.0]).unwrap();
        assert!(mag[2] > mag[1], "{mag:?}");
    }

    #[test]
    fn test_phase_bounded() {
        let freqs = log_frequencies(10.0, 31_623.0, 500).unwrap();
        let phase = impedance_phase(&reference_driver_mechanical(), &freqs).unwrap();
        assert!(phase.iter().all(|p| (-90.0..=90.0).contains(p)));
    }

    #[test]
    fn test_paths_agree_in_shape() {
        let freqs = log_frequencies(10.0, 10_000.0, 200).unwrap();
        let full = impedance_magnitude(&reference_driver_mechanical(), &freqs).unwrap();
        let q_only = impedance_magnitude(&reference_driver(), &freqs).unwrap();
        let mean_diff = full
            .iter()
            .zip(&q_only)
            .map(|(a, b)| (a - b).abs() / a)
            .sum::<f64>()
            / freqs.len() as f64;
        assert!(mean_diff < 0.25, "mean relative difference {mean_diff}");
    }

    #[test]
    fn test_output_shape_and_finiteness() {
        let driver = ThieleSmall::builder(6.0, 40.0, 3.0, 0.5).build().unwrap();
        let z = impedance(&driver, &[40.0, 1000.0]).unwrap();
        assert_eq!(z.len(), 2);
        assert!(z.iter().all(|z| z.re.is_finite() && z.im.is_finite()));
        assert!(impedance(&driver, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_positive_frequency() {
        let driver = reference_driver();
        assert!(impedance(&driver, &[100.0, 0.0]).is_err());
        assert!(impedance(&driver, &[f64::NAN]).is_err());
    }

    #[test]
    fn test_rejects_overflowing_angular_frequency() {
        let driver = reference_driver();
        // 2π·1e308 overflows to infinity
        assert!(impedance(&driver, &[1e308]).is_err());
        assert!(impedance(&driver, &[f64::INFINITY]).is_err());

        let z = impedance(&driver, &[1e-300, 1e300]).unwrap();
        assert!(z.iter().all(|z| z.re.is_finite() && z.im.is_finite()));
    }

    #[test]
    fn test_verify_model() {
        let check = verify_model(&reference_driver_mechanical()).unwrap();
        assert!(check.qts_consistent);
        assert!(check.peak_error_pct < 5.0, "{check:?}");
        assert!((check.dc_impedance - 6.0).abs() / 6.0 < 0.1);
    }
}
