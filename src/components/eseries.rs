//! IEC 60063 preferred-value series and nearest-value snapping.
//!
//! Each series is stored as one decade of mantissas in `[1.0, 10.0)`.
//! A value is snapped by splitting it into `mantissa × 10^decade` and picking
//! the candidate with the smallest ratio (log-domain) distance.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, XoverError};

pub const E12: [f64; 12] = [1.0, 1.2, 1.5, 1.8, 2.2, 2.7, 3.3, 3.9, 4.7, 5.6, 6.8, 8.2];

pub const E24: [f64; 24] = [
    1.0, 1.1, 1.2, 1.3, 1.5, 1.6, 1.8, 2.0, 2.2, 2.4, 2.7, 3.0, //
    3.3, 3.6, 3.9, 4.3, 4.7, 5.1, 5.6, 6.2, 6.8, 7.5, 8.2, 9.1,
];

pub const E48: [f64; 48] = [
    1.00, 1.05, 1.10, 1.15, 1.21, 1.27, 1.33, 1.40, 1.47, 1.54, 1.62, 1.69, //
    1.78, 1.87, 1.96, 2.05, 2.15, 2.26, 2.37, 2.49, 2.61, 2.74, 2.87, 3.01, //
    3.16, 3.32, 3.48, 3.65, 3.83, 4.02, 4.22, 4.42, 4.64, 4.87, 5.11, 5.36, //
    5.62, 5.90, 6.19, 6.49, 6.81, 7.15, 7.50, 7.87, 8.25, 8.66, 9.09, 9.53,
];

pub const E96: [f64; 96] = [
    1.00, 1.02, 1.05, 1.07, 1.10, 1.13, 1.15, 1.18, 1.21, 1.24, 1.27, 1.30, //
    1.33, 1.37, 1.40, 1.43, 1.47, 1.50, 1.54, 1.58, 1.62, 1.65, 1.69, 1.74, //
    1.78, 1.82, 1.87, 1.91, 1.96, 2.00, 2.05, 2.10, 2.15, 2.21, 2.26, 2.32, //
    2.37, 2.43, 2.49, 2.55, 2.61, 2.67, 2.74, 2.80, 2.87, 2.94, 3.01, 3.09, //
    3.16, 3.24, 3.32, 3.40, 3.48, 3.57, 3.65, 3.74, 3.83, 3.92, 4.02, 4.12, //
    4.22, 4.32, 4.42, 4.53, 4.64, 4.75, 4.87, 4.99, 5.11, 5.23, 5.36, 5.49, //
    5.62, 5.76, 5.90, 6.04, 6.19, 6.34, 6.49, 6.65, 6.81, 6.98, 7.15, 7.32, //
    7.50, 7.68, 7.87, 8.06, 8.25, 8.45, 8.66, 8.87, 9.09, 9.31, 9.53, 9.76,
];

/// A named standard value series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ESeries {
    E12,
    #[default]
    E24,
    E48,
    E96,
}

impl ESeries {
    pub const ALL: [ESeries; 4] = [ESeries::E12, ESeries::E24, ESeries::E48, ESeries::E96];

    /// Per-decade mantissas, ascending, starting at exactly 1.0.
    pub fn table(&self) -> &'static [f64] {
        match self {
            ESeries::E12 => &E12,
            ESeries::E24 => &E24,
            ESeries::E48 => &E48,
            ESeries::E96 => &E96,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            ESeries::E12 => "E12",
            ESeries::E24 => "E24",
            ESeries::E48 => "E48",
            ESeries::E96 => "E96",
        }
    }

    /// Snap `value` to the nearest standard value in this series.
    ///
    /// Returns `(snapped, error_pct)` where `error_pct` is signed and positive
    /// when the snapped value is higher than `value`.
    ///
    /// Candidates are every entry of the value's own decade plus the top entry
    /// of the decade below and the bottom entry of the decade above, so that
    /// e.g. 9.9 can snap up to 10. Ties keep the first candidate in that order.
    pub fn snap(&self, value: f64) -> Result<(f64, f64)> {
        if !(value.is_finite() && value > 0.0) {
            return Err(XoverError::invalid(
                "value",
                format!("must be positive and finite to snap, got {value}"),
            ));
        }

        let table = self.table();
        let log_value = value.log10();
        let decade = log_value.floor() as i32;
        let log_mantissa = log_value - f64::from(decade);

        // (mantissa, decade offset)
        let candidates = table
            .iter()
            .map(|&m| (m, 0))
            .chain(std::iter::once((table[table.len() - 1], -1)))
            .chain(std::iter::once((table[0], 1)));

        let mut best = (table[0], 0);
        let mut best_distance = f64::INFINITY;
        for (mantissa, offset) in candidates {
            let distance = (log_mantissa - (mantissa.log10() + f64::from(offset))).abs();
            if distance < best_distance {
                best_distance = distance;
                best = (mantissa, offset);
            }
        }

        let snapped = scale_decade(best.0, decade + best.1);
        if !(snapped.is_finite() && snapped > 0.0) {
            return Err(XoverError::invalid(
                "value",
                format!("{value} has no representable {} neighbour", self.name()),
            ));
        }
        let error_pct = (snapped - value) / value * 100.0;
        tracing::trace!(value, snapped, error_pct, series = self.name(), "snapped");
        Ok((snapped, error_pct))
    }
}

impl fmt::Display for ESeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ESeries {
    type Err = XoverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "E12" => Ok(ESeries::E12),
            "E24" => Ok(ESeries::E24),
            "E48" => Ok(ESeries::E48),
            "E96" => Ok(ESeries::E96),
            _ => Err(XoverError::invalid(
                "series",
                format!("unknown series '{s}', expected one of E12, E24, E48, E96"),
            )),
        }
    }
}

/// Snap `value` onto the series named `series` (`"E12"`, `"E24"`, `"E48"`, `"E96"`).
pub fn snap_to_e_series(value: f64, series: &str) -> Result<(f64, f64)> {
    series.parse::<ESeries>()?.snap(value)
}

/// `mantissa × 10^decade`, dividing for negative decades so that values such
/// as 4.7e-9 come out as the nearest double rather than 4.7 × 1e-9.
fn scale_decade(mantissa: f64, decade: i32) -> f64 {
    if decade >= 0 {
        mantissa * 10f64.powi(decade)
    } else {
        mantissa / 10f64.powi(-decade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_tables_are_well_formed() {
        for series in ESeries::ALL {
            let table = series.table();
            assert_eq!(table[0], 1.0, "{series}");
            assert!(table[table.len() - 1] < 10.0, "{series}");
            assert!(table.windows(2).all(|w| w[0] < w[1]), "{series} not ascending");
        }
        assert_eq!(E12.len(), 12);
        assert_eq!(E24.len(), 24);
        assert_eq!(E48.len(), 48);
        assert_eq!(E96.len(), 96);
    }

    #[test]
    fn test_reference_snaps() {
        let (v, err) = ESeries::E24.snap(5000.0).unwrap();
        assert_relative_eq!(v, 5100.0);
        assert_relative_eq!(err, 2.0, max_relative = 1e-9);

        let (v, err) = ESeries::E12.snap(5000.0).unwrap();
        assert_relative_eq!(v, 4700.0);
        assert_relative_eq!(err, -6.0, max_relative = 1e-9);

        let (v, err) = ESeries::E96.snap(5000.0).unwrap();
        assert_relative_eq!(v, 4990.0);
        assert!(err.abs() < 1.0);
    }

    #[test]
    fn test_small_and_large_values() {
        let (v, _) = ESeries::E24.snap(4.7e-9).unwrap();
        assert_relative_eq!(v, 4.7e-9, max_relative = 1e-12);

        let (v, _) = ESeries::E24.snap(1e6).unwrap();
        assert_relative_eq!(v, 1e6, max_relative = 1e-12);
    }

    #[test]
    fn test_decade_boundary_wraps_up() {
        // 9.99 is far closer to 10 than to E24's 9.1
        let (v, err) = ESeries::E24.snap(9.99).unwrap();
        assert_relative_eq!(v, 10.0);
        assert!(err > 0.0);
        assert_relative_eq!(err, (10.0 - 9.99) / 9.99 * 100.0, max_relative = 1e-9);

        // Exactly on the boundary lands in the upper decade with no error
        let (v, err) = ESeries::E24.snap(10.0).unwrap();
        assert_relative_eq!(v, 10.0);
        assert_abs_diff_eq!(err, 0.0, epsilon = 1e-9);

        // Both sides of the boundary agree on the sign convention
        let (v, err) = ESeries::E24.snap(10.01).unwrap();
        assert_relative_eq!(v, 10.0);
        assert!(err < 0.0);
    }

    #[test]
    fn test_decade_boundary_wraps_down() {
        // E12 top is 8.2; 1.02 in the next decade up should stay at 1.0
        let (v, err) = ESeries::E12.snap(1.02e3).unwrap();
        assert_relative_eq!(v, 1000.0);
        assert!(err < 0.0);

        // 0.96 sits between E24 0.91 and 1.0 and is closer to 1.0
        let (v, _) = ESeries::E24.snap(0.96).unwrap();
        assert_relative_eq!(v, 1.0);
    }

    #[test]
    fn test_error_sign() {
        let (_, err) = ESeries::E24.snap(5000.0).unwrap();
        assert!(err > 0.0);
        let (v, err) = ESeries::E24.snap(5300.0).unwrap();
        assert_relative_eq!(v, 5100.0);
        assert!(err < 0.0);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(ESeries::E24.snap(0.0).is_err());
        assert!(ESeries::E24.snap(-100.0).is_err());
        assert!(ESeries::E24.snap(f64::NAN).is_err());
        assert!(snap_to_e_series(100.0, "E6").is_err());
        assert!(snap_to_e_series(100.0, "e96").is_ok());
    }

    #[test]
    fn test_unrepresentable_extremes() {
        // 1.8e308 overflows, subnormals underflow to zero
        assert!(ESeries::E24.snap(1.79e308).is_err());
        assert!(ESeries::E24.snap(5e-324).is_err());
        assert!(ESeries::E24.snap(2e-320).is_err());
        assert!(ESeries::E24.snap(1e-310).is_err());

        let (v, _) = ESeries::E24.snap(1e300).unwrap();
        assert!(v.is_finite());
        let (v, _) = ESeries::E24.snap(1e-300).unwrap();
        assert!(v > 0.0);
    }
}
