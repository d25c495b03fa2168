//! Frequency-domain analysis of synthesized networks.
//!
//! Passive networks are evaluated analytically as a ladder driving a
//! resistive load, using each component's [`Placement`]:
//!
//! - `Series` parts sit in the signal path
//! - `Shunt` parts sit across the signal path
//! - consecutive `Branch` parts form one series chain connected across the
//!   path (a Zobel or notch across the driver)
//!
//! The ladder is reduced with ABCD (chain) matrices, so
//! `H = V_load/V_in = 1/(A + B/R_load)`.

use std::f64::consts::PI;

use num_complex::Complex64;
use serde::Serialize;

use crate::components::{ComponentSet, Placement};
use crate::driver::check_frequencies;
use crate::error::{ensure_positive, Result, XoverError};

/// Magnitudes below this are reported as −200 dB.
const MIN_MAGNITUDE: f64 = 1e-10;

/// `n` logarithmically spaced frequencies from `start` to `end` inclusive.
pub fn log_frequencies(start: f64, end: f64, n: usize) -> Result<Vec<f64>> {
    let start = ensure_positive("start", start)?;
    let end = ensure_positive("end", end)?;
    match n {
        0 => Err(XoverError::invalid("points", "need at least one frequency point")),
        1 => Ok(vec![start]),
        _ => {
            let (lo, hi) = (start.log10(), end.log10());
            let step = (hi - lo) / (n - 1) as f64;
            Ok((0..n)
                .map(|i| {
                    if i == n - 1 {
                        end
                    } else {
                        10f64.powf(lo + step * i as f64)
                    }
                })
                .collect())
        }
    }
}

/// Transfer function of a ladder network sampled over frequency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyResponse {
    pub frequencies: Vec<f64>,
    pub magnitude_db: Vec<f64>,
    pub phase_deg: Vec<f64>,
}

impl FrequencyResponse {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// First frequency at which the magnitude crosses `level_db`,
    /// interpolated in log-frequency.
    pub fn crossing(&self, level_db: f64) -> Option<f64> {
        self.frequencies
            .windows(2)
            .zip(self.magnitude_db.windows(2))
            .find_map(|(f, m)| {
                let (a, b) = (m[0] - level_db, m[1] - level_db);
                if a == 0.0 {
                    return Some(f[0]);
                }
                if a.signum() == b.signum() {
                    return None;
                }
                let t = a / (a - b);
                let (l0, l1) = (f[0].log10(), f[1].log10());
                Some(10f64.powf(l0 + t * (l1 - l0)))
            })
    }

    /// Peak magnitude in dB.
    pub fn max_db(&self) -> f64 {
        self.magnitude_db
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

enum Stage {
    Series(Complex64),
    Shunt(Complex64),
}

/// Ladder stages at angular frequency `omega`, source to load.
fn stages(components: &ComponentSet, omega: f64) -> Vec<Stage> {
    let mut stages = Vec::with_capacity(components.len());
    let mut branch: Option<Complex64> = None;

    for part in components {
        let z = part.kind.impedance(part.value, omega);
        match part.placement {
            Placement::Branch => *branch.get_or_insert(Complex64::new(0.0, 0.0)) += z,
            placement => {
                if let Some(chain) = branch.take() {
                    stages.push(Stage::Shunt(chain));
                }
                stages.push(match placement {
                    Placement::Series => Stage::Series(z),
                    _ => Stage::Shunt(z),
                });
            }
        }
    }
    if let Some(chain) = branch {
        stages.push(Stage::Shunt(chain));
    }
    stages
}

/// Chain matrix `[A, B, C, D]` of the whole ladder.
fn chain_matrix(components: &ComponentSet, omega: f64) -> [Complex64; 4] {
    let one = Complex64::new(1.0, 0.0);
    let zero = Complex64::new(0.0, 0.0);
    let [mut a, mut b, mut c, mut d] = [one, zero, zero, one];

    for stage in stages(components, omega) {
        match stage {
            Stage::Series(z) => {
                b += a * z;
                d += c * z;
            }
            Stage::Shunt(z) => {
                let y = z.inv();
                a += b * y;
                c += d * y;
            }
        }
    }
    [a, b, c, d]
}

/// Complex transfer function `V_load/V_in` of `components` driving `load_ohms`.
pub fn ladder_transfer(
    components: &ComponentSet,
    load_ohms: f64,
    frequencies: &[f64],
) -> Result<Vec<Complex64>> {
    let load = ensure_positive("load_ohms", load_ohms)?;
    check_frequencies(frequencies)?;
    Ok(frequencies
        .iter()
        .map(|&f| {
            let [a, b, _, _] = chain_matrix(components, 2.0 * PI * f);
            (a + b / load).inv()
        })
        .collect())
}

/// Impedance seen by the source looking into the ladder terminated by `load_ohms`.
pub fn ladder_input_impedance(
    components: &ComponentSet,
    load_ohms: f64,
    frequencies: &[f64],
) -> Result<Vec<Complex64>> {
    let load = ensure_positive("load_ohms", load_ohms)?;
    check_frequencies(frequencies)?;
    Ok(frequencies
        .iter()
        .map(|&f| {
            let [a, b, c, d] = chain_matrix(components, 2.0 * PI * f);
            (a * load + b) / (c * load + d)
        })
        .collect())
}

/// Magnitude (dB) and phase (degrees) of a ladder driving a resistive load.
pub fn ladder_response(
    components: &ComponentSet,
    load_ohms: f64,
    frequencies: &[f64],
) -> Result<FrequencyResponse> {
    let h = ladder_transfer(components, load_ohms, frequencies)?;
    tracing::trace!(points = h.len(), load_ohms, "ladder response");
    Ok(FrequencyResponse {
        frequencies: frequencies.to_vec(),
        magnitude_db: h
            .iter()
            .map(|h| 20.0 * h.norm().max(MIN_MAGNITUDE).log10())
            .collect(),
        phase_deg: h.iter().map(|h| h.arg().to_degrees()).collect(),
    })
}

/// Population standard deviation; 0 for an empty slice.
pub fn magnitude_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}
