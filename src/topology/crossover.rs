//! Passive crossover synthesis, 1st to 4th order.
//!
//! Each 2nd-order section is realized from the normalized prototype
//! `L_norm = 1/Q`, `C_norm = Q` and denormalized to the crossover frequency
//! `ωc = 2π·fc` and nominal impedance `R`:
//!
//! | | series | shunt |
//! |---|---|---|
//! | lowpass | `L = L_norm·R/ωc` | `C = C_norm/(ωc·R)` |
//! | highpass | `C = 1/(L_norm·R·ωc)` | `L = R/(C_norm·ωc)` |
//!
//! A 3rd-order filter cascades a 1st-order element with one such section; a
//! 4th-order filter cascades two sections, each with its own Q.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::components::{ComponentSet, ComponentValue, Placement};
use crate::error::{ensure_positive, Result, XoverError};

/// Section Q values for Butterworth, indexed by order.
const BUTTERWORTH_Q: &[(u8, &[f64])] = &[(2, &[0.7071]), (3, &[1.0]), (4, &[0.5412, 1.3065])];

/// Linkwitz-Riley has no odd-order alignment.
const LINKWITZ_RILEY_Q: &[(u8, &[f64])] = &[(2, &[0.5]), (4, &[0.7071, 0.7071])];

const BESSEL_Q: &[(u8, &[f64])] = &[(2, &[0.5773]), (3, &[0.6910]), (4, &[0.5219, 0.8055])];

/// Filter response family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    #[default]
    Butterworth,
    LinkwitzRiley,
    Bessel,
}

impl Alignment {
    pub const ALL: [Alignment; 3] = [
        Alignment::Butterworth,
        Alignment::LinkwitzRiley,
        Alignment::Bessel,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Alignment::Butterworth => "butterworth",
            Alignment::LinkwitzRiley => "linkwitz-riley",
            Alignment::Bessel => "bessel",
        }
    }

    /// Section Q values for `order`, or `None` when the alignment has no
    /// coefficients for it. Order 1 has no sections and is always available.
    pub fn q_values(&self, order: u8) -> Option<&'static [f64]> {
        if order == 1 {
            return Some(&[]);
        }
        let table = match self {
            Alignment::Butterworth => BUTTERWORTH_Q,
            Alignment::LinkwitzRiley => LINKWITZ_RILEY_Q,
            Alignment::Bessel => BESSEL_Q,
        };
        table.iter().find(|(o, _)| *o == order).map(|(_, q)| *q)
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Alignment {
    type Err = XoverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "butterworth" | "bw" => Ok(Alignment::Butterworth),
            "linkwitz-riley" | "linkwitz_riley" | "linkwitzriley" | "lr" => {
                Ok(Alignment::LinkwitzRiley)
            }
            "bessel" => Ok(Alignment::Bessel),
            _ => Err(XoverError::invalid(
                "alignment",
                format!("unknown alignment '{s}' (expected butterworth, linkwitz-riley or bessel)"),
            )),
        }
    }
}

/// Which half of the crossover to synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    #[default]
    Lowpass,
    Highpass,
    Both,
}

impl FilterType {
    pub fn name(&self) -> &'static str {
        match self {
            FilterType::Lowpass => "lowpass",
            FilterType::Highpass => "highpass",
            FilterType::Both => "both",
        }
    }

    /// Reference designator suffix for this half; `None` for [`FilterType::Both`].
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            FilterType::Lowpass => Some("_LP"),
            FilterType::Highpass => Some("_HP"),
            FilterType::Both => None,
        }
    }

    fn includes_lowpass(&self) -> bool {
        matches!(self, FilterType::Lowpass | FilterType::Both)
    }

    fn includes_highpass(&self) -> bool {
        matches!(self, FilterType::Highpass | FilterType::Both)
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterType {
    type Err = XoverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lowpass" | "low-pass" | "lp" => Ok(FilterType::Lowpass),
            "highpass" | "high-pass" | "hp" => Ok(FilterType::Highpass),
            "both" => Ok(FilterType::Both),
            _ => Err(XoverError::invalid(
                "filter_type",
                format!("unknown filter type '{s}' (expected lowpass, highpass or both)"),
            )),
        }
    }
}

impl ComponentSet {
    /// The lowpass or highpass half of a crossover design.
    ///
    /// [`FilterType::Both`] returns the whole set.
    pub fn branch(&self, filter_type: FilterType) -> ComponentSet {
        match filter_type.suffix() {
            Some(suffix) => self.with_suffix(suffix),
            None => self.clone(),
        }
    }
}

/// Validated crossover request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CrossoverParams {
    /// Hz
    pub crossover_freq: f64,
    /// Ω
    pub impedance: f64,
    pub order: u8,
    pub alignment: Alignment,
    pub filter_type: FilterType,
}

impl CrossoverParams {
    /// Validate a crossover request.
    ///
    /// Orders outside 1 to 4, and orders the alignment has no Q values for,
    /// are rejected with [`XoverError::UnsupportedOrder`].
    pub fn new(
        crossover_freq: f64,
        impedance: f64,
        order: i64,
        alignment: Alignment,
        filter_type: FilterType,
    ) -> Result<Self> {
        let crossover_freq = ensure_positive("crossover_freq", crossover_freq)?;
        let impedance = ensure_positive("impedance", impedance)?;
        let order = match u8::try_from(order) {
            Ok(o @ 1..=4) => o,
            _ => return Err(XoverError::unsupported_order(order, alignment.name())),
        };
        if alignment.q_values(order).is_none() {
            return Err(XoverError::unsupported_order(order.into(), alignment.name()));
        }
        Ok(Self {
            crossover_freq,
            impedance,
            order,
            alignment,
            filter_type,
        })
    }

    /// Q of each 2nd-order section.
    pub fn section_q(&self) -> Result<&'static [f64]> {
        self.alignment
            .q_values(self.order)
            .ok_or_else(|| XoverError::unsupported_order(self.order.into(), self.alignment.name()))
    }

    pub fn compute(&self) -> Result<ComponentSet> {
        let qs = self.section_q()?;
        let wc = 2.0 * PI * self.crossover_freq;
        let r = self.impedance;
        let ordinal = ordinal(self.order);
        let alignment = self.alignment;

        let mut parts = ComponentSet::new();

        if self.filter_type.includes_lowpass() {
            match self.order {
                1 => parts.push(ComponentValue::inductor(
                    "L_LP",
                    r / wc,
                    "1st-order LP series inductor",
                    Placement::Series,
                )?),
                2 => {
                    let (l, c) = lowpass_section(qs[0], r, wc);
                    parts.push(ComponentValue::inductor(
                        "L_LP",
                        l,
                        format!("{ordinal}-order {alignment} LP inductor"),
                        Placement::Series,
                    )?);
                    parts.push(ComponentValue::capacitor(
                        "C_LP",
                        c,
                        format!("{ordinal}-order {alignment} LP capacitor"),
                        Placement::Shunt,
                    )?);
                }
                3 => {
                    let (l, c) = lowpass_section(qs[0], r, wc);
                    parts.push(ComponentValue::inductor(
                        "L1_LP",
                        r / wc,
                        "3rd-order LP 1st inductor",
                        Placement::Series,
                    )?);
                    parts.push(ComponentValue::inductor(
                        "L2_LP",
                        l,
                        "3rd-order LP 2nd inductor",
                        Placement::Series,
                    )?);
                    parts.push(ComponentValue::capacitor(
                        "C1_LP",
                        c,
                        "3rd-order LP capacitor",
                        Placement::Shunt,
                    )?);
                }
                _ => {
                    for (i, &q) in qs.iter().enumerate() {
                        let (l, c) = lowpass_section(q, r, wc);
                        let n = i + 1;
                        parts.push(ComponentValue::inductor(
                            format!("L{n}_LP"),
                            l,
                            format!("{ordinal}-order {alignment} LP inductor (section {n})"),
                            Placement::Series,
                        )?);
                        parts.push(ComponentValue::capacitor(
                            format!("C{n}_LP"),
                            c,
                            format!("{ordinal}-order {alignment} LP capacitor (section {n})"),
                            Placement::Shunt,
                        )?);
                    }
                }
            }
        }

        if self.filter_type.includes_highpass() {
            match self.order {
                1 => parts.push(ComponentValue::capacitor(
                    "C_HP",
                    1.0 / (wc * r),
                    "1st-order HP series capacitor",
                    Placement::Series,
                )?),
                2 => {
                    let (c, l) = highpass_section(qs[0], r, wc);
                    parts.push(ComponentValue::capacitor(
                        "C_HP",
                        c,
                        format!("{ordinal}-order {alignment} HP capacitor"),
                        Placement::Series,
                    )?);
                    parts.push(ComponentValue::inductor(
                        "L_HP",
                        l,
                        format!("{ordinal}-order {alignment} HP inductor"),
                        Placement::Shunt,
                    )?);
                }
                3 => {
                    let (c, l) = highpass_section(qs[0], r, wc);
                    parts.push(ComponentValue::capacitor(
                        "C1_HP",
                        1.0 / (wc * r),
                        "3rd-order HP 1st capacitor",
                        Placement::Series,
                    )?);
                    parts.push(ComponentValue::capacitor(
                        "C2_HP",
                        c,
                        "3rd-order HP 2nd capacitor",
                        Placement::Series,
                    )?);
                    parts.push(ComponentValue::inductor(
                        "L1_HP",
                        l,
                        "3rd-order HP inductor",
                        Placement::Shunt,
                    )?);
                }
                _ => {
                    for (i, &q) in qs.iter().enumerate() {
                        let (c, l) = highpass_section(q, r, wc);
                        let n = i + 1;
                        parts.push(ComponentValue::capacitor(
                            format!("C{n}_HP"),
                            c,
                            format!("{ordinal}-order {alignment} HP capacitor (section {n})"),
                            Placement::Series,
                        )?);
                        parts.push(ComponentValue::inductor(
                            format!("L{n}_HP"),
                            l,
                            format!("{ordinal}-order {alignment} HP inductor (section {n})"),
                            Placement::Shunt,
                        )?);
                    }
                }
            }
        }

        Ok(parts)
    }
}

/// Series L and shunt C of a lowpass section.
fn lowpass_section(q: f64, r: f64, wc: f64) -> (f64, f64) {
    let (l_norm, c_norm) = (1.0 / q, q);
    (l_norm * r / wc, c_norm / (wc * r))
}

/// Series C and shunt L of a highpass section.
fn highpass_section(q: f64, r: f64, wc: f64) -> (f64, f64) {
    let (l_norm, c_norm) = (1.0 / q, q);
    (1.0 / (l_norm * r * wc), r / (c_norm * wc))
}

fn ordinal(order: u8) -> &'static str {
    match order {
        1 => "1st",
        2 => "2nd",
        3 => "3rd",
        _ => "4th",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn crossover(order: i64, alignment: Alignment, filter_type: FilterType) -> Result<ComponentSet> {
        CrossoverParams::new(2500.0, 8.0, order, alignment, filter_type)?.compute()
    }

    #[test]
    fn test_second_order_butterworth_lowpass() {
        let parts = crossover(2, Alignment::Butterworth, FilterType::Lowpass).unwrap();
        assert_eq!(parts.references(), vec!["L_LP", "C_LP"]);
        assert_relative_eq!(parts.value("L_LP").unwrap(), 0.72e-3, max_relative = 0.01);
        assert_relative_eq!(parts.value("C_LP").unwrap(), 5.63e-6, max_relative = 0.01);
    }

    #[test]
    fn test_second_order_highpass_is_dual() {
        let wc = 2.0 * PI * 2500.0;
        let parts = crossover(2, Alignment::Butterworth, FilterType::Highpass).unwrap();
        assert_relative_eq!(parts.value("C_HP").unwrap(), 0.7071 / (8.0 * wc), max_relative = 1e-12);
        assert_relative_eq!(parts.value("L_HP").unwrap(), 8.0 / (0.7071 * wc), max_relative = 1e-12);
        assert_eq!(parts.get("C_HP").unwrap().placement, Placement::Series);
        assert_eq!(parts.get("L_HP").unwrap().placement, Placement::Shunt);
    }

    #[test]
    fn test_first_order_ignores_alignment() {
        let wc = 2.0 * PI * 2500.0;
        for alignment in Alignment::ALL {
            let parts = crossover(1, alignment, FilterType::Both).unwrap();
            assert_eq!(parts.references(), vec!["L_LP", "C_HP"]);
            assert_relative_eq!(parts.value("L_LP").unwrap(), 8.0 / wc);
            assert_relative_eq!(parts.value("C_HP").unwrap(), 1.0 / (wc * 8.0));
        }
    }

    #[test]
    fn test_third_order_references() {
        let parts = crossover(3, Alignment::Bessel, FilterType::Both).unwrap();
        assert_eq!(
            parts.references(),
            vec!["L1_LP", "L2_LP", "C1_LP", "C1_HP", "C2_HP", "L1_HP"]
        );
        let wc = 2.0 * PI * 2500.0;
        assert_relative_eq!(parts.value("L2_LP").unwrap(), 8.0 / (0.6910 * wc), max_relative = 1e-12);
    }

    #[test]
    fn test_fourth_order_sections() {
        let parts = crossover(4, Alignment::LinkwitzRiley, FilterType::Both).unwrap();
        assert_eq!(parts.len(), 8);
        assert_relative_eq!(parts.value("L1_LP").unwrap(), parts.value("L2_LP").unwrap());

        let bw = crossover(4, Alignment::Butterworth, FilterType::Lowpass).unwrap();
        assert_eq!(bw.references(), vec!["L1_LP", "C1_LP", "L2_LP", "C2_LP"]);
        assert!(bw.value("L1_LP").unwrap() > bw.value("L2_LP").unwrap());
    }

    #[test]
    fn test_q_tables() {
        use Alignment::*;
        let expected: [(Alignment, u8, Option<&[f64]>); 12] = [
            (Butterworth, 1, Some(&[])),
            (Butterworth, 2, Some(&[0.7071])),
            (Butterworth, 3, Some(&[1.0])),
            (Butterworth, 4, Some(&[0.5412, 1.3065])),
            (LinkwitzRiley, 1, Some(&[])),
            (LinkwitzRiley, 2, Some(&[0.5])),
            (LinkwitzRiley, 3, None),
            (LinkwitzRiley, 4, Some(&[0.7071, 0.7071])),
            (Bessel, 1, Some(&[])),
            (Bessel, 2, Some(&[0.5773])),
            (Bessel, 3, Some(&[0.6910])),
            (Bessel, 4, Some(&[0.5219, 0.8055])),
        ];
        for (alignment, order, qs) in expected {
            assert_eq!(alignment.q_values(order), qs, "{alignment} order {order}");
        }
        for alignment in Alignment::ALL {
            assert_eq!(alignment.q_values(5), None);
        }

        // Each 4th-order section's shunt capacitor carries its own Q
        let wc = 2.0 * PI * 2500.0;
        for alignment in [Butterworth, LinkwitzRiley, Bessel] {
            let parts = crossover(4, alignment, FilterType::Lowpass).unwrap();
            let qs = alignment.q_values(4).unwrap();
            assert_relative_eq!(parts.value("C1_LP").unwrap(), qs[0] / (wc * 8.0), max_relative = 1e-12);
            assert_relative_eq!(parts.value("C2_LP").unwrap(), qs[1] / (wc * 8.0), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_unsupported_orders() {
        for order in [0, 5, -1] {
            let err = crossover(order, Alignment::Butterworth, FilterType::Lowpass).unwrap_err();
            assert!(matches!(err, XoverError::UnsupportedOrder { .. }), "{err:?}");
        }
        let err = crossover(3, Alignment::LinkwitzRiley, FilterType::Lowpass).unwrap_err();
        assert!(
            matches!(err, XoverError::UnsupportedOrder { order: 3, ref alignment } if alignment == "linkwitz-riley"),
            "{err:?}"
        );
    }

    #[test]
    fn test_branch_selection() {
        let parts = crossover(2, Alignment::Butterworth, FilterType::Both).unwrap();
        assert_eq!(parts.branch(FilterType::Lowpass).references(), vec!["L_LP", "C_LP"]);
        assert_eq!(parts.branch(FilterType::Highpass).references(), vec!["C_HP", "L_HP"]);
        assert_eq!(parts.branch(FilterType::Both).len(), 4);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Linkwitz-Riley".parse::<Alignment>().unwrap(), Alignment::LinkwitzRiley);
        assert_eq!("lr".parse::<Alignment>().unwrap(), Alignment::LinkwitzRiley);
        assert!("chebyshev".parse::<Alignment>().is_err());
        assert_eq!("HP".parse::<FilterType>().unwrap(), FilterType::Highpass);
        assert!("bandpass".parse::<FilterType>().is_err());
    }
}
