//! Component values produced by the synthesizers.
//!
//! This module provides the passive component vocabulary shared by every
//! synthesis path:
//! - [`ComponentKind`]: resistor, capacitor, or inductor
//! - [`ComponentValue`]: one computed part with its reference designator
//! - [`ComponentSet`]: the ordered result of a single synthesis call
//! - [`eseries`]: standard value tables and nearest-value snapping
//! - [`notation`]: engineering notation formatting and SI-suffix parsing
//!
//! Values are always stored in base SI units (Ω, F, H).

pub mod eseries;
pub mod notation;

pub use eseries::{snap_to_e_series, ESeries};
pub use notation::{engineering_notation, parse_value};

use std::fmt;

use num_complex::Complex64;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{Result, XoverError};

/// The three passive component types the engine synthesizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Resistor,
    Capacitor,
    Inductor,
}

impl ComponentKind {
    /// SI unit symbol for values of this kind.
    pub const fn unit(&self) -> &'static str {
        match self {
            ComponentKind::Resistor => "Ω",
            ComponentKind::Capacitor => "F",
            ComponentKind::Inductor => "H",
        }
    }

    /// Lowercase name, as used in reports.
    pub const fn name(&self) -> &'static str {
        match self {
            ComponentKind::Resistor => "resistor",
            ComponentKind::Capacitor => "capacitor",
            ComponentKind::Inductor => "inductor",
        }
    }

    /// Complex impedance of an ideal part of this kind at angular frequency `omega`.
    ///
    /// - Resistor: `R`
    /// - Capacitor: `1/(jωC)`
    /// - Inductor: `jωL`
    pub fn impedance(&self, value: f64, omega: f64) -> Complex64 {
        match self {
            ComponentKind::Resistor => Complex64::new(value, 0.0),
            ComponentKind::Capacitor => Complex64::new(0.0, omega * value).inv(),
            ComponentKind::Inductor => Complex64::new(0.0, omega * value),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a part sits relative to the signal path.
///
/// Ladder analysis walks `Series` and `Shunt` parts from source to load.
/// `Branch` parts belong to a compound network (e.g. a Zobel's series RC)
/// that is connected across the driver as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Series,
    Shunt,
    Branch,
}

/// A single computed component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentValue {
    /// Reference designator, e.g. `L_LP` or `R1`
    pub reference: String,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    /// Value in base SI units
    pub value: f64,
    pub unit: &'static str,
    pub description: String,
    pub placement: Placement,
}

impl ComponentValue {
    /// Create a component, rejecting non-finite or non-positive values.
    pub fn new(
        reference: impl Into<String>,
        kind: ComponentKind,
        value: f64,
        description: impl Into<String>,
        placement: Placement,
    ) -> Result<Self> {
        let reference = reference.into();
        if !(value.is_finite() && value > 0.0) {
            return Err(XoverError::invalid(
                reference,
                format!("computed {kind} value {value} is not a positive finite number"),
            ));
        }
        Ok(Self {
            reference,
            kind,
            value,
            unit: kind.unit(),
            description: description.into(),
            placement,
        })
    }

    /// Create a resistor.
    pub fn resistor(
        reference: impl Into<String>,
        ohms: f64,
        description: impl Into<String>,
        placement: Placement,
    ) -> Result<Self> {
        Self::new(reference, ComponentKind::Resistor, ohms, description, placement)
    }

    /// Create a capacitor.
    pub fn capacitor(
        reference: impl Into<String>,
        farads: f64,
        description: impl Into<String>,
        placement: Placement,
    ) -> Result<Self> {
        Self::new(reference, ComponentKind::Capacitor, farads, description, placement)
    }

    /// Create an inductor.
    pub fn inductor(
        reference: impl Into<String>,
        henries: f64,
        description: impl Into<String>,
        placement: Placement,
    ) -> Result<Self> {
        Self::new(reference, ComponentKind::Inductor, henries, description, placement)
    }

    /// Value in engineering notation, e.g. `5.63µF`.
    pub fn label(&self) -> String {
        engineering_notation(self.value, self.unit)
    }

    /// Round this component onto a standard value grid.
    pub fn snap(&self, series: ESeries) -> Result<SnappedComponent> {
        let (snapped_value, error_pct) = series.snap(self.value)?;
        Ok(SnappedComponent {
            label: engineering_notation(snapped_value, self.unit),
            component: self.clone(),
            series,
            snapped_value,
            error_pct,
        })
    }
}

impl fmt::Display for ComponentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.reference, self.label())
    }
}

/// A component rounded to its nearest standard value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnappedComponent {
    pub component: ComponentValue,
    pub series: ESeries,
    pub snapped_value: f64,
    /// Signed: positive when the standard value is higher than computed
    pub error_pct: f64,
    pub label: String,
}

/// The ordered set of components returned by one synthesis call.
///
/// Iteration order is the order in which the synthesizer emitted the parts,
/// which for ladder networks is source-to-load order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentSet {
    parts: Vec<ComponentValue>,
}

impl ComponentSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a component. References are expected to be unique.
    pub fn push(&mut self, part: ComponentValue) {
        debug_assert!(
            self.get(&part.reference).is_none(),
            "duplicate reference {}",
            part.reference
        );
        self.parts.push(part);
    }

    /// Look up a component by reference designator.
    pub fn get(&self, reference: &str) -> Option<&ComponentValue> {
        self.parts.iter().find(|p| p.reference == reference)
    }

    /// Value of the named component, if present.
    pub fn value(&self, reference: &str) -> Option<f64> {
        self.get(reference).map(|p| p.value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ComponentValue> {
        self.parts.iter()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Reference designators in emission order.
    pub fn references(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.reference.as_str()).collect()
    }

    /// Sub-set of components whose reference ends with `suffix` (e.g. `_LP`).
    pub fn with_suffix(&self, suffix: &str) -> ComponentSet {
        ComponentSet {
            parts: self
                .parts
                .iter()
                .filter(|p| p.reference.ends_with(suffix))
                .cloned()
                .collect(),
        }
    }

    /// Snap every component onto the given series.
    pub fn snap_all(&self, series: ESeries) -> Result<Vec<SnappedComponent>> {
        self.parts.iter().map(|p| p.snap(series)).collect()
    }
}

impl FromIterator<ComponentValue> for ComponentSet {
    fn from_iter<I: IntoIterator<Item = ComponentValue>>(iter: I) -> Self {
        let mut set = ComponentSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<ComponentValue> for ComponentSet {
    fn extend<I: IntoIterator<Item = ComponentValue>>(&mut self, iter: I) {
        for part in iter {
            self.push(part);
        }
    }
}

impl IntoIterator for ComponentSet {
    type Item = ComponentValue;
    type IntoIter = std::vec::IntoIter<ComponentValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.into_iter()
    }
}

impl<'a> IntoIterator for &'a ComponentSet {
    type Item = &'a ComponentValue;
    type IntoIter = std::slice::Iter<'a, ComponentValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}

// Serialized as a reference -> component map, preserving emission order.
impl Serialize for ComponentSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.parts.len()))?;
        for part in &self.parts {
            map.serialize_entry(&part.reference, part)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    use approx::assert_relative_eq;

    #[test]
    fn test_kind_impedance() {
        let omega = 2.0 * PI * 1000.0;
        let zr = ComponentKind::Resistor.impedance(8.0, omega);
        assert_relative_eq!(zr.re, 8.0);
        assert_relative_eq!(zr.im, 0.0);

        // 1mH at 1kHz: X_L = 6.283Ω
        let zl = ComponentKind::Inductor.impedance(1e-3, omega);
        assert_relative_eq!(zl.im, 6.283185307, max_relative = 1e-9);

        // 10µF at 1kHz: X_C = -15.915Ω
        let zc = ComponentKind::Capacitor.impedance(10e-6, omega);
        assert_relative_eq!(zc.im, -15.91549431, max_relative = 1e-9);
        assert!(zc.re.abs() < 1e-12);
    }

    #[test]
    fn test_rejects_degenerate_values() {
        assert!(ComponentValue::resistor("R1", 0.0, "", Placement::Series).is_err());
        assert!(ComponentValue::capacitor("C1", f64::NAN, "", Placement::Shunt).is_err());
        assert!(ComponentValue::inductor("L1", f64::INFINITY, "", Placement::Series).is_err());
        assert!(ComponentValue::inductor("L1", -1e-3, "", Placement::Series).is_err());
    }

    #[test]
    fn test_component_snap() {
        let r = ComponentValue::resistor("R1", 5000.0, "test", Placement::Series).unwrap();
        let snapped = r.snap(ESeries::E24).unwrap();
        assert_relative_eq!(snapped.snapped_value, 5100.0, max_relative = 1e-12);
        assert!(snapped.error_pct > 0.0);
        assert_eq!(snapped.label, "5.1kΩ");
    }

    #[test]
    fn test_set_lookup_and_suffix() {
        let set: ComponentSet = vec![
            ComponentValue::inductor("L_LP", 0.72e-3, "", Placement::Series).unwrap(),
            ComponentValue::capacitor("C_LP", 5.6e-6, "", Placement::Shunt).unwrap(),
            ComponentValue::capacitor("C_HP", 5.6e-6, "", Placement::Series).unwrap(),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 3);
        assert_eq!(set.references(), vec!["L_LP", "C_LP", "C_HP"]);
        assert_eq!(set.with_suffix("_LP").len(), 2);
        assert!(set.get("L_HP").is_none());
        assert_relative_eq!(set.value("C_HP").unwrap(), 5.6e-6);
    }

    #[test]
    fn test_set_serializes_as_ordered_map() {
        let set: ComponentSet = vec![
            ComponentValue::resistor("R2", 4.0, "", Placement::Shunt).unwrap(),
            ComponentValue::resistor("R1", 2.0, "", Placement::Series).unwrap(),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&set).unwrap();
        let r2 = json.find("\"R2\"").unwrap();
        let r1 = json.find("\"R1\"").unwrap();
        assert!(r2 < r1);
        assert!(json.contains("\"type\":\"resistor\""));
    }
}
