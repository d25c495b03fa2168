//! Named circuit topologies and the registry that dispatches to them.
//!
//! Callers hand the registry a topology name and a loosely-typed parameter
//! map (as it arrives from JSON or a CLI). The registry resolves the name to
//! a [`TopologyKind`], converts the map into that kind's typed parameter
//! struct, and runs its closed-form synthesis:
//!
//! ```text
//! name + ParamMap -> TopologyKind -> Topology (typed params) -> ComponentSet
//! ```
//!
//! Results are raw, unsnapped values; snap them with
//! [`ComponentSet::snap_all`](crate::components::ComponentSet::snap_all).

pub mod crossover;
pub mod networks;

pub use crossover::{Alignment, CrossoverParams, FilterType};
pub use networks::{
    BaffleStepParams, DividerParams, LPadParams, NotchParams, RcFilterParams, RlFilterParams,
    RlcFilterParams, ZobelParams,
};

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::components::ComponentKind::{Capacitor, Inductor, Resistor};
use crate::components::{parse_value, ComponentKind, ComponentSet};
use crate::error::{Result, XoverError};

// ============ Parameters ============

/// A single loosely-typed parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// Parameter set for one topology computation.
pub type ParamMap = HashMap<String, ParamValue>;

/// Typed accessors over a [`ParamMap`] for one topology.
struct Params<'a> {
    map: &'a ParamMap,
    topology: &'static str,
}

impl<'a> Params<'a> {
    fn new(map: &'a ParamMap, kind: TopologyKind) -> Self {
        Self {
            map,
            topology: kind.name(),
        }
    }

    /// Numeric parameter; text is accepted when it parses with an SI suffix.
    fn number(&self, key: &str) -> Result<f64> {
        self.optional_number(key)?
            .ok_or_else(|| XoverError::missing(key, self.topology))
    }

    fn number_or(&self, key: &str, default: f64) -> Result<f64> {
        Ok(self.optional_number(key)?.unwrap_or(default))
    }

    fn optional_number(&self, key: &str) -> Result<Option<f64>> {
        match self.map.get(key) {
            None => Ok(None),
            Some(ParamValue::Number(value)) => Ok(Some(*value)),
            Some(ParamValue::Text(text)) => parse_value(text).map(Some).ok_or_else(|| {
                XoverError::invalid(key, format!("expected a number, got '{text}'"))
            }),
        }
    }

    /// Integer parameter; fractional values are rejected.
    fn integer_or(&self, key: &str, default: i64) -> Result<i64> {
        match self.optional_number(key)? {
            None => Ok(default),
            Some(value) if value.is_finite() && value.fract() == 0.0 => Ok(value as i64),
            Some(value) => Err(XoverError::invalid(
                key,
                format!("expected a whole number, got {value}"),
            )),
        }
    }

    fn parsed_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr<Err = XoverError>,
    {
        match self.map.get(key) {
            None => Ok(default),
            Some(ParamValue::Text(text)) => text.parse(),
            Some(ParamValue::Number(value)) => Err(XoverError::invalid(
                key,
                format!("expected a name, got {value}"),
            )),
        }
    }
}

// ============ Catalogue ============

/// Every built-in topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyKind {
    Zobel,
    NotchFilter,
    Lpad,
    PassiveCrossover,
    BaffleStepComp,
    VoltageDivider,
    RcFilter,
    RlFilter,
    RlcFilter,
}

impl TopologyKind {
    pub const ALL: [TopologyKind; 9] = [
        TopologyKind::Zobel,
        TopologyKind::NotchFilter,
        TopologyKind::Lpad,
        TopologyKind::PassiveCrossover,
        TopologyKind::BaffleStepComp,
        TopologyKind::VoltageDivider,
        TopologyKind::RcFilter,
        TopologyKind::RlFilter,
        TopologyKind::RlcFilter,
    ];

    /// Registry name, e.g. `passive_crossover`.
    pub const fn name(&self) -> &'static str {
        match self {
            TopologyKind::Zobel => "zobel",
            TopologyKind::NotchFilter => "notch_filter",
            TopologyKind::Lpad => "lpad",
            TopologyKind::PassiveCrossover => "passive_crossover",
            TopologyKind::BaffleStepComp => "baffle_step_comp",
            TopologyKind::VoltageDivider => "voltage_divider",
            TopologyKind::RcFilter => "rc_filter",
            TopologyKind::RlFilter => "rl_filter",
            TopologyKind::RlcFilter => "rlc_filter",
        }
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TopologyKind {
    type Err = XoverError;

    fn from_str(s: &str) -> Result<Self> {
        TopologyKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| XoverError::UnknownTopology {
                name: s.to_string(),
            })
    }
}

/// Category of topology for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyCategory {
    /// Networks placed across a driver to flatten its impedance
    ImpedanceCorrection,
    /// Passive lowpass/highpass crossover filters
    Crossover,
    /// Level-matching attenuators
    Attenuator,
    /// Response-shaping compensation networks
    Compensation,
    /// Generic RC/RL/RLC filters
    Filter,
    /// Everything else
    General,
}

impl TopologyCategory {
    pub const fn name(&self) -> &'static str {
        match self {
            TopologyCategory::ImpedanceCorrection => "impedance_correction",
            TopologyCategory::Crossover => "crossover",
            TopologyCategory::Attenuator => "attenuator",
            TopologyCategory::Compensation => "compensation",
            TopologyCategory::Filter => "filter",
            TopologyCategory::General => "general",
        }
    }
}

impl fmt::Display for TopologyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TopologyCategory {
    type Err = XoverError;

    fn from_str(s: &str) -> Result<Self> {
        use TopologyCategory::*;
        [ImpedanceCorrection, Crossover, Attenuator, Compensation, Filter, General]
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| XoverError::invalid("category", format!("unknown category '{s}'")))
    }
}

/// A declared component position in a topology.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentSlot {
    pub reference: &'static str,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub description: &'static str,
}

const fn slot(
    reference: &'static str,
    kind: ComponentKind,
    description: &'static str,
) -> ComponentSlot {
    ComponentSlot {
        reference,
        kind,
        description,
    }
}

const ZOBEL_SLOTS: &[ComponentSlot] = &[
    slot("R1", Resistor, "Zobel resistor (≈ Re)"),
    slot("C1", Capacitor, "Zobel capacitor (Le/Re²)"),
];

const NOTCH_SLOTS: &[ComponentSlot] = &[
    slot("R1", Resistor, "Notch damping resistor"),
    slot("L1", Inductor, "Notch inductor"),
    slot("C1", Capacitor, "Notch capacitor"),
];

const LPAD_SLOTS: &[ComponentSlot] = &[
    slot("R1", Resistor, "Series resistor"),
    slot("R2", Resistor, "Shunt resistor"),
];

const BAFFLE_STEP_SLOTS: &[ComponentSlot] = &[
    slot("R1", Resistor, "Compensation resistor"),
    slot("L1", Inductor, "Compensation inductor"),
];

const DIVIDER_SLOTS: &[ComponentSlot] = &[
    slot("R1", Resistor, "Top resistor"),
    slot("R2", Resistor, "Bottom resistor"),
];

const RC_SLOTS: &[ComponentSlot] = &[
    slot("R1", Resistor, "Filter resistor"),
    slot("C1", Capacitor, "Filter capacitor"),
];

const RL_SLOTS: &[ComponentSlot] = &[
    slot("R1", Resistor, "Filter resistor"),
    slot("L1", Inductor, "Filter inductor"),
];

const RLC_SLOTS: &[ComponentSlot] = &[
    slot("R1", Resistor, "Damping resistor"),
    slot("L1", Inductor, "Filter inductor"),
    slot("C1", Capacitor, "Filter capacitor"),
];

/// Describes a topology in the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologyDescriptor {
    pub kind: TopologyKind,
    pub name: &'static str,
    pub description: &'static str,
    pub category: TopologyCategory,
    /// Fixed component positions; empty when the set depends on parameters.
    pub component_slots: &'static [ComponentSlot],
    pub use_cases: &'static [&'static str],
}

// ============ Typed topologies ============

/// A topology with validated, typed parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "topology", rename_all = "snake_case")]
pub enum Topology {
    Zobel(ZobelParams),
    NotchFilter(NotchParams),
    Lpad(LPadParams),
    PassiveCrossover(CrossoverParams),
    BaffleStepComp(BaffleStepParams),
    VoltageDivider(DividerParams),
    RcFilter(RcFilterParams),
    RlFilter(RlFilterParams),
    RlcFilter(RlcFilterParams),
}

impl Topology {
    /// Convert a loose parameter map into the typed parameters for `kind`,
    /// applying documented defaults for optional entries.
    pub fn from_params(kind: TopologyKind, params: &ParamMap) -> Result<Self> {
        let p = Params::new(params, kind);
        Ok(match kind {
            TopologyKind::Zobel => Topology::Zobel(ZobelParams {
                re: p.number("re")?,
                le: p.number("le")?,
                margin: p.number_or("margin", 1.0)?,
            }),
            TopologyKind::NotchFilter => Topology::NotchFilter(NotchParams {
                fs: p.number("fs")?,
                qms: p.number("qms")?,
                qes: p.number("qes")?,
                re: p.number("re")?,
            }),
            TopologyKind::Lpad => Topology::Lpad(LPadParams {
                impedance: p.number("impedance")?,
                attenuation_db: p.number("attenuation_db")?,
            }),
            TopologyKind::PassiveCrossover => {
                let alignment = p.parsed_or("alignment", Alignment::default())?;
                Topology::PassiveCrossover(CrossoverParams::new(
                    p.number("crossover_freq")?,
                    p.number("impedance")?,
                    p.integer_or("order", 2)?,
                    alignment,
                    p.parsed_or("filter_type", FilterType::default())?,
                )?)
            }
            TopologyKind::BaffleStepComp => Topology::BaffleStepComp(BaffleStepParams {
                impedance: p.number("impedance")?,
                baffle_step_freq: p
                    .number_or("baffle_step_freq", BaffleStepParams::DEFAULT_STEP_FREQ)?,
            }),
            TopologyKind::VoltageDivider => {
                let defaults = DividerParams::default();
                Topology::VoltageDivider(DividerParams {
                    vin: p.number_or("vin", defaults.vin)?,
                    vout: p.number_or("vout", defaults.vout)?,
                    r_total: p.number_or("r_total", defaults.r_total)?,
                })
            }
            TopologyKind::RcFilter => Topology::RcFilter(RcFilterParams {
                cutoff_freq: p.number("cutoff_freq")?,
                resistance: p.number_or("resistance", RcFilterParams::DEFAULT_RESISTANCE)?,
                filter_type: p.parsed_or("filter_type", FilterType::Lowpass)?,
            }),
            TopologyKind::RlFilter => Topology::RlFilter(RlFilterParams {
                cutoff_freq: p.number("cutoff_freq")?,
                resistance: p.number_or("resistance", RlFilterParams::DEFAULT_RESISTANCE)?,
                filter_type: p.parsed_or("filter_type", FilterType::Lowpass)?,
            }),
            TopologyKind::RlcFilter => Topology::RlcFilter(RlcFilterParams {
                cutoff_freq: p.number("cutoff_freq")?,
                resistance: p.number_or("resistance", RlcFilterParams::DEFAULT_RESISTANCE)?,
                q_factor: p.number_or("q_factor", RlcFilterParams::DEFAULT_Q)?,
            }),
        })
    }

    pub fn kind(&self) -> TopologyKind {
        match self {
            Topology::Zobel(_) => TopologyKind::Zobel,
            Topology::NotchFilter(_) => TopologyKind::NotchFilter,
            Topology::Lpad(_) => TopologyKind::Lpad,
            Topology::PassiveCrossover(_) => TopologyKind::PassiveCrossover,
            Topology::BaffleStepComp(_) => TopologyKind::BaffleStepComp,
            Topology::VoltageDivider(_) => TopologyKind::VoltageDivider,
            Topology::RcFilter(_) => TopologyKind::RcFilter,
            Topology::RlFilter(_) => TopologyKind::RlFilter,
            Topology::RlcFilter(_) => TopologyKind::RlcFilter,
        }
    }

    /// Synthesize raw component values.
    pub fn compute(&self) -> Result<ComponentSet> {
        match self {
            Topology::Zobel(p) => p.compute(),
            Topology::NotchFilter(p) => p.compute(),
            Topology::Lpad(p) => p.compute(),
            Topology::PassiveCrossover(p) => p.compute(),
            Topology::BaffleStepComp(p) => p.compute(),
            Topology::VoltageDivider(p) => p.compute(),
            Topology::RcFilter(p) => p.compute(),
            Topology::RlFilter(p) => p.compute(),
            Topology::RlcFilter(p) => p.compute(),
        }
    }
}

// ============ Registry ============

/// Registry of available topologies.
///
/// Constructed explicitly and passed to whatever needs lookup; there is no
/// global instance. All built-in topologies are registered by [`new`](Self::new).
#[derive(Debug, Clone)]
pub struct TopologyRegistry {
    entries: Vec<TopologyDescriptor>,
}

impl Default for TopologyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyRegistry {
    /// Create a registry with every built-in topology.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_builtin_topologies();
        registry
    }

    /// Create a registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            entries: Vec::with_capacity(TopologyKind::ALL.len()),
        }
    }

    /// Register a topology, replacing any previous entry of the same kind.
    pub fn register(&mut self, descriptor: TopologyDescriptor) {
        self.entries.retain(|d| d.kind != descriptor.kind);
        self.entries.push(descriptor);
    }

    fn register_builtin_topologies(&mut self) {
        self.register(TopologyDescriptor {
            kind: TopologyKind::Zobel,
            name: TopologyKind::Zobel.name(),
            description: "Zobel network for voice coil inductance compensation (series RC across driver)",
            category: TopologyCategory::ImpedanceCorrection,
            component_slots: ZOBEL_SLOTS,
            use_cases: &["Impedance linearization", "Passive crossover pre-conditioning"],
        });

        self.register(TopologyDescriptor {
            kind: TopologyKind::NotchFilter,
            name: TopologyKind::NotchFilter.name(),
            description: "Resonance notch filter (series RLC across driver to flatten fs peak)",
            category: TopologyCategory::ImpedanceCorrection,
            component_slots: NOTCH_SLOTS,
            use_cases: &[
                "Impedance linearization at resonance",
                "Crossover pre-conditioning",
            ],
        });

        self.register(TopologyDescriptor {
            kind: TopologyKind::Lpad,
            name: TopologyKind::Lpad.name(),
            description: "L-pad attenuator for level matching between drivers",
            category: TopologyCategory::Attenuator,
            component_slots: LPAD_SLOTS,
            use_cases: &["Tweeter level matching", "Driver sensitivity alignment"],
        });

        self.register(TopologyDescriptor {
            kind: TopologyKind::PassiveCrossover,
            name: TopologyKind::PassiveCrossover.name(),
            description: "Passive crossover filter (1st-4th order, Butterworth/LR/Bessel)",
            category: TopologyCategory::Crossover,
            component_slots: &[],
            use_cases: &[
                "2-way crossover",
                "3-way crossover",
                "Subwoofer/satellite split",
            ],
        });

        self.register(TopologyDescriptor {
            kind: TopologyKind::BaffleStepComp,
            name: TopologyKind::BaffleStepComp.name(),
            description: "Baffle step compensation (series RL)",
            category: TopologyCategory::Compensation,
            component_slots: BAFFLE_STEP_SLOTS,
            use_cases: &[
                "Baffle diffraction compensation",
                "Low-frequency response shaping",
            ],
        });

        self.register(TopologyDescriptor {
            kind: TopologyKind::VoltageDivider,
            name: TopologyKind::VoltageDivider.name(),
            description: "Resistive voltage divider",
            category: TopologyCategory::General,
            component_slots: DIVIDER_SLOTS,
            use_cases: &["Signal attenuation", "Bias network"],
        });

        self.register(TopologyDescriptor {
            kind: TopologyKind::RcFilter,
            name: TopologyKind::RcFilter.name(),
            description: "1st-order RC filter (low-pass or high-pass)",
            category: TopologyCategory::Filter,
            component_slots: RC_SLOTS,
            use_cases: &["Signal filtering", "DC blocking"],
        });

        self.register(TopologyDescriptor {
            kind: TopologyKind::RlFilter,
            name: TopologyKind::RlFilter.name(),
            description: "1st-order RL filter (low-pass or high-pass)",
            category: TopologyCategory::Filter,
            component_slots: RL_SLOTS,
            use_cases: &["Power filtering", "Speaker crossover element"],
        });

        self.register(TopologyDescriptor {
            kind: TopologyKind::RlcFilter,
            name: TopologyKind::RlcFilter.name(),
            description: "2nd-order RLC filter",
            category: TopologyCategory::Filter,
            component_slots: RLC_SLOTS,
            use_cases: &["Band-pass filtering", "Resonant circuit"],
        });
    }

    /// Look up a topology by name.
    pub fn lookup(&self, name: &str) -> Result<&TopologyDescriptor> {
        self.entries
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| XoverError::UnknownTopology {
                name: name.to_string(),
            })
    }

    /// All registered topologies, optionally restricted to one category.
    pub fn list(&self, category: Option<TopologyCategory>) -> Vec<&TopologyDescriptor> {
        self.entries
            .iter()
            .filter(|d| category.map_or(true, |c| d.category == c))
            .collect()
    }

    /// Resolve `name` and parse `params` into a typed [`Topology`].
    pub fn resolve(&self, name: &str, params: &ParamMap) -> Result<Topology> {
        let descriptor = self.lookup(name)?;
        Topology::from_params(descriptor.kind, params)
    }

    /// Compute raw component values for the named topology.
    pub fn compute(&self, name: &str, params: &ParamMap) -> Result<ComponentSet> {
        let topology = self.resolve(name, params)?;
        tracing::debug!(topology = name, ?topology, "computing topology");
        let components = topology.compute()?;
        tracing::debug!(topology = name, count = components.len(), "topology computed");
        Ok(components)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build a [`ParamMap`] from `key => value` pairs.
///
/// ```
/// use xover_core::params;
///
/// let p = params! { "crossover_freq" => 2500.0, "impedance" => 8.0, "alignment" => "bessel" };
/// assert_eq!(p.len(), 3);
/// ```
#[macro_export]
macro_rules! params {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut map = $crate::topology::ParamMap::new();
        $(map.insert(($key).to_string(), $crate::topology::ParamValue::from($value));)*
        map
    }};
}
