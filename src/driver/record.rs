//! Loosely-typed driver records, as stored in a driver database or typed by a user.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{MechanicalParams, ThieleSmall};
use crate::error::{Result, XoverError};

/// A driver datasheet entry. Every field is optional here; conversion into
/// [`ThieleSmall`] reports the first missing required one.
///
/// Fields not used by the engine (`vas`, `sd`, `xmax`, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverRecord {
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub re: Option<f64>,
    /// mH
    pub le: Option<f64>,
    pub fs: Option<f64>,
    pub qms: Option<f64>,
    pub qes: Option<f64>,
    pub qts: Option<f64>,
    pub bl: Option<f64>,
    /// g
    pub mms: Option<f64>,
    /// mm/N
    pub cms: Option<f64>,
    pub rms: Option<f64>,
    /// W
    pub power_rating: Option<f64>,
    pub nominal_impedance: Option<f64>,
}

impl DriverRecord {
    /// Parse a record from TOML text.
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Parse a record from JSON text.
    pub fn from_json_str(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load a record from a `.json` or `.toml` file (anything else is read as TOML).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| XoverError::FileReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let parsed = if is_json {
            Self::from_json_str(&text).map_err(|e| e.to_string())
        } else {
            Self::from_toml_str(&text).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| XoverError::ConfigParse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Display name, e.g. `Dayton Audio RS180-8`.
    pub fn display_name(&self) -> String {
        match (&self.manufacturer, &self.model) {
            (Some(maker), Some(model)) => format!("{maker} {model}"),
            (None, Some(model)) => model.clone(),
            (Some(maker), None) => maker.clone(),
            (None, None) => "driver".to_string(),
        }
    }

    /// The full mechanical group, when every member is present.
    fn mechanical(&self) -> Option<MechanicalParams> {
        Some(MechanicalParams {
            bl: self.bl?,
            mms: self.mms?,
            cms: self.cms?,
            rms: self.rms?,
        })
    }
}

impl TryFrom<&DriverRecord> for ThieleSmall {
    type Error = XoverError;

    fn try_from(record: &DriverRecord) -> Result<Self> {
        let context = record.display_name();
        let require =
            |value: Option<f64>, name: &str| value.ok_or_else(|| XoverError::missing(name, &context));

        let mut builder = ThieleSmall::builder(
            require(record.re, "re")?,
            require(record.fs, "fs")?,
            require(record.qms, "qms")?,
            require(record.qes, "qes")?,
        )
        .le(record.le.unwrap_or(0.0));

        if let Some(qts) = record.qts {
            builder = builder.qts(qts);
        }
        if let Some(power) = record.power_rating {
            builder = builder.power_rating(power);
        }
        match record.mechanical() {
            Some(m) => builder = builder.mechanical(m),
            None => {
                let partial = [record.bl, record.mms, record.cms, record.rms]
                    .iter()
                    .any(Option::is_some);
                if partial {
                    tracing::debug!(
                        driver = %context,
                        "incomplete mechanical parameters, deriving motional branch from Q factors"
                    );
                }
            }
        }

        builder.build()
    }
}

impl TryFrom<DriverRecord> for ThieleSmall {
    type Error = XoverError;

    fn try_from(record: DriverRecord) -> Result<Self> {
        ThieleSmall::try_from(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RS180_TOML: &str = r#"
        manufacturer = "Dayton Audio"
        model = "RS180-8"
        re = 6.0
        le = 0.56
        fs = 37.0
        qms = 2.79
        qes = 0.42
        qts = 0.36
        bl = 6.9
        mms = 14.0
        cms = 1.33
        rms = 1.18
        vas = 24.0
        power_rating = 60
    "#;

    #[test]
    fn test_toml_record_uses_mechanical_path() {
        let record = DriverRecord::from_toml_str(RS180_TOML).unwrap();
        assert_eq!(record.display_name(), "Dayton Audio RS180-8");
        let params = ThieleSmall::try_from(&record).unwrap();
        assert!(params.mechanical().is_some());
        assert_eq!(params.power_rating(), Some(60.0));
    }

    #[test]
    fn test_json_record_without_mechanics() {
        let record =
            DriverRecord::from_json_str(r#"{"re": 6.0, "fs": 40.0, "qms": 3.0, "qes": 0.5, "bl": 5.0}"#)
                .unwrap();
        let params = ThieleSmall::try_from(record).unwrap();
        assert!(params.mechanical().is_none());
        assert_eq!(params.le(), 0.0);
    }

    #[test]
    fn test_missing_parameter() {
        let record = DriverRecord::from_json_str(r#"{"re": 6.0, "qms": 3.0, "qes": 0.5}"#).unwrap();
        let err = ThieleSmall::try_from(record).unwrap_err();
        assert!(
            matches!(err, XoverError::MissingParameter { ref param, .. } if param == "fs"),
            "got {err:?}"
        );
    }
}
