use std::sync::Arc;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ShapeError};
use crate::model::SystemModel;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_horizon() -> usize {
    10
}
const fn default_comm_speed() -> f64 {
    1.0
}
const fn default_locality() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// SynthesisConfig
// ---------------------------------------------------------------------------

/// Top-level synthesis configuration: plant, horizon and the ordered list
/// of constraint generators to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// FIR horizon T (default: 10).
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    pub system: SystemConfig,

    /// Generators, applied in order.
    #[serde(default)]
    pub constraints: Vec<ConstraintConfig>,
}

impl SynthesisConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon == 0 {
            return Err(invalid("horizon", "must be >= 1"));
        }
        self.system.to_model()?;
        for (i, c) in self.constraints.iter().enumerate() {
            c.validate(i)?;
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// SystemConfig
// ---------------------------------------------------------------------------

/// Plant matrices written row by row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub a: Vec<Vec<f64>>,
    pub b2: Vec<Vec<f64>>,
}

impl SystemConfig {
    /// Build the shared model.
    pub fn to_model(&self) -> Result<Arc<SystemModel>, ConfigError> {
        if self.a.is_empty() {
            return Err(invalid("system.a", "must have at least one row"));
        }
        let a = rows_to_matrix(&self.a)?;
        let b2 = rows_to_matrix(&self.b2)?;
        Ok(Arc::new(SystemModel::new(a, b2)?))
    }
}

fn rows_to_matrix(rows: &[Vec<f64>]) -> Result<DMatrix<f64>, ShapeError> {
    let ncols = rows.first().map_or(0, Vec::len);
    for (row, values) in rows.iter().enumerate() {
        if values.len() != ncols {
            return Err(ShapeError::RaggedRows {
                row,
                expected: ncols,
                got: values.len(),
            });
        }
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Ok(DMatrix::from_row_slice(rows.len(), ncols, &flat))
}

// ---------------------------------------------------------------------------
// ConstraintConfig
// ---------------------------------------------------------------------------

/// One constraint generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintConfig {
    /// Identity generator.
    Base,
    /// Localized support constraints.
    Localized {
        #[serde(default)]
        act_delay: u32,
        #[serde(default = "default_comm_speed")]
        comm_speed: f64,
        #[serde(default = "default_locality")]
        locality: u32,
    },
    /// Approximate localized constraints with a stability-margin penalty.
    ApproxLocalized {
        #[serde(default)]
        robustness: f64,
        #[serde(default)]
        act_delay: u32,
        #[serde(default = "default_comm_speed")]
        comm_speed: f64,
        #[serde(default = "default_locality")]
        locality: u32,
    },
}

impl ConstraintConfig {
    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let (comm_speed, locality) = match self {
            Self::Base => return Ok(()),
            Self::Localized {
                comm_speed,
                locality,
                ..
            } => (*comm_speed, *locality),
            Self::ApproxLocalized {
                robustness,
                comm_speed,
                locality,
                ..
            } => {
                if !robustness.is_finite() || *robustness < 0.0 {
                    return Err(invalid(
                        format!("constraints[{index}].robustness"),
                        "must be finite and >= 0",
                    ));
                }
                (*comm_speed, *locality)
            }
        };
        if !comm_speed.is_finite() || comm_speed <= 0.0 {
            return Err(invalid(
                format!("constraints[{index}].comm_speed"),
                "must be finite and > 0",
            ));
        }
        if locality == 0 {
            return Err(invalid(
                format!("constraints[{index}].locality"),
                "must be >= 1",
            ));
        }
        Ok(())
    }
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAIN: &str = r#"
        horizon = 6

        [system]
        a  = [[1.0, 0.0], [1.0, 1.0]]
        b2 = [[1.0, 0.0], [0.0, 1.0]]

        [[constraints]]
        kind = "localized"
        locality = 2

        [[constraints]]
        kind = "approx_localized"
        robustness = 20.0
        act_delay = 1
        comm_speed = 2.5
        locality = 3

        [[constraints]]
        kind = "base"
    "#;

    #[test]
    fn parses_full_document() {
        let config = SynthesisConfig::from_toml_str(CHAIN).unwrap();
        assert_eq!(config.horizon, 6);
        assert_eq!(config.constraints.len(), 3);
        assert_eq!(
            config.constraints[0],
            ConstraintConfig::Localized {
                act_delay: 0,
                comm_speed: 1.0,
                locality: 2
            }
        );
        assert_eq!(
            config.constraints[1],
            ConstraintConfig::ApproxLocalized {
                robustness: 20.0,
                act_delay: 1,
                comm_speed: 2.5,
                locality: 3
            }
        );
        assert_eq!(config.constraints[2], ConstraintConfig::Base);

        let model = config.system.to_model().unwrap();
        assert_eq!(model.nx(), 2);
        assert_eq!(model.a()[(1, 0)], 1.0);
        assert_eq!(model.a()[(0, 1)], 0.0);
    }

    #[test]
    fn horizon_defaults() {
        let config = SynthesisConfig::from_toml_str(
            r"
            [system]
            a = [[0.5]]
            b2 = [[1.0]]
            ",
        )
        .unwrap();
        assert_eq!(config.horizon, 10);
        assert!(config.constraints.is_empty());
    }

    #[test]
    fn rejects_zero_locality() {
        let err = SynthesisConfig::from_toml_str(
            r#"
            [system]
            a = [[0.5]]
            b2 = [[1.0]]

            [[constraints]]
            kind = "localized"
            locality = 0
            "#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for constraints[0].locality: must be >= 1"
        );
    }

    #[test]
    fn rejects_negative_robustness() {
        let err = SynthesisConfig::from_toml_str(
            r#"
            [system]
            a = [[0.5]]
            b2 = [[1.0]]

            [[constraints]]
            kind = "approx_localized"
            robustness = -1.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "constraints[0].robustness"));
    }

    #[test]
    fn rejects_non_positive_speed() {
        let err = SynthesisConfig::from_toml_str(
            r#"
            [system]
            a = [[0.5]]
            b2 = [[1.0]]

            [[constraints]]
            kind = "localized"
            comm_speed = 0.0
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("comm_speed"));
    }

    #[test]
    fn negative_delay_is_a_parse_error() {
        let err = SynthesisConfig::from_toml_str(
            r#"
            [system]
            a = [[0.5]]
            b2 = [[1.0]]

            [[constraints]]
            kind = "localized"
            act_delay = -1
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = SynthesisConfig::from_toml_str(
            r"
            [system]
            a = [[1.0, 0.0], [1.0]]
            b2 = [[1.0], [1.0]]
            ",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::System(ShapeError::RaggedRows { row: 1, .. })
        ));
    }

    #[test]
    fn rejects_b2_mismatch() {
        let err = SynthesisConfig::from_toml_str(
            r"
            [system]
            a = [[1.0, 0.0], [1.0, 1.0]]
            b2 = [[1.0]]
            ",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::System(ShapeError::B2Rows { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn from_file_missing_path() {
        let err = SynthesisConfig::from_file("/nonexistent/sls.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
