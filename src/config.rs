//! Runtime configuration loaded from JSON.
//!
//! Every section has defaults, so an empty object (or no file at all) yields
//! the standard runtime settings.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtime::{
    error::ErrorClass,
    policy::ErrorPolicy,
    rng::{RngSeed, RngType},
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub rng: RngConfig,
    pub summation: SummationConfig,
    pub errors: ErrorFlags,
}

/// Generator selection and the run seed each worker's seed is derived from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RngConfig {
    pub rng_type: RngType,
    pub seed: RngSeed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummationConfig {
    /// A term settles the sum when `|term| / |sum|` falls below this.
    pub relative_tolerance: f64,
    /// Settled terms (or agreeing accelerated estimates) needed to stop.
    pub consecutive_terms: usize,
    /// Terms evaluated per infinite tail before `CanNotConverge`.
    pub iteration_budget: u64,
    /// Accelerate real alternating series.
    pub accelerate: bool,
}

impl Default for SummationConfig {
    fn default() -> Self {
        Self {
            relative_tolerance: 1e-13,
            consecutive_terms: 4,
            iteration_budget: 10_000_000,
            accelerate: true,
        }
    }
}

/// Per-class error enable flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErrorFlags {
    pub file: bool,
    pub malformed_string: bool,
    pub type_conversion: bool,
    pub invalid_parameter_value: bool,
    pub nan: bool,
    pub infinity: bool,
    pub convergence: bool,
}

impl Default for ErrorFlags {
    fn default() -> Self {
        Self {
            file: true,
            malformed_string: true,
            type_conversion: true,
            invalid_parameter_value: true,
            nan: true,
            infinity: true,
            convergence: true,
        }
    }
}

impl ErrorFlags {
    pub fn is_enabled(&self, class: ErrorClass) -> bool {
        match class {
            ErrorClass::File => self.file,
            ErrorClass::MalformedString => self.malformed_string,
            ErrorClass::TypeConversion => self.type_conversion,
            ErrorClass::InvalidParameterValue => self.invalid_parameter_value,
            ErrorClass::NaN => self.nan,
            ErrorClass::Infinity => self.infinity,
            ErrorClass::Convergence => self.convergence,
        }
    }

    pub fn apply_to(&self, policy: &ErrorPolicy) {
        for class in ErrorClass::ALL {
            policy.set_enabled(class, self.is_enabled(class));
        }
    }
}

impl RuntimeConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Installs the error flags into the process-wide policy.
    pub fn apply(&self) {
        self.errors.apply_to(crate::runtime::policy::policy());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = RuntimeConfig::from_json_str("{}").unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.summation.iteration_budget, 10_000_000);
        assert!(config.errors.is_enabled(ErrorClass::Convergence));
    }

    #[test]
    fn sections_override_individually() {
        let config = RuntimeConfig::from_json_str(
            r#"{
                "rng": { "rng_type": "xoshiro256_plus_plus", "seed": [1, 2, 3, 4] },
                "summation": { "consecutive_terms": 6 },
                "errors": { "nan": false }
            }"#,
        )
        .unwrap();
        assert_eq!(config.rng.rng_type, RngType::Xoshiro256PlusPlus);
        assert_eq!(config.rng.seed, RngSeed::new([1, 2, 3, 4]));
        assert_eq!(config.summation.consecutive_terms, 6);
        assert_eq!(config.summation.relative_tolerance, 1e-13);
        assert!(!config.errors.nan);
        assert!(config.errors.infinity);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = RuntimeConfig::from_json_str(r#"{ "threads": 4 }"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid configuration"));
    }

    #[test]
    fn flags_apply_to_a_policy() {
        let flags = ErrorFlags {
            file: false,
            ..ErrorFlags::default()
        };
        let local = ErrorPolicy::new();
        flags.apply_to(&local);
        assert!(!local.is_enabled(ErrorClass::File));
        assert!(local.is_enabled(ErrorClass::NaN));
    }
}
