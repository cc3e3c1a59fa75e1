use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tuning knobs for one [`crate::ConstraintSystemCompleter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Upper bound on outer convergence passes of a single completion.
    pub max_passes: usize,

    /// Record a not-enough-information diagnostic for every variable that
    /// `FULL` completion has to fix without evidence.
    pub report_not_enough_information: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            max_passes: 64,
            report_not_enough_information: true,
        }
    }
}

/// On-disk layout: settings live under a `[completion]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    completion: CompletionConfig,
}

impl CompletionConfig {
    /// Parse a configuration from TOML text.
    ///
    /// Missing keys take their default values, and an empty document yields
    /// [`CompletionConfig::default`].
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(input)?;
        file.completion.validate()?;
        Ok(file.completion)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_passes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_passes",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
