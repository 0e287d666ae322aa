//! Configuration system for ScoreForge.
//!
//! Load score director configuration from TOML or YAML files to control
//! assertions, lookup tracking and move threads without code changes.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use scoreforge_config::{EnvironmentMode, ScoreDirectorConfig};
//!
//! let config = ScoreDirectorConfig::from_toml_str(r#"
//!     environment_mode = "full_assert"
//!     constraint_match_enabled = true
//! "#).unwrap();
//!
//! assert_eq!(config.environment_mode, EnvironmentMode::FullAssert);
//! assert!(config.assert_cloned_solution());
//! assert!(!config.track_working_solution());
//! ```
//!
//! Use the default config when the file is missing:
//!
//! ```
//! use scoreforge_config::ScoreDirectorConfig;
//!
//! let config = ScoreDirectorConfig::load("scoring.toml").unwrap_or_default();
//! assert!(config.expect_shadow_variables_in_correct_state);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;


/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Score director configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ScoreDirectorConfig {
    /// Environment mode deciding which assertions run.
    pub environment_mode: EnvironmentMode,

    /// Whether directors keep constraint matches for analysis.
    pub constraint_match_enabled: bool,

    /// Whether directors resolve external objects to working instances.
    pub lookup_enabled: bool,

    /// Whether the entity validator checks inverse shadows on initialization.
    pub expect_shadow_variables_in_correct_state: bool,

    /// Whether solution clones are checked for shared instances.
    /// Unset means "fully asserted environment modes only".
    pub assert_cloned_solution: Option<bool>,

    /// Whether undo corruption reports carry four-point solution snapshots.
    /// Unset means "tracked environment modes only".
    pub track_working_solution: Option<bool>,

    /// Number of threads for parallel move evaluation.
    pub move_thread_count: MoveThreadCount,
}

impl Default for ScoreDirectorConfig {
    fn default() -> Self {
        Self {
            environment_mode: EnvironmentMode::default(),
            constraint_match_enabled: false,
            lookup_enabled: false,
            expect_shadow_variables_in_correct_state: true,
            assert_cloned_solution: None,
            track_working_solution: None,
            move_thread_count: MoveThreadCount::default(),
        }
    }
}

impl ScoreDirectorConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates configuration from a TOML or YAML file,
    /// choosing the format by extension.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, doesn't parse or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path)?,
            _ => Self::from_toml_file(path)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Checks combinations serde cannot reject on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.move_thread_count == MoveThreadCount::Count(0) {
            return Err(ConfigError::Invalid(
                "move_thread_count (0) must be at least 1; use \"none\" to disable move threads"
                    .to_string(),
            ));
        }
        if self.track_working_solution == Some(true) && !self.environment_mode.is_asserted() {
            return Err(ConfigError::Invalid(format!(
                "track_working_solution requires an asserted environment mode, not ({:?})",
                self.environment_mode
            )));
        }
        Ok(())
    }

    pub fn with_environment_mode(mut self, mode: EnvironmentMode) -> Self {
        self.environment_mode = mode;
        self
    }

    pub fn with_constraint_match_enabled(mut self, enabled: bool) -> Self {
        self.constraint_match_enabled = enabled;
        self
    }

    pub fn with_lookup_enabled(mut self, enabled: bool) -> Self {
        self.lookup_enabled = enabled;
        self
    }

    pub fn with_expect_shadow_variables_in_correct_state(mut self, expect: bool) -> Self {
        self.expect_shadow_variables_in_correct_state = expect;
        self
    }

    pub fn with_assert_cloned_solution(mut self, assert: bool) -> Self {
        self.assert_cloned_solution = Some(assert);
        self
    }

    pub fn with_track_working_solution(mut self, track: bool) -> Self {
        self.track_working_solution = Some(track);
        self
    }

    pub fn with_move_thread_count(mut self, count: MoveThreadCount) -> Self {
        self.move_thread_count = count;
        self
    }

    /// Effective clone assertion setting.
    pub fn assert_cloned_solution(&self) -> bool {
        self.assert_cloned_solution
            .unwrap_or_else(|| self.environment_mode.is_fully_asserted())
    }

    /// Effective working solution tracking setting.
    pub fn track_working_solution(&self) -> bool {
        self.track_working_solution
            .unwrap_or_else(|| self.environment_mode.is_tracking())
    }
}

/// Environment mode deciding which consistency assertions run.
///
/// Ordered from most to least asserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMode {
    /// Full assertions plus four-point solution tracking on undo corruption.
    TrackedFullAssert,

    /// Asserts every move and step score from scratch.
    FullAssert,

    /// Asserts from scratch without recalculating before moves.
    NonIntrusiveFullAssert,

    /// Asserts every step score from scratch.
    StepAssert,

    /// Asserts at phase boundaries only.
    PhaseAssert,

    /// Reproducible, no assertions.
    #[default]
    NoAssert,

    /// No assertions and no reproducibility guarantees.
    NonReproducible,
}

impl EnvironmentMode {
    pub fn is_asserted(self) -> bool {
        !matches!(self, EnvironmentMode::NoAssert | EnvironmentMode::NonReproducible)
    }

    pub fn is_fully_asserted(self) -> bool {
        matches!(
            self,
            EnvironmentMode::TrackedFullAssert
                | EnvironmentMode::FullAssert
                | EnvironmentMode::NonIntrusiveFullAssert
        )
    }

    /// Assertions that may change the calculation order, such as
    /// recalculating before every move.
    pub fn is_intrusively_asserted(self) -> bool {
        matches!(
            self,
            EnvironmentMode::TrackedFullAssert
                | EnvironmentMode::FullAssert
                | EnvironmentMode::StepAssert
        )
    }

    pub fn is_step_assert_or_more(self) -> bool {
        self.is_fully_asserted() || self == EnvironmentMode::StepAssert
    }

    pub fn is_tracking(self) -> bool {
        self == EnvironmentMode::TrackedFullAssert
    }

    pub fn is_reproducible(self) -> bool {
        self != EnvironmentMode::NonReproducible
    }
}

/// Move thread count configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveThreadCount {
    /// Derive from the available processors.
    Auto,

    /// No parallel move evaluation.
    #[default]
    None,

    /// Specific number of threads.
    Count(usize),
}

impl MoveThreadCount {
    /// Number of move threads to start; zero means evaluate on the caller's thread.
    ///
    /// `Auto` leaves two processors for the solver and the OS, capped at four.
    pub fn resolve(self, available_processors: usize) -> usize {
        match self {
            MoveThreadCount::None => 0,
            MoveThreadCount::Count(n) => n,
            MoveThreadCount::Auto => available_processors.saturating_sub(2).clamp(1, 4),
        }
    }
}
