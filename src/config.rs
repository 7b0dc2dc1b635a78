use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::parser::boilerplate::Expand;
use crate::taxonomy::{HazardTaxonomy, SectorTaxonomy};

const DEFAULT_DB_PATH: &str = "data/dref.sqlite";
const DEFAULT_CONFIG_FILE: &str = "dref";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("{field} must be in (0, 1], got {value}")]
    Threshold { field: &'static str, value: f64 },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("challenge_hard_cap ({hard}) is below challenge_soft_cap ({soft})")]
    CapOrder { hard: usize, soft: usize },

    #[error("Invalid taxonomy: {0}")]
    Taxonomy(String),
}

/// Tunable constants of the extraction engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Share of pages a header or footer must appear on to count as boilerplate.
    pub boilerplate_threshold: f64,
    /// How far a boilerplate removal widens around each hit.
    pub boilerplate_expand: Expand,
    pub strip_post_headers: bool,
    /// Forward context captured after a "Challenges" anchor.
    pub challenge_window: usize,
    pub challenge_back_window: usize,
    pub challenge_hard_cap: usize,
    pub challenge_soft_cap: usize,
    /// Forward context captured after a "Lessons" anchor.
    pub lessons_window: usize,
    /// Context searched backwards for a section title.
    pub section_back_window: usize,
    /// Section markers closer than this to the previous one are duplicates.
    pub section_min_gap: usize,
    pub max_strip_passes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            boilerplate_threshold: 0.3,
            boilerplate_expand: Expand::ToLinebreak,
            strip_post_headers: false,
            challenge_window: 50_000,
            challenge_back_window: 5,
            challenge_hard_cap: 3500,
            challenge_soft_cap: 1000,
            lessons_window: 7000,
            section_back_window: 100,
            section_min_gap: 100,
            max_strip_passes: 20,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.boilerplate_threshold > 0.0 && self.boilerplate_threshold <= 1.0) {
            return Err(ConfigError::Threshold {
                field: "boilerplate_threshold",
                value: self.boilerplate_threshold,
            });
        }
        for (name, value) in [
            ("challenge_window", self.challenge_window),
            ("challenge_hard_cap", self.challenge_hard_cap),
            ("challenge_soft_cap", self.challenge_soft_cap),
            ("lessons_window", self.lessons_window),
            ("section_back_window", self.section_back_window),
            ("max_strip_passes", self.max_strip_passes),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }
        if self.challenge_hard_cap < self.challenge_soft_cap {
            return Err(ConfigError::CapOrder {
                hard: self.challenge_hard_cap,
                soft: self.challenge_soft_cap,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub db_path: PathBuf,
    pub engine: EngineConfig,
    pub sectors: SectorTaxonomy,
    pub hazards: HazardTaxonomy,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            engine: EngineConfig::default(),
            sectors: SectorTaxonomy::default(),
            hazards: HazardTaxonomy::default(),
        }
    }
}

impl Settings {
    /// Defaults, then `dref.toml` (or `path` when given), then `DREF_*` environment variables.
    ///
    /// Nested keys use a double underscore: `DREF_ENGINE__CHALLENGE_HARD_CAP=4000`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("DREF")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.sectors.validate()?;
        self.hazards.validate()
    }
}
