//! Configuration file management for adforge.
//!
//! Provides an optional TOML config file at `~/.config/adforge/config.toml`
//! and a resolution chain: env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use adforge_core::creative::CreativeConfig;

/// Env var pointing the data stage at a JSON fixture file.
pub const FIXTURE_ENV: &str = "ADFORGE_DATA_FIXTURE";
/// Env var fixing the random seed.
pub const SEED_ENV: &str = "ADFORGE_SEED";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub creative: CreativeSection,
    pub planner: PlannerSection,
    pub data: DataSection,
    pub run: RunSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreativeSection {
    /// Round-robin format sequence, by snake_case name.
    pub formats: Option<Vec<String>>,
    pub variants_per_segment: Option<usize>,
    pub max_variants: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerSection {
    /// Replaces the built-in creative trigger phrases.
    pub creative_keywords: Option<Vec<String>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataSection {
    pub fixture_path: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    pub seed: Option<u64>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the adforge config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/adforge` or `~/.config/adforge`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("adforge");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("adforge")
}

/// Return the path to the adforge config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read
// -----------------------------------------------------------------------

/// Load and parse the config file. A missing file is not an error.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config = parse_config(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

pub fn parse_config(contents: &str) -> Result<ConfigFile> {
    Ok(toml::from_str(contents)?)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct AdforgeConfig {
    pub creative: CreativeConfig,
    /// `None` keeps the classifier's built-in trigger phrases.
    pub creative_keywords: Option<Vec<String>>,
    /// `None` serves the embedded sample campaign.
    pub fixture_path: Option<PathBuf>,
    /// `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl AdforgeConfig {
    /// Resolve configuration from the config file and environment.
    pub fn resolve() -> Result<Self> {
        let file = load_config()?.unwrap_or_default();
        Self::from_file(file)
    }

    /// Resolve using the chain: env var > `file` > default.
    ///
    /// - Fixture: `ADFORGE_DATA_FIXTURE` env > `data.fixture_path` > embedded sample
    /// - Seed: `ADFORGE_SEED` env > `run.seed` > OS entropy
    pub fn from_file(file: ConfigFile) -> Result<Self> {
        let creative = resolve_creative(&file.creative)?;

        let fixture_path = match std::env::var(FIXTURE_ENV) {
            Ok(path) if !path.is_empty() => Some(PathBuf::from(path)),
            _ => file.data.fixture_path,
        };

        let seed = match std::env::var(SEED_ENV) {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("{SEED_ENV} must be an unsigned integer, got {raw:?}"))?,
            ),
            Err(_) => file.run.seed,
        };

        Ok(Self {
            creative,
            creative_keywords: file.planner.creative_keywords,
            fixture_path,
            seed,
        })
    }
}

fn resolve_creative(section: &CreativeSection) -> Result<CreativeConfig> {
    let variants_per_segment = section
        .variants_per_segment
        .unwrap_or(CreativeConfig::DEFAULT_VARIANTS_PER_SEGMENT);
    let max_variants = section
        .max_variants
        .unwrap_or(CreativeConfig::DEFAULT_MAX_VARIANTS);

    let config = match &section.formats {
        Some(names) => {
            CreativeConfig::from_names(names.as_slice(), variants_per_segment, max_variants)
        }
        None => CreativeConfig::new(
            CreativeConfig::default().formats().to_vec(),
            variants_per_segment,
            max_variants,
        ),
    };
    config.context("invalid [creative] settings")
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
