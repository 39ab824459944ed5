//! Configuration file schema for connect-instrument.
//!
//! A config file selects the generator variant and the file names the batch
//! walk looks for. Every field is optional.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::generate::SynthesisOptions;

/// Config file names searched for in the current directory.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["connect-instrument.yaml", ".connect-instrument.yaml"];

/// Default name of the connect-go generated file to instrument.
pub const DEFAULT_INPUT_FILE_NAME: &str = "api.connect.go";

/// Default name of the generated sibling artifact.
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "api.telemetry.go";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Variant switches for the emitted code.
    #[serde(default)]
    pub generator: SynthesisOptions,
    #[serde(default = "default_input_file_name")]
    pub input_file_name: String,
    #[serde(default = "default_output_file_name")]
    pub output_file_name: String,
    /// Glob patterns for paths to skip during the batch walk (e.g. "**/vendor/**")
    #[serde(default)]
    pub excluded_paths: Vec<String>,
}

fn default_input_file_name() -> String {
    DEFAULT_INPUT_FILE_NAME.to_string()
}

fn default_output_file_name() -> String {
    DEFAULT_OUTPUT_FILE_NAME.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generator: SynthesisOptions::default(),
            input_file_name: default_input_file_name(),
            output_file_name: default_output_file_name(),
            excluded_paths: Vec::new(),
        }
    }
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Parse and validate a config from YAML text.
    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        // an empty document deserializes to unit, not to an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        validate(&config)?;
        Ok(config)
    }

    /// Load the explicit config if given, otherwise the first default name
    /// present in `dir`, otherwise defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::parse_file(path);
        }
        match discover(dir) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using discovered config");
                Self::parse_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Switch on every generator flag set in `flags`.
    ///
    /// Command-line flags can only enable a variant, never disable one the
    /// config file enabled.
    pub fn enable(&mut self, flags: SynthesisOptions) {
        let generator = &mut self.generator;
        generator.include_provider_lifecycle |= flags.include_provider_lifecycle;
        generator.runtime_toggle |= flags.runtime_toggle;
        generator.tracer_as_injectable_capability |= flags.tracer_as_injectable_capability;
    }

    /// Check if a path should be excluded based on excluded_paths patterns.
    /// Uses globset for matching, which supports `**` for recursive directory matching.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();

        for pattern in &self.excluded_paths {
            if let Ok(glob) = globset::Glob::new(pattern) {
                let matcher = glob.compile_matcher();
                if matcher.is_match(&*path_str) {
                    return true;
                }
            }
        }
        false
    }
}

/// Find a config file by one of the default names in `dir`.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Validate a config.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if config.input_file_name.is_empty() {
        anyhow::bail!("input_file_name must not be empty");
    }
    if config.output_file_name.is_empty() {
        anyhow::bail!("output_file_name must not be empty");
    }
    if config.input_file_name == config.output_file_name {
        anyhow::bail!(
            "output_file_name {:?} would overwrite the input file",
            config.output_file_name
        );
    }
    for name in [&config.input_file_name, &config.output_file_name] {
        if name.contains('/') || name.contains('\\') {
            anyhow::bail!("file name {:?} must not contain a path separator", name);
        }
    }

    // Validate excluded_paths glob patterns compile
    for pattern in &config.excluded_paths {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
    }

    Ok(())
}
