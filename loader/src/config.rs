//! Project configuration for content block compilation.
//!
//! Defines the YAML-serializable configuration that names the content block
//! roots to scan, documents to skip, an optional pre-existing base schema
//! and the output format.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! sources:
//!   - packages/site/ContentBlocks
//!   - packages/shared/ContentBlocks
//! exclude:
//!   - acme/legacy-teaser
//! base_schema: base-schema.yaml
//! output:
//!   format: yaml
//! ```

use std::fmt;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LoaderError, Result};

/// File name looked up when no configuration path is given.
pub const DEFAULT_CONFIG_FILE: &str = "content-blocks.yaml";

/// Serialization format of compiler output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Yaml => f.write_str("yaml"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(format!("unknown output format '{other}', expected json or yaml")),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Top-level project configuration.
///
/// Loaded from a YAML file (typically `content-blocks.yaml` in the project
/// root). Relative paths are resolved against the directory holding the
/// file.
///
/// # Examples
///
/// ```
/// use content_blocks_loader::{OutputFormat, ProjectConfig};
///
/// let config: ProjectConfig = serde_yaml::from_str(
///     "version: \"1.0\"\nsources: [blocks]\nexclude: [acme/old]\n",
/// )
/// .unwrap();
/// assert!(config.is_excluded("acme/old"));
/// assert_eq!(config.output.format, OutputFormat::Json);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Content block roots, searched in order.
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    /// Document names to skip.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// YAML description of tables and fields that already exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_schema: Option<PathBuf>,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            sources: vec![PathBuf::from(".")],
            exclude: Vec::new(),
            base_schema: None,
            output: OutputConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](LoaderError::Io) if the file cannot be read, or
    /// [`Yaml`](LoaderError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).map_err(|e| LoaderError::yaml(path, e))
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](LoaderError::Io) if the file cannot be written, or
    /// [`Yaml`](LoaderError::Yaml) if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self).map_err(|e| LoaderError::yaml(path, e))
    }

    /// Returns `true` if the document `name` is in the exclusion list.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|n| n == name)
    }

    /// Source roots resolved against `base_dir`.
    pub fn source_roots(&self, base_dir: &Path) -> Vec<PathBuf> {
        self.sources.iter().map(|s| base_dir.join(s)).collect()
    }

    /// Base schema path resolved against `base_dir`.
    pub fn base_schema_path(&self, base_dir: &Path) -> Option<PathBuf> {
        self.base_schema.as_ref().map(|p| base_dir.join(p))
    }
}
