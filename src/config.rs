//! Runtime configuration.
//!
//! Read from a TOML file; every field has a default, so an empty file (or no
//! file at all) is a valid configuration.
//!
//! ```toml
//! log_level = "debug"
//!
//! [io]
//! base_dir = "images"
//! create_dirs = false
//!
//! [execution]
//! record_timings = false
//! ```

use crate::core::error::PixelflowResult;
use crate::core::io::FsImageIo;
use crate::execution::engine::ExecutionOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Image I/O settings.
    pub io: IoConfig,
    /// Execution settings.
    pub execution: ExecutionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            io: IoConfig::default(),
            execution: ExecutionConfig::default(),
        }
    }
}

/// Image I/O settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Directory relative image paths resolve against.
    pub base_dir: Option<PathBuf>,
    /// Create missing parent directories before saving.
    pub create_dirs: bool,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            create_dirs: true,
        }
    }
}

/// Execution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Keep per-node durations in the report.
    pub record_timings: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            record_timings: true,
        }
    }
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> PixelflowResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> PixelflowResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Filesystem I/O built from the `[io]` section.
    pub fn fs_io(&self) -> FsImageIo {
        let io = FsImageIo::new().with_create_dirs(self.io.create_dirs);
        match &self.io.base_dir {
            Some(base) => io.with_base_dir(base),
            None => io,
        }
    }

    /// Execution options built from the `[execution]` section.
    pub fn execution_options(&self) -> ExecutionOptions {
        ExecutionOptions::new().with_timings(self.execution.record_timings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::PixelflowError;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.log_level, "info");
        assert!(config.io.create_dirs);
        assert!(config.execution.record_timings);
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml_str(
            r#"
            log_level = "debug"

            [io]
            base_dir = "images"
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.io.base_dir, Some(PathBuf::from("images")));
        assert!(config.io.create_dirs);
        assert_eq!(
            config.fs_io().resolve(Path::new("a.png")),
            PathBuf::from("images").join("a.png")
        );
    }

    #[test]
    fn test_execution_options() {
        let config = Config::from_toml_str("[execution]\nrecord_timings = false\n").unwrap();
        assert!(!config.execution_options().record_timings);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml_str("log_level = [").unwrap_err();
        assert!(matches!(err, PixelflowError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"warn\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.log_level, "warn");

        let missing = Config::load(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(PixelflowError::Io(_))));
    }
}
