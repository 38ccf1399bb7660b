// config.rs
// Run configuration: defaults, optional TOML file, then environment overrides

use crate::error::{Error, Result};
use crate::pipeline::dump::DumperConfig;
use crate::pipeline::emit::AccessorConfig;
use crate::pipeline::publish::PublishConfig;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File consulted when `OFFSETGEN_CONFIG` is not set.
pub const DEFAULT_CONFIG_FILE: &str = "offsetgen.toml";

/// Everything a run needs, built once at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dumper_path: String,
    pub dumper_format: String,
    pub settle_delay_ms: u64,
    /// Where the dumper writes its headers; wiped at the start of a run.
    pub output_dir: PathBuf,
    pub input_extension: String,
    pub json_file: PathBuf,
    pub type_stub_file: PathBuf,
    pub assignment_stub_file: PathBuf,
    pub accessor_function: String,
    pub accessor_handle: String,
    pub publish: PublishConfig,
}

impl Default for Config {
    fn default() -> Self {
        let dumper = DumperConfig::default();
        let accessor = AccessorConfig::default();
        Self {
            dumper_path: dumper.path,
            dumper_format: dumper.format,
            settle_delay_ms: dumper.settle_delay.as_millis() as u64,
            output_dir: PathBuf::from("A2X Generate Files"),
            input_extension: "hpp".to_string(),
            json_file: PathBuf::from("offsets.json"),
            type_stub_file: PathBuf::from("offsets.hpp"),
            assignment_stub_file: PathBuf::from("set_offsets.cpp"),
            accessor_function: accessor.function,
            accessor_handle: accessor.handle,
            publish: PublishConfig::default(),
        }
    }
}

impl Config {
    /// Load `.env`, then the config file if any, then apply environment overrides.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match env::var("OFFSETGEN_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            Err(_) => Self::default(),
        };

        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Override fields from `lookup`, which maps variable names to values.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("OFFSETGEN_DUMPER_PATH") {
            self.dumper_path = v;
        }
        if let Some(v) = lookup("OFFSETGEN_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("OFFSETGEN_JSON_FILE") {
            self.json_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("OFFSETGEN_SETTLE_DELAY_MS") {
            self.settle_delay_ms = v.trim().parse().map_err(|_| {
                Error::Config(format!("OFFSETGEN_SETTLE_DELAY_MS is not a number: {:?}", v))
            })?;
        }
        if let Some(v) = lookup("GITHUB_TOKEN") {
            self.publish.token = v;
        }
        if let Some(v) = lookup("GITHUB_REPOSITORY") {
            self.publish.repository = v;
        }
        if let Some(v) = lookup("GITHUB_BRANCH") {
            self.publish.branch = Some(v).filter(|b| !b.is_empty());
        }
        if let Some(v) = lookup("OFFSETGEN_COMMIT_MESSAGE") {
            self.publish.commit_message = v;
        }
        Ok(())
    }

    pub fn dumper(&self) -> DumperConfig {
        DumperConfig {
            path: self.dumper_path.clone(),
            format: self.dumper_format.clone(),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        }
    }

    pub fn accessor(&self) -> AccessorConfig {
        AccessorConfig {
            function: self.accessor_function.clone(),
            handle: self.accessor_handle.clone(),
        }
    }
}
