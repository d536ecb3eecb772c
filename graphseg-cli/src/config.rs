//! Parameter resolution: defaults, then an optional config file, then flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, ValueEnum};
use log::debug;

use graphseg::{GraphSegError, SegmentationParams};

/// Segmentation parameters shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct ParamArgs {
    /// Parameter file (.json, .yaml/.yml or .toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Gaussian smoothing sigma (<= 0 disables smoothing) [default: 0.5]
    #[arg(long, allow_negative_numbers = true)]
    pub sigma: Option<f64>,

    /// Merge threshold scale; larger values give larger segments [default: 300]
    #[arg(short, long, allow_negative_numbers = true)]
    pub k: Option<f32>,

    /// Minimum segment size in pixels (<= 0 disables) [default: 100]
    #[arg(short, long, allow_negative_numbers = true)]
    pub min_size: Option<i32>,
}

/// Serialization format for parameter files
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    pub fn parse(self, text: &str) -> Result<SegmentationParams> {
        let params = match self {
            Self::Json => serde_json::from_str(text)?,
            Self::Yaml => serde_yaml::from_str(text)?,
            Self::Toml => toml::from_str(text)?,
        };
        Ok(params)
    }

    pub fn render(self, params: &SegmentationParams, pretty: bool) -> Result<String> {
        let text = match self {
            Self::Json if pretty => serde_json::to_string_pretty(params)?,
            Self::Json => serde_json::to_string(params)?,
            Self::Yaml => serde_yaml::to_string(params)?,
            Self::Toml => toml::to_string_pretty(params)?,
        };
        Ok(text)
    }
}

/// Load parameters from a file; keys it omits keep their defaults.
pub fn load_params(path: &Path) -> Result<SegmentationParams> {
    let format = ConfigFormat::from_path(path).ok_or_else(|| {
        GraphSegError::InvalidInput(format!(
            "Unrecognised config extension: {} (expected .json, .yaml, .yml or .toml)",
            path.display()
        ))
    })?;

    let text = fs::read_to_string(path).map_err(GraphSegError::from)?;
    format.parse(&text).map_err(|e| {
        GraphSegError::InvalidInput(format!("Invalid config {}: {e}", path.display())).into()
    })
}

impl ParamArgs {
    /// Effective parameters, validated
    pub fn resolve(&self) -> Result<SegmentationParams> {
        let mut params = match &self.config {
            Some(path) => {
                debug!("Loading parameters from {}", path.display());
                load_params(path)?
            }
            None => SegmentationParams::default(),
        };

        if let Some(sigma) = self.sigma {
            params.sigma = sigma;
        }
        if let Some(k) = self.k {
            params.k = k;
        }
        if let Some(min_size) = self.min_size {
            params.min_size = min_size;
        }

        params.validate()?;
        debug!("Effective parameters: {:?}", params);
        Ok(params)
    }
}
