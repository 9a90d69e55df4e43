//! Namespaced parameter loading for the monitor.
//!
//! Parameters live in `<map_dir>/config.yaml`, a YAML document whose top
//! level maps a namespace to its parameter block:
//!
//! ```yaml
//! third_robot:
//!   ratio: 0.2
//!   image: 201510240538.pgm
//!   resolution: 0.1
//!   origin: [-10.0, -10.0, 0.0]
//! ```
//!
//! `ratio`, `image` and `resolution` fall back to defaults when omitted;
//! `origin` is required and must hold at least two numbers.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Parameter file name under the map package directory
const PARAMS_FILE: &str = "config.yaml";

/// Subdirectory of the map package holding the rasters
const MAP_DIR: &str = "map";

fn default_ratio() -> f64 {
    0.2
}

fn default_image() -> String {
    "201510240538.pgm".to_string()
}

fn default_resolution() -> f64 {
    0.1
}

fn default_bind() -> String {
    "0.0.0.0:7071".to_string()
}

/// Raw parameter block for one namespace
#[derive(Debug, Clone, Deserialize)]
struct MonitorParams {
    /// Initial zoom ratio applied to the map raster
    #[serde(default = "default_ratio")]
    ratio: f64,

    /// Map raster filename under `<map_dir>/map/`
    #[serde(default = "default_image")]
    image: String,

    /// Map resolution in world units per pixel
    #[serde(default = "default_resolution")]
    resolution: f64,

    /// World-frame origin offset `[x, y, ...]`; elements past the second are
    /// ignored
    origin: Vec<f64>,

    /// TCP bind address for the pose service
    #[serde(default = "default_bind")]
    bind: String,
}

/// Resolved monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Absolute path of the map raster
    pub image_path: PathBuf,
    /// Initial zoom ratio
    pub ratio: f64,
    /// World units per pixel at zoom 1
    pub resolution: f64,
    /// World-frame origin offset
    pub origin: (f64, f64),
    /// TCP bind address for the pose service
    pub bind: String,
}

impl MonitorConfig {
    /// Load the namespaced parameter block from `<map_dir>/config.yaml`.
    pub fn load<P: AsRef<Path>>(map_dir: P, namespace: &str) -> Result<Self> {
        let map_dir = map_dir.as_ref();
        let params_path = map_dir.join(PARAMS_FILE);
        let contents = fs::read_to_string(&params_path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", params_path.display(), e))
        })?;
        Self::from_yaml(&contents, map_dir, namespace)
    }

    /// Parse a parameter document. Split out from [`MonitorConfig::load`] so
    /// tests run without touching disk.
    pub fn from_yaml(yaml: &str, map_dir: &Path, namespace: &str) -> Result<Self> {
        let doc: serde_yaml::Value = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("malformed parameter file: {}", e)))?;

        let section = doc.get(namespace).ok_or_else(|| {
            Error::Config(format!("no parameters found for namespace '{}'", namespace))
        })?;

        let params: MonitorParams = serde_yaml::from_value(section.clone()).map_err(|e| {
            Error::Config(format!("invalid parameters for '{}': {}", namespace, e))
        })?;

        if params.origin.len() < 2 {
            return Err(Error::Config(format!(
                "origin must hold at least two elements, got {}",
                params.origin.len()
            )));
        }
        if params.resolution <= 0.0 {
            return Err(Error::Config(format!(
                "resolution must be positive, got {}",
                params.resolution
            )));
        }

        Ok(Self {
            image_path: map_dir.join(MAP_DIR).join(&params.image),
            ratio: params.ratio,
            resolution: params.resolution,
            origin: (params.origin[0], params.origin[1]),
            bind: params.bind,
        })
    }
}
