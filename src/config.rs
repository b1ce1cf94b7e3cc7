use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::guidance::advisor::CameraGeometry;
use crate::state::DetectorTuning;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "DRONE_PILOT_CONFIG";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    /// Video poll interval.
    pub frame_interval_ms: u64,
    /// Status refresh interval; also the frame-rate sampling window.
    pub status_interval_ms: u64,
    pub camera: CameraConfig,
    /// Advisor dead zone as a fraction of each picture dimension.
    pub dead_zone: f32,
    pub detector: DetectorTuning,
}

/// Bottom camera of the drone.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    pub fov_deg: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { width: 176, height: 144, fov_deg: 64.0 }
    }
}

impl From<CameraConfig> for CameraGeometry {
    fn from(c: CameraConfig) -> Self {
        CameraGeometry { width: c.width, height: c.height, fov_deg: c.fov_deg }
    }
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 50,
            status_interval_ms: 1000,
            camera: CameraConfig::default(),
            dead_zone: 0.1,
            detector: DetectorTuning::default(),
        }
    }
}

impl PilotConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Reads the file named by [`CONFIG_ENV`], or returns defaults when the
    /// variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_interval_ms == 0 || self.status_interval_ms == 0 {
            return Err(ConfigError::Invalid("loop intervals must be non-zero"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(ConfigError::Invalid("camera size must be non-zero"));
        }
        if !(self.camera.fov_deg > 0.0) {
            return Err(ConfigError::Invalid("camera fov_deg must be positive"));
        }
        if !(0.0..0.5).contains(&self.dead_zone) {
            return Err(ConfigError::Invalid("dead_zone must be in [0, 0.5)"));
        }
        if self.detector.min > self.detector.max {
            return Err(ConfigError::Invalid("detector min exceeds max"));
        }
        Ok(())
    }
}
