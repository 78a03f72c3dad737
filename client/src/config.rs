//! Client Configuration
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::detection::DetectorConfig;

/// Shortest allowed recording interval.
pub const MIN_RECORDING_INTERVAL_MS: u64 = 500;
/// Longest allowed recording interval.
pub const MAX_RECORDING_INTERVAL_MS: u64 = 5000;

/// Where frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraSource {
    /// Native camera device by index.
    Webcam { index: u32 },
    /// Generated frames (headless runs).
    Synthetic,
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the training/prediction service
    pub api_base_url: String,

    /// Client-side timeout for every request (default: 30s)
    pub http_timeout: Duration,

    /// Frame source
    pub camera_source: CameraSource,

    /// Capture resolution (samples are scaled to this size)
    pub capture_width: u32,
    pub capture_height: u32,

    /// Target camera frame rate
    pub camera_fps: u32,

    /// JPEG quality, 1-100 (default: 90)
    pub jpeg_quality: u8,

    /// Default recording interval in milliseconds
    pub recording_interval_ms: u64,

    /// Pause between successive upload attempts (default: 200ms)
    pub upload_settle_delay: Duration,

    /// How often the sample inventory is refreshed (default: 5s)
    pub inventory_refresh: Duration,

    /// Minimum samples before training is allowed
    pub min_training_samples: u64,

    /// Model selected at startup
    pub default_model_name: String,

    /// Skip recording ticks while no hand is present
    pub skip_ticks_without_hand: bool,

    /// Options handed to the hand-landmark detector
    pub detector: DetectorConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let camera_source = match env::var("CAMERA_SOURCE")
            .unwrap_or_else(|_| "webcam".into())
            .to_ascii_lowercase()
            .as_str()
        {
            "webcam" => CameraSource::Webcam {
                index: parse_var("CAMERA_INDEX", 0)?,
            },
            "synthetic" => CameraSource::Synthetic,
            other => bail!("CAMERA_SOURCE must be 'webcam' or 'synthetic', got '{other}'"),
        };

        let jpeg_quality: u8 = parse_var("JPEG_QUALITY", 90)?;
        if !(1..=100).contains(&jpeg_quality) {
            bail!("JPEG_QUALITY must be between 1 and 100, got {jpeg_quality}");
        }

        let inventory_refresh_secs: u64 = parse_var("INVENTORY_REFRESH_SECS", 5)?;
        if inventory_refresh_secs == 0 {
            bail!("INVENTORY_REFRESH_SECS must be at least 1");
        }

        Ok(Self {
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".into())
                .trim_end_matches('/')
                .to_string(),
            http_timeout: Duration::from_secs(parse_var("HTTP_TIMEOUT_SECS", 30)?),
            camera_source,
            capture_width: parse_var("CAPTURE_WIDTH", 800)?,
            capture_height: parse_var("CAPTURE_HEIGHT", 600)?,
            camera_fps: parse_var::<u32>("CAMERA_FPS", 30)?.max(1),
            jpeg_quality,
            recording_interval_ms: parse_var::<u64>("RECORDING_INTERVAL_MS", 1000)?
                .clamp(MIN_RECORDING_INTERVAL_MS, MAX_RECORDING_INTERVAL_MS),
            upload_settle_delay: Duration::from_millis(parse_var("UPLOAD_SETTLE_MS", 200)?),
            inventory_refresh: Duration::from_secs(inventory_refresh_secs),
            min_training_samples: parse_var("MIN_TRAINING_SAMPLES", 10)?,
            default_model_name: env::var("DEFAULT_MODEL_NAME")
                .unwrap_or_else(|_| "sign_model_v1".into()),
            skip_ticks_without_hand: parse_var("SKIP_TICKS_WITHOUT_HAND", true)?,
            detector: DetectorConfig {
                max_num_hands: parse_var("DETECTOR_MAX_HANDS", 2)?,
                min_detection_confidence: parse_var("DETECTOR_MIN_DETECTION_CONFIDENCE", 0.5)?,
                min_tracking_confidence: parse_var("DETECTOR_MIN_TRACKING_CONFIDENCE", 0.5)?,
                ..DetectorConfig::default()
            },
        })
    }

    /// Create a configuration for tests against a mock service.
    ///
    /// Uses a synthetic camera, a tiny capture size and short delays so
    /// pipeline tests finish quickly.
    #[must_use]
    pub fn default_for_test(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            http_timeout: Duration::from_secs(5),
            camera_source: CameraSource::Synthetic,
            capture_width: 64,
            capture_height: 48,
            camera_fps: 50,
            jpeg_quality: 90,
            recording_interval_ms: MIN_RECORDING_INTERVAL_MS,
            upload_settle_delay: Duration::from_millis(10),
            inventory_refresh: Duration::from_secs(3600),
            min_training_samples: 10,
            default_model_name: "sign_model_v1".into(),
            skip_ticks_without_hand: true,
            detector: DetectorConfig::default(),
        }
    }
}

/// Read and parse an optional variable, falling back to `default` when unset.
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: '{raw}'")),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "API_BASE_URL",
        "CAMERA_SOURCE",
        "CAMERA_INDEX",
        "JPEG_QUALITY",
        "RECORDING_INTERVAL_MS",
        "UPLOAD_SETTLE_MS",
        "INVENTORY_REFRESH_SECS",
    ];

    fn clear_vars() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn defaults_when_unset() {
        clear_vars();
        let config = Config::from_env().unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.camera_source, CameraSource::Webcam { index: 0 });
        assert_eq!(config.jpeg_quality, 90);
        assert_eq!(config.recording_interval_ms, 1000);
        assert_eq!(config.upload_settle_delay, Duration::from_millis(200));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.detector.max_num_hands, 2);
    }

    #[test]
    #[serial]
    fn reads_overrides() {
        clear_vars();
        env::set_var("API_BASE_URL", "https://samples.example.com/");
        env::set_var("CAMERA_SOURCE", "Synthetic");
        env::set_var("RECORDING_INTERVAL_MS", "99999");
        let config = Config::from_env().unwrap();
        clear_vars();

        assert_eq!(config.api_base_url, "https://samples.example.com");
        assert_eq!(config.camera_source, CameraSource::Synthetic);
        assert_eq!(config.recording_interval_ms, MAX_RECORDING_INTERVAL_MS);
    }

    #[test]
    #[serial]
    fn rejects_malformed_values() {
        clear_vars();
        env::set_var("UPLOAD_SETTLE_MS", "soon");
        let err = Config::from_env().unwrap_err();
        clear_vars();
        assert!(err.to_string().contains("UPLOAD_SETTLE_MS"));

        env::set_var("JPEG_QUALITY", "0");
        assert!(Config::from_env().is_err());
        clear_vars();

        env::set_var("INVENTORY_REFRESH_SECS", "0");
        let err = Config::from_env().unwrap_err();
        clear_vars();
        assert!(err.to_string().contains("INVENTORY_REFRESH_SECS"));
    }
}
