use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, CurveHandle, SettingsError};

/// Tunable parameters of a [RewindEngine](crate::RewindEngine).
#[derive(Debug, Clone)]
pub struct RewindConfig {
    /// Maximum simulated seconds of history kept per entity.
    pub recorded_window_seconds: f32,
    /// Recorded seconds consumed per real second while reversing.
    ///
    /// Ignored while [speed_curve](Self::speed_curve) is resolved.
    pub rewind_speed: f32,
    /// Optional speed as a function of the playback cursor.
    pub speed_curve: Option<CurveHandle>,
    /// A rewind ends once the average number of frames left per entity drops below this.
    pub min_average_frames: f32,
}

impl Default for RewindConfig {
    fn default() -> Self {
        Self {
            recorded_window_seconds: 15.0,
            rewind_speed: 1.0,
            speed_curve: None,
            min_average_frames: 3.0,
        }
    }
}

impl RewindConfig {
    /// Check that the config can't produce negative or stalled playback.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.recorded_window_seconds > 0.0 && self.recorded_window_seconds.is_finite()) {
            return Err(ConfigError::NonPositiveWindow(self.recorded_window_seconds));
        }
        if !(self.rewind_speed > 0.0 && self.rewind_speed.is_finite()) {
            return Err(ConfigError::NonPositiveSpeed(self.rewind_speed));
        }
        if !(self.min_average_frames >= 0.0 && self.min_average_frames.is_finite()) {
            return Err(ConfigError::InvalidThreshold(self.min_average_frames));
        }
        Ok(())
    }

    /// True if a speed curve is configured and has finished loading.
    pub fn is_curve_set(&self) -> bool {
        self.speed_curve
            .as_ref()
            .map_or(false, CurveHandle::is_resolved)
    }

    /// The rewind speed to use at the given playback cursor.
    pub fn speed_at(&self, cursor_seconds: f32) -> f32 {
        match self.speed_curve.as_ref().and_then(CurveHandle::get) {
            Some(curve) => curve.evaluate(cursor_seconds),
            None => self.rewind_speed,
        }
    }
}

/// Persisted rewind settings, read from a JSON file.
///
/// Missing fields take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewindSettings {
    /// See [RewindConfig::recorded_window_seconds].
    pub record_seconds: f32,
    /// See [RewindConfig::rewind_speed].
    pub rewind_speed: f32,
    /// See [RewindConfig::min_average_frames].
    pub min_average_frames: f32,
    /// Path of a [SpeedCurve](crate::SpeedCurve) JSON file, loaded in the background.
    pub curve_path: Option<PathBuf>,
}

impl Default for RewindSettings {
    fn default() -> Self {
        let config = RewindConfig::default();
        Self {
            record_seconds: config.recorded_window_seconds,
            rewind_speed: config.rewind_speed,
            min_average_frames: config.min_average_frames,
            curve_path: None,
        }
    }
}

impl RewindSettings {
    /// Parse settings from JSON.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write settings to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Build a validated config.
    ///
    /// If a curve path is set, the curve starts loading on a background thread and the
    /// flat rewind speed is used until it finishes.
    pub fn into_config(self) -> Result<RewindConfig, SettingsError> {
        let config = RewindConfig {
            recorded_window_seconds: self.record_seconds,
            rewind_speed: self.rewind_speed,
            speed_curve: None,
            min_average_frames: self.min_average_frames,
        };
        config.validate()?;
        Ok(RewindConfig {
            speed_curve: self.curve_path.map(CurveHandle::load_in_background),
            ..config
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::SpeedCurve;

    #[test]
    fn test_default_config_is_valid() {
        let config = RewindConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.recorded_window_seconds, 15.0);
        assert_eq!(config.rewind_speed, 1.0);
        assert_eq!(config.min_average_frames, 3.0);
        assert!(!config.is_curve_set());
    }

    #[test]
    fn test_validate() {
        let bad_window = RewindConfig {
            recorded_window_seconds: 0.0,
            ..RewindConfig::default()
        };
        assert_eq!(
            bad_window.validate(),
            Err(ConfigError::NonPositiveWindow(0.0))
        );

        let bad_speed = RewindConfig {
            rewind_speed: -1.0,
            ..RewindConfig::default()
        };
        assert_eq!(bad_speed.validate(), Err(ConfigError::NonPositiveSpeed(-1.0)));

        let bad_threshold = RewindConfig {
            min_average_frames: f32::NAN,
            ..RewindConfig::default()
        };
        assert!(matches!(
            bad_threshold.validate(),
            Err(ConfigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_curve_overrides_flat_speed_once_resolved() {
        let handle = CurveHandle::pending();
        let config = RewindConfig {
            rewind_speed: 2.0,
            speed_curve: Some(handle.clone()),
            ..RewindConfig::default()
        };
        assert!(!config.is_curve_set());
        assert_eq!(config.speed_at(0.0), 2.0);

        handle.resolve(SpeedCurve::constant(0.5).unwrap()).unwrap();
        assert!(config.is_curve_set());
        assert_eq!(config.speed_at(0.0), 0.5);
    }

    #[test]
    fn test_settings_defaults_and_partial_json() {
        let settings = RewindSettings::from_json(r#"{"rewind_speed": 2.5}"#).unwrap();
        assert_eq!(settings.rewind_speed, 2.5);
        assert_eq!(settings.record_seconds, 15.0);
        assert_eq!(settings.curve_path, None);

        let config = settings.into_config().unwrap();
        assert_eq!(config.rewind_speed, 2.5);
        assert!(config.speed_curve.is_none());
    }

    #[test]
    fn test_settings_rejects_invalid_values() {
        let settings = RewindSettings::from_json(r#"{"record_seconds": -3}"#).unwrap();
        assert!(matches!(
            settings.into_config(),
            Err(SettingsError::ConfigError(ConfigError::NonPositiveWindow(_)))
        ));
    }

    #[test]
    fn test_settings_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rewind.json");
        let settings = RewindSettings {
            record_seconds: 8.0,
            curve_path: Some(PathBuf::from("curves/ease.json")),
            ..RewindSettings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(RewindSettings::load(&path).unwrap(), settings);
    }
}
