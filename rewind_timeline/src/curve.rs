use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::CurveError;

/// A key of a [SpeedCurve]: the rewind speed at a point of the playback cursor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    /// Playback cursor position in recorded seconds.
    pub time: f32,
    /// Rewind speed in recorded seconds per real second.
    pub value: f32,
}

/// Rewind speed as a function of how far playback has rewound.
///
/// Values are interpolated linearly between keys and held constant before the first and
/// after the last key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedCurve {
    keys: Vec<CurveKey>,
}

#[derive(Deserialize)]
struct CurveFile {
    keys: Vec<CurveKey>,
}

impl SpeedCurve {
    /// Build a curve from keys sorted by time.
    ///
    /// Every key must be finite with a positive speed, otherwise the cursor could stall
    /// or run backward.
    pub fn new(keys: Vec<CurveKey>) -> Result<Self, CurveError> {
        if keys.is_empty() {
            return Err(CurveError::NoKeys);
        }
        for (index, key) in keys.iter().enumerate() {
            if !key.time.is_finite() || !key.value.is_finite() {
                return Err(CurveError::NonFiniteKey { index });
            }
            if key.value <= 0.0 {
                return Err(CurveError::NonPositiveValue {
                    index,
                    value: key.value,
                });
            }
            if index > 0 && key.time < keys[index - 1].time {
                return Err(CurveError::UnsortedKey { index });
            }
        }
        Ok(Self { keys })
    }

    /// A curve with a single constant speed.
    pub fn constant(speed: f32) -> Result<Self, CurveError> {
        Self::new(vec![CurveKey {
            time: 0.0,
            value: speed,
        }])
    }

    /// Parse a curve from JSON of the form `{"keys": [{"time": 0, "value": 1}, ...]}`.
    pub fn from_json(json: &str) -> Result<Self, CurveError> {
        let file: CurveFile = serde_json::from_str(json)?;
        Self::new(file.keys)
    }

    /// Read a curve from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CurveError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The keys of the curve, sorted by time.
    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Evaluate the speed at the given cursor position.
    pub fn evaluate(&self, time: f32) -> f32 {
        let first = self.keys[0];
        if time <= first.time {
            return first.value;
        }
        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if time <= b.time {
                let span = b.time - a.time;
                if span <= 0.0 {
                    return b.value;
                }
                return a.value + (b.value - a.value) * ((time - a.time) / span);
            }
        }
        self.keys[self.keys.len() - 1].value
    }
}

/// A shared, possibly not yet loaded, [SpeedCurve].
///
/// Clones share the same slot, so a curve resolved through one clone is visible to the
/// engine holding another. The slot can only be filled once.
#[derive(Debug, Clone, Default)]
pub struct CurveHandle {
    cell: Arc<OnceCell<SpeedCurve>>,
}

impl CurveHandle {
    /// A handle that is already resolved.
    pub fn ready(curve: SpeedCurve) -> Self {
        Self {
            cell: Arc::new(OnceCell::with_value(curve)),
        }
    }

    /// An unresolved handle, to be filled later with [resolve](Self::resolve).
    pub fn pending() -> Self {
        Self::default()
    }

    /// Fill the handle.
    ///
    /// Returns the curve back if the handle was already resolved.
    pub fn resolve(&self, curve: SpeedCurve) -> Result<(), SpeedCurve> {
        self.cell.set(curve)
    }

    /// Start loading a curve file on a background thread and return the unresolved handle.
    ///
    /// If loading fails the error is logged and the handle stays unresolved.
    pub fn load_in_background(path: impl Into<PathBuf>) -> Self {
        let handle = Self::pending();
        let path = path.into();
        let loader = handle.clone();
        thread::spawn(move || match SpeedCurve::load(&path) {
            Ok(curve) => {
                tracing::debug!("loaded rewind curve {}", path.display());
                loader.resolve_loaded(curve, &path);
            }
            Err(error) => {
                tracing::warn!("failed to load rewind curve {}: {}", path.display(), error);
            }
        });
        handle
    }

    /// Fill the handle with a curve loaded from `path`, keeping any curve already present.
    ///
    /// Returns false if the loaded curve was discarded.
    fn resolve_loaded(&self, curve: SpeedCurve, path: &Path) -> bool {
        if self.resolve(curve).is_err() {
            tracing::warn!(
                "rewind curve {} arrived after the handle was resolved; discarding it",
                path.display()
            );
            return false;
        }
        true
    }

    /// The curve, if it has been resolved.
    pub fn get(&self) -> Option<&SpeedCurve> {
        self.cell.get()
    }

    /// True once the curve is available.
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }
}

#[cfg(test)]
mod test {
    use std::{
        io::Write,
        time::{Duration, Instant},
    };

    use super::*;

    fn key(time: f32, value: f32) -> CurveKey {
        CurveKey { time, value }
    }

    #[test]
    fn test_evaluate() {
        let curve = SpeedCurve::new(vec![key(0.0, 1.0), key(2.0, 3.0), key(4.0, 3.0)]).unwrap();
        assert_eq!(curve.evaluate(-1.0), 1.0);
        assert_eq!(curve.evaluate(0.0), 1.0);
        assert!((curve.evaluate(1.0) - 2.0).abs() < 1e-6);
        assert_eq!(curve.evaluate(3.0), 3.0);
        assert_eq!(curve.evaluate(10.0), 3.0);
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!(matches!(SpeedCurve::new(vec![]), Err(CurveError::NoKeys)));
        assert!(matches!(
            SpeedCurve::new(vec![key(1.0, 1.0), key(0.5, 1.0)]),
            Err(CurveError::UnsortedKey { index: 1 })
        ));
        assert!(matches!(
            SpeedCurve::new(vec![key(0.0, 0.0)]),
            Err(CurveError::NonPositiveValue { index: 0, .. })
        ));
        assert!(matches!(
            SpeedCurve::new(vec![key(f32::NAN, 1.0)]),
            Err(CurveError::NonFiniteKey { index: 0 })
        ));
    }

    #[test]
    fn test_from_json() {
        let curve =
            SpeedCurve::from_json(r#"{"keys": [{"time": 0, "value": 2}, {"time": 1, "value": 4}]}"#)
                .unwrap();
        assert_eq!(curve.keys().len(), 2);
        assert!((curve.evaluate(0.5) - 3.0).abs() < 1e-6);

        assert!(matches!(
            SpeedCurve::from_json("{\"keys\": 3}"),
            Err(CurveError::JsonError(_))
        ));
    }

    #[test]
    fn test_handle_resolves_once() {
        let handle = CurveHandle::pending();
        let engine_view = handle.clone();
        assert!(!engine_view.is_resolved());

        handle.resolve(SpeedCurve::constant(2.0).unwrap()).unwrap();
        assert_eq!(engine_view.get().map(|curve| curve.evaluate(0.0)), Some(2.0));
        assert!(handle.resolve(SpeedCurve::constant(5.0).unwrap()).is_err());
    }

    #[test]
    fn test_late_loaded_curve_is_discarded() {
        let handle = CurveHandle::ready(SpeedCurve::constant(2.0).unwrap());
        let path = Path::new("curves/late.json");
        assert!(!handle.resolve_loaded(SpeedCurve::constant(7.0).unwrap(), path));
        assert_eq!(handle.get().map(|curve| curve.evaluate(0.0)), Some(2.0));

        let pending = CurveHandle::pending();
        assert!(pending.resolve_loaded(SpeedCurve::constant(7.0).unwrap(), path));
        assert_eq!(pending.get().map(|curve| curve.evaluate(0.0)), Some(7.0));
    }

    #[test]
    fn test_load_in_background() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"keys": [{{"time": 0, "value": 0.5}}]}}"#).unwrap();

        let handle = CurveHandle::load_in_background(file.path());
        let deadline = Instant::now() + Duration::from_secs(5);
        while !handle.is_resolved() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(handle.get().map(|curve| curve.evaluate(3.0)), Some(0.5));
    }

    #[test]
    fn test_load_missing_file_stays_pending() {
        let handle = CurveHandle::load_in_background("/nonexistent/rewind_curve.json");
        thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_resolved());
    }
}
