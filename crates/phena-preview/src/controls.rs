//! Control panel model for the preview page
//!
//! The page's script implements these rules in the browser. This module holds
//! the same rules in Rust: the builder uses [`Preferences`] to seed the page's
//! defaults, and the behaviour here is what the page is expected to do.
//! Number fields are read like JavaScript's `parseFloat` on decimal text, and
//! the rotation wraps with JavaScript `%` semantics.

use serde::{Deserialize, Serialize};

/// Local-storage key the page saves preferences under
pub const STORAGE_KEY: &str = "p5PhenaSettings";

/// Default rotation speed in degrees per second
pub const DEFAULT_ROTATION_SPEED: f64 = 180.0;

/// Default refresh rate in frames per second
pub const DEFAULT_REFRESH_RATE: f64 = 30.0;

/// Rotation and refresh settings persisted inside the panel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Degrees per second
    pub rotation_speed: f64,
    /// Frames per second
    pub refresh_rate: f64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            rotation_speed: DEFAULT_ROTATION_SPEED,
            refresh_rate: DEFAULT_REFRESH_RATE,
        }
    }
}

impl Preferences {
    /// Read a stored record, keeping defaults for any field that is absent or not a number
    pub fn from_stored(raw: &str) -> Self {
        Self::default().overlay_stored(raw)
    }

    /// Apply the numeric fields of a stored record on top of `self`
    pub fn overlay_stored(mut self, raw: &str) -> Self {
        let Ok(serde_json::Value::Object(map)) = serde_json::from_str(raw) else {
            return self;
        };

        if let Some(speed) = map.get("rotationSpeed").and_then(|v| v.as_f64()) {
            self.rotation_speed = speed;
        }
        if let Some(rate) = map
            .get("refreshRate")
            .and_then(|v| v.as_f64())
            .filter(|rate| *rate > 0.0)
        {
            self.refresh_rate = rate;
        }
        self
    }

    /// Replace values the page cannot use with the defaults
    ///
    /// Rotation speed must be finite; refresh rate must be finite and positive.
    pub fn sanitized(self) -> Self {
        Self {
            rotation_speed: if self.rotation_speed.is_finite() {
                self.rotation_speed
            } else {
                DEFAULT_ROTATION_SPEED
            },
            refresh_rate: if self.refresh_rate.is_finite() && self.refresh_rate > 0.0 {
                self.refresh_rate
            } else {
                DEFAULT_REFRESH_RATE
            },
        }
    }

    /// JSON literal for embedding in the page script
    ///
    /// serde_json writes non-finite floats as `null`, so values are sanitized first.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.sanitized()).unwrap_or_else(|_| {
            format!(
                "{{\"rotationSpeed\":{},\"refreshRate\":{}}}",
                DEFAULT_ROTATION_SPEED, DEFAULT_REFRESH_RATE
            )
        })
    }
}

/// Parse a refresh-rate field value
///
/// Mirrors `parseFloat` on the leading numeric prefix. Returns `None` for
/// text that is not a number and for values that are not strictly positive.
pub fn parse_refresh_rate(input: &str) -> Option<f64> {
    parse_float(input).filter(|value| *value > 0.0)
}

/// `parseFloat` on decimal text: the leading numeric prefix, if any
pub fn parse_float(input: &str) -> Option<f64> {
    let trimmed = input.trim_start();
    let end = numeric_prefix_len(trimmed);
    let value: f64 = trimmed[..end].parse().ok()?;
    value.is_finite().then_some(value)
}

fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let mut seen_dot = false;
    let mut seen_digit = false;
    while let Some(&b) = bytes.get(end) {
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return 0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let digits = bytes[exp.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits > 0 {
            end = exp + digits;
        }
    }
    end
}

/// Advance a rotation angle by `speed` deg/s over `elapsed_ms`, wrapped modulo 360
///
/// The remainder keeps the sign of the angle, as JavaScript's `%` does, so a
/// negative stored speed turns the canvas the other way within (-360, 0].
pub fn advance_rotation(angle: f64, speed: f64, elapsed_ms: f64) -> f64 {
    (angle + speed * (elapsed_ms / 1000.0)) % 360.0
}

/// Receives frame-rate changes (p5's `frameRate`)
pub trait FrameRateSink {
    fn set_frame_rate(&mut self, fps: f64);
}

/// Persistence for [`Preferences`] (the page uses `localStorage`)
pub trait PreferenceStore {
    fn load(&self) -> Option<String>;
    fn save(&mut self, raw: &str);
}

/// State of the control panel for one loaded page
#[derive(Debug, Clone)]
pub struct ControlPanel {
    prefs: Preferences,
    angle: f64,
}

impl ControlPanel {
    /// Start from the stored record if present, else from `defaults`
    pub fn load(store: &impl PreferenceStore, defaults: Preferences) -> Self {
        let prefs = match store.load() {
            Some(raw) => defaults.overlay_stored(&raw),
            None => defaults,
        };
        Self { prefs, angle: 0.0 }
    }

    pub fn preferences(&self) -> Preferences {
        self.prefs
    }

    /// Current rotation in degrees
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// CSS transform applied to the canvas element
    pub fn canvas_transform(&self) -> String {
        format!("rotate({}deg)", self.angle)
    }

    /// Advance the rotation for one drawn frame
    pub fn on_frame(&mut self, elapsed_ms: f64) -> f64 {
        self.angle = advance_rotation(self.angle, self.prefs.rotation_speed, elapsed_ms);
        self.angle
    }

    /// Slider input; non-numeric values are ignored
    pub fn set_rotation_speed(&mut self, input: &str, store: &mut impl PreferenceStore) -> bool {
        let Some(speed) = parse_float(input) else {
            return false;
        };
        self.prefs.rotation_speed = speed;
        store.save(&self.prefs.to_json());
        true
    }

    /// Refresh-rate commit (change event or Enter)
    ///
    /// Rejected input leaves the state, the store and the sink untouched.
    pub fn commit_refresh_rate(
        &mut self,
        input: &str,
        sink: &mut impl FrameRateSink,
        store: &mut impl PreferenceStore,
    ) -> bool {
        let Some(rate) = parse_refresh_rate(input) else {
            return false;
        };
        self.prefs.refresh_rate = rate;
        sink.set_frame_rate(rate);
        store.save(&self.prefs.to_json());
        true
    }
}
