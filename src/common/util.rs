// src/common/util.rs

/// Host-side helpers a session needs but does not own.
pub trait Utilities {
    /// Acquisition timestamp attached to each [`Reading`](super::types::Reading).
    fn timestamp(&self) -> String;

    /// Dew point in °C from temperature in °C and relative humidity in %.
    fn dew_point(&self, temperature_c: f64, relative_humidity: f64) -> f64;

    /// Rounds a reported value for presentation.
    fn round(&self, value: f64) -> f64;
}

/// Magnus coefficients over water (Sonntag 1990), valid for -45..60 °C.
const MAGNUS_B: f64 = 17.62;
const MAGNUS_C: f64 = 243.12;

/// Wall-clock timestamps from `jiff`, Magnus dew point, two-decimal rounding.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemUtilities;

impl Utilities for SystemUtilities {
    fn timestamp(&self) -> String {
        jiff::Timestamp::now().to_string()
    }

    fn dew_point(&self, temperature_c: f64, relative_humidity: f64) -> f64 {
        // ln(0) is undefined; clamp to a tiny positive humidity.
        let rh = relative_humidity.clamp(0.01, 100.0);
        let gamma = (rh / 100.0).ln() + MAGNUS_B * temperature_c / (MAGNUS_C + temperature_c);
        MAGNUS_C * gamma / (MAGNUS_B - gamma)
    }

    fn round(&self, value: f64) -> f64 {
        (value * 100.0).round() / 100.0
    }
}
