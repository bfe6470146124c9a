use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Fixed viewport and throttling parameters for a device profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throttling {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub device_scale_factor: f64,
    pub cpu_slowdown_multiplier: f64,
    /// Round-trip latency in milliseconds.
    pub latency_ms: f64,
    pub download_kbps: f64,
    pub upload_kbps: f64,
}

// Slow 4G on a mid-tier phone.
const MOBILE: Throttling = Throttling {
    viewport_width: 412,
    viewport_height: 823,
    device_scale_factor: 1.75,
    cpu_slowdown_multiplier: 4.0,
    latency_ms: 150.0,
    download_kbps: 1638.4,
    upload_kbps: 675.0,
};

// Wired connection on a desktop.
const DESKTOP: Throttling = Throttling {
    viewport_width: 1350,
    viewport_height: 940,
    device_scale_factor: 1.0,
    cpu_slowdown_multiplier: 1.0,
    latency_ms: 40.0,
    download_kbps: 10_240.0,
    upload_kbps: 10_240.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceProfile {
    Mobile,
    Desktop,
}

impl DeviceProfile {
    pub fn throttling(&self) -> &'static Throttling {
        match self {
            DeviceProfile::Mobile => &MOBILE,
            DeviceProfile::Desktop => &DESKTOP,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceProfile::Mobile => "mobile",
            DeviceProfile::Desktop => "desktop",
        }
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceProfile {
    type Err = ValidationError;

    /// Exact, case-sensitive match on the wire names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mobile" => Ok(DeviceProfile::Mobile),
            "desktop" => Ok(DeviceProfile::Desktop),
            other => Err(ValidationError::InvalidDevice(other.to_string())),
        }
    }
}
