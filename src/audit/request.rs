use reqwest::Url;

use super::device::DeviceProfile;
use crate::error::ValidationError;

/// A validated audit request. The url is kept verbatim: cache identity is the
/// exact caller string plus the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuditRequest {
    pub url: String,
    pub device: DeviceProfile,
}

impl AuditRequest {
    pub fn new(url: impl Into<String>, device: DeviceProfile) -> Self {
        Self {
            url: url.into(),
            device,
        }
    }

    /// Validate raw caller input. The device is checked first so an unknown
    /// device is rejected whatever the url looks like.
    pub fn parse(url: Option<&str>, device: Option<&str>) -> Result<Self, ValidationError> {
        let device: DeviceProfile = device.unwrap_or_default().parse()?;

        let url = match url {
            Some(u) if !u.trim().is_empty() => u,
            _ => return Err(ValidationError::MissingUrl),
        };

        let parsed = Url::parse(url).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(ValidationError::UnsupportedScheme(other.to_string())),
        }

        Ok(Self::new(url, device))
    }
}
