//! SafeHer configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::device::{Accuracy, DeviceProfile};
use crate::dispatch::RecipientPolicy;
use crate::model::Platform;
use crate::{Result, SafeherError};

/// Default contacts file
pub const DEFAULT_CONTACTS_PATH: &str = "contacts.json";

/// Default data directory (launch flag and other local state)
pub const DEFAULT_DATA_DIR: &str = ".safeher";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeherConfig {
    /// Runtime platform; selects the dispatch channel
    pub platform: Platform,

    /// Contacts file
    pub contacts_path: PathBuf,

    /// Local state directory
    pub data_dir: PathBuf,

    /// Location settings
    pub location: LocationSettings,

    /// Dispatch settings
    pub dispatch: DispatchSettings,

    /// Simulated device behaviour
    pub device: DeviceProfile,

    /// Logging settings
    pub logging: LoggingSettings,
}

impl Default for SafeherConfig {
    fn default() -> Self {
        Self {
            platform: Platform::detect(),
            contacts_path: PathBuf::from(DEFAULT_CONTACTS_PATH),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            location: LocationSettings::default(),
            dispatch: DispatchSettings::default(),
            device: DeviceProfile::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl SafeherConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the platform
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Set the contacts file
    pub fn with_contacts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.contacts_path = path.into();
        self
    }

    /// Set the data directory
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Set the default country code
    pub fn with_country_code(mut self, code: impl Into<String>) -> Self {
        self.dispatch.default_country_code = Some(code.into());
        self
    }

    /// Set the simulated device profile
    pub fn with_device(mut self, device: DeviceProfile) -> Self {
        self.device = device;
        self
    }

    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load from a file if it exists, defaults otherwise
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `SAFEHER_*` environment variables on top of the loaded values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("SAFEHER_PLATFORM") {
            self.platform = value.parse().map_err(SafeherError::InvalidConfig)?;
        }
        if let Some(value) = lookup("SAFEHER_CONTACTS") {
            self.contacts_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("SAFEHER_DATA_DIR") {
            self.data_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("SAFEHER_COUNTRY_CODE") {
            self.dispatch.default_country_code = Some(value);
        }
        Ok(())
    }

    /// Reject malformed values
    pub fn validate(&self) -> Result<()> {
        if let Some(code) = &self.dispatch.default_country_code {
            let digits = code.strip_prefix('+').unwrap_or("");
            let valid = !digits.is_empty()
                && digits.len() <= 4
                && digits.chars().all(|c| c.is_ascii_digit());
            if !valid {
                return Err(SafeherError::InvalidConfig(format!(
                    "default_country_code must look like +91, got '{}'",
                    code
                )));
            }
        }
        if self.contacts_path.as_os_str().is_empty() {
            return Err(SafeherError::InvalidConfig(
                "contacts_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Marker file for the first-launch flag
    pub fn launch_flag_path(&self) -> PathBuf {
        self.data_dir.join("has_launched")
    }
}

/// Location settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationSettings {
    /// Accuracy requested from the position source
    pub accuracy: Accuracy,
}

/// Dispatch settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Prefix for phone numbers lacking a `+` country code
    pub default_country_code: Option<String>,
}

impl DispatchSettings {
    pub fn recipient_policy(&self) -> RecipientPolicy {
        RecipientPolicy {
            default_country_code: self.default_country_code.clone(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = SafeherConfig::default();
        assert_eq!(config.platform, Platform::detect());
        assert_eq!(config.contacts_path, PathBuf::from(DEFAULT_CONTACTS_PATH));
        assert_eq!(config.location.accuracy, Accuracy::High);
        assert!(config.dispatch.default_country_code.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SafeherConfig::new()
            .with_platform(Platform::Ios)
            .with_contacts_path("/tmp/c.json")
            .with_data_dir("/tmp/state")
            .with_country_code("+91")
            .with_device(DeviceProfile::default().with_messaging_available(false));

        assert_eq!(config.platform, Platform::Ios);
        assert!(!config.device.messaging_available);
        assert_eq!(config.contacts_path, PathBuf::from("/tmp/c.json"));
        assert_eq!(config.launch_flag_path(), PathBuf::from("/tmp/state/has_launched"));
        assert_eq!(
            config.dispatch.recipient_policy(),
            RecipientPolicy::with_country_code("+91")
        );
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("safeher.json");

        let config = SafeherConfig::default().with_platform(Platform::Android);
        config.to_file(&path).unwrap();

        let parsed = SafeherConfig::from_file(&path).unwrap();
        assert_eq!(parsed.platform, Platform::Android);
        assert_eq!(parsed.device, config.device);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("safeher.json");
        std::fs::write(&path, r#"{"platform": "web", "location": {"accuracy": "balanced"}}"#).unwrap();

        let config = SafeherConfig::from_file(&path).unwrap();
        assert_eq!(config.platform, Platform::Web);
        assert_eq!(config.location.accuracy, Accuracy::Balanced);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let config = SafeherConfig::load_or_default(dir.path().join("absent.json")).unwrap();
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("SAFEHER_PLATFORM", "ios"),
            ("SAFEHER_CONTACTS", "/data/contacts.json"),
            ("SAFEHER_COUNTRY_CODE", "+44"),
        ]
        .into_iter()
        .collect();

        let mut config = SafeherConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.platform, Platform::Ios);
        assert_eq!(config.contacts_path, PathBuf::from("/data/contacts.json"));
        assert_eq!(config.dispatch.default_country_code.as_deref(), Some("+44"));
    }

    #[test]
    fn test_bad_platform_override() {
        let mut config = SafeherConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "SAFEHER_PLATFORM").then(|| "blackberry".to_string())
        });
        assert!(matches!(result, Err(SafeherError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_country_code() {
        for bad in ["91", "+", "+91a", "+12345"] {
            let config = SafeherConfig::default().with_country_code(bad);
            assert!(config.validate().is_err(), "{} should be rejected", bad);
        }
        assert!(SafeherConfig::default().with_country_code("+1").validate().is_ok());
    }
}
