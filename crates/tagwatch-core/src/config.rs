//! Terminal configuration.
//!
//! Settings are read from a JSON file (path in `TAGWATCH_CONFIG`), then
//! individual keys are overridden from the environment:
//!
//! | Variable             | Field                   |
//! |----------------------|-------------------------|
//! | `TAGWATCH_API_KEY`   | `cloud.api_key`         |
//! | `TAGWATCH_PROJECT_ID`| `cloud.project_id`      |
//! | `TAGWATCH_EMAIL`     | `cloud.email`           |
//! | `TAGWATCH_PASSWORD`  | `cloud.password`        |
//! | `TAGWATCH_TIMEZONE`  | `timezone`              |
//! | `TAGWATCH_DWELL_MS`  | `display.dwell_ms`      |
//!
//! Every field has a default except the cloud credentials, which
//! [`TerminalConfig::validate`] requires.
//!
//! ```
//! use tagwatch_core::TerminalConfig;
//!
//! let config = TerminalConfig::from_json_str(r#"{
//!     "cloud": {
//!         "api_key": "key",
//!         "project_id": "gate-7",
//!         "email": "terminal@example.com",
//!         "password": "secret"
//!     }
//! }"#).unwrap();
//!
//! config.validate().unwrap();
//! assert_eq!(config.cloud.database_root(), "https://gate-7-default-rtdb.firebaseio.com");
//! assert_eq!(config.display.dwell_ms, 3000);
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::ReferenceIds;
use crate::constants::{
    DATABASE_HOST_SUFFIX, DEFAULT_BAND_HEIGHT, DEFAULT_CATEGORY_A_UID, DEFAULT_CATEGORY_B_UID,
    DEFAULT_DISPLAY_HEIGHT, DEFAULT_DISPLAY_WIDTH, DEFAULT_DWELL_MS, DEFAULT_IDENTITY_URL,
    DEFAULT_MAX_TRANSFER_PIXELS, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_TIMEZONE_RULE,
};
use crate::error::{Error, Result};
use crate::timezone::PosixTz;
use crate::types::CredentialId;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "TAGWATCH_CONFIG";

/// Remote service settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Identity provider API key.
    pub api_key: String,

    /// Cloud project id; selects the realtime database host.
    pub project_id: String,

    /// Terminal account email.
    pub email: String,

    /// Terminal account password.
    pub password: String,

    /// Password sign-in endpoint, without the `key` query.
    pub identity_url: String,

    /// Database root override; must be `https://`.
    pub database_url: Option<String>,

    /// Timeout for one HTTP exchange (milliseconds).
    pub request_timeout_ms: u64,

    /// PEM file with the trusted root; the bundled root is used when absent.
    pub root_ca_path: Option<String>,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            project_id: String::new(),
            email: String::new(),
            password: String::new(),
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            database_url: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            root_ca_path: None,
        }
    }
}

impl CloudConfig {
    /// Database root URL, without a trailing slash.
    #[must_use]
    pub fn database_root(&self) -> String {
        match &self.database_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!(
                "https://{}-default-rtdb.{DATABASE_HOST_SUFFIX}",
                self.project_id
            ),
        }
    }

    /// Per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudConfig")
            .field("api_key", &"<redacted>")
            .field("project_id", &self.project_id)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("identity_url", &self.identity_url)
            .field("database_url", &self.database_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("root_ca_path", &self.root_ca_path)
            .finish()
    }
}

/// Allow-list reference identifiers, as hex text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub category_a: String,
    pub category_b: String,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            category_a: CredentialId(DEFAULT_CATEGORY_A_UID.to_vec()).to_text(),
            category_b: CredentialId(DEFAULT_CATEGORY_B_UID.to_vec()).to_text(),
        }
    }
}

impl ReferenceConfig {
    /// Parse both references into a validated pair.
    ///
    /// # Errors
    /// Returns an error if either value is not valid hex or the pair is
    /// rejected by [`ReferenceIds::new`].
    pub fn reference_ids(&self) -> Result<ReferenceIds> {
        ReferenceIds::new(
            CredentialId::parse_hex(&self.category_a)?,
            CredentialId::parse_hex(&self.category_b)?,
        )
    }
}

/// Display panel geometry and feedback timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// How long a non-idle state stays on screen (milliseconds).
    pub dwell_ms: u64,
    pub width: u16,
    pub height: u16,
    /// Rows painted per band.
    pub band_height: u16,
    /// Largest pixel count per transfer.
    pub max_transfer_pixels: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            dwell_ms: DEFAULT_DWELL_MS,
            width: DEFAULT_DISPLAY_WIDTH,
            height: DEFAULT_DISPLAY_HEIGHT,
            band_height: DEFAULT_BAND_HEIGHT,
            max_transfer_pixels: DEFAULT_MAX_TRANSFER_PIXELS,
        }
    }
}

impl DisplayConfig {
    /// Feedback dwell as a duration.
    #[must_use]
    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }
}

/// Complete terminal configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub cloud: CloudConfig,
    pub references: ReferenceConfig,
    pub display: DisplayConfig,

    /// POSIX time-zone rule for access log timestamps.
    pub timezone: String,

    /// Treat non-2xx responses from the log endpoint as failures.
    pub strict_status: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            cloud: CloudConfig::default(),
            references: ReferenceConfig::default(),
            display: DisplayConfig::default(),
            timezone: DEFAULT_TIMEZONE_RULE.to_string(),
            strict_status: false,
        }
    }
}

impl TerminalConfig {
    /// Load from the file named by `TAGWATCH_CONFIG` (if set), apply
    /// environment overrides and validate.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, an override is
    /// malformed, or the result fails [`validate`](Self::validate).
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_json_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file. Missing keys take their defaults.
    ///
    /// # Errors
    /// Returns `Error::Io` or `Error::ConfigFormat`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse JSON configuration text.
    ///
    /// # Errors
    /// Returns `Error::ConfigFormat` on malformed JSON or mistyped values.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Override fields from `TAGWATCH_*` variables.
    ///
    /// `lookup` resolves a variable name to its value; pass
    /// `|k| std::env::var(k).ok()` for the process environment.
    ///
    /// # Errors
    /// Returns `Error::Config` if `TAGWATCH_DWELL_MS` is not an integer.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("TAGWATCH_API_KEY") {
            self.cloud.api_key = value;
        }
        if let Some(value) = lookup("TAGWATCH_PROJECT_ID") {
            self.cloud.project_id = value;
        }
        if let Some(value) = lookup("TAGWATCH_EMAIL") {
            self.cloud.email = value;
        }
        if let Some(value) = lookup("TAGWATCH_PASSWORD") {
            self.cloud.password = value;
        }
        if let Some(value) = lookup("TAGWATCH_TIMEZONE") {
            self.timezone = value;
        }
        if let Some(value) = lookup("TAGWATCH_DWELL_MS") {
            self.display.dwell_ms = value.trim().parse().map_err(|_| {
                Error::Config(format!("TAGWATCH_DWELL_MS must be an integer, got '{value}'"))
            })?;
        }
        Ok(())
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    /// - `Error::MissingConfig` for an empty cloud credential
    /// - `Error::Config` for a non-https endpoint, bad geometry or references
    /// - `Error::InvalidTimeZone` for a bad zone rule
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("cloud.api_key", &self.cloud.api_key),
            ("cloud.project_id", &self.cloud.project_id),
            ("cloud.email", &self.cloud.email),
            ("cloud.password", &self.cloud.password),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::MissingConfig(key.to_string()));
            }
        }

        let endpoints = [
            ("cloud.identity_url", Some(&self.cloud.identity_url)),
            ("cloud.database_url", self.cloud.database_url.as_ref()),
        ];
        for (key, url) in endpoints {
            if let Some(url) = url.filter(|url| !url.starts_with("https://")) {
                return Err(Error::Config(format!("{key} must be an https:// URL, got '{url}'")));
            }
        }

        if self.cloud.request_timeout_ms == 0 {
            return Err(Error::Config(
                "cloud.request_timeout_ms must be positive".to_string(),
            ));
        }

        let display = &self.display;
        if display.width == 0 || display.height == 0 {
            return Err(Error::Config(format!(
                "Display size must be positive, got {}x{}",
                display.width, display.height
            )));
        }
        if display.band_height == 0 || display.band_height > display.height {
            return Err(Error::Config(format!(
                "display.band_height must be in 1..={}, got {}",
                display.height, display.band_height
            )));
        }
        if display.max_transfer_pixels == 0 {
            return Err(Error::Config(
                "display.max_transfer_pixels must be positive".to_string(),
            ));
        }

        self.references.reference_ids()?;
        self.time_zone()?;
        Ok(())
    }

    /// Parsed time-zone rule.
    ///
    /// # Errors
    /// Returns `Error::InvalidTimeZone` if the rule does not parse.
    pub fn time_zone(&self) -> Result<PosixTz> {
        PosixTz::parse(&self.timezone)
    }

    /// Set the cloud credentials.
    pub fn with_credentials(
        mut self,
        api_key: impl Into<String>,
        project_id: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.cloud.api_key = api_key.into();
        self.cloud.project_id = project_id.into();
        self.cloud.email = email.into();
        self.cloud.password = password.into();
        self
    }

    /// Set the feedback dwell.
    pub fn with_dwell_ms(mut self, dwell_ms: u64) -> Self {
        self.display.dwell_ms = dwell_ms;
        self
    }

    /// Set the time-zone rule.
    pub fn with_timezone(mut self, rule: impl Into<String>) -> Self {
        self.timezone = rule.into();
        self
    }

    /// Set whether non-2xx log responses count as failures.
    pub fn with_strict_status(mut self, strict: bool) -> Self {
        self.strict_status = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn complete() -> TerminalConfig {
        TerminalConfig::default().with_credentials("key", "gate-7", "t@example.com", "pw")
    }

    #[test]
    fn test_defaults() {
        let config = TerminalConfig::default();
        assert_eq!(config.display.dwell(), Duration::from_secs(3));
        assert_eq!(config.references.category_a, "99 B6 B3 02");
        assert_eq!(config.references.category_b, "25 0F C5 01");
        assert_eq!(config.timezone, DEFAULT_TIMEZONE_RULE);
        assert!(!config.strict_status);
    }

    #[test]
    fn test_default_requires_credentials() {
        let err = TerminalConfig::default().validate().unwrap_err();
        assert!(matches!(err, Error::MissingConfig(ref key) if key == "cloud.api_key"));
    }

    #[test]
    fn test_complete_config_validates() {
        complete().validate().unwrap();
    }

    #[test]
    fn test_database_root() {
        let mut config = complete();
        assert_eq!(
            config.cloud.database_root(),
            "https://gate-7-default-rtdb.firebaseio.com"
        );

        config.cloud.database_url = Some("https://db.example.com/".to_string());
        assert_eq!(config.cloud.database_root(), "https://db.example.com");
    }

    #[test]
    fn test_plain_http_endpoints_rejected() {
        let mut config = complete();
        config.cloud.database_url = Some("http://127.0.0.1:9000".to_string());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("cloud.database_url")));

        let mut config = complete();
        config.cloud.identity_url = "http://127.0.0.1:9099/signIn".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("cloud.identity_url")));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TAGWATCH_API_KEY", "env-key"),
            ("TAGWATCH_PROJECT_ID", "env-project"),
            ("TAGWATCH_EMAIL", "env@example.com"),
            ("TAGWATCH_PASSWORD", "env-pw"),
            ("TAGWATCH_TIMEZONE", "UTC0"),
            ("TAGWATCH_DWELL_MS", " 1500 "),
        ]
        .into_iter()
        .collect();

        let mut config = TerminalConfig::default();
        config
            .apply_env_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.cloud.api_key, "env-key");
        assert_eq!(config.cloud.project_id, "env-project");
        assert_eq!(config.timezone, "UTC0");
        assert_eq!(config.display.dwell_ms, 1500);
        config.validate().unwrap();
    }

    #[test]
    fn test_bad_dwell_override() {
        let mut config = TerminalConfig::default();
        let err = config
            .apply_env_overrides(|k| (k == "TAGWATCH_DWELL_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_json_file_with_partial_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "cloud": {{ "api_key": "k", "project_id": "p", "email": "e", "password": "s" }},
                "references": {{ "category_a": "01020304", "category_b": "05:06:07:08" }},
                "display": {{ "dwell_ms": 500 }},
                "strict_status": true
            }}"#
        )
        .unwrap();

        let config = TerminalConfig::from_json_file(file.path()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.display.dwell_ms, 500);
        assert_eq!(config.display.width, DEFAULT_DISPLAY_WIDTH);
        assert!(config.strict_status);

        let refs = config.references.reference_ids().unwrap();
        assert_eq!(refs.category_a().as_bytes(), &[1, 2, 3, 4]);
        assert_eq!(refs.category_b().as_bytes(), &[5, 6, 7, 8]);
    }

    #[test]
    fn test_malformed_json() {
        let err = TerminalConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::ConfigFormat(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = TerminalConfig::from_json_file("/nonexistent/tagwatch.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let err = complete().with_timezone("IST-2IDT").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidTimeZone { .. }));
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let mut config = complete();
        config.display.band_height = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = complete();
        config.display.max_transfer_pixels = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_identical_references_rejected() {
        let mut config = complete();
        config.references.category_b = config.references.category_a.clone();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", complete());
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("\"pw\""));
        assert!(!debug.contains("\"key\""));
    }
}
