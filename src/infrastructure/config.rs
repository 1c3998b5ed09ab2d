use crate::infrastructure::error::InfraError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const APP_JSON: &str = "app.json";
const SUPPORTED_SCHEMA: u64 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CredentialBackend {
    #[default]
    LocalStorage,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AiConfig {
    pub base_url: String,
    pub model: String,
    pub suggestion_max_tokens: u32,
    pub summary_max_tokens: u32,
    pub temperature: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            suggestion_max_tokens: 300,
            summary_max_tokens: 800,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub schema: u64,
    pub app_name: String,
    pub timezone: String,
    pub storage_key: String,
    pub credential_key: String,
    pub credential_backend: CredentialBackend,
    pub export_dir: String,
    pub ai: AiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema: SUPPORTED_SCHEMA,
            app_name: "FocusMate".to_string(),
            timezone: "UTC".to_string(),
            storage_key: "focusMateData".to_string(),
            credential_key: "openai_api_key".to_string(),
            credential_backend: CredentialBackend::LocalStorage,
            export_dir: "exports".to_string(),
            ai: AiConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn tz(&self) -> Result<Tz, InfraError> {
        self.timezone.trim().parse::<Tz>().map_err(|error| {
            InfraError::InvalidConfig(format!("invalid timezone '{}': {error}", self.timezone))
        })
    }

    fn validate(&self, path: &Path) -> Result<(), InfraError> {
        self.tz()?;
        url::Url::parse(&self.ai.base_url).map_err(|error| {
            InfraError::InvalidConfig(format!(
                "invalid ai.baseUrl '{}' in {}: {error}",
                self.ai.base_url,
                path.display()
            ))
        })?;
        for (field, value) in [
            ("storageKey", &self.storage_key),
            ("credentialKey", &self.credential_key),
            ("ai.model", &self.ai.model),
        ] {
            if value.trim().is_empty() {
                return Err(InfraError::InvalidConfig(format!(
                    "{field} must not be empty in {}",
                    path.display()
                )));
            }
        }
        if !(0.0..=2.0).contains(&self.ai.temperature) {
            return Err(InfraError::InvalidConfig(format!(
                "ai.temperature must be between 0 and 2 in {}",
                path.display()
            )));
        }
        Ok(())
    }
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    let path = config_dir.join(APP_JSON);
    if !path.exists() {
        let formatted = serde_json::to_string_pretty(&AppConfig::default())?;
        fs::write(path, format!("{formatted}\n"))?;
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != SUPPORTED_SCHEMA {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn load_app_config(config_dir: &Path) -> Result<AppConfig, InfraError> {
    let path = config_dir.join(APP_JSON);
    let value = read_config(&path)?;
    let config: AppConfig = serde_json::from_value(value).map_err(|error| {
        InfraError::InvalidConfig(format!("invalid {}: {error}", path.display()))
    })?;
    config.validate(&path)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

    struct TempConfigDir {
        path: PathBuf,
    }

    impl TempConfigDir {
        fn new() -> Self {
            let sequence = NEXT_DIR.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "focusmate-config-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&path).expect("create temp config dir");
            Self { path }
        }

        fn write(&self, body: &str) {
            fs::write(self.path.join(APP_JSON), body).expect("write app.json");
        }
    }

    impl Drop for TempConfigDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn default_config_is_written_and_loads() {
        let dir = TempConfigDir::new();
        ensure_default_configs(&dir.path).expect("write defaults");
        let config = load_app_config(&dir.path).expect("load defaults");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.tz().expect("tz"), chrono_tz::UTC);
    }

    #[test]
    fn existing_config_is_not_overwritten() {
        let dir = TempConfigDir::new();
        dir.write(r#"{"schema":1,"timezone":"Asia/Tokyo"}"#);
        ensure_default_configs(&dir.path).expect("keep existing");
        let config = load_app_config(&dir.path).expect("load");
        assert_eq!(config.timezone, "Asia/Tokyo");
        assert_eq!(config.storage_key, "focusMateData");
        assert_eq!(config.ai.summary_max_tokens, 800);
    }

    #[test]
    fn unsupported_schema_is_rejected() {
        let dir = TempConfigDir::new();
        dir.write(r#"{"schema":2}"#);
        assert!(matches!(
            load_app_config(&dir.path),
            Err(InfraError::InvalidConfig(message)) if message.contains("unsupported schema")
        ));
    }

    #[test]
    fn invalid_timezone_and_base_url_are_rejected() {
        let dir = TempConfigDir::new();
        dir.write(r#"{"schema":1,"timezone":"Mars/Olympus"}"#);
        assert!(matches!(
            load_app_config(&dir.path),
            Err(InfraError::InvalidConfig(_))
        ));

        dir.write(r#"{"schema":1,"ai":{"baseUrl":"not a url"}}"#);
        assert!(matches!(
            load_app_config(&dir.path),
            Err(InfraError::InvalidConfig(message)) if message.contains("baseUrl")
        ));
    }

    #[test]
    fn keyring_backend_parses() {
        let dir = TempConfigDir::new();
        dir.write(r#"{"schema":1,"credentialBackend":"keyring"}"#);
        let config = load_app_config(&dir.path).expect("load");
        assert_eq!(config.credential_backend, CredentialBackend::Keyring);
    }
}
