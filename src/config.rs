use serde::{Deserialize, Serialize};
use tracing::{info, error};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated
    pub cors_origins: Option<String>,

    /// HS256 secret used to validate caller tokens
    pub auth_jwt_secret: Option<String>,

    /// Permission a caller must hold to browse or edit documents
    #[serde(default = "default_manage_permission")]
    pub manage_permission: String,

    /// Which document backend to use (firestore, memory)
    #[serde(default = "default_store_backend")]
    pub store_backend: String,

    /// Service account key JSON
    pub firebase_key: Option<String>,

    /// Path to a service account key JSON file, used when `firebase_key` is unset
    pub firebase_key_file: Option<String>,

    /// Overrides the project id found in the service account key
    pub firestore_project_id: Option<String>,

    #[serde(default = "default_firestore_database")]
    pub firestore_database: String,

    /// host:port of a Firestore emulator; disables authentication
    pub firestore_emulator_host: Option<String>,

    #[serde(default = "default_firestore_timeout_secs")]
    pub firestore_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        // Load from environment variables using envy
        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("✅ Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }

    /// The configured CORS origins, split and trimmed
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Resolve the service account key JSON, reading `firebase_key_file` if needed
    pub fn service_account_json(&self) -> Result<Option<String>, ConfigError> {
        if let Some(key) = self.firebase_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(Some(key.clone()));
        }
        match &self.firebase_key_file {
            Some(path) => std::fs::read_to_string(path)
                .map(Some)
                .map_err(|e| ConfigError::KeyFileError(path.clone(), e)),
            None => Ok(None),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            cors_origins: None,
            auth_jwt_secret: None,
            manage_permission: default_manage_permission(),
            store_backend: default_store_backend(),
            firebase_key: None,
            firebase_key_file: None,
            firestore_project_id: None,
            firestore_database: default_firestore_database(),
            firestore_emulator_host: None,
            firestore_timeout_secs: default_firestore_timeout_secs(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvError(envy::Error),

    #[error("Failed to read service account key file '{0}': {1}")]
    KeyFileError(String, std::io::Error),
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_manage_permission() -> String {
    "administer firestore".to_string()
}

fn default_store_backend() -> String {
    "firestore".to_string()
}

fn default_firestore_database() -> String {
    "(default)".to_string()
}

fn default_firestore_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = Config {
            cors_origins: Some(" https://cms.example.org, ,http://localhost:8080 ".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.cors_origin_list(),
            vec!["https://cms.example.org".to_string(), "http://localhost:8080".to_string()]
        );
        assert!(Config::default().cors_origin_list().is_empty());
    }

    #[test]
    fn inline_key_wins_over_key_file() {
        let config = Config {
            firebase_key: Some("{\"project_id\":\"demo\"}".to_string()),
            firebase_key_file: Some("/does/not/exist.json".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.service_account_json().unwrap().as_deref(),
            Some("{\"project_id\":\"demo\"}")
        );
    }

    #[test]
    fn missing_key_file_is_an_error() {
        let config = Config {
            firebase_key_file: Some("/does/not/exist.json".to_string()),
            ..Config::default()
        };
        assert!(matches!(config.service_account_json(), Err(ConfigError::KeyFileError(_, _))));
        assert!(Config::default().service_account_json().unwrap().is_none());
    }
}
