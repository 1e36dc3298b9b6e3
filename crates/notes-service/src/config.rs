//! Configuration loading and management

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Minimum signing key length in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Main configuration for the notes service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Session token configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Password hashing work factor
    #[serde(default)]
    pub password: PasswordConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session token lifetime in seconds (default: 1 hour)
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: u64,

    /// Token signing secret (32+ bytes, hex-encoded)
    /// If not set, a random key is generated at startup (sessions won't survive restarts)
    #[serde(default)]
    pub signing_secret: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_lifetime_secs: default_token_lifetime(),
            signing_secret: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    /// Argon2 memory cost in KiB
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,

    /// Argon2 iteration count
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Argon2 lanes
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

fn default_token_lifetime() -> u64 {
    3600 // 1 hour
}

// OWASP baseline for Argon2id
fn default_memory_kib() -> u32 {
    19 * 1024
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

impl Config {
    /// Load configuration from the data directory
    pub fn load(data_path: impl AsRef<Path>) -> Result<Self> {
        let data_path = data_path.as_ref();
        let config_file = data_path.join("config.json");

        if config_file.exists() {
            let content = std::fs::read_to_string(&config_file)
                .with_context(|| format!("Failed to read config file: {:?}", config_file))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| "Failed to parse config.json")?;
            config.token_lifetime()?;
            tracing::info!("Loaded configuration from {:?}", config_file);
            Ok(config)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_file
            );
            let config = Config::default();

            std::fs::create_dir_all(data_path)
                .with_context(|| format!("Failed to create data directory: {:?}", data_path))?;

            // Write default config for reference
            let content = serde_json::to_string_pretty(&config)?;
            std::fs::write(&config_file, content)
                .with_context(|| format!("Failed to write default config: {:?}", config_file))?;
            tracing::info!("Created default config at {:?}", config_file);

            Ok(config)
        }
    }

    /// Resolve the token signing key.
    ///
    /// `override_hex` (from the command line / environment) wins over the
    /// config file. With neither, a random key is generated.
    pub fn signing_key(&self, override_hex: Option<&str>) -> Result<Vec<u8>> {
        match override_hex.or(self.session.signing_secret.as_deref()) {
            Some(secret) => decode_secret(secret),
            None => {
                tracing::warn!(
                    "No signing secret configured; generated a random key (sessions won't survive restarts)"
                );
                use rand::Rng;
                let mut key = vec![0u8; MIN_SECRET_LEN];
                rand::rng().fill(&mut key[..]);
                Ok(key)
            }
        }
    }

    pub fn token_lifetime(&self) -> Result<chrono::Duration> {
        let secs = self.session.token_lifetime_secs;
        i64::try_from(secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .with_context(|| format!("token_lifetime_secs is out of range: {}", secs))
    }
}

fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    let key = hex::decode(secret.trim()).context("Signing secret must be hex-encoded")?;
    if key.len() < MIN_SECRET_LEN {
        bail!(
            "Signing secret must be at least {} bytes, got {}",
            MIN_SECRET_LEN,
            key.len()
        );
    }
    Ok(key)
}
