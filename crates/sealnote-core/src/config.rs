use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{CoreError, CoreResult};

/// Environment variable overriding `[crypto].encryption_key`
pub const ENCRYPTION_KEY_ENV: &str = "SEALNOTE_ENCRYPTION_KEY";
/// Environment variable overriding `[auth].token_secret`
pub const TOKEN_SECRET_ENV: &str = "SEALNOTE_TOKEN_SECRET";

/// Top-level daemon configuration (loaded from sealnote.toml)
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SealnoteConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub crypto: CryptoConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP listen address for the HTTP API (default: 127.0.0.1:5000)
    pub listen: String,
    /// Log level (default: info)
    pub log_level: String,
    /// Log format: "json" or "text"
    pub log_format: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file path
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for bearer tokens (required; env: SEALNOTE_TOKEN_SECRET)
    pub token_secret: Option<SecretString>,
    /// Argon2id memory cost in KiB (default: 19456 = 19 MiB)
    pub argon2_mem_cost_kib: u32,
    /// Argon2id time cost (iterations, default: 2)
    pub argon2_time_cost: u32,
    /// Argon2id parallelism (default: 1)
    pub argon2_parallelism: u32,
}

/// At-rest note body encryption configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// 256-bit note encryption key as 64 hex chars
    /// (required; env: SEALNOTE_ENCRYPTION_KEY)
    pub encryption_key: Option<SecretString>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:5000".into(),
            log_level: "info".into(),
            log_format: "text".into(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("sealnote.db"),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            argon2_mem_cost_kib: 19456,
            argon2_time_cost: 2,
            argon2_parallelism: 1,
        }
    }
}

impl SealnoteConfig {
    /// Resolve the 256-bit note encryption key from config or environment.
    ///
    /// The daemon refuses to start without an explicit key: a generated
    /// ephemeral key would leave every stored note unreadable after restart.
    pub fn encryption_key(&self) -> CoreResult<[u8; 32]> {
        let hex_key = resolve_secret(&self.crypto.encryption_key, ENCRYPTION_KEY_ENV)
            .ok_or_else(|| {
                CoreError::Config(format!(
                    "encryption key not configured: set [crypto].encryption_key or {ENCRYPTION_KEY_ENV}"
                ))
            })?;

        let bytes = hex::decode(hex_key.trim())
            .map_err(|e| CoreError::Config(format!("encryption key is not valid hex: {e}")))?;
        bytes.try_into().map_err(|_| {
            CoreError::Config("encryption key must be 64 hex chars (256-bit)".into())
        })
    }

    /// Resolve the token-signing secret from config or environment.
    pub fn token_secret(&self) -> CoreResult<Vec<u8>> {
        let secret = resolve_secret(&self.auth.token_secret, TOKEN_SECRET_ENV).ok_or_else(|| {
            CoreError::Config(format!(
                "token secret not configured: set [auth].token_secret or {TOKEN_SECRET_ENV}"
            ))
        })?;
        if secret.is_empty() {
            return Err(CoreError::Config("token secret must not be empty".into()));
        }
        Ok(secret.into_bytes())
    }
}

fn resolve_secret(configured: &Option<SecretString>, env_var: &str) -> Option<String> {
    match std::env::var(env_var) {
        Ok(v) if !v.is_empty() => Some(v),
        _ => configured.as_ref().map(|s| s.expose_secret().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[server]
listen = "0.0.0.0:8080"
log_level = "debug"
log_format = "json"

[database]
path = "/var/lib/sealnote/notes.db"

[auth]
token_secret = "super-secret"
argon2_mem_cost_kib = 65536
argon2_time_cost = 3
argon2_parallelism = 4

[crypto]
encryption_key = "000102030405060708090a0b0c0d0e0f000102030405060708090a0b0c0d0e0f"
"#;
        let config: SealnoteConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.database.path, PathBuf::from("/var/lib/sealnote/notes.db"));
        assert_eq!(config.auth.argon2_mem_cost_kib, 65536);
        assert_eq!(config.auth.argon2_parallelism, 4);
        assert_eq!(config.token_secret().unwrap(), b"super-secret");
        let key = config.encryption_key().unwrap();
        assert_eq!(key[0], 0x00);
        assert_eq!(key[15], 0x0f);
    }

    #[test]
    fn test_parse_defaults() {
        let config: SealnoteConfig = toml::from_str("").unwrap();

        assert_eq!(config.server.listen, "127.0.0.1:5000");
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.server.log_format, "text");
        assert_eq!(config.database.path, PathBuf::from("sealnote.db"));
        assert_eq!(config.auth.argon2_mem_cost_kib, 19456);
        assert_eq!(config.auth.argon2_time_cost, 2);
    }

    #[test]
    fn test_missing_encryption_key_is_an_error() {
        let config: SealnoteConfig = toml::from_str("").unwrap();
        assert!(config.encryption_key().is_err());
        assert!(config.token_secret().is_err());
    }

    #[test]
    fn test_malformed_encryption_key() {
        let short: SealnoteConfig = toml::from_str(
            r#"
[crypto]
encryption_key = "abcd1234"
"#,
        )
        .unwrap();
        assert!(short.encryption_key().is_err());

        let not_hex: SealnoteConfig = toml::from_str(
            r#"
[crypto]
encryption_key = "zz0102030405060708090a0b0c0d0e0f000102030405060708090a0b0c0d0e"
"#,
        )
        .unwrap();
        assert!(not_hex.encryption_key().is_err());
    }
}
