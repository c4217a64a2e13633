// Copyright 2025 Lablup Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::loader::LoaderOptions;
use crate::sftp::{
    AuthMethod, Endpoint, PooledConnectionManager, ServerCheckMethod, SftpError, SftpResult,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub loader: LoaderConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub username: String,

    /// Password authentication; ignored when `key_path` is set.
    #[serde(default)]
    pub password: Option<String>,

    /// Private key file; takes precedence over `password`.
    #[serde(default)]
    pub key_path: Option<PathBuf>,

    #[serde(default)]
    pub key_passphrase: Option<String>,

    /// Authenticate via the SSH agent; takes precedence over `key_path`
    /// and `password`. Not supported on Windows.
    #[serde(default)]
    pub use_agent: bool,

    /// Verify the server host key against known_hosts (default true).
    #[serde(default = "default_true")]
    pub check_host_key: bool,

    /// Explicit known_hosts file; defaults to ~/.ssh/known_hosts.
    #[serde(default)]
    pub known_hosts_file: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,

    #[serde(default = "default_max_idle")]
    pub max_idle: usize,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: default_idle_ttl_secs(),
            max_idle: default_max_idle(),
            enabled: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_true")]
    pub case_insensitive_match: bool,

    #[serde(default = "default_remote_dir")]
    pub remote_dir: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            case_insensitive_match: true,
            remote_dir: default_remote_dir(),
        }
    }
}

fn default_port() -> u16 {
    22
}

fn default_true() -> bool {
    true
}

fn default_idle_ttl_secs() -> u64 {
    300
}

fn default_max_idle() -> usize {
    5
}

fn default_remote_dir() -> String {
    ".".to_string()
}

impl Config {
    /// Load configuration from a YAML file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read configuration file at {path:?}"))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML configuration file at {path:?}"))?;

        Ok(config)
    }

    /// Resolution options for the fuzzy loader.
    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            case_insensitive_match: self.loader.case_insensitive_match,
            remote_dir: self.loader.remote_dir.clone(),
        }
    }

    /// Build the pooled connection manager described by this config.
    pub fn connection_manager(&self) -> SftpResult<PooledConnectionManager> {
        let endpoint = Endpoint {
            host: self.connection.host.clone(),
            port: self.connection.port,
            username: self.connection.username.clone(),
            auth: self.connection.auth_method()?,
            server_check: self.connection.server_check(),
        };

        Ok(PooledConnectionManager::new(
            endpoint,
            Duration::from_secs(self.pool.idle_ttl_secs),
            self.pool.max_idle,
            self.pool.enabled,
        ))
    }
}

impl ConnectionConfig {
    /// Pick the authentication method from the configured credentials.
    pub fn auth_method(&self) -> SftpResult<AuthMethod> {
        if self.use_agent {
            #[cfg(not(target_os = "windows"))]
            return Ok(AuthMethod::with_agent());

            #[cfg(target_os = "windows")]
            return Err(SftpError::authentication(
                "SSH agent authentication is not supported on Windows",
            ));
        }

        if let Some(key_path) = &self.key_path {
            return Ok(AuthMethod::with_key_file(
                key_path,
                self.key_passphrase.as_deref(),
            ));
        }

        if let Some(password) = &self.password {
            return Ok(AuthMethod::with_password(password));
        }

        Err(SftpError::authentication(
            "no authentication method configured: set 'use_agent', 'key_path' or 'password'",
        ))
    }

    /// Host key verification method from the configured policy.
    pub fn server_check(&self) -> ServerCheckMethod {
        if !self.check_host_key {
            return ServerCheckMethod::NoCheck;
        }

        match &self.known_hosts_file {
            Some(path) => ServerCheckMethod::KnownHostsFile(path.display().to_string()),
            None => ServerCheckMethod::DefaultKnownHostsFile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_defaults() {
        let yaml = r#"
connection:
  host: sftp.example.com
  username: sync
  password: secret
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.connection.port, 22);
        assert!(config.connection.check_host_key);
        assert_eq!(config.pool.idle_ttl_secs, 300);
        assert_eq!(config.pool.max_idle, 5);
        assert!(config.pool.enabled);
        assert!(config.loader.case_insensitive_match);
        assert_eq!(config.loader.remote_dir, ".");
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
connection:
  host: sftp.example.com
  port: 2222
  username: sync
  key_path: /home/sync/.ssh/id_ed25519
  check_host_key: false
pool:
  idle_ttl_secs: 60
  max_idle: 2
  enabled: false
loader:
  case_insensitive_match: false
  remote_dir: /exports/hr
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.connection.port, 2222);
        assert!(matches!(
            config.connection.auth_method().unwrap(),
            AuthMethod::PrivateKeyFile { .. }
        ));
        assert!(matches!(
            config.connection.server_check(),
            ServerCheckMethod::NoCheck
        ));
        assert!(!config.pool.enabled);
        assert_eq!(config.loader.remote_dir, "/exports/hr");
        assert!(!config.loader_options().case_insensitive_match);
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_use_agent_takes_precedence() {
        let yaml = r#"
connection:
  host: sftp.example.com
  username: sync
  password: secret
  key_path: /home/sync/.ssh/id_rsa
  use_agent: true
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert!(matches!(
            config.connection.auth_method().unwrap(),
            AuthMethod::Agent
        ));
    }

    #[test]
    fn test_key_path_takes_precedence_over_password() {
        let yaml = r#"
connection:
  host: sftp.example.com
  username: sync
  password: secret
  key_path: /home/sync/.ssh/id_rsa
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert!(matches!(
            config.connection.auth_method().unwrap(),
            AuthMethod::PrivateKeyFile { .. }
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "connection:\n  host: sftp.example.com\n  username: sync\n  password: secret\n",
        )
        .unwrap();

        let config = Config::load(&path).await.unwrap();
        assert_eq!(config.connection.host, "sftp.example.com");
    }

    #[tokio::test]
    async fn test_load_missing_file_has_context() {
        let err = Config::load(Path::new("/nonexistent/config.yaml"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read configuration file"));
    }

    #[test]
    fn test_missing_credentials_is_an_error() {
        let yaml = r#"
connection:
  host: sftp.example.com
  username: sync
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert!(config.connection.auth_method().is_err());
    }
}
