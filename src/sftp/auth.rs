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

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::{SftpError, SftpResult};
use super::session::ClientHandler;

/// Authentication method for SSH connections
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Authenticate with a password
    Password(String),
    /// Authenticate with in-memory private key material
    PrivateKey {
        /// entire contents of a private key file
        key_data: String,
        key_pass: Option<String>,
    },
    /// Authenticate with a private key file on disk
    PrivateKeyFile {
        key_file_path: PathBuf,
        key_pass: Option<String>,
    },
    /// Authenticate using the SSH agent (not supported on Windows)
    #[cfg(not(target_os = "windows"))]
    Agent,
}

impl AuthMethod {
    pub fn with_password(password: &str) -> Self {
        Self::Password(password.to_string())
    }

    pub fn with_key(key: &str, passphrase: Option<&str>) -> Self {
        Self::PrivateKey {
            key_data: key.to_string(),
            key_pass: passphrase.map(str::to_string),
        }
    }

    pub fn with_key_file<T: AsRef<Path>>(key_file_path: T, passphrase: Option<&str>) -> Self {
        Self::PrivateKeyFile {
            key_file_path: key_file_path.as_ref().to_path_buf(),
            key_pass: passphrase.map(str::to_string),
        }
    }

    #[cfg(not(target_os = "windows"))]
    pub fn with_agent() -> Self {
        Self::Agent
    }
}

/// Authenticate an opened SSH session with the given method.
pub(crate) async fn authenticate(
    handle: &mut russh::client::Handle<ClientHandler>,
    username: &str,
    auth: &AuthMethod,
) -> SftpResult<()> {
    match auth {
        AuthMethod::Password(password) => {
            tracing::debug!("Authenticating with password");
            let is_authenticated = handle
                .authenticate_password(username, password.as_str())
                .await?;
            if !is_authenticated {
                return Err(SftpError::authentication("password was rejected by the server"));
            }
        }
        AuthMethod::PrivateKey { key_data, key_pass } => {
            tracing::debug!("Authenticating with in-memory private key");
            let key = russh_keys::decode_secret_key(key_data.as_str(), key_pass.as_deref())?;
            let is_authenticated = handle
                .authenticate_publickey(username, Arc::new(key))
                .await?;
            if !is_authenticated {
                return Err(SftpError::authentication("private key was rejected by the server"));
            }
        }
        AuthMethod::PrivateKeyFile {
            key_file_path,
            key_pass,
        } => {
            tracing::debug!("Authenticating with private key file: {:?}", key_file_path);
            let key = russh_keys::load_secret_key(key_file_path, key_pass.as_deref())?;
            let is_authenticated = handle
                .authenticate_publickey(username, Arc::new(key))
                .await?;
            if !is_authenticated {
                return Err(SftpError::authentication("private key was rejected by the server"));
            }
        }
        #[cfg(not(target_os = "windows"))]
        AuthMethod::Agent => {
            tracing::debug!("Authenticating with SSH agent");

            if !is_agent_available() {
                return Err(SftpError::authentication(
                    "SSH agent not available: SSH_AUTH_SOCK is not set",
                ));
            }

            let mut agent = russh_keys::agent::client::AgentClient::connect_env()
                .await
                .map_err(|e| {
                    SftpError::authentication(format!("failed to connect to SSH agent: {e}"))
                })?;

            let identities = agent.request_identities().await?;
            if identities.is_empty() {
                return Err(SftpError::authentication("SSH agent holds no identities"));
            }

            let mut authenticated = false;
            for key in identities {
                // The agent signs the authentication request for us.
                let (returned_agent, result) =
                    handle.authenticate_future(username, key, agent).await;
                agent = returned_agent;

                if matches!(result, Ok(true)) {
                    authenticated = true;
                    break;
                }
            }

            if !authenticated {
                return Err(SftpError::authentication(
                    "no SSH agent identity was accepted by the server",
                ));
            }
        }
    }
    Ok(())
}

/// Check if an SSH agent is reachable in the current environment.
pub fn is_agent_available() -> bool {
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("SSH_AUTH_SOCK").is_ok()
    }
    #[cfg(target_os = "windows")]
    {
        false
    }
}
