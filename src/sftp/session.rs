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

use async_trait::async_trait;
use russh::client::Handler;
use russh_keys::key::PublicKey;
use russh_sftp::client::SftpSession;
use std::sync::Arc;
use std::time::Duration;

use super::auth::AuthMethod;
use super::error::{SftpError, SftpResult};

/// Server host key verification method
#[derive(Debug, Clone)]
pub enum ServerCheckMethod {
    NoCheck,
    /// base64 encoded key without the type prefix or hostname suffix
    PublicKey(String),
    PublicKeyFile(String),
    DefaultKnownHostsFile,
    KnownHostsFile(String),
}

impl ServerCheckMethod {
    pub fn with_public_key(key: &str) -> Self {
        Self::PublicKey(key.to_string())
    }

    pub fn with_public_key_file(key_file_name: &str) -> Self {
        Self::PublicKeyFile(key_file_name.to_string())
    }

    pub fn with_known_hosts_file(known_hosts_file: &str) -> Self {
        Self::KnownHostsFile(known_hosts_file.to_string())
    }
}

/// SSH client handler performing host key verification
#[derive(Debug, Clone)]
pub struct ClientHandler {
    host: String,
    port: u16,
    server_check: ServerCheckMethod,
}

impl ClientHandler {
    fn new(host: String, port: u16, server_check: ServerCheckMethod) -> Self {
        Self {
            host,
            port,
            server_check,
        }
    }
}

#[async_trait]
impl Handler for ClientHandler {
    type Error = SftpError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        match &self.server_check {
            ServerCheckMethod::NoCheck => {
                tracing::debug!("Host key checking disabled for {}:{}", self.host, self.port);
                Ok(true)
            }
            ServerCheckMethod::PublicKey(key) => {
                let pk = russh_keys::parse_public_key_base64(key).map_err(|_| {
                    SftpError::host_key_verification(format!(
                        "invalid configured public key for {}:{}",
                        self.host, self.port
                    ))
                })?;
                Ok(pk == *server_public_key)
            }
            ServerCheckMethod::PublicKeyFile(key_file_name) => {
                let pk = russh_keys::load_public_key(key_file_name).map_err(|_| {
                    SftpError::host_key_verification(format!(
                        "failed to load public key file '{key_file_name}'"
                    ))
                })?;
                Ok(pk == *server_public_key)
            }
            ServerCheckMethod::KnownHostsFile(known_hosts_path) => {
                russh_keys::check_known_hosts_path(
                    &self.host,
                    self.port,
                    server_public_key,
                    known_hosts_path,
                )
                .map_err(|e| {
                    SftpError::host_key_verification(format!(
                        "known_hosts check failed for {}:{}: {}",
                        self.host, self.port, e
                    ))
                })
            }
            ServerCheckMethod::DefaultKnownHostsFile => {
                russh_keys::check_known_hosts(&self.host, self.port, server_public_key).map_err(
                    |e| {
                        SftpError::host_key_verification(format!(
                            "known_hosts check failed for {}:{}: {}",
                            self.host, self.port, e
                        ))
                    },
                )
            }
        }
    }
}

/// An authenticated SSH connection with an SFTP subsystem channel.
pub struct SshSession {
    handle: russh::client::Handle<ClientHandler>,
    sftp_channel: Option<SftpSession>,
    host: String,
    port: u16,
}

impl std::fmt::Debug for SshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshSession")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("sftp_initialized", &self.sftp_channel.is_some())
            .finish_non_exhaustive()
    }
}

impl SshSession {
    /// Connect and authenticate, leaving the SFTP channel uninitialized.
    pub async fn connect(
        host: &str,
        port: u16,
        username: &str,
        auth: &AuthMethod,
        server_check: ServerCheckMethod,
    ) -> SftpResult<Self> {
        let config = russh::client::Config {
            inactivity_timeout: Some(Duration::from_secs(300)),
            ..Default::default()
        };

        let handler = ClientHandler::new(host.to_string(), port, server_check);

        tracing::debug!("Connecting to {}:{}", host, port);

        let mut handle = russh::client::connect(Arc::new(config), (host, port), handler).await?;

        super::auth::authenticate(&mut handle, username, auth).await?;

        Ok(Self {
            handle,
            sftp_channel: None,
            host: host.to_string(),
            port,
        })
    }

    /// Initialize the SFTP channel after authentication.
    pub async fn init_sftp(&mut self) -> SftpResult<()> {
        if self.sftp_channel.is_some() {
            return Ok(());
        }

        tracing::debug!("Initializing SFTP channel");

        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| SftpError::channel(format!("Failed to open SSH channel: {e}")))?;

        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| SftpError::channel(format!("Failed to request SFTP subsystem: {e}")))?;

        let sftp_session = SftpSession::new(channel.into_stream())
            .await
            .map_err(SftpError::Sftp)?;

        self.sftp_channel = Some(sftp_session);
        tracing::debug!("SFTP channel initialized successfully");

        Ok(())
    }

    /// Get the SFTP session, failing if [`init_sftp`](Self::init_sftp) has not run.
    pub fn sftp(&mut self) -> SftpResult<&mut SftpSession> {
        self.sftp_channel
            .as_mut()
            .ok_or_else(|| SftpError::channel("SFTP channel not initialized. Call init_sftp() first."))
    }

    /// Whether the underlying SSH connection has been closed.
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        // The connection closes when the handle is dropped.
        tracing::debug!("SSH session to {}:{} being dropped", self.host, self.port);
    }
}
