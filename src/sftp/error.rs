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

use std::io;
use thiserror::Error;

/// Error type for the SSH/SFTP transport layer
#[derive(Debug, Error)]
pub enum SftpError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// SSH error from russh
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// SFTP error from russh-sftp
    #[error("SFTP error: {0}")]
    Sftp(#[from] russh_sftp::client::error::Error),

    /// Invalid or unreadable key material
    #[error("invalid key: {0}")]
    Key(#[from] russh_keys::Error),

    /// Authentication failed
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Host key verification failed
    #[error("host key verification failed: {0}")]
    HostKeyVerification(String),

    /// Channel or subsystem error
    #[error("channel error: {0}")]
    Channel(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl SftpError {
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn host_key_verification(msg: impl Into<String>) -> Self {
        Self::HostKeyVerification(msg.into())
    }

    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Result type for SFTP operations
pub type SftpResult<T> = std::result::Result<T, SftpError>;
