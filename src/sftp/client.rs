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
use russh_sftp::protocol::OpenFlags;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::SftpResult;
use super::session::SshSession;

/// Owned async byte stream over a remote file.
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// SFTP client capability used by the loader: directory listing and
/// file retrieval. Implemented for real connections by [`SessionClient`].
#[async_trait]
pub trait SftpClient: Send {
    /// List the file names in a remote directory.
    async fn list_dir(&mut self, path: &str) -> SftpResult<Vec<String>>;

    /// Open a remote file for reading and return an owned byte stream.
    async fn open_read(&mut self, file_name: &str) -> SftpResult<ByteStream>;

    /// Read a remote file fully into memory.
    async fn read_to_end(&mut self, file_name: &str) -> SftpResult<Vec<u8>>;
}

/// [`SftpClient`] backed by an authenticated [`SshSession`].
#[derive(Debug)]
pub struct SessionClient {
    session: SshSession,
}

impl SessionClient {
    pub fn new(session: SshSession) -> Self {
        Self { session }
    }

    /// Whether the underlying SSH connection has been closed.
    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }
}

#[async_trait]
impl SftpClient for SessionClient {
    async fn list_dir(&mut self, path: &str) -> SftpResult<Vec<String>> {
        tracing::debug!("Listing remote directory: {}", path);

        let sftp = self.session.sftp()?;
        let entries = sftp.read_dir(path).await?;

        Ok(entries.map(|entry| entry.file_name()).collect())
    }

    async fn open_read(&mut self, file_name: &str) -> SftpResult<ByteStream> {
        tracing::debug!("Opening remote file for reading: {}", file_name);

        let sftp = self.session.sftp()?;
        let remote_file = sftp.open_with_flags(file_name, OpenFlags::READ).await?;

        Ok(Box::new(remote_file))
    }

    async fn read_to_end(&mut self, file_name: &str) -> SftpResult<Vec<u8>> {
        tracing::debug!("Reading remote file: {}", file_name);

        let sftp = self.session.sftp()?;
        let mut remote_file = sftp.open_with_flags(file_name, OpenFlags::READ).await?;

        let mut contents = Vec::new();
        remote_file.read_to_end(&mut contents).await?;

        Ok(contents)
    }
}
