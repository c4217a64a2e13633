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

//! SFTP transport layer based on russh and russh-sftp
//!
//! This module provides the collaborators the fuzzy loader is built on:
//! - [`SftpClient`]: directory listing and file retrieval over one connection
//! - [`ConnectionManager`]: acquire/release source of such clients
//! - [`PooledConnectionManager`]: single-endpoint idle-connection pool

pub mod auth;
pub mod client;
pub mod error;
pub mod manager;
pub mod session;

pub use auth::AuthMethod;
pub use client::{ByteStream, SessionClient, SftpClient};
pub use error::{SftpError, SftpResult};
pub use manager::{ConnectionManager, Endpoint, PooledConnectionManager};
pub use session::{ServerCheckMethod, SshSession};
