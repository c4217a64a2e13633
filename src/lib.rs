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

//! Fuzzy filename-prefix file loading over pooled SFTP connections.
//!
//! Remote batch exports are commonly date-suffixed (`hr_export_20230102.csv`)
//! while the consumer only knows the stable prefix. This crate resolves such
//! a prefix against a remote directory listing — case-insensitive by default,
//! newest name on ties — and returns the matched file's content as a byte
//! stream or UTF-8 text, acquiring and releasing a pooled SFTP connection
//! around each call.

pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod sftp;

pub use config::Config;
pub use error::FileLoadError;
pub use loader::{FileLoader, FuzzyMatchLoader, LoadContent, LoaderOptions};
pub use sftp::{
    AuthMethod, ByteStream, ConnectionManager, Endpoint, PooledConnectionManager,
    ServerCheckMethod, SftpClient, SftpError, SftpResult,
};
