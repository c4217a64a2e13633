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

//! Error type surfaced by the fuzzy file loader.

use std::string::FromUtf8Error;
use thiserror::Error;

use crate::sftp::SftpError;

/// Error returned by [`FileLoader`](crate::loader::FileLoader) operations.
///
/// This is deliberately a single opaque type: a missing file, a transport
/// failure and a decoding failure all surface the same way. The underlying
/// cause is retained as `source` for logging and diagnostics, but there is
/// no variant for callers to match on.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct FileLoadError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl FileLoadError {
    pub(crate) fn no_match(prefix: &str) -> Self {
        Self {
            message: format!("no remote file name starts with '{}'", prefix.trim()),
            source: None,
        }
    }

    pub(crate) fn load_failed(prefix: &str, source: SftpError) -> Self {
        Self {
            message: format!("'{}' load failed", prefix.trim()),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn decoding(file_name: &str, source: FromUtf8Error) -> Self {
        Self {
            message: format!("'{file_name}' is not valid UTF-8"),
            source: Some(Box::new(source)),
        }
    }

    /// Human-readable description of the failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}
