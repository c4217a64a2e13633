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

//! Fuzzy filename-prefix file loader.
//!
//! [`FuzzyMatchLoader`] resolves an ambiguous filename prefix to exactly one
//! concrete file in a remote directory and returns its content, either as an
//! async byte stream or as UTF-8 text. When several files share the prefix,
//! the lexicographically greatest name wins, which for date-suffixed exports
//! (`data_20230101`, `data_20230102`, ...) selects the most recent one.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::FileLoadError;
use crate::sftp::{ByteStream, ConnectionManager, SftpClient};

/// Content loaded from the remote server together with the resolved file name.
pub struct LoadContent<T> {
    content: T,
    file_name: String,
}

impl<T> std::fmt::Debug for LoadContent<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadContent")
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

impl<T> LoadContent<T> {
    pub fn new(content: T, file_name: impl Into<String>) -> Self {
        Self {
            content,
            file_name: file_name.into(),
        }
    }

    /// The loaded payload.
    pub fn content(&self) -> &T {
        &self.content
    }

    /// The concrete remote file name the prefix resolved to.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Consume into (payload, resolved file name).
    pub fn into_parts(self) -> (T, String) {
        (self.content, self.file_name)
    }
}

/// Loads a remote file identified by a fuzzy name.
#[async_trait]
pub trait FileLoader {
    /// Resolve `prefix` and return a byte stream over the matched file.
    async fn load_file_as_stream(
        &self,
        prefix: &str,
    ) -> Result<LoadContent<ByteStream>, FileLoadError>;

    /// Resolve `prefix`, buffer the matched file and decode it as UTF-8.
    async fn load_file_as_text(&self, prefix: &str) -> Result<LoadContent<String>, FileLoadError>;
}

/// Options controlling prefix resolution.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Compare file names case-insensitively (default true).
    pub case_insensitive_match: bool,
    /// Remote directory to list (default the connection's working directory).
    pub remote_dir: String,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            case_insensitive_match: true,
            remote_dir: ".".to_string(),
        }
    }
}

/// File loader that fuzzy-matches a filename prefix against a remote
/// directory listing, over connections supplied by a [`ConnectionManager`].
pub struct FuzzyMatchLoader<M: ConnectionManager> {
    manager: Arc<M>,
    options: LoaderOptions,
}

impl<M: ConnectionManager> FuzzyMatchLoader<M> {
    pub fn new(manager: Arc<M>) -> Self {
        Self::with_options(manager, LoaderOptions::default())
    }

    pub fn with_options(manager: Arc<M>, options: LoaderOptions) -> Self {
        Self { manager, options }
    }

    /// Resolve the prefix to one concrete remote file name, or `None`.
    ///
    /// A listing failure is logged and treated exactly like an empty
    /// listing, so the caller cannot tell "server error" from "no match".
    async fn resolve_file_name(&self, client: &mut M::Client, prefix: &str) -> Option<String> {
        let entries = match client.list_dir(&self.options.remote_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to list remote directory '{}': {}", self.options.remote_dir, e);
                Vec::new()
            }
        };

        let candidates = select_candidates(entries, prefix, self.options.case_insensitive_match);

        pick_nearest(candidates)
    }

    async fn open_stream(
        &self,
        client: &mut M::Client,
        prefix: &str,
    ) -> Result<LoadContent<ByteStream>, FileLoadError> {
        let file_name = self
            .resolve_file_name(client, prefix)
            .await
            .ok_or_else(|| FileLoadError::no_match(prefix))?;

        debug!("Resolved prefix '{}' to remote file '{}'", prefix, file_name);

        let stream = client.open_read(&file_name).await.map_err(|e| {
            error!("Failed to load file '{}' from sftp server: {}", file_name, e);
            FileLoadError::load_failed(prefix, e)
        })?;

        Ok(LoadContent::new(stream, file_name))
    }

    async fn read_text(
        &self,
        client: &mut M::Client,
        prefix: &str,
    ) -> Result<LoadContent<String>, FileLoadError> {
        let file_name = self
            .resolve_file_name(client, prefix)
            .await
            .ok_or_else(|| FileLoadError::no_match(prefix))?;

        debug!("Resolved prefix '{}' to remote file '{}'", prefix, file_name);

        let bytes = client.read_to_end(&file_name).await.map_err(|e| {
            error!("Failed to load file '{}' from sftp server: {}", file_name, e);
            FileLoadError::load_failed(prefix, e)
        })?;

        let text = String::from_utf8(bytes).map_err(|e| {
            error!("File '{}' is not valid UTF-8", file_name);
            FileLoadError::decoding(&file_name, e)
        })?;

        Ok(LoadContent::new(text, file_name))
    }
}

#[async_trait]
impl<M: ConnectionManager> FileLoader for FuzzyMatchLoader<M> {
    async fn load_file_as_stream(
        &self,
        prefix: &str,
    ) -> Result<LoadContent<ByteStream>, FileLoadError> {
        let mut client = self.manager.acquire().await.map_err(|e| {
            error!("Failed to acquire SFTP connection: {}", e);
            FileLoadError::load_failed(prefix, e)
        })?;

        // Release exactly once on every exit path after a successful acquire.
        let result = self.open_stream(&mut client, prefix).await;
        self.manager.release(client).await;

        result
    }

    async fn load_file_as_text(&self, prefix: &str) -> Result<LoadContent<String>, FileLoadError> {
        let mut client = self.manager.acquire().await.map_err(|e| {
            error!("Failed to acquire SFTP connection: {}", e);
            FileLoadError::load_failed(prefix, e)
        })?;

        let result = self.read_text(&mut client, prefix).await;
        self.manager.release(client).await;

        result
    }
}

/// Collect every entry whose name starts with the trimmed prefix.
fn select_candidates(entries: Vec<String>, prefix: &str, case_insensitive: bool) -> Vec<String> {
    let wanted = prefix.trim();

    if case_insensitive {
        let wanted = wanted.to_lowercase();
        entries
            .into_iter()
            .filter(|name| name.to_lowercase().starts_with(&wanted))
            .collect()
    } else {
        entries
            .into_iter()
            .filter(|name| name.starts_with(wanted))
            .collect()
    }
}

/// Tie-break: the lexicographically greatest candidate wins.
fn pick_nearest(mut candidates: Vec<String>) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }

    if candidates.len() > 1 {
        candidates.sort_by(|a, b| b.cmp(a));
    }

    candidates.truncate(1);
    candidates.pop()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_match_returned() {
        let candidates = select_candidates(names(&["report.csv", "summary.csv"]), "report", true);
        assert_eq!(pick_nearest(candidates), Some("report.csv".to_string()));
    }

    #[test]
    fn test_no_match_is_none() {
        let candidates = select_candidates(names(&["a.txt", "b.txt"]), "c", true);
        assert_eq!(pick_nearest(candidates), None);
    }

    #[test]
    fn test_tie_break_picks_greatest_name() {
        let candidates = select_candidates(
            names(&["data_20230101", "data_20230102", "other"]),
            "data",
            true,
        );
        assert_eq!(pick_nearest(candidates), Some("data_20230102".to_string()));
    }

    #[test]
    fn test_case_insensitive_by_default() {
        let candidates = select_candidates(names(&["Report.csv"]), "report", true);
        assert_eq!(candidates, names(&["Report.csv"]));
    }

    #[test]
    fn test_case_sensitive_when_disabled() {
        let candidates = select_candidates(names(&["Report.csv"]), "report", false);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_prefix_is_trimmed() {
        let candidates = select_candidates(names(&["data_20230101"]), "  data  ", true);
        assert_eq!(candidates, names(&["data_20230101"]));
    }

    #[test]
    fn test_original_casing_preserved_in_result() {
        let candidates = select_candidates(names(&["HR_Export_B", "hr_export_a"]), "hr", true);
        assert_eq!(pick_nearest(candidates), Some("hr_export_a".to_string()));
    }
}
