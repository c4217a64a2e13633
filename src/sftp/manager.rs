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

//! Pooled SFTP connection source.
//!
//! The loader brackets every operation with `acquire`/`release` against a
//! [`ConnectionManager`]. [`PooledConnectionManager`] is the real
//! implementation: it keeps idle authenticated sessions to a single endpoint
//! and hands them back out until they expire.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use super::auth::AuthMethod;
use super::client::{SessionClient, SftpClient};
use super::error::SftpResult;
use super::session::{ServerCheckMethod, SshSession};

/// Source of SFTP connections: acquire one per operation, release it after.
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    type Client: SftpClient + Send;

    /// Hand out a ready-to-use SFTP client.
    async fn acquire(&self) -> SftpResult<Self::Client>;

    /// Return a client after use. The manager decides whether to keep it.
    async fn release(&self, client: Self::Client);
}

/// Remote endpoint a [`PooledConnectionManager`] dials.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: AuthMethod,
    pub server_check: ServerCheckMethod,
}

#[derive(Debug)]
struct IdleEntry<T> {
    value: T,
    last_used: Instant,
}

impl<T> IdleEntry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            last_used: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_used.elapsed() > ttl
    }
}

/// Idle-entry bookkeeping: TTL expiry, max-idle cap, enable flag.
///
/// Kept separate from dialing so reuse, pruning and cap behavior can be
/// exercised without a live server.
#[derive(Debug)]
struct IdlePool<T> {
    idle: Mutex<Vec<IdleEntry<T>>>,
    ttl: Duration,
    max_idle: usize,
    enabled: bool,
}

impl<T: Send> IdlePool<T> {
    fn new(ttl: Duration, max_idle: usize, enabled: bool) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            ttl,
            max_idle,
            enabled,
        }
    }

    /// Pop an idle entry, pruning expired and dead ones first.
    async fn checkout(&self, is_live: impl Fn(&T) -> bool + Send) -> Option<T> {
        if !self.enabled {
            return None;
        }

        let mut idle = self.idle.lock().await;
        idle.retain(|entry| !entry.is_expired(self.ttl) && is_live(&entry.value));

        idle.pop().map(|entry| entry.value)
    }

    /// Retain a returned entry. Returns false when the entry was dropped
    /// instead (pool disabled, entry dead, or max-idle reached).
    async fn checkin(&self, value: T, is_live: impl Fn(&T) -> bool + Send) -> bool {
        if !self.enabled || !is_live(&value) {
            return false;
        }

        let mut idle = self.idle.lock().await;
        if idle.len() >= self.max_idle {
            return false;
        }

        idle.push(IdleEntry::new(value));
        true
    }

    async fn len(&self) -> usize {
        self.idle.lock().await.len()
    }

    async fn clear(&self) -> usize {
        let mut idle = self.idle.lock().await;
        let count = idle.len();
        idle.clear();
        count
    }
}

/// Connection pool over a single SFTP endpoint
pub struct PooledConnectionManager {
    endpoint: Endpoint,
    pool: IdlePool<SessionClient>,
}

impl PooledConnectionManager {
    /// Create a new pooled manager.
    pub fn new(endpoint: Endpoint, ttl: Duration, max_idle: usize, enabled: bool) -> Self {
        Self {
            endpoint,
            pool: IdlePool::new(ttl, max_idle, enabled),
        }
    }

    /// Create a manager with pooling defaults (5 minute TTL, 5 idle sessions).
    pub fn with_defaults(endpoint: Endpoint) -> Self {
        Self::new(endpoint, Duration::from_secs(300), 5, true)
    }

    /// Create a manager that dials a fresh connection for every acquire.
    pub fn without_pooling(endpoint: Endpoint) -> Self {
        Self::new(endpoint, Duration::from_secs(0), 0, false)
    }

    /// Check if pooling is enabled
    pub fn is_enabled(&self) -> bool {
        self.pool.enabled
    }

    /// Number of idle sessions currently held
    pub async fn idle_len(&self) -> usize {
        self.pool.len().await
    }

    /// Drop all idle sessions.
    pub async fn clear(&self) {
        let count = self.pool.clear().await;

        if count > 0 {
            debug!("Cleared {} idle connections from pool", count);
        }
    }

    /// Dial, authenticate and open the SFTP subsystem on a new session.
    async fn create_new_client(&self) -> SftpResult<SessionClient> {
        debug!(
            "Creating new connection to {}@{}:{}",
            self.endpoint.username, self.endpoint.host, self.endpoint.port
        );

        let mut session = SshSession::connect(
            &self.endpoint.host,
            self.endpoint.port,
            &self.endpoint.username,
            &self.endpoint.auth,
            self.endpoint.server_check.clone(),
        )
        .await?;

        session.init_sftp().await?;

        Ok(SessionClient::new(session))
    }
}

#[async_trait]
impl ConnectionManager for PooledConnectionManager {
    type Client = SessionClient;

    async fn acquire(&self) -> SftpResult<SessionClient> {
        if let Some(client) = self.pool.checkout(|c| !c.is_closed()).await {
            trace!(
                "Reusing pooled connection to {}@{}:{}",
                self.endpoint.username,
                self.endpoint.host,
                self.endpoint.port
            );
            return Ok(client);
        }

        self.create_new_client().await
    }

    async fn release(&self, client: SessionClient) {
        if self.pool.checkin(client, |c| !c.is_closed()).await {
            debug!(
                "Returned connection to pool for {}@{}:{}",
                self.endpoint.username, self.endpoint.host, self.endpoint.port
            );
        } else {
            debug!(
                "Dropping connection to {}:{} (pool disabled, full, or connection closed)",
                self.endpoint.host, self.endpoint.port
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_endpoint() -> Endpoint {
        Endpoint {
            host: "sftp.example.com".to_string(),
            port: 22,
            username: "sync".to_string(),
            auth: AuthMethod::with_password("secret"),
            server_check: ServerCheckMethod::NoCheck,
        }
    }

    fn live(_: &u32) -> bool {
        true
    }

    #[tokio::test]
    async fn test_checkin_then_checkout_reuses_entry() {
        let pool = IdlePool::new(Duration::from_secs(60), 5, true);

        assert!(pool.checkin(7u32, live).await);
        assert_eq!(pool.len().await, 1);

        assert_eq!(pool.checkout(live).await, Some(7));
        assert_eq!(pool.len().await, 0);
    }

    #[tokio::test]
    async fn test_expired_entries_are_pruned() {
        let pool = IdlePool::new(Duration::from_millis(10), 5, true);

        assert!(pool.checkin(7u32, live).await);
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(pool.checkout(live).await, None);
        assert_eq!(pool.len().await, 0);
    }

    #[tokio::test]
    async fn test_checkin_drops_when_max_idle_reached() {
        let pool = IdlePool::new(Duration::from_secs(60), 1, true);

        assert!(pool.checkin(1u32, live).await);
        assert!(!pool.checkin(2u32, live).await);
        assert_eq!(pool.len().await, 1);
    }

    #[tokio::test]
    async fn test_disabled_pool_never_retains() {
        let pool = IdlePool::new(Duration::from_secs(60), 5, false);

        assert!(!pool.checkin(7u32, live).await);
        assert_eq!(pool.checkout(live).await, None);
        assert_eq!(pool.len().await, 0);
    }

    #[tokio::test]
    async fn test_dead_entries_are_not_handed_out() {
        let pool = IdlePool::new(Duration::from_secs(60), 5, true);

        assert!(pool.checkin(7u32, live).await);
        assert_eq!(pool.checkout(|_| false).await, None);
        assert_eq!(pool.len().await, 0);
    }

    #[tokio::test]
    async fn test_dead_entries_are_not_checked_in() {
        let pool = IdlePool::new(Duration::from_secs(60), 5, true);

        assert!(!pool.checkin(7u32, |_| false).await);
        assert_eq!(pool.len().await, 0);
    }

    #[tokio::test]
    async fn test_manager_pool_disabled() {
        let manager = PooledConnectionManager::without_pooling(test_endpoint());
        assert!(!manager.is_enabled());
        assert_eq!(manager.idle_len().await, 0);
    }

    #[tokio::test]
    async fn test_manager_pool_enabled_by_default() {
        let manager = PooledConnectionManager::with_defaults(test_endpoint());
        assert!(manager.is_enabled());
        assert_eq!(manager.idle_len().await, 0);
    }

    #[tokio::test]
    async fn test_manager_clear_on_empty() {
        let manager = PooledConnectionManager::with_defaults(test_endpoint());

        manager.clear().await;
        assert_eq!(manager.idle_len().await, 0);
    }
}
