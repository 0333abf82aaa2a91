use std::{sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::users::{dto::ProfileView, repo_types::User};

/// Key/value mirror of public profiles. Never a source of truth.
#[async_trait]
pub trait ProfileCache: Send + Sync {
    async fn upsert(&self, profile: &ProfileView) -> anyhow::Result<()>;
    async fn remove(&self, user_id: Uuid) -> anyhow::Result<()>;
}

/// Entries are keyed by the bare user id and carry no expiry.
pub fn cache_key(user_id: Uuid) -> String {
    user_id.to_string()
}

#[derive(Clone)]
pub struct RedisProfileCache {
    conn: ConnectionManager,
}

impl RedisProfileCache {
    /// Opens the one long-lived connection the process shares.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url).context("redis url")?;
        let mut conn = ConnectionManager::new(client)
            .await
            .context("connect to redis")?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("redis ping")?;
        info!("connected to redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl ProfileCache for RedisProfileCache {
    async fn upsert(&self, profile: &ProfileView) -> anyhow::Result<()> {
        let json = serde_json::to_string(profile).context("serialize profile")?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set(cache_key(profile.id), json)
            .await
            .context("redis set")?;
        Ok(())
    }

    async fn remove(&self, user_id: Uuid) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(cache_key(user_id)).await.context("redis del")?;
        Ok(())
    }
}

/// Runs cache writes after a commit. One bounded attempt; failures are logged
/// and dropped so they never reach the caller.
#[derive(Clone)]
pub struct CacheSync {
    cache: Arc<dyn ProfileCache>,
    timeout: Duration,
}

impl CacheSync {
    pub fn new(cache: Arc<dyn ProfileCache>, timeout: Duration) -> Self {
        Self { cache, timeout }
    }

    pub async fn upsert(&self, user: &User) {
        let profile = ProfileView::from(user);
        match tokio::time::timeout(self.timeout, self.cache.upsert(&profile)).await {
            Ok(Ok(())) => debug!(user_id = %user.id, "profile cached"),
            Ok(Err(e)) => warn!(user_id = %user.id, error = %e, "cache upsert failed"),
            Err(_) => warn!(user_id = %user.id, "cache upsert timed out"),
        }
    }

    pub async fn remove(&self, user_id: Uuid) {
        match tokio::time::timeout(self.timeout, self.cache.remove(user_id)).await {
            Ok(Ok(())) => debug!(user_id = %user_id, "profile evicted"),
            Ok(Err(e)) => warn!(user_id = %user_id, error = %e, "cache remove failed"),
            Err(_) => warn!(user_id = %user_id, "cache remove timed out"),
        }
    }
}
