use async_trait::async_trait;
use redis::{Client as RedisClient, RedisError};
use std::sync::Arc;

use crate::cache::RateLimitStore;
use crate::cache::keys::rate_limit_key;

/// 速率限制缓存操作
pub struct RateLimitCacheOperations {
    redis_client: Arc<RedisClient>,
}

impl RateLimitCacheOperations {
    pub fn new(redis_client: Arc<RedisClient>) -> Self {
        Self { redis_client }
    }
}

/// 在一个 MULTI/EXEC 事务里建键并计数
///
/// `SET NX EX` 只在窗口开始时生效，计数键因此总是带着过期时间，
/// 不会出现没有 TTL、永远不清零的计数。
fn increment_pipeline(key: &str, window_secs: u64) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .cmd("SET")
        .arg(key)
        .arg(0)
        .arg("NX")
        .arg("EX")
        .arg(window_secs)
        .ignore()
        .incr(key, 1);
    pipe
}

#[async_trait]
impl RateLimitStore for RateLimitCacheOperations {
    async fn increment(&self, client_ip: &str, window_secs: u64) -> Result<u64, RedisError> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;

        let key = rate_limit_key(client_ip);
        let (count,): (u64,) = increment_pipeline(&key, window_secs)
            .query_async(&mut conn)
            .await?;

        Ok(count)
    }
}
