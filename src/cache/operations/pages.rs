use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient, RedisError};
use std::sync::Arc;

use crate::cache::CacheStore;

/// 基于 Redis 的缓存操作
pub struct RedisCacheOperations {
    redis_client: Arc<RedisClient>,
}

impl RedisCacheOperations {
    /// 创建新的缓存操作实例
    pub fn new(redis_client: Arc<RedisClient>) -> Self {
        Self { redis_client }
    }
}

#[async_trait]
impl CacheStore for RedisCacheOperations {
    async fn get(&self, key: &str) -> Result<Option<String>, RedisError> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let result: Option<String> = conn.get(key).await?;
        Ok(result)
    }

    async fn set_ex(&self, key: &str, ttl_secs: u64, value: String) -> Result<(), RedisError> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, RedisError> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }

    async fn del(&self, keys: &[String]) -> Result<usize, RedisError> {
        // 空参数的 DEL 在 Redis 中是语法错误
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let removed: usize = conn.del(keys).await?;
        Ok(removed)
    }
}
