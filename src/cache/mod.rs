// 缓存模块
// 包含缓存键和 Redis 操作逻辑

pub mod keys;
pub mod operations;

use async_trait::async_trait;
use redis::RedisError;

// 重新导出常用类型和函数，方便其他模块使用
pub use operations::pages::RedisCacheOperations;
pub use operations::rate_limit::RateLimitCacheOperations;

/// 带过期时间的键值缓存接口
///
/// 缓存只是派生数据，调用方可以把这里的任何错误当作降级处理。
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, RedisError>;

    async fn set_ex(&self, key: &str, ttl_secs: u64, value: String) -> Result<(), RedisError>;

    /// 按通配模式列出键
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, RedisError>;

    /// 批量删除，返回实际删除的数量
    async fn del(&self, keys: &[String]) -> Result<usize, RedisError>;
}

/// 固定窗口请求计数
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// 增加客户端在当前窗口内的计数，返回增加后的值；窗口结束后计数自动清零
    async fn increment(&self, client_ip: &str, window_secs: u64) -> Result<u64, RedisError>;
}
