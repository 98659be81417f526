/// 缓存操作
/// 提供缓存操作的功能实现

// 分页数据缓存操作
pub mod pages;

// 速率限制计数
pub mod rate_limit;

pub use pages::RedisCacheOperations;
pub use rate_limit::RateLimitCacheOperations;
