/// 用户分页列表缓存键前缀
const USERS_PAGE_PREFIX: &str = "users:offset:";

/// 匹配所有用户分页缓存键的通配模式
pub const USERS_PAGE_PATTERN: &str = "users:offset:*:limit:*";

/// 用户分页缓存过期时间（秒）
pub const USERS_PAGE_TTL_SECS: u64 = 300; // 5分钟

/// 速率限制计数键前缀
const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// 生成用户分页缓存键
///
/// 两个整数按位置编码，`:` 分隔，不同的 (offset, limit) 不会得到相同的键。
pub fn users_page_key(offset: i64, limit: i64) -> String {
    format!("{}{}:limit:{}", USERS_PAGE_PREFIX, offset, limit)
}

/// 生成速率限制计数键
pub fn rate_limit_key(client_ip: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, client_ip)
}
