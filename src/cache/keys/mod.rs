/// 缓存键模块
/// 提供各种缓存键生成函数

// 用户缓存键模块
pub mod user_keys;

// 重新导出常用的键生成函数
pub use user_keys::{USERS_PAGE_PATTERN, USERS_PAGE_TTL_SECS, rate_limit_key, users_page_key};
