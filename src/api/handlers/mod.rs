// API 处理器模块
// 包含所有 API 请求处理逻辑

pub mod health;
pub mod user;

// 重新导出常用处理器
pub use health::*;
pub use user::*;
