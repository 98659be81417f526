// 业务服务模块
// 协调数据库和缓存

pub mod user;

pub use user::UserService;
