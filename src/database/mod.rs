// 数据库模块
// 包含数据库实体定义和存储操作

pub mod models; // 数据库实体定义
pub mod operations; // 数据库操作实现

use async_trait::async_trait;
use sqlx::Error as SqlxError;

// 重新导出常用类型和函数，方便其他模块使用
pub use models::user::{NewUser, UserChanges, UserEntity};
pub use operations::user::UserOperation;

/// 列表排序方式，目前只支持按创建时间倒序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserOrder {
    #[default]
    CreatedAtDesc,
}

/// 分页查询参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindManyParams {
    pub skip: i64,
    pub take: i64,
    pub order: UserOrder,
}

/// 用户持久化接口
///
/// 每个方法都是一次独立的数据库往返，不跨调用持有事务。
/// `update` / `delete` 在目标行不存在时返回 `Ok(None)`。
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_many(&self, params: FindManyParams) -> Result<Vec<UserEntity>, SqlxError>;

    async fn find_unique(&self, id: i64) -> Result<Option<UserEntity>, SqlxError>;

    async fn create(&self, data: NewUser) -> Result<UserEntity, SqlxError>;

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<UserEntity>, SqlxError>;

    async fn delete(&self, id: i64) -> Result<Option<UserEntity>, SqlxError>;

    async fn count(&self) -> Result<i64, SqlxError>;
}
