// 用户存储
// 包含用户相关的数据库操作

use async_trait::async_trait;
use sqlx::{Error as SqlxError, PgPool};
use std::sync::Arc;

use crate::database::models::user::{NewUser, UserChanges, UserEntity};
use crate::database::{FindManyParams, UserOrder, UserStore};

const USER_COLUMNS: &str = "id, name, username, email, phone, website, created_at";

/// 用户存储，处理所有与用户相关的数据库操作
pub struct UserOperation {
    db: Arc<PgPool>,
}

impl UserOperation {
    /// 创建新的用户存储实例
    pub fn new(db: Arc<PgPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for UserOperation {
    /// 分页查询用户
    async fn find_many(&self, params: FindManyParams) -> Result<Vec<UserEntity>, SqlxError> {
        let order_by = match params.order {
            UserOrder::CreatedAtDesc => "created_at DESC, id DESC",
        };
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY {order_by} OFFSET $1 LIMIT $2"
        );

        // 负数会被 Postgres 拒绝，这里收敛到 0
        let users = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(params.skip.max(0))
            .bind(params.take.max(0))
            .fetch_all(&*self.db)
            .await?;

        Ok(users)
    }

    /// 根据ID查找用户
    async fn find_unique(&self, id: i64) -> Result<Option<UserEntity>, SqlxError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, UserEntity>(&sql)
            .bind(id)
            .fetch_optional(&*self.db)
            .await
    }

    /// 创建用户
    async fn create(&self, data: NewUser) -> Result<UserEntity, SqlxError> {
        let sql = format!(
            r#"
            INSERT INTO users (name, username, email, phone, website)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );

        let result = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(&data.name)
            .bind(&data.username)
            .bind(&data.email)
            .bind(&data.phone)
            .bind(&data.website)
            .fetch_one(&*self.db)
            .await;

        match result {
            Ok(user) => {
                tracing::info!("Created user {} ({})", user.id, user.username);
                Ok(user)
            }
            Err(e) => {
                tracing::error!("Failed to create user {}: {:?}", data.username, e);
                Err(e)
            }
        }
    }

    /// 部分更新用户，未提供的字段保持原值
    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<UserEntity>, SqlxError> {
        let sql = format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                username = COALESCE($3, username),
                email = COALESCE($4, email),
                phone = CASE WHEN $5 THEN $6 ELSE phone END,
                website = CASE WHEN $7 THEN $8 ELSE website END
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, UserEntity>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.username)
            .bind(changes.email)
            .bind(changes.phone.is_some())
            .bind(changes.phone.flatten())
            .bind(changes.website.is_some())
            .bind(changes.website.flatten())
            .fetch_optional(&*self.db)
            .await
    }

    /// 删除用户，返回被删除的行
    async fn delete(&self, id: i64) -> Result<Option<UserEntity>, SqlxError> {
        let sql = format!("DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}");

        sqlx::query_as::<_, UserEntity>(&sql)
            .bind(id)
            .fetch_optional(&*self.db)
            .await
    }

    /// 用户总数
    async fn count(&self) -> Result<i64, SqlxError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&*self.db)
            .await
    }
}
