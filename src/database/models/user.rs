use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// 用户数据库实体
///
/// 缓存中的分页数据也是这个结构的 JSON 数组，字段名使用 camelCase。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 创建用户的数据，id 和 created_at 由数据库生成
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// 用户的部分更新
///
/// `phone` / `website` 区分“未提供”(`None`) 和“显式置空”(`Some(None)`)。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub website: Option<Option<String>>,
}

// 字段出现时（包括 null）包一层 Some，缺省时由 #[serde(default)] 给出 None
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
