// 用户处理器
// 处理用户相关的API请求

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::future::try_join;

use crate::AppState;
use crate::api::extract::{AppJson, AppPath};
use crate::api::models::{ListUsersQuery, MessageResponse, PaginatedResponse, Pagination};
use crate::database::{NewUser, UserChanges};
use crate::error::AppError;

const USER_NOT_FOUND: &str = "User not found";

/// 分页获取用户列表
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = query.window()?;

    // 列表和总数并发查询
    let (users, total) = try_join(
        state.users.get_users(window.offset, window.limit),
        state.users.count_users(),
    )
    .await?;

    Ok(Json(PaginatedResponse {
        data: users,
        pagination: Pagination::new(total, window.page, window.limit),
    }))
}

/// 根据ID获取用户
pub async fn get_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    match state.users.get_user_by_id(id).await? {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::NotFound(USER_NOT_FOUND)),
    }
}

/// 创建用户
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<NewUser>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.users.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// 更新用户，PUT 和 PATCH 都按部分更新处理
pub async fn update_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(changes): AppJson<UserChanges>,
) -> Result<impl IntoResponse, AppError> {
    match state.users.update_user(id, changes).await? {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::NotFound(USER_NOT_FOUND)),
    }
}

/// 删除用户
pub async fn delete_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    match state.users.delete_user(id).await? {
        Some(user) => {
            tracing::debug!("Deleted user {} ({})", user.id, user.username);
            Ok(Json(MessageResponse {
                message: "Deleted successfully".to_string(),
            }))
        }
        None => Err(AppError::NotFound(USER_NOT_FOUND)),
    }
}
