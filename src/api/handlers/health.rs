use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::AppState;
use crate::utils::format_uptime;

/// 健康检查响应
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// 服务状态
    pub status: &'static str,
    /// 运行秒数
    pub uptime: f64,
    pub uptime_human: String,
}

/// 健康检查接口，不依赖数据库和缓存
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.started_at.elapsed();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            uptime: uptime.as_secs_f64(),
            uptime_human: format_uptime(uptime),
        }),
    )
}
