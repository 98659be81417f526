// 请求提取器
// 提取失败时统一返回 AppError 的 JSON 错误体

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON 请求体
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// 路径参数
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
