use serde::Deserialize;

use crate::error::AppError;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;

/// 用户列表查询参数，原样保留字符串以便给出准确的错误信息
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// 校验后的分页窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

impl ListUsersQuery {
    pub fn window(&self) -> Result<PageWindow, AppError> {
        let page = match self.page.as_deref() {
            None => DEFAULT_PAGE,
            Some(raw) => parse_positive(raw).ok_or_else(|| {
                AppError::Validation(format!(
                    "Invalid page number \"{}\". Page must be greater than 0.",
                    raw
                ))
            })?,
        };

        let limit = match self.limit.as_deref() {
            None => DEFAULT_LIMIT,
            Some(raw) => parse_positive(raw).ok_or_else(|| {
                AppError::Validation(format!(
                    "Invalid limit \"{}\". Limit must be a positive integer.",
                    raw
                ))
            })?,
        };

        let offset = (page - 1).checked_mul(limit).ok_or_else(|| {
            AppError::Validation(format!(
                "Page {} with limit {} is out of range.",
                page, limit
            ))
        })?;

        Ok(PageWindow {
            page,
            limit,
            offset,
        })
    }
}

fn parse_positive(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|n| *n > 0)
}
