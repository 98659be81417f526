// 通用的数据结构定义

use serde::{Deserialize, Serialize};

/// 分页信息
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 总记录数
    pub total: i64,
    /// 当前页码，从1开始
    pub page: i64,
    /// 每页数量
    pub limit: i64,
    /// 总页数
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        // limit 在进入这里之前已经校验为正数
        let total_pages = if total <= 0 {
            0
        } else {
            total / limit + i64::from(total % limit != 0)
        };

        Self {
            total,
            page,
            limit,
            total_pages,
        }
    }
}

/// 带分页的响应数据
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    /// 数据列表
    pub data: Vec<T>,
    /// 分页信息
    pub pagination: Pagination,
}

/// 只有一条提示信息的响应
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(Pagination::new(10, 1, 10).total_pages, 1);
        assert_eq!(Pagination::new(11, 1, 10).total_pages, 2);
        assert_eq!(Pagination::new(0, 1, 10).total_pages, 0);
        assert_eq!(Pagination::new(3, 1, i64::MAX).total_pages, 1);
    }

    #[test]
    fn serializes_total_pages_in_camel_case() {
        let json = serde_json::to_value(Pagination::new(25, 2, 10)).unwrap();

        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["page"], 2);
    }
}
