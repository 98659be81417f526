// HTTP 接口层

pub mod extract;
pub mod handlers;
pub mod models;
