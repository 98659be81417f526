use axum::{body::Body, http::Request, middleware::Next, response::Response};

/// 每个请求完成后记录方法、路径和状态码
pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;

    tracing::info!("{} {} {}", method, uri, response.status().as_u16());
    response
}
