mod error_handler;
mod rate_limit;
mod request_log;

pub use error_handler::log_errors;
pub use rate_limit::{RateLimiter, rate_limit};
pub use request_log::log_requests;
