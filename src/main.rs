use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use users_api::{
    AppState,
    cache::{RateLimitCacheOperations, RedisCacheOperations},
    config::{self, Config},
    database::UserOperation,
    middleware::RateLimiter,
    router::create_router,
    service::UserService,
};

#[tokio::main]
async fn main() {
    // 先加载 env 文件，其中的 RUST_LOG / LOG_LEVEL 对日志生效
    config::load_dotenv();

    // 初始化日志
    let filter = std::env::var("RUST_LOG")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置，非法取值的告警在日志初始化之后才能输出
    let config = Config::from_env().expect("DATABASE_URL must be set");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    // 设置 Redis 客户端，连接在每次操作时建立，Redis 不可用不影响启动
    let redis_client =
        Arc::new(redis::Client::open(config.redis_url.clone()).expect("Invalid REDIS_URL"));
    tracing::info!("Using Redis at {}", config.redis_url);

    let users = UserService::new(
        Arc::new(UserOperation::new(Arc::new(pool))),
        Arc::new(RedisCacheOperations::new(redis_client.clone())),
    );
    let state = AppState::new(config.clone(), users);

    // 设置限流器
    let rate_limiter = Arc::new(RateLimiter::new(
        Arc::new(RateLimitCacheOperations::new(redis_client)),
        config.clone(),
    ));

    let app = create_router(state, Some(rate_limiter));

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
