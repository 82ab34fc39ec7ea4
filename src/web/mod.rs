//! Web 展示模块
//!
//! 只读的 HTTP 接口：HTML 仪表板、JSON 统计和存活检查。
//! 该模块只通过 `StatsAggregator::snapshot` 读取统计，从不写入。

use crate::config::WebConfig;
use crate::health::StatsAggregator;
use axum::http::Method;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod server;

pub use server::WebServer;

/// Web 应用共享状态
#[derive(Debug, Clone)]
pub struct WebAppState {
    /// 统计聚合器
    pub stats: Arc<StatsAggregator>,
    /// Web 配置
    pub config: WebConfig,
    /// 启动时间
    pub start_time: chrono::DateTime<chrono::Utc>,
}

impl WebAppState {
    /// 创建新的 Web 应用状态
    pub fn new(stats: Arc<StatsAggregator>, config: WebConfig) -> Self {
        Self {
            stats,
            config,
            start_time: chrono::Utc::now(),
        }
    }
}

/// 构建路由
///
/// 只暴露 GET 路由，不存在任何修改统计的接口。
pub fn build_router(state: WebAppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/stats", get(handlers::stats))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
