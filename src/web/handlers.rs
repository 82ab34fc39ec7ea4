//! Web 路由处理函数
//!
//! 实现仪表板、JSON 统计和存活检查三个只读端点

use super::WebAppState;
use crate::error::WebError;
use crate::health::HostSnapshot;
use askama::Template;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use std::time::Duration;
use tracing::error;

/// 仪表板模板
#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    hosts: Vec<DashboardRow>,
    last_updated: String,
    uptime: String,
    up_count: usize,
    down_count: usize,
    refresh_interval: u32,
}

/// 仪表板中的一行
struct DashboardRow {
    host: String,
    up: bool,
    sent: u64,
    received: u64,
    packet_loss: String,
    min_time: String,
    average: String,
    max_time: String,
    std_dev: String,
    last_probe: String,
}

impl DashboardRow {
    fn from_snapshot(snapshot: &HostSnapshot) -> Self {
        let has_samples = snapshot.received > 0;
        Self {
            host: snapshot.host.clone(),
            up: snapshot.up,
            sent: snapshot.sent,
            received: snapshot.received,
            packet_loss: format!("{:.1}%", snapshot.packet_loss_percent),
            min_time: format_latency(snapshot.min_latency),
            average: format_latency(has_samples.then_some(snapshot.average_latency)),
            max_time: format_latency(snapshot.max_latency),
            std_dev: format_latency(has_samples.then_some(snapshot.std_dev_latency)),
            last_probe: snapshot
                .last_probe
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// 延迟格式化为毫秒，保留三位小数
fn format_latency(latency: Option<Duration>) -> String {
    match latency {
        Some(d) => format!("{:.3} ms", d.as_secs_f64() * 1000.0),
        None => "-".to_string(),
    }
}

/// 将统计视图编码为 JSON 响应，编码失败时返回 500
pub(crate) fn encode_json<T: Serialize + ?Sized>(value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("{}", WebError::Encode(e.to_string()));
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error encoding JSON: {e}"),
            )
                .into_response()
        }
    }
}

/// 仪表板页面处理函数
pub async fn dashboard(State(app_state): State<WebAppState>) -> Response {
    let snapshot = app_state.stats.snapshot().await;

    let up_count = snapshot.iter().filter(|s| s.up).count();
    let uptime = chrono::Utc::now() - app_state.start_time;

    let template = DashboardTemplate {
        down_count: snapshot.len() - up_count,
        up_count,
        hosts: snapshot.iter().map(DashboardRow::from_snapshot).collect(),
        last_updated: chrono::Utc::now()
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string(),
        uptime: format!(
            "{}h {}m {}s",
            uptime.num_hours(),
            uptime.num_minutes() % 60,
            uptime.num_seconds() % 60
        ),
        refresh_interval: app_state.config.refresh_interval_seconds,
    };

    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("{}", WebError::Render(e.to_string()));
            (StatusCode::INTERNAL_SERVER_ERROR, "模板渲染失败").into_response()
        }
    }
}

/// JSON 统计端点处理函数
pub async fn stats(State(app_state): State<WebAppState>) -> Response {
    let snapshot = app_state.stats.snapshot().await;
    encode_json(&snapshot)
}

/// 存活检查，与被监控主机的状态无关
pub async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "up")
}
