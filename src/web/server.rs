//! Web服务器实现
//!
//! 绑定监听地址并运行路由，收到关闭信号后优雅退出

use super::{build_router, WebAppState};
use crate::config::WebConfig;
use crate::error::{ConfigError, Result, WebError};
use crate::health::StatsAggregator;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;

/// Web服务器
pub struct WebServer {
    /// 配置
    config: WebConfig,
    /// 共享状态
    state: WebAppState,
}

impl WebServer {
    /// 创建新的Web服务器
    pub fn new(config: WebConfig, stats: Arc<StatsAggregator>) -> Self {
        let state = WebAppState::new(stats, config.clone());
        Self { config, state }
    }

    /// 绑定配置中的监听地址并运行，直到收到关闭信号
    pub async fn start(self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown_rx).await
    }

    /// 绑定配置中的监听地址
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self
            .config
            .socket_addr()
            .map_err(ConfigError::ValidationError)?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| WebError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        Ok(listener)
    }

    /// 在已绑定的监听器上运行服务
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        let local_addr = listener.local_addr()?;
        info!("Web服务器已启动: http://{}", local_addr);
        info!("统计接口: http://{}/stats", local_addr);

        let router = build_router(self.state);

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("接收到关闭信号，正在关闭Web服务器...");
            })
            .await
            .map_err(|e| WebError::Serve(e.to_string()))?;

        info!("Web服务器已关闭");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VitalsError;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn test_serve_health_and_shutdown() {
        let stats = Arc::new(StatsAggregator::new(["example.com"]));
        let server = WebServer::new(WebConfig::default(), stats);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(server.serve(listener, shutdown_rx));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("up"));

        shutdown_tx.send(()).unwrap();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_start_fails_when_address_in_use() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = occupied.local_addr().unwrap().port();

        let config = WebConfig {
            bind_address: "127.0.0.1".to_string(),
            port,
            ..Default::default()
        };
        let server = WebServer::new(config, Arc::new(StatsAggregator::default()));
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let err = server.start(shutdown_rx).await.unwrap_err();
        assert!(matches!(err, VitalsError::Web(WebError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_address() {
        let config = WebConfig {
            bind_address: "not an address".to_string(),
            ..Default::default()
        };
        let server = WebServer::new(config, Arc::new(StatsAggregator::default()));
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let err = server.start(shutdown_rx).await.unwrap_err();
        assert!(matches!(err, VitalsError::Config(ConfigError::ValidationError(_))));
    }
}
