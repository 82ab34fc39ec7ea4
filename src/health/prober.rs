//! TCP 可达性探测器实现
//!
//! 通过建立 TCP 连接判断主机是否可达，并测量连接耗时

use crate::health::result::{HostTarget, ProbeOutcome};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// 默认探测超时时间
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// 探测器trait，定义探测接口
///
/// 探测永远不会向调用方返回错误：所有失败都折叠为 `success = false`。
#[async_trait]
pub trait Prober: Send + Sync {
    /// 使用默认超时探测目标
    ///
    /// # 参数
    /// * `target` - 探测目标
    ///
    /// # 返回
    /// * `ProbeOutcome` - 探测结果
    async fn probe(&self, target: &HostTarget) -> ProbeOutcome;

    /// 带超时的探测
    ///
    /// # 参数
    /// * `target` - 探测目标
    /// * `timeout_duration` - 超时时间
    ///
    /// # 返回
    /// * `ProbeOutcome` - 探测结果
    async fn probe_with_timeout(
        &self,
        target: &HostTarget,
        timeout_duration: Duration,
    ) -> ProbeOutcome;

    /// 并发探测一组目标，结果顺序与输入一致
    async fn probe_batch(&self, targets: &[HostTarget]) -> Vec<ProbeOutcome> {
        let futures = targets.iter().map(|target| self.probe(target));
        futures::future::join_all(futures).await
    }
}

/// TCP 连接探测器
#[derive(Debug, Clone)]
pub struct TcpProber {
    /// 默认超时时间
    default_timeout: Duration,
}

impl TcpProber {
    /// 创建新的TCP探测器
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    /// 默认超时时间
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}

impl Default for TcpProber {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, target: &HostTarget) -> ProbeOutcome {
        self.probe_with_timeout(target, self.default_timeout).await
    }

    async fn probe_with_timeout(
        &self,
        target: &HostTarget,
        timeout_duration: Duration,
    ) -> ProbeOutcome {
        if timeout_duration.is_zero() {
            debug!("超时为0，不发起连接: {}", target);
            return ProbeOutcome::failure(Duration::ZERO);
        }

        let start_time = Instant::now();

        // (host, port) 形式可以直接处理未加方括号的 IPv6 字面量
        let connect = TcpStream::connect((target.host.as_str(), target.port));
        let result = timeout(timeout_duration, connect).await;

        let elapsed = start_time.elapsed();

        match result {
            Ok(Ok(stream)) => {
                // 不交换任何数据，立即释放连接
                drop(stream);
                debug!("连接成功: {} 耗时 {:?}", target, elapsed);
                ProbeOutcome::success(elapsed)
            }
            Ok(Err(e)) => {
                debug!("连接失败: {} 耗时 {:?} ({})", target, elapsed, e);
                ProbeOutcome::failure(elapsed)
            }
            Err(_) => {
                debug!("连接超时: {} 耗时 {:?}", target, elapsed);
                ProbeOutcome::failure(elapsed)
            }
        }
    }
}
