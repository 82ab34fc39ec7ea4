//! 探测目标与探测结果数据结构
//!
//! 定义被监控主机的标识以及单次探测的结果

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// 被监控的主机标识
///
/// 启动时根据配置创建，此后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostTarget {
    /// 主机名或地址
    pub host: String,
    /// TCP端口
    pub port: u16,
}

impl HostTarget {
    /// 创建新的探测目标
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for HostTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // IPv6 字面量需要加方括号
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// 单次探测结果
///
/// 只区分成功与失败，不区分失败原因（超时、拒绝、DNS失败等）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// 是否建立了连接
    pub success: bool,
    /// 从发起连接到成功或失败所经过的时间
    pub elapsed: Duration,
}

impl ProbeOutcome {
    /// 成功的探测结果
    pub fn success(elapsed: Duration) -> Self {
        Self {
            success: true,
            elapsed,
        }
    }

    /// 失败的探测结果
    pub fn failure(elapsed: Duration) -> Self {
        Self {
            success: false,
            elapsed,
        }
    }
}

/// Duration 以毫秒整数序列化
pub(crate) mod duration_ms {
    use serde::{Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }
}

/// 可选 Duration 以毫秒整数序列化，未设置时输出 0
pub(crate) mod opt_duration_ms {
    use serde::{Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
            .serialize(serializer)
    }
}
