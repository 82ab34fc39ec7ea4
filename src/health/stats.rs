//! 主机统计聚合器
//!
//! 为每个被监控主机维护一份可靠性记录（发送数、接收数、延迟极值与总和），
//! 并按需计算派生指标（平均延迟、丢包率、标准差）。
//!
//! 每个主机的记录由独立的互斥锁保护，`record` 与 `snapshot` 是访问记录的
//! 唯一入口，因此读方永远不会观察到只应用了一半的更新。主机索引在构造后
//! 不再变化，读取索引无需加锁。

use crate::health::result::{duration_ms, opt_duration_ms, HostTarget, ProbeOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::warn;

/// 单个主机的可变统计记录
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostStats {
    /// 已发送的探测次数
    pub sent: u64,
    /// 成功的探测次数
    pub received: u64,
    /// 最近一次应用的探测结果
    pub up: bool,
    /// 最小延迟（仅统计成功探测，首次成功前为空）
    pub min_latency: Option<Duration>,
    /// 最大延迟（仅统计成功探测，首次成功前为空）
    pub max_latency: Option<Duration>,
    /// 成功探测的延迟总和
    pub total_latency: Duration,
    /// 成功探测延迟（毫秒）的平方和，用于计算标准差
    sum_sq_latency_ms: f64,
    /// 最近一次应用探测结果的时间
    pub last_probe: Option<DateTime<Utc>>,
}

impl HostStats {
    /// 应用一次探测结果
    pub fn apply(&mut self, outcome: ProbeOutcome) {
        self.sent += 1;
        self.up = outcome.success;
        self.last_probe = Some(Utc::now());

        // 失败的探测不影响任何延迟字段
        if !outcome.success {
            return;
        }

        self.received += 1;
        self.total_latency += outcome.elapsed;

        let ms = outcome.elapsed.as_secs_f64() * 1000.0;
        self.sum_sq_latency_ms += ms * ms;

        self.min_latency = Some(match self.min_latency {
            Some(min) => min.min(outcome.elapsed),
            None => outcome.elapsed,
        });
        self.max_latency = Some(match self.max_latency {
            Some(max) => max.max(outcome.elapsed),
            None => outcome.elapsed,
        });
    }

    /// 平均延迟，没有成功探测时为0
    pub fn average_latency(&self) -> Duration {
        if self.received == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_latency.as_nanos() / u128::from(self.received);
        Duration::from_nanos(nanos as u64)
    }

    /// 丢包率（百分比），没有发送探测时为0
    pub fn packet_loss_percent(&self) -> f64 {
        if self.sent == 0 {
            return 0.0;
        }
        (self.sent - self.received) as f64 / self.sent as f64 * 100.0
    }

    /// 成功探测延迟的样本标准差，样本数不足两个时为0
    pub fn std_dev_latency(&self) -> Duration {
        if self.received <= 1 {
            return Duration::ZERO;
        }

        let n = self.received as f64;
        let mean_ms = self.total_latency.as_secs_f64() * 1000.0 / n;
        let variance = (self.sum_sq_latency_ms - n * mean_ms * mean_ms) / (n - 1.0);

        // 浮点误差可能让方差略小于0
        if variance <= 0.0 || !variance.is_finite() {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(variance.sqrt() / 1000.0)
    }
}

/// 单个主机的只读统计视图
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSnapshot {
    /// 主机名
    pub host: String,
    /// 最近一次探测是否成功
    pub up: bool,
    /// 已发送的探测次数
    pub sent: u64,
    /// 成功的探测次数
    pub received: u64,
    /// 丢包率（百分比）
    #[serde(rename = "packetLoss")]
    pub packet_loss_percent: f64,
    /// 最小延迟
    #[serde(rename = "minTime", with = "opt_duration_ms")]
    pub min_latency: Option<Duration>,
    /// 最大延迟
    #[serde(rename = "maxTime", with = "opt_duration_ms")]
    pub max_latency: Option<Duration>,
    /// 平均延迟
    #[serde(rename = "average", with = "duration_ms")]
    pub average_latency: Duration,
    /// 延迟标准差
    #[serde(rename = "stdDev", with = "duration_ms")]
    pub std_dev_latency: Duration,
    /// 最近一次探测时间
    #[serde(skip)]
    pub last_probe: Option<DateTime<Utc>>,
}

impl HostSnapshot {
    fn from_stats(host: &str, stats: &HostStats) -> Self {
        Self {
            host: host.to_string(),
            up: stats.up,
            sent: stats.sent,
            received: stats.received,
            packet_loss_percent: stats.packet_loss_percent(),
            min_latency: stats.min_latency,
            max_latency: stats.max_latency,
            average_latency: stats.average_latency(),
            std_dev_latency: stats.std_dev_latency(),
            last_probe: stats.last_probe,
        }
    }

    /// 生成类似 ping 的统计摘要行
    pub fn summary_line(&self) -> String {
        let to_ms = |d: Duration| d.as_secs_f64() * 1000.0;
        format!(
            "{}: {} probes transmitted, {} received, {:.1}% loss, \
             min/avg/max/stddev = {:.3}/{:.3}/{:.3}/{:.3} ms",
            self.host,
            self.sent,
            self.received,
            self.packet_loss_percent,
            to_ms(self.min_latency.unwrap_or_default()),
            to_ms(self.average_latency),
            to_ms(self.max_latency.unwrap_or_default()),
            to_ms(self.std_dev_latency),
        )
    }
}

/// 单个主机条目
#[derive(Debug)]
struct HostEntry {
    host: String,
    stats: Mutex<HostStats>,
}

/// 统计聚合器
///
/// 进程内唯一，通过 `Arc` 在调度器的探测任务与 Web 处理函数之间共享。
#[derive(Debug, Default)]
pub struct StatsAggregator {
    /// 按配置顺序排列的主机条目
    entries: Vec<HostEntry>,
    /// 主机名到条目下标的索引
    index: HashMap<String, usize>,
}

impl StatsAggregator {
    /// 为每个主机创建一份零值统计记录
    ///
    /// 重复的主机名只保留第一次出现的位置。
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries = Vec::new();
        let mut index = HashMap::new();

        for host in hosts {
            let host = host.into();
            if index.contains_key(&host) {
                warn!("忽略重复的主机: {}", host);
                continue;
            }
            index.insert(host.clone(), entries.len());
            entries.push(HostEntry {
                host,
                stats: Mutex::new(HostStats::default()),
            });
        }

        Self { entries, index }
    }

    /// 根据探测目标列表创建聚合器
    pub fn for_targets(targets: &[HostTarget]) -> Self {
        Self::new(targets.iter().map(|t| t.host.clone()))
    }

    /// 被监控主机数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否没有被监控的主机
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按配置顺序返回主机名
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.host.as_str())
    }

    /// 原子地将一次探测结果应用到指定主机
    ///
    /// # 返回
    /// * `bool` - 主机未被监控时返回 false，结果被丢弃
    pub async fn record(&self, host: &str, outcome: ProbeOutcome) -> bool {
        let Some(&idx) = self.index.get(host) else {
            warn!("收到未监控主机的探测结果，已忽略: {}", host);
            return false;
        };

        let mut stats = self.entries[idx].stats.lock().await;
        stats.apply(outcome);
        true
    }

    /// 计算所有主机的统计视图，顺序与配置一致
    pub async fn snapshot(&self) -> Vec<HostSnapshot> {
        let mut snapshots = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let stats = entry.stats.lock().await;
            snapshots.push(HostSnapshot::from_stats(&entry.host, &stats));
        }
        snapshots
    }

    /// 计算单个主机的统计视图
    pub async fn snapshot_host(&self, host: &str) -> Option<HostSnapshot> {
        let entry = &self.entries[*self.index.get(host)?];
        let stats = entry.stats.lock().await;
        Some(HostSnapshot::from_stats(&entry.host, &stats))
    }
}
