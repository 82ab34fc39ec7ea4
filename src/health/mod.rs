//! 可达性探测模块
//!
//! 提供TCP探测、主机统计聚合和探测轮次调度功能

pub mod prober;
pub mod result;
pub mod scheduler;
pub mod stats;

// 重新导出主要类型
pub use prober::{Prober, TcpProber, DEFAULT_PROBE_TIMEOUT};
pub use result::{HostTarget, ProbeOutcome};
pub use scheduler::{ProbeScheduler, Scheduler, SchedulerStatus};
pub use stats::{HostSnapshot, HostStats, StatsAggregator};
