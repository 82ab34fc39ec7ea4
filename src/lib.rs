//! TCP Vitals - TCP可达性监控工具
//!
//! 周期性地对一组主机发起TCP连接探测，为每个主机维护滚动的可靠性统计
//! （发送数、成功数、丢包率、延迟极值、平均值与标准差），并通过HTTP暴露：
//! - `/` HTML仪表板
//! - `/stats` JSON统计
//! - `/health` 存活检查

pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod web;

// 重新导出主要类型
pub use config::{MonitorConfig, WebConfig};
pub use error::VitalsError;
pub use health::{HostSnapshot, ProbeScheduler, StatsAggregator, TcpProber};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
