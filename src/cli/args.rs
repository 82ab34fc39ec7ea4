//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use crate::config::CliSettings;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// TCP Vitals - 周期性探测主机的TCP可达性并通过HTTP展示统计
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tcp-vitals",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = "周期性探测给定主机的TCP可达性。\n\n\
例如，每5秒检查 host1、host2、host3 的 8080 端口：\n\n    \
tcp-vitals --hosts host1,host2,host3 -p 8080 -i 5"
)]
pub struct Args {
    /// 被监控主机列表
    #[arg(
        long,
        value_name = "HOST",
        value_delimiter = ',',
        help = "被监控主机列表，格式 host1,host2,host3",
        env = "TCP_VITALS_HOSTS"
    )]
    pub hosts: Vec<String>,

    /// 探测端口
    #[arg(
        short,
        long,
        value_name = "PORT",
        default_value = "80",
        help = "主机的探测端口",
        env = "TCP_VITALS_PORT"
    )]
    pub port: String,

    /// 探测间隔（秒）
    #[arg(
        short,
        long,
        value_name = "SECONDS",
        default_value_t = 5,
        help = "探测间隔（秒）",
        env = "TCP_VITALS_INTERVAL"
    )]
    pub interval: u64,

    /// 单次探测超时（秒）
    #[arg(
        short,
        long,
        value_name = "SECONDS",
        default_value_t = 2,
        help = "单次探测超时（秒）",
        env = "TCP_VITALS_TIMEOUT"
    )]
    pub timeout: u64,

    /// 配置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径，指定后完全替换命令行中的主机、端口和间隔",
        env = "TCP_VITALS_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// 日志级别
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        help = "日志级别",
        env = "TCP_VITALS_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// 日志文件路径
    #[arg(
        long,
        value_name = "FILE",
        help = "日志追加写入该文件，不指定时输出到标准输出",
        env = "TCP_VITALS_LOG_FILE"
    )]
    pub log_file: Option<PathBuf>,

    /// 是否输出JSON格式日志
    #[arg(long, help = "输出JSON格式日志")]
    pub log_json: bool,

    /// 只执行一轮探测
    #[arg(long, help = "只执行一轮探测，输出统计后退出")]
    pub once: bool,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum LogLevel {
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl Args {
    /// 解析命令行参数
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// 提取命令行提供的监控配置
    pub fn cli_settings(&self) -> CliSettings {
        CliSettings {
            hosts: self
                .hosts
                .iter()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .collect(),
            port: self.port.clone(),
            interval_seconds: self.interval,
            timeout_seconds: self.timeout,
        }
    }
}
