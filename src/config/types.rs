//! 配置数据结构定义
//!
//! 定义配置文件结构、命令行配置以及最终生效的监控配置

use crate::health::HostTarget;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

/// 配置文件结构
///
/// 缺失的字段取零值，随后由验证逻辑拒绝无效的端口和间隔。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileConfig {
    /// 被监控主机列表
    #[serde(default)]
    pub hosts: Vec<String>,
    /// 探测端口
    #[serde(default)]
    pub port: u16,
    /// 探测间隔（秒）
    #[serde(default)]
    pub interval: u64,
}

/// 命令行提供的配置项
#[derive(Debug, Clone, PartialEq)]
pub struct CliSettings {
    /// 被监控主机列表
    pub hosts: Vec<String>,
    /// 探测端口（字符串形式，解析失败视为配置错误）
    pub port: String,
    /// 探测间隔（秒）
    pub interval_seconds: u64,
    /// 单次探测超时（秒）
    pub timeout_seconds: u64,
}

/// 最终生效的监控配置
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// 被监控主机列表，保持配置顺序
    pub hosts: Vec<String>,
    /// 探测端口
    pub port: u16,
    /// 探测间隔
    pub interval: Duration,
    /// 单次探测超时
    pub timeout: Duration,
}

impl MonitorConfig {
    /// 从配置文件构建，配置文件完全替换命令行中的主机、端口和间隔
    pub fn from_file(file: FileConfig, timeout: Duration) -> Self {
        Self {
            hosts: file.hosts,
            port: file.port,
            interval: Duration::from_secs(file.interval),
            timeout,
        }
    }

    /// 从命令行配置构建
    pub fn from_cli(cli: &CliSettings) -> Result<Self, String> {
        let port = cli
            .port
            .trim()
            .parse::<u16>()
            .map_err(|_| format!("无效的端口: {}", cli.port))?;

        Ok(Self {
            hosts: cli.hosts.clone(),
            port,
            interval: Duration::from_secs(cli.interval_seconds),
            timeout: Duration::from_secs(cli.timeout_seconds),
        })
    }

    /// 生成探测目标列表，重复主机只保留一次
    pub fn targets(&self) -> Vec<HostTarget> {
        let mut seen = HashSet::new();
        self.hosts
            .iter()
            .filter(|host| seen.insert(host.as_str()))
            .map(|host| HostTarget::new(host.clone(), self.port))
            .collect()
    }

    /// 收集不致命的配置警告
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.timeout >= self.interval {
            warnings.push(format!(
                "探测超时 {:?} 不小于探测间隔 {:?}，慢速主机会被跳过部分轮次",
                self.timeout, self.interval
            ));
        }

        if self.hosts.is_empty() {
            warnings.push("没有配置任何主机".to_string());
        }

        let mut seen = HashSet::new();
        for host in &self.hosts {
            if !seen.insert(host.as_str()) {
                warnings.push(format!("主机重复配置: {host}"));
            }
        }

        warnings
    }
}

/// Web 服务器配置
///
/// 监听地址固定，与被监控主机的探测端口无关。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebConfig {
    /// 绑定地址
    #[serde(default = "default_web_bind_address")]
    pub bind_address: String,
    /// 监听端口
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// 仪表板自动刷新间隔（秒）
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u32,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: default_web_bind_address(),
            port: default_web_port(),
            refresh_interval_seconds: default_refresh_interval(),
        }
    }
}

impl WebConfig {
    /// 解析监听地址
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| format!("无效的监听地址 {}:{}: {}", self.bind_address, self.port, e))
    }
}

/// 默认 Web 服务器绑定地址
fn default_web_bind_address() -> String {
    "0.0.0.0".to_string()
}

/// 默认 Web 服务器端口
fn default_web_port() -> u16 {
    8080
}

/// 默认仪表板刷新间隔（秒）
fn default_refresh_interval() -> u32 {
    5
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &MonitorConfig) -> Result<(), String> {
    if config.port == 0 {
        return Err("探测端口不能为0".to_string());
    }

    if config.interval.is_zero() {
        return Err("探测间隔不能为0".to_string());
    }

    if config.timeout.is_zero() {
        return Err("探测超时不能为0".to_string());
    }

    for host in &config.hosts {
        if host.trim().is_empty() {
            return Err("主机名不能为空".to_string());
        }
        if host.chars().any(char::is_whitespace) {
            return Err(format!("主机名包含空白字符: {host:?}"));
        }
    }

    Ok(())
}
