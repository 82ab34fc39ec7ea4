//! 日志系统模块
//!
//! 基于 tracing 的结构化日志，`log` 宏通过 LogTracer 桥接到 tracing。
//! 日志输出到标准输出，或在指定 `--log-file` 时追加写入文件。

use anyhow::{anyhow, Context};
use log::LevelFilter;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing_log::LogTracer;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::{self, time::ChronoUtc, writer::BoxMakeWriter};
use tracing_subscriber::{prelude::*, registry, EnvFilter, Layer};

/// 进程内只初始化一次，记录首次初始化的结果
static LOGGING_INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别，`RUST_LOG` 中的指令会在此基础上叠加
    pub level: LevelFilter,
    /// 日志文件路径，为空时输出到标准输出
    pub file_path: Option<PathBuf>,
    /// 是否使用JSON格式
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file_path: None,
            json_format: false,
        }
    }
}

/// 初始化全局日志
///
/// 重复调用不会重新初始化，返回首次初始化的结果。
pub fn setup_logging(config: &LogConfig) -> anyhow::Result<()> {
    LOGGING_INIT
        .get_or_init(|| install(config).map_err(|e| format!("{e:#}")))
        .clone()
        .map_err(|e| anyhow!("日志系统初始化失败: {}", e))
}

/// 安装 LogTracer 和 tracing subscriber
fn install(config: &LogConfig) -> anyhow::Result<()> {
    LogTracer::init().context("LogTracer初始化失败")?;

    let env_filter = EnvFilter::from_default_env().add_directive(level_directive(config.level));

    let (writer, ansi) = match &config.file_path {
        Some(path) => (BoxMakeWriter::new(Arc::new(open_log_file(path)?)), false),
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    let fmt_layer = if config.json_format {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_timer(ChronoUtc::rfc_3339())
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(ansi)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    };

    registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("tracing subscriber初始化失败")?;

    tracing::debug!("日志配置: {:?}", config);
    Ok(())
}

/// 以追加方式打开日志文件，必要时创建父目录
fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("创建日志目录失败: {}", parent.display()))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("打开日志文件失败: {}", path.display()))
}

/// 将 log::LevelFilter 转换为 tracing 的过滤指令
fn level_directive(level: LevelFilter) -> Directive {
    use tracing_subscriber::filter::LevelFilter as TracingLevel;
    let level = match level {
        LevelFilter::Off => TracingLevel::OFF,
        LevelFilter::Error => TracingLevel::ERROR,
        LevelFilter::Warn => TracingLevel::WARN,
        LevelFilter::Info => TracingLevel::INFO,
        LevelFilter::Debug => TracingLevel::DEBUG,
        LevelFilter::Trace => TracingLevel::TRACE,
    };
    Directive::from(level)
}
