//! 配置管理模块
//!
//! 提供配置文件解析、验证以及命令行配置的解析

pub mod loader;
pub mod types;

// 重新导出主要类型
pub use loader::{
    get_default_config_path, resolve_config, ConfigLoader, ConfigSource, TomlConfigLoader,
};
pub use types::{validate_config, CliSettings, FileConfig, MonitorConfig, WebConfig};
