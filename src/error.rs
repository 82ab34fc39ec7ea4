//! 错误处理模块
//!
//! 定义应用程序的统一错误类型。探测失败不属于错误：它们在探测器内部
//! 被折叠为 `success = false` 的探测结果。

use thiserror::Error;

/// TCP Vitals 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum VitalsError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// Web 服务相关错误
    #[error("Web服务错误: {0}")]
    Web(#[from] WebError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// Web 服务错误类型
#[derive(Error, Debug)]
pub enum WebError {
    /// 监听地址绑定失败
    #[error("绑定监听地址失败 {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// 服务运行失败
    #[error("Web服务运行失败: {0}")]
    Serve(String),

    /// 统计数据编码失败
    #[error("统计数据编码失败: {0}")]
    Encode(String),

    /// 模板渲染失败
    #[error("模板渲染失败: {0}")]
    Render(String),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, VitalsError>;
