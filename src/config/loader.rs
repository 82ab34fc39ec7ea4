//! 配置加载器实现
//!
//! 提供TOML配置文件解析、环境变量替换、默认路径发现以及
//! 命令行与配置文件的合并（配置文件整体替换命令行配置）

use crate::config::types::{validate_config, CliSettings, FileConfig, MonitorConfig};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 默认配置文件名（当前目录）
pub const DEFAULT_CONFIG_FILE: &str = "tcp-vitals.toml";

/// 配置加载器trait，定义配置加载接口
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// 从文件加载配置
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 返回
    /// * `Result<FileConfig>` - 加载的配置或错误
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<FileConfig>;

    /// 从字符串加载配置
    async fn load_from_string(&self, content: &str) -> Result<FileConfig>;

    /// 验证配置
    fn validate(&self, config: &FileConfig) -> Result<()>;
}

/// TOML配置加载器实现
#[derive(Debug, Clone)]
pub struct TomlConfigLoader {
    /// 是否启用环境变量替换
    enable_env_substitution: bool,
}

impl TomlConfigLoader {
    /// 创建新的TOML配置加载器
    pub fn new(enable_env_substitution: bool) -> Self {
        Self {
            enable_env_substitution,
        }
    }

    /// 替换字符串中 `${VAR_NAME}` 格式的环境变量
    fn substitute_env_vars(&self, content: &str) -> Result<String> {
        if !self.enable_env_substitution {
            return Ok(content.to_string());
        }

        let env_var_regex = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| ConfigError::ParseError(format!("正则表达式错误: {}", e)))?;

        let mut result = content.to_string();

        for captures in env_var_regex.captures_iter(content) {
            let full_match = &captures[0];
            let var_name = &captures[1];

            match std::env::var(var_name) {
                Ok(value) => {
                    result = result.replace(full_match, &value);
                }
                Err(_) => {
                    return Err(ConfigError::EnvVarError {
                        var: var_name.to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(result)
    }

    /// 解析TOML内容
    fn parse_toml(&self, content: &str) -> Result<FileConfig> {
        let processed_content = self.substitute_env_vars(content)?;

        let config: FileConfig = toml::from_str(&processed_content)
            .map_err(|e| ConfigError::ParseError(format!("TOML解析失败: {}", e)))?;

        Ok(config)
    }
}

impl Default for TomlConfigLoader {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ConfigLoader for TomlConfigLoader {
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<FileConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            }
            .into());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ParseError(format!("读取文件失败: {}", e)))?;

        let config = self.parse_toml(&content)?;
        self.validate(&config)?;

        log::info!("成功加载配置文件: {}", path.display());
        log::debug!("配置内容: {:?}", config);

        Ok(config)
    }

    async fn load_from_string(&self, content: &str) -> Result<FileConfig> {
        let config = self.parse_toml(content)?;
        self.validate(&config)?;

        log::debug!("成功解析配置字符串");

        Ok(config)
    }

    fn validate(&self, config: &FileConfig) -> Result<()> {
        // 超时不来自配置文件，这里用一个占位值只验证文件字段
        let probe = MonitorConfig::from_file(config.clone(), Duration::from_secs(1));
        validate_config(&probe).map_err(|e| ConfigError::ValidationError(e).into())
    }
}

/// 获取默认配置文件路径
///
/// 依次检查当前目录下的 `tcp-vitals.toml` 与用户配置目录下的
/// `tcp-vitals/config.toml`，返回第一个存在的文件。
pub fn get_default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("tcp-vitals").join("config.toml"))
        .filter(|path| path.exists())
}

/// 配置来源
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// 命令行参数
    CommandLine,
    /// 配置文件
    File(PathBuf),
}

/// 解析最终生效的监控配置
///
/// 指定了配置文件时，文件中的主机、端口和间隔整体替换命令行配置（不合并）；
/// 未指定配置文件且命令行没有主机时，尝试默认配置文件路径。
/// 任何配置错误都应视为启动失败。
pub async fn resolve_config<L: ConfigLoader>(
    loader: &L,
    cli: &CliSettings,
    config_path: Option<&Path>,
) -> Result<(MonitorConfig, ConfigSource)> {
    let timeout = Duration::from_secs(cli.timeout_seconds);

    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None if cli.hosts.is_empty() => get_default_config_path(),
        None => None,
    };

    let (config, source) = match path {
        Some(path) => {
            let file = loader.load_from_file(&path).await?;
            (MonitorConfig::from_file(file, timeout), ConfigSource::File(path))
        }
        None => {
            let config = MonitorConfig::from_cli(cli).map_err(ConfigError::ValidationError)?;
            (config, ConfigSource::CommandLine)
        }
    };

    validate_config(&config).map_err(ConfigError::ValidationError)?;

    Ok((config, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VitalsError;
    use std::env;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn cli_settings() -> CliSettings {
        CliSettings {
            hosts: vec!["cli-host".to_string()],
            port: "22".to_string(),
            interval_seconds: 5,
            timeout_seconds: 2,
        }
    }

    #[tokio::test]
    async fn test_read_config() {
        let file = create_temp_config_file(
            r#"hosts = ["localhost", "example.com", "192.168.1.1"]
port = 8080
interval = 30"#,
        );

        let loader = TomlConfigLoader::new(false);
        let config = loader.load_from_file(file.path()).await.unwrap();

        assert_eq!(config.hosts, vec!["localhost", "example.com", "192.168.1.1"]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.interval, 30);
    }

    #[tokio::test]
    async fn test_read_config_empty_hosts() {
        let loader = TomlConfigLoader::new(false);
        let config = loader
            .load_from_string("hosts = []\nport = 3000\ninterval = 60")
            .await
            .unwrap();

        assert!(config.hosts.is_empty());
        assert_eq!(config.port, 3000);
        assert_eq!(config.interval, 60);
    }

    #[tokio::test]
    async fn test_read_config_non_existent_file() {
        let loader = TomlConfigLoader::new(false);
        let result = loader.load_from_file("non_existent_file.toml").await;

        assert!(matches!(
            result,
            Err(VitalsError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_read_config_invalid_toml() {
        let loader = TomlConfigLoader::new(false);
        let result = loader
            .load_from_string("hosts = [\"localhost\"\nport = invalid\ninterval = 30")
            .await;

        assert!(matches!(
            result,
            Err(VitalsError::Config(ConfigError::ParseError(_)))
        ));
    }

    #[tokio::test]
    async fn test_read_config_missing_fields_rejected() {
        let loader = TomlConfigLoader::new(false);
        let result = loader.load_from_string(r#"hosts = ["localhost"]"#).await;

        match result {
            Err(VitalsError::Config(ConfigError::ValidationError(msg))) => {
                assert!(msg.contains("端口"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_empty_string_rejected() {
        let loader = TomlConfigLoader::new(false);
        let result = loader.load_from_string("").await;

        assert!(matches!(
            result,
            Err(VitalsError::Config(ConfigError::ValidationError(_)))
        ));
    }

    #[tokio::test]
    async fn test_load_minimal_config() {
        let loader = TomlConfigLoader::new(false);
        let config = loader
            .load_from_string("hosts = [\"test.com\"]\nport = 80\ninterval = 5")
            .await
            .unwrap();

        assert_eq!(
            config,
            FileConfig {
                hosts: vec!["test.com".to_string()],
                port: 80,
                interval: 5,
            }
        );
    }

    #[tokio::test]
    async fn test_env_var_substitution() {
        env::set_var("TCP_VITALS_TEST_HOST", "db.internal");

        let loader = TomlConfigLoader::new(true);
        let config = loader
            .load_from_string("hosts = [\"${TCP_VITALS_TEST_HOST}\"]\nport = 5432\ninterval = 10")
            .await
            .unwrap();
        assert_eq!(config.hosts, vec!["db.internal"]);

        env::remove_var("TCP_VITALS_TEST_HOST");
    }

    #[tokio::test]
    async fn test_env_var_substitution_missing_var() {
        let loader = TomlConfigLoader::new(true);
        let result = loader
            .load_from_string("hosts = [\"${TCP_VITALS_MISSING_VAR}\"]\nport = 80\ninterval = 5")
            .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("TCP_VITALS_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_env_vars_disabled() {
        let loader = TomlConfigLoader::new(false);
        let content = "test ${VAR} content";
        assert_eq!(loader.substitute_env_vars(content).unwrap(), content);
    }

    #[tokio::test]
    async fn test_resolve_from_command_line() {
        let loader = TomlConfigLoader::new(false);
        let (config, source) = resolve_config(&loader, &cli_settings(), None).await.unwrap();

        assert_eq!(source, ConfigSource::CommandLine);
        assert_eq!(config.hosts, vec!["cli-host"]);
        assert_eq!(config.port, 22);
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_resolve_file_replaces_command_line() {
        let file = create_temp_config_file("hosts = [\"file-host\"]\nport = 443\ninterval = 30");
        let loader = TomlConfigLoader::new(false);

        let (config, source) = resolve_config(&loader, &cli_settings(), Some(file.path()))
            .await
            .unwrap();

        assert_eq!(source, ConfigSource::File(file.path().to_path_buf()));
        assert_eq!(config.hosts, vec!["file-host"]);
        assert_eq!(config.port, 443);
        assert_eq!(config.interval, Duration::from_secs(30));
        // 超时始终来自命令行
        assert_eq!(config.timeout, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_resolve_invalid_cli_port_is_fatal() {
        let loader = TomlConfigLoader::new(false);
        let cli = CliSettings {
            port: "not-a-port".to_string(),
            ..cli_settings()
        };

        assert!(resolve_config(&loader, &cli, None).await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_missing_file_is_fatal() {
        let loader = TomlConfigLoader::new(false);
        let result =
            resolve_config(&loader, &cli_settings(), Some(Path::new("missing.toml"))).await;

        assert!(result.is_err());
    }
}
