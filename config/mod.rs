use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Level;

use crate::rtree::{RTree, RTreeError, DEFAULT_MAX_ENTRIES};

/// 索引配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// 树参数
    pub index: TreeSettings,

    /// 日志配置
    pub logging: LoggingConfig,
}

/// 树参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSettings {
    /// 节点最大条目数，至少为 2
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别：trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 日志输出：stdout, file
    #[serde(default = "default_log_output")]
    pub output: String,

    /// 日志文件路径（当 output = file 时）
    pub log_file: Option<PathBuf>,
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_output() -> String {
    "stdout".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index: TreeSettings {
                max_entries: default_max_entries(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                output: default_log_output(),
                log_file: None,
            },
        }
    }
}

impl IndexConfig {
    /// 从文件加载配置
    ///
    /// 配置加载顺序（优先级从低到高）：
    /// 1. 默认配置（内嵌的 default.toml）
    /// 2. 用户配置文件（TOML，可选）
    /// 3. 环境变量（RTREE__ 前缀，使用双下划线分隔嵌套，如 `RTREE__INDEX__MAX_ENTRIES`）
    ///
    /// ```no_run
    /// use rtree_index::IndexConfig;
    ///
    /// let config = IndexConfig::from_file("rtree.toml").unwrap();
    /// let rtree = config.build_tree().unwrap();
    /// ```
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from_str(
                include_str!("default.toml"),
                ::config::FileFormat::Toml,
            ))
            .add_source(::config::File::new(path, ::config::FileFormat::Toml).required(false))
            .add_source(
                ::config::Environment::with_prefix("RTREE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| format!("Failed to load config: {}", e))?;

        Ok(settings
            .try_deserialize()
            .map_err(|e| format!("Failed to parse config: {}", e))?)
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, path: &str) -> crate::Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        std::fs::write(path, toml_string)
            .map_err(|e| format!("Failed to write config file: {}", e))?;
        Ok(())
    }

    /// 验证配置
    pub fn validate(&self) -> Result<(), String> {
        if self.index.max_entries < 2 {
            return Err(format!(
                "Invalid max_entries: {}. Must be at least 2",
                self.index.max_entries
            ));
        }

        parse_level(&self.logging.level)?;

        match self.logging.output.as_str() {
            "stdout" => {}
            "file" => {
                if self.logging.log_file.is_none() {
                    return Err("Log output is 'file' but log_file path is not specified".to_string());
                }
            }
            other => {
                return Err(format!(
                    "Invalid log output: '{}'. Must be one of: stdout, file",
                    other
                ))
            }
        }

        Ok(())
    }

    /// 按配置的容量创建空的R-tree
    pub fn build_tree(&self) -> Result<RTree, RTreeError> {
        RTree::new(self.index.max_entries)
    }
}

fn parse_level(level: &str) -> Result<Level, String> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(format!(
            "Invalid log level: '{}'. Must be one of: trace, debug, info, warn, error",
            level
        )),
    }
}

/// 初始化日志系统
///
/// 已经安装过全局 subscriber 时返回错误。
pub fn init_logging(config: &LoggingConfig) -> crate::Result<()> {
    use std::sync::Mutex;
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = LevelFilter::from_level(parse_level(&config.level)?);

    match config.output.as_str() {
        "stdout" => {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_target(false))
                .with(filter)
                .try_init()?;
        }
        "file" => {
            let log_file = config
                .log_file
                .as_ref()
                .ok_or("Log output is 'file' but log_file path is not specified")?;

            // 确保日志目录存在
            if let Some(parent) = log_file.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .map_err(|e| format!("Failed to open log file '{}': {}", log_file.display(), e))?;

            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .with_target(false),
                )
                .with(filter)
                .try_init()?;
        }
        other => return Err(format!("Invalid log output: '{}'", other).into()),
    }

    Ok(())
}
