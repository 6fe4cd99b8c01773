use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::errors::Result as ExporterResult;
use crate::exporter::{Exporter, ExporterBuilder};
use crate::labels::Labels;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 环境变量前缀，示例：PE__SERVER__PORT=9100
pub const ENV_PREFIX: &str = "PE";

/// 静态配置（从 TOML 和环境变量加载，启动时使用）
///
/// - server: 监听地址、端口、指标路径
/// - logging: 日志配置
/// - exporter: 默认标签与直方图分桶
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub exporter: ExporterConfig,
}

impl StaticConfig {
    /// Load configuration, falling back to defaults on any error.
    ///
    /// Priority: ENV > TOML file > defaults. Errors are reported on stderr
    /// because logging is not initialised yet.
    pub fn load(path: Option<&str>) -> Self {
        let file = path.unwrap_or(DEFAULT_CONFIG_PATH);
        match Self::try_load(path) {
            Ok(config) => {
                if Path::new(file).exists() {
                    eprintln!("[INFO] Configuration loaded from: {}", file);
                }
                config
            }
            Err(e) => {
                eprintln!("[ERROR] Failed to load config: {}", e);
                Self::default()
            }
        }
    }

    /// Load configuration, returning the first error.
    ///
    /// An explicitly given file must exist; the default `config.toml` is
    /// optional.
    pub fn try_load(path: Option<&str>) -> Result<Self, ConfigError> {
        let (file, required) = match path {
            Some(p) => (p, true),
            None => (DEFAULT_CONFIG_PATH, false),
        };

        Config::builder()
            .add_source(File::new(file, FileFormat::Toml).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<StaticConfig>()
    }

    /// 生成示例 TOML 配置
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
    /// 串行化 /metrics 请求，避免延迟指标并发求值
    #[serde(default = "default_true")]
    pub serialize_snapshots: bool,
    /// 记录 HTTP 请求耗时与活跃连接数
    #[serde(default = "default_true")]
    pub http_metrics: bool,
    /// /enum 示例接口在两个状态之间停留的秒数
    #[serde(default = "default_enum_demo_secs")]
    pub enum_demo_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_true")]
    pub enable_rotation: bool,
}

/// 指标导出配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExporterConfig {
    /// 附加到所有装饰器指标上的默认标签
    #[serde(default)]
    pub default_labels: Labels,
    /// 未指定分桶的直方图所使用的分桶
    #[serde(default)]
    pub default_buckets: Option<Vec<f64>>,
}

impl ExporterConfig {
    pub fn builder(&self) -> ExporterBuilder {
        let builder = Exporter::builder().default_labels(self.default_labels.clone());
        match &self.default_buckets {
            Some(buckets) => builder.default_buckets(buckets.clone()),
            None => builder,
        }
    }

    pub fn build_exporter(&self) -> ExporterResult<Exporter> {
        self.builder().build()
    }
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    9100
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_enum_demo_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            metrics_path: default_metrics_path(),
            serialize_snapshots: true,
            http_metrics: true,
            enum_demo_secs: default_enum_demo_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: true,
        }
    }
}
