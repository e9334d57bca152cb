use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// 幻灯片渲染策略
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStrategy {
    /// 每张幻灯片独立启动一个浏览器，并发渲染
    Concurrent,
    /// 只启动一个浏览器，复用同一个页面顺序渲染
    Sequential,
}

impl FromStr for RenderStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concurrent" | "parallel" => Ok(Self::Concurrent),
            "sequential" | "serial" => Ok(Self::Sequential),
            other => Err(ConfigError::InvalidValue {
                var_name: "RENDER_STRATEGY".to_string(),
                value: other.to_string(),
                expected: "concurrent | sequential".to_string(),
            }),
        }
    }
}

impl fmt::Display for RenderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concurrent => write!(f, "concurrent"),
            Self::Sequential => write!(f, "sequential"),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 渲染策略
    pub render_strategy: RenderStrategy,
    /// 同时运行的浏览器数量上限（仅并发策略生效）
    pub max_concurrent_renders: usize,
    /// 单张幻灯片的渲染超时（秒）
    pub render_timeout_secs: u64,
    /// Chromium 可执行文件路径，为空时自动查找
    pub chrome_executable: Option<PathBuf>,
    /// 额外的浏览器启动参数
    pub browser_args: Vec<String>,
    /// 临时工作目录的父目录，为空时使用系统临时目录
    pub workspace_root: Option<PathBuf>,
    /// 请求体大小上限（字节）
    pub max_body_bytes: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            render_strategy: RenderStrategy::Concurrent,
            max_concurrent_renders: 4,
            render_timeout_secs: 30,
            chrome_executable: None,
            browser_args: vec![
                "--no-sandbox".to_string(),
                "--disable-gpu".to_string(),
                "--disable-dev-shm-usage".to_string(),
            ],
            workspace_root: None,
            max_body_bytes: 32 * 1024 * 1024,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源构建配置
    ///
    /// 未设置或为空的变量使用默认值，设置了但无法解析的变量直接报错。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default = Self::default();
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            host: lookup("HOST").unwrap_or(default.host),
            port: parse_var(lookup("PORT"), "PORT", default.port, "1-65535")?,
            render_strategy: match lookup("RENDER_STRATEGY") {
                Some(raw) => raw.parse()?,
                None => default.render_strategy,
            },
            max_concurrent_renders: parse_var(
                lookup("MAX_CONCURRENT_RENDERS"),
                "MAX_CONCURRENT_RENDERS",
                default.max_concurrent_renders,
                "正整数",
            )?,
            render_timeout_secs: parse_var(
                lookup("RENDER_TIMEOUT_SECS"),
                "RENDER_TIMEOUT_SECS",
                default.render_timeout_secs,
                "正整数",
            )?,
            chrome_executable: lookup("CHROME_EXECUTABLE").map(PathBuf::from),
            browser_args: lookup("BROWSER_ARGS")
                .map(|v| v.split_whitespace().map(str::to_string).collect())
                .unwrap_or(default.browser_args),
            workspace_root: lookup("WORKSPACE_ROOT").map(PathBuf::from),
            max_body_bytes: parse_var(
                lookup("MAX_BODY_BYTES"),
                "MAX_BODY_BYTES",
                default.max_body_bytes,
                "正整数",
            )?,
            verbose_logging: parse_var(
                lookup("VERBOSE_LOGGING"),
                "VERBOSE_LOGGING",
                default.verbose_logging,
                "true | false",
            )?,
        })
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_renders == 0 {
            return Err(ConfigError::MustBePositive {
                var_name: "MAX_CONCURRENT_RENDERS".to_string(),
            });
        }
        if self.render_timeout_secs == 0 {
            return Err(ConfigError::MustBePositive {
                var_name: "RENDER_TIMEOUT_SECS".to_string(),
            });
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::MustBePositive {
                var_name: "MAX_BODY_BYTES".to_string(),
            });
        }
        Ok(())
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(
    raw: Option<String>,
    var_name: &str,
    default: T,
    expected: &str,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var_name: var_name.to_string(),
            value: raw,
            expected: expected.to_string(),
        }),
    }
}
