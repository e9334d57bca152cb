/// 日志工具模块
///
/// 提供日志初始化和启动信息输出
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// 初始化日志
///
/// `RUST_LOG` 优先；否则 `verbose` 为 true 时使用 debug 级别。
/// 可以重复调用，只有第一次生效。
pub fn init(verbose: bool) {
    let default_level = if verbose {
        "slide_pdf_server=debug,tower_http=debug,info"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// 记录服务启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 PDF 生成服务启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 监听地址: http://{}", config.bind_addr());
    info!("📊 渲染策略: {}", config.render_strategy);
    info!("📊 最大并发浏览器数: {}", config.max_concurrent_renders);
    info!("⏱️ 单张渲染超时: {} 秒", config.render_timeout_secs);
    if let Some(path) = &config.chrome_executable {
        info!("🧭 浏览器: {}", path.display());
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
