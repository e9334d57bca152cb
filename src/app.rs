use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::{self, AppState};
use crate::config::Config;
use crate::orchestrator::{ChromiumBackend, DocumentPipeline};
use crate::utils::logging::log_startup;

/// 应用主结构
///
/// 进程启动时创建一次，持有路由和监听端口，直到进程退出。
pub struct App {
    config: Config,
    listener: TcpListener,
    router: Router,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        log_startup(&config);

        let backend = ChromiumBackend::new(&config);
        let pipeline = DocumentPipeline::new(Arc::new(backend), config.workspace_root.clone());
        let router = api::router(AppState::new(pipeline), config.max_body_bytes);

        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("无法监听地址: {}", addr))?;

        Ok(Self {
            config,
            listener,
            router,
        })
    }

    /// 运行服务，直到收到退出信号
    pub async fn run(self) -> Result<()> {
        info!("✓ 服务已就绪: http://{}", self.listener.local_addr()?);
        info!("📤 POST /generate-pdf");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("服务已停止 ({})", self.config.bind_addr());
        Ok(())
    }
}

/// 等待 Ctrl-C 或 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("监听 Ctrl-C 失败: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("监听 SIGTERM 失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("收到退出信号，正在关闭...");
}
