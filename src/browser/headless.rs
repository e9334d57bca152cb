use std::path::{Path, PathBuf};

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::RenderError;
use crate::infrastructure::PdfPrinter;
use crate::models::PageLayout;

/// 启动浏览器所需的参数
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub chrome_executable: Option<PathBuf>,
    pub args: Vec<String>,
    pub layout: PageLayout,
}

impl BrowserOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chrome_executable: config.chrome_executable.clone(),
            args: config.browser_args.clone(),
            layout: PageLayout::SLIDE,
        }
    }

    fn build(&self, profile_dir: &Path) -> Result<BrowserConfig, RenderError> {
        let mut builder = BrowserConfig::builder()
            .new_headless_mode()
            .user_data_dir(profile_dir)
            .window_size(self.layout.width_px, self.layout.height_px)
            .args(self.args.clone());

        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(|e| {
            error!("配置无头浏览器失败: {}", e);
            RenderError::Launch { reason: e }
        })
    }
}

/// 一个无头浏览器进程
///
/// `close()` 正常关闭并等待进程退出；未关闭就被 drop 时，
/// chromiumoxide 会直接 kill 子进程，事件循环任务也会被中止。
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    /// 启动无头浏览器
    ///
    /// # 参数
    /// - `options`: 启动参数
    /// - `profile_dir`: 独占的用户数据目录
    pub async fn launch(options: &BrowserOptions, profile_dir: &Path) -> Result<Self, RenderError> {
        debug!("🚀 启动无头浏览器, profile: {}", profile_dir.display());

        let config = options.build(profile_dir)?;
        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            error!("启动无头浏览器失败: {}", e);
            RenderError::Launch {
                reason: e.to_string(),
            }
        })?;

        // 在后台处理浏览器事件
        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        debug!("无头浏览器启动成功");
        Ok(Self { browser, handler })
    }

    /// 打开一个空白页面
    pub async fn new_printer(&self) -> Result<PdfPrinter, RenderError> {
        let page = self.browser.new_page("about:blank").await.map_err(|source| {
            error!("创建页面失败: {}", source);
            RenderError::PageCreation { source }
        })?;
        Ok(PdfPrinter::new(page))
    }

    /// 关闭浏览器并等待进程退出
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("⚠️ 关闭浏览器失败: {}", e);
        }
        match self.browser.wait().await {
            Ok(status) => debug!("浏览器进程已退出: {:?}", status),
            Err(e) => warn!("⚠️ 等待浏览器进程退出失败: {}", e),
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
