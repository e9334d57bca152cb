//! 批量幻灯片渲染器 - 编排层
//!
//! ## 职责
//!
//! 把一个请求里的所有幻灯片分发给浏览器渲染，并按输入顺序收集结果。
//!
//! ## 两种策略
//!
//! - **Concurrent**：每张幻灯片独立启动一个浏览器（独立 profile），
//!   由 Semaphore 限制同时存活的浏览器数量，结果按索引放回对应位置
//! - **Sequential**：只启动一个浏览器，复用同一个页面逐张渲染
//!
//! ## 失败处理
//!
//! 任意一张失败即整体失败：并发模式下其余任务收到中止信号，停止渲染并关闭各自的浏览器，
//! 超过宽限时间仍未退出的任务被强制中止（浏览器随任务一起被 kill）。
//! 已完成的页面全部丢弃，不返回部分结果。

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::browser::{BrowserOptions, BrowserSession};
use crate::config::{Config, RenderStrategy};
use crate::error::RenderError;
use crate::models::{RenderJob, RenderedPage};
use crate::services::TempWorkspace;
use crate::workflow::{SlideCtx, SlideFlow};

/// 失败后等待其余任务自行收尾的时间
const ABORT_GRACE: Duration = Duration::from_secs(5);

/// 渲染后端
///
/// 把一组渲染任务变成同样数量、同样顺序的单页 PDF。
pub trait RenderBackend: Send + Sync {
    fn render_all<'a>(
        &'a self,
        request_id: &'a str,
        jobs: Vec<RenderJob>,
        workspace: &'a TempWorkspace,
    ) -> BoxFuture<'a, Result<Vec<RenderedPage>, RenderError>>;
}

/// 中止信号
///
/// 一张幻灯片失败后，其余任务据此停止渲染并关闭各自的浏览器。
#[derive(Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// 等待中止，发送端释放时也立即返回
    pub async fn aborted(&mut self) {
        let _ = self.rx.wait_for(|aborted| *aborted).await;
    }
}

/// 基于 Chromium 的渲染后端
pub struct ChromiumBackend {
    options: Arc<BrowserOptions>,
    flow: SlideFlow,
    strategy: RenderStrategy,
    max_concurrent: usize,
}

impl ChromiumBackend {
    pub fn new(config: &Config) -> Self {
        let options = BrowserOptions::from_config(config);
        let flow = SlideFlow::new(options.layout, config.render_timeout());
        Self {
            options: Arc::new(options),
            flow,
            strategy: config.render_strategy,
            max_concurrent: config.max_concurrent_renders.max(1),
        }
    }

    /// 并发策略：每张幻灯片一个浏览器
    async fn render_concurrent(
        &self,
        request_id: &str,
        jobs: Vec<RenderJob>,
        workspace: &TempWorkspace,
    ) -> Result<Vec<RenderedPage>, RenderError> {
        let total = jobs.len();
        let request_id = request_id.to_string();

        let jobs_with_profiles: Vec<(RenderJob, PathBuf)> = jobs
            .into_iter()
            .map(|job| {
                let profile_dir = workspace.profile_dir(job.index);
                (job, profile_dir)
            })
            .collect();

        let options = self.options.clone();
        let flow = self.flow.clone();

        fan_out(jobs_with_profiles, self.max_concurrent, move |(job, profile_dir), abort| {
            let options = options.clone();
            let flow = flow.clone();
            let ctx = SlideCtx::new(request_id.clone(), job.index, total);
            async move { render_isolated(&options, &flow, &job, &profile_dir, &ctx, abort).await }
        })
        .await
    }

    /// 顺序策略：一个浏览器，复用同一个页面
    async fn render_sequential(
        &self,
        request_id: &str,
        jobs: Vec<RenderJob>,
        workspace: &TempWorkspace,
    ) -> Result<Vec<RenderedPage>, RenderError> {
        let total = jobs.len();
        let session = BrowserSession::launch(&self.options, &workspace.profile_dir(0)).await?;

        let result: Result<Vec<RenderedPage>, RenderError> = async {
            let printer = session.new_printer().await?;
            let mut pages = Vec::with_capacity(total);
            for job in &jobs {
                let ctx = SlideCtx::new(request_id, job.index, total);
                pages.push(self.flow.render(&printer, job, &ctx).await?);
            }
            printer.close().await;
            Ok(pages)
        }
        .await;

        session.close().await;
        result
    }
}

impl RenderBackend for ChromiumBackend {
    fn render_all<'a>(
        &'a self,
        request_id: &'a str,
        jobs: Vec<RenderJob>,
        workspace: &'a TempWorkspace,
    ) -> BoxFuture<'a, Result<Vec<RenderedPage>, RenderError>> {
        Box::pin(async move {
            let total = jobs.len();
            log_batch_start(request_id, total, self.strategy, self.max_concurrent);

            let pages = match self.strategy {
                RenderStrategy::Concurrent => {
                    self.render_concurrent(request_id, jobs, workspace).await
                }
                RenderStrategy::Sequential => {
                    self.render_sequential(request_id, jobs, workspace).await
                }
            }
            .map_err(|e| {
                error!("[请求 {}] ❌ 批量渲染失败: {}", request_id, e);
                e
            })?;

            let pages = ensure_complete(pages, total)?;
            info!("[请求 {}] ✓ 全部 {} 张幻灯片渲染完成", request_id, total);
            Ok(pages)
        })
    }
}

/// 在独立的浏览器中渲染一张幻灯片，无论成败或被中止都关闭浏览器
async fn render_isolated(
    options: &BrowserOptions,
    flow: &SlideFlow,
    job: &RenderJob,
    profile_dir: &std::path::Path,
    ctx: &SlideCtx,
    mut abort: AbortSignal,
) -> Result<RenderedPage, RenderError> {
    let session = BrowserSession::launch(options, profile_dir).await?;

    let result = tokio::select! {
        result = async {
            let printer = session.new_printer().await?;
            flow.render(&printer, job, ctx).await
        } => result,
        _ = abort.aborted() => {
            debug!("{} 其他幻灯片已失败，停止渲染", ctx);
            Err(RenderError::Cancelled)
        }
    };

    session.close().await;
    result
}

/// 并发执行并按索引收集结果
///
/// - 同时运行的任务数不超过 `limit`
/// - 第一个错误出现时通知其余任务中止，等它们收尾后返回该错误
/// - 结果顺序与 `items` 一致，与完成顺序无关
pub async fn fan_out<T, F, Fut>(
    items: Vec<T>,
    limit: usize,
    render: F,
) -> Result<Vec<RenderedPage>, RenderError>
where
    T: Send + 'static,
    F: Fn(T, AbortSignal) -> Fut,
    Fut: Future<Output = Result<RenderedPage, RenderError>> + Send + 'static,
{
    let total = items.len();
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let (abort_tx, abort_rx) = watch::channel(false);
    let mut set = JoinSet::new();

    for item in items {
        let semaphore = semaphore.clone();
        let signal = AbortSignal {
            rx: abort_rx.clone(),
        };
        let task = render(item, signal.clone());
        set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| RenderError::TaskFailed {
                    reason: e.to_string(),
                })?;
            // 排队期间已有幻灯片失败，不再启动
            if signal.is_aborted() {
                return Err(RenderError::Cancelled);
            }
            task.await
        });
    }

    let mut slots: Vec<Option<RenderedPage>> = (0..total).map(|_| None).collect();

    while let Some(joined) = set.join_next().await {
        let outcome = joined.unwrap_or_else(|e| {
            Err(RenderError::TaskFailed {
                reason: e.to_string(),
            })
        });

        match outcome {
            Ok(page) => match slots.get_mut(page.index) {
                Some(slot) => {
                    debug!("幻灯片 {} 已就位", page.index + 1);
                    *slot = Some(page);
                }
                None => {
                    abort_rest(&abort_tx, &mut set).await;
                    return Err(RenderError::Incomplete {
                        expected: total,
                        actual: page.index + 1,
                    });
                }
            },
            Err(e) => {
                abort_rest(&abort_tx, &mut set).await;
                return Err(e);
            }
        }
    }

    let pages: Vec<RenderedPage> = slots.into_iter().flatten().collect();
    ensure_complete(pages, total)
}

/// 通知其余任务中止，并等待它们关闭各自的浏览器
///
/// 超过 `ABORT_GRACE` 仍未退出的任务直接 abort，drop 时浏览器进程会被 kill。
async fn abort_rest(
    abort_tx: &watch::Sender<bool>,
    set: &mut JoinSet<Result<RenderedPage, RenderError>>,
) {
    let _ = abort_tx.send(true);

    let drained = tokio::time::timeout(ABORT_GRACE, async {
        while set.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        warn!(
            "⚠️ {} 个渲染任务未在 {:?} 内退出，强制中止",
            set.len(),
            ABORT_GRACE
        );
        set.shutdown().await;
    }
}

/// 检查数量和顺序
fn ensure_complete(
    pages: Vec<RenderedPage>,
    expected: usize,
) -> Result<Vec<RenderedPage>, RenderError> {
    let in_order = pages.iter().enumerate().all(|(i, p)| p.index == i);
    if pages.len() != expected || !in_order {
        return Err(RenderError::Incomplete {
            expected,
            actual: pages.len(),
        });
    }
    Ok(pages)
}

// ========== 日志辅助函数 ==========

fn log_batch_start(
    request_id: &str,
    total: usize,
    strategy: RenderStrategy,
    max_concurrent: usize,
) {
    match strategy {
        RenderStrategy::Concurrent => info!(
            "[请求 {}] 📦 开始并发渲染 {} 张幻灯片 (最多 {} 个浏览器)",
            request_id, total, max_concurrent
        ),
        RenderStrategy::Sequential => info!(
            "[请求 {}] 📦 开始顺序渲染 {} 张幻灯片 (复用单个页面)",
            request_id, total
        ),
    }
}
