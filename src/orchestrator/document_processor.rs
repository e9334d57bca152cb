//! 单次请求的文档处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **准备**：分配请求 ID，创建临时工作目录，写出全部 HTML
//! 2. **渲染**：委托 `RenderBackend` 批量渲染
//! 3. **合并**：按顺序合并为一个 PDF
//! 4. **清理**：无论成败都删除工作目录

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::MergedDocument;
use crate::orchestrator::batch_processor::RenderBackend;
use crate::services::{merge_pages, TempWorkspace};

/// 文档处理器
///
/// 进程内只创建一个，请求之间不共享任何可变状态。
#[derive(Clone)]
pub struct DocumentPipeline {
    backend: Arc<dyn RenderBackend>,
    workspace_root: Option<PathBuf>,
}

impl DocumentPipeline {
    pub fn new(backend: Arc<dyn RenderBackend>, workspace_root: Option<PathBuf>) -> Self {
        Self {
            backend,
            workspace_root,
        }
    }

    /// 把有序的 HTML 列表转换为一个合并后的 PDF
    pub async fn generate(&self, htmls: &[String]) -> AppResult<MergedDocument> {
        let request_id = new_request_id();
        let started = Instant::now();
        log_request_start(&request_id, htmls.len());

        let workspace = TempWorkspace::create(self.workspace_root.as_deref())?;
        let result = self.generate_in(&request_id, htmls, &workspace).await;
        workspace.close_quietly();

        match &result {
            Ok(document) => log_request_complete(&request_id, document, started),
            Err(e) => error!(
                "[请求 {}] ❌ PDF 生成失败 ({} ms): {}",
                request_id,
                started.elapsed().as_millis(),
                e
            ),
        }
        result
    }

    async fn generate_in(
        &self,
        request_id: &str,
        htmls: &[String],
        workspace: &TempWorkspace,
    ) -> AppResult<MergedDocument> {
        let jobs = workspace.write_slides(htmls)?;
        let pages = self.backend.render_all(request_id, jobs, workspace).await?;

        info!("[请求 {}] 所有中间 PDF 已生成，开始合并...", request_id);
        let document = merge_pages(&pages)?;
        Ok(document)
    }
}

fn new_request_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

// ========== 日志辅助函数 ==========

fn log_request_start(request_id: &str, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("[请求 {}] 📄 收到 {} 张幻灯片的 PDF 生成请求", request_id, total);
}

fn log_request_complete(request_id: &str, document: &MergedDocument, started: Instant) {
    info!(
        "[请求 {}] ✅ 合并完成: {} 页, {} 字节, 耗时 {} ms",
        request_id,
        document.page_count,
        document.bytes.len(),
        started.elapsed().as_millis()
    );
    info!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, RenderError};
    use crate::models::{RenderJob, RenderedPage};
    use crate::test_support::{page_widths, single_page_pdf};
    use futures::future::BoxFuture;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// 记录工作目录，并按索引返回可识别的单页 PDF
    #[derive(Default)]
    struct RecordingBackend {
        fail_on: Option<usize>,
        seen_workspace: Mutex<Option<PathBuf>>,
    }

    impl RenderBackend for RecordingBackend {
        fn render_all<'a>(
            &'a self,
            _request_id: &'a str,
            jobs: Vec<RenderJob>,
            workspace: &'a TempWorkspace,
        ) -> BoxFuture<'a, Result<Vec<RenderedPage>, RenderError>> {
            Box::pin(async move {
                *self.seen_workspace.lock().unwrap() = Some(workspace.path().to_path_buf());
                jobs.iter()
                    .map(|job| {
                        assert!(job.html_path.exists());
                        if self.fail_on == Some(job.index) {
                            return Err(RenderError::InvalidOutput {
                                slide: job.slide_number(),
                            });
                        }
                        Ok(RenderedPage {
                            index: job.index,
                            bytes: single_page_pdf(100 + job.index as i64),
                        })
                    })
                    .collect()
            })
        }
    }

    fn htmls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("<html><body>{}</body></html>", i)).collect()
    }

    #[tokio::test]
    async fn test_generate_merges_in_order_and_cleans_up() {
        let backend = Arc::new(RecordingBackend::default());
        let pipeline = DocumentPipeline::new(backend.clone(), None);

        let document = pipeline.generate(&htmls(3)).await.unwrap();
        assert_eq!(document.page_count, 3);
        assert_eq!(page_widths(&document.bytes), vec![100, 101, 102]);

        let workspace = backend.seen_workspace.lock().unwrap().clone().unwrap();
        assert!(!workspace.exists());
    }

    #[tokio::test]
    async fn test_generate_failure_cleans_up() {
        let backend = Arc::new(RecordingBackend {
            fail_on: Some(1),
            ..Default::default()
        });
        let pipeline = DocumentPipeline::new(backend.clone(), None);

        let err = pipeline.generate(&htmls(3)).await.unwrap_err();
        assert!(matches!(err, AppError::Render(RenderError::InvalidOutput { slide: 2 })));

        let workspace = backend.seen_workspace.lock().unwrap().clone().unwrap();
        assert!(!workspace.exists());
    }

    #[test]
    fn test_request_ids_are_short_and_unique() {
        let a = new_request_id();
        let b = new_request_id();
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
    }
}
