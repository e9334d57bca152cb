//! 幻灯片渲染流程 - 流程层
//!
//! 核心职责：定义"一张幻灯片"的完整渲染流程
//!
//! 流程顺序：
//! 1. 以 file:// 加载工作目录中的 HTML
//! 2. 固定视口为 1280×720
//! 3. 打印为无边距 PDF
//!
//! 整个流程受单张超时限制。

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::error::RenderError;
use crate::infrastructure::PdfPrinter;
use crate::models::{PageLayout, RenderJob, RenderedPage};
use crate::workflow::slide_ctx::SlideCtx;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// 幻灯片渲染流程
///
/// - 不持有任何资源（page 由调用方传入）
/// - 可以在同一个 page 上反复调用
#[derive(Debug, Clone)]
pub struct SlideFlow {
    layout: PageLayout,
    timeout: Duration,
}

impl SlideFlow {
    pub fn new(layout: PageLayout, timeout: Duration) -> Self {
        Self { layout, timeout }
    }

    /// 渲染一张幻灯片
    pub async fn render(
        &self,
        printer: &PdfPrinter,
        job: &RenderJob,
        ctx: &SlideCtx,
    ) -> Result<RenderedPage, RenderError> {
        let started = Instant::now();

        let printing = self.print_slide(printer, job);
        let bytes = with_timeout(printing, self.timeout, job.slide_number())
            .await
            .map_err(|e| {
                if matches!(e, RenderError::Timeout { .. }) {
                    error!("{} ❌ 渲染超时 ({:?})", ctx, self.timeout);
                }
                e
            })?;

        check_pdf_output(&bytes, job.slide_number())?;

        info!(
            "{} ✓ 已转换为 PDF ({} 字节, {} ms)",
            ctx,
            bytes.len(),
            started.elapsed().as_millis()
        );

        Ok(RenderedPage {
            index: job.index,
            bytes,
        })
    }

    async fn print_slide(
        &self,
        printer: &PdfPrinter,
        job: &RenderJob,
    ) -> Result<Vec<u8>, RenderError> {
        let slide = job.slide_number();
        let url = job.file_url();
        debug!("幻灯片 {} 导航到: {}", slide, url);

        printer
            .load(&url)
            .await
            .map_err(|source| RenderError::Navigation { slide, source })?;

        printer
            .set_viewport(self.layout)
            .await
            .map_err(|source| RenderError::Viewport { slide, source })?;

        printer
            .print(self.layout)
            .await
            .map_err(|source| RenderError::PdfExport { slide, source })
    }
}

/// 给单张幻灯片的渲染加上时限，超时映射为 `RenderError::Timeout`
async fn with_timeout<F>(fut: F, limit: Duration, slide: usize) -> Result<Vec<u8>, RenderError>
where
    F: Future<Output = Result<Vec<u8>, RenderError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(RenderError::Timeout {
            slide,
            secs: limit.as_secs(),
        }),
    }
}

/// 浏览器返回的字节必须是 PDF
fn check_pdf_output(bytes: &[u8], slide: usize) -> Result<(), RenderError> {
    if bytes.starts_with(PDF_MAGIC) {
        Ok(())
    } else {
        Err(RenderError::InvalidOutput { slide })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_pdf_output() {
        assert!(check_pdf_output(b"%PDF-1.4\n...", 1).is_ok());
        assert!(matches!(
            check_pdf_output(b"<html></html>", 2),
            Err(RenderError::InvalidOutput { slide: 2 })
        ));
        assert!(check_pdf_output(b"", 3).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_slide_times_out() {
        let stalled = std::future::pending::<Result<Vec<u8>, RenderError>>();
        let result = with_timeout(stalled, Duration::from_secs(30), 4).await;
        assert!(matches!(result, Err(RenderError::Timeout { slide: 4, secs: 30 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_slide_passes_through() {
        let quick = async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(b"%PDF-1.4".to_vec())
        };
        let bytes = with_timeout(quick, Duration::from_secs(30), 1).await.unwrap();
        assert_eq!(bytes, b"%PDF-1.4");

        let failing = async { Err(RenderError::InvalidOutput { slide: 2 }) };
        assert!(matches!(
            with_timeout(failing, Duration::from_secs(30), 2).await,
            Err(RenderError::InvalidOutput { slide: 2 })
        ));
    }
}
